use crate::error::{PipelineError, Result};
use crate::types::{Role, StageKey};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

// ---------------------------------------------------------------------------
// ActionType
// ---------------------------------------------------------------------------

/// A configured kind of action, gated by role and stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionType {
    pub action_code: String,
    pub action_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required_role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_role: Option<Role>,
    /// `None` means the type applies at every stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicable_stages: Option<BTreeSet<StageKey>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_due_days: Option<u32>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl ActionType {
    pub fn new(
        action_code: impl Into<String>,
        action_name: impl Into<String>,
        required_role: Role,
    ) -> Self {
        Self {
            action_code: action_code.into(),
            action_name: action_name.into(),
            description: None,
            required_role,
            validation_role: None,
            applicable_stages: None,
            default_due_days: None,
            is_active: true,
        }
    }

    pub fn with_stages(mut self, stages: impl IntoIterator<Item = StageKey>) -> Self {
        self.applicable_stages = Some(stages.into_iter().collect());
        self
    }

    pub fn with_due_days(mut self, days: u32) -> Self {
        self.default_due_days = Some(days);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn applies_to(&self, stage: StageKey) -> bool {
        self.applicable_stages
            .as_ref()
            .map(|stages| stages.contains(&stage))
            .unwrap_or(true)
    }

    /// Active and applicable to `stage`.
    pub fn is_eligible_for(&self, stage: StageKey) -> bool {
        self.is_active && self.applies_to(stage)
    }

    /// Default due date for a fresh draft: `today + default_due_days`, or
    /// `today + fallback_days` when the type has no default.
    pub fn default_due_date(&self, today: NaiveDate, fallback_days: u32) -> NaiveDate {
        let days = self.default_due_days.unwrap_or(fallback_days);
        today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX)
    }
}

// ---------------------------------------------------------------------------
// ActionTypeCatalog
// ---------------------------------------------------------------------------

/// Immutable set of action types keyed by unique `action_code`, kept in
/// catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ActionTypeCatalog {
    types: Vec<ActionType>,
}

impl ActionTypeCatalog {
    pub fn new(types: Vec<ActionType>) -> Result<Self> {
        let mut seen = HashSet::new();
        for t in &types {
            if !seen.insert(t.action_code.as_str()) {
                return Err(PipelineError::DuplicateActionType(t.action_code.clone()));
            }
        }
        Ok(Self { types })
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        let types: Vec<ActionType> = serde_yaml::from_str(data)?;
        Self::new(types)
    }

    pub fn get(&self, code: &str) -> Option<&ActionType> {
        self.types.iter().find(|t| t.action_code == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Copy of the catalog restricted to active types.
    pub fn active(&self) -> Self {
        Self {
            types: self.types.iter().filter(|t| t.is_active).cloned().collect(),
        }
    }

    pub fn eligible_for(&self, stage: StageKey) -> impl Iterator<Item = &ActionType> {
        self.types.iter().filter(move |t| t.is_eligible_for(stage))
    }

    pub fn action_name(&self, code: &str) -> Option<String> {
        self.get(code).map(|t| t.action_name.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_stages_apply_everywhere() {
        let t = ActionType::new("add_note", "Add note", Role::Agent);
        for stage in StageKey::all() {
            assert!(t.applies_to(*stage));
        }
    }

    #[test]
    fn inactive_types_never_eligible() {
        let t = ActionType::new("legacy", "Legacy", Role::Agent).inactive();
        assert!(!t.is_eligible_for(StageKey::AgentInitial));
    }

    #[test]
    fn duplicate_codes_rejected() {
        let err = ActionTypeCatalog::new(vec![
            ActionType::new("a", "A", Role::Agent),
            ActionType::new("a", "A again", Role::Lawyer),
        ])
        .unwrap_err();
        assert!(matches!(err, PipelineError::DuplicateActionType(code) if code == "a"));
    }

    #[test]
    fn due_date_rolls_over_year_end() {
        let t = ActionType::new("follow_up", "Follow up", Role::Agent).with_due_days(5);
        let today = NaiveDate::from_ymd_opt(2025, 12, 29).unwrap();
        assert_eq!(
            t.default_due_date(today, 1),
            NaiveDate::from_ymd_opt(2026, 1, 3).unwrap()
        );
    }

    #[test]
    fn due_date_uses_fallback_when_unset() {
        let t = ActionType::new("follow_up", "Follow up", Role::Agent);
        let today = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        assert_eq!(
            t.default_due_date(today, 1),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn catalog_from_yaml() {
        let yaml = r#"
- action_code: elevate_to_lawyer
  action_name: Elevate to lawyer
  required_role: agent
  validation_role: lawyer
  applicable_stages: [agent_initial]
  default_due_days: 1
- action_code: generate_contract
  action_name: Generate contract
  required_role: admin
  is_active: false
"#;
        let catalog = ActionTypeCatalog::from_yaml(yaml).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.active().len(), 1);
        let elevate = catalog.get("elevate_to_lawyer").unwrap();
        assert_eq!(elevate.validation_role, Some(Role::Lawyer));
        assert!(!elevate.applies_to(StageKey::AdminContract));
    }
}
