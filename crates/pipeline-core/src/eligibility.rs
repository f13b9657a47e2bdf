use crate::action::Action;
use crate::catalog::{ActionType, ActionTypeCatalog};
use crate::rules::default_requirement_rules;
use crate::stage::Stage;
use crate::types::Role;
use serde::Serialize;

// ---------------------------------------------------------------------------
// ResolveContext
// ---------------------------------------------------------------------------

pub struct ResolveContext<'a> {
    pub stage: &'a Stage,
    pub existing_actions: &'a [Action],
    pub catalog: &'a ActionTypeCatalog,
    pub acting_role: Role,
}

// ---------------------------------------------------------------------------
// Eligibility (output)
// ---------------------------------------------------------------------------

/// Partition of the stage-eligible action types for one role.
///
/// `required`, `optional` and `foreign` are pairwise disjoint and together
/// cover every active type applicable to the stage, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Eligibility {
    pub required: Vec<ActionType>,
    pub optional: Vec<ActionType>,
    pub foreign: Vec<ActionType>,
}

impl Eligibility {
    pub fn is_required(&self, code: &str) -> bool {
        self.required.iter().any(|t| t.action_code == code)
    }

    pub fn is_optional(&self, code: &str) -> bool {
        self.optional.iter().any(|t| t.action_code == code)
    }

    /// Required or optional: actionable by the acting role.
    pub fn is_selectable(&self, code: &str) -> bool {
        self.is_required(code) || self.is_optional(code)
    }

    pub fn selectable_count(&self) -> usize {
        self.required.len() + self.optional.len()
    }

    /// Nothing is actionable for this role at this stage.
    pub fn is_deadlock(&self) -> bool {
        self.selectable_count() == 0
    }

    pub fn eligible(&self) -> impl Iterator<Item = &ActionType> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .chain(self.foreign.iter())
    }
}

// ---------------------------------------------------------------------------
// RequirementRule
// ---------------------------------------------------------------------------

/// Decides whether an action type owned by the acting role is mandatory.
pub struct RequirementRule {
    pub id: &'static str,
    pub applies: fn(&ResolveContext, &ActionType) -> bool,
}

// ---------------------------------------------------------------------------
// EligibilityResolver
// ---------------------------------------------------------------------------

pub struct EligibilityResolver {
    rules: Vec<RequirementRule>,
}

impl Default for EligibilityResolver {
    fn default() -> Self {
        Self::new(default_requirement_rules())
    }
}

impl EligibilityResolver {
    pub fn new(rules: Vec<RequirementRule>) -> Self {
        Self { rules }
    }

    /// Pure: the same context always yields the same partition.
    pub fn resolve(&self, ctx: &ResolveContext) -> Eligibility {
        let stage = ctx.stage.current_stage;
        let mut out = Eligibility::default();

        for t in ctx.catalog.eligible_for(stage) {
            if t.required_role != ctx.acting_role {
                out.foreign.push(t.clone());
            } else if self.rules.iter().any(|r| (r.applies)(ctx, t)) {
                out.required.push(t.clone());
            } else {
                out.optional.push(t.clone());
            }
        }

        tracing::debug!(
            stage = %stage,
            role = %ctx.acting_role,
            required = out.required.len(),
            optional = out.optional.len(),
            foreign = out.foreign.len(),
            "resolved action eligibility"
        );
        out
    }
}

/// Resolve with the default requirement rules.
pub fn resolve(
    stage: &Stage,
    existing_actions: &[Action],
    catalog: &ActionTypeCatalog,
    acting_role: Role,
) -> Eligibility {
    let ctx = ResolveContext {
        stage,
        existing_actions,
        catalog,
        acting_role,
    };
    EligibilityResolver::default().resolve(&ctx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::FIRST_ACTION_CODE;
    use crate::stage::EntityRef;
    use crate::types::{ActionStatus, EntityType, StageKey};
    use std::collections::HashSet;

    fn stage_at(key: StageKey) -> Stage {
        Stage::new("s1", &EntityRef::new(EntityType::Leads, "lead-1"), key)
    }

    fn catalog() -> ActionTypeCatalog {
        ActionTypeCatalog::new(vec![
            ActionType::new(FIRST_ACTION_CODE, "Elevate to lawyer", Role::Agent)
                .with_stages([StageKey::AgentInitial])
                .with_due_days(1),
            ActionType::new("schedule_call", "Schedule call", Role::Agent),
            ActionType::new("validate_case", "Validate case", Role::Lawyer)
                .with_stages([StageKey::AgentInitial, StageKey::LawyerValidation]),
            ActionType::new("generate_contract", "Generate contract", Role::Admin)
                .with_stages([StageKey::AdminContract]),
            ActionType::new("legacy_ping", "Legacy ping", Role::Agent).inactive(),
        ])
        .unwrap()
    }

    fn codes(types: &[ActionType]) -> Vec<&str> {
        types.iter().map(|t| t.action_code.as_str()).collect()
    }

    #[test]
    fn first_action_required_when_no_history() {
        let stage = stage_at(StageKey::AgentInitial);
        let out = resolve(&stage, &[], &catalog(), Role::Agent);
        assert_eq!(codes(&out.required), vec![FIRST_ACTION_CODE]);
        assert_eq!(codes(&out.optional), vec!["schedule_call"]);
        assert_eq!(codes(&out.foreign), vec!["validate_case"]);
    }

    #[test]
    fn first_action_optional_once_history_exists() {
        let stage = stage_at(StageKey::AgentInitial);
        let history = vec![Action::existing("a1", "schedule_call", ActionStatus::Completed)];
        let out = resolve(&stage, &history, &catalog(), Role::Agent);
        assert!(out.required.is_empty());
        assert_eq!(codes(&out.optional), vec![FIRST_ACTION_CODE, "schedule_call"]);
    }

    #[test]
    fn first_action_foreign_for_other_roles() {
        let stage = stage_at(StageKey::AgentInitial);
        let out = resolve(&stage, &[], &catalog(), Role::Lawyer);
        assert!(out.required.is_empty());
        assert_eq!(codes(&out.optional), vec!["validate_case"]);
        assert_eq!(codes(&out.foreign), vec![FIRST_ACTION_CODE, "schedule_call"]);
    }

    #[test]
    fn inactive_and_off_stage_types_excluded() {
        let stage = stage_at(StageKey::AdminContract);
        let out = resolve(&stage, &[], &catalog(), Role::Admin);
        let all: Vec<&str> = out.eligible().map(|t| t.action_code.as_str()).collect();
        assert!(!all.contains(&"legacy_ping"));
        assert!(!all.contains(&FIRST_ACTION_CODE));
        assert_eq!(codes(&out.optional), vec!["generate_contract"]);
    }

    #[test]
    fn role_with_nothing_to_do_is_deadlock_not_error() {
        let stage = stage_at(StageKey::ClientSignature);
        let out = resolve(&stage, &[], &catalog(), Role::Lawyer);
        assert!(out.is_deadlock());
        assert_eq!(codes(&out.foreign), vec!["schedule_call"]);
    }

    #[test]
    fn resolve_is_deterministic_and_complete() {
        let cat = catalog();
        let history = vec![Action::existing("a1", "validate_case", ActionStatus::Rejected)];
        let histories: [&[Action]; 2] = [&[], &history];

        for stage_key in StageKey::all() {
            let stage = stage_at(*stage_key);
            let expected: HashSet<&str> = cat
                .eligible_for(*stage_key)
                .map(|t| t.action_code.as_str())
                .collect();

            for role in [Role::Agent, Role::Lawyer, Role::Admin] {
                for existing in histories {
                    let a = resolve(&stage, existing, &cat, role);
                    let b = resolve(&stage, existing, &cat, role);
                    assert_eq!(a, b);

                    let got: Vec<&str> = a.eligible().map(|t| t.action_code.as_str()).collect();
                    let unique: HashSet<&str> = got.iter().copied().collect();
                    assert_eq!(unique.len(), got.len(), "partitions overlap");
                    assert_eq!(unique, expected);
                }
            }
        }
    }

    #[test]
    fn custom_rules_extend_requirements() {
        let rules = vec![RequirementRule {
            id: "always_schedule",
            applies: |_, t| t.action_code == "schedule_call",
        }];
        let stage = stage_at(StageKey::AgentInitial);
        let cat = catalog();
        let ctx = ResolveContext {
            stage: &stage,
            existing_actions: &[],
            catalog: &cat,
            acting_role: Role::Agent,
        };
        let out = EligibilityResolver::new(rules).resolve(&ctx);
        assert_eq!(codes(&out.required), vec!["schedule_call"]);
        assert_eq!(codes(&out.optional), vec![FIRST_ACTION_CODE]);
    }
}
