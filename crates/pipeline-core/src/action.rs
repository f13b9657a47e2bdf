//! Persisted pipeline actions and the create request built from a draft.

use crate::draft::PendingActionDraft;
use crate::types::{ActionStatus, Priority};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ActionData
// ---------------------------------------------------------------------------

/// Per-action configuration stored alongside a created action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionData {
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// An action already recorded against an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    #[serde(default)]
    pub pipeline_stage_id: String,
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,
    #[serde(default)]
    pub performed_by_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible_for_validation_id: Option<String>,
    pub status: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_data: Option<ActionData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Action {
    /// Minimal record, mostly useful for seeding stores and tests.
    pub fn existing(
        id: impl Into<String>,
        action_type: impl Into<String>,
        status: ActionStatus,
    ) -> Self {
        Self {
            id: id.into(),
            pipeline_stage_id: String::new(),
            action_type: action_type.into(),
            action_name: None,
            performed_by_id: String::new(),
            responsible_for_validation_id: None,
            status,
            action_data: None,
            description: None,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// NewAction
// ---------------------------------------------------------------------------

/// Create-action request submitted to the action store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAction {
    pub pipeline_stage_id: String,
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,
    pub performed_by_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible_for_validation_id: Option<String>,
    pub status: ActionStatus,
    pub action_data: ActionData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewAction {
    pub fn from_draft(
        draft: &PendingActionDraft,
        pipeline_stage_id: &str,
        performed_by_id: &str,
        action_name: Option<String>,
    ) -> Self {
        Self {
            pipeline_stage_id: pipeline_stage_id.to_string(),
            action_type: draft.action_type_code.clone(),
            action_name,
            performed_by_id: performed_by_id.to_string(),
            responsible_for_validation_id: draft.responsible_id.clone(),
            status: ActionStatus::PendingValidation,
            action_data: ActionData {
                priority: draft.priority,
                due_date: draft.due_date,
                notes: draft.notes.clone(),
            },
            description: draft.notes.clone(),
        }
    }

    /// Materialize the persisted record once the store has assigned an id.
    pub fn into_action(self, id: impl Into<String>, created_at: DateTime<Utc>) -> Action {
        Action {
            id: id.into(),
            pipeline_stage_id: self.pipeline_stage_id,
            action_type: self.action_type,
            action_name: self.action_name,
            performed_by_id: self.performed_by_id,
            responsible_for_validation_id: self.responsible_for_validation_id,
            status: self.status,
            action_data: Some(self.action_data),
            description: self.description,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_draft_configuration() {
        let draft = PendingActionDraft {
            action_type_code: "elevate_to_lawyer".to_string(),
            responsible_id: Some("u-lawyer".to_string()),
            due_date: NaiveDate::from_ymd_opt(2026, 1, 2),
            priority: Priority::High,
            notes: Some("call back after 5pm".to_string()),
            configured: true,
        };
        let req = NewAction::from_draft(
            &draft,
            "stage-1",
            "u-agent",
            Some("Elevate to lawyer".to_string()),
        );
        assert_eq!(req.status, ActionStatus::PendingValidation);
        assert_eq!(req.responsible_for_validation_id.as_deref(), Some("u-lawyer"));
        assert_eq!(req.action_data.priority, Priority::High);
        assert_eq!(req.description.as_deref(), Some("call back after 5pm"));

        let json = serde_json::to_value(&req.action_data).unwrap();
        assert_eq!(json["due_date"], "2026-01-02");
        assert_eq!(json["priority"], "high");
    }
}
