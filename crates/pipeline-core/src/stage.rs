use crate::action::Action;
use crate::types::{EntityType, StageKey};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// EntityRef
// ---------------------------------------------------------------------------

/// Identifies a tracked entity (a contact or a lead) in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub entity_id: String,
}

impl EntityRef {
    pub fn new(entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type,
            entity_id: entity_id.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entity_type, self.entity_id)
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// The current stage record of one entity. Read-only from this crate's side:
/// stage transitions happen elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub current_stage: StageKey,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn default_active() -> bool {
    true
}

impl Stage {
    pub fn new(id: impl Into<String>, entity: &EntityRef, current_stage: StageKey) -> Self {
        Self {
            id: id.into(),
            entity_type: entity.entity_type,
            entity_id: entity.entity_id.clone(),
            current_stage,
            is_active: true,
            notes: None,
        }
    }

    pub fn entity(&self) -> EntityRef {
        EntityRef::new(self.entity_type, self.entity_id.clone())
    }
}

// ---------------------------------------------------------------------------
// StageOverview
// ---------------------------------------------------------------------------

/// Informational summary shown on the first wizard step.
#[derive(Debug, Clone, Serialize)]
pub struct StageOverview {
    pub stage: Stage,
    pub next_stage: Option<StageKey>,
    pub actions_count: usize,
    pub pending_actions_count: usize,
    pub latest_action: Option<Action>,
}

impl StageOverview {
    pub fn build(stage: &Stage, actions: &[Action]) -> Self {
        let pending_actions_count = actions.iter().filter(|a| a.status.is_pending()).count();
        let latest_action = actions.iter().max_by_key(|a| a.created_at).cloned();
        Self {
            stage: stage.clone(),
            next_stage: stage.current_stage.next(),
            actions_count: actions.len(),
            pending_actions_count,
            latest_action,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
