//! Typed query parameters for the store seams.
//!
//! Every accepted filter is a named optional field, so a store knows at
//! compile time exactly which predicates it has to honour.

use crate::action::Action;
use crate::catalog::ActionType;
use crate::stage::EntityRef;
use crate::types::{ActionStatus, EntityType, Role, StageKey};
use crate::user::DirectoryUser;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ActionQuery
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ActionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ActionQuery {
    pub fn for_entity(entity: &EntityRef) -> Self {
        Self {
            entity_type: Some(entity.entity_type),
            entity_id: Some(entity.entity_id.clone()),
            ..Default::default()
        }
    }

    /// Field predicates only; `skip`/`limit` are applied by [`ActionQuery::page`].
    pub fn matches(&self, owner: &EntityRef, action: &Action) -> bool {
        self.entity_type.map_or(true, |t| t == owner.entity_type)
            && self
                .entity_id
                .as_deref()
                .map_or(true, |id| id == owner.entity_id)
            && self.status.map_or(true, |s| s == action.status)
            && self
                .created_by
                .as_deref()
                .map_or(true, |id| id == action.performed_by_id)
    }

    pub fn page<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = self.skip.unwrap_or(0);
        let limit = self.limit.unwrap_or(usize::MAX);
        items.into_iter().skip(skip).take(limit).collect()
    }
}

// ---------------------------------------------------------------------------
// ActionTypeQuery
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionTypeQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageKey>,
}

impl ActionTypeQuery {
    pub fn active() -> Self {
        Self {
            is_active: Some(true),
            ..Default::default()
        }
    }

    pub fn matches(&self, t: &ActionType) -> bool {
        self.is_active.map_or(true, |a| a == t.is_active)
            && self.required_role.map_or(true, |r| r == t.required_role)
            && self.stage.map_or(true, |s| t.applies_to(s))
    }
}

// ---------------------------------------------------------------------------
// UserQuery
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub active_only: bool,
    /// Empty means any role.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<Role>,
}

impl UserQuery {
    pub fn assignable(roles: &[Role]) -> Self {
        Self {
            active_only: true,
            roles: roles.to_vec(),
        }
    }

    pub fn matches(&self, user: &DirectoryUser) -> bool {
        (!self.active_only || user.is_active)
            && (self.roles.is_empty() || self.roles.contains(&user.role))
    }
}
