//! In-memory store implementing every seam, seeded from a YAML fixture.
//!
//! Used by the test-suite and by the CLI host. It supports failure injection
//! per action code and per read, and counts create calls so callers can
//! check that nothing was written.

use crate::action::{Action, NewAction};
use crate::catalog::ActionType;
use crate::error::{PipelineError, Result};
use crate::io::atomic_write;
use crate::query::{ActionQuery, ActionTypeQuery, UserQuery};
use crate::stage::{EntityRef, Stage};
use crate::store::{
    ActionStore, ActionTypeSource, IdentityProvider, LoadResource, StageStore, UserDirectory,
};
use crate::user::{ActingUser, DirectoryUser};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// PipelineFixture
// ---------------------------------------------------------------------------

/// One entity's world: its stage, recorded actions, the catalog, the user
/// directory and who is acting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineFixture {
    pub stage: Stage,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub action_types: Vec<ActionType>,
    #[serde(default)]
    pub users: Vec<DirectoryUser>,
    pub acting_user: ActingUser,
}

impl PipelineFixture {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let fixture: PipelineFixture = serde_yaml::from_str(&data)?;
        Ok(fixture)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        atomic_write(path, data.as_bytes())
    }

    pub fn entity(&self) -> EntityRef {
        self.stage.entity()
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemoryState {
    stages: HashMap<EntityRef, Stage>,
    actions: HashMap<EntityRef, Vec<Action>>,
    action_types: Vec<ActionType>,
    users: Vec<DirectoryUser>,
    acting_user: Option<ActingUser>,
    rejected_codes: HashSet<String>,
    unavailable: HashSet<LoadResource>,
    create_calls: Vec<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: PipelineFixture) -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            let entity = fixture.stage.entity();
            state.actions.insert(entity.clone(), fixture.actions);
            state.stages.insert(entity, fixture.stage);
            state.action_types = fixture.action_types;
            state.users = fixture.users;
            state.acting_user = Some(fixture.acting_user);
        }
        store
    }

    /// Rebuild a fixture for `entity` from the current contents.
    pub fn to_fixture(&self, entity: &EntityRef) -> Result<PipelineFixture> {
        let state = self.lock();
        let stage = state
            .stages
            .get(entity)
            .cloned()
            .ok_or_else(|| stage_not_found(entity))?;
        let acting_user = state
            .acting_user
            .clone()
            .ok_or_else(|| PipelineError::store("export fixture", "no acting user"))?;
        Ok(PipelineFixture {
            stage,
            actions: state.actions.get(entity).cloned().unwrap_or_default(),
            action_types: state.action_types.clone(),
            users: state.users.clone(),
            acting_user,
        })
    }

    pub fn insert_stage(&self, stage: Stage) {
        self.lock().stages.insert(stage.entity(), stage);
    }

    pub fn insert_action(&self, entity: &EntityRef, action: Action) {
        self.lock()
            .actions
            .entry(entity.clone())
            .or_default()
            .push(action);
    }

    pub fn set_action_types(&self, types: Vec<ActionType>) {
        self.lock().action_types = types;
    }

    pub fn set_users(&self, users: Vec<DirectoryUser>) {
        self.lock().users = users;
    }

    pub fn set_acting_user(&self, user: ActingUser) {
        self.lock().acting_user = Some(user);
    }

    /// Make every later create request for `code` fail.
    pub fn reject_action_code(&self, code: impl Into<String>) {
        self.lock().rejected_codes.insert(code.into());
    }

    /// Toggle whether a read fails.
    pub fn set_unavailable(&self, resource: LoadResource, unavailable: bool) {
        let mut state = self.lock();
        if unavailable {
            state.unavailable.insert(resource);
        } else {
            state.unavailable.remove(&resource);
        }
    }

    /// Action codes of every create request received, accepted or not, in
    /// arrival order.
    pub fn create_calls(&self) -> Vec<String> {
        self.lock().create_calls.clone()
    }

    pub fn actions_for(&self, entity: &EntityRef) -> Vec<Action> {
        self.lock().actions.get(entity).cloned().unwrap_or_default()
    }

    pub fn stage_for(&self, entity: &EntityRef) -> Option<Stage> {
        self.lock().stages.get(entity).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(state: &MemoryState, resource: LoadResource) -> Result<()> {
        if state.unavailable.contains(&resource) {
            return Err(PipelineError::store(
                format!("read {resource}"),
                "store unavailable",
            ));
        }
        Ok(())
    }
}

fn stage_not_found(entity: &EntityRef) -> PipelineError {
    PipelineError::StageNotFound {
        entity_type: entity.entity_type.to_string(),
        entity_id: entity.entity_id.clone(),
    }
}

#[async_trait]
impl StageStore for MemoryStore {
    async fn get_stage(&self, entity: &EntityRef) -> Result<Stage> {
        let state = self.lock();
        Self::check_available(&state, LoadResource::Stage)?;
        state
            .stages
            .get(entity)
            .cloned()
            .ok_or_else(|| stage_not_found(entity))
    }
}

#[async_trait]
impl ActionStore for MemoryStore {
    async fn list_actions(&self, query: &ActionQuery) -> Result<Vec<Action>> {
        let state = self.lock();
        Self::check_available(&state, LoadResource::Actions)?;
        let mut matched: Vec<Action> = state
            .actions
            .iter()
            .flat_map(|(owner, actions)| {
                actions
                    .iter()
                    .filter(move |a| query.matches(owner, a))
                    .cloned()
            })
            .collect();
        matched.sort_by_key(|a| a.created_at);
        Ok(query.page(matched))
    }

    async fn create_action(&self, entity: &EntityRef, request: NewAction) -> Result<Action> {
        let mut state = self.lock();
        state.create_calls.push(request.action_type.clone());

        if state.rejected_codes.contains(&request.action_type) {
            return Err(PipelineError::store(
                "create action",
                format!("action '{}' rejected by store", request.action_type),
            ));
        }
        if !state.stages.contains_key(entity) {
            return Err(stage_not_found(entity));
        }
        if let Some(responsible) = request.responsible_for_validation_id.as_deref() {
            if !state.users.iter().any(|u| u.id == responsible && u.is_active) {
                return Err(PipelineError::store(
                    "create action",
                    format!("unknown responsible '{responsible}'"),
                ));
            }
        }

        let action = request.into_action(Uuid::new_v4().to_string(), Utc::now());
        state
            .actions
            .entry(entity.clone())
            .or_default()
            .push(action.clone());
        Ok(action)
    }
}

#[async_trait]
impl ActionTypeSource for MemoryStore {
    async fn action_types(&self, query: &ActionTypeQuery) -> Result<Vec<ActionType>> {
        let state = self.lock();
        Self::check_available(&state, LoadResource::ActionTypes)?;
        Ok(state
            .action_types
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn list_users(&self, query: &UserQuery) -> Result<Vec<DirectoryUser>> {
        let state = self.lock();
        Self::check_available(&state, LoadResource::Users)?;
        Ok(state
            .users
            .iter()
            .filter(|u| query.matches(u))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl IdentityProvider for MemoryStore {
    async fn acting_user(&self) -> Result<ActingUser> {
        self.lock()
            .acting_user
            .clone()
            .ok_or_else(|| PipelineError::store("identity", "no acting user"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
