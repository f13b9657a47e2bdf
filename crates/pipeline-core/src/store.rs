//! Seams to the external stores this engine reads from and writes to.
//!
//! All traits are object-safe so a host can mix real clients and test
//! doubles behind one [`PipelineStores`] bundle.

use crate::action::{Action, NewAction};
use crate::catalog::{ActionType, ActionTypeCatalog};
use crate::error::{PipelineError, Result};
use crate::query::{ActionQuery, ActionTypeQuery, UserQuery};
use crate::stage::{EntityRef, Stage};
use crate::types::Role;
use crate::user::{ActingUser, AssignableUsers, DirectoryUser};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

#[async_trait]
pub trait StageStore: Send + Sync {
    async fn get_stage(&self, entity: &EntityRef) -> Result<Stage>;
}

#[async_trait]
pub trait ActionStore: Send + Sync {
    async fn list_actions(&self, query: &ActionQuery) -> Result<Vec<Action>>;

    /// Each call stands alone: a store may accept some requests of a batch
    /// and reject others.
    async fn create_action(&self, entity: &EntityRef, request: NewAction) -> Result<Action>;
}

#[async_trait]
pub trait ActionTypeSource: Send + Sync {
    async fn action_types(&self, query: &ActionTypeQuery) -> Result<Vec<ActionType>>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_users(&self, query: &UserQuery) -> Result<Vec<DirectoryUser>>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn acting_user(&self) -> Result<ActingUser>;
}

// ---------------------------------------------------------------------------
// PipelineStores
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PipelineStores {
    pub stages: Arc<dyn StageStore>,
    pub actions: Arc<dyn ActionStore>,
    pub action_types: Arc<dyn ActionTypeSource>,
    pub users: Arc<dyn UserDirectory>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl PipelineStores {
    /// Use one value for every seam.
    pub fn uniform<S>(store: Arc<S>) -> Self
    where
        S: StageStore + ActionStore + ActionTypeSource + UserDirectory + IdentityProvider + 'static,
    {
        Self {
            stages: store.clone(),
            actions: store.clone(),
            action_types: store.clone(),
            users: store.clone(),
            identity: store,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadResource {
    Stage,
    Actions,
    ActionTypes,
    Users,
}

impl LoadResource {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadResource::Stage => "stage",
            LoadResource::Actions => "actions",
            LoadResource::ActionTypes => "action types",
            LoadResource::Users => "responsible users",
        }
    }
}

impl fmt::Display for LoadResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn load_failure(resource: LoadResource) -> impl FnOnce(PipelineError) -> PipelineError {
    move |e| PipelineError::LoadFailure {
        resource: resource.to_string(),
        reason: e.to_string(),
    }
}

/// Everything a wizard session reads before it becomes interactive.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSnapshot {
    pub stage: Stage,
    pub actions: Vec<Action>,
    pub catalog: ActionTypeCatalog,
}

/// Issue the stage, action and active-catalog reads concurrently and join
/// them. The first failure wins and is reported as a load failure.
pub async fn load_snapshot(stores: &PipelineStores, entity: &EntityRef) -> Result<PipelineSnapshot> {
    let action_query = ActionQuery::for_entity(entity);
    let type_query = ActionTypeQuery::active();

    let (stage, actions, types) = tokio::try_join!(
        async {
            stores
                .stages
                .get_stage(entity)
                .await
                .map_err(load_failure(LoadResource::Stage))
        },
        async {
            stores
                .actions
                .list_actions(&action_query)
                .await
                .map_err(load_failure(LoadResource::Actions))
        },
        async {
            stores
                .action_types
                .action_types(&type_query)
                .await
                .map_err(load_failure(LoadResource::ActionTypes))
        },
    )?;

    let catalog = ActionTypeCatalog::new(types)
        .map_err(load_failure(LoadResource::ActionTypes))?
        .active();

    tracing::debug!(
        entity = %entity,
        stage = %stage.current_stage,
        actions = actions.len(),
        action_types = catalog.len(),
        "pipeline snapshot loaded"
    );

    Ok(PipelineSnapshot {
        stage,
        actions,
        catalog,
    })
}

/// Fetch the users a draft may be assigned to.
pub async fn load_assignable_users(
    directory: &dyn UserDirectory,
    roles: &[Role],
) -> Result<AssignableUsers> {
    let users = directory
        .list_users(&UserQuery::assignable(roles))
        .await
        .map_err(load_failure(LoadResource::Users))?;
    Ok(AssignableUsers::filtered(users, roles))
}
