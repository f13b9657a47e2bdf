use crate::action::{Action, NewAction};
use crate::catalog::ActionTypeCatalog;
use crate::draft::PendingActionDraft;
use crate::stage::{EntityRef, Stage};
use crate::store::ActionStore;
use crate::user::ActingUser;
use futures::stream::{self, StreamExt};
use serde::Serialize;

/// Hard ceiling on create calls in flight, whatever the config says.
pub const MAX_COMMIT_CONCURRENCY: usize = 10;

// ---------------------------------------------------------------------------
// CommitTarget
// ---------------------------------------------------------------------------

/// Where committed actions land and who is recorded as performing them.
#[derive(Debug, Clone)]
pub struct CommitTarget<'a> {
    pub entity: &'a EntityRef,
    pub stage: &'a Stage,
    pub performed_by: &'a ActingUser,
    pub catalog: &'a ActionTypeCatalog,
}

// ---------------------------------------------------------------------------
// CommitReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedDraft {
    pub draft: PendingActionDraft,
    pub reason: String,
}

/// Per-draft outcome of a commit. Both lists keep draft order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommitReport {
    pub succeeded: Vec<Action>,
    pub failed: Vec<FailedDraft>,
}

impl CommitReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// The drafts worth offering for a manual retry.
    pub fn failed_drafts(&self) -> Vec<PendingActionDraft> {
        self.failed.iter().map(|f| f.draft.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// ChangeCommitter
// ---------------------------------------------------------------------------

pub struct ChangeCommitter<'a> {
    store: &'a dyn ActionStore,
    concurrency: usize,
}

impl<'a> ChangeCommitter<'a> {
    /// `concurrency` is clamped to `1..=MAX_COMMIT_CONCURRENCY`.
    pub fn new(store: &'a dyn ActionStore, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.clamp(1, MAX_COMMIT_CONCURRENCY),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Submit one create request per draft, started in draft order with at
    /// most `concurrency` in flight. Failures are attributed to their draft
    /// and never stop the siblings. Never touches the stage record.
    pub async fn commit(&self, drafts: &[PendingActionDraft], target: &CommitTarget<'_>) -> CommitReport {
        let outcomes: Vec<_> = stream::iter(drafts.iter())
            .map(|draft| {
                let request = NewAction::from_draft(
                    draft,
                    &target.stage.id,
                    &target.performed_by.id,
                    target.catalog.action_name(&draft.action_type_code),
                );
                async move { (draft, self.store.create_action(target.entity, request).await) }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = CommitReport::default();
        for (draft, outcome) in outcomes {
            match outcome {
                Ok(action) => report.succeeded.push(action),
                Err(e) => {
                    tracing::warn!(
                        entity = %target.entity,
                        code = %draft.action_type_code,
                        error = %e,
                        "create action failed"
                    );
                    report.failed.push(FailedDraft {
                        draft: draft.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            entity = %target.entity,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "commit finished"
        );
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ActionType;
    use crate::memory::MemoryStore;
    use crate::types::{EntityType, Priority, Role, StageKey};
    use chrono::NaiveDate;

    fn draft(code: &str) -> PendingActionDraft {
        PendingActionDraft {
            action_type_code: code.to_string(),
            responsible_id: None,
            due_date: NaiveDate::from_ymd_opt(2025, 5, 1),
            priority: Priority::Medium,
            notes: None,
            configured: true,
        }
    }

    struct World {
        store: MemoryStore,
        entity: EntityRef,
        stage: Stage,
        actor: ActingUser,
        catalog: ActionTypeCatalog,
    }

    fn world() -> World {
        let entity = EntityRef::new(EntityType::Leads, "lead-7");
        let stage = Stage::new("stage-7", &entity, StageKey::AgentInitial);
        let store = MemoryStore::new();
        store.insert_stage(stage.clone());
        World {
            store,
            entity,
            stage,
            actor: ActingUser::new("u-agent", Role::Agent),
            catalog: ActionTypeCatalog::new(vec![
                ActionType::new("first", "First", Role::Agent),
                ActionType::new("second", "Second", Role::Agent),
                ActionType::new("third", "Third", Role::Agent),
            ])
            .unwrap(),
        }
    }

    #[tokio::test]
    async fn failure_attributed_to_its_draft() {
        let w = world();
        w.store.reject_action_code("second");
        let drafts = vec![draft("first"), draft("second"), draft("third")];
        let target = CommitTarget {
            entity: &w.entity,
            stage: &w.stage,
            performed_by: &w.actor,
            catalog: &w.catalog,
        };

        let report = ChangeCommitter::new(&w.store, 4).commit(&drafts, &target).await;
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].draft, drafts[1]);
        assert!(!report.is_complete());
        assert_eq!(report.succeeded[0].action_type, "first");
        assert_eq!(report.succeeded[1].action_type, "third");
        assert_eq!(report.succeeded[0].action_name.as_deref(), Some("First"));
        assert_eq!(report.succeeded[0].performed_by_id, "u-agent");
        assert_eq!(report.succeeded[0].pipeline_stage_id, "stage-7");
    }

    #[tokio::test]
    async fn submits_in_draft_order() {
        let w = world();
        let drafts = vec![draft("third"), draft("first"), draft("second")];
        let target = CommitTarget {
            entity: &w.entity,
            stage: &w.stage,
            performed_by: &w.actor,
            catalog: &w.catalog,
        };
        let report = ChangeCommitter::new(&w.store, 1).commit(&drafts, &target).await;
        assert!(report.is_complete());
        assert_eq!(w.store.create_calls(), vec!["third", "first", "second"]);
        assert_eq!(w.store.stage_for(&w.entity), Some(w.stage.clone()));
    }

    #[tokio::test]
    async fn empty_batch_issues_no_calls() {
        let w = world();
        let target = CommitTarget {
            entity: &w.entity,
            stage: &w.stage,
            performed_by: &w.actor,
            catalog: &w.catalog,
        };
        let report = ChangeCommitter::new(&w.store, 3).commit(&[], &target).await;
        assert_eq!(report, CommitReport::default());
        assert!(w.store.create_calls().is_empty());
    }

    #[test]
    fn concurrency_is_clamped() {
        let store = MemoryStore::new();
        assert_eq!(ChangeCommitter::new(&store, 0).concurrency(), 1);
        assert_eq!(ChangeCommitter::new(&store, 64).concurrency(), MAX_COMMIT_CONCURRENCY);
    }
}
