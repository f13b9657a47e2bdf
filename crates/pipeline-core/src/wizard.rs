//! The four-step action wizard for one entity and one acting user.
//!
//! ```text
//! Overview(1) <-> SelectActions(2) <-> ConfigureResponsibles(3) <-> ReviewAndCommit(4)
//!                                                 |                        |
//!                                      confirm_no_changes              confirm
//!                                                 v                        v
//!                                             Committed                Committed
//! ```
//!
//! `cancel` closes the session from any open step with no side effects.
//! The session owns `drafts` exclusively; every step reads and edits that
//! one list by index, so back-navigation never loses edits.

use crate::catalog::ActionTypeCatalog;
use crate::committer::{ChangeCommitter, CommitReport, CommitTarget};
use crate::config::EngineConfig;
use crate::configurator::{ActionConfigurator, FieldError};
use crate::draft::{DraftEdit, PendingActionDraft};
use crate::eligibility::{resolve, Eligibility};
use crate::error::{PipelineError, Result};
use crate::stage::{EntityRef, Stage, StageOverview};
use crate::store::{load_snapshot, ActionStore, PipelineSnapshot, PipelineStores};
use crate::user::{ActingUser, AssignableUsers};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TOTAL_STEPS: u8 = 4;

// ---------------------------------------------------------------------------
// WizardStep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Overview = 1,
    SelectActions = 2,
    ConfigureResponsibles = 3,
    ReviewAndCommit = 4,
}

impl WizardStep {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::Overview => Some(WizardStep::SelectActions),
            WizardStep::SelectActions => Some(WizardStep::ConfigureResponsibles),
            WizardStep::ConfigureResponsibles => Some(WizardStep::ReviewAndCommit),
            WizardStep::ReviewAndCommit => None,
        }
    }

    pub fn prev(self) -> Option<WizardStep> {
        match self {
            WizardStep::Overview => None,
            WizardStep::SelectActions => Some(WizardStep::Overview),
            WizardStep::ConfigureResponsibles => Some(WizardStep::SelectActions),
            WizardStep::ReviewAndCommit => Some(WizardStep::ConfigureResponsibles),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WizardStep::Overview => "overview",
            WizardStep::SelectActions => "select_actions",
            WizardStep::ConfigureResponsibles => "configure_responsibles",
            WizardStep::ReviewAndCommit => "review_and_commit",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// How a session ended. A commit with failed drafts is still `Committed`;
/// the failures are in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionOutcome {
    Committed {
        drafts: Vec<PendingActionDraft>,
        report: CommitReport,
    },
    Cancelled,
}

/// What a refresh changed in the selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshReport {
    pub dropped: Vec<String>,
    pub added_required: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewItem {
    pub action_name: String,
    pub draft: PendingActionDraft,
}

/// Read-only summary shown before confirming.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSummary {
    pub stage: Stage,
    pub items: Vec<ReviewItem>,
}

// ---------------------------------------------------------------------------
// WizardSession
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum LoadState {
    Pending,
    Failed(String),
    Ready(PipelineSnapshot),
}

pub struct WizardSession {
    entity: EntityRef,
    actor: ActingUser,
    config: EngineConfig,
    today: NaiveDate,
    step: WizardStep,
    load: LoadState,
    eligibility: Option<Eligibility>,
    drafts: Vec<PendingActionDraft>,
    cursor: usize,
    outcome: Option<SessionOutcome>,
}

impl WizardSession {
    /// A fresh session at the overview step. It is not interactive until
    /// [`WizardSession::load`] succeeds.
    pub fn new(entity: EntityRef, actor: ActingUser, config: EngineConfig, today: NaiveDate) -> Self {
        Self {
            entity,
            actor,
            config,
            today,
            step: WizardStep::Overview,
            load: LoadState::Pending,
            eligibility: None,
            drafts: Vec::new(),
            cursor: 0,
            outcome: None,
        }
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Load stage, actions and catalog. On failure the session stays
    /// non-interactive; call again to retry all three reads.
    pub async fn load(&mut self, stores: &PipelineStores) -> Result<()> {
        self.refresh(stores).await.map(|_| ())
    }

    /// Re-read everything. If eligibility was already resolved it is
    /// resolved again and the drafts reconciled: still-selectable drafts
    /// keep their edits, newly required types are added, the rest dropped.
    pub async fn refresh(&mut self, stores: &PipelineStores) -> Result<RefreshReport> {
        self.ensure_open()?;
        match load_snapshot(stores, &self.entity).await {
            Ok(snapshot) => {
                self.load = LoadState::Ready(snapshot);
                let report = if self.eligibility.is_some() {
                    self.resolve_and_reconcile()
                } else {
                    RefreshReport::default()
                };
                Ok(report)
            }
            Err(e) => {
                tracing::warn!(entity = %self.entity, error = %e, "pipeline load failed");
                self.load = LoadState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.outcome.is_none() && matches!(self.load, LoadState::Ready(_))
    }

    pub fn load_error(&self) -> Option<&str> {
        match &self.load {
            LoadState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn actor(&self) -> &ActingUser {
        &self.actor
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn progress_percent(&self) -> u8 {
        let step = u32::from(self.step.number());
        ((step * 100 + u32::from(TOTAL_STEPS) / 2) / u32::from(TOTAL_STEPS)) as u8
    }

    pub fn snapshot(&self) -> Option<&PipelineSnapshot> {
        match &self.load {
            LoadState::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn stage(&self) -> Option<&Stage> {
        self.snapshot().map(|s| &s.stage)
    }

    pub fn overview(&self) -> Result<StageOverview> {
        let snapshot = self.ready_snapshot()?;
        Ok(StageOverview::build(&snapshot.stage, &snapshot.actions))
    }

    pub fn eligibility(&self) -> Option<&Eligibility> {
        self.eligibility.as_ref()
    }

    pub fn drafts(&self) -> &[PendingActionDraft] {
        &self.drafts
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_draft(&self) -> Option<&PendingActionDraft> {
        self.drafts.get(self.cursor)
    }

    pub fn is_selected(&self, code: &str) -> bool {
        self.drafts.iter().any(|d| d.action_type_code == code)
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.outcome.is_some()
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Move forward one step if the current step's guard allows it.
    pub fn next(&mut self) -> Result<WizardStep> {
        self.ensure_interactive()?;
        match self.step {
            WizardStep::Overview => {
                if self.eligibility.is_none() {
                    self.resolve_and_reconcile();
                }
            }
            WizardStep::SelectActions => {
                self.check_selection()?;
                self.cursor = self.first_unconfigured().unwrap_or(0);
            }
            WizardStep::ConfigureResponsibles => {
                if self.drafts.is_empty() {
                    return Err(PipelineError::NoChanges);
                }
                if let Some(index) = self.first_unconfigured() {
                    return Err(self.transition_error(
                        WizardStep::ReviewAndCommit,
                        format!(
                            "draft {} ('{}') has not been saved",
                            index + 1,
                            self.drafts[index].action_type_code
                        ),
                    ));
                }
            }
            WizardStep::ReviewAndCommit => {
                return Err(PipelineError::InvalidTransition {
                    from: self.step.to_string(),
                    to: "committed".to_string(),
                    reason: "use confirm to commit".to_string(),
                });
            }
        }
        let to = self.step.next().unwrap_or(self.step);
        self.move_to(to);
        Ok(to)
    }

    /// Move back one step. Drafts and cursor are kept.
    pub fn back(&mut self) -> Result<WizardStep> {
        self.ensure_open()?;
        let to = self.step.prev().ok_or_else(|| PipelineError::InvalidTransition {
            from: self.step.to_string(),
            to: "none".to_string(),
            reason: "already at the first step".to_string(),
        })?;
        self.move_to(to);
        Ok(to)
    }

    // -----------------------------------------------------------------------
    // Step 2: selection
    // -----------------------------------------------------------------------

    /// Select or deselect an optional action type. Returns whether it is
    /// selected afterwards.
    pub fn toggle(&mut self, code: &str) -> Result<bool> {
        self.ensure_interactive()?;
        self.ensure_step(WizardStep::SelectActions)?;
        let eligibility = self.eligibility.as_ref().ok_or_else(|| {
            PipelineError::NotInteractive("eligibility not resolved".to_string())
        })?;

        if eligibility.is_required(code) {
            return Err(PipelineError::RequiredActionLocked(code.to_string()));
        }
        let action_type = eligibility
            .optional
            .iter()
            .find(|t| t.action_code == code)
            .ok_or_else(|| PipelineError::ActionNotSelectable(code.to_string()))?;

        if let Some(pos) = self.drafts.iter().position(|d| d.action_type_code == code) {
            self.drafts.remove(pos);
            self.cursor = self.cursor.min(self.drafts.len().saturating_sub(1));
            Ok(false)
        } else {
            let draft =
                PendingActionDraft::for_type(action_type, self.today, self.config.fallback_due_days);
            self.drafts.push(draft);
            Ok(true)
        }
    }

    /// Whether the selection guard would let the session leave step 2.
    pub fn can_leave_selection(&self) -> bool {
        self.check_selection().is_ok()
    }

    // -----------------------------------------------------------------------
    // Step 3: configuration
    // -----------------------------------------------------------------------

    /// Step 3 with nothing selected: only `back`, `cancel` or
    /// `confirm_no_changes` are meaningful.
    pub fn is_no_changes(&self) -> bool {
        self.step == WizardStep::ConfigureResponsibles && self.drafts.is_empty()
    }

    pub fn select_draft(&mut self, index: usize) -> Result<()> {
        self.ensure_interactive()?;
        self.ensure_step(WizardStep::ConfigureResponsibles)?;
        self.check_index(index)?;
        self.cursor = index;
        Ok(())
    }

    /// Edit any draft in place. An edited draft must be saved again before
    /// review.
    pub fn update_draft(&mut self, index: usize, edit: DraftEdit) -> Result<()> {
        self.ensure_interactive()?;
        self.ensure_step(WizardStep::ConfigureResponsibles)?;
        self.check_index(index)?;
        if edit.is_empty() {
            return Ok(());
        }
        let draft = &mut self.drafts[index];
        draft.apply(edit);
        draft.configured = false;
        Ok(())
    }

    pub fn update_current(&mut self, edit: DraftEdit) -> Result<()> {
        self.update_draft(self.cursor, edit)
    }

    /// Live validation feedback for one draft.
    pub fn field_errors(&self, index: usize, users: Option<&AssignableUsers>) -> Result<Vec<FieldError>> {
        self.check_index(index)?;
        let configurator = ActionConfigurator::new(users, self.today);
        Ok(configurator.field_errors(&self.drafts[index]))
    }

    /// Validate and save the draft under the cursor, then move to the next
    /// unsaved draft, or to review once every draft is saved.
    ///
    /// `users` may be `None` while the directory is still loading; drafts
    /// naming a responsible then fail with a directory error.
    pub fn save_and_advance(&mut self, users: Option<&AssignableUsers>) -> Result<WizardStep> {
        self.ensure_interactive()?;
        self.ensure_step(WizardStep::ConfigureResponsibles)?;
        if self.drafts.is_empty() {
            return Err(PipelineError::NoChanges);
        }

        let index = self.cursor;
        let configurator = ActionConfigurator::new(users, self.today);
        let mut saved = configurator
            .validate(&self.drafts[index])
            .map_err(|source| PipelineError::Validation { index, source })?;
        saved.configured = true;
        self.drafts[index] = saved;

        let after = self.drafts[index + 1..]
            .iter()
            .position(|d| !d.configured)
            .map(|offset| index + 1 + offset);

        match after.or_else(|| self.first_unconfigured()) {
            Some(next) => {
                self.cursor = next;
                Ok(self.step)
            }
            None => {
                self.move_to(WizardStep::ReviewAndCommit);
                Ok(self.step)
            }
        }
    }

    /// Close the session with an empty change set from the no-changes state.
    pub fn confirm_no_changes(&mut self) -> Result<SessionOutcome> {
        self.ensure_interactive()?;
        if !self.is_no_changes() {
            return Err(PipelineError::InvalidTransition {
                from: self.step.to_string(),
                to: "committed".to_string(),
                reason: "only available when no actions are selected".to_string(),
            });
        }
        tracing::info!(entity = %self.entity, "wizard closed with no changes");
        Ok(self.close(SessionOutcome::Committed {
            drafts: Vec::new(),
            report: CommitReport::default(),
        }))
    }

    // -----------------------------------------------------------------------
    // Step 4: review and commit
    // -----------------------------------------------------------------------

    pub fn review(&self) -> Result<ReviewSummary> {
        self.ensure_step(WizardStep::ReviewAndCommit)?;
        let snapshot = self.ready_snapshot()?;
        Ok(ReviewSummary {
            stage: snapshot.stage.clone(),
            items: self
                .drafts
                .iter()
                .map(|d| ReviewItem {
                    action_name: action_name(&snapshot.catalog, &d.action_type_code),
                    draft: d.clone(),
                })
                .collect(),
        })
    }

    /// Commit every draft through `actions` and close the session. Per-draft
    /// failures end up in the report; the session is `Committed` either way.
    pub async fn confirm(&mut self, actions: &dyn ActionStore) -> Result<SessionOutcome> {
        self.ensure_interactive()?;
        self.ensure_step(WizardStep::ReviewAndCommit)?;
        if self.drafts.is_empty() {
            return Err(PipelineError::NoChanges);
        }
        if let Some(index) = self.first_unconfigured() {
            return Err(PipelineError::InvalidTransition {
                from: self.step.to_string(),
                to: "committed".to_string(),
                reason: format!(
                    "draft {} ('{}') has not been saved",
                    index + 1,
                    self.drafts[index].action_type_code
                ),
            });
        }
        let snapshot = self.ready_snapshot()?;

        let target = CommitTarget {
            entity: &self.entity,
            stage: &snapshot.stage,
            performed_by: &self.actor,
            catalog: &snapshot.catalog,
        };
        let committer = ChangeCommitter::new(actions, self.config.commit_concurrency);
        let report = committer.commit(&self.drafts, &target).await;

        let drafts = std::mem::take(&mut self.drafts);
        Ok(self.close(SessionOutcome::Committed { drafts, report }))
    }

    /// Discard drafts and cursor and close the session. Issues no writes.
    pub fn cancel(&mut self) -> Result<SessionOutcome> {
        self.ensure_open()?;
        tracing::info!(entity = %self.entity, step = %self.step, "wizard cancelled");
        self.drafts.clear();
        self.cursor = 0;
        Ok(self.close(SessionOutcome::Cancelled))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn ensure_open(&self) -> Result<()> {
        if self.outcome.is_some() {
            return Err(PipelineError::SessionClosed);
        }
        Ok(())
    }

    fn ensure_interactive(&self) -> Result<()> {
        self.ensure_open()?;
        match &self.load {
            LoadState::Ready(_) => Ok(()),
            LoadState::Pending => Err(PipelineError::NotInteractive(
                "pipeline data not loaded".to_string(),
            )),
            LoadState::Failed(reason) => Err(PipelineError::NotInteractive(reason.clone())),
        }
    }

    fn ensure_step(&self, expected: WizardStep) -> Result<()> {
        if self.step != expected {
            return Err(PipelineError::WrongStep {
                expected: expected.to_string(),
                actual: self.step.to_string(),
            });
        }
        Ok(())
    }

    fn ready_snapshot(&self) -> Result<&PipelineSnapshot> {
        self.snapshot()
            .ok_or_else(|| PipelineError::NotInteractive("pipeline data not loaded".to_string()))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.drafts.len() {
            return Err(PipelineError::DraftIndexOutOfRange {
                index,
                len: self.drafts.len(),
            });
        }
        Ok(())
    }

    fn check_selection(&self) -> Result<()> {
        let eligibility = self.eligibility.as_ref().ok_or_else(|| {
            PipelineError::NotInteractive("eligibility not resolved".to_string())
        })?;
        if let Some(missing) = eligibility
            .required
            .iter()
            .find(|t| !self.is_selected(&t.action_code))
        {
            return Err(PipelineError::RequiredActionLocked(missing.action_code.clone()));
        }
        // With nothing selectable the step must not deadlock; step 3 then
        // shows the no-changes state.
        if self.drafts.is_empty() && !eligibility.is_deadlock() {
            return Err(PipelineError::EmptySelection);
        }
        Ok(())
    }

    fn first_unconfigured(&self) -> Option<usize> {
        self.drafts.iter().position(|d| !d.configured)
    }

    fn transition_error(&self, to: WizardStep, reason: String) -> PipelineError {
        PipelineError::InvalidTransition {
            from: self.step.to_string(),
            to: to.to_string(),
            reason,
        }
    }

    fn move_to(&mut self, to: WizardStep) {
        tracing::debug!(entity = %self.entity, from = %self.step, to = %to, "wizard step");
        self.step = to;
    }

    fn close(&mut self, outcome: SessionOutcome) -> SessionOutcome {
        self.outcome = Some(outcome.clone());
        outcome
    }

    fn resolve_and_reconcile(&mut self) -> RefreshReport {
        let mut report = RefreshReport::default();
        let LoadState::Ready(snapshot) = &self.load else {
            return report;
        };

        let eligibility = resolve(
            &snapshot.stage,
            &snapshot.actions,
            &snapshot.catalog,
            self.actor.role,
        );

        let current = self.current_draft().map(|d| d.action_type_code.clone());
        self.drafts.retain(|d| {
            let keep = eligibility.is_selectable(&d.action_type_code);
            if !keep {
                report.dropped.push(d.action_type_code.clone());
            }
            keep
        });

        let missing: Vec<PendingActionDraft> = eligibility
            .required
            .iter()
            .filter(|t| !self.drafts.iter().any(|d| d.action_type_code == t.action_code))
            .map(|t| PendingActionDraft::for_type(t, self.today, self.config.fallback_due_days))
            .collect();
        report.added_required = missing.iter().map(|d| d.action_type_code.clone()).collect();
        self.drafts.splice(0..0, missing);

        self.cursor = current
            .and_then(|code| self.drafts.iter().position(|d| d.action_type_code == code))
            .unwrap_or_else(|| self.cursor.min(self.drafts.len().saturating_sub(1)));
        // Review only shows a batch where every draft has been saved.
        if self.step == WizardStep::ReviewAndCommit {
            if let Some(index) = self.first_unconfigured() {
                self.cursor = index;
                self.move_to(WizardStep::ConfigureResponsibles);
            } else if self.drafts.is_empty() {
                self.cursor = 0;
                self.move_to(WizardStep::ConfigureResponsibles);
            }
        }
        if !report.dropped.is_empty() {
            tracing::info!(
                entity = %self.entity,
                dropped = ?report.dropped,
                "drafts no longer selectable were dropped"
            );
        }
        self.eligibility = Some(eligibility);
        report
    }
}

fn action_name(catalog: &ActionTypeCatalog, code: &str) -> String {
    catalog.action_name(code).unwrap_or_else(|| code.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
