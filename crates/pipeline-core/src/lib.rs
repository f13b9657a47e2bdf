//! `pipeline-core` decides which actions an acting role may take on an
//! entity at its current pipeline stage, and drives the four-step wizard
//! that configures those actions and commits them as one reviewed batch.
//!
//! ```text
//! PipelineStores ──load_snapshot──▶ WizardSession
//!                                      │ resolve (eligibility)
//!                                      │ toggle / update_draft
//!                                      │ ActionConfigurator (save_and_advance)
//!                                      ▼
//!                                  ChangeCommitter ──create_action──▶ ActionStore
//! ```

pub mod action;
pub mod catalog;
pub mod committer;
pub mod config;
pub mod configurator;
pub mod draft;
pub mod eligibility;
pub mod error;
pub mod io;
pub mod memory;
pub mod query;
pub mod rules;
pub mod stage;
pub mod store;
pub mod types;
pub mod user;
pub mod wizard;

pub use error::{PipelineError, Result};
pub use wizard::{SessionOutcome, WizardSession, WizardStep};
