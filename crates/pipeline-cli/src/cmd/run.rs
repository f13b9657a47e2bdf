use crate::output::{or_dash, print_json, print_table};
use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use clap::Args;
use pipeline_core::config::EngineConfig;
use pipeline_core::draft::DraftEdit;
use pipeline_core::memory::{MemoryStore, PipelineFixture};
use pipeline_core::stage::EntityRef;
use pipeline_core::store::{load_assignable_users, IdentityProvider, PipelineStores};
use pipeline_core::types::Priority;
use pipeline_core::wizard::ReviewSummary;
use pipeline_core::{SessionOutcome, WizardSession, WizardStep};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct RunArgs {
    /// Fixture file describing the entity, its actions and the catalog
    #[arg(long)]
    pub fixture: PathBuf,

    /// Select an optional action type (repeatable); required ones are preselected
    #[arg(long = "select", value_name = "CODE")]
    pub select: Vec<String>,

    /// Edit a draft: responsible, due, priority or notes (repeatable)
    #[arg(long = "set", value_name = "CODE:KEY=VALUE")]
    pub set: Vec<String>,

    /// Make the store reject create requests for this action type (repeatable)
    #[arg(long = "fail", value_name = "CODE")]
    pub fail: Vec<String>,

    /// Cancel at review instead of confirming
    #[arg(long)]
    pub cancel: bool,

    /// Persist created actions back into the fixture
    #[arg(long)]
    pub write: bool,
}

#[derive(Serialize)]
struct RunOutput {
    entity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    review: Option<ReviewSummary>,
    #[serde(flatten)]
    outcome: SessionOutcome,
}

pub fn run(args: RunArgs, config: EngineConfig, today: NaiveDate, json: bool) -> anyhow::Result<()> {
    let edits = args
        .set
        .iter()
        .map(String::as_str)
        .map(parse_set)
        .collect::<anyhow::Result<Vec<_>>>()?;

    let fixture = PipelineFixture::load(&args.fixture)
        .with_context(|| format!("failed to load fixture {}", args.fixture.display()))?;
    let entity = fixture.entity();
    let store = Arc::new(MemoryStore::from_fixture(fixture));
    for code in &args.fail {
        store.reject_action_code(code.clone());
    }
    let stores = PipelineStores::uniform(store.clone());

    let rt = tokio::runtime::Runtime::new()?;
    let output = rt.block_on(drive(&stores, &entity, config, today, &args, edits))?;

    if args.write {
        if let SessionOutcome::Committed { report, .. } = &output.outcome {
            if !report.succeeded.is_empty() {
                store
                    .to_fixture(&entity)?
                    .save(&args.fixture)
                    .with_context(|| format!("failed to write {}", args.fixture.display()))?;
            }
        }
    }

    if json {
        print_json(&output)
    } else {
        print_human(&output);
        Ok(())
    }
}

async fn drive(
    stores: &PipelineStores,
    entity: &EntityRef,
    config: EngineConfig,
    today: NaiveDate,
    args: &RunArgs,
    edits: Vec<(String, DraftEdit)>,
) -> anyhow::Result<RunOutput> {
    let actor = stores
        .identity
        .acting_user()
        .await
        .context("failed to resolve acting user")?;
    let roles = config.assignable_roles.clone();
    let mut session = WizardSession::new(entity.clone(), actor, config, today);
    session
        .load(stores)
        .await
        .context("failed to load pipeline data")?;

    // The directory is not needed until a responsible is validated.
    let users = match load_assignable_users(stores.users.as_ref(), &roles).await {
        Ok(users) => Some(users),
        Err(e) => {
            tracing::warn!(error = %e, "user directory unavailable");
            None
        }
    };

    session.next()?;
    for code in &args.select {
        if !session.is_selected(code) {
            session.toggle(code)?;
        }
    }
    session.next()?;

    if session.is_no_changes() {
        if !edits.is_empty() {
            bail!("--set given but no actions are selectable");
        }
        let outcome = if args.cancel {
            session.cancel()?
        } else {
            session.confirm_no_changes()?
        };
        return Ok(RunOutput {
            entity: entity.to_string(),
            review: None,
            outcome,
        });
    }

    for (code, edit) in edits {
        let index = session
            .drafts()
            .iter()
            .position(|d| d.action_type_code == code)
            .ok_or_else(|| anyhow!("--set: action '{code}' is not selected"))?;
        session.update_draft(index, edit)?;
    }

    while session.step() == WizardStep::ConfigureResponsibles {
        let code = session
            .current_draft()
            .map(|d| d.action_type_code.clone())
            .unwrap_or_default();
        session
            .save_and_advance(users.as_ref())
            .with_context(|| format!("cannot save draft '{code}'"))?;
    }

    let review = session.review()?;
    let outcome = if args.cancel {
        session.cancel()?
    } else {
        session.confirm(stores.actions.as_ref()).await?
    };

    Ok(RunOutput {
        entity: entity.to_string(),
        review: Some(review),
        outcome,
    })
}

/// Parse `code:key=value`. An empty value clears `responsible`, `due` and
/// `notes`.
fn parse_set(raw: &str) -> anyhow::Result<(String, DraftEdit)> {
    let (code, assignment) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("--set '{raw}': expected CODE:KEY=VALUE"))?;
    let (key, value) = assignment
        .split_once('=')
        .ok_or_else(|| anyhow!("--set '{raw}': expected CODE:KEY=VALUE"))?;
    let value = value.trim();

    let edit = match key.trim() {
        "responsible" => DraftEdit::responsible(value),
        "notes" => DraftEdit::notes(value),
        "priority" => DraftEdit::priority(
            value
                .parse::<Priority>()
                .with_context(|| format!("--set '{raw}'"))?,
        ),
        "due" if value.is_empty() => DraftEdit {
            due_date: Some(None),
            ..Default::default()
        },
        "due" => DraftEdit::due(
            value
                .parse::<NaiveDate>()
                .with_context(|| format!("--set '{raw}': due date must be YYYY-MM-DD"))?,
        ),
        other => bail!("--set '{raw}': unknown key '{other}' (responsible, due, priority, notes)"),
    };
    Ok((code.trim().to_string(), edit))
}

fn print_human(output: &RunOutput) {
    println!("Entity:  {}", output.entity);
    if let Some(review) = &output.review {
        println!("Stage:   {}", review.stage.current_stage);
        println!();
        let rows: Vec<Vec<String>> = review
            .items
            .iter()
            .map(|item| {
                vec![
                    item.draft.action_type_code.clone(),
                    item.action_name.clone(),
                    or_dash(item.draft.responsible_id.as_deref()),
                    or_dash(item.draft.due_date),
                    item.draft.priority.to_string(),
                ]
            })
            .collect();
        print_table(&["CODE", "NAME", "RESPONSIBLE", "DUE", "PRIORITY"], &rows);
        println!();
    }

    match &output.outcome {
        SessionOutcome::Cancelled => println!("Cancelled. No actions were created."),
        SessionOutcome::Committed { drafts, .. } if drafts.is_empty() => {
            println!("Nothing to commit. No actions were created.")
        }
        SessionOutcome::Committed { report, .. } => {
            println!(
                "Committed: {} created, {} failed",
                report.succeeded.len(),
                report.failed.len()
            );
            for action in &report.succeeded {
                println!("  created  {}  {}", action.action_type, action.id);
            }
            for failed in &report.failed {
                println!("  failed   {}  {}", failed.draft.action_type_code, failed.reason);
            }
        }
    }
}
