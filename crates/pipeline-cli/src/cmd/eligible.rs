use crate::output::{or_dash, print_json, print_table};
use anyhow::Context;
use pipeline_core::catalog::ActionType;
use pipeline_core::eligibility::resolve;
use pipeline_core::memory::{MemoryStore, PipelineFixture};
use pipeline_core::store::{load_snapshot, PipelineStores};
use pipeline_core::types::Role;
use std::path::Path;
use std::sync::Arc;

pub fn run(fixture_path: &Path, role: Option<Role>, json: bool) -> anyhow::Result<()> {
    let fixture = PipelineFixture::load(fixture_path)
        .with_context(|| format!("failed to load fixture {}", fixture_path.display()))?;
    let role = role.unwrap_or(fixture.acting_user.role);
    let entity = fixture.entity();
    let stores = PipelineStores::uniform(Arc::new(MemoryStore::from_fixture(fixture)));

    let rt = tokio::runtime::Runtime::new()?;
    let snapshot = rt
        .block_on(load_snapshot(&stores, &entity))
        .context("failed to load pipeline data")?;
    let eligibility = resolve(&snapshot.stage, &snapshot.actions, &snapshot.catalog, role);

    if json {
        return print_json(&serde_json::json!({
            "entity": entity.to_string(),
            "stage": snapshot.stage.current_stage,
            "role": role,
            "required": eligibility.required,
            "optional": eligibility.optional,
            "foreign": eligibility.foreign,
            "deadlock": eligibility.is_deadlock(),
        }));
    }

    println!("Entity:  {entity}");
    println!("Stage:   {}", snapshot.stage.current_stage);
    println!("Role:    {role}");
    println!();

    let partitions: [(&str, &[ActionType]); 3] = [
        ("required", &eligibility.required),
        ("optional", &eligibility.optional),
        ("foreign", &eligibility.foreign),
    ];
    let rows: Vec<Vec<String>> = partitions
        .iter()
        .flat_map(|(label, types)| {
            types.iter().map(move |t| {
                vec![
                    label.to_string(),
                    t.action_code.clone(),
                    t.action_name.clone(),
                    t.required_role.to_string(),
                    or_dash(t.default_due_days),
                ]
            })
        })
        .collect();

    if rows.is_empty() {
        println!("No action types apply at this stage.");
    } else {
        print_table(&["PARTITION", "CODE", "NAME", "ROLE", "DUE_DAYS"], &rows);
    }
    if eligibility.is_deadlock() {
        println!();
        println!("Nothing selectable for role '{role}'.");
    }
    Ok(())
}
