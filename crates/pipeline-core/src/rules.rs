use crate::catalog::ActionType;
use crate::eligibility::{RequirementRule, ResolveContext};

/// The action type that opens the pipeline for a fresh entity.
pub const FIRST_ACTION_CODE: &str = "elevate_to_lawyer";

// ---------------------------------------------------------------------------
// Condition helpers
// ---------------------------------------------------------------------------

fn has_no_history(ctx: &ResolveContext) -> bool {
    ctx.existing_actions.is_empty()
}

fn is_first_action(t: &ActionType) -> bool {
    t.action_code == FIRST_ACTION_CODE
}

// ---------------------------------------------------------------------------
// Default rules
// ---------------------------------------------------------------------------

/// Only the pipeline-opening action is ever mandatory, and only while the
/// entity has no recorded actions. Everything else stays optional.
// TODO: read a per-type `required` flag from the catalog once catalog
// administration exposes one.
pub fn default_requirement_rules() -> Vec<RequirementRule> {
    vec![RequirementRule {
        id: "first_action",
        applies: |ctx, t| has_no_history(ctx) && is_first_action(t),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_default_rule() {
        let rules = default_requirement_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "first_action");
    }
}
