use crate::catalog::ActionType;
use crate::types::Priority;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// PendingActionDraft
// ---------------------------------------------------------------------------

/// An unpersisted action being configured inside a wizard session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingActionDraft {
    pub action_type_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Set once the draft has been saved through the configure step.
    #[serde(default)]
    pub configured: bool,
}

impl PendingActionDraft {
    /// Fresh draft for a just-selected action type: medium priority, due
    /// `default_due_days` (or `fallback_days`) after `today`.
    pub fn for_type(action_type: &ActionType, today: NaiveDate, fallback_days: u32) -> Self {
        Self {
            action_type_code: action_type.action_code.clone(),
            responsible_id: None,
            due_date: Some(action_type.default_due_date(today, fallback_days)),
            priority: Priority::default(),
            notes: None,
            configured: false,
        }
    }

    pub fn apply(&mut self, edit: DraftEdit) {
        if let Some(responsible) = edit.responsible_id {
            self.responsible_id = responsible;
        }
        if let Some(due) = edit.due_date {
            self.due_date = due;
        }
        if let Some(priority) = edit.priority {
            self.priority = priority;
        }
        if let Some(notes) = edit.notes {
            self.notes = notes;
        }
    }
}

// ---------------------------------------------------------------------------
// DraftEdit
// ---------------------------------------------------------------------------

/// A partial update to a draft. Outer `None` leaves the field untouched;
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftEdit {
    pub responsible_id: Option<Option<String>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<Priority>,
    pub notes: Option<Option<String>>,
}

impl DraftEdit {
    pub fn responsible(id: impl Into<String>) -> Self {
        Self {
            responsible_id: Some(Some(id.into())),
            ..Default::default()
        }
    }

    pub fn due(date: NaiveDate) -> Self {
        Self {
            due_date: Some(Some(date)),
            ..Default::default()
        }
    }

    pub fn priority(priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            ..Default::default()
        }
    }

    pub fn notes(text: impl Into<String>) -> Self {
        Self {
            notes: Some(Some(text.into())),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == DraftEdit::default()
    }
}

// ---------------------------------------------------------------------------
// DraftField
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    ResponsibleId,
    DueDate,
    Priority,
    Notes,
}

impl DraftField {
    pub fn as_str(self) -> &'static str {
        match self {
            DraftField::ResponsibleId => "responsible_id",
            DraftField::DueDate => "due_date",
            DraftField::Priority => "priority",
            DraftField::Notes => "notes",
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
