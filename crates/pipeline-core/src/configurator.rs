//! Field validation for drafts in the configure step.
//!
//! Validation is pure: it reads the draft, the assignable-user snapshot and
//! the session's notion of "today", and returns either a normalized copy or
//! every field problem it found. Nothing is persisted here.

use crate::draft::{DraftField, PendingActionDraft};
use crate::user::AssignableUsers;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// FieldError / ValidationError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldError {
    #[error("responsible '{id}' is not an assignable user")]
    UnknownResponsible { id: String },

    #[error("responsible directory is not loaded yet")]
    DirectoryUnavailable,

    #[error("due date {due} is before today ({today})")]
    DueDateInPast { due: NaiveDate, today: NaiveDate },
}

impl FieldError {
    pub fn field(&self) -> DraftField {
        match self {
            FieldError::UnknownResponsible { .. } | FieldError::DirectoryUnavailable => {
                DraftField::ResponsibleId
            }
            FieldError::DueDateInPast { .. } => DraftField::DueDate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{}", join_errors(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn for_field(&self, field: DraftField) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field() == field)
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {e}", e.field()))
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// ActionConfigurator
// ---------------------------------------------------------------------------

pub struct ActionConfigurator<'a> {
    users: Option<&'a AssignableUsers>,
    today: NaiveDate,
}

impl<'a> ActionConfigurator<'a> {
    /// `users` is `None` while the directory is still loading; drafts without
    /// a responsible id validate fine in that window.
    pub fn new(users: Option<&'a AssignableUsers>, today: NaiveDate) -> Self {
        Self { users, today }
    }

    pub fn validate(
        &self,
        draft: &PendingActionDraft,
    ) -> Result<PendingActionDraft, ValidationError> {
        let mut out = draft.clone();
        out.responsible_id = normalize(draft.responsible_id.as_deref());
        if out.notes.as_deref() == Some("") {
            out.notes = None;
        }

        let mut errors = Vec::new();

        if let Some(id) = out.responsible_id.as_deref() {
            match self.users {
                Some(users) if users.contains(id) => {}
                Some(_) => errors.push(FieldError::UnknownResponsible { id: id.to_string() }),
                None => errors.push(FieldError::DirectoryUnavailable),
            }
        }

        if let Some(due) = out.due_date {
            if due < self.today {
                errors.push(FieldError::DueDateInPast {
                    due,
                    today: self.today,
                });
            }
        }

        if errors.is_empty() {
            Ok(out)
        } else {
            Err(ValidationError { errors })
        }
    }

    /// Live per-field feedback; empty when the draft would save.
    pub fn field_errors(&self, draft: &PendingActionDraft) -> Vec<FieldError> {
        self.validate(draft).err().map(|e| e.errors).unwrap_or_default()
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Priority, Role};
    use crate::user::DirectoryUser;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn users() -> AssignableUsers {
        AssignableUsers::filtered(
            vec![
                DirectoryUser::new("u-lawyer", "Laura", Role::Lawyer),
                DirectoryUser::new("u-admin", "Admin", Role::Admin),
            ],
            &[Role::Lawyer, Role::Agent],
        )
    }

    fn draft() -> PendingActionDraft {
        PendingActionDraft {
            action_type_code: "elevate_to_lawyer".to_string(),
            responsible_id: None,
            due_date: Some(today()),
            priority: Priority::Medium,
            notes: None,
            configured: false,
        }
    }

    #[test]
    fn due_today_is_allowed_yesterday_is_not() {
        let users = users();
        let cfg = ActionConfigurator::new(Some(&users), today());
        assert!(cfg.validate(&draft()).is_ok());

        let mut d = draft();
        d.due_date = today().pred_opt();
        let err = cfg.validate(&d).unwrap_err();
        assert!(matches!(
            err.for_field(DraftField::DueDate),
            Some(FieldError::DueDateInPast { .. })
        ));
    }

    #[test]
    fn far_future_due_date_has_no_upper_bound() {
        let users = users();
        let cfg = ActionConfigurator::new(Some(&users), today());
        let mut d = draft();
        d.due_date = NaiveDate::from_ymd_opt(2099, 12, 31);
        assert!(cfg.validate(&d).is_ok());
    }

    #[test]
    fn responsible_must_be_assignable() {
        let users = users();
        let cfg = ActionConfigurator::new(Some(&users), today());

        let mut d = draft();
        d.responsible_id = Some("u-lawyer".to_string());
        assert!(cfg.validate(&d).is_ok());

        d.responsible_id = Some("u-admin".to_string());
        let err = cfg.validate(&d).unwrap_err();
        assert_eq!(
            err.errors,
            vec![FieldError::UnknownResponsible {
                id: "u-admin".to_string()
            }]
        );
    }

    #[test]
    fn blank_responsible_normalizes_to_none() {
        let cfg = ActionConfigurator::new(None, today());
        let mut d = draft();
        d.responsible_id = Some("   ".to_string());
        d.notes = Some(String::new());
        let out = cfg.validate(&d).unwrap();
        assert!(out.responsible_id.is_none());
        assert!(out.notes.is_none());
    }

    #[test]
    fn notes_kept_as_entered() {
        let cfg = ActionConfigurator::new(None, today());
        let mut d = draft();
        d.notes = Some("  call after 5pm\n".to_string());
        let out = cfg.validate(&d).unwrap();
        assert_eq!(out.notes.as_deref(), Some("  call after 5pm\n"));

        d.notes = Some("\n".to_string());
        assert_eq!(cfg.validate(&d).unwrap().notes.as_deref(), Some("\n"));
    }

    #[test]
    fn validation_error_lists_every_field() {
        let err = ValidationError {
            errors: vec![
                FieldError::DirectoryUnavailable,
                FieldError::DueDateInPast {
                    due: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                    today: today(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("responsible_id: responsible directory is not loaded yet; "));
        assert!(msg.contains("due_date: due date 2025-01-01 is before today"));
        let as_error: &dyn std::error::Error = &err;
        assert!(as_error.source().is_none());
    }

    #[test]
    fn directory_needed_only_when_responsible_set() {
        let cfg = ActionConfigurator::new(None, today());
        assert!(cfg.validate(&draft()).is_ok());

        let mut d = draft();
        d.responsible_id = Some("u-lawyer".to_string());
        assert_eq!(cfg.field_errors(&d), vec![FieldError::DirectoryUnavailable]);
    }

    #[test]
    fn collects_every_field_error() {
        let users = users();
        let cfg = ActionConfigurator::new(Some(&users), today());
        let mut d = draft();
        d.responsible_id = Some("nobody".to_string());
        d.due_date = NaiveDate::from_ymd_opt(2020, 1, 1);
        let err = cfg.validate(&d).unwrap_err();
        assert_eq!(err.errors.len(), 2);
        assert!(err.to_string().contains("responsible_id"));
        assert!(err.to_string().contains("due_date"));
    }
}
