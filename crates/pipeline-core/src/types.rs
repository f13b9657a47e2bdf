use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Contacts,
    Leads,
}

impl EntityType {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Contacts => "contacts",
            EntityType::Leads => "leads",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contacts" | "contact" => Ok(EntityType::Contacts),
            "leads" | "lead" => Ok(EntityType::Leads),
            _ => Err(PipelineError::InvalidEntityType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// StageKey
// ---------------------------------------------------------------------------

/// Position of an entity in the pipeline. Declaration order is pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKey {
    AgentInitial,
    LawyerValidation,
    AdminContract,
    ClientSignature,
    ExpedienteCreated,
}

impl StageKey {
    pub fn all() -> &'static [StageKey] {
        &[
            StageKey::AgentInitial,
            StageKey::LawyerValidation,
            StageKey::AdminContract,
            StageKey::ClientSignature,
            StageKey::ExpedienteCreated,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<StageKey> {
        StageKey::all().get(self.index() + 1).copied()
    }

    pub fn is_final(self) -> bool {
        self.next().is_none()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageKey::AgentInitial => "agent_initial",
            StageKey::LawyerValidation => "lawyer_validation",
            StageKey::AdminContract => "admin_contract",
            StageKey::ClientSignature => "client_signature",
            StageKey::ExpedienteCreated => "expediente_created",
        }
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StageKey {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent_initial" => Ok(StageKey::AgentInitial),
            "lawyer_validation" => Ok(StageKey::LawyerValidation),
            "admin_contract" => Ok(StageKey::AdminContract),
            "client_signature" => Ok(StageKey::ClientSignature),
            "expediente_created" => Ok(StageKey::ExpedienteCreated),
            _ => Err(PipelineError::InvalidStage(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Agent,
    Lawyer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Agent => "agent",
            Role::Lawyer => "lawyer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent" => Ok(Role::Agent),
            "lawyer" => Ok(Role::Lawyer),
            "admin" => Ok(Role::Admin),
            _ => Err(PipelineError::InvalidRole(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[serde(alias = "pending")]
    PendingValidation,
    Validated,
    Rejected,
    Completed,
}

impl ActionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionStatus::PendingValidation => "pending_validation",
            ActionStatus::Validated => "validated",
            ActionStatus::Rejected => "rejected",
            ActionStatus::Completed => "completed",
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, ActionStatus::PendingValidation)
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionStatus {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" | "pending_validation" => Ok(ActionStatus::PendingValidation),
            "validated" => Ok(ActionStatus::Validated),
            "rejected" => Ok(ActionStatus::Rejected),
            "completed" => Ok(ActionStatus::Completed),
            _ => Err(PipelineError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn all() -> &'static [Priority] {
        &[Priority::Low, Priority::Medium, Priority::High, Priority::Urgent]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            _ => Err(PipelineError::InvalidPriority(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
