use std::str::FromStr;

use rolegate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Lifecycle states shared by profiles and assignments.
///
/// Instances move strictly draft → active → retracted. Retraction is
/// permanent: a retracted instance is never re-activated, a replacement must
/// be created instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Created but not yet in force; carries no permission records.
    Draft,
    /// In force; derived permission records exist.
    Active,
    /// Permanently withdrawn; all derived records removed.
    Retracted,
}

impl LifecycleState {
    /// Returns a stable storage value for this state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Retracted => "retracted",
        }
    }

    /// Checks that an activation transition is allowed from this state.
    pub fn ensure_can_activate(&self, subject: &str) -> AppResult<()> {
        match self {
            Self::Draft => Ok(()),
            Self::Active => Err(AppError::Conflict(format!("{subject} is already active"))),
            Self::Retracted => Err(AppError::Conflict(format!(
                "{subject} is retracted and cannot be activated again"
            ))),
        }
    }

    /// Checks that a retraction transition is allowed from this state.
    pub fn ensure_can_retract(&self, subject: &str) -> AppResult<()> {
        match self {
            Self::Active => Ok(()),
            Self::Draft => Err(AppError::Conflict(format!(
                "{subject} is a draft and cannot be retracted"
            ))),
            Self::Retracted => Err(AppError::Conflict(format!(
                "{subject} is already retracted"
            ))),
        }
    }
}

impl FromStr for LifecycleState {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "retracted" => Ok(Self::Retracted),
            _ => Err(AppError::Validation(format!(
                "unknown lifecycle state '{value}'"
            ))),
        }
    }
}
