use crate::model::{EmployeeId, Role, ShiftType};
use crate::validator::Violation;

/// A malformed or internally inconsistent domain model.
///
/// Raised before any search begins and never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("horizon must be a positive number of days")]
    NonPositiveHorizon,

    #[error("roster has no employees")]
    EmptyRoster,

    #[error("employee id {0} appears more than once in the roster")]
    DuplicateEmployee(EmployeeId),

    #[error("{shift:?} requires {count} {role:?}(s) but {role:?} may not work {shift:?}")]
    IneligibleRequirement {
        shift: ShiftType,
        role: Role,
        count: u32,
    },

    #[error("employee id {0} is not part of the roster")]
    UnknownEmployee(EmployeeId),

    #[error("employee {employee} has {actual} assignments, expected {expected}")]
    RowLength {
        employee: EmployeeId,
        expected: usize,
        actual: usize,
    },

    #[error("day {day} is outside the {horizon}-day horizon")]
    DayOutOfRange { day: usize, horizon: usize },
}

/// Failures of a solve invocation.
///
/// Infeasibility and budget exhaustion are ordinary outcomes and are reported
/// through [`crate::solver::SolveOutcome`], not here.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("invalid model: {0}")]
    Config(#[from] ConfigError),

    #[error("solver produced a schedule with {} violation(s)", .0.len())]
    InvariantViolation(Vec<Violation>),

    #[error("integer program backend failed: {0}")]
    Backend(String),
}
