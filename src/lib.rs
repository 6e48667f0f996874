//! Staff shift scheduling engine.

pub mod balance;
pub mod config;
pub mod data;
pub mod encoder;
pub mod error;
pub mod ilp;
pub mod model;
pub mod schedule;
pub mod search;
pub mod server;
pub mod solver;
pub mod validator;

pub use config::{BalanceConfig, SearchBudget, ServerConfig, SolverConfig, Strategy};
pub use data::{SchedulingInput, SchedulingOutput};
pub use error::{ConfigError, SolveError};
pub use model::{
    reference_roster, Assignment, CapabilityTable, DomainModel, Employee, EmployeeId,
    RequirementTable, Role, ShiftType,
};
pub use schedule::{RoleStats, Schedule};
pub use solver::{solve, solve_input, Feasibility, Solution, SolveOutcome};
pub use validator::{validate, Violation, ViolationKind};
