use log::{info, warn};
use serde::Serialize;
use std::time::Instant;

use crate::balance::{self, BalanceReport};
use crate::config::{SolverConfig, Strategy};
use crate::data::{EmployeeSchedule, SchedulingInput, SchedulingOutput};
use crate::encoder::DecisionMatrix;
use crate::error::SolveError;
use crate::ilp;
use crate::model::{CapacityShortfall, DomainModel};
use crate::schedule::{RoleStats, Schedule};
use crate::search::{self, SearchOutcome};
use crate::validator::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Feasibility {
    Feasible,
    Infeasible,
    BudgetExceeded,
}

/// A feasible, balanced schedule and how it was reached.
#[derive(Debug, Clone)]
pub struct Solution {
    pub schedule: Schedule,
    pub stats: Vec<RoleStats>,
    pub backtracks: u64,
    pub balance: BalanceReport,
}

#[derive(Debug, Clone)]
pub enum SolveOutcome {
    Feasible(Solution),
    /// Proven impossible. `shortfalls` is non-empty when the capacity
    /// precheck settled it before any search ran.
    Infeasible {
        shortfalls: Vec<CapacityShortfall>,
        backtracks: u64,
    },
    /// Stopped by the budget; nothing partial is exposed.
    BudgetExceeded { backtracks: u64 },
}

impl SolveOutcome {
    pub fn feasibility(&self) -> Feasibility {
        match self {
            SolveOutcome::Feasible(_) => Feasibility::Feasible,
            SolveOutcome::Infeasible { .. } => Feasibility::Infeasible,
            SolveOutcome::BudgetExceeded { .. } => Feasibility::BudgetExceeded,
        }
    }

    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SolveOutcome::Feasible(solution) => Some(solution),
            _ => None,
        }
    }

    pub fn into_solution(self) -> Option<Solution> {
        match self {
            SolveOutcome::Feasible(solution) => Some(solution),
            _ => None,
        }
    }
}

/// Runs precheck, feasibility engine, balance pass and final validation.
///
/// The model is only read; concurrent solves over separate models need no
/// coordination.
pub fn solve(model: &DomainModel, config: &SolverConfig) -> Result<SolveOutcome, SolveError> {
    let shortfalls = model.capacity_shortfalls();
    if !shortfalls.is_empty() {
        for s in &shortfalls {
            info!(
                "{:?}: {} required per day but only {} on the roster",
                s.role, s.required_per_day, s.available
            );
        }
        return Ok(SolveOutcome::Infeasible {
            shortfalls,
            backtracks: 0,
        });
    }

    let outcome = match config.strategy {
        Strategy::Search => search::search(model, &config.budget),
        Strategy::Ilp => ilp::solve(model, &config.budget)?,
    };

    let (mut matrix, backtracks) = match outcome {
        SearchOutcome::Found { matrix, backtracks } => (matrix, backtracks),
        SearchOutcome::Exhausted { backtracks } => {
            return Ok(SolveOutcome::Infeasible {
                shortfalls: Vec::new(),
                backtracks,
            });
        }
        SearchOutcome::OutOfBudget { backtracks } => {
            return Ok(SolveOutcome::BudgetExceeded { backtracks });
        }
    };

    if cfg!(debug_assertions) {
        check(model, &matrix)?;
    }

    let balance = balance::rebalance(model, &mut matrix, &config.balance);
    let schedule = check(model, &matrix)?;
    let stats = schedule.role_stats();
    Ok(SolveOutcome::Feasible(Solution {
        schedule,
        stats,
        backtracks,
        balance,
    }))
}

/// Validates the matrix as a schedule. Any violation here means the engine
/// and the validator disagree, which is a programming error.
fn check(model: &DomainModel, matrix: &DecisionMatrix) -> Result<Schedule, SolveError> {
    let schedule = Schedule::from_matrix(model, matrix.clone());
    let violations = validate(model, &schedule);
    for v in &violations {
        warn!("{v}");
    }
    debug_assert!(violations.is_empty(), "schedule failed validation: {violations:?}");
    if violations.is_empty() {
        Ok(schedule)
    } else {
        Err(SolveError::InvariantViolation(violations))
    }
}

/// Builds the model from `input`, solves it, and shapes the result for output.
pub fn solve_input(input: SchedulingInput) -> Result<SchedulingOutput, SolveError> {
    let start_time = Instant::now();
    let (model, config) = input.into_model()?;
    let outcome = solve(&model, &config)?;
    let elapsed_ms = start_time.elapsed().as_millis() as u64;
    info!(
        "Solve finished with {:?} in {elapsed_ms} ms",
        outcome.feasibility()
    );

    let status = outcome.feasibility();
    let output = match outcome {
        SolveOutcome::Feasible(solution) => SchedulingOutput {
            status,
            schedule: solution
                .schedule
                .rows()
                .enumerate()
                .map(|(index, (employee_id, role, shifts))| EmployeeSchedule {
                    employee_id,
                    role,
                    full_name: model.employee(index).full_name.clone(),
                    total_shifts: shifts.iter().filter(|a| a.is_working()).count() as u32,
                    shifts,
                })
                .collect(),
            role_stats: solution.stats,
            shortfalls: Vec::new(),
            backtracks: solution.backtracks,
            balance_swaps: solution.balance.swaps.len(),
            elapsed_ms,
        },
        SolveOutcome::Infeasible {
            shortfalls,
            backtracks,
        } => SchedulingOutput {
            status,
            schedule: Vec::new(),
            role_stats: Vec::new(),
            shortfalls,
            backtracks,
            balance_swaps: 0,
            elapsed_ms,
        },
        SolveOutcome::BudgetExceeded { backtracks } => SchedulingOutput {
            status,
            schedule: Vec::new(),
            role_stats: Vec::new(),
            shortfalls: Vec::new(),
            backtracks,
            balance_swaps: 0,
            elapsed_ms,
        },
    };
    Ok(output)
}
