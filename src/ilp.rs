use good_lp::variable;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    default_solver,
};
use itertools::Itertools;
use log::{info, trace, warn};
use std::collections::HashMap;
use std::time::Instant;

use crate::config::SearchBudget;
use crate::encoder::{ConstraintEncoder, DecisionMatrix, MAX_CONSECUTIVE_DAYS, WINDOW_DAYS};
use crate::error::SolveError;
use crate::model::{Day, DomainModel, Role, ShiftType};
use crate::schedule::Schedule;
use crate::search::SearchOutcome;
use crate::validator::validate;

/// solves the staffing problem as one integer program using HiGHS.
///
/// Same hard rules as the search, plus an objective that minimises the sum
/// over roles of (max - min) total shifts. Only the time limit of `budget`
/// applies.
pub fn solve(model: &DomainModel, budget: &SearchBudget) -> Result<SearchOutcome, SolveError> {
    let start_time = Instant::now();
    let encoder = ConstraintEncoder::new(model);
    let horizon = model.horizon();

    //model setup
    info!(
        "Setting up ILP model with {} employees, {} days and {} shifts...",
        model.employees().len(),
        horizon,
        ShiftType::ALL.len()
    );
    let mut problem = ProblemVariables::new();

    // x_eds = 1 if employee e works shift s on day d
    //         0 otherwise
    // capability is applied by never creating the variable
    let space = encoder.decision_space();
    trace!(
        "Generated {} assignment variables out of a theoretical maximum of {}.",
        space.len(),
        model.employees().len() * horizon * ShiftType::ALL.len()
    );
    let assignment_vars = problem.add_vector(variable().binary(), space.len());
    let x: HashMap<(usize, Day, ShiftType), Variable> = space
        .iter()
        .zip(assignment_vars)
        .map(|(v, var)| ((v.employee, v.day, v.shift), var))
        .collect();
    let cell = |employee: usize, day: Day, shift: ShiftType| x.get(&(employee, day, shift)).copied();

    // per-role bounds on total shifts; the objective squeezes them together
    let mut bounds = Vec::new();
    for role in Role::ALL {
        if model.members(role).is_empty() {
            continue;
        }
        let most = problem.add(variable().integer().min(0).max(horizon as f64));
        let least = problem.add(variable().integer().min(0).max(horizon as f64));
        bounds.push((role, most, least));
    }
    let objective: Expression = bounds.iter().map(|&(_, most, least)| most - least).sum();
    info!("Objective defined as total per-role workload spread.");

    let mut lp = problem
        .minimise(objective)
        .using(default_solver)
        .set_option("threads", 1) // limit to 1 thread for reproducibility
        .set_option("random_seed", 1234)
        .set_option("log_to_console", "false");
    if let Some(limit) = budget.time_limit() {
        lp = lp.set_option("time_limit", limit.as_secs_f64());
    }

    // begin hard constraints
    info!("Adding 'at most one shift per day' constraints...");
    for employee in 0..model.employees().len() {
        for day in 0..horizon {
            let cells: Vec<Variable> = ShiftType::ALL
                .into_iter()
                .filter_map(|shift| cell(employee, day, shift))
                .collect();
            if cells.len() > 1 {
                let working: Expression = cells.into_iter().sum();
                lp.add_constraint(constraint!(working <= 1));
            }
        }
    }

    info!("Adding 'exact coverage' constraints...");
    for day in 0..horizon {
        for (shift, role) in ShiftType::ALL.into_iter().cartesian_product(Role::ALL) {
            let required = model.required_count(shift, role) as i32;
            let covered: Expression = model
                .members(role)
                .iter()
                .filter_map(|&employee| cell(employee, day, shift))
                .sum();
            lp.add_constraint(constraint!(covered == required));
        }
    }

    info!("Adding 'no morning after night' constraints...");
    for employee in 0..model.employees().len() {
        for day in 1..horizon {
            if let (Some(night), Some(morning)) = (
                cell(employee, day - 1, ShiftType::Night),
                cell(employee, day, ShiftType::Morning),
            ) {
                lp.add_constraint(constraint!(night + morning <= 1));
            }
        }
    }

    info!("Adding 'one day off per {WINDOW_DAYS} days' constraints...");
    for employee in 0..model.employees().len() {
        for start in encoder.window_starts() {
            let worked: Expression = (start..start + WINDOW_DAYS)
                .cartesian_product(ShiftType::ALL)
                .filter_map(|(day, shift)| cell(employee, day, shift))
                .sum();
            lp.add_constraint(constraint!(worked <= MAX_CONSECUTIVE_DAYS as i32));
        }
    }

    info!("Adding workload bound constraints...");
    for &(role, most, least) in &bounds {
        for &employee in model.members(role) {
            let total: Expression = (0..horizon)
                .cartesian_product(ShiftType::ALL)
                .filter_map(|(day, shift)| cell(employee, day, shift))
                .sum();
            lp.add_constraint(constraint!(total.clone() <= most));
            lp.add_constraint(constraint!(total >= least));
        }
    }

    //solve
    info!("Starting ILP solver...");
    let solution = match lp.solve() {
        Ok(s) => s,
        Err(ResolutionError::Infeasible) => {
            info!("ILP proven infeasible in {:.2?}", start_time.elapsed());
            return Ok(SearchOutcome::Exhausted { backtracks: 0 });
        }
        Err(e) => return Err(SolveError::Backend(e.to_string())),
    };
    info!("ILP finished in {:.2?}", start_time.elapsed());

    // get assignments from solution
    let mut matrix = DecisionMatrix::for_model(model);
    for (&(employee, day, shift), var) in &x {
        if solution.value(*var) > 0.9 {
            matrix.set(employee, day, shift, true);
        }
    }

    Ok(incumbent(model, matrix))
}

/// Accepts the extracted matrix only if it is a valid schedule. A time-limited
/// stop can hand back values with no feasible incumbent behind them.
fn incumbent(model: &DomainModel, matrix: DecisionMatrix) -> SearchOutcome {
    let schedule = Schedule::from_matrix(model, matrix);
    let violations = validate(model, &schedule);
    if !violations.is_empty() {
        warn!(
            "ILP stopped without a valid incumbent ({} violations); treating as out of budget",
            violations.len()
        );
        return SearchOutcome::OutOfBudget { backtracks: 0 };
    }

    SearchOutcome::Found {
        matrix: schedule.matrix().clone(),
        backtracks: 0,
    }
}
