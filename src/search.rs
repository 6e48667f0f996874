use itertools::Itertools;
use itertools::structs::Combinations;
use log::{debug, info, trace};
use std::time::Instant;
use std::vec;

use crate::config::SearchBudget;
use crate::encoder::{ConstraintEncoder, DecisionMatrix, MAX_CONSECUTIVE_DAYS};
use crate::model::{Assignment, Day, DomainModel, Role, ShiftType};

/// How a feasibility engine finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found { matrix: DecisionMatrix, backtracks: u64 },
    /// Every combination was tried; no schedule exists.
    Exhausted { backtracks: u64 },
    /// The budget ran out first; feasibility is unknown.
    OutOfBudget { backtracks: u64 },
}

/// Per-employee state carried from one committed day to the next.
#[derive(Debug, Clone, Copy, Default)]
struct EmployeeState {
    last_shift: Assignment,
    /// Consecutive worked days ending at the previous day, capped at the limit.
    run_length: usize,
    total: u32,
}

impl EmployeeState {
    fn allows(&self, shift: ShiftType) -> bool {
        self.run_length < MAX_CONSECUTIVE_DAYS
            && !(shift == ShiftType::Morning && self.last_shift == Assignment::Night)
    }

    fn advance(&mut self, assignment: Assignment) {
        if assignment.is_working() {
            self.run_length = (self.run_length + 1).min(MAX_CONSECUTIVE_DAYS);
            self.total += 1;
        } else {
            self.run_length = 0;
        }
        self.last_shift = assignment;
    }
}

enum Step {
    Done,
    Dead,
    Abort,
}

/// One open `(day, bucket)` choice point.
struct Frame {
    day: Day,
    bucket: usize,
    shift: ShiftType,
    combos: Combinations<vec::IntoIter<usize>>,
    placed: Vec<usize>,
    // states before the previous day was committed, put back when this frame runs dry
    restore: Option<Vec<EmployeeState>>,
}

struct Search<'a> {
    model: &'a DomainModel,
    encoder: ConstraintEncoder<'a>,
    budget: &'a SearchBudget,
    started: Instant,
    buckets: Vec<(ShiftType, Role, usize)>,
    matrix: DecisionMatrix,
    states: Vec<EmployeeState>,
    backtracks: u64,
}

/// Fills days in order, one `(shift, role)` bucket at a time, Morning first.
///
/// Candidates are tried as combinations ordered by ascending running shift
/// count (ties by id), so the first leaf found is already close to balanced.
/// Choice points live on an explicit stack, so the horizon length never
/// bounds the call depth.
pub fn search(model: &DomainModel, budget: &SearchBudget) -> SearchOutcome {
    let buckets: Vec<(ShiftType, Role, usize)> = ShiftType::ALL
        .into_iter()
        .flat_map(|shift| Role::ALL.into_iter().map(move |role| (shift, role)))
        .map(|(shift, role)| (shift, role, model.required_count(shift, role) as usize))
        .filter(|&(_, _, required)| required > 0)
        .collect();

    info!(
        "Searching {} days for {} employees across {} staffing buckets per day...",
        model.horizon(),
        model.employees().len(),
        buckets.len()
    );

    let mut search = Search {
        model,
        encoder: ConstraintEncoder::new(model),
        budget,
        started: Instant::now(),
        buckets,
        matrix: DecisionMatrix::for_model(model),
        states: vec![EmployeeState::default(); model.employees().len()],
        backtracks: 0,
    };

    let step = search.run();
    let backtracks = search.backtracks;
    let elapsed = search.started.elapsed();
    match step {
        Step::Done => {
            info!("Feasible schedule found in {elapsed:.2?} after {backtracks} backtracks");
            SearchOutcome::Found {
                matrix: search.matrix,
                backtracks,
            }
        }
        Step::Dead => {
            info!("Search space exhausted in {elapsed:.2?} after {backtracks} backtracks");
            SearchOutcome::Exhausted { backtracks }
        }
        Step::Abort => {
            info!("Search budget exceeded in {elapsed:.2?} after {backtracks} backtracks");
            SearchOutcome::OutOfBudget { backtracks }
        }
    }
}

impl Search<'_> {
    fn run(&mut self) -> Step {
        let horizon = self.model.horizon();
        let mut stack: Vec<Frame> = Vec::new();
        let (mut day, mut bucket) = (0, 0);
        let mut restore = None;

        loop {
            // descend until a bucket is opened or the last day is committed
            if bucket == self.buckets.len() {
                restore = Some(self.commit_day(day));
                day += 1;
                bucket = 0;
                if day == horizon {
                    return Step::Done;
                }
                continue;
            }
            match self.open(day, bucket) {
                Some(combos) => stack.push(Frame {
                    day,
                    bucket,
                    shift: self.buckets[bucket].0,
                    combos,
                    placed: Vec::new(),
                    restore: restore.take(),
                }),
                None => {
                    if let Some(states) = restore.take() {
                        self.states = states;
                    }
                }
            }

            // move the innermost open frame to its next combination
            loop {
                let Some(frame) = stack.last_mut() else {
                    return Step::Dead;
                };
                if !frame.placed.is_empty() {
                    for &e in &frame.placed {
                        self.matrix.set(e, frame.day, frame.shift, false);
                    }
                    frame.placed.clear();
                    self.backtracks += 1;
                    if self.over_budget() {
                        return Step::Abort;
                    }
                }
                match frame.combos.next() {
                    Some(combo) => {
                        for &e in &combo {
                            self.matrix.set(e, frame.day, frame.shift, true);
                        }
                        frame.placed = combo;
                        day = frame.day;
                        bucket = frame.bucket + 1;
                        break;
                    }
                    None => {
                        if let Some(states) = stack.pop().and_then(|frame| frame.restore) {
                            self.states = states;
                        }
                    }
                }
            }
        }
    }

    /// Candidate combinations for one bucket, or `None` when too few
    /// employees can take the shift.
    fn open(&mut self, day: Day, bucket: usize) -> Option<Combinations<vec::IntoIter<usize>>> {
        let (shift, role, required) = self.buckets[bucket];
        let model = self.model;

        let mut pool: Vec<usize> = model
            .members(role)
            .iter()
            .copied()
            .filter(|&e| self.states[e].allows(shift) && self.encoder.admits(&mut self.matrix, e, day, shift))
            .collect();
        if pool.len() < required {
            debug!(
                "Day {day}: only {} of {required} {role:?}(s) available for {shift:?}",
                pool.len()
            );
            return None;
        }
        pool.sort_by_key(|&e| (self.states[e].total, model.employee(e).id));
        Some(pool.into_iter().combinations(required))
    }

    /// Advances every employee's state past `day` and returns the states as
    /// they were before.
    fn commit_day(&mut self, day: Day) -> Vec<EmployeeState> {
        let previous = self.states.clone();
        for (e, state) in self.states.iter_mut().enumerate() {
            state.advance(self.matrix.assignment(e, day));
        }
        trace!("Day {day} committed");
        previous
    }

    fn over_budget(&self) -> bool {
        if self
            .budget
            .max_backtracks
            .is_some_and(|max| self.backtracks > max)
        {
            return true;
        }
        self.budget
            .time_limit()
            .is_some_and(|limit| self.started.elapsed() >= limit)
    }
}
