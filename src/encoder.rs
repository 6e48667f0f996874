use std::ops::Range;

use crate::model::{Assignment, Day, DomainModel, Role, ShiftType};

/// Most days an employee may work back to back.
pub const MAX_CONSECUTIVE_DAYS: usize = 6;

/// Length of the rolling window that must contain at least one OFF day.
pub const WINDOW_DAYS: usize = MAX_CONSECUTIVE_DAYS + 1;

/// Row-major `x[employee, day, shift]`. Employees are roster positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionMatrix {
    employees: usize,
    horizon: usize,
    cells: Vec<bool>,
}

impl DecisionMatrix {
    /// All-false matrix, i.e. everyone OFF every day.
    pub fn new(employees: usize, horizon: usize) -> Self {
        Self {
            employees,
            horizon,
            cells: vec![false; employees * horizon * ShiftType::ALL.len()],
        }
    }

    pub fn for_model(model: &DomainModel) -> Self {
        Self::new(model.employees().len(), model.horizon())
    }

    pub fn employees(&self) -> usize {
        self.employees
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    fn offset(&self, employee: usize, day: Day, shift: ShiftType) -> usize {
        (employee * self.horizon + day) * ShiftType::ALL.len() + shift.index()
    }

    pub fn get(&self, employee: usize, day: Day, shift: ShiftType) -> bool {
        self.cells[self.offset(employee, day, shift)]
    }

    pub fn set(&mut self, employee: usize, day: Day, shift: ShiftType, value: bool) {
        let offset = self.offset(employee, day, shift);
        self.cells[offset] = value;
    }

    /// Shifts marked true for `(employee, day)`, in shift order.
    pub fn shifts_on(&self, employee: usize, day: Day) -> impl Iterator<Item = ShiftType> + '_ {
        ShiftType::ALL
            .into_iter()
            .filter(move |&shift| self.get(employee, day, shift))
    }

    pub fn works(&self, employee: usize, day: Day) -> bool {
        self.shifts_on(employee, day).next().is_some()
    }

    /// The first true shift for the cell, or OFF.
    pub fn assignment(&self, employee: usize, day: Day) -> Assignment {
        self.shifts_on(employee, day)
            .next()
            .map_or(Assignment::Off, Assignment::from)
    }

    /// Days in `days` on which the employee works any shift.
    pub fn worked_days_in(&self, employee: usize, days: Range<Day>) -> usize {
        days.filter(|&day| self.works(employee, day)).count()
    }

    /// Total true cells for the employee over the horizon.
    pub fn shift_count(&self, employee: usize) -> u32 {
        (0..self.horizon)
            .map(|day| self.shifts_on(employee, day).count() as u32)
            .sum()
    }
}

/// One structurally possible decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecisionVar {
    pub employee: usize,
    pub day: Day,
    pub shift: ShiftType,
}

/// Constraint predicates bound to one domain model, shared by the search,
/// the balance pass, the integer program and the validator.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintEncoder<'a> {
    model: &'a DomainModel,
}

impl<'a> ConstraintEncoder<'a> {
    pub fn new(model: &'a DomainModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &'a DomainModel {
        self.model
    }

    /// Every `x[e, d, s]` not structurally forced false by the capability table.
    pub fn decision_space(&self) -> Vec<DecisionVar> {
        let mut vars = Vec::new();
        for (employee, emp) in self.model.employees().iter().enumerate() {
            for day in 0..self.model.horizon() {
                for shift in ShiftType::ALL {
                    if self.model.is_eligible(emp.role, shift) {
                        vars.push(DecisionVar {
                            employee,
                            day,
                            shift,
                        });
                    }
                }
            }
        }
        vars
    }

    /// No true cell on `day` names a shift the employee's role cannot work.
    pub fn capability_holds(&self, m: &DecisionMatrix, employee: usize, day: Day) -> bool {
        let role = self.model.role_of(employee);
        m.shifts_on(employee, day)
            .all(|shift| self.model.is_eligible(role, shift))
    }

    /// At most one of `x[e, d, *]` is true.
    pub fn at_most_one_holds(&self, m: &DecisionMatrix, employee: usize, day: Day) -> bool {
        m.shifts_on(employee, day).count() <= 1
    }

    /// Employees of `role` on `shift` that day.
    pub fn coverage_count(&self, m: &DecisionMatrix, day: Day, shift: ShiftType, role: Role) -> u32 {
        self.model
            .members(role)
            .iter()
            .filter(|&&employee| m.get(employee, day, shift))
            .count() as u32
    }

    /// Headcount equals the requirement exactly.
    pub fn coverage_holds(&self, m: &DecisionMatrix, day: Day, shift: ShiftType, role: Role) -> bool {
        self.coverage_count(m, day, shift, role) == self.model.required_count(shift, role)
    }

    /// `x[e, d, Morning] => !x[e, d-1, Night]`. Vacuous on day 0.
    pub fn rest_holds(&self, m: &DecisionMatrix, employee: usize, day: Day) -> bool {
        day == 0
            || !(m.get(employee, day, ShiftType::Morning)
                && m.get(employee, day - 1, ShiftType::Night))
    }

    /// The 7-day window starting at `start` contains at least one OFF day.
    pub fn window_holds(&self, m: &DecisionMatrix, employee: usize, start: Day) -> bool {
        m.worked_days_in(employee, start..start + WINDOW_DAYS) <= MAX_CONSECUTIVE_DAYS
    }

    /// Start days of all windows fully inside the horizon.
    pub fn window_starts(&self) -> Range<Day> {
        0..(self.model.horizon() + 1).saturating_sub(WINDOW_DAYS)
    }

    /// Start days of the in-horizon windows that contain `day`.
    pub fn windows_covering(&self, day: Day) -> Range<Day> {
        let all = self.window_starts();
        let first = (day + 1).saturating_sub(WINDOW_DAYS).max(all.start);
        let last = (day + 1).min(all.end);
        first..last.max(first)
    }

    /// Every employee-local rule touched by the cell `(employee, day)`:
    /// capability, single shift, rest on `day` and `day + 1`, and all
    /// windows containing `day`.
    pub fn employee_day_holds(&self, m: &DecisionMatrix, employee: usize, day: Day) -> bool {
        self.capability_holds(m, employee, day)
            && self.at_most_one_holds(m, employee, day)
            && self.rest_holds(m, employee, day)
            && (day + 1 >= self.model.horizon() || self.rest_holds(m, employee, day + 1))
            && self
                .windows_covering(day)
                .all(|start| self.window_holds(m, employee, start))
    }

    /// Whether turning `x[employee, day, shift]` on keeps every employee-local
    /// rule satisfied. The matrix is left unchanged.
    pub fn admits(&self, m: &mut DecisionMatrix, employee: usize, day: Day, shift: ShiftType) -> bool {
        if m.get(employee, day, shift) {
            return false;
        }
        m.set(employee, day, shift, true);
        let ok = self.employee_day_holds(m, employee, day);
        m.set(employee, day, shift, false);
        ok
    }
}
