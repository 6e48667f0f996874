use serde::Serialize;

use crate::encoder::DecisionMatrix;
use crate::error::ConfigError;
use crate::model::{Assignment, Day, DomainModel, EmployeeId, Role, ShiftType};

/// Spread of total shift counts among employees sharing a role.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleStats {
    pub role: Role,
    pub min: u32,
    pub max: u32,
    pub spread: u32,
    pub mean: f64,
}

/// Total shifts worked by one employee over the horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeWorkload {
    pub employee_id: EmployeeId,
    pub role: Role,
    pub total_shifts: u32,
}

/// A complete assignment of every employee to a shift or OFF on every day.
///
/// Rows follow the roster order of the model the schedule was built for.
/// A schedule owns its data outright; the engine keeps no reference to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    employee_ids: Vec<EmployeeId>,
    roles: Vec<Role>,
    matrix: DecisionMatrix,
}

impl Schedule {
    /// Everyone OFF on every day.
    pub fn empty(model: &DomainModel) -> Self {
        Self::from_matrix(model, DecisionMatrix::for_model(model))
    }

    pub(crate) fn from_matrix(model: &DomainModel, matrix: DecisionMatrix) -> Self {
        Self {
            employee_ids: model.employees().iter().map(|e| e.id).collect(),
            roles: model.employees().iter().map(|e| e.role).collect(),
            matrix,
        }
    }

    /// Builds a schedule from explicit per-employee rows. Employees without a
    /// row are OFF for the whole horizon.
    pub fn from_assignments<I>(model: &DomainModel, rows: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (EmployeeId, Vec<Assignment>)>,
    {
        let mut schedule = Self::empty(model);
        for (id, row) in rows {
            let employee = model.index_of(id).ok_or(ConfigError::UnknownEmployee(id))?;
            if row.len() != model.horizon() {
                return Err(ConfigError::RowLength {
                    employee: id,
                    expected: model.horizon(),
                    actual: row.len(),
                });
            }
            for (day, assignment) in row.into_iter().enumerate() {
                for shift in ShiftType::ALL {
                    schedule.matrix.set(employee, day, shift, false);
                }
                if let Some(shift) = assignment.shift() {
                    schedule.matrix.set(employee, day, shift, true);
                }
            }
        }
        Ok(schedule)
    }

    /// Returns the schedule with one more shift booked for `(id, day)`,
    /// on top of whatever the employee already has that day.
    pub fn with_booking(mut self, id: EmployeeId, day: Day, shift: ShiftType) -> Result<Self, ConfigError> {
        let employee = self.position(id).ok_or(ConfigError::UnknownEmployee(id))?;
        if day >= self.horizon() {
            return Err(ConfigError::DayOutOfRange {
                day,
                horizon: self.horizon(),
            });
        }
        self.matrix.set(employee, day, shift, true);
        Ok(self)
    }

    pub fn horizon(&self) -> usize {
        self.matrix.horizon()
    }

    pub fn employee_ids(&self) -> &[EmployeeId] {
        &self.employee_ids
    }

    pub fn matrix(&self) -> &DecisionMatrix {
        &self.matrix
    }

    fn position(&self, id: EmployeeId) -> Option<usize> {
        self.employee_ids.iter().position(|&e| e == id)
    }

    pub fn assignment(&self, id: EmployeeId, day: Day) -> Option<Assignment> {
        let employee = self.position(id)?;
        (day < self.horizon()).then(|| self.matrix.assignment(employee, day))
    }

    /// The employee's assignments for each day of the horizon.
    pub fn row(&self, id: EmployeeId) -> Option<Vec<Assignment>> {
        self.position(id).map(|employee| self.row_at(employee))
    }

    fn row_at(&self, employee: usize) -> Vec<Assignment> {
        (0..self.horizon())
            .map(|day| self.matrix.assignment(employee, day))
            .collect()
    }

    /// `(id, role, assignments)` for every employee in roster order.
    pub fn rows(&self) -> impl Iterator<Item = (EmployeeId, Role, Vec<Assignment>)> + '_ {
        self.employee_ids
            .iter()
            .zip(&self.roles)
            .enumerate()
            .map(|(employee, (&id, &role))| (id, role, self.row_at(employee)))
    }

    pub fn total_shifts(&self, id: EmployeeId) -> Option<u32> {
        self.position(id).map(|employee| self.matrix.shift_count(employee))
    }

    pub fn workload(&self) -> Vec<EmployeeWorkload> {
        self.employee_ids
            .iter()
            .zip(&self.roles)
            .enumerate()
            .map(|(employee, (&employee_id, &role))| EmployeeWorkload {
                employee_id,
                role,
                total_shifts: self.matrix.shift_count(employee),
            })
            .collect()
    }

    /// Min/max/spread of total shifts per role. Roles with nobody are omitted.
    pub fn role_stats(&self) -> Vec<RoleStats> {
        Role::ALL
            .into_iter()
            .filter_map(|role| {
                let totals: Vec<u32> = self
                    .roles
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| **r == role)
                    .map(|(employee, _)| self.matrix.shift_count(employee))
                    .collect();
                let min = *totals.iter().min()?;
                let max = *totals.iter().max()?;
                let mean = totals.iter().sum::<u32>() as f64 / totals.len() as f64;
                Some(RoleStats {
                    role,
                    min,
                    max,
                    spread: max - min,
                    mean,
                })
            })
            .collect()
    }

    /// Employees on `shift` that day, grouped by role in role order.
    pub fn shift_roster(&self, day: Day, shift: ShiftType) -> Vec<(Role, Vec<EmployeeId>)> {
        if day >= self.horizon() {
            return Vec::new();
        }
        Role::ALL
            .into_iter()
            .map(|role| {
                let ids = self
                    .employee_ids
                    .iter()
                    .zip(&self.roles)
                    .enumerate()
                    .filter(|(employee, (_, r))| **r == role && self.matrix.get(*employee, day, shift))
                    .map(|(_, (&id, _))| id)
                    .collect();
                (role, ids)
            })
            .collect()
    }
}
