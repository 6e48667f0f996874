use serde::Serialize;
use std::fmt;

use crate::encoder::{ConstraintEncoder, DecisionMatrix, WINDOW_DAYS};
use crate::model::{Day, DomainModel, EmployeeId, Role, ShiftType};
use crate::schedule::Schedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    /// The schedule was not built for this model's roster or horizon.
    RosterMismatch,
    DoubleBooked,
    CapabilityMismatch,
    CoverageMismatch,
    MorningAfterNight,
    ConsecutiveDayCapExceeded,
}

/// One broken rule. Coverage violations name a role instead of an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub kind: ViolationKind,
    pub employee: Option<EmployeeId>,
    pub role: Option<Role>,
    pub day: Day,
    pub shift: Option<ShiftType>,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

/// Every violation of the five schedule invariants, in a stable order.
/// An empty list means the schedule is valid.
///
/// Rows are matched to the model's roster by employee id. Rows for ids the
/// model does not know and a horizon that differs from the model's are
/// reported as [`ViolationKind::RosterMismatch`] ahead of everything else;
/// the remaining checks then see only the model's employees and days.
pub fn validate(model: &DomainModel, schedule: &Schedule) -> Vec<Violation> {
    let encoder = ConstraintEncoder::new(model);
    let aligned = align(model, schedule);
    let m = &aligned;
    let horizon = model.horizon();
    let employees = model.employees().len();
    let mut violations = Vec::new();

    for &id in schedule.employee_ids() {
        if model.index_of(id).is_none() {
            violations.push(Violation {
                kind: ViolationKind::RosterMismatch,
                employee: Some(id),
                role: None,
                day: 0,
                shift: None,
                message: format!("employee {id} is not on the roster"),
            });
        }
    }
    if schedule.horizon() != horizon {
        violations.push(Violation {
            kind: ViolationKind::RosterMismatch,
            employee: None,
            role: None,
            day: schedule.horizon().min(horizon),
            shift: None,
            message: format!(
                "schedule covers {} days but the horizon is {horizon}",
                schedule.horizon()
            ),
        });
    }

    for day in 0..horizon {
        for employee in 0..employees {
            if encoder.at_most_one_holds(m, employee, day) {
                continue;
            }
            let id = model.employee(employee).id;
            for shift in m.shifts_on(employee, day).skip(1) {
                violations.push(Violation {
                    kind: ViolationKind::DoubleBooked,
                    employee: Some(id),
                    role: Some(model.role_of(employee)),
                    day,
                    shift: Some(shift),
                    message: format!("employee {id} holds more than one shift on day {day}, including {shift:?}"),
                });
            }
        }
    }

    for day in 0..horizon {
        for employee in 0..employees {
            if encoder.capability_holds(m, employee, day) {
                continue;
            }
            let emp = model.employee(employee);
            for shift in m
                .shifts_on(employee, day)
                .filter(|&shift| !model.is_eligible(emp.role, shift))
            {
                violations.push(Violation {
                    kind: ViolationKind::CapabilityMismatch,
                    employee: Some(emp.id),
                    role: Some(emp.role),
                    day,
                    shift: Some(shift),
                    message: format!("{:?} {} may not work {shift:?} (day {day})", emp.role, emp.id),
                });
            }
        }
    }

    for day in 0..horizon {
        for shift in ShiftType::ALL {
            for role in Role::ALL {
                if encoder.coverage_holds(m, day, shift, role) {
                    continue;
                }
                let actual = encoder.coverage_count(m, day, shift, role);
                let required = model.required_count(shift, role);
                violations.push(Violation {
                    kind: ViolationKind::CoverageMismatch,
                    employee: None,
                    role: Some(role),
                    day,
                    shift: Some(shift),
                    message: format!("day {day} {shift:?} has {actual} {role:?}(s), requires exactly {required}"),
                });
            }
        }
    }

    for day in 1..horizon {
        for employee in 0..employees {
            if encoder.rest_holds(m, employee, day) {
                continue;
            }
            let id = model.employee(employee).id;
            violations.push(Violation {
                kind: ViolationKind::MorningAfterNight,
                employee: Some(id),
                role: Some(model.role_of(employee)),
                day,
                shift: Some(ShiftType::Morning),
                message: format!("employee {id} works Morning on day {day} after Night on day {}", day - 1),
            });
        }
    }

    for start in encoder.window_starts() {
        for employee in 0..employees {
            if encoder.window_holds(m, employee, start) {
                continue;
            }
            let id = model.employee(employee).id;
            let day = start + WINDOW_DAYS - 1;
            violations.push(Violation {
                kind: ViolationKind::ConsecutiveDayCapExceeded,
                employee: Some(id),
                role: Some(model.role_of(employee)),
                day,
                shift: m.shifts_on(employee, day).next(),
                message: format!("employee {id} has no day off between day {start} and day {day}"),
            });
        }
    }

    violations
}

/// Copies the schedule into a matrix laid out by the model's roster, matching
/// rows by employee id. Employees the schedule does not mention are OFF;
/// days past the schedule's horizon are OFF.
fn align(model: &DomainModel, schedule: &Schedule) -> DecisionMatrix {
    let source = schedule.matrix();
    let mut aligned = DecisionMatrix::for_model(model);
    let days = model.horizon().min(source.horizon());
    for (from, &id) in schedule.employee_ids().iter().enumerate() {
        let Some(to) = model.index_of(id) else {
            continue;
        };
        for day in 0..days {
            for shift in source.shifts_on(from, day) {
                aligned.set(to, day, shift, true);
            }
        }
    }
    aligned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Assignment::{Day as D, Morning as M, Night as N, Off as O};
    use crate::model::{reference_roster, Employee};

    fn kinds(violations: &[Violation]) -> Vec<ViolationKind> {
        violations.iter().map(|v| v.kind).collect()
    }

    #[test]
    fn empty_schedule_only_breaks_coverage() {
        let model = DomainModel::standard(7, reference_roster()).unwrap();
        let violations = validate(&model, &Schedule::empty(&model));

        // 7 non-zero requirement entries per day
        assert_eq!(violations.len(), 7 * 7);
        assert!(violations.iter().all(|v| v.kind == ViolationKind::CoverageMismatch));
        assert!(violations.iter().all(|v| v.employee.is_none()));
    }

    #[test]
    fn supervisor_on_night_is_a_capability_mismatch() {
        let model = DomainModel::standard(3, vec![Employee::new(1, Role::Supervisor)]).unwrap();
        let schedule = Schedule::from_assignments(&model, [(1, vec![M, N, O])]).unwrap();
        let violations: Vec<_> = validate(&model, &schedule)
            .into_iter()
            .filter(|v| v.kind == ViolationKind::CapabilityMismatch)
            .collect();

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].employee, Some(1));
        assert_eq!(violations[0].day, 1);
        assert_eq!(violations[0].shift, Some(ShiftType::Night));
    }

    #[test]
    fn second_shift_same_day_is_double_booked() {
        let model = DomainModel::standard(3, vec![Employee::new(5, Role::Worker)]).unwrap();
        let schedule = Schedule::from_assignments(&model, [(5, vec![D, O, O])])
            .unwrap()
            .with_booking(5, 0, ShiftType::Night)
            .unwrap();
        let violations = validate(&model, &schedule);

        assert_eq!(kinds(&violations)[0], ViolationKind::DoubleBooked);
        assert_eq!(violations[0].employee, Some(5));
        assert_eq!(violations[0].shift, Some(ShiftType::Night));
        assert_eq!(
            violations
                .iter()
                .filter(|v| v.kind == ViolationKind::DoubleBooked)
                .count(),
            1
        );
    }

    #[test]
    fn over_coverage_is_reported() {
        let requirements = crate::model::RequirementTable::empty().with(ShiftType::Day, Role::Worker, 1);
        let model = DomainModel::new(
            1,
            vec![Employee::new(1, Role::Worker), Employee::new(2, Role::Worker)],
            Default::default(),
            requirements,
        )
        .unwrap();
        let schedule = Schedule::from_assignments(&model, [(1, vec![D]), (2, vec![D])]).unwrap();
        let violations = validate(&model, &schedule);

        assert_eq!(kinds(&violations), vec![ViolationKind::CoverageMismatch]);
        assert_eq!(violations[0].role, Some(Role::Worker));
        assert!(violations[0].message.contains("has 2"));
    }

    #[test]
    fn schedule_for_another_roster_is_a_mismatch() {
        let other = DomainModel::standard(8, vec![Employee::new(1, Role::Worker), Employee::new(9, Role::Worker)])
            .unwrap();
        let schedule = Schedule::from_assignments(&other, [(9, vec![D; 8])]).unwrap();
        let model = DomainModel::standard(7, vec![Employee::new(1, Role::Worker)]).unwrap();

        let mismatches: Vec<_> = validate(&model, &schedule)
            .into_iter()
            .filter(|v| v.kind == ViolationKind::RosterMismatch)
            .collect();
        assert_eq!(mismatches.len(), 2);
        assert_eq!(mismatches[0].employee, Some(9));
        assert_eq!((mismatches[1].employee, mismatches[1].day), (None, 7));
    }

    #[test]
    fn matching_roster_has_no_mismatch() {
        let model = DomainModel::standard(7, reference_roster()).unwrap();
        let violations = validate(&model, &Schedule::empty(&model));
        assert!(violations.iter().all(|v| v.kind != ViolationKind::RosterMismatch));
    }

    #[test]
    fn window_violation_reported_per_window() {
        let model = DomainModel::standard(8, vec![Employee::new(3, Role::Worker)]).unwrap();
        let schedule = Schedule::from_assignments(&model, [(3, vec![D; 8])]).unwrap();
        let capped: Vec<_> = validate(&model, &schedule)
            .into_iter()
            .filter(|v| v.kind == ViolationKind::ConsecutiveDayCapExceeded)
            .collect();

        assert_eq!(capped.len(), 2);
        assert_eq!(capped[0].day, 6);
        assert_eq!(capped[1].day, 7);
        assert_eq!(capped[0].shift, Some(ShiftType::Day));
    }
}
