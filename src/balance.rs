use log::{debug, info};

use crate::config::BalanceConfig;
use crate::encoder::{ConstraintEncoder, DecisionMatrix};
use crate::model::{Day, DomainModel, Role, ShiftType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swap {
    pub role: Role,
    pub from: usize,
    pub to: usize,
    pub day: Day,
    pub shift: ShiftType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceReport {
    pub swaps: Vec<Swap>,
    /// True when no improving swap remained for a role still above target.
    pub stuck: bool,
}

/// Current max-min spread of shift counts among members of `role`.
pub fn spread(model: &DomainModel, m: &DecisionMatrix, role: Role) -> u32 {
    let totals = model.members(role).iter().map(|&e| m.shift_count(e));
    let (min, max) = totals.fold((u32::MAX, 0), |(lo, hi), t| (lo.min(t), hi.max(t)));
    max.saturating_sub(min)
}

/// Evens out shift counts within each role by handing single shifts from
/// heavy to light employees. `m` must be feasible on entry and stays feasible
/// after every swap; the result is a local optimum.
pub fn rebalance(model: &DomainModel, m: &mut DecisionMatrix, config: &BalanceConfig) -> BalanceReport {
    let encoder = ConstraintEncoder::new(model);
    let mut report = BalanceReport::default();

    for _ in 0..config.max_iterations {
        let over_target: Vec<Role> = Role::ALL
            .into_iter()
            .filter(|&role| spread(model, m, role) > config.target_spread)
            .collect();
        if over_target.is_empty() {
            break;
        }

        let swap = over_target
            .iter()
            .find_map(|&role| find_swap(&encoder, m, role));
        match swap {
            Some(swap) => {
                debug!(
                    "{:?}: moved {:?} on day {} from employee {} to employee {}",
                    swap.role,
                    swap.shift,
                    swap.day,
                    model.employee(swap.from).id,
                    model.employee(swap.to).id
                );
                report.swaps.push(swap);
            }
            None => {
                report.stuck = true;
                break;
            }
        }
    }

    info!(
        "Balance pass applied {} swaps; spreads {:?}",
        report.swaps.len(),
        Role::ALL.map(|role| spread(model, m, role))
    );
    report
}

/// Finds and applies the first improving swap for `role`.
///
/// Donors are tried from most to least loaded and receivers from least to
/// most loaded; a pair is only considered while the donor has at least two
/// more shifts than the receiver. Days are scanned in ascending order.
fn find_swap(encoder: &ConstraintEncoder<'_>, m: &mut DecisionMatrix, role: Role) -> Option<Swap> {
    let model = encoder.model();
    let mut ranked: Vec<(u32, u32, usize)> = model
        .members(role)
        .iter()
        .map(|&e| (m.shift_count(e), model.employee(e).id, e))
        .collect();
    ranked.sort_unstable_by_key(|&(total, id, _)| (total, id));

    let donors: Vec<(u32, usize)> = ranked
        .iter()
        .rev()
        .map(|&(total, _, e)| (total, e))
        .collect();

    for &(donor_total, from) in &donors {
        for &(receiver_total, _, to) in &ranked {
            if donor_total < receiver_total + 2 {
                break;
            }
            for day in 0..model.horizon() {
                let Some(shift) = m.assignment(from, day).shift() else {
                    continue;
                };
                if !model.is_eligible(role, shift) || m.works(to, day) {
                    continue;
                }
                m.set(from, day, shift, false);
                m.set(to, day, shift, true);
                if encoder.employee_day_holds(m, to, day) {
                    return Some(Swap {
                        role,
                        from,
                        to,
                        day,
                        shift,
                    });
                }
                m.set(to, day, shift, false);
                m.set(from, day, shift, true);
            }
        }
    }
    None
}
