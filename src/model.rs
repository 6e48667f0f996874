use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use crate::error::ConfigError;

pub type EmployeeId = u32;
pub type Day = usize;

/// An employee's job category. Determines which shifts they may work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Supervisor,
    Mechanic,
    Worker,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Supervisor, Role::Mechanic, Role::Worker];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One of the three real shifts of a day.
///
/// Declaration order is the order the search fills a day in: Morning first,
/// since it is the only shift constrained by the previous day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    Morning,
    Day,
    Night,
}

impl ShiftType {
    pub const ALL: [ShiftType; 3] = [ShiftType::Morning, ShiftType::Day, ShiftType::Night];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// What an employee does on one day: a shift, or OFF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Assignment {
    #[default]
    Off,
    Morning,
    Day,
    Night,
}

impl Assignment {
    pub fn shift(self) -> Option<ShiftType> {
        match self {
            Assignment::Off => None,
            Assignment::Morning => Some(ShiftType::Morning),
            Assignment::Day => Some(ShiftType::Day),
            Assignment::Night => Some(ShiftType::Night),
        }
    }

    pub fn is_working(self) -> bool {
        self != Assignment::Off
    }
}

impl From<ShiftType> for Assignment {
    fn from(shift: ShiftType) -> Self {
        match shift {
            ShiftType::Morning => Assignment::Morning,
            ShiftType::Day => Assignment::Day,
            ShiftType::Night => Assignment::Night,
        }
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Assignment::Off => "OFF",
            Assignment::Morning => "MORNING",
            Assignment::Day => "DAY",
            Assignment::Night => "NIGHT",
        };
        f.write_str(label)
    }
}

/// A member of the fixed workforce. Immutable for the duration of a solve.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl Employee {
    pub fn new(id: EmployeeId, role: Role) -> Self {
        Self {
            id,
            role,
            full_name: None,
        }
    }
}

/// The reference roster: 5 supervisors, 10 mechanics and 15 workers, ids 1..=30.
pub fn reference_roster() -> Vec<Employee> {
    let counts = [(Role::Supervisor, 5), (Role::Mechanic, 10), (Role::Worker, 15)];
    let mut next_id = 1;
    let mut roster = Vec::with_capacity(30);
    for (role, count) in counts {
        for _ in 0..count {
            roster.push(Employee::new(next_id, role));
            next_id += 1;
        }
    }
    roster
}

/// Role -> shifts the role may be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CapabilityTable(BTreeMap<Role, BTreeSet<ShiftType>>);

impl CapabilityTable {
    /// Supervisors work mornings only; mechanics and workers work any shift.
    pub fn standard() -> Self {
        let mut table = BTreeMap::new();
        table.insert(Role::Supervisor, BTreeSet::from([ShiftType::Morning]));
        table.insert(Role::Mechanic, ShiftType::ALL.into_iter().collect());
        table.insert(Role::Worker, ShiftType::ALL.into_iter().collect());
        Self(table)
    }

    pub fn allows(&self, role: Role, shift: ShiftType) -> bool {
        self.0.get(&role).is_some_and(|shifts| shifts.contains(&shift))
    }
}

impl Default for CapabilityTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// (shift, role) -> headcount, applied identically to every day of the horizon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct RequirementTable(BTreeMap<ShiftType, BTreeMap<Role, u32>>);

impl RequirementTable {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Morning{S:1, M:1, W:1}, Day{M:1, W:2}, Night{M:1, W:1}.
    pub fn standard() -> Self {
        Self::empty()
            .with(ShiftType::Morning, Role::Supervisor, 1)
            .with(ShiftType::Morning, Role::Mechanic, 1)
            .with(ShiftType::Morning, Role::Worker, 1)
            .with(ShiftType::Day, Role::Mechanic, 1)
            .with(ShiftType::Day, Role::Worker, 2)
            .with(ShiftType::Night, Role::Mechanic, 1)
            .with(ShiftType::Night, Role::Worker, 1)
    }

    /// Returns the table with the headcount for `(shift, role)` replaced.
    pub fn with(mut self, shift: ShiftType, role: Role, count: u32) -> Self {
        self.0.entry(shift).or_default().insert(role, count);
        self
    }

    pub fn required(&self, shift: ShiftType, role: Role) -> u32 {
        self.0
            .get(&shift)
            .and_then(|roles| roles.get(&role))
            .copied()
            .unwrap_or(0)
    }

    /// Non-zero entries in (shift, role) order.
    pub fn entries(&self) -> impl Iterator<Item = (ShiftType, Role, u32)> + '_ {
        self.0.iter().flat_map(|(&shift, roles)| {
            roles
                .iter()
                .filter(|(_, count)| **count > 0)
                .map(move |(&role, &count)| (shift, role, count))
        })
    }

    /// Headcount of `role` needed across all shifts of a single day.
    pub fn daily_total(&self, role: Role) -> u32 {
        ShiftType::ALL
            .iter()
            .map(|&shift| self.required(shift, role))
            .sum()
    }
}

impl Default for RequirementTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// A role that cannot staff its own daily requirement even once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityShortfall {
    pub role: Role,
    pub required_per_day: u32,
    pub available: u32,
}

/// Static description of the workforce and what each day needs.
///
/// Built once before a solve and read-only afterwards. Employees are
/// addressed internally by their position in the roster.
#[derive(Debug, Clone)]
pub struct DomainModel {
    horizon: usize,
    employees: Vec<Employee>,
    capabilities: CapabilityTable,
    requirements: RequirementTable,
    members: [Vec<usize>; 3],
}

impl DomainModel {
    pub fn new(
        horizon: u32,
        employees: Vec<Employee>,
        capabilities: CapabilityTable,
        requirements: RequirementTable,
    ) -> Result<Self, ConfigError> {
        if horizon == 0 {
            return Err(ConfigError::NonPositiveHorizon);
        }
        if employees.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }

        let mut seen = HashSet::new();
        for employee in &employees {
            if !seen.insert(employee.id) {
                return Err(ConfigError::DuplicateEmployee(employee.id));
            }
        }

        for (shift, role, count) in requirements.entries() {
            if !capabilities.allows(role, shift) {
                return Err(ConfigError::IneligibleRequirement { shift, role, count });
            }
        }

        let mut members: [Vec<usize>; 3] = Default::default();
        for (index, employee) in employees.iter().enumerate() {
            members[employee.role.index()].push(index);
        }

        Ok(Self {
            horizon: horizon as usize,
            employees,
            capabilities,
            requirements,
            members,
        })
    }

    /// Model with the standard capability and requirement tables.
    pub fn standard(horizon: u32, employees: Vec<Employee>) -> Result<Self, ConfigError> {
        Self::new(
            horizon,
            employees,
            CapabilityTable::standard(),
            RequirementTable::standard(),
        )
    }

    pub fn is_eligible(&self, role: Role, shift: ShiftType) -> bool {
        self.capabilities.allows(role, shift)
    }

    pub fn required_count(&self, shift: ShiftType, role: Role) -> u32 {
        self.requirements.required(shift, role)
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn employee(&self, index: usize) -> &Employee {
        &self.employees[index]
    }

    pub fn role_of(&self, index: usize) -> Role {
        self.employees[index].role
    }

    /// Roster positions of every employee holding `role`, in roster order.
    pub fn members(&self, role: Role) -> &[usize] {
        &self.members[role.index()]
    }

    pub fn index_of(&self, id: EmployeeId) -> Option<usize> {
        self.employees.iter().position(|e| e.id == id)
    }

    pub fn requirements(&self) -> &RequirementTable {
        &self.requirements
    }

    /// Roles whose headcount is below what a single day needs of them.
    ///
    /// A necessary, not sufficient, condition for feasibility.
    pub fn capacity_shortfalls(&self) -> Vec<CapacityShortfall> {
        Role::ALL
            .into_iter()
            .filter_map(|role| {
                let required_per_day = self.requirements.daily_total(role);
                let available = self.members(role).len() as u32;
                (available < required_per_day).then_some(CapacityShortfall {
                    role,
                    required_per_day,
                    available,
                })
            })
            .collect()
    }
}
