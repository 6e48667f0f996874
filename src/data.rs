use serde::{Deserialize, Serialize};

use crate::config::SolverConfig;
use crate::error::ConfigError;
use crate::model::{
    Assignment, CapabilityTable, CapacityShortfall, DomainModel, Employee, EmployeeId,
    RequirementTable, Role,
};
use crate::schedule::RoleStats;
use crate::solver::Feasibility;

/// The complete input for one solve.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingInput {
    pub horizon: u32,
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub capabilities: CapabilityTable,
    #[serde(default)]
    pub requirements: RequirementTable,
    #[serde(default)]
    pub config: SolverConfig,
}

impl SchedulingInput {
    /// Reference tables, default configuration.
    pub fn standard(horizon: u32, employees: Vec<Employee>) -> Self {
        Self {
            horizon,
            employees,
            capabilities: CapabilityTable::standard(),
            requirements: RequirementTable::standard(),
            config: SolverConfig::default(),
        }
    }

    pub fn into_model(self) -> Result<(DomainModel, SolverConfig), ConfigError> {
        let model = DomainModel::new(
            self.horizon,
            self.employees,
            self.capabilities,
            self.requirements,
        )?;
        Ok((model, self.config))
    }
}

/// One employee's row of the finished schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSchedule {
    pub employee_id: EmployeeId,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub shifts: Vec<Assignment>,
    pub total_shifts: u32,
}

/// The final output of the solver.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingOutput {
    pub status: Feasibility,
    pub schedule: Vec<EmployeeSchedule>,
    pub role_stats: Vec<RoleStats>,
    pub shortfalls: Vec<CapacityShortfall>,
    pub backtracks: u64,
    pub balance_swaps: usize,
    pub elapsed_ms: u64,
}
