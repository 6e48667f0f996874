use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which feasibility engine runs ahead of the balance pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Day-ordered backtracking search.
    #[default]
    Search,
    /// Integer program with a min-spread objective, solved by HiGHS.
    Ilp,
}

/// Caller-supplied limits on a solve. `None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchBudget {
    /// Backtracks the search may perform before giving up.
    pub max_backtracks: Option<u64>,
    /// Wall-clock limit in milliseconds.
    pub time_limit_ms: Option<u64>,
}

impl SearchBudget {
    pub fn unlimited() -> Self {
        Self {
            max_backtracks: None,
            time_limit_ms: None,
        }
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_backtracks: Some(200_000),
            time_limit_ms: Some(10_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BalanceConfig {
    /// Stop once every role's max-min spread is at or below this.
    pub target_spread: u32,
    /// Upper bound on swap rounds.
    pub max_iterations: u32,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            target_spread: 1,
            max_iterations: 10_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolverConfig {
    pub strategy: Strategy,
    pub budget: SearchBudget,
    pub balance: BalanceConfig,
}

pub const BIND_ADDR_VAR: &str = "SCHEDULER_BIND_ADDR";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let bind_addr = lookup(BIND_ADDR_VAR)
            .filter(|addr| !addr.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        Self { bind_addr }
    }
}
