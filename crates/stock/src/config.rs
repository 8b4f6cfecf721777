//! Engine configuration.

use std::time::Duration;

use tracing::warn;

use foodbank_core::{DomainError, OperatorId};

use crate::movement::Operator;

pub const ENV_EXPIRING_DAYS: &str = "FOODBANK_EXPIRING_DAYS";
pub const ENV_CRITICAL_THRESHOLD: &str = "FOODBANK_CRITICAL_THRESHOLD";
pub const ENV_SYSTEM_OPERATOR_ID: &str = "FOODBANK_SYSTEM_OPERATOR_ID";
pub const ENV_SYSTEM_OPERATOR_NAME: &str = "FOODBANK_SYSTEM_OPERATOR_NAME";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "FOODBANK_SWEEP_INTERVAL_SECS";

/// Stock engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockConfig {
    /// Default look-ahead for expiring-lot scans, in days.
    pub expiring_days_threshold: i64,
    /// Default threshold under which a product counts as critical.
    pub critical_stock_threshold: i64,
    /// Actor recorded on movements that have no human operator.
    pub system_operator_id: String,
    pub system_operator_name: String,
    /// How often the background sweeper expires lots.
    pub sweep_interval: Duration,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            expiring_days_threshold: 3,
            critical_stock_threshold: 6,
            system_operator_id: "system".to_string(),
            system_operator_name: "System".to_string(),
            sweep_interval: Duration::from_secs(60 * 60),
        }
    }
}

impl StockConfig {
    /// Load from `FOODBANK_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup (env, file, test map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let sweep_secs = parse_or(&lookup, ENV_SWEEP_INTERVAL_SECS, defaults.sweep_interval.as_secs());

        Self {
            expiring_days_threshold: parse_or(&lookup, ENV_EXPIRING_DAYS, defaults.expiring_days_threshold),
            critical_stock_threshold: parse_or(
                &lookup,
                ENV_CRITICAL_THRESHOLD,
                defaults.critical_stock_threshold,
            ),
            system_operator_id: non_blank(&lookup, ENV_SYSTEM_OPERATOR_ID)
                .unwrap_or(defaults.system_operator_id),
            system_operator_name: non_blank(&lookup, ENV_SYSTEM_OPERATOR_NAME)
                .unwrap_or(defaults.system_operator_name),
            sweep_interval: Duration::from_secs(sweep_secs.max(1)),
        }
    }

    pub fn with_expiring_days_threshold(mut self, days: i64) -> Self {
        self.expiring_days_threshold = days;
        self
    }

    pub fn with_critical_stock_threshold(mut self, threshold: i64) -> Self {
        self.critical_stock_threshold = threshold;
        self
    }

    pub fn with_system_operator(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.system_operator_id = id.into();
        self.system_operator_name = name.into();
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// The configured system actor.
    pub fn system_operator(&self) -> Result<Operator, DomainError> {
        Ok(Operator::new(
            OperatorId::new(self.system_operator_id.clone())?,
            self.system_operator_name.clone(),
        ))
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + core::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!(key, value = %raw, default = %default, "unparseable config value; using default");
                default
            }
        },
    }
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}
