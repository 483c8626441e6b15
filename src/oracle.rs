use async_trait::async_trait;
use rand::Rng;

use crate::command::Balance;

/// External source of an authoritative account balance.
///
/// Lookups are allowed to fail, in which case `None` is returned and the
/// caller decides what to do with the missing value.
#[async_trait]
pub trait BalanceOracle: Send + Sync {
    async fn fetch_balance(&self) -> Option<Balance>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OracleConfig {
    /// Upper bound (inclusive) of a generated balance.
    pub max_balance: Balance,
    /// Probability in `[0, 1]` that a lookup yields no data.
    pub failure_rate: f64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            max_balance: 100,
            failure_rate: 0.5,
        }
    }
}

/// Simulates an unreliable remote balance service.
#[derive(Debug, Clone, Default)]
pub struct RandomBalanceOracle {
    config: OracleConfig,
}

impl RandomBalanceOracle {
    pub fn new(config: OracleConfig) -> Self {
        let failure_rate = if config.failure_rate.is_nan() {
            0.0
        } else {
            config.failure_rate.clamp(0.0, 1.0)
        };
        Self {
            config: OracleConfig {
                failure_rate,
                ..config
            },
        }
    }

    pub fn config(&self) -> OracleConfig {
        self.config
    }
}

#[async_trait]
impl BalanceOracle for RandomBalanceOracle {
    async fn fetch_balance(&self) -> Option<Balance> {
        let mut rng = rand::thread_rng();
        if rng.gen_bool(self.config.failure_rate) {
            None
        } else {
            Some(rng.gen_range(0..=self.config.max_balance))
        }
    }
}

/// Always resolves to the same lookup result.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticBalanceOracle(pub Option<Balance>);

#[async_trait]
impl BalanceOracle for StaticBalanceOracle {
    async fn fetch_balance(&self) -> Option<Balance> {
        self.0
    }
}
