use rust_decimal::Decimal;
use crate::core::domain::Configuration;

pub mod model;

/// Flat per-day overdue fine: `days_late * rate_per_day`, nothing when the book came
/// back on time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinePolicy {
    rate_per_day: Decimal,
}

impl FinePolicy {
    pub fn new(rate_per_day: Decimal) -> Self {
        Self {
            rate_per_day,
        }
    }

    pub fn from_config(config: &Configuration) -> Self {
        Self::new(config.fine_rate_per_day)
    }

    pub fn assess(&self, days_late: i64) -> Option<Decimal> {
        if days_late <= 0 {
            return None;
        }
        Some(self.rate_per_day * Decimal::from(days_late))
    }
}
