use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::check_magnitude;
use crate::error::TaxError;

/// Amounts carried from one tax year into the next.
///
/// Produced fresh by each computation and consumed as the following year's
/// input. All amounts are non-negative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryforwardState {
    #[serde(rename = "ma_capital_loss_carryforward", default)]
    pub ma_capital_loss: Decimal,
    #[serde(rename = "us_inv_int_carryforward", default)]
    pub us_investment_interest: Decimal,
    #[serde(rename = "us_short_term_loss_carryforward", default)]
    pub us_short_term_loss: Decimal,
    #[serde(rename = "us_long_term_loss_carryforward", default)]
    pub us_long_term_loss: Decimal,
}

impl CarryforwardState {
    /// Key names used by the persisted record, in write order.
    pub const KEYS: [&'static str; 4] = [
        "ma_capital_loss_carryforward",
        "us_inv_int_carryforward",
        "us_short_term_loss_carryforward",
        "us_long_term_loss_carryforward",
    ];

    pub fn get(&self, key: &str) -> Option<Decimal> {
        match key {
            "ma_capital_loss_carryforward" => Some(self.ma_capital_loss),
            "us_inv_int_carryforward" => Some(self.us_investment_interest),
            "us_short_term_loss_carryforward" => Some(self.us_short_term_loss),
            "us_long_term_loss_carryforward" => Some(self.us_long_term_loss),
            _ => None,
        }
    }

    /// Sets the amount stored under `key`; returns `false` for an unknown key.
    pub fn set(&mut self, key: &str, value: Decimal) -> bool {
        let slot = match key {
            "ma_capital_loss_carryforward" => &mut self.ma_capital_loss,
            "us_inv_int_carryforward" => &mut self.us_investment_interest,
            "us_short_term_loss_carryforward" => &mut self.us_short_term_loss,
            "us_long_term_loss_carryforward" => &mut self.us_long_term_loss,
            _ => return false,
        };
        *slot = value;
        true
    }

    pub fn is_zero(&self) -> bool {
        Self::KEYS
            .iter()
            .all(|key| self.get(key) == Some(Decimal::ZERO))
    }

    pub fn validate(&self) -> Result<(), TaxError> {
        for key in Self::KEYS {
            let value = self.get(key).unwrap_or_default();
            check_magnitude(key, value)?;
            if value < Decimal::ZERO {
                return Err(TaxError::invalid_input(
                    key,
                    format!("carryforward must be non-negative, got {value}"),
                ));
            }
        }
        Ok(())
    }
}
