use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{Result, SkinportError};

// ---------------------------------------------------------------------------
// FilterConfig: Thresholds for one filter invocation
// ---------------------------------------------------------------------------

/// Thresholds and category switches applied by [`crate::filter::filter`].
///
/// Prices are compared against the item's lowest listing (`min_price`), in
/// the same currency units upstream reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub min_discount_percent: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub knife_only: bool,
    pub glove_only: bool,
    pub exclude_stattrak: bool,
    pub currency: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_discount_percent: 0.0,
            min_price: 0.0,
            max_price: 100_000.0,
            knife_only: false,
            glove_only: false,
            exclude_stattrak: false,
            currency: config::DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl FilterConfig {
    /// Build a config from user-entered text, as typed into a form or prompt.
    ///
    /// Non-numeric input yields [`SkinportError::Validation`]; the result is
    /// also run through [`validate`](Self::validate).
    pub fn from_strings(min_discount_percent: &str, min_price: &str, currency: &str) -> Result<Self> {
        let cfg = Self {
            min_discount_percent: parse_number("minimum discount", min_discount_percent)?,
            min_price: parse_number("minimum price", min_price)?,
            currency: currency.trim().to_uppercase(),
            ..Self::default()
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject thresholds that cannot describe any sensible search.
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("min_discount_percent", self.min_discount_percent),
            ("min_price", self.min_price),
            ("max_price", self.max_price),
        ] {
            if !value.is_finite() {
                return Err(SkinportError::Validation(format!(
                    "{label} must be a finite number, got {value}"
                )));
            }
        }
        if self.min_discount_percent > 100.0 {
            return Err(SkinportError::Validation(format!(
                "min_discount_percent cannot exceed 100, got {}",
                self.min_discount_percent
            )));
        }
        if self.min_price < 0.0 {
            return Err(SkinportError::Validation(format!(
                "min_price cannot be negative, got {}",
                self.min_price
            )));
        }
        if self.max_price < self.min_price {
            return Err(SkinportError::Validation(format!(
                "max_price ({}) is below min_price ({})",
                self.max_price, self.min_price
            )));
        }
        if self.knife_only && self.glove_only {
            return Err(SkinportError::Validation(
                "knife_only and glove_only are mutually exclusive".into(),
            ));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(SkinportError::Validation(format!(
                "currency must be a three-letter code, got {:?}",
                self.currency
            )));
        }
        Ok(())
    }
}

fn parse_number(label: &str, raw: &str) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|_| {
        SkinportError::Validation(format!("{label} must be a number, got {raw:?}"))
    })
}
