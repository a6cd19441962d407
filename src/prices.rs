//! Prices

use std::{fmt, ops::Deref, str::FromStr};

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur when building or combining prices.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceError {
    /// The input was not a decimal number.
    #[error("invalid price {0:?}")]
    Invalid(String),

    /// Prices cannot be negative.
    #[error("negative price {0}")]
    Negative(Decimal),

    /// A price multiplication exceeded the decimal range.
    #[error("price {price} x {quantity} is out of range")]
    Overflow {
        /// Unit price
        price: Decimal,
        /// Quantity the price was multiplied by
        quantity: u32,
    },
}

/// A non-negative decimal price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price {
    value: Decimal,
}

impl Price {
    /// Creates a new Price
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the value is below zero.
    pub fn new(value: Decimal) -> Result<Self, PriceError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(PriceError::Negative(value));
        }

        Ok(Price { value })
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Overflow`] if the total does not fit in a decimal.
    pub fn times(self, quantity: u32) -> Result<Self, PriceError> {
        self.value
            .checked_mul(Decimal::from(quantity))
            .map(|value| Price { value })
            .ok_or(PriceError::Overflow {
                price: self.value,
                quantity,
            })
    }
}

impl Deref for Price {
    type Target = Decimal;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        let value =
            Decimal::from_str(trimmed).map_err(|_err| PriceError::Invalid(trimmed.to_string()))?;

        Price::new(value)
    }
}
