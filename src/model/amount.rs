//! Amount type for the price of a receipt line item.
//!
//! This module provides the `Amount` type which wraps `Decimal`. Models are asked for a JSON
//! number, but they sometimes send a string such as `"$1,299.00"`, so both are accepted.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// The fewest decimal places that an `Amount` is written with.
const MIN_SCALE: u32 = 2;

/// Represents a price in the (single, implicit) currency of the ledger.
///
/// Display always shows at least two decimal places, so `8.5` is written as `8.50` while
/// `1.995` keeps its third place.
///
/// ```
/// # use receipt_ledger::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("$1,299.5").unwrap();
/// assert_eq!(amount.to_string(), "1299.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
}

impl Amount {
    pub const ZERO: Amount = Amount::new(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}

/// An error that can occur when parsing strings or floats into `Amount` values.
pub struct AmountError(String);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Error for AmountError {}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let rest = rest.strip_prefix('$').unwrap_or(rest);
        let digits = rest.replace(',', "");

        let value = Decimal::from_str(&digits)
            .map_err(|e| AmountError(format!("Invalid amount '{s}': {e}")))?;
        Ok(Amount::new(if negative { -value } else { value }))
    }
}

impl TryFrom<f64> for Amount {
    type Error = AmountError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Decimal::from_f64(value)
            .map(Amount::new)
            .ok_or_else(|| AmountError(format!("Invalid amount {value}")))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut value = self.value;
        if value.scale() < MIN_SCALE {
            value.rescale(MIN_SCALE);
        }
        write!(f, "{value}")
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Ok(Amount::new(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Ok(Amount::new(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        Amount::try_from(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v).map_err(E::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        let amount = Amount::from_str("8.50").unwrap();
        assert_eq!(amount.value(), dec("8.50"));
    }

    #[test]
    fn test_parse_with_dollar_and_commas() {
        let amount = Amount::from_str("$1,234,567.89").unwrap();
        assert_eq!(amount.value(), dec("1234567.89"));
    }

    #[test]
    fn test_parse_negative_with_dollar_sign() {
        let amount = Amount::from_str("-$5.00").unwrap();
        assert_eq!(amount.value(), dec("-5.00"));
    }

    #[test]
    fn test_parse_empty_is_zero() {
        assert!(Amount::from_str("  ").unwrap().is_zero());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(Amount::from_str("eight dollars").is_err());
    }

    #[test]
    fn test_display_pads_to_two_places() {
        assert_eq!(Amount::new(dec("8.5")).to_string(), "8.50");
        assert_eq!(Amount::new(dec("2")).to_string(), "2.00");
        assert_eq!(Amount::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_display_keeps_extra_places() {
        assert_eq!(Amount::new(dec("1.995")).to_string(), "1.995");
    }

    #[test]
    fn test_deserialize_float() {
        let amount: Amount = serde_json::from_str("8.5").unwrap();
        assert_eq!(amount.to_string(), "8.50");
    }

    #[test]
    fn test_deserialize_integer() {
        let amount: Amount = serde_json::from_str("2").unwrap();
        assert_eq!(amount.to_string(), "2.00");
    }

    #[test]
    fn test_deserialize_string() {
        let amount: Amount = serde_json::from_str("\"$3.25\"").unwrap();
        assert_eq!(amount.value(), dec("3.25"));
    }

    #[test]
    fn test_deserialize_rejects_bool() {
        assert!(serde_json::from_str::<Amount>("true").is_err());
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&Amount::new(dec("8.5"))).unwrap();
        assert_eq!(json, "\"8.50\"");
    }
}
