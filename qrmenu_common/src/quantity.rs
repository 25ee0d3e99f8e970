use std::{
    fmt::Display,
    ops::{Add, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

const SCALE: i64 = 1_000;

//--------------------------------------       Quantity      ---------------------------------------------------------
/// A stock or recipe quantity, held as thousandths of a unit (grams for kg, ml for litres, ...).
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Quantity(i64);

op!(binary Quantity, Add, add);
op!(binary Quantity, Sub, sub);

#[derive(Debug, Clone, Error)]
#[error("Invalid quantity: {0}")]
pub struct QuantityParseError(String);

impl Quantity {
    pub fn from_milli(milli: i64) -> Self {
        Self(milli)
    }

    pub fn from_units(units: i64) -> Self {
        Self(units * SCALE)
    }

    pub fn milli(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / SCALE as u64;
        let frac = abs % SCALE as u64;
        if frac == 0 {
            write!(f, "{sign}{whole}")
        } else {
            let frac = format!("{frac:03}");
            write!(f, "{sign}{whole}.{}", frac.trim_end_matches('0'))
        }
    }
}

impl FromStr for Quantity {
    type Err = QuantityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        let valid = !whole.is_empty() &&
            frac.len() <= 3 &&
            whole.chars().all(|c| c.is_ascii_digit()) &&
            frac.chars().all(|c| c.is_ascii_digit());
        if !valid {
            return Err(QuantityParseError(s.to_string()));
        }
        let whole = whole.parse::<i64>().map_err(|e| QuantityParseError(format!("{s}: {e}")))?;
        let frac = format!("{frac:0<3}").parse::<i64>().map_err(|e| QuantityParseError(format!("{s}: {e}")))?;
        let milli = whole
            .checked_mul(SCALE)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(|| QuantityParseError(format!("{s} is out of range")))?;
        Ok(Self(if negative { -milli } else { milli }))
    }
}
