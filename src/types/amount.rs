//! Native currency amounts.
//!
//! Settings and command arguments carry wei amounts either as plain
//! integers or as decimal strings with a unit suffix (`"1.5 ether"`).

use alloy::primitives::U256;
use serde::{Deserialize, Deserializer};

use crate::error::{AppError, Result};

/// Decimals of one ether in wei.
pub const ETHER_DECIMALS: u8 = 18;

/// Decimals of one gwei in wei.
pub const GWEI_DECIMALS: u8 = 9;

/// Format a raw integer amount as a human-readable decimal string.
pub fn format_units(value: U256, decimals: u8) -> String {
    if value == U256::ZERO {
        return "0".to_string();
    }

    let value_str = value.to_string();
    let decimals = decimals as usize;

    if decimals == 0 {
        return value_str;
    }

    let len = value_str.len();
    if len <= decimals {
        let zeros = decimals - len;
        let decimal_part = value_str.trim_end_matches('0');
        format!("0.{}{}", "0".repeat(zeros), decimal_part)
    } else {
        let (integer, decimal) = value_str.split_at(len - decimals);
        let decimal = decimal.trim_end_matches('0');
        if decimal.is_empty() {
            integer.to_string()
        } else {
            format!("{}.{}", integer, decimal)
        }
    }
}

/// Parse a decimal string into a raw integer amount with `decimals` places.
///
/// Extra fractional digits are truncated.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256> {
    let amount = amount.trim();

    if amount.is_empty() {
        return Err(AppError::Parse("Amount cannot be empty".into()));
    }
    if amount.starts_with('-') {
        return Err(AppError::Parse("Amount cannot be negative".into()));
    }

    let decimals = decimals as usize;
    let multiplier = U256::from(10).pow(U256::from(decimals));

    let (integer, fraction) = match amount.split_once('.') {
        None => (amount, String::new()),
        Some((_, fraction)) if fraction.contains('.') => {
            return Err(AppError::Parse(format!("Invalid amount format: {}", amount)));
        }
        Some((integer, fraction)) => {
            let mut fraction = fraction.to_string();
            if fraction.len() > decimals {
                fraction.truncate(decimals);
            } else {
                fraction.push_str(&"0".repeat(decimals - fraction.len()));
            }
            (integer, fraction)
        }
    };

    let integer_value = if integer.is_empty() {
        U256::ZERO
    } else {
        integer
            .parse::<U256>()
            .map_err(|e| AppError::Parse(format!("Invalid integer part: {}", e)))?
    };
    let fraction_value = if fraction.is_empty() {
        U256::ZERO
    } else {
        fraction
            .parse::<U256>()
            .map_err(|e| AppError::Parse(format!("Invalid fraction part: {}", e)))?
    };

    integer_value
        .checked_mul(multiplier)
        .and_then(|scaled| scaled.checked_add(fraction_value))
        .ok_or_else(|| AppError::NumericOverflow(format!("{} does not fit in 256 bits", amount)))
}

/// Parse a wei amount with an optional unit suffix.
///
/// Accepted units are `wei` (the default), `gwei` and `ether`/`eth`.
pub fn parse_amount(input: &str) -> Result<U256> {
    let input = input.trim();
    let (number, unit) = match input.split_once(char::is_whitespace) {
        Some((number, unit)) => (number, unit.trim()),
        None => {
            let split = input.find(|c: char| c.is_ascii_alphabetic()).unwrap_or(input.len());
            (&input[..split], &input[split..])
        }
    };

    let decimals = match unit.to_ascii_lowercase().as_str() {
        "" | "wei" => 0,
        "gwei" => GWEI_DECIMALS,
        "ether" | "eth" => ETHER_DECIMALS,
        other => return Err(AppError::Parse(format!("Unknown unit: {}", other))),
    };

    if decimals == 0 && number.contains('.') {
        return Err(AppError::Parse(format!("Fractional wei amount: {}", input)));
    }

    parse_units(number, decimals)
}

/// Serde helper accepting a JSON number or an amount string.
pub fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(U256::from(n)),
        Raw::Text(s) => parse_amount(&s).map_err(serde::de::Error::custom),
    }
}
