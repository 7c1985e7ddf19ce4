//! Decimal formatting for the wire.
//!
//! OKX carries every number as a string. Outgoing values are formatted as the
//! shortest exact plain-notation string (no exponent, no trailing zeros), and
//! incoming numeric strings are parsed leniently: `""` means "not set".

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use crate::shared::error::{WireError, WireResult};

/// Format a decimal as its canonical wire string.
///
/// ```ignore
/// assert_eq!(format_decimal(&dec("1.500")), "1.5");
/// assert_eq!(format_decimal(&dec("65000")), "65000");
/// ```
pub fn format_decimal(value: &Decimal) -> String {
    let normalized = value.normalize();
    if normalized.is_zero() {
        // normalize keeps the sign of negative zero
        return "0".to_string();
    }
    normalized.to_string()
}

/// Parse a wire string into a decimal.
///
/// Accepts plain notation and scientific notation (`1e-8`).
pub fn parse_decimal(value: &str) -> WireResult<Decimal> {
    let trimmed = value.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| WireError::InvalidDecimal(value.to_string()))
}

/// Serde helpers for numeric fields the exchange sends as strings.
pub mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StrOrNum {
        Str(String),
        Num(serde_json::Number),
    }

    impl StrOrNum {
        fn into_text(self) -> String {
            match self {
                Self::Str(s) => s,
                Self::Num(n) => n.to_string(),
            }
        }
    }

    /// `Option<Decimal>` from `"1.5"`, `1.5`, `""` or `null`.
    pub fn opt_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<StrOrNum>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => {
                let text = raw.into_text();
                if text.is_empty() {
                    return Ok(None);
                }
                parse_decimal(&text)
                    .map(Some)
                    .map_err(serde::de::Error::custom)
            }
        }
    }

    /// `Option<i64>` from `"1597026383085"`, a JSON number, `""` or `null`.
    pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<StrOrNum>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) => {
                let text = raw.into_text();
                if text.is_empty() {
                    return Ok(None);
                }
                text.parse::<i64>()
                    .map(Some)
                    .map_err(serde::de::Error::custom)
            }
        }
    }

    /// `bool` from `true`, `"true"` or `""` (false).
    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum BoolOrStr {
            Bool(bool),
            Str(String),
        }

        match Option::<BoolOrStr>::deserialize(deserializer)? {
            Some(BoolOrStr::Bool(b)) => Ok(b),
            Some(BoolOrStr::Str(s)) => Ok(s == "true"),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_format_trims_trailing_zeros() {
        assert_eq!(format_decimal(&dec("1.500")), "1.5");
        assert_eq!(format_decimal(&dec("65000.00")), "65000");
        assert_eq!(format_decimal(&dec("0.10")), "0.1");
    }

    #[test]
    fn test_format_keeps_integer_zeros() {
        assert_eq!(format_decimal(&dec("65000")), "65000");
        assert_eq!(format_decimal(&dec("100")), "100");
    }

    #[test]
    fn test_format_zero() {
        assert_eq!(format_decimal(&Decimal::ZERO), "0");
        assert_eq!(format_decimal(&dec("0.000")), "0");
        assert_eq!(format_decimal(&dec("-0.00")), "0");
    }

    #[test]
    fn test_format_never_uses_exponent() {
        assert_eq!(format_decimal(&dec("0.00000001")), "0.00000001");
        assert_eq!(
            format_decimal(&dec("0.0000000000000000000000000001")),
            "0.0000000000000000000000000001"
        );
        assert_eq!(
            format_decimal(&dec("79228162514264337593543950335")),
            "79228162514264337593543950335"
        );
    }

    #[test]
    fn test_parse_scientific() {
        assert_eq!(parse_decimal("1e-8").unwrap(), dec("0.00000001"));
        assert_eq!(parse_decimal("2.5E3").unwrap(), dec("2500"));
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(
            parse_decimal("abc"),
            Err(WireError::InvalidDecimal("abc".to_string()))
        );
        assert!(parse_decimal("").is_err());
    }

    #[test]
    fn test_canonical_round_trip_is_idempotent() {
        let samples = [
            "0",
            "1",
            "-1",
            "1.5",
            "65000",
            "0.00000001",
            "123456789.123456789",
            "-0.0005",
            "99999999999999999999",
            "0.0000000000000000000000000001",
        ];
        for s in samples {
            let once = format_decimal(&parse_decimal(s).unwrap());
            assert_eq!(once, s);
            let twice = format_decimal(&parse_decimal(&once).unwrap());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_non_canonical_input_settles_after_one_pass() {
        for s in ["1.50", "0065000", "1e3", "0.100000"] {
            let once = format_decimal(&parse_decimal(s).unwrap());
            let twice = format_decimal(&parse_decimal(&once).unwrap());
            assert_eq!(once, twice);
        }
    }

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient::opt_decimal")]
        px: Option<Decimal>,
        #[serde(default, deserialize_with = "lenient::opt_i64")]
        ts: Option<i64>,
        #[serde(default, deserialize_with = "lenient::flag")]
        reduce_only: bool,
    }

    #[test]
    fn test_lenient_fields() {
        let s: Sample =
            serde_json::from_str(r#"{"px":"1.25","ts":"1597026383085","reduce_only":"true"}"#)
                .unwrap();
        assert_eq!(s.px, Some(dec("1.25")));
        assert_eq!(s.ts, Some(1597026383085));
        assert!(s.reduce_only);

        let s: Sample = serde_json::from_str(r#"{"px":"","ts":"","reduce_only":false}"#).unwrap();
        assert_eq!(s.px, None);
        assert_eq!(s.ts, None);
        assert!(!s.reduce_only);

        let s: Sample = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(s.px, None);
        assert_eq!(s.ts, None);
    }
}
