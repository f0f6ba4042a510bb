//! Duration text format.
//!
//! Durations are written as a signed sequence of decimal numbers, each with
//! an optional fraction and a unit suffix: `300ms`, `-1.5h`, `2h45m`,
//! `48h0m0s`. Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`.
//! Values are carried as signed nanoseconds.
//!
//! [`format_duration`] produces the canonical form: hours, minutes and
//! seconds for anything of a second or more (`1h0m0s`, `1m30s`, `1.5s`),
//! the largest fitting sub-second unit otherwise (`1.5ms`, `250ns`).

use thiserror::Error;

pub const NANOSECOND: i64 = 1;
pub const MICROSECOND: i64 = 1_000 * NANOSECOND;
pub const MILLISECOND: i64 = 1_000 * MICROSECOND;
pub const SECOND: i64 = 1_000 * MILLISECOND;
pub const MINUTE: i64 = 60 * SECOND;
pub const HOUR: i64 = 60 * MINUTE;

/// Largest magnitude accepted while parsing; only valid when negated.
const MAX_MAGNITUDE: u64 = 1 << 63;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("invalid duration \"{0}\"")]
    Invalid(String),

    #[error("missing unit in duration \"{0}\"")]
    MissingUnit(String),

    #[error("unknown unit \"{unit}\" in duration \"{text}\"")]
    UnknownUnit { unit: String, text: String },
}

fn unit_nanos(unit: &str) -> Option<u64> {
    let nanos = match unit {
        "ns" => NANOSECOND,
        "us" | "\u{b5}s" | "\u{3bc}s" => MICROSECOND,
        "ms" => MILLISECOND,
        "s" => SECOND,
        "m" => MINUTE,
        "h" => HOUR,
        _ => return None,
    };
    Some(nanos as u64)
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

/// Parse a duration into signed nanoseconds.
pub fn parse_duration(text: &str) -> Result<i64, DurationError> {
    let invalid = || DurationError::Invalid(text.to_string());

    let mut s = text;
    let mut neg = false;
    if let Some(rest) = s.strip_prefix('-') {
        neg = true;
        s = rest;
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }
    if s == "0" {
        return Ok(0);
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let mut total: u64 = 0;
    while !s.is_empty() {
        if !s.starts_with(|c: char| c == '.' || c.is_ascii_digit()) {
            return Err(invalid());
        }

        let (int_digits, rest) = split_digits(s);
        let mut value: u64 = 0;
        for d in int_digits.bytes() {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u64::from(d - b'0')))
                .filter(|v| *v <= MAX_MAGNITUDE)
                .ok_or_else(invalid)?;
        }
        s = rest;

        let mut frac: u64 = 0;
        let mut scale: f64 = 1.0;
        let mut has_frac = false;
        if let Some(rest) = s.strip_prefix('.') {
            let (frac_digits, rest) = split_digits(rest);
            has_frac = !frac_digits.is_empty();
            // Digits past u64 precision are dropped.
            for d in frac_digits.bytes() {
                match frac
                    .checked_mul(10)
                    .and_then(|v| v.checked_add(u64::from(d - b'0')))
                {
                    Some(v) if v <= MAX_MAGNITUDE => {
                        frac = v;
                        scale *= 10.0;
                    }
                    _ => break,
                }
            }
            s = rest;
        }
        if int_digits.is_empty() && !has_frac {
            return Err(invalid());
        }

        let unit_end = s
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(s.len());
        if unit_end == 0 {
            return Err(DurationError::MissingUnit(text.to_string()));
        }
        let (unit, rest) = s.split_at(unit_end);
        let unit_ns = unit_nanos(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            text: text.to_string(),
        })?;
        s = rest;

        if value > MAX_MAGNITUDE / unit_ns {
            return Err(invalid());
        }
        value *= unit_ns;
        if frac > 0 {
            value += (frac as f64 * (unit_ns as f64 / scale)) as u64;
            if value > MAX_MAGNITUDE {
                return Err(invalid());
            }
        }
        total = total
            .checked_add(value)
            .filter(|t| *t <= MAX_MAGNITUDE)
            .ok_or_else(invalid)?;
    }

    let signed = if neg {
        -i128::from(total)
    } else {
        i128::from(total)
    };
    i64::try_from(signed).map_err(|_| invalid())
}

/// Fraction digits of `v` below `prec` decimal places, without trailing
/// zeros, and the integer part above them.
fn fmt_frac(mut v: u64, prec: u32) -> (String, u64) {
    let mut digits = Vec::new();
    let mut print = false;
    for _ in 0..prec {
        let digit = (v % 10) as u8;
        print = print || digit != 0;
        if print {
            digits.push(char::from(b'0' + digit));
        }
        v /= 10;
    }
    if print {
        digits.push('.');
    }
    (digits.into_iter().rev().collect(), v)
}

/// Canonical text form of a duration in nanoseconds.
#[must_use]
pub fn format_duration(nanos: i64) -> String {
    if nanos == 0 {
        return "0s".to_string();
    }
    let u = nanos.unsigned_abs();

    let body = if u < SECOND as u64 {
        if u < MICROSECOND as u64 {
            format!("{u}ns")
        } else if u < MILLISECOND as u64 {
            let (frac, int) = fmt_frac(u, 3);
            format!("{int}{frac}\u{b5}s")
        } else {
            let (frac, int) = fmt_frac(u, 6);
            format!("{int}{frac}ms")
        }
    } else {
        let (frac, secs) = fmt_frac(u, 9);
        let mut out = format!("{}{frac}s", secs % 60);
        let mins = secs / 60;
        if mins > 0 {
            out = format!("{}m{out}", mins % 60);
            let hours = mins / 60;
            if hours > 0 {
                out = format!("{hours}h{out}");
            }
        }
        out
    };

    if nanos < 0 {
        format!("-{body}")
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_duration("10h"), Ok(10 * HOUR));
        assert_eq!(parse_duration("48h0m0s"), Ok(48 * HOUR));
        assert_eq!(parse_duration("1m"), Ok(MINUTE));
        assert_eq!(parse_duration("1.5s"), Ok(1_500 * MILLISECOND));
        assert_eq!(parse_duration("2h45m"), Ok(2 * HOUR + 45 * MINUTE));
        assert_eq!(parse_duration("300ms"), Ok(300 * MILLISECOND));
        assert_eq!(parse_duration("1\u{b5}s"), Ok(MICROSECOND));
        assert_eq!(parse_duration("1us"), Ok(MICROSECOND));
        assert_eq!(parse_duration(".5s"), Ok(500 * MILLISECOND));
        assert_eq!(parse_duration("0"), Ok(0));
        assert_eq!(parse_duration("-1s"), Ok(-SECOND));
        assert_eq!(parse_duration("+1s"), Ok(SECOND));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_duration(""), Err(DurationError::Invalid(String::new())));
        assert_eq!(parse_duration("-"), Err(DurationError::Invalid("-".into())));
        assert_eq!(parse_duration("."), Err(DurationError::Invalid(".".into())));
        assert_eq!(parse_duration("1"), Err(DurationError::MissingUnit("1".into())));
        assert_eq!(
            parse_duration("1d"),
            Err(DurationError::UnknownUnit {
                unit: "d".into(),
                text: "1d".into()
            })
        );
        assert!(parse_duration("9999999999999999999h").is_err());
    }

    #[test]
    fn test_format_canonical() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(48 * HOUR), "48h0m0s");
        assert_eq!(format_duration(90 * SECOND), "1m30s");
        assert_eq!(format_duration(1_500 * MILLISECOND), "1.5s");
        assert_eq!(format_duration(1_500 * MICROSECOND), "1.5ms");
        assert_eq!(format_duration(1_500), "1.5\u{b5}s");
        assert_eq!(format_duration(250), "250ns");
        assert_eq!(format_duration(-SECOND), "-1s");
        assert_eq!(format_duration(i64::MIN), "-2562047h47m16.854775808s");
    }

    proptest! {
        #[test]
        fn test_format_then_parse(nanos in any::<i64>()) {
            prop_assert_eq!(parse_duration(&format_duration(nanos)), Ok(nanos));
        }

        #[test]
        fn test_parse_never_panics(text in "[-+]?[0-9.]{0,6}(ns|us|ms|s|m|h|d)?[0-9]{0,3}") {
            let _ = parse_duration(&text);
        }
    }
}
