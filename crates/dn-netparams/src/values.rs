//! # Parameter Values
//!
//! A [`Value`] holds the raw text of a parameter, its parsed form, the rules
//! the parsed form must satisfy and whether it may change at runtime.
//!
//! | Kind | Text | Parsed |
//! |------|------|--------|
//! | `Float` | `0.00025`, `1e-8` | `f64` (finite) |
//! | `Int` | `5` | `i64` |
//! | `Uint` | `10000000000000000000000` | `U256` |
//! | `Duration` | `48h0m0s`, `10h` | signed nanoseconds |
//! | `Json` | `{"tiers": []}` | schema-checked JSON |
//! | `String` | `VOTE` | `String` |
//!
//! The raw text is kept verbatim: reading back a parameter returns exactly
//! what was written, not a normalised form.

use crate::duration::{format_duration, parse_duration};
use crate::error::NetParamsError;
use primitive_types::U256;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::marker::PhantomData;

/// A check on a parsed value. `Err` carries the human readable reason.
pub type Rule<T> = Box<dyn Fn(&T) -> Result<(), String> + Send + Sync>;

fn compare<T: Send + Sync + 'static>(
    bound: T,
    symbol: &'static str,
    holds: fn(&T, &T) -> bool,
    show: fn(&T) -> String,
) -> Rule<T> {
    Box::new(move |v| {
        if holds(v, &bound) {
            Ok(())
        } else {
            Err(format!("expect {symbol} {} got {}", show(&bound), show(v)))
        }
    })
}

pub fn gt<T: PartialOrd + Display + Send + Sync + 'static>(bound: T) -> Rule<T> {
    compare(bound, ">", |v, b| v > b, ToString::to_string)
}

pub fn gte<T: PartialOrd + Display + Send + Sync + 'static>(bound: T) -> Rule<T> {
    compare(bound, ">=", |v, b| v >= b, ToString::to_string)
}

pub fn lt<T: PartialOrd + Display + Send + Sync + 'static>(bound: T) -> Rule<T> {
    compare(bound, "<", |v, b| v < b, ToString::to_string)
}

pub fn lte<T: PartialOrd + Display + Send + Sync + 'static>(bound: T) -> Rule<T> {
    compare(bound, "<=", |v, b| v <= b, ToString::to_string)
}

fn show_duration(nanos: &i64) -> String {
    format_duration(*nanos)
}

pub fn duration_gt(bound: i64) -> Rule<i64> {
    compare(bound, ">", |v, b| v > b, show_duration)
}

pub fn duration_gte(bound: i64) -> Rule<i64> {
    compare(bound, ">=", |v, b| v >= b, show_duration)
}

pub fn duration_lt(bound: i64) -> Rule<i64> {
    compare(bound, "<", |v, b| v < b, show_duration)
}

pub fn duration_lte(bound: i64) -> Rule<i64> {
    compare(bound, "<=", |v, b| v <= b, show_duration)
}

/// Comparison against another parameter's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Relation {
    fn holds<T: PartialOrd>(self, v: &T, other: &T) -> bool {
        match self {
            Self::Lt => v < other,
            Self::Lte => v <= other,
            Self::Gt => v > other,
            Self::Gte => v >= other,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }

    /// Check `value` against `other`, the current value of `other_key`.
    /// Kinds without an ordering always pass.
    pub(crate) fn check(self, value: &Parsed, other_key: &str, other: &Parsed) -> Result<(), String> {
        let (ok, shown_other, shown_value) = match (value, other) {
            (Parsed::Duration(v), Parsed::Duration(o)) => {
                (self.holds(v, o), format_duration(*o), format_duration(*v))
            }
            (Parsed::Uint(v), Parsed::Uint(o)) => (self.holds(v, o), o.to_string(), v.to_string()),
            (Parsed::Int(v), Parsed::Int(o)) => (self.holds(v, o), o.to_string(), v.to_string()),
            (Parsed::Float(v), Parsed::Float(o)) => (self.holds(v, o), o.to_string(), v.to_string()),
            _ => return Ok(()),
        };
        if ok {
            Ok(())
        } else {
            Err(format!(
                "expect {} {shown_other} ({other_key}) got {shown_value}",
                self.symbol()
            ))
        }
    }
}

/// Parsed form of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Float(f64),
    Int(i64),
    Uint(U256),
    /// Nanoseconds.
    Duration(i64),
    Json(serde_json::Value),
    String(String),
}

impl Parsed {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Float(_) => "float",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Duration(_) => "duration",
            Self::Json(_) => "json",
            Self::String(_) => "string",
        }
    }
}

/// Schema and rules of a JSON parameter, with the concrete type erased.
pub trait JsonSchema: Send + Sync {
    /// Decode against the schema. Unknown fields are rejected when the
    /// schema type denies them.
    fn parse(&self, raw: &str) -> Result<serde_json::Value, String>;

    /// Failed rules for an already parsed value.
    fn check(&self, value: &serde_json::Value) -> Vec<String>;
}

struct TypedJson<T> {
    rules: Vec<Rule<T>>,
    _schema: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned + Serialize> JsonSchema for TypedJson<T> {
    fn parse(&self, raw: &str) -> Result<serde_json::Value, String> {
        let typed: T =
            serde_json::from_str(raw).map_err(|e| format!("unable to unmarshal value, {e}"))?;
        serde_json::to_value(&typed).map_err(|e| e.to_string())
    }

    fn check(&self, value: &serde_json::Value) -> Vec<String> {
        match serde_json::from_value::<T>(value.clone()) {
            Ok(typed) => run_rules(&self.rules, &typed),
            Err(e) => vec![e.to_string()],
        }
    }
}

enum Checks {
    Float(Vec<Rule<f64>>),
    Int(Vec<Rule<i64>>),
    Uint(Vec<Rule<U256>>),
    Duration(Vec<Rule<i64>>),
    Json(Box<dyn JsonSchema>),
    String(Vec<Rule<String>>),
}

fn run_rules<T>(rules: &[Rule<T>], value: &T) -> Vec<String> {
    rules.iter().filter_map(|rule| rule(value).err()).collect()
}

/// Why a value was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ValueError {
    Parse(String),
    Immutable,
    Rules(String),
}

impl ValueError {
    pub(crate) fn for_key(self, key: &str) -> NetParamsError {
        match self {
            Self::Parse(reason) => NetParamsError::Parse {
                key: key.to_string(),
                reason,
            },
            Self::Immutable => NetParamsError::Immutable(key.to_string()),
            Self::Rules(reason) => NetParamsError::InvalidValue {
                key: key.to_string(),
                reason,
            },
        }
    }
}

/// A typed, validated parameter.
pub struct Value {
    checks: Checks,
    raw: String,
    parsed: Parsed,
    mutable: bool,
}

impl Value {
    fn new(checks: Checks, parsed: Parsed) -> Self {
        Self {
            checks,
            raw: String::new(),
            parsed,
            mutable: true,
        }
    }

    #[must_use]
    pub fn float(rules: Vec<Rule<f64>>) -> Self {
        Self::new(Checks::Float(rules), Parsed::Float(0.0))
    }

    #[must_use]
    pub fn int(rules: Vec<Rule<i64>>) -> Self {
        Self::new(Checks::Int(rules), Parsed::Int(0))
    }

    #[must_use]
    pub fn uint(rules: Vec<Rule<U256>>) -> Self {
        Self::new(Checks::Uint(rules), Parsed::Uint(U256::zero()))
    }

    #[must_use]
    pub fn duration(rules: Vec<Rule<i64>>) -> Self {
        Self::new(Checks::Duration(rules), Parsed::Duration(0))
    }

    /// JSON parameter decoded as `T`.
    #[must_use]
    pub fn json<T>(rules: Vec<Rule<T>>) -> Self
    where
        T: DeserializeOwned + Serialize + 'static,
    {
        let schema = TypedJson {
            rules,
            _schema: PhantomData,
        };
        Self::new(Checks::Json(Box::new(schema)), Parsed::Json(serde_json::Value::Null))
    }

    #[must_use]
    pub fn string(rules: Vec<Rule<String>>) -> Self {
        Self::new(Checks::String(rules), Parsed::String(String::new()))
    }

    #[must_use]
    pub fn mutable(mut self, mutable: bool) -> Self {
        self.mutable = mutable;
        self
    }

    /// Set the starting value. Rules apply, mutability does not.
    pub(crate) fn initial(mut self, raw: &str) -> Result<Self, ValueError> {
        let parsed = self.check_raw(raw)?;
        self.commit(raw, parsed);
        Ok(self)
    }

    /// Parse and rules, ignoring mutability. Used for genesis state.
    pub(crate) fn check_raw(&self, raw: &str) -> Result<Parsed, ValueError> {
        let parsed = self.parse(raw)?;
        self.check(&parsed)?;
        Ok(parsed)
    }

    fn parse(&self, raw: &str) -> Result<Parsed, ValueError> {
        let parsed = match &self.checks {
            Checks::Float(_) => raw
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Parsed::Float)
                .ok_or_else(|| format!("invalid float \"{raw}\"")),
            Checks::Int(_) => raw.parse::<i64>().map(Parsed::Int).map_err(|e| e.to_string()),
            Checks::Uint(_) => U256::from_dec_str(raw)
                .map(Parsed::Uint)
                .map_err(|_| "invalid uint".to_string()),
            Checks::Duration(_) => parse_duration(raw)
                .map(Parsed::Duration)
                .map_err(|e| e.to_string()),
            Checks::Json(schema) => schema.parse(raw).map(Parsed::Json),
            Checks::String(_) => Ok(Parsed::String(raw.to_string())),
        };
        parsed.map_err(ValueError::Parse)
    }

    fn check(&self, parsed: &Parsed) -> Result<(), ValueError> {
        let failures = match (&self.checks, parsed) {
            (Checks::Float(rules), Parsed::Float(v)) => run_rules(rules, v),
            (Checks::Int(rules), Parsed::Int(v)) => run_rules(rules, v),
            (Checks::Uint(rules), Parsed::Uint(v)) => run_rules(rules, v),
            (Checks::Duration(rules), Parsed::Duration(v)) => run_rules(rules, v),
            (Checks::Json(schema), Parsed::Json(v)) => schema.check(v),
            (Checks::String(rules), Parsed::String(v)) => run_rules(rules, v),
            _ => vec![format!("expected a {} value", self.parsed.kind())],
        };
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ValueError::Rules(failures.join(", ")))
        }
    }

    /// Parse, then mutability, then rules. Nothing changes.
    pub(crate) fn validate(&self, raw: &str) -> Result<Parsed, ValueError> {
        let parsed = self.parse(raw)?;
        if !self.mutable {
            return Err(ValueError::Immutable);
        }
        self.check(&parsed)?;
        Ok(parsed)
    }

    /// Mutability, then parse, then rules. Nothing changes.
    pub(crate) fn prepare_update(&self, raw: &str) -> Result<Parsed, ValueError> {
        if !self.mutable {
            return Err(ValueError::Immutable);
        }
        let parsed = self.parse(raw)?;
        self.check(&parsed)?;
        Ok(parsed)
    }

    /// Parse only, for state restored from a checkpoint.
    pub(crate) fn parse_only(&self, raw: &str) -> Result<Parsed, ValueError> {
        self.parse(raw)
    }

    pub(crate) fn commit(&mut self, raw: &str, parsed: Parsed) {
        self.raw = raw.to_string();
        self.parsed = parsed;
    }

    /// The text exactly as last written.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn parsed(&self) -> &Parsed {
        &self.parsed
    }

    #[must_use]
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Value")
            .field("raw", &self.raw)
            .field("parsed", &self.parsed)
            .field("mutable", &self.mutable)
            .finish_non_exhaustive()
    }
}
