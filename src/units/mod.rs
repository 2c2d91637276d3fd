//! units
//!
//! Unit expression parsing and SI base-dimension reduction.
//!
//! # Design
//!
//! Standard-name checking only needs *base-unit equivalence*: two unit
//! expressions agree when their reductions to the seven SI base
//! dimensions match, independent of surface syntax. `m/s`, `m s^-1`
//! and `m*s^-1` are all the same unit; `km/h` is base-equivalent to
//! `m/s` (same dimensions, different scale).
//!
//! The grammar is the one scientific attribute values actually use:
//! whitespace/`*`-separated factors, `/` starting a denominator,
//! exponents as `^n`, as directly appended digits (`m2`), or as signed
//! trailing digits (`s-1`, CF-table style, fixed up before parsing).
//! Parentheses are not supported.
//!
//! # Example
//!
//! ```
//! use h5conv::units::Unit;
//!
//! let a = Unit::parse("m/s").unwrap();
//! let b = Unit::parse("m s^-1").unwrap();
//! let c = Unit::parse("km/h").unwrap();
//! assert!(a.base_equivalent(&b));
//! assert!(a.base_equivalent(&c));
//! assert!(!a.base_equivalent(&Unit::parse("kg").unwrap()));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from unit parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitsError {
    #[error("cannot parse unit expression '{expr}': {reason}")]
    Parse { expr: String, reason: String },

    #[error("unknown unit symbol '{0}'")]
    UnknownSymbol(String),
}

/// Exponents of the seven SI base dimensions.
///
/// Ordered as mass, length, time, current, temperature, amount,
/// luminous intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub mass: i8,
    pub length: i8,
    pub time: i8,
    pub current: i8,
    pub temperature: i8,
    pub amount: i8,
    pub luminous: i8,
}

impl Dimensions {
    const NONE: Dimensions = Dimensions {
        mass: 0,
        length: 0,
        time: 0,
        current: 0,
        temperature: 0,
        amount: 0,
        luminous: 0,
    };

    /// True when all exponents are zero.
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    fn combined(self, other: Dimensions, sign: i8) -> Dimensions {
        Dimensions {
            mass: self.mass + sign * other.mass,
            length: self.length + sign * other.length,
            time: self.time + sign * other.time,
            current: self.current + sign * other.current,
            temperature: self.temperature + sign * other.temperature,
            amount: self.amount + sign * other.amount,
            luminous: self.luminous + sign * other.luminous,
        }
    }

    fn scaled(self, k: i8) -> Dimensions {
        Dimensions {
            mass: self.mass * k,
            length: self.length * k,
            time: self.time * k,
            current: self.current * k,
            temperature: self.temperature * k,
            amount: self.amount * k,
            luminous: self.luminous * k,
        }
    }
}

/// A parsed physical unit: a scale factor to SI plus base dimensions.
///
/// The original expression text is kept for display; units synthesized
/// by algebra (products, ratios, powers) display their canonical base
/// form instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Unit {
    raw: String,
    factor: f64,
    dims: Dimensions,
}

impl Unit {
    /// The dimensionless unit.
    pub fn dimensionless() -> Self {
        Self {
            raw: String::new(),
            factor: 1.0,
            dims: Dimensions::default(),
        }
    }

    /// Parse a unit expression.
    ///
    /// Empty strings, `1`, `-` and `dimensionless` all denote the
    /// dimensionless unit.
    ///
    /// # Errors
    ///
    /// Returns `UnitsError` for unknown symbols or malformed exponents.
    pub fn parse(expr: &str) -> Result<Self, UnitsError> {
        let trimmed = expr.trim();
        if trimmed.is_empty() || trimmed == "1" || trimmed == "-" || trimmed == "dimensionless" {
            let mut unit = Self::dimensionless();
            unit.raw = trimmed.to_string();
            return Ok(unit);
        }

        let fixed = power_fix(trimmed);
        let mut factor = 1.0_f64;
        let mut dims = Dimensions::default();

        // '/' starts a denominator; every later segment divides
        // (left-associative, so "a/b/c" is (a/b)/c)
        for (i, segment) in fixed.split('/').enumerate() {
            let sign: i8 = if i == 0 { 1 } else { -1 };
            let segment = segment.trim();
            if segment.is_empty() {
                return Err(UnitsError::Parse {
                    expr: expr.to_string(),
                    reason: "empty division operand".to_string(),
                });
            }
            for token in segment
                .split(|c: char| c.is_whitespace() || c == '*' || c == '·')
                .filter(|t| !t.is_empty())
            {
                if token == "1" {
                    continue;
                }
                let (symbol, exponent) = split_exponent(token).ok_or_else(|| {
                    UnitsError::Parse {
                        expr: expr.to_string(),
                        reason: format!("malformed exponent in '{token}'"),
                    }
                })?;
                let resolved = resolve_symbol(symbol)?;
                let applied = exponent * i32::from(sign);
                factor *= resolved.factor.powi(applied);
                dims = dims.combined(resolved.dims.scaled(exponent as i8), sign);
            }
        }

        Ok(Self {
            raw: trimmed.to_string(),
            factor,
            dims,
        })
    }

    /// The base-dimension exponents.
    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    /// The scale factor relative to coherent SI units.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// The original expression text.
    pub fn raw_str(&self) -> &str {
        &self.raw
    }

    /// True when the unit carries no dimensions.
    pub fn is_dimensionless(&self) -> bool {
        self.dims.is_none()
    }

    /// Base-unit equivalence: equal dimension vectors.
    ///
    /// Scale is deliberately ignored, matching the convention that
    /// `km/h` and `m/s` describe the same kind of quantity.
    pub fn base_equivalent(&self, other: &Unit) -> bool {
        self.dims == other.dims
    }

    /// Multiply two units.
    pub fn multiply(&self, other: &Unit) -> Unit {
        let dims = self.dims.combined(other.dims, 1);
        Unit::synthesized(self.factor * other.factor, dims)
    }

    /// Divide this unit by another.
    pub fn divide(&self, other: &Unit) -> Unit {
        let dims = self.dims.combined(other.dims, -1);
        Unit::synthesized(self.factor / other.factor, dims)
    }

    /// Raise the unit to an integer power.
    pub fn powi(&self, exp: i32) -> Unit {
        Unit::synthesized(self.factor.powi(exp), self.dims.scaled(exp as i8))
    }

    fn synthesized(factor: f64, dims: Dimensions) -> Unit {
        let mut unit = Unit {
            raw: String::new(),
            factor,
            dims,
        };
        unit.raw = unit.base_form();
        unit
    }

    /// Canonical base-unit rendering, e.g. `kg m^2 s^-2`.
    ///
    /// Dimensionless units render as `dimensionless`.
    pub fn base_form(&self) -> String {
        let parts: [(&str, i8); 7] = [
            ("kg", self.dims.mass),
            ("m", self.dims.length),
            ("s", self.dims.time),
            ("A", self.dims.current),
            ("K", self.dims.temperature),
            ("mol", self.dims.amount),
            ("cd", self.dims.luminous),
        ];
        let rendered: Vec<String> = parts
            .iter()
            .filter(|(_, e)| *e != 0)
            .map(|(sym, e)| {
                if *e == 1 {
                    (*sym).to_string()
                } else {
                    format!("{sym}^{e}")
                }
            })
            .collect();
        if rendered.is_empty() {
            "dimensionless".to_string()
        } else {
            rendered.join(" ")
        }
    }
}

impl PartialEq for Unit {
    /// Semantic equality: same dimensions and (approximately) the
    /// same scale, independent of surface syntax.
    fn eq(&self, other: &Self) -> bool {
        let scale = self.factor.abs().max(other.factor.abs()).max(f64::EPSILON);
        self.dims == other.dims && (self.factor - other.factor).abs() <= 1e-9 * scale
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw.is_empty() {
            write!(f, "{}", self.base_form())
        } else {
            write!(f, "{}", self.raw)
        }
    }
}

impl TryFrom<String> for Unit {
    type Error = UnitsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Unit::parse(&s)
    }
}

impl From<Unit> for String {
    fn from(u: Unit) -> String {
        u.raw
    }
}

/// A magnitude with a unit, e.g. `1.2 m/s`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Quantity {
    pub magnitude: f64,
    pub unit: Unit,
}

impl Quantity {
    /// Parse a quantity: a leading number followed by an optional unit.
    ///
    /// # Errors
    ///
    /// Returns `UnitsError` if no leading number is present or the unit
    /// part does not parse.
    pub fn parse(expr: &str) -> Result<Self, UnitsError> {
        let trimmed = expr.trim();
        let split = trimmed
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E')))
            .map(|(i, _)| i)
            .unwrap_or(trimmed.len());
        let (num, rest) = trimmed.split_at(split);
        let magnitude: f64 = num.trim().parse().map_err(|_| UnitsError::Parse {
            expr: expr.to_string(),
            reason: "expected a leading number".to_string(),
        })?;
        let unit = Unit::parse(rest)?;
        Ok(Self { magnitude, unit })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.raw.is_empty() {
            write!(f, "{}", self.magnitude)
        } else {
            write!(f, "{} {}", self.magnitude, self.unit)
        }
    }
}

impl TryFrom<String> for Quantity {
    type Error = UnitsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Quantity::parse(&s)
    }
}

impl From<Quantity> for String {
    fn from(q: Quantity) -> String {
        q.to_string()
    }
}

/// Rewrite CF-style signed exponents: `m s-1` becomes `m s^-1`.
///
/// A letter directly followed by a sign and a digit gets a `^`
/// inserted. Unsigned appended digits (`m2`) are handled by
/// [`split_exponent`] instead.
fn power_fix(expr: &str) -> String {
    let chars: Vec<char> = expr.chars().collect();
    let mut out = String::with_capacity(expr.len() + 4);
    for i in 0..chars.len() {
        out.push(chars[i]);
        if chars[i].is_ascii_alphabetic()
            && i + 1 < chars.len()
            && matches!(chars[i + 1], '+' | '-')
            && chars.get(i + 2).is_some_and(|c| c.is_ascii_digit())
        {
            out.push('^');
        }
    }
    out
}

/// Split a token into symbol and exponent.
///
/// Accepts `m`, `m^2`, `m^-1` and `m2`. Returns `None` for malformed
/// exponents like `m^` or `m^x`.
fn split_exponent(token: &str) -> Option<(&str, i32)> {
    if let Some((symbol, exp)) = token.split_once('^') {
        if symbol.is_empty() {
            return None;
        }
        return exp.parse::<i32>().ok().map(|e| (symbol, e));
    }
    let digits_at = token.find(|c: char| c.is_ascii_digit());
    match digits_at {
        Some(0) | None => Some((token, 1)),
        Some(i) => {
            let (symbol, exp) = token.split_at(i);
            exp.parse::<i32>().ok().map(|e| (symbol, e))
        }
    }
}

struct ResolvedSymbol {
    factor: f64,
    dims: Dimensions,
}

macro_rules! dims {
    ($($field:ident : $value:expr),* $(,)?) => {
        Dimensions { $($field: $value,)* ..Dimensions::NONE }
    };
}

/// Resolve a bare symbol: exact units first, then SI prefix + unit.
fn resolve_symbol(symbol: &str) -> Result<ResolvedSymbol, UnitsError> {
    if let Some(resolved) = base_symbol(symbol) {
        return Ok(resolved);
    }
    for (prefix, scale) in PREFIXES {
        if let Some(rest) = symbol.strip_prefix(prefix) {
            if let Some(mut resolved) = base_symbol(rest) {
                resolved.factor *= scale;
                return Ok(resolved);
            }
        }
    }
    Err(UnitsError::UnknownSymbol(symbol.to_string()))
}

const PREFIXES: [(&str, f64); 12] = [
    ("p", 1e-12),
    ("n", 1e-9),
    ("µ", 1e-6),
    ("u", 1e-6),
    ("m", 1e-3),
    ("c", 1e-2),
    ("d", 1e-1),
    ("h", 1e2),
    ("k", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
];

fn base_symbol(symbol: &str) -> Option<ResolvedSymbol> {
    let (factor, dims) = match symbol {
        // SI base units (gram is the prefix base; the SI base is kg)
        "m" | "meter" | "metre" => (1.0, dims!(length: 1)),
        "g" | "gram" => (1e-3, dims!(mass: 1)),
        "s" | "sec" | "second" => (1.0, dims!(time: 1)),
        "A" | "ampere" => (1.0, dims!(current: 1)),
        "K" | "kelvin" => (1.0, dims!(temperature: 1)),
        "mol" | "mole" => (1.0, dims!(amount: 1)),
        "cd" | "candela" => (1.0, dims!(luminous: 1)),

        // Common derived units
        "Hz" | "hertz" => (1.0, dims!(time: -1)),
        "N" | "newton" => (1.0, dims!(mass: 1, length: 1, time: -2)),
        "Pa" | "pascal" => (1.0, dims!(mass: 1, length: -1, time: -2)),
        "J" | "joule" => (1.0, dims!(mass: 1, length: 2, time: -2)),
        "W" | "watt" => (1.0, dims!(mass: 1, length: 2, time: -3)),
        "C" | "coulomb" => (1.0, dims!(current: 1, time: 1)),
        "V" | "volt" => (1.0, dims!(mass: 1, length: 2, time: -3, current: -1)),

        // Accepted non-SI units
        "L" | "l" | "liter" | "litre" => (1e-3, dims!(length: 3)),
        "bar" => (1e5, dims!(mass: 1, length: -1, time: -2)),
        "min" | "minute" => (60.0, dims!(time: 1)),
        "hr" | "hour" => (3600.0, dims!(time: 1)),
        "day" => (86_400.0, dims!(time: 1)),
        "rpm" => (1.0 / 60.0, dims!(time: -1)),
        "degC" | "celsius" => (1.0, dims!(temperature: 1)),

        // Dimensionless carriers
        "rad" | "radian" | "sr" | "count" | "counts" => (1.0, Dimensions::NONE),
        "deg" | "degree" => (std::f64::consts::PI / 180.0, Dimensions::NONE),
        "%" | "percent" => (0.01, Dimensions::NONE),

        _ => return None,
    };
    Some(ResolvedSymbol { factor, dims })
}
