//! standard_name::transform
//!
//! Name transformations: structural patterns that synthesize standard
//! names not literally present in a table.
//!
//! # Design
//!
//! Each transformation is a `(pattern, resolver)` pair. Resolution is
//! first-match over a fixed, ordered strategy list: the first
//! transformation whose pattern matches *and* whose captured sub-names
//! all resolve wins. A resolver returns:
//!
//! - `Ok(Some(name))` - synthesized successfully
//! - `Ok(None)` - pattern matched but a sub-name did not resolve;
//!   resolution continues with the next transformation
//! - `Err(_)` - a hard error, e.g. an unregistered device token;
//!   this is a distinct failure kind from "name not found"
//!
//! The synthesized unit follows each transformation's algebra:
//! derivatives and ratios divide, products multiply, squares square,
//! magnitudes and differences keep the operand unit.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::name::StandardName;
use super::table::StandardNameTable;
use super::{AffixKind, LookupError};

type Resolver = fn(&Captures, &StandardNameTable, u32) -> Result<Option<StandardName>, LookupError>;

/// A single `(pattern, resolver)` strategy.
pub struct Transformation {
    /// Identifier used in diagnostics.
    pub name: &'static str,
    pattern: &'static str,
    resolver: Resolver,
}

impl Transformation {
    /// Apply this transformation to a candidate name.
    ///
    /// Returns `Ok(None)` when the pattern does not match or a
    /// sub-name fails to resolve softly.
    pub(crate) fn apply(
        &self,
        index: usize,
        name: &str,
        table: &StandardNameTable,
        depth: u32,
    ) -> Result<Option<StandardName>, LookupError> {
        match compiled(index).captures(name) {
            Some(caps) => (self.resolver)(&caps, table, depth),
            None => Ok(None),
        }
    }
}

/// The ordered strategy list.
pub const TRANSFORMATIONS: [Transformation; 9] = [
    Transformation {
        name: "derivative_of_X_wrt_Y",
        pattern: r"^derivative_of_(.+)_wrt_(.+)$",
        resolver: derivative_of_x_wrt_y,
    },
    Transformation {
        name: "magnitude_of",
        pattern: r"^magnitude_of_(.+)$",
        resolver: magnitude_of,
    },
    Transformation {
        name: "square_of",
        pattern: r"^square_of_(.+)$",
        resolver: square_of,
    },
    Transformation {
        name: "product_of_X_and_Y",
        pattern: r"^product_of_(.+)_and_(.+)$",
        resolver: product_of_x_and_y,
    },
    Transformation {
        name: "ratio_of_X_and_Y",
        pattern: r"^ratio_of_(.+)_and_(.+)$",
        resolver: ratio_of_x_and_y,
    },
    Transformation {
        name: "difference_of_X_across_device",
        pattern: r"^difference_of_(.+)_across_(.+)$",
        resolver: difference_of_x_across_device,
    },
    Transformation {
        name: "difference_of_X_and_Y_across_device",
        pattern: r"^difference_of_(.+)_and_(.+)_across_(.+)$",
        resolver: difference_of_x_and_y_across_device,
    },
    Transformation {
        name: "difference_of_X_and_Y_between_LOC1_and_LOC2",
        pattern: r"^difference_of_(.+)_and_(.+)_between_(.+)_and_(.+)$",
        resolver: difference_of_x_and_y_between_locations,
    },
    Transformation {
        name: "X_at_LOC",
        pattern: r"^(.+)_at_(.+)$",
        resolver: x_at_location,
    },
];

/// Compiled patterns, built once. All patterns are literals covered by
/// unit tests, so compilation cannot fail at runtime.
fn compiled(index: usize) -> &'static Regex {
    static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
    &COMPILED.get_or_init(|| {
        TRANSFORMATIONS
            .iter()
            .map(|t| Regex::new(t.pattern).expect("static transformation pattern"))
            .collect()
    })[index]
}

/// Resolve a sub-name: "not found" is soft (`None`), affix and unit
/// errors stay hard.
fn sub(
    table: &StandardNameTable,
    name: &str,
    depth: u32,
) -> Result<Option<StandardName>, LookupError> {
    match table.resolve_at_depth(name, depth) {
        Ok(sn) => Ok(Some(sn)),
        Err(LookupError::NotFound { .. }) => Ok(None),
        Err(other) => Err(other),
    }
}

fn require_device(table: &StandardNameTable, token: &str) -> Result<(), LookupError> {
    if !table.devices().iter().any(|d| d == token) {
        return Err(LookupError::UnknownAffix {
            kind: AffixKind::Device,
            token: token.to_string(),
            table: table.name().to_string(),
            available: table.devices().to_vec(),
        });
    }
    Ok(())
}

fn require_location(table: &StandardNameTable, token: &str) -> Result<(), LookupError> {
    if !table.locations().iter().any(|l| l == token) {
        return Err(LookupError::UnknownAffix {
            kind: AffixKind::Location,
            token: token.to_string(),
            table: table.name().to_string(),
            available: table.locations().to_vec(),
        });
    }
    Ok(())
}

fn require_equal_units(left: &StandardName, right: &StandardName) -> Result<(), LookupError> {
    if !left.units().base_equivalent(right.units()) {
        return Err(LookupError::IncompatibleOperands {
            left: left.name().to_string(),
            left_units: left.units().to_string(),
            right: right.name().to_string(),
            right_units: right.units().to_string(),
        });
    }
    Ok(())
}

fn derivative_of_x_wrt_y(
    caps: &Captures,
    table: &StandardNameTable,
    depth: u32,
) -> Result<Option<StandardName>, LookupError> {
    let (Some(x), Some(y)) = (sub(table, &caps[1], depth)?, sub(table, &caps[2], depth)?) else {
        return Ok(None);
    };
    let units = x.units().divide(y.units());
    let description = format!("Derivative of {} with respect to {}", x.name(), y.name());
    Ok(Some(StandardName::from_parts(
        caps[0].to_string(),
        units,
        description,
    )))
}

fn magnitude_of(
    caps: &Captures,
    table: &StandardNameTable,
    depth: u32,
) -> Result<Option<StandardName>, LookupError> {
    let Some(x) = sub(table, &caps[1], depth)? else {
        return Ok(None);
    };
    let description = format!("Magnitude of {}", x.name());
    Ok(Some(StandardName::from_parts(
        caps[0].to_string(),
        x.units().clone(),
        description,
    )))
}

fn square_of(
    caps: &Captures,
    table: &StandardNameTable,
    depth: u32,
) -> Result<Option<StandardName>, LookupError> {
    let Some(x) = sub(table, &caps[1], depth)? else {
        return Ok(None);
    };
    let description = format!("Square of {}", x.name());
    Ok(Some(StandardName::from_parts(
        caps[0].to_string(),
        x.units().powi(2),
        description,
    )))
}

fn product_of_x_and_y(
    caps: &Captures,
    table: &StandardNameTable,
    depth: u32,
) -> Result<Option<StandardName>, LookupError> {
    let (Some(x), Some(y)) = (sub(table, &caps[1], depth)?, sub(table, &caps[2], depth)?) else {
        return Ok(None);
    };
    let units = x.units().multiply(y.units());
    let description = format!("Product of {} and {}", x.name(), y.name());
    Ok(Some(StandardName::from_parts(
        caps[0].to_string(),
        units,
        description,
    )))
}

fn ratio_of_x_and_y(
    caps: &Captures,
    table: &StandardNameTable,
    depth: u32,
) -> Result<Option<StandardName>, LookupError> {
    let (Some(x), Some(y)) = (sub(table, &caps[1], depth)?, sub(table, &caps[2], depth)?) else {
        return Ok(None);
    };
    let units = x.units().divide(y.units());
    let description = format!("Ratio of {} and {}", x.name(), y.name());
    Ok(Some(StandardName::from_parts(
        caps[0].to_string(),
        units,
        description,
    )))
}

fn difference_of_x_across_device(
    caps: &Captures,
    table: &StandardNameTable,
    depth: u32,
) -> Result<Option<StandardName>, LookupError> {
    require_device(table, &caps[2])?;
    let Some(x) = sub(table, &caps[1], depth)? else {
        return Ok(None);
    };
    let description = format!("Difference of {} across {}", x.name(), &caps[2]);
    Ok(Some(StandardName::from_parts(
        caps[0].to_string(),
        x.units().clone(),
        description,
    )))
}

fn difference_of_x_and_y_across_device(
    caps: &Captures,
    table: &StandardNameTable,
    depth: u32,
) -> Result<Option<StandardName>, LookupError> {
    require_device(table, &caps[3])?;
    let (Some(x), Some(y)) = (sub(table, &caps[1], depth)?, sub(table, &caps[2], depth)?) else {
        return Ok(None);
    };
    require_equal_units(&x, &y)?;
    let description = format!(
        "Difference of {} and {} across {}",
        x.name(),
        y.name(),
        &caps[3]
    );
    Ok(Some(StandardName::from_parts(
        caps[0].to_string(),
        x.units().clone(),
        description,
    )))
}

fn difference_of_x_and_y_between_locations(
    caps: &Captures,
    table: &StandardNameTable,
    depth: u32,
) -> Result<Option<StandardName>, LookupError> {
    require_location(table, &caps[3])?;
    require_location(table, &caps[4])?;
    let (Some(x), Some(y)) = (sub(table, &caps[1], depth)?, sub(table, &caps[2], depth)?) else {
        return Ok(None);
    };
    require_equal_units(&x, &y)?;
    let description = format!(
        "Difference of {} and {} between {} and {}",
        x.name(),
        y.name(),
        &caps[3],
        &caps[4]
    );
    Ok(Some(StandardName::from_parts(
        caps[0].to_string(),
        x.units().clone(),
        description,
    )))
}

fn x_at_location(
    caps: &Captures,
    table: &StandardNameTable,
    depth: u32,
) -> Result<Option<StandardName>, LookupError> {
    let Some(x) = sub(table, &caps[1], depth)? else {
        return Ok(None);
    };
    require_location(table, &caps[2])?;
    let description = format!("{} at {}", x.description(), &caps[2]);
    Ok(Some(StandardName::from_parts(
        caps[0].to_string(),
        x.units().clone(),
        description,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_patterns_compile() {
        for i in 0..TRANSFORMATIONS.len() {
            let _ = compiled(i);
        }
    }
}
