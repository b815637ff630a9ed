// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Units, unit families and single unit-tagged values.

use core::fmt;

use crate::error::StyleError;

/// Unit tag of a numeric value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Unit {
    /// Unitless number.
    Number,
    /// `%`
    Percent,
    /// `px`
    Px,
    /// `em`, relative to the node's font size.
    Em,
    /// `rem`, relative to the root font size.
    Rem,
    /// `deg`
    Deg,
    /// `rad`
    Rad,
    /// `turn`
    Turn,
    /// `s`
    S,
    /// `ms`
    Ms,
}

/// Broad category of a unit, used to type-check arithmetic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnitFamily {
    /// Unitless.
    Number,
    /// Percentage; resolves against a context-dependent base.
    Percent,
    /// Absolute and font-relative lengths.
    Length,
    /// Angles.
    Angle,
    /// Durations.
    Time,
}

impl Unit {
    /// Look up a unit by its CSS suffix, case-insensitively.
    pub fn from_css(suffix: &str) -> Option<Self> {
        Some(match suffix.to_ascii_lowercase().as_str() {
            "" => Self::Number,
            "%" => Self::Percent,
            "px" => Self::Px,
            "em" => Self::Em,
            "rem" => Self::Rem,
            "deg" => Self::Deg,
            "rad" => Self::Rad,
            "turn" => Self::Turn,
            "s" => Self::S,
            "ms" => Self::Ms,
            _ => return None,
        })
    }

    /// The CSS suffix, empty for numbers.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Number => "",
            Self::Percent => "%",
            Self::Px => "px",
            Self::Em => "em",
            Self::Rem => "rem",
            Self::Deg => "deg",
            Self::Rad => "rad",
            Self::Turn => "turn",
            Self::S => "s",
            Self::Ms => "ms",
        }
    }

    pub(crate) const fn suffix_or_number(self) -> &'static str {
        match self {
            Self::Number => "number",
            other => other.suffix(),
        }
    }

    /// Family this unit belongs to.
    pub const fn family(self) -> UnitFamily {
        match self {
            Self::Number => UnitFamily::Number,
            Self::Percent => UnitFamily::Percent,
            Self::Px | Self::Em | Self::Rem => UnitFamily::Length,
            Self::Deg | Self::Rad | Self::Turn => UnitFamily::Angle,
            Self::S | Self::Ms => UnitFamily::Time,
        }
    }

    /// Canonical unit and the factor converting one of `self` into it.
    ///
    /// `em` and `rem` are their own canonical units: they only become pixels
    /// once a font size is known.
    const fn canonical(self) -> (Self, f64) {
        match self {
            Self::Rad => (Self::Deg, 180.0 / core::f64::consts::PI),
            Self::Turn => (Self::Deg, 360.0),
            Self::S => (Self::Ms, 1000.0),
            other => (other, 1.0),
        }
    }

    /// Whether values in `self` can be converted to `other` without context.
    pub fn convertible_to(self, other: Self) -> bool {
        self.canonical().0 == other.canonical().0
    }
}

/// A number tagged with a unit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UnitValue {
    /// Magnitude.
    pub value: f64,
    /// Unit tag.
    pub unit: Unit,
}

impl UnitValue {
    /// Create a unit value.
    pub const fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Convert to another unit of the same family.
    ///
    /// ```
    /// use glint_style::{Unit, UnitValue};
    ///
    /// let quarter = UnitValue::new(0.25, Unit::Turn).to(Unit::Deg).unwrap();
    /// assert_eq!(quarter.value, 90.0);
    /// assert!(UnitValue::new(1.0, Unit::Px).to(Unit::Deg).is_err());
    /// ```
    pub fn to(self, unit: Unit) -> Result<Self, StyleError> {
        if self.unit == unit {
            return Ok(self);
        }
        let (from_canon, from_factor) = self.unit.canonical();
        let (to_canon, to_factor) = unit.canonical();
        if from_canon != to_canon {
            return Err(StyleError::UnitMismatch {
                lhs: self.unit,
                rhs: unit,
            });
        }
        Ok(Self::new(self.value * from_factor / to_factor, unit))
    }
}

impl fmt::Display for UnitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_converts_both_ways() {
        let v = UnitValue::new(1.5, Unit::S).to(Unit::Ms).unwrap();
        assert_eq!(v, UnitValue::new(1500.0, Unit::Ms));
        assert_eq!(v.to(Unit::S).unwrap().value, 1.5);
    }

    #[test]
    fn font_relative_units_do_not_convert() {
        assert!(UnitValue::new(2.0, Unit::Em).to(Unit::Px).is_err());
        assert!(UnitValue::new(2.0, Unit::Em).to(Unit::Rem).is_err());
        assert_eq!(Unit::Em.family(), Unit::Px.family());
    }

    #[test]
    fn mismatch_names_both_units() {
        let err = UnitValue::new(1.0, Unit::Ms).to(Unit::Percent).unwrap_err();
        assert_eq!(
            err,
            StyleError::UnitMismatch {
                lhs: Unit::Ms,
                rhs: Unit::Percent
            }
        );
        assert_eq!(err.to_string(), "incompatible units `ms` and `%`");
    }

    #[test]
    fn suffix_lookup_ignores_case() {
        assert_eq!(Unit::from_css("DEG"), Some(Unit::Deg));
        assert_eq!(Unit::from_css("vw"), None);
    }
}
