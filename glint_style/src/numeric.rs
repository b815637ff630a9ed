// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Numeric values and `calc()` algebra.
//!
//! A [`CssNumeric`] is either a single [`UnitValue`] or a symbolic math tree.
//! Operations fold eagerly whenever every operand involved can be converted to
//! a common unit without context (`1s + 250ms`, `max(10deg, 0.1rad)`), and stay
//! symbolic when resolution needs a percentage base or a font size
//! (`10% + 4px`, `min(2em, 30px)`). Combining incompatible dimensions
//! (`4px + 10deg`, `2px * 3px`) fails with [`StyleError::UnitMismatch`].

use core::fmt;

use crate::error::StyleError;
use crate::unit::{Unit, UnitFamily, UnitValue};

/// A numeric style value: concrete or symbolic.
#[derive(Clone, Debug, PartialEq)]
pub enum CssNumeric {
    /// A single value with a unit.
    Unit(UnitValue),
    /// An unresolved expression.
    Math(Box<MathExpr>),
}

/// Symbolic math node.
#[derive(Clone, Debug, PartialEq)]
pub enum MathExpr {
    /// Sum of terms.
    Sum(Vec<CssNumeric>),
    /// Product of factors.
    Product(Vec<CssNumeric>),
    /// Arithmetic negation.
    Negate(CssNumeric),
    /// Reciprocal; only valid for unitless operands.
    Invert(CssNumeric),
    /// Smallest operand.
    Min(Vec<CssNumeric>),
    /// Largest operand.
    Max(Vec<CssNumeric>),
    /// `clamp(min, value, max)`.
    Clamp(CssNumeric, CssNumeric, CssNumeric),
}

/// Type of a numeric expression after unit analysis.
///
/// `Length` covers mixes of lengths and percentages, which resolve to lengths.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NumericType {
    /// Unitless.
    Number,
    /// Pure percentage.
    Percent,
    /// Length, possibly mixed with percentages.
    Length,
    /// Angle.
    Angle,
    /// Duration.
    Time,
}

impl NumericType {
    fn of_unit(unit: Unit) -> Self {
        match unit.family() {
            UnitFamily::Number => Self::Number,
            UnitFamily::Percent => Self::Percent,
            UnitFamily::Length => Self::Length,
            UnitFamily::Angle => Self::Angle,
            UnitFamily::Time => Self::Time,
        }
    }

    fn representative(self) -> Unit {
        match self {
            Self::Number => Unit::Number,
            Self::Percent => Unit::Percent,
            Self::Length => Unit::Px,
            Self::Angle => Unit::Deg,
            Self::Time => Unit::Ms,
        }
    }

    fn additive(self, other: Self) -> Result<Self, StyleError> {
        match (self, other) {
            (a, b) if a == b => Ok(a),
            (Self::Percent, Self::Length) | (Self::Length, Self::Percent) => Ok(Self::Length),
            (a, b) => Err(StyleError::UnitMismatch {
                lhs: a.representative(),
                rhs: b.representative(),
            }),
        }
    }
}

/// Inputs needed to turn a numeric value into a plain number.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ResolveContext {
    /// What `100%` means. Without a base, percentages resolve to fractions (`50%` → `0.5`).
    pub percent_base: Option<f64>,
    /// Font size in pixels for `em`.
    pub font_size: f64,
    /// Root font size in pixels for `rem`.
    pub root_font_size: f64,
}

impl Default for ResolveContext {
    fn default() -> Self {
        Self {
            percent_base: None,
            font_size: 16.0,
            root_font_size: 16.0,
        }
    }
}

#[allow(
    clippy::should_implement_trait,
    reason = "Algebra is fallible and mirrors the CSS Typed OM method names."
)]
impl CssNumeric {
    /// A value with a unit.
    pub const fn new(value: f64, unit: Unit) -> Self {
        Self::Unit(UnitValue::new(value, unit))
    }

    /// A unitless number.
    pub const fn number(value: f64) -> Self {
        Self::new(value, Unit::Number)
    }

    /// A pixel length.
    pub const fn px(value: f64) -> Self {
        Self::new(value, Unit::Px)
    }

    /// The unit value, if this is not symbolic.
    pub fn as_unit(&self) -> Option<UnitValue> {
        match self {
            Self::Unit(v) => Some(*v),
            Self::Math(_) => None,
        }
    }

    /// Whether this value needs no further resolution of its structure.
    pub fn is_concrete(&self) -> bool {
        matches!(self, Self::Unit(_))
    }

    /// Unit analysis of the expression.
    pub fn numeric_type(&self) -> Result<NumericType, StyleError> {
        match self {
            Self::Unit(v) => Ok(NumericType::of_unit(v.unit)),
            Self::Math(m) => match &**m {
                MathExpr::Sum(items) | MathExpr::Min(items) | MathExpr::Max(items) => {
                    additive_type(items.iter())
                }
                MathExpr::Clamp(a, b, c) => additive_type([a, b, c].into_iter()),
                MathExpr::Product(items) => multiplicative_type(items.iter()),
                MathExpr::Negate(x) => x.numeric_type(),
                MathExpr::Invert(x) => match x.numeric_type()? {
                    NumericType::Number => Ok(NumericType::Number),
                    other => Err(StyleError::UnitMismatch {
                        lhs: Unit::Number,
                        rhs: other.representative(),
                    }),
                },
            },
        }
    }

    /// Whether a percentage appears anywhere in the expression.
    pub fn has_percent(&self) -> bool {
        match self {
            Self::Unit(v) => v.unit == Unit::Percent,
            Self::Math(m) => match &**m {
                MathExpr::Sum(items)
                | MathExpr::Product(items)
                | MathExpr::Min(items)
                | MathExpr::Max(items) => items.iter().any(Self::has_percent),
                MathExpr::Clamp(a, b, c) => a.has_percent() || b.has_percent() || c.has_percent(),
                MathExpr::Negate(x) | MathExpr::Invert(x) => x.has_percent(),
            },
        }
    }

    /// `self + rhs`
    pub fn add(self, rhs: Self) -> Result<Self, StyleError> {
        sum(vec![self, rhs])
    }

    /// `self - rhs`
    pub fn sub(self, rhs: Self) -> Result<Self, StyleError> {
        sum(vec![self, rhs.negate()])
    }

    /// `self * rhs`
    pub fn mul(self, rhs: Self) -> Result<Self, StyleError> {
        product(vec![self, rhs])
    }

    /// `self / rhs`; the divisor must be unitless.
    pub fn div(self, rhs: Self) -> Result<Self, StyleError> {
        let inverted = match rhs {
            Self::Unit(UnitValue {
                value,
                unit: Unit::Number,
            }) => Self::number(1.0 / value),
            other => Self::Math(Box::new(MathExpr::Invert(other))),
        };
        inverted.numeric_type()?;
        product(vec![self, inverted])
    }

    /// Arithmetic negation.
    pub fn negate(self) -> Self {
        match self {
            Self::Unit(v) => Self::new(-v.value, v.unit),
            Self::Math(m) => match *m {
                MathExpr::Negate(inner) => inner,
                other => Self::Math(Box::new(MathExpr::Negate(Self::Math(Box::new(other))))),
            },
        }
    }

    /// `min(values...)`. Folds only when every operand converts to a common unit.
    pub fn min(values: Vec<Self>) -> Result<Self, StyleError> {
        compare(values, MathExpr::Min, |a, b| a < b)
    }

    /// `max(values...)`. Folds only when every operand converts to a common unit.
    pub fn max(values: Vec<Self>) -> Result<Self, StyleError> {
        compare(values, MathExpr::Max, |a, b| a > b)
    }

    /// `clamp(lo, value, hi)`, which is `max(lo, min(value, hi))`.
    pub fn clamp(lo: Self, value: Self, hi: Self) -> Result<Self, StyleError> {
        additive_type([&lo, &value, &hi].into_iter())?;
        if let (Some(l), Some(v), Some(h)) = (lo.as_unit(), value.as_unit(), hi.as_unit())
            && l.unit.convertible_to(v.unit)
            && l.unit.convertible_to(h.unit)
        {
            let v = v.to(l.unit)?.value;
            let h = h.to(l.unit)?.value;
            return Ok(Self::new(v.min(h).max(l.value), l.unit));
        }
        Ok(Self::Math(Box::new(MathExpr::Clamp(lo, value, hi))))
    }

    /// Convert a concrete value to `unit`.
    pub fn to(&self, unit: Unit) -> Result<UnitValue, StyleError> {
        match self {
            Self::Unit(v) => v.to(unit),
            Self::Math(_) => Err(StyleError::UnitMismatch {
                lhs: self.numeric_type()?.representative(),
                rhs: unit,
            }),
        }
    }

    /// Evaluate to a plain number in the canonical unit of the value's family:
    /// pixels for lengths, degrees for angles, milliseconds for durations.
    pub fn resolve(&self, ctx: &ResolveContext) -> f64 {
        match self {
            Self::Unit(v) => resolve_unit(*v, ctx),
            Self::Math(m) => match &**m {
                MathExpr::Sum(items) => items.iter().map(|x| x.resolve(ctx)).sum(),
                MathExpr::Product(items) => items.iter().map(|x| x.resolve(ctx)).product(),
                MathExpr::Negate(x) => -x.resolve(ctx),
                MathExpr::Invert(x) => 1.0 / x.resolve(ctx),
                MathExpr::Min(items) => items
                    .iter()
                    .map(|x| x.resolve(ctx))
                    .fold(f64::INFINITY, f64::min),
                MathExpr::Max(items) => items
                    .iter()
                    .map(|x| x.resolve(ctx))
                    .fold(f64::NEG_INFINITY, f64::max),
                MathExpr::Clamp(lo, v, hi) => v
                    .resolve(ctx)
                    .min(hi.resolve(ctx))
                    .max(lo.resolve(ctx)),
            },
        }
    }
}

fn resolve_unit(v: UnitValue, ctx: &ResolveContext) -> f64 {
    match v.unit {
        Unit::Percent => ctx.percent_base.map_or(v.value / 100.0, |b| v.value / 100.0 * b),
        Unit::Em => v.value * ctx.font_size,
        Unit::Rem => v.value * ctx.root_font_size,
        Unit::Rad => v.value.to_degrees(),
        Unit::Turn => v.value * 360.0,
        Unit::S => v.value * 1000.0,
        Unit::Number | Unit::Px | Unit::Deg | Unit::Ms => v.value,
    }
}

fn additive_type<'a>(
    mut items: impl Iterator<Item = &'a CssNumeric>,
) -> Result<NumericType, StyleError> {
    let Some(first) = items.next() else {
        return Ok(NumericType::Number);
    };
    items.try_fold(first.numeric_type()?, |acc, x| acc.additive(x.numeric_type()?))
}

fn multiplicative_type<'a>(
    items: impl Iterator<Item = &'a CssNumeric>,
) -> Result<NumericType, StyleError> {
    let mut ty = NumericType::Number;
    for item in items {
        match (ty, item.numeric_type()?) {
            (_, NumericType::Number) => {}
            (NumericType::Number, other) => ty = other,
            (a, b) => {
                return Err(StyleError::UnitMismatch {
                    lhs: a.representative(),
                    rhs: b.representative(),
                });
            }
        }
    }
    Ok(ty)
}

/// Build a normalized sum: nested sums flattened, convertible terms folded.
fn sum(terms: Vec<CssNumeric>) -> Result<CssNumeric, StyleError> {
    additive_type(terms.iter())?;
    let mut flat = Vec::with_capacity(terms.len());
    for t in terms {
        match t {
            CssNumeric::Math(m) => match *m {
                MathExpr::Sum(inner) => flat.extend(inner),
                other => flat.push(CssNumeric::Math(Box::new(other))),
            },
            unit => flat.push(unit),
        }
    }
    let mut out: Vec<CssNumeric> = Vec::with_capacity(flat.len());
    for t in flat {
        if let Some(v) = t.as_unit()
            && let Some(acc) = out.iter_mut().find_map(|o| match o {
                CssNumeric::Unit(u) if u.unit.convertible_to(v.unit) => Some(u),
                _ => None,
            })
        {
            acc.value += v.to(acc.unit)?.value;
            continue;
        }
        out.push(t);
    }
    Ok(collapse(out, MathExpr::Sum))
}

/// Build a normalized product: unitless factors folded into one coefficient.
fn product(factors: Vec<CssNumeric>) -> Result<CssNumeric, StyleError> {
    multiplicative_type(factors.iter())?;
    let mut flat = Vec::with_capacity(factors.len());
    for f in factors {
        match f {
            CssNumeric::Math(m) => match *m {
                MathExpr::Product(inner) => flat.extend(inner),
                other => flat.push(CssNumeric::Math(Box::new(other))),
            },
            unit => flat.push(unit),
        }
    }
    let mut coefficient = 1.0;
    let mut rest = Vec::with_capacity(flat.len());
    for f in flat {
        match f {
            CssNumeric::Unit(UnitValue {
                value,
                unit: Unit::Number,
            }) => coefficient *= value,
            other => rest.push(other),
        }
    }
    if rest.is_empty() {
        return Ok(CssNumeric::number(coefficient));
    }
    if let [CssNumeric::Unit(v)] = rest.as_mut_slice() {
        v.value *= coefficient;
        return Ok(CssNumeric::Unit(*v));
    }
    if coefficient != 1.0 {
        rest.insert(0, CssNumeric::number(coefficient));
    }
    Ok(collapse(rest, MathExpr::Product))
}

fn compare(
    values: Vec<CssNumeric>,
    build: fn(Vec<CssNumeric>) -> MathExpr,
    wins: fn(f64, f64) -> bool,
) -> Result<CssNumeric, StyleError> {
    additive_type(values.iter())?;
    let units: Option<Vec<UnitValue>> = values.iter().map(CssNumeric::as_unit).collect();
    if let Some(units) = units
        && let Some(first) = units.first().copied()
        && units.iter().all(|u| u.unit.convertible_to(first.unit))
    {
        let mut best = first;
        for u in &units[1..] {
            let v = u.to(first.unit)?.value;
            if wins(v, best.value) {
                best.value = v;
            }
        }
        return Ok(CssNumeric::Unit(best));
    }
    Ok(CssNumeric::Math(Box::new(build(values))))
}

fn collapse(mut items: Vec<CssNumeric>, build: fn(Vec<CssNumeric>) -> MathExpr) -> CssNumeric {
    if items.len() == 1
        && let Some(only) = items.pop()
    {
        return only;
    }
    CssNumeric::Math(Box::new(build(items)))
}

impl fmt::Display for CssNumeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit(v) => write!(f, "{v}"),
            Self::Math(m) => match &**m {
                MathExpr::Min(_) | MathExpr::Max(_) | MathExpr::Clamp(..) => write_expr(f, self, false),
                _ => {
                    f.write_str("calc(")?;
                    write_expr(f, self, false)?;
                    f.write_str(")")
                }
            },
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, name: &str, items: &[&CssNumeric]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_expr(f, item, false)?;
    }
    f.write_str(")")
}

/// Write the inside of a `calc()`. `nested` parenthesizes sums inside products.
fn write_expr(f: &mut fmt::Formatter<'_>, value: &CssNumeric, nested: bool) -> fmt::Result {
    let CssNumeric::Math(m) = value else {
        return write!(f, "{value}");
    };
    match &**m {
        MathExpr::Sum(terms) => {
            if nested {
                f.write_str("(")?;
            }
            for (i, term) in terms.iter().enumerate() {
                let (negative, magnitude) = match term {
                    CssNumeric::Unit(v) if i > 0 && v.value.is_sign_negative() => {
                        (true, CssNumeric::new(-v.value, v.unit))
                    }
                    CssNumeric::Math(inner) if i > 0 => match &**inner {
                        MathExpr::Negate(x) => (true, x.clone()),
                        _ => (false, term.clone()),
                    },
                    _ => (false, term.clone()),
                };
                if i > 0 {
                    f.write_str(if negative { " - " } else { " + " })?;
                }
                write_expr(f, &magnitude, true)?;
            }
            if nested {
                f.write_str(")")?;
            }
            Ok(())
        }
        MathExpr::Product(factors) => {
            for (i, factor) in factors.iter().enumerate() {
                let inverted = match factor {
                    CssNumeric::Math(inner) => match &**inner {
                        MathExpr::Invert(x) => Some(x),
                        _ => None,
                    },
                    CssNumeric::Unit(_) => None,
                };
                match (i, inverted) {
                    (0, Some(x)) => {
                        f.write_str("1 / ")?;
                        write_expr(f, x, true)?;
                    }
                    (0, None) => write_expr(f, factor, true)?,
                    (_, Some(x)) => {
                        f.write_str(" / ")?;
                        write_expr(f, x, true)?;
                    }
                    (_, None) => {
                        f.write_str(" * ")?;
                        write_expr(f, factor, true)?;
                    }
                }
            }
            Ok(())
        }
        MathExpr::Negate(x) => {
            f.write_str("-1 * ")?;
            write_expr(f, x, true)
        }
        MathExpr::Invert(x) => {
            f.write_str("1 / ")?;
            write_expr(f, x, true)
        }
        MathExpr::Min(items) => write_list(f, "min", &items.iter().collect::<Vec<_>>()),
        MathExpr::Max(items) => write_list(f, "max", &items.iter().collect::<Vec<_>>()),
        MathExpr::Clamp(a, b, c) => write_list(f, "clamp", &[a, b, c]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(v: f64) -> CssNumeric {
        CssNumeric::px(v)
    }

    fn pct(v: f64) -> CssNumeric {
        CssNumeric::new(v, Unit::Percent)
    }

    #[test]
    fn compatible_units_fold() {
        let t = CssNumeric::new(1.0, Unit::S)
            .add(CssNumeric::new(250.0, Unit::Ms))
            .unwrap();
        assert_eq!(t, CssNumeric::new(1.25, Unit::S));

        let a = CssNumeric::new(90.0, Unit::Deg)
            .sub(CssNumeric::new(0.25, Unit::Turn))
            .unwrap();
        assert_eq!(a, CssNumeric::new(0.0, Unit::Deg));
    }

    #[test]
    fn length_and_percent_stay_symbolic() {
        let v = pct(50.0).add(px(10.0)).unwrap();
        assert!(!v.is_concrete());
        assert_eq!(v.numeric_type(), Ok(NumericType::Length));
        assert_eq!(v.to_string(), "calc(50% + 10px)");

        let ctx = ResolveContext {
            percent_base: Some(200.0),
            ..ResolveContext::default()
        };
        assert_eq!(v.resolve(&ctx), 110.0);
    }

    #[test]
    fn cross_family_arithmetic_is_rejected() {
        assert!(matches!(
            px(4.0).add(CssNumeric::new(10.0, Unit::Deg)),
            Err(StyleError::UnitMismatch { .. })
        ));
        assert!(matches!(
            px(2.0).mul(px(3.0)),
            Err(StyleError::UnitMismatch { .. })
        ));
        assert!(matches!(
            CssNumeric::number(1.0).div(px(3.0)),
            Err(StyleError::UnitMismatch { .. })
        ));
    }

    #[test]
    fn scaling_folds_into_the_dimension() {
        let v = px(10.0).mul(CssNumeric::number(3.0)).unwrap();
        assert_eq!(v, px(30.0));
        let v = px(10.0).div(CssNumeric::number(4.0)).unwrap();
        assert_eq!(v, px(2.5));
        let v = CssNumeric::number(2.0).mul(pct(10.0).add(px(1.0)).unwrap()).unwrap();
        assert_eq!(v.to_string(), "calc(2 * (10% + 1px))");
    }

    #[test]
    fn subtraction_serializes_with_minus() {
        let v = pct(100.0).sub(px(20.0)).unwrap();
        assert_eq!(v.to_string(), "calc(100% - 20px)");
    }

    #[test]
    fn min_max_clamp_fold_lazily() {
        let v = CssNumeric::max(vec![
            CssNumeric::new(10.0, Unit::Deg),
            CssNumeric::new(1.0, Unit::Rad),
        ])
        .unwrap();
        assert!((v.to(Unit::Deg).unwrap().value - 57.295_779_513_082_32).abs() < 1e-9);

        let v = CssNumeric::min(vec![CssNumeric::new(2.0, Unit::Em), px(30.0)]).unwrap();
        assert!(!v.is_concrete());
        assert_eq!(v.to_string(), "min(2em, 30px)");
        let ctx = ResolveContext {
            font_size: 10.0,
            ..ResolveContext::default()
        };
        assert_eq!(v.resolve(&ctx), 20.0);

        let c = CssNumeric::clamp(px(0.0), px(150.0), px(100.0)).unwrap();
        assert_eq!(c, px(100.0));
        assert!(CssNumeric::clamp(px(0.0), CssNumeric::number(1.0), px(1.0)).is_err());
    }
}
