// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interpolation between two parsed values.

use crate::error::StyleError;
use crate::numeric::CssNumeric;
use crate::value::{ParsedValue, Rgba};

/// Interpolate between `from` and `to` at progress `t`.
///
/// Numbers in convertible units blend in `from`'s unit. Values that only
/// resolve later (`50%` to `10px`) blend symbolically as
/// `from * (1 - t) + to * t`. Colors blend per channel, lists item by item,
/// and transform functions argument by argument when their shapes agree.
/// Anything else steps: `from` before the midpoint, `to` from it on.
///
/// ```
/// use glint_style::{interpolate, parse, RawValue, Syntax};
///
/// let a = parse(&RawValue::from("10px"), Syntax::Length).unwrap();
/// let b = parse(&RawValue::from("30px"), Syntax::Length).unwrap();
/// assert_eq!(interpolate(&a, &b, 0.25).unwrap().to_string(), "15px");
/// ```
pub fn interpolate(from: &ParsedValue, to: &ParsedValue, t: f64) -> Result<ParsedValue, StyleError> {
    let blended = match (from, to) {
        (ParsedValue::Numeric(a), ParsedValue::Numeric(b)) => {
            lerp_numeric(a, b, t).map(ParsedValue::Numeric)
        }
        (ParsedValue::Color(a), ParsedValue::Color(b)) => Some(ParsedValue::Color(lerp_color(*a, *b, t))),
        (ParsedValue::List(a, sa), ParsedValue::List(b, sb)) if sa == sb && a.len() == b.len() => a
            .iter()
            .zip(b)
            .map(|(x, y)| interpolate(x, y, t))
            .collect::<Result<Vec<_>, _>>()
            .ok()
            .map(|items| ParsedValue::List(items, *sa)),
        (
            ParsedValue::Function { name: na, args: aa },
            ParsedValue::Function { name: nb, args: ab },
        ) if na == nb && aa.len() == ab.len() => aa
            .iter()
            .zip(ab)
            .map(|(x, y)| lerp_numeric(x, y, t))
            .collect::<Option<Vec<_>>>()
            .map(|args| ParsedValue::Function {
                name: na.clone(),
                args,
            }),
        _ => None,
    };
    Ok(blended.unwrap_or_else(|| if t < 0.5 { from.clone() } else { to.clone() }))
}

fn lerp_numeric(a: &CssNumeric, b: &CssNumeric, t: f64) -> Option<CssNumeric> {
    if let (Some(x), Some(y)) = (a.as_unit(), b.as_unit())
        && let Ok(y) = y.to(x.unit)
    {
        return Some(CssNumeric::new(x.value + (y.value - x.value) * t, x.unit));
    }
    let head = a.clone().mul(CssNumeric::number(1.0 - t)).ok()?;
    let tail = b.clone().mul(CssNumeric::number(t)).ok()?;
    head.add(tail).ok()
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Clamped to the channel range before the cast."
)]
fn lerp_color(a: Rgba, b: Rgba, t: f64) -> Rgba {
    let ch = |x: u8, y: u8| {
        let v = f64::from(x) + (f64::from(y) - f64::from(x)) * t;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba::new(ch(a.r, b.r), ch(a.g, b.g), ch(a.b, b.b), ch(a.a, b.a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{Syntax, parse};
    use crate::value::RawValue;

    fn v(s: &str, syntax: Syntax) -> ParsedValue {
        parse(&RawValue::from(s), syntax).unwrap()
    }

    #[test]
    fn units_convert_to_the_start_unit() {
        let out = interpolate(&v("1s", Syntax::Time), &v("3000ms", Syntax::Time), 0.5).unwrap();
        assert_eq!(out.to_string(), "2s");
    }

    #[test]
    fn mixed_types_blend_symbolically() {
        let out = interpolate(
            &v("100%", Syntax::LengthPercentage),
            &v("20px", Syntax::LengthPercentage),
            0.5,
        )
        .unwrap();
        assert_eq!(out.to_string(), "calc(50% + 10px)");
    }

    #[test]
    fn colors_blend_per_channel() {
        let out = interpolate(&v("#000000", Syntax::Color), &v("#ffffff", Syntax::Color), 0.5).unwrap();
        assert_eq!(out, ParsedValue::Color(Rgba::new(128, 128, 128, 255)));
    }

    #[test]
    fn matching_transforms_blend_arguments() {
        let a = v("translate(0px, 0px) rotate(0deg)", Syntax::Transform);
        let b = v("translate(10px, 20px) rotate(90deg)", Syntax::Transform);
        let out = interpolate(&a, &b, 0.5).unwrap();
        assert_eq!(out.to_string(), "translate(5px, 10px) rotate(45deg)");
    }

    #[test]
    fn incompatible_values_step_at_midpoint() {
        let a = v("round", Syntax::Keyword(&["round", "butt"]));
        let b = v("butt", Syntax::Keyword(&["round", "butt"]));
        assert_eq!(interpolate(&a, &b, 0.49).unwrap(), a);
        assert_eq!(interpolate(&a, &b, 0.5).unwrap(), b);

        let short = v("1 2", Syntax::NumberList);
        let long = v("1 2 3", Syntax::NumberList);
        assert_eq!(interpolate(&short, &long, 0.2).unwrap(), short);
    }
}
