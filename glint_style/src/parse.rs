// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parsing raw values into [`ParsedValue`]s according to a property [`Syntax`].

use cssparser::{ParseError, ParseErrorKind, Parser, ParserInput, Token};
use kurbo::BezPath;

use crate::error::StyleError;
use crate::numeric::{CssNumeric, NumericType};
use crate::unit::Unit;
use crate::value::{CssWide, ListSeparator, ObjectRef, ParsedValue, RawValue, Reference, Rgba};

/// Value grammar of a property.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Syntax {
    /// `<length>`; bare numbers are pixels.
    Length,
    /// `<length-percentage>`
    LengthPercentage,
    /// `<number>`
    Number,
    /// `<number> | <percentage>`
    NumberPercentage,
    /// `<integer>`
    Integer,
    /// `<angle>`; bare numbers are degrees.
    Angle,
    /// `<time>`; bare numbers are milliseconds.
    Time,
    /// `<color>`
    Color,
    /// `none | <color> | url(#id)`
    Paint,
    /// One of a fixed set of identifiers.
    Keyword(&'static [&'static str]),
    /// Free text, kept verbatim.
    Text,
    /// `none | url(#id)`, or a direct object handle.
    Reference,
    /// `none | <transform-function>+`
    Transform,
    /// One or two of `left | center | right | top | bottom | <length-percentage>`.
    Position,
    /// `none | <length>#`, comma or space separated.
    NumberList,
    /// `none | x,y x,y ...`
    Points,
    /// `none | <svg path data>`
    PathData,
}

#[derive(Clone, Debug, PartialEq)]
enum Fail {
    Expected(&'static str),
    Math(StyleError),
}

type PResult<'i, T> = Result<T, ParseError<'i, Fail>>;

/// Parse a raw value according to `syntax`.
///
/// The CSS-wide keywords `inherit`, `initial` and `unset` are accepted for every
/// syntax and come back as [`ParsedValue::Keyword`].
///
/// ```
/// use glint_style::{parse, ParsedValue, RawValue, Syntax};
///
/// let v = parse(&RawValue::from("calc(100% - 20px)"), Syntax::LengthPercentage).unwrap();
/// assert_eq!(v.to_string(), "calc(100% - 20px)");
///
/// let r = parse(&RawValue::from(10.0), Syntax::Length).unwrap();
/// assert_eq!(r.to_string(), "10px");
///
/// assert!(parse(&RawValue::from("ten"), Syntax::Length).is_err());
/// ```
pub fn parse(raw: &RawValue, syntax: Syntax) -> Result<ParsedValue, StyleError> {
    match raw {
        RawValue::Str(s) => parse_str(s, syntax),
        RawValue::Number(n) => from_number(*n, syntax),
        RawValue::List(items) => from_list(items, syntax),
        RawValue::Ref(r) => match syntax {
            Syntax::Reference | Syntax::Paint => Ok(ParsedValue::Reference(Reference::Object(*r))),
            _ => Err(StyleError::parse(raw.to_string(), "object reference not allowed here")),
        },
    }
}

/// Parse without the CSS tokenizer.
///
/// Bare numbers and numeric strings map straight to pixels, degrees or plain
/// numbers; keywords are taken literally; colors, text, references, number
/// lists and path data are handled directly. Transforms, positions and any
/// value using `calc()` or non-pixel units fall back to [`parse`].
pub fn parse_fast(raw: &RawValue, syntax: Syntax) -> Result<ParsedValue, StyleError> {
    let RawValue::Str(s) = raw else {
        return parse(raw, syntax);
    };
    let t = s.trim();
    if let Some(wide) = CssWide::from_ident(t) {
        return Ok(ParsedValue::keyword(wide.as_str()));
    }
    let fast = match syntax {
        Syntax::Length
        | Syntax::LengthPercentage
        | Syntax::Number
        | Syntax::NumberPercentage
        | Syntax::Integer
        | Syntax::Angle
        | Syntax::Time => t
            .strip_suffix("px")
            .filter(|_| matches!(syntax, Syntax::Length | Syntax::LengthPercentage))
            .unwrap_or(t)
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(|n| from_number(n, syntax)),
        Syntax::Keyword(_) => Some(Ok(ParsedValue::keyword(t))),
        Syntax::Text | Syntax::Color | Syntax::Paint | Syntax::PathData | Syntax::Reference => {
            Some(parse_str(s, syntax))
        }
        Syntax::NumberList | Syntax::Points => split_numbers(t).map(|nums| numbers_to(&nums, syntax, t)),
        Syntax::Transform | Syntax::Position => None,
    };
    fast.unwrap_or_else(|| {
        log::trace!(target: "glint_style", "fast path defers `{t}` ({syntax:?}) to the CSS parser");
        parse_str(s, syntax)
    })
}

fn split_numbers(t: &str) -> Option<Vec<f64>> {
    t.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<f64>().ok().filter(|n| n.is_finite()))
        .collect()
}

fn numbers_to(nums: &[f64], syntax: Syntax, input: &str) -> Result<ParsedValue, StyleError> {
    if nums.iter().any(|n| !n.is_finite()) {
        return Err(StyleError::parse(input, "numbers must be finite"));
    }
    match syntax {
        Syntax::Points => {
            if nums.len() % 2 != 0 {
                return Err(StyleError::parse(input, "points need an even number of coordinates"));
            }
            Ok(points_value(nums.chunks_exact(2).map(|c| (c[0], c[1]))))
        }
        _ => Ok(ParsedValue::List(
            nums.iter()
                .map(|n| ParsedValue::Numeric(CssNumeric::px(*n)))
                .collect(),
            ListSeparator::Space,
        )),
    }
}

fn points_value(points: impl Iterator<Item = (f64, f64)>) -> ParsedValue {
    ParsedValue::List(
        points
            .map(|(x, y)| {
                ParsedValue::List(
                    vec![
                        ParsedValue::Numeric(CssNumeric::number(x)),
                        ParsedValue::Numeric(CssNumeric::number(y)),
                    ],
                    ListSeparator::Comma,
                )
            })
            .collect(),
        ListSeparator::Space,
    )
}

fn from_number(n: f64, syntax: Syntax) -> Result<ParsedValue, StyleError> {
    if !n.is_finite() {
        return Err(StyleError::parse(n.to_string(), "numbers must be finite"));
    }
    let numeric = |unit| Ok(ParsedValue::Numeric(CssNumeric::new(n, unit)));
    match syntax {
        Syntax::Length | Syntax::LengthPercentage => numeric(Unit::Px),
        Syntax::Number | Syntax::NumberPercentage => numeric(Unit::Number),
        Syntax::Integer if n.fract() == 0.0 => numeric(Unit::Number),
        Syntax::Angle => numeric(Unit::Deg),
        Syntax::Time => numeric(Unit::Ms),
        Syntax::Text => Ok(ParsedValue::String(n.to_string())),
        Syntax::NumberList => Ok(ParsedValue::List(
            vec![ParsedValue::Numeric(CssNumeric::px(n))],
            ListSeparator::Space,
        )),
        _ => Err(StyleError::parse(n.to_string(), "a bare number is not allowed here")),
    }
}

fn from_list(items: &[RawValue], syntax: Syntax) -> Result<ParsedValue, StyleError> {
    let input = RawValue::List(items.to_vec()).to_string();
    match syntax {
        Syntax::NumberList | Syntax::Points => {
            let mut nums = Vec::with_capacity(items.len() * 2);
            for item in items {
                match item {
                    RawValue::Number(n) => nums.push(*n),
                    RawValue::List(pair) if syntax == Syntax::Points => {
                        let [RawValue::Number(x), RawValue::Number(y)] = pair.as_slice() else {
                            return Err(StyleError::parse(input, "each point needs two numbers"));
                        };
                        nums.extend([*x, *y]);
                    }
                    RawValue::Str(s) => {
                        nums.extend(split_numbers(s).ok_or_else(|| {
                            StyleError::parse(input.clone(), "expected numbers")
                        })?);
                    }
                    _ => return Err(StyleError::parse(input, "expected numbers")),
                }
            }
            numbers_to(&nums, syntax, &input)
        }
        Syntax::Position => {
            let parsed = items
                .iter()
                .map(|item| match item {
                    RawValue::Number(n) => Ok(ParsedValue::Numeric(CssNumeric::px(*n))),
                    other => parse(other, Syntax::Position),
                })
                .collect::<Result<Vec<_>, _>>()?;
            let flat: Vec<ParsedValue> = parsed
                .into_iter()
                .flat_map(|p| match p {
                    ParsedValue::List(inner, _) => inner,
                    other => vec![other],
                })
                .collect();
            if flat.is_empty() || flat.len() > 2 {
                return Err(StyleError::parse(input, "a position has one or two components"));
            }
            Ok(ParsedValue::List(flat, ListSeparator::Space))
        }
        _ => Err(StyleError::parse(input, "a list is not allowed here")),
    }
}

fn parse_str(s: &str, syntax: Syntax) -> Result<ParsedValue, StyleError> {
    let t = s.trim();
    if let Some(wide) = CssWide::from_ident(t) {
        return Ok(ParsedValue::keyword(wide.as_str()));
    }
    match syntax {
        Syntax::Text => Ok(ParsedValue::String(s.to_owned())),
        Syntax::PathData if t.eq_ignore_ascii_case("none") => Ok(ParsedValue::keyword("none")),
        Syntax::PathData => BezPath::from_svg(t)
            .map(ParsedValue::Path)
            .map_err(|e| StyleError::parse(t, format!("invalid path data: {e:?}"))),
        Syntax::Color => parse_color(t).map(ParsedValue::Color),
        Syntax::Paint if t.eq_ignore_ascii_case("none") => Ok(ParsedValue::keyword("none")),
        Syntax::Paint if !is_reference(t) => parse_color(t).map(ParsedValue::Color),
        _ => with_css(t, |p| parse_with_syntax(p, syntax)),
    }
}

fn is_reference(t: &str) -> bool {
    let lower = t.get(..4).map(str::to_ascii_lowercase);
    matches!(lower.as_deref(), Some("url(" | "ref("))
}

fn parse_color(t: &str) -> Result<Rgba, StyleError> {
    let color: csscolorparser::Color = t
        .parse()
        .map_err(|e| StyleError::parse(t, format!("invalid color: {e}")))?;
    let [r, g, b, a] = color.to_rgba8();
    Ok(Rgba::new(r, g, b, a))
}

/// Run a cssparser-driven parse over the whole input.
fn with_css<T>(t: &str, f: impl for<'i, 'tt> FnOnce(&mut Parser<'i, 'tt>) -> PResult<'i, T>) -> Result<T, StyleError> {
    let mut input = ParserInput::new(t);
    let mut parser = Parser::new(&mut input);
    let result = parser.parse_entirely(f);
    result.map_err(|err| match err.kind {
        ParseErrorKind::Custom(Fail::Math(e)) => e,
        ParseErrorKind::Custom(Fail::Expected(what)) => StyleError::parse(t, format!("expected {what}")),
        ParseErrorKind::Basic(kind) => StyleError::parse(t, format!("{kind:?}")),
    })
}

fn parse_with_syntax<'i>(p: &mut Parser<'i, '_>, syntax: Syntax) -> PResult<'i, ParsedValue> {
    match syntax {
        Syntax::Length => typed_numeric(p, &[NumericType::Length], Unit::Px, false),
        Syntax::LengthPercentage => typed_numeric(
            p,
            &[NumericType::Length, NumericType::Percent],
            Unit::Px,
            true,
        ),
        Syntax::Number | Syntax::Integer => {
            let v = typed_numeric(p, &[NumericType::Number], Unit::Number, false)?;
            if syntax == Syntax::Integer
                && let ParsedValue::Numeric(CssNumeric::Unit(u)) = &v
                && u.value.fract() != 0.0
            {
                return Err(p.new_custom_error(Fail::Expected("an integer")));
            }
            Ok(v)
        }
        Syntax::NumberPercentage => typed_numeric(
            p,
            &[NumericType::Number, NumericType::Percent],
            Unit::Number,
            true,
        ),
        Syntax::Angle => typed_numeric(p, &[NumericType::Angle], Unit::Deg, false),
        Syntax::Time => typed_numeric(p, &[NumericType::Time], Unit::Ms, false),
        Syntax::Keyword(allowed) => {
            let ident = p.expect_ident()?.to_ascii_lowercase();
            if allowed.contains(&ident.as_str()) {
                Ok(ParsedValue::Keyword(ident))
            } else {
                Err(p.new_custom_error(Fail::Expected("a known keyword")))
            }
        }
        Syntax::Reference | Syntax::Paint => {
            if p.try_parse(|p| p.expect_ident_matching("none")).is_ok() {
                return Ok(ParsedValue::keyword("none"));
            }
            parse_reference(p).map(ParsedValue::Reference)
        }
        Syntax::Transform => {
            if p.try_parse(|p| p.expect_ident_matching("none")).is_ok() {
                return Ok(ParsedValue::keyword("none"));
            }
            let mut functions = vec![parse_transform_function(p)?];
            while !p.is_exhausted() {
                functions.push(parse_transform_function(p)?);
            }
            Ok(ParsedValue::List(functions, ListSeparator::Space))
        }
        Syntax::Position => {
            let mut parts = vec![parse_position_part(p)?];
            if !p.is_exhausted() {
                parts.push(parse_position_part(p)?);
            }
            Ok(ParsedValue::List(parts, ListSeparator::Space))
        }
        Syntax::NumberList => {
            if p.try_parse(|p| p.expect_ident_matching("none")).is_ok() {
                return Ok(ParsedValue::keyword("none"));
            }
            let mut items = Vec::new();
            while !p.is_exhausted() {
                items.push(typed_numeric(p, &[NumericType::Length], Unit::Px, false)?);
                let _ = p.try_parse(|p| p.expect_comma());
            }
            Ok(ParsedValue::List(items, ListSeparator::Space))
        }
        Syntax::Points => {
            if p.try_parse(|p| p.expect_ident_matching("none")).is_ok() {
                return Ok(ParsedValue::keyword("none"));
            }
            let mut coords = Vec::new();
            while !p.is_exhausted() {
                coords.push(exact_number(p)?);
                let _ = p.try_parse(|p| p.expect_comma());
            }
            if coords.len() % 2 != 0 {
                return Err(p.new_custom_error(Fail::Expected("pairs of coordinates")));
            }
            Ok(points_value(coords.chunks_exact(2).map(|c| (c[0], c[1]))))
        }
        // Handled before tokenizing.
        Syntax::Text | Syntax::Color | Syntax::PathData => {
            Err(p.new_custom_error(Fail::Expected("a tokenizable syntax")))
        }
    }
}

/// Parse a numeric value and check its type. Bare numbers become `bare_unit`.
fn typed_numeric<'i>(
    p: &mut Parser<'i, '_>,
    allowed: &[NumericType],
    bare_unit: Unit,
    allow_percent: bool,
) -> PResult<'i, ParsedValue> {
    let mut value = parse_sum(p)?;
    if let CssNumeric::Unit(u) = &mut value
        && u.unit == Unit::Number
    {
        u.unit = bare_unit;
    }
    let ty = value
        .numeric_type()
        .map_err(|e| p.new_custom_error(Fail::Math(e)))?;
    if !allowed.contains(&ty) || (!allow_percent && value.has_percent()) {
        return Err(p.new_custom_error(Fail::Expected("a value of the right type")));
    }
    Ok(ParsedValue::Numeric(value))
}

/// A plain number, read from source text at full precision.
fn exact_number<'i>(p: &mut Parser<'i, '_>) -> PResult<'i, f64> {
    match parse_leaf(p)? {
        CssNumeric::Unit(u) if u.unit == Unit::Number => Ok(u.value),
        _ => Err(p.new_custom_error(Fail::Expected("a number"))),
    }
}

fn parse_sum<'i>(p: &mut Parser<'i, '_>) -> PResult<'i, CssNumeric> {
    let mut acc = parse_product(p)?;
    loop {
        let op = p.try_parse(|p| -> PResult<'i, bool> {
            let location = p.current_source_location();
            match p.next()? {
                Token::Delim('+') => Ok(false),
                Token::Delim('-') => Ok(true),
                _ => Err(location.new_custom_error(Fail::Expected("`+` or `-`"))),
            }
        });
        let Ok(negative) = op else {
            return Ok(acc);
        };
        let rhs = parse_product(p)?;
        let combined = if negative { acc.sub(rhs) } else { acc.add(rhs) };
        let combined = combined.map_err(|e| p.new_custom_error(Fail::Math(e)))?;
        acc = finite(p, combined)?;
    }
}

fn parse_product<'i>(p: &mut Parser<'i, '_>) -> PResult<'i, CssNumeric> {
    let mut acc = parse_leaf(p)?;
    loop {
        let op = p.try_parse(|p| -> PResult<'i, bool> {
            let location = p.current_source_location();
            match p.next()? {
                Token::Delim('*') => Ok(false),
                Token::Delim('/') => Ok(true),
                _ => Err(location.new_custom_error(Fail::Expected("`*` or `/`"))),
            }
        });
        let Ok(divide) = op else {
            return Ok(acc);
        };
        let rhs = parse_leaf(p)?;
        let combined = if divide { acc.div(rhs) } else { acc.mul(rhs) };
        let combined = combined.map_err(|e| p.new_custom_error(Fail::Math(e)))?;
        acc = finite(p, combined)?;
    }
}

/// Text of a numeric token read back as `f64`; the tokenizer only keeps `f32`.
///
/// `None` when the value overflows to infinity.
fn exact(text: &str, fallback: f32) -> Option<f64> {
    Some(text.parse::<f64>().unwrap_or(f64::from(fallback))).filter(|n| n.is_finite())
}

/// Reject arithmetic that folded to a non-finite value (`calc(1px / 0)`, overflow).
fn finite<'i>(p: &Parser<'i, '_>, value: CssNumeric) -> PResult<'i, CssNumeric> {
    match value.as_unit() {
        Some(u) if !u.value.is_finite() => Err(p.new_custom_error(Fail::Expected("a finite number"))),
        _ => Ok(value),
    }
}

fn parse_leaf<'i>(p: &mut Parser<'i, '_>) -> PResult<'i, CssNumeric> {
    p.skip_whitespace();
    let start = p.position();
    let location = p.current_source_location();
    let token = p.next()?.clone();
    let text = p.slice_from(start);
    let overflow = || -> ParseError<'i, Fail> { location.new_custom_error(Fail::Expected("a finite number")) };
    match token {
        Token::Number { value, .. } => Ok(CssNumeric::number(exact(text, value).ok_or_else(overflow)?)),
        Token::Percentage { unit_value, .. } => Ok(CssNumeric::new(
            exact(text.trim_end_matches('%'), unit_value * 100.0).ok_or_else(overflow)?,
            Unit::Percent,
        )),
        Token::Dimension {
            value, ref unit, ..
        } => {
            let Some(u) = Unit::from_css(unit).filter(|u| *u != Unit::Number && *u != Unit::Percent) else {
                return Err(location.new_custom_error(Fail::Expected("a known unit")));
            };
            let digits = text
                .len()
                .checked_sub(unit.len())
                .and_then(|end| text.get(..end))
                .unwrap_or_default();
            Ok(CssNumeric::new(exact(digits, value).ok_or_else(overflow)?, u))
        }
        Token::Function(ref name) => {
            let name = name.to_ascii_lowercase();
            p.parse_nested_block(|p| match name.as_str() {
                "calc" => parse_sum(p),
                "min" | "max" => {
                    let args = p.parse_comma_separated(parse_sum)?;
                    let folded = if name == "min" {
                        CssNumeric::min(args)
                    } else {
                        CssNumeric::max(args)
                    };
                    folded.map_err(|e| p.new_custom_error(Fail::Math(e)))
                }
                "clamp" => {
                    let lo = parse_sum(p)?;
                    p.expect_comma()?;
                    let v = parse_sum(p)?;
                    p.expect_comma()?;
                    let hi = parse_sum(p)?;
                    CssNumeric::clamp(lo, v, hi).map_err(|e| p.new_custom_error(Fail::Math(e)))
                }
                _ => Err(p.new_custom_error(Fail::Expected("a math function"))),
            })
        }
        Token::ParenthesisBlock => p.parse_nested_block(parse_sum),
        other => Err(location.new_unexpected_token_error(other)),
    }
}

fn parse_reference<'i>(p: &mut Parser<'i, '_>) -> PResult<'i, Reference> {
    let location = p.current_source_location();
    let token = p.next()?.clone();
    match token {
        Token::UnquotedUrl(ref url) => fragment(url).ok_or_else(|| location.new_custom_error(Fail::Expected("`#id`"))),
        Token::Function(ref name) if name.eq_ignore_ascii_case("url") => p.parse_nested_block(|p| {
            let url = p.expect_string()?.to_string();
            fragment(&url).ok_or_else(|| p.new_custom_error(Fail::Expected("`#id`")))
        }),
        Token::Function(ref name) if name.eq_ignore_ascii_case("ref") => p.parse_nested_block(|p| {
            let n = exact_number(p)?;
            if n < 0.0 || n.fract() != 0.0 || n > u64::MAX as f64 {
                return Err(p.new_custom_error(Fail::Expected("an object handle")));
            }
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "Checked to be a non-negative integer in range above."
            )]
            let handle = n as u64;
            Ok(Reference::Object(ObjectRef(handle)))
        }),
        other => Err(location.new_unexpected_token_error(other)),
    }
}

fn fragment(url: &str) -> Option<Reference> {
    url.strip_prefix('#')
        .filter(|id| !id.is_empty())
        .map(|id| Reference::Id(id.to_owned()))
}

fn parse_transform_function<'i>(p: &mut Parser<'i, '_>) -> PResult<'i, ParsedValue> {
    let name = p.expect_function()?.to_ascii_lowercase();
    let (kinds, min, max): (&[NumericType], usize, usize) = match name.as_str() {
        "translate" => (&[NumericType::Length, NumericType::Percent], 1, 2),
        "translatex" | "translatey" => (&[NumericType::Length, NumericType::Percent], 1, 1),
        "scale" => (&[NumericType::Number], 1, 2),
        "scalex" | "scaley" => (&[NumericType::Number], 1, 1),
        "rotate" => (&[NumericType::Angle], 1, 1),
        "skew" => (&[NumericType::Angle], 1, 2),
        "skewx" | "skewy" => (&[NumericType::Angle], 1, 1),
        "matrix" => (&[NumericType::Number], 6, 6),
        _ => return Err(p.new_custom_error(Fail::Expected("a transform function"))),
    };
    let bare = match kinds[0] {
        NumericType::Length => Unit::Px,
        NumericType::Angle => Unit::Deg,
        _ => Unit::Number,
    };
    let args = p.parse_nested_block(|p| {
        p.parse_comma_separated(|p| match typed_numeric(p, kinds, bare, true)? {
            ParsedValue::Numeric(n) => Ok(n),
            _ => Err(p.new_custom_error(Fail::Expected("a number"))),
        })
    })?;
    if args.len() < min || args.len() > max {
        return Err(p.new_custom_error(Fail::Expected("a valid argument count")));
    }
    Ok(ParsedValue::Function { name, args })
}

const POSITION_KEYWORDS: &[&str] = &["left", "center", "right", "top", "bottom"];

fn parse_position_part<'i>(p: &mut Parser<'i, '_>) -> PResult<'i, ParsedValue> {
    if let Ok(ident) = p.try_parse(|p| -> PResult<'i, String> { Ok(p.expect_ident()?.to_ascii_lowercase()) }) {
        return if POSITION_KEYWORDS.contains(&ident.as_str()) {
            Ok(ParsedValue::Keyword(ident))
        } else {
            Err(p.new_custom_error(Fail::Expected("a position keyword")))
        };
    }
    typed_numeric(p, &[NumericType::Length, NumericType::Percent], Unit::Px, true)
}
