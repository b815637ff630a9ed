// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw attribute values and typed parsed values.

use core::fmt;

use kurbo::BezPath;

use crate::numeric::CssNumeric;

/// Opaque handle to another object in the host scene.
///
/// The style layer never dereferences it; the scene maps it back to a node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(pub u64);

/// An attribute value as handed over by the caller, before any parsing.
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    /// Text, parsed according to the property's syntax.
    Str(String),
    /// A bare number. Lengths read it as pixels, angles as degrees.
    Number(f64),
    /// A list of values (points, dash arrays, positions).
    List(Vec<RawValue>),
    /// A direct reference to another object.
    Ref(ObjectRef),
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for RawValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<ObjectRef> for RawValue {
    fn from(r: ObjectRef) -> Self {
        Self::Ref(r)
    }
}

impl<T: Into<Self>> From<Vec<T>> for RawValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Ref(r) => write!(f, "ref({})", r.0),
        }
    }
}

/// 8-bit RGBA color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Rgba {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Create a color from channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Whether the color is fully transparent.
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

/// Target of a reference-valued property.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reference {
    /// `url(#id)`: looked up by the node's `id` attribute.
    Id(String),
    /// A direct object handle.
    Object(ObjectRef),
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "url(#{id})"),
            Self::Object(r) => write!(f, "ref({})", r.0),
        }
    }
}

/// Separator used when serializing a list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ListSeparator {
    /// `a b c`
    Space,
    /// `a,b,c`
    Comma,
}

/// The CSS-wide keywords accepted by every property.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CssWide {
    /// Take the parent's value.
    Inherit,
    /// Take the property's initial value.
    Initial,
    /// `inherit` for inherited properties, `initial` otherwise.
    Unset,
}

impl CssWide {
    /// Match a keyword, case-insensitively.
    pub fn from_ident(ident: &str) -> Option<Self> {
        if ident.eq_ignore_ascii_case("inherit") {
            Some(Self::Inherit)
        } else if ident.eq_ignore_ascii_case("initial") {
            Some(Self::Initial)
        } else if ident.eq_ignore_ascii_case("unset") {
            Some(Self::Unset)
        } else {
            None
        }
    }

    /// Canonical spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inherit => "inherit",
            Self::Initial => "initial",
            Self::Unset => "unset",
        }
    }
}

/// A typed style value.
///
/// Every variant serializes to canonical CSS text through `Display`, and
/// parsing that text with the same syntax yields an equal value.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedValue {
    /// An identifier such as `none`, `round` or `inherit`.
    Keyword(String),
    /// A number with a unit, or a `calc()` expression.
    Numeric(CssNumeric),
    /// A color.
    Color(Rgba),
    /// A list of values.
    List(Vec<ParsedValue>, ListSeparator),
    /// A reference to another node.
    Reference(Reference),
    /// Free text.
    String(String),
    /// A function with numeric arguments, e.g. `rotate(45deg)`.
    Function {
        /// Lowercase function name.
        name: String,
        /// Arguments in order.
        args: Vec<CssNumeric>,
    },
    /// SVG path data.
    Path(BezPath),
}

impl ParsedValue {
    /// Keyword shorthand.
    pub fn keyword(k: &str) -> Self {
        Self::Keyword(k.to_owned())
    }

    /// The CSS-wide keyword this value spells, if any.
    pub fn css_wide(&self) -> Option<CssWide> {
        match self {
            Self::Keyword(k) => CssWide::from_ident(k),
            _ => None,
        }
    }

    /// The identifier, if this is a keyword.
    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            Self::Keyword(k) => Some(k),
            _ => None,
        }
    }

    /// Whether this is the `none` keyword.
    pub fn is_none(&self) -> bool {
        self.as_keyword() == Some("none")
    }

    /// The numeric value, if any.
    pub fn as_numeric(&self) -> Option<&CssNumeric> {
        match self {
            Self::Numeric(n) => Some(n),
            _ => None,
        }
    }

    /// The color, if any.
    pub fn as_color(&self) -> Option<Rgba> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// List items, if this is a list.
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items, _) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for ParsedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(k) => f.write_str(k),
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Color(c) => write!(f, "{c}"),
            Self::List(items, sep) => {
                let sep = match sep {
                    ListSeparator::Space => " ",
                    ListSeparator::Comma => ",",
                };
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Reference(r) => write!(f, "{r}"),
            Self::String(s) => f.write_str(s),
            Self::Function { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Self::Path(p) => f.write_str(&p.to_svg()),
        }
    }
}
