// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glint Style: typed CSS-like values for a 2D scene graph.
//!
//! - [`RawValue`]: what callers hand to `set_attribute` (text, numbers, lists, object handles).
//! - [`ParsedValue`]: the typed form, produced by [`parse`] according to a property [`Syntax`].
//! - [`CssNumeric`]: numbers with units and symbolic `calc()` trees, with fallible algebra.
//! - [`PropertyDescriptor`]: static per-property metadata, looked up with [`builtin`].
//!
//! Every parsed value prints back as canonical CSS text, and parsing that text
//! again yields an equal value.
//!
//! ```
//! use glint_style::{parse, CssNumeric, RawValue, ResolveContext, Syntax, Unit};
//!
//! let width = parse(&RawValue::from("calc(50% + 2em)"), Syntax::LengthPercentage).unwrap();
//! let numeric = width.as_numeric().unwrap();
//! assert!(!numeric.is_concrete());
//!
//! let ctx = ResolveContext { percent_base: Some(300.0), font_size: 10.0, ..Default::default() };
//! assert_eq!(numeric.resolve(&ctx), 170.0);
//!
//! // Convertible units fold immediately.
//! let t = CssNumeric::new(1.0, Unit::S).add(CssNumeric::new(500.0, Unit::Ms)).unwrap();
//! assert_eq!(t.to_string(), "1.5s");
//!
//! // Incompatible ones do not combine.
//! assert!(CssNumeric::px(1.0).add(CssNumeric::new(1.0, Unit::Deg)).is_err());
//! ```

mod error;
mod interpolate;
mod numeric;
mod parse;
mod property;
mod unit;
mod value;

pub use error::StyleError;
pub use interpolate::interpolate;
pub use numeric::{CssNumeric, MathExpr, NumericType, ResolveContext};
pub use parse::{Syntax, parse, parse_fast};
pub use property::{Affects, BUILTIN_PROPERTIES, PercentBase, PropertyDescriptor, builtin};
pub use unit::{Unit, UnitFamily, UnitValue};
pub use value::{CssWide, ListSeparator, ObjectRef, ParsedValue, RawValue, Reference, Rgba};
