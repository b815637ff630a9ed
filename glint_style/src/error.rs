// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors produced while parsing and combining style values.

use core::fmt;

use crate::unit::Unit;

/// Error type for the style value model.
#[derive(Clone, Debug, PartialEq)]
pub enum StyleError {
    /// The raw value does not match the property's grammar.
    Parse {
        /// The offending input, as text.
        input: String,
        /// What the parser expected or tripped over.
        reason: String,
    },
    /// Arithmetic or conversion across incompatible unit families.
    UnitMismatch {
        /// Left operand (or source) unit.
        lhs: Unit,
        /// Right operand (or target) unit.
        rhs: Unit,
    },
    /// No descriptor is registered under this name.
    UnknownProperty(String),
    /// Interpolation was requested for a property that is not animatable.
    NotAnimatable(String),
}

impl StyleError {
    pub(crate) fn parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for StyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { input, reason } => write!(f, "cannot parse `{input}`: {reason}"),
            Self::UnitMismatch { lhs, rhs } => {
                write!(f, "incompatible units `{}` and `{}`", lhs.suffix_or_number(), rhs.suffix_or_number())
            }
            Self::UnknownProperty(name) => write!(f, "unknown property `{name}`"),
            Self::NotAnimatable(name) => write!(f, "property `{name}` is not animatable"),
        }
    }
}

impl core::error::Error for StyleError {}
