// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Arguments and context passed to step handlers.

use std::fmt;

use crate::data_table::DataTable;

/// Typed value extracted from step text by a step pattern.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    /// `{int}` parameter.
    Int(i64),

    /// `{float}` parameter.
    Float(f64),

    /// `{word}` parameter.
    Word(String),

    /// `{string}` parameter, with quotes stripped and escaped quotes
    /// unescaped.
    Str(String),

    /// `{}` anonymous parameter.
    Anonymous(String),

    /// Capture group of a regular expression pattern, [`None`] if the group
    /// didn't participate in the match.
    Capture(Option<String>),
}

impl Arg {
    /// Returns the integer value of an [`Arg::Int`].
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        if let Self::Int(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    /// Returns the numeric value of an [`Arg::Float`] or an [`Arg::Int`].
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => Some(*i as f64),
            Self::Word(_)
            | Self::Str(_)
            | Self::Anonymous(_)
            | Self::Capture(_) => None,
        }
    }

    /// Returns the textual value of this [`Arg`], if it has one.
    ///
    /// Numbers have no textual value, use [`Arg::to_string()`] for them.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Word(s) | Self::Str(s) | Self::Anonymous(s) => Some(s),
            Self::Capture(c) => c.as_deref(),
            Self::Int(_) | Self::Float(_) => None,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Word(s) | Self::Str(s) | Self::Anonymous(s) => {
                f.write_str(s)
            }
            Self::Capture(c) => f.write_str(c.as_deref().unwrap_or_default()),
        }
    }
}

/// Context of a step handler invocation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Context {
    /// Resolved text of the executed step.
    pub text: String,

    /// Arguments extracted from the [`Context::text`], in pattern order.
    pub args: Vec<Arg>,

    /// [`DataTable`] attached to the step, if any.
    pub table: Option<DataTable>,

    /// Doc string attached to the step, if any.
    pub docstring: Option<String>,
}

impl Context {
    /// Returns the `n`th argument.
    #[must_use]
    pub fn arg(&self, n: usize) -> Option<&Arg> {
        self.args.get(n)
    }

    /// Returns the `n`th argument as an integer.
    ///
    /// # Errors
    ///
    /// If there is no such argument, or it's not an [`Arg::Int`].
    pub fn int(&self, n: usize) -> anyhow::Result<i64> {
        self.arg(n)
            .and_then(Arg::as_int)
            .ok_or_else(|| {
                anyhow::anyhow!("no integer argument #{n} in `{}`", self.text)
            })
    }

    /// Returns the `n`th argument as text.
    ///
    /// # Errors
    ///
    /// If there is no such argument, or it has no textual value.
    pub fn str(&self, n: usize) -> anyhow::Result<&str> {
        self.arg(n)
            .and_then(Arg::as_str)
            .ok_or_else(|| {
                anyhow::anyhow!("no text argument #{n} in `{}`", self.text)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_numbers() {
        assert_eq!(Arg::Int(3).as_int(), Some(3));
        assert_eq!(Arg::Int(3).as_float(), Some(3.0));
        assert_eq!(Arg::Float(1.5).as_float(), Some(1.5));
        assert_eq!(Arg::Float(1.5).as_int(), None);
        assert_eq!(Arg::Word("x".into()).as_float(), None);
    }

    #[test]
    fn unmatched_capture_has_no_text() {
        assert_eq!(Arg::Capture(None).as_str(), None);
        assert_eq!(Arg::Capture(None).to_string(), "");
        assert_eq!(Arg::Capture(Some("a".into())).as_str(), Some("a"));
    }

    #[test]
    fn accessors_report_missing_arguments() {
        let ctx = Context {
            text: "I have 5 cucumbers".into(),
            args: vec![Arg::Int(5)],
            ..Context::default()
        };

        assert_eq!(ctx.int(0).unwrap(), 5);
        assert!(ctx.int(1).is_err());
        assert!(ctx.str(0).unwrap_err().to_string().contains("#0"));
    }
}
