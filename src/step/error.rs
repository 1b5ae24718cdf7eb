// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors of step definitions registration, lookup and execution.

use std::{error::Error as StdError, fmt};

use derive_more::{Display, Error};

use super::{location::Location, pattern::StepPattern};

/// Error of compiling a [`StepPattern`].
#[derive(Debug, Display, Error)]
pub enum PatternError {
    /// Malformed [Cucumber Expression][1].
    ///
    /// [1]: https://github.com/cucumber/cucumber-expressions
    #[display("Invalid cucumber expression `{expression}`: {message}")]
    Expression {
        /// Source of the malformed expression.
        #[error(not(source))]
        expression: String,

        /// Message of the underlying parser.
        message: String,
    },

    /// Parameter type with no conversion into an [`Arg`].
    ///
    /// [`Arg`]: super::Arg
    #[display("Unknown parameter type `{{{name}}}` in `{expression}`")]
    UnknownParameter {
        /// Source of the expression.
        #[error(not(source))]
        expression: String,

        /// Name of the parameter type.
        name: String,
    },
}

/// Error of step text matching multiple step definitions in a
/// [`Collection`] with [`MatchPolicy::RejectAmbiguous`].
///
/// [`Collection`]: super::Collection
/// [`MatchPolicy::RejectAmbiguous`]: super::MatchPolicy::RejectAmbiguous
#[derive(Clone, Debug, Error)]
pub struct AmbiguousMatchError {
    /// Step text which is ambiguous.
    #[error(not(source))]
    pub text: String,

    /// [`StepPattern`]s matching the step text, in registration order.
    pub possible_matches: Vec<(StepPattern, Location)>,
}

impl fmt::Display for AmbiguousMatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step `{}` is ambiguous, possible matches:", self.text)?;
        for (pattern, loc) in &self.possible_matches {
            write!(f, "\n{pattern} --> {loc}")?;
        }
        Ok(())
    }
}

/// Error of executing step text against a [`Collection`].
///
/// [`Collection`]: super::Collection
#[derive(Debug)]
pub enum StepError {
    /// No step definition matches the step text.
    Undefined {
        /// Step text which is undefined.
        text: String,
    },

    /// Several step definitions match the step text.
    Ambiguous(AmbiguousMatchError),

    /// Step handler returned an error.
    Failed {
        /// Step text which failed.
        text: String,

        /// Error returned by the handler.
        error: anyhow::Error,
    },
}

impl StepError {
    /// Returns the step text this [`StepError`] relates to.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Undefined { text } | Self::Failed { text, .. } => text,
            Self::Ambiguous(e) => &e.text,
        }
    }
}

// The handler's error is displayed as is, so it reaches the executor
// unchanged.
impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined { text } => {
                write!(f, "No step definition matches `{text}`")
            }
            Self::Ambiguous(e) => write!(f, "{e}"),
            Self::Failed { error, .. } => write!(f, "{error}"),
        }
    }
}

// Implemented manually, as `anyhow::Error` doesn't implement `Error`.
impl StdError for StepError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Undefined { .. } => None,
            Self::Ambiguous(e) => Some(e),
            Self::Failed { error, .. } => error.source(),
        }
    }
}

impl From<AmbiguousMatchError> for StepError {
    fn from(e: AmbiguousMatchError) -> Self {
        Self::Ambiguous(e)
    }
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;

    #[test]
    fn ambiguity_lists_every_candidate() {
        let err = AmbiguousMatchError {
            text: "I have 5 cucumbers".into(),
            possible_matches: vec![
                (
                    StepPattern::from("I have {int} cucumbers"),
                    Location::new("tests/steps.rs", 10, 5),
                ),
                (
                    StepPattern::from(Regex::new(r"I have \d+").unwrap()),
                    Location::new("tests/steps.rs", 20, 5),
                ),
            ],
        };

        assert_eq!(
            err.to_string(),
            "Step `I have 5 cucumbers` is ambiguous, possible matches:\n\
             I have {int} cucumbers --> tests/steps.rs:10:5\n\
             /I have \\d+/ --> tests/steps.rs:20:5",
        );
    }

    #[test]
    fn failure_displays_handler_error_unchanged() {
        let err = StepError::Failed {
            text: "boom".into(),
            error: anyhow::anyhow!("expected 3, got 4"),
        };

        assert_eq!(err.to_string(), "expected 3, got 4");
        assert_eq!(err.text(), "boom");
    }
}
