// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step patterns and their compilation into [`Matcher`]s.

use std::fmt;

use cucumber_expressions::Expression;
use lazy_regex::regex;
use regex::Regex;

use super::{context::Arg, error::PatternError, regex::HashableRegex};

/// Pattern a step definition is registered with.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum StepPattern {
    /// [Cucumber Expression][1], e.g. `I have {int} cucumbers`.
    ///
    /// [1]: https://github.com/cucumber/cucumber-expressions
    Expression(String),

    /// Regular expression, used as is (not anchored implicitly).
    Regex(HashableRegex),
}

impl StepPattern {
    /// Returns the source text of this [`StepPattern`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Expression(e) => e,
            Self::Regex(re) => re.as_str(),
        }
    }
}

impl From<&str> for StepPattern {
    fn from(expr: &str) -> Self {
        Self::Expression(expr.to_owned())
    }
}

impl From<String> for StepPattern {
    fn from(expr: String) -> Self {
        Self::Expression(expr)
    }
}

impl From<Regex> for StepPattern {
    fn from(re: Regex) -> Self {
        Self::Regex(re.into())
    }
}

impl fmt::Display for StepPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(e) => f.write_str(e),
            Self::Regex(re) => write!(f, "/{re}/"),
        }
    }
}

/// Built-in parameter type of a [Cucumber Expression][1].
///
/// [1]: https://github.com/cucumber/cucumber-expressions
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ParameterType {
    /// `{int}`, converted into an [`Arg::Int`].
    Int,

    /// `{float}`, converted into an [`Arg::Float`].
    Float,

    /// `{word}`, converted into an [`Arg::Word`].
    Word,

    /// `{string}`, converted into an [`Arg::Str`].
    String,

    /// `{}`, converted into an [`Arg::Anonymous`].
    Anonymous,
}

impl ParameterType {
    /// Looks up a [`ParameterType`] by the name used inside `{}`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "int" => Self::Int,
            "float" => Self::Float,
            "word" => Self::Word,
            "string" => Self::String,
            "" => Self::Anonymous,
            _ => return None,
        })
    }

    /// Name of this [`ParameterType`] used inside `{}`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Word => "word",
            Self::String => "string",
            Self::Anonymous => "",
        }
    }

    /// Converts the matched `raw` text into an [`Arg`].
    ///
    /// `quoted` tells whether a `{string}` still carries its quotes.
    fn convert(self, raw: &str, quoted: bool) -> Option<Arg> {
        Some(match self {
            Self::Int => Arg::Int(raw.parse().ok()?),
            Self::Float => Arg::Float(raw.parse().ok()?),
            Self::Word => Arg::Word(raw.to_owned()),
            Self::Anonymous => Arg::Anonymous(raw.to_owned()),
            Self::String => {
                let inner = if quoted { unquote(raw)? } else { raw };
                Arg::Str(inner.replace(r#"\""#, "\"").replace(r"\'", "'"))
            }
        })
    }
}

/// Strips matching surrounding quotes.
fn unquote(s: &str) -> Option<&str> {
    ['"', '\'']
        .into_iter()
        .find_map(|q| s.strip_prefix(q)?.strip_suffix(q))
}

/// Compiled [`StepPattern`] able to test step text and extract [`Arg`]s
/// from it.
#[derive(Clone, Debug)]
pub struct Matcher {
    /// [`Regex`] the [`StepPattern`] compiles into.
    regex: HashableRegex,

    /// Parameter types of an [`StepPattern::Expression`] in order, empty for
    /// a [`StepPattern::Regex`].
    parameters: Vec<ParameterType>,

    /// Whether [`Arg`]s are typed [`ParameterType`] conversions, rather than
    /// raw [`Arg::Capture`]s.
    typed: bool,
}

impl Matcher {
    /// Compiles the given [`StepPattern`].
    ///
    /// # Errors
    ///
    /// If the [`StepPattern::Expression`] is malformed or refers to an
    /// unsupported parameter type.
    pub fn compile(pattern: &StepPattern) -> Result<Self, PatternError> {
        match pattern {
            StepPattern::Regex(re) => Ok(Self {
                regex: re.clone(),
                parameters: Vec::new(),
                typed: false,
            }),
            StepPattern::Expression(expr) => {
                let regex = Expression::regex(expr.as_str()).map_err(|e| {
                    PatternError::Expression {
                        expression: expr.clone(),
                        message: e.to_string(),
                    }
                })?;
                let parameters = parameter_names(expr)
                    .map(|name| {
                        ParameterType::from_name(name).ok_or_else(|| {
                            PatternError::UnknownParameter {
                                expression: expr.clone(),
                                name: name.to_owned(),
                            }
                        })
                    })
                    .collect::<Result<_, _>>()?;
                Ok(Self { regex: regex.into(), parameters, typed: true })
            }
        }
    }

    /// Returns the [`Regex`] this [`Matcher`] uses.
    #[must_use]
    pub const fn regex(&self) -> &HashableRegex {
        &self.regex
    }

    /// Returns the [`ParameterType`]s of this [`Matcher`], in order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterType] {
        &self.parameters
    }

    /// Matches the given step `text`, extracting its [`Arg`]s.
    ///
    /// Returns [`None`] if the `text` doesn't match, or any of the captured
    /// values fails to convert to its [`ParameterType`].
    #[must_use]
    pub fn captures(&self, text: &str) -> Option<Vec<Arg>> {
        let caps = self.regex.captures(text)?;
        let groups = self
            .regex
            .capture_names()
            .enumerate()
            .skip(1)
            .map(|(i, name)| (name, caps.get(i).map(|m| m.as_str())));

        if !self.typed {
            return Some(
                groups
                    .map(|(_, v)| Arg::Capture(v.map(str::to_owned)))
                    .collect(),
            );
        }

        // `{string}` may expand either into a single group including quotes,
        // or into named `__{id}_{n}` alternatives holding the unquoted text.
        let mut whole = Vec::new();
        let mut slots: Vec<(Option<&str>, Option<&str>, bool)> = Vec::new();
        for (name, value) in groups {
            match name.and_then(|n| n.strip_prefix("__")) {
                Some(inner) => {
                    let id = inner.split('_').next();
                    let same = matches!(
                        slots.last(),
                        Some((Some(prev), _, false)) if Some(*prev) == id,
                    );
                    if let (true, Some(last)) = (same, slots.last_mut()) {
                        last.1 = last.1.or(value);
                    } else {
                        slots.push((id, value, false));
                    }
                }
                None => {
                    whole.push(value);
                    slots.push((None, value, true));
                }
            }
        }

        let values = if whole.len() == self.parameters.len() {
            whole.into_iter().map(|v| (v, true)).collect::<Vec<_>>()
        } else {
            slots.into_iter().map(|(_, v, quoted)| (v, quoted)).collect()
        };
        if values.len() != self.parameters.len() {
            return None;
        }

        self.parameters
            .iter()
            .zip(values)
            .map(|(ty, (v, quoted))| ty.convert(v?, quoted))
            .collect()
    }
}

/// Iterates over names of the parameters inside the given Cucumber
/// Expression, skipping escaped braces.
fn parameter_names(expr: &str) -> impl Iterator<Item = &str> {
    regex!(r"\\.|\{([^{}]*)\}")
        .captures_iter(expr)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
}
