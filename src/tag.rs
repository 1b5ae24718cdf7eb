// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tag expressions evaluation and hierarchical [`TagFilter`]ing.

use std::{fmt, str::FromStr};

use derive_more::{Display, Error};
use gherkin::tagexpr::TagOperation;
use sealed::sealed;

/// Extension of a [`TagOperation`] allowing to evaluate it.
#[sealed]
pub trait Ext {
    /// Evaluates this [`TagOperation`] for the given `tags`.
    ///
    /// Leading `@` is insignificant on both sides, so `@smoke` and `smoke`
    /// denote the same tag.
    #[must_use]
    fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone;
}

#[sealed]
impl Ext for TagOperation {
    fn eval<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        match self {
            Self::And(l, r) => l.eval(tags.clone()) & r.eval(tags),
            Self::Or(l, r) => l.eval(tags.clone()) | r.eval(tags),
            Self::Not(t) => !t.eval(tags),
            Self::Tag(t) => {
                let t = bare(t);
                tags.into_iter().any(|tag| bare(tag.as_ref()) == t)
            }
        }
    }
}

/// Strips the optional `@` sigil of a tag.
fn bare(tag: &str) -> &str {
    tag.strip_prefix('@').unwrap_or(tag)
}

/// Collects the tags a [`gherkin::Scenario`] (and optionally one of its
/// [`gherkin::Examples`]) inherits, in `Feature` -> `Rule` -> `Scenario` ->
/// `Examples` order.
///
/// Duplicates are kept as is, they are harmless for evaluation.
#[must_use]
pub fn inherited_tags(
    feature: &gherkin::Feature,
    rule: Option<&gherkin::Rule>,
    scenario: &gherkin::Scenario,
    examples: Option<&gherkin::Examples>,
) -> Vec<String> {
    feature
        .tags
        .iter()
        .chain(rule.iter().flat_map(|r| &r.tags))
        .chain(&scenario.tags)
        .chain(examples.iter().flat_map(|e| &e.tags))
        .cloned()
        .collect()
}

/// Error of parsing a malformed tag expression.
#[derive(Clone, Debug, Display, Error)]
#[display("Failed to parse tag expression `{expression}`: {message}")]
pub struct TagFilterError {
    /// Tag expression which failed to parse.
    #[error(not(source))]
    pub expression: String,

    /// Message of the underlying parser.
    pub message: String,
}

/// Compiled boolean tag expression deciding what is included into a run.
///
/// Immutable once constructed, so may be freely shared between concurrently
/// executed [`Scenario`]s.
///
/// [`Scenario`]: gherkin::Scenario
#[derive(Clone, Debug)]
pub struct TagFilter {
    /// Source text of the expression.
    expression: String,

    /// Compiled expression.
    op: TagOperation,
}

impl TagFilter {
    /// Compiles the given tag `expression`.
    ///
    /// # Errors
    ///
    /// If the `expression` isn't a valid tag expression.
    pub fn new(expression: impl Into<String>) -> Result<Self, TagFilterError> {
        let expression = expression.into();
        let op = expression.parse::<TagOperation>().map_err(|e| {
            TagFilterError {
                message: e.to_string(),
                expression: expression.clone(),
            }
        })?;
        Ok(Self { expression, op })
    }

    /// Returns the source text of this [`TagFilter`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// Evaluates this [`TagFilter`] against the given `tags`.
    #[must_use]
    pub fn evaluate<I, S>(&self, tags: I) -> bool
    where
        S: AsRef<str>,
        I: IntoIterator<Item = S> + Clone,
    {
        self.op.eval(tags)
    }

    /// Checks whether the given [`gherkin::Scenario`] matches, considering
    /// the tags of its [`gherkin::Feature`] and [`gherkin::Rule`] (if any).
    #[must_use]
    pub fn matches_scenario(
        &self,
        feature: &gherkin::Feature,
        rule: Option<&gherkin::Rule>,
        scenario: &gherkin::Scenario,
    ) -> bool {
        // The order `Feature` -> `Rule` -> `Scenario` matters here.
        self.evaluate(
            feature
                .tags
                .iter()
                .chain(rule.iter().flat_map(|r| &r.tags))
                .chain(&scenario.tags),
        )
    }

    /// Checks whether the whole [`gherkin::Examples`] block matches,
    /// considering the tags of all its ancestors.
    ///
    /// Filtering granularity is per block: rows carry no tags.
    #[must_use]
    pub fn matches_examples(
        &self,
        feature: &gherkin::Feature,
        rule: Option<&gherkin::Rule>,
        scenario: &gherkin::Scenario,
        examples: &gherkin::Examples,
    ) -> bool {
        self.evaluate(
            feature
                .tags
                .iter()
                .chain(rule.iter().flat_map(|r| &r.tags))
                .chain(&scenario.tags)
                .chain(&examples.tags),
        )
    }

    /// Checks whether at least one [`gherkin::Scenario`] of the document
    /// (including the ones inside [`gherkin::Rule`]s) matches.
    ///
    /// A missing document matches nothing.
    #[must_use]
    pub fn matches_document<'f>(
        &self,
        document: impl Into<Option<&'f gherkin::Feature>>,
    ) -> bool {
        let Some(feature) = document.into() else {
            return false;
        };
        feature
            .scenarios
            .iter()
            .any(|sc| self.matches_scenario(feature, None, sc))
            || feature.rules.iter().any(|r| {
                r.scenarios
                    .iter()
                    .any(|sc| self.matches_scenario(feature, Some(r), sc))
            })
    }
}

impl FromStr for TagFilter {
    type Err = TagFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

#[cfg(test)]
mod tests {
    use gherkin::GherkinEnv;

    use super::*;

    // language=Gherkin
    const FEATURE: &str = r"
@feat
Feature: tagged
  @plain
  Scenario: plain
    Given a step

  @rule
  Rule: ruled
    @inner
    Scenario Outline: outline
      Given a <thing>

      @first
      Examples:
        | thing |
        | stone |
";

    fn feature() -> gherkin::Feature {
        gherkin::Feature::parse(FEATURE, GherkinEnv::default())
            .unwrap_or_else(|e| panic!("failed to parse feature: {e}"))
    }

    #[test]
    fn evaluates_and_not() {
        let filter = TagFilter::new("@smoke and not @slow").unwrap();

        assert!(filter.evaluate(["@smoke", "@fast"]));
        assert!(!filter.evaluate(["@smoke", "@slow"]));
        assert!(!filter.evaluate(Vec::<String>::new()));
    }

    #[test]
    fn evaluates_or_with_parentheses() {
        let filter = TagFilter::new("(@a or @b) and not @c").unwrap();

        assert!(filter.evaluate(["@a"]));
        assert!(filter.evaluate(["@b", "@d"]));
        assert!(!filter.evaluate(["@b", "@c"]));
    }

    #[test]
    fn sigil_is_insignificant() {
        let filter = TagFilter::new("@smoke").unwrap();

        assert!(filter.evaluate(["smoke"]));
        assert!(filter.evaluate(["@smoke"]));
    }

    #[test]
    fn rejects_malformed_expression() {
        let err = TagFilter::new("@a and").unwrap_err();

        assert_eq!(err.expression, "@a and");
        assert!(err.to_string().starts_with("Failed to parse tag expression"));
    }

    #[test]
    fn scenario_inherits_feature_and_rule_tags() {
        let f = feature();
        let rule = &f.rules[0];
        let outline = &rule.scenarios[0];

        assert!(TagFilter::new("@feat and @rule and @inner")
            .unwrap()
            .matches_scenario(&f, Some(rule), outline));
        assert!(!TagFilter::new("@rule")
            .unwrap()
            .matches_scenario(&f, None, &f.scenarios[0]));
    }

    #[test]
    fn examples_add_their_own_tags() {
        let f = feature();
        let rule = &f.rules[0];
        let outline = &rule.scenarios[0];
        let filter = TagFilter::new("@first").unwrap();

        assert!(!filter.matches_scenario(&f, Some(rule), outline));
        assert!(filter.matches_examples(
            &f,
            Some(rule),
            outline,
            &outline.examples[0],
        ));
    }

    #[test]
    fn document_matches_through_rules() {
        let f = feature();

        assert!(TagFilter::new("@inner").unwrap().matches_document(&f));
        assert!(TagFilter::new("@plain").unwrap().matches_document(&f));
        assert!(!TagFilter::new("@absent").unwrap().matches_document(&f));
        assert!(!TagFilter::new("@feat")
            .unwrap()
            .matches_document(None::<&gherkin::Feature>));
    }

    #[test]
    fn inherited_tags_keep_hierarchy_order() {
        let f = feature();
        let rule = &f.rules[0];
        let outline = &rule.scenarios[0];

        let tags =
            inherited_tags(&f, Some(rule), outline, outline.examples.first());

        let bare = tags.iter().map(|t| bare(t)).collect::<Vec<_>>();
        assert_eq!(bare, ["feat", "rule", "inner", "first"]);
    }
}
