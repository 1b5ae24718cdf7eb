// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Scenario Outline`][1] expansion of [`gherkin::Feature`]s.
//!
//! [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline

use itertools::Itertools as _;
use sealed::sealed;
use tracing::{debug, trace};

use crate::{
    examples::ExampleValues,
    scenario::{ConcreteScenario, ConcreteStep, ScenarioId},
    tag::{self, TagFilter},
};

/// Helper methods to operate on [`gherkin::Feature`]s.
#[sealed]
pub trait Ext {
    /// Expands every [`Scenario Outline`][1] of this [`gherkin::Feature`]
    /// (including the ones inside [`gherkin::Rule`]s) in document order.
    ///
    /// So this one:
    /// ```gherkin
    /// Feature: Hungry
    ///   Scenario Outline: eating <eat>
    ///     Given there are <start> cucumbers
    ///     When I eat <eat> cucumbers
    ///     Then I should have <left> cucumbers
    ///
    ///     Examples:
    ///       | start | eat | left |
    ///       |    12 |   5 |    7 |
    ///       |    20 |   4 |   16 |
    /// ```
    ///
    /// Is materialized into two [`ConcreteScenario`]s named `eating 5` and
    /// `eating 4`, the first one having the `Given there are 12 cucumbers`
    /// step.
    ///
    /// [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
    #[must_use]
    fn expand_outlines(
        &self,
        filter: Option<&TagFilter>,
    ) -> Vec<ConcreteScenario>;

    /// Lists [`ScenarioId`]s of all the [`gherkin::Scenario`]s in document
    /// order.
    #[must_use]
    fn scenario_ids(&self) -> Vec<ScenarioId>;

    /// Counts the [`gherkin::Examples`] rows of all the
    /// [`Scenario Outline`][1]s, which is the number of [`ConcreteScenario`]s
    /// an unfiltered expansion produces.
    ///
    /// [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
    #[must_use]
    fn count_outline_rows(&self) -> usize;
}

#[sealed]
impl Ext for gherkin::Feature {
    fn expand_outlines(
        &self,
        filter: Option<&TagFilter>,
    ) -> Vec<ConcreteScenario> {
        self.scenario_ids()
            .into_iter()
            .flat_map(|id| process_scenario_outline(self, id, filter))
            .collect()
    }

    fn scenario_ids(&self) -> Vec<ScenarioId> {
        // `gherkin` keeps direct `Scenario`s and `Rule`s apart, so their
        // interleaving is recovered from source lines.
        let direct = self.scenarios.iter().enumerate().map(|(i, sc)| {
            (sc.position.line, vec![ScenarioId { rule: None, scenario: i }])
        });
        let ruled = self.rules.iter().enumerate().map(|(r, rule)| {
            let ids = (0..rule.scenarios.len())
                .map(|i| ScenarioId { rule: Some(r), scenario: i })
                .collect::<Vec<_>>();
            (rule.position.line, ids)
        });

        direct
            .chain(ruled)
            .sorted_by_key(|(line, _)| *line)
            .flat_map(|(_, ids)| ids)
            .collect()
    }

    fn count_outline_rows(&self) -> usize {
        self.scenarios
            .iter()
            .chain(self.rules.iter().flat_map(|r| &r.scenarios))
            .flat_map(|sc| &sc.examples)
            .filter_map(examples_body)
            .map(|(_, _, body)| body.len())
            .sum()
    }
}

/// Expands the [`Scenario Outline`][1] denoted by `id` into a
/// [`ConcreteScenario`] per [`gherkin::Examples`] row, in block-then-row
/// order.
///
/// A whole [`gherkin::Examples`] block is skipped if the `filter` rejects it,
/// or if it has an empty header or body. Returns nothing if the `id` doesn't
/// resolve, or the [`gherkin::Scenario`] has no [`gherkin::Examples`].
///
/// [`ConcreteScenario::line`] is the line of the table header plus the row's
/// ordinal, as [`gherkin::Table`] doesn't keep per-row positions. So comments
/// or blank lines inside an [`gherkin::Examples`] table shift the lines of
/// the rows below them.
///
/// [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
#[must_use]
pub fn process_scenario_outline(
    feature: &gherkin::Feature,
    id: ScenarioId,
    filter: Option<&TagFilter>,
) -> Vec<ConcreteScenario> {
    let Some((rule, scenario)) = id.resolve(feature) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for (examples_index, examples) in scenario.examples.iter().enumerate() {
        if let Some(f) = filter {
            if !f.matches_examples(feature, rule, scenario, examples) {
                debug!(
                    scenario = %scenario.name,
                    examples_index,
                    filter = %f,
                    "skipping filtered examples block",
                );
                continue;
            }
        }

        let Some((table_line, header, body)) = examples_body(examples) else {
            debug!(
                scenario = %scenario.name,
                examples_index,
                "skipping examples block with empty header or body",
            );
            continue;
        };

        let tags = tag::inherited_tags(feature, rule, scenario, Some(examples));
        for (row_index, row) in body.iter().enumerate() {
            let values = ExampleValues::new(header.as_slice(), row.as_slice());
            let line = table_line + 1 + row_index;
            trace!(
                scenario = %scenario.name,
                line,
                values = %values.as_string(),
                "materializing examples row",
            );

            out.push(ConcreteScenario {
                id,
                keyword: scenario.keyword.clone(),
                name: values.insert_values(&scenario.name),
                steps: scenario
                    .steps
                    .iter()
                    .map(|s| ConcreteStep::materialize(s, &values))
                    .collect(),
                line,
                examples_index,
                row_index,
                header: header.clone(),
                row: row.clone(),
                tags: tags.clone(),
            });
        }
    }
    out
}

/// Expands all the [`Scenario Outline`][1]s of the given `document` in
/// document order, keeping only [`gherkin::Examples`] blocks matching the
/// `filter`.
///
/// [`gherkin::Scenario`]s without [`gherkin::Examples`] are left out. A
/// missing document yields nothing.
///
/// [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
#[must_use]
pub fn process_document<'f>(
    document: impl Into<Option<&'f gherkin::Feature>>,
    filter: Option<&TagFilter>,
) -> Vec<ConcreteScenario> {
    document
        .into()
        .map(|f| f.expand_outlines(filter))
        .unwrap_or_default()
}

/// Splits the table of the given [`gherkin::Examples`] into its source line,
/// header and body, if both the header and body are non-empty.
fn examples_body(
    examples: &gherkin::Examples,
) -> Option<(usize, &Vec<String>, &[Vec<String>])> {
    let table = examples.table.as_ref()?;
    let (header, body) = table.rows.split_first()?;
    (!header.is_empty() && !body.is_empty())
        .then_some((table.position.line, header, body))
}

#[cfg(test)]
mod tests {
    use gherkin::GherkinEnv;

    use super::*;

    // language=Gherkin
    const FEATURE: &str = r"
Feature: ordering
  Scenario Outline: first <n>
    Given step <n>

    Examples:
      | n |
      | 1 |

  Rule: middle
    Scenario Outline: ruled <n>
      Given step <n>

      Examples:
        | n |
        | 2 |
        | 3 |

    Scenario: plain
      Given step 0
";

    fn feature() -> gherkin::Feature {
        gherkin::Feature::parse(FEATURE, GherkinEnv::default())
            .unwrap_or_else(|e| panic!("failed to parse feature: {e}"))
    }

    #[test]
    fn lists_ids_in_document_order() {
        let ids = feature().scenario_ids();

        assert_eq!(
            ids,
            [
                ScenarioId { rule: None, scenario: 0 },
                ScenarioId { rule: Some(0), scenario: 0 },
                ScenarioId { rule: Some(0), scenario: 1 },
            ],
        );
    }

    #[test]
    fn counts_outline_rows() {
        assert_eq!(feature().count_outline_rows(), 3);
    }

    #[test]
    fn plain_scenario_expands_to_nothing() {
        let f = feature();

        let out = process_scenario_outline(
            &f,
            ScenarioId { rule: Some(0), scenario: 1 },
            None,
        );

        assert!(out.is_empty());
    }

    #[test]
    fn unresolvable_id_expands_to_nothing() {
        let f = feature();

        let out = process_scenario_outline(
            &f,
            ScenarioId { rule: Some(5), scenario: 0 },
            None,
        );

        assert!(out.is_empty());
    }

    #[test]
    fn counts_row_lines_from_table_header() {
        // language=Gherkin
        let src = r"
Feature: lines
  Scenario Outline: row <a>
    Given step <a>

    Examples:
      | a |
      # note
      | 1 |

      | 2 |
";
        let f = gherkin::Feature::parse(src, GherkinEnv::default())
            .unwrap_or_else(|e| panic!("failed to parse feature: {e}"));

        let source = src.lines().collect::<Vec<_>>();
        let pointed = f
            .expand_outlines(None)
            .into_iter()
            .map(|sc| source[sc.line - 1].trim())
            .collect::<Vec<_>>();

        assert_eq!(pointed, ["# note", "| 1 |"]);
    }

    #[test]
    fn expands_in_document_order() {
        let names = feature()
            .expand_outlines(None)
            .into_iter()
            .map(|sc| sc.name)
            .collect::<Vec<_>>();

        assert_eq!(names, ["first 1", "ruled 2", "ruled 3"]);
    }
}
