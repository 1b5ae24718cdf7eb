// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Materialized [`Scenario Outline`][1] instances.
//!
//! [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline

use std::fmt;

use crate::{data_table::DataTable, examples::ExampleValues};

/// Identifier of a [`gherkin::Scenario`] inside its [`gherkin::Feature`].
///
/// Refers to the template by index rather than by reference, so
/// [`ConcreteScenario`]s don't borrow the document they were expanded from.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ScenarioId {
    /// Index of the [`gherkin::Rule`] in [`gherkin::Feature::rules`], if the
    /// [`gherkin::Scenario`] belongs to one.
    pub rule: Option<usize>,

    /// Index of the [`gherkin::Scenario`] in its parent's `scenarios`.
    pub scenario: usize,
}

impl ScenarioId {
    /// Resolves this [`ScenarioId`] against the given `feature`.
    ///
    /// Returns [`None`] if the `feature` has no such [`gherkin::Scenario`].
    #[must_use]
    pub fn resolve<'f>(
        &self,
        feature: &'f gherkin::Feature,
    ) -> Option<(Option<&'f gherkin::Rule>, &'f gherkin::Scenario)> {
        match self.rule {
            Some(r) => {
                let rule = feature.rules.get(r)?;
                rule.scenarios.get(self.scenario).map(|sc| (Some(rule), sc))
            }
            None => feature.scenarios.get(self.scenario).map(|sc| (None, sc)),
        }
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(r) = self.rule {
            write!(f, "rule[{r}].")?;
        }
        write!(f, "scenario[{}]", self.scenario)
    }
}

/// [`gherkin::Step`] with every placeholder already substituted.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ConcreteStep {
    /// Keyword of this step (`Given `, `And `, etc.), copied as is.
    pub keyword: String,

    /// Resolved text of this step.
    pub text: String,

    /// Resolved [`DataTable`] of this step, if any.
    pub table: Option<DataTable>,

    /// Resolved doc string of this step, if any.
    pub docstring: Option<String>,

    /// Line of the template step in the source document.
    pub line: usize,
}

impl ConcreteStep {
    /// Materializes the given template `step` with the provided `values`.
    #[must_use]
    pub fn materialize(step: &gherkin::Step, values: &ExampleValues) -> Self {
        Self {
            keyword: step.keyword.clone(),
            text: values.insert_values(&step.value),
            table: step.table.as_ref().map(|t| {
                DataTable::from(t).map_cells(|c| values.insert_values(c))
            }),
            docstring: step
                .docstring
                .as_deref()
                .map(|d| values.insert_values(d)),
            line: step.position.line,
        }
    }
}

/// Single instance of a [`Scenario Outline`][1] produced from one
/// [`gherkin::Examples`] row.
///
/// [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ConcreteScenario {
    /// Template this [`ConcreteScenario`] originates from.
    pub id: ScenarioId,

    /// Keyword of the template (`Scenario Outline`, `Scenario Template`,
    /// etc.).
    pub keyword: String,

    /// Resolved name.
    pub name: String,

    /// Resolved steps, in template order.
    pub steps: Vec<ConcreteStep>,

    /// Source line of the examples row this instance was produced from.
    pub line: usize,

    /// Index of the [`gherkin::Examples`] block in the template.
    pub examples_index: usize,

    /// Index of the row inside the body of its [`gherkin::Examples`] block.
    pub row_index: usize,

    /// Header of the [`gherkin::Examples`] block.
    pub header: Vec<String>,

    /// Cells of the examples row.
    pub row: Vec<String>,

    /// Inherited tags, in `Feature` -> `Rule` -> `Scenario` -> `Examples`
    /// order.
    pub tags: Vec<String>,
}

impl ConcreteScenario {
    /// Returns the substitution map this [`ConcreteScenario`] was
    /// materialized with.
    #[must_use]
    pub fn example_values(&self) -> ExampleValues {
        ExampleValues::new(self.header.as_slice(), self.row.as_slice())
    }

    /// Checks whether this [`ConcreteScenario`] carries the given `tag`,
    /// ignoring any leading `@`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim_start_matches('@');
        self.tags.iter().any(|t| t.trim_start_matches('@') == tag)
    }
}

#[cfg(test)]
mod tests {
    use gherkin::GherkinEnv;

    use super::*;

    // language=Gherkin
    const FEATURE: &str = r#"
Feature: ids
  Scenario: direct
    Given a step

  Rule: ruled
    Scenario Outline: nested <x>
      Given a <x>
        | col |
        | <x> |
      And a doc string
        """
        value is <x>
        """

      Examples:
        | x |
        | 1 |
"#;

    fn feature() -> gherkin::Feature {
        gherkin::Feature::parse(FEATURE, GherkinEnv::default())
            .unwrap_or_else(|e| panic!("failed to parse feature: {e}"))
    }

    #[test]
    fn resolves_ids() {
        let f = feature();

        let (rule, sc) = ScenarioId { rule: None, scenario: 0 }
            .resolve(&f)
            .unwrap();
        assert!(rule.is_none());
        assert_eq!(sc.name, "direct");

        let (rule, sc) = ScenarioId { rule: Some(0), scenario: 0 }
            .resolve(&f)
            .unwrap();
        assert_eq!(rule.unwrap().name, "ruled");
        assert_eq!(sc.name, "nested <x>");

        assert!(
            ScenarioId { rule: Some(1), scenario: 0 }.resolve(&f).is_none(),
        );
        assert!(ScenarioId { rule: None, scenario: 3 }.resolve(&f).is_none());
    }

    #[test]
    fn displays_ids() {
        assert_eq!(
            ScenarioId { rule: None, scenario: 2 }.to_string(),
            "scenario[2]",
        );
        assert_eq!(
            ScenarioId { rule: Some(1), scenario: 0 }.to_string(),
            "rule[1].scenario[0]",
        );
    }

    #[test]
    fn materializes_table_and_docstring() {
        let f = feature();
        let template = &f.rules[0].scenarios[0];
        let values = ExampleValues::new(&["x"], &["42"]);

        let first = ConcreteStep::materialize(&template.steps[0], &values);
        assert_eq!(first.text, "a 42");
        assert_eq!(first.keyword, template.steps[0].keyword);
        assert_eq!(
            first.table.unwrap().raw(),
            vec![vec!["col".to_owned()], vec!["42".to_owned()]],
        );

        let second = ConcreteStep::materialize(&template.steps[1], &values);
        assert_eq!(second.docstring.as_deref(), Some("\nvalue is 42\n"));
        assert!(second.table.is_none());
    }

    #[test]
    fn tag_lookup_ignores_sigil() {
        let sc = ConcreteScenario {
            id: ScenarioId { rule: None, scenario: 0 },
            keyword: "Scenario Outline".into(),
            name: "n".into(),
            steps: vec![],
            line: 1,
            examples_index: 0,
            row_index: 0,
            header: vec!["a".into()],
            row: vec!["1".into()],
            tags: vec!["@smoke".into()],
        };

        assert!(sc.has_tag("smoke"));
        assert!(sc.has_tag("@smoke"));
        assert!(!sc.has_tag("slow"));
        assert_eq!(sc.example_values().as_string(), "<a> = 1");
    }
}
