use std::io::Write as _;

use cuke_core::{
    feature::Ext as _, process_document, process_scenario_outline,
    ScenarioId, TagFilter,
};
use gherkin::GherkinEnv;

// language=Gherkin
const CALCULATOR: &str = r#"@calc
Feature: Calculator

  Scenario: plain
    Given nothing to expand

  @outline
  Scenario Outline: Add <a> and <b>
    Given I enter <a>
    And I enter <b>
    Then the sum is <sum>
      | left | right |
      | <a>  | <b>   |
    And the log reads
      """
      <a> + <b> = <sum>
      """

    @fast
    Examples: small
      | a | b | sum |
      | 1 | 2 | 3   |
      | 5 | 7 | 12  |

    @slow
    Examples: large
      | a   | b   | sum  |
      | 100 | 200 | 300  |

    Examples: empty
      | a | b | sum |

  @ruled
  Rule: negatives
    Scenario Outline: Subtract <x>
      Given I enter -<x>

      Examples:
        | x |
        | 4 |
"#;

fn feature() -> gherkin::Feature {
    gherkin::Feature::parse(CALCULATOR, GherkinEnv::default())
        .unwrap_or_else(|e| panic!("failed to parse feature: {e}"))
}

const OUTLINE: ScenarioId = ScenarioId { rule: None, scenario: 1 };

#[test]
fn expands_every_row_in_block_then_row_order() {
    let f = feature();

    let out = process_scenario_outline(&f, OUTLINE, None);

    let names = out.iter().map(|sc| sc.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["Add 1 and 2", "Add 5 and 7", "Add 100 and 200"]);
    assert_eq!(
        out.iter()
            .map(|sc| (sc.examples_index, sc.row_index))
            .collect::<Vec<_>>(),
        [(0, 0), (0, 1), (1, 0)],
    );
}

#[test]
fn materializes_calculator_example() {
    let f = feature();

    let out = process_scenario_outline(&f, OUTLINE, None);
    let second = &out[1];

    let steps = second
        .steps
        .iter()
        .map(|s| (s.keyword.trim(), s.text.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        steps,
        [
            ("Given", "I enter 5"),
            ("And", "I enter 7"),
            ("Then", "the sum is 12"),
            ("And", "the log reads"),
        ],
    );
    assert_eq!(second.header, ["a", "b", "sum"]);
    assert_eq!(second.row, ["5", "7", "12"]);
    assert_eq!(
        second.example_values().as_string(),
        "<a> = 5, <b> = 7, <sum> = 12",
    );
}

#[test]
fn substitution_is_total() {
    let f = feature();

    for sc in process_scenario_outline(&f, OUTLINE, None) {
        let mut texts = vec![sc.name.clone()];
        for step in &sc.steps {
            texts.push(step.text.clone());
            texts.extend(step.docstring.clone());
            if let Some(table) = &step.table {
                texts.extend(table.raw().into_iter().flatten());
            }
        }
        for text in texts {
            for column in &sc.header {
                assert!(
                    !text.contains(&format!("<{column}>")),
                    "`{text}` still contains <{column}>",
                );
            }
        }
    }
}

#[test]
fn substitutes_tables_and_docstrings() {
    let f = feature();

    let first = &process_scenario_outline(&f, OUTLINE, None)[0];

    assert_eq!(
        first.steps[2].table.as_ref().unwrap().hashes()[0]["right"],
        "2",
    );
    assert_eq!(
        first.steps[3].docstring.as_deref(),
        Some("\n1 + 2 = 3\n"),
    );
}

#[test]
fn inherits_tags_down_to_examples() {
    let f = feature();

    let out = process_scenario_outline(&f, OUTLINE, None);

    assert_eq!(
        out[0]
            .tags
            .iter()
            .map(|t| t.trim_start_matches('@'))
            .collect::<Vec<_>>(),
        ["calc", "outline", "fast"],
    );
    assert!(out[2].has_tag("@slow"));
    assert!(!out[2].has_tag("fast"));
}

#[test]
fn row_line_points_at_examples_row() {
    let f = feature();

    let out = process_scenario_outline(&f, OUTLINE, None);

    let lines = CALCULATOR.lines().collect::<Vec<_>>();
    for sc in &out {
        let source = lines[sc.line - 1];
        assert!(
            source.trim().starts_with(&format!("| {}", sc.row[0])),
            "line {} is `{source}`",
            sc.line,
        );
    }
}

#[test]
fn filter_selects_whole_examples_blocks() {
    let f = feature();

    let fast = TagFilter::new("@fast").unwrap();
    let out = process_scenario_outline(&f, OUTLINE, Some(&fast));
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(|sc| sc.examples_index == 0));

    let not_slow = TagFilter::new("not @slow").unwrap();
    assert_eq!(process_scenario_outline(&f, OUTLINE, Some(&not_slow)).len(), 2);
}

#[test]
fn rejecting_filter_yields_nothing_and_accepting_filter_everything() {
    let f = feature();

    let none = TagFilter::new("@absent").unwrap();
    assert!(process_document(&f, Some(&none)).is_empty());

    let all = TagFilter::new("@calc").unwrap();
    assert_eq!(process_document(&f, Some(&all)), process_document(&f, None));
}

#[test]
fn document_walk_covers_rules_in_order() {
    let f = feature();

    let out = process_document(&f, None);

    assert_eq!(out.len(), f.count_outline_rows());
    assert_eq!(out.len(), 4);
    let last = out.last().unwrap();
    assert_eq!(last.name, "Subtract 4");
    assert_eq!(last.steps[0].text, "I enter -4");
    assert_eq!(last.id, ScenarioId { rule: Some(0), scenario: 0 });
    assert!(last.has_tag("ruled"));
}

#[test]
fn missing_document_yields_nothing() {
    assert!(process_document(None::<&gherkin::Feature>, None).is_empty());
}

#[test]
fn feature_without_outlines_yields_nothing() {
    let f = gherkin::Feature::parse(
        "Feature: flat\n  Scenario: one\n    Given a step\n",
        GherkinEnv::default(),
    )
    .unwrap();

    assert!(process_document(&f, None).is_empty());
    assert_eq!(f.count_outline_rows(), 0);
}

#[test]
fn expands_feature_files_from_disk() {
    let mut file = tempfile::Builder::new()
        .suffix(".feature")
        .tempfile()
        .unwrap();
    file.write_all(CALCULATOR.as_bytes()).unwrap();

    let f = gherkin::Feature::parse_path(file.path(), GherkinEnv::default())
        .unwrap();

    assert_eq!(process_document(&f, None).len(), 4);
}
