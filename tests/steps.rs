use cuke_core::{
    process_document,
    step::{Arg, Collection, Context, MatchPolicy, StepError},
    Support,
};
use futures::{future::LocalBoxFuture, FutureExt as _};
use gherkin::GherkinEnv;
use regex::Regex;

#[derive(Debug, Default)]
struct Calculator {
    entered: Vec<i64>,
    calls: Vec<&'static str>,
    table: Option<Vec<Vec<String>>>,
}

fn enter<'a>(
    calc: &'a mut Calculator,
    ctx: Context,
) -> LocalBoxFuture<'a, anyhow::Result<()>> {
    async move {
        calc.calls.push("enter");
        calc.entered.push(ctx.int(0)?);
        if let Some(table) = ctx.table {
            calc.table = Some(table.raw());
        }
        Ok(())
    }
    .boxed_local()
}

fn enter_any<'a>(
    calc: &'a mut Calculator,
    _: Context,
) -> LocalBoxFuture<'a, anyhow::Result<()>> {
    async move {
        calc.calls.push("enter_any");
        Ok(())
    }
    .boxed_local()
}

fn check_sum<'a>(
    calc: &'a mut Calculator,
    ctx: Context,
) -> LocalBoxFuture<'a, anyhow::Result<()>> {
    async move {
        let expected = ctx.int(0)?;
        let actual = calc.entered.iter().sum::<i64>();
        anyhow::ensure!(
            actual == expected,
            "expected {expected}, got {actual}",
        );
        Ok(())
    }
    .boxed_local()
}

fn greet<'a>(
    calc: &'a mut Calculator,
    ctx: Context,
) -> LocalBoxFuture<'a, anyhow::Result<()>> {
    async move {
        calc.calls.push("greet");
        anyhow::ensure!(ctx.args == [Arg::Str("Ann Lee".into())]);
        Ok(())
    }
    .boxed_local()
}

fn support() -> Support<Calculator> {
    let mut support = Support::new();
    _ = support
        .given("I enter {int}", enter)
        .unwrap()
        .given(Regex::new(r"^I enter (.+)$").unwrap(), enter_any)
        .unwrap()
        .then("the sum is {int}", check_sum)
        .unwrap()
        .when("I greet {string}", greet)
        .unwrap();
    support
}

#[tokio::test]
async fn earlier_registration_wins_overlaps() {
    let support = support();
    let mut calc = Calculator::default();

    support.steps().execute_step("I enter 5", &mut calc).await.unwrap();

    assert_eq!(calc.calls, ["enter"]);
    assert_eq!(calc.entered, [5]);
}

#[tokio::test]
async fn falls_through_to_later_definition_on_conversion_failure() {
    let support = support();
    let mut calc = Calculator::default();

    support.steps().execute_step("I enter five", &mut calc).await.unwrap();

    assert_eq!(calc.calls, ["enter_any"]);
}

#[tokio::test]
async fn strict_policy_reports_every_candidate() {
    let mut support = support();
    support.steps_mut().set_policy(MatchPolicy::RejectAmbiguous);
    let mut calc = Calculator::default();

    let err = support
        .steps()
        .execute_step("I enter 5", &mut calc)
        .await
        .unwrap_err();

    let StepError::Ambiguous(amb) = &err else {
        panic!("expected ambiguity, got {err}");
    };
    let patterns = amb
        .possible_matches
        .iter()
        .map(|(p, _)| p.as_str())
        .collect::<Vec<_>>();
    assert_eq!(patterns, ["I enter {int}", r"^I enter (.+)$"]);
    assert!(calc.calls.is_empty());
}

#[tokio::test]
async fn undefined_step_is_a_lookup_error() {
    let support = support();
    let mut calc = Calculator::default();

    let err = support
        .steps()
        .execute_step("I divide by zero", &mut calc)
        .await
        .unwrap_err();

    assert!(matches!(err, StepError::Undefined { .. }));
    assert_eq!(err.text(), "I divide by zero");
}

#[tokio::test]
async fn handler_error_propagates_unchanged() {
    let support = support();
    let mut calc = Calculator::default();

    let err = support
        .steps()
        .execute_step("the sum is 3", &mut calc)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "expected 3, got 0");
}

#[tokio::test]
async fn string_parameters_are_unquoted() {
    let support = support();
    let mut calc = Calculator::default();

    support
        .steps()
        .execute_step(r#"I greet "Ann Lee""#, &mut calc)
        .await
        .unwrap();

    assert_eq!(calc.calls, ["greet"]);
}

#[tokio::test]
async fn runs_expanded_outline_end_to_end() {
    let feature = gherkin::Feature::parse(
        r"
Feature: Calculator
  Scenario Outline: Add <a> and <b>
    Given I enter <a>
      | value |
      | <a>   |
    And I enter <b>
    Then the sum is <sum>

    Examples:
      | a | b | sum |
      | 1 | 2 | 3   |
      | 5 | 7 | 12  |
",
        GherkinEnv::default(),
    )
    .unwrap();
    let support = support();

    for scenario in process_document(&feature, None) {
        let mut calc = Calculator::default();
        for step in &scenario.steps {
            support.steps().execute(step, &mut calc).await.unwrap();
        }
        assert_eq!(
            calc.table,
            Some(vec![vec!["value".to_owned()], vec![scenario.row[0].clone()]]),
        );
    }
}

#[test]
fn definitions_are_introspectable() {
    let steps: Collection<Calculator> = support().into_parts().0;

    let listed = steps
        .definitions()
        .iter()
        .map(|d| (d.pattern.as_str(), d.location.path))
        .collect::<Vec<_>>();

    assert_eq!(listed.len(), 4);
    assert_eq!(listed[0].0, "I enter {int}");
    assert!(listed.iter().all(|(_, path)| path.ends_with("steps.rs")));
}

#[test]
fn malformed_expression_is_rejected() {
    let mut steps = Collection::<Calculator>::new();

    let err = steps.register("I have {int cucumbers", enter).unwrap_err();

    assert!(err.to_string().contains("I have {int cucumbers"), "{err}");
    assert!(steps.is_empty());
}
