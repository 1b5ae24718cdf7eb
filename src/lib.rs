// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Scenario materialization and selection engine for [Gherkin] test suites.
//!
//! Given a [`gherkin::Feature`] parsed by the [`gherkin`] crate, this crate:
//! - expands [Scenario Outline]s into [`ConcreteScenario`]s, one per
//!   [Examples] row, substituting every `<column>` placeholder
//!   ([`process_document()`], [`process_scenario_outline()`]);
//! - selects scenarios with boolean [tag expressions][1] inherited through
//!   the `Feature` -> `Rule` -> `Scenario` -> `Examples` hierarchy
//!   ([`TagFilter`]);
//! - matches step text against registered [Cucumber Expression][2]s or
//!   regular expressions, extracting typed [`step::Arg`]s
//!   ([`step::Collection`]);
//! - runs before/after scenario and suite hooks in registration order,
//!   optionally restricted by tags ([`hook::Registry`]);
//! - provides a relational view over step [`DataTable`]s.
//!
//! Scheduling, reporting and timeout enforcement are left to the harness
//! driving this crate.
//!
//! # Example
//!
//! ```rust
//! use cuke_core::{process_document, TagFilter};
//! use gherkin::GherkinEnv;
//!
//! let feature = gherkin::Feature::parse(
//!     r"
//! Feature: Calculator
//!   Scenario Outline: Add <a> and <b>
//!     Given I enter <a>
//!     And I enter <b>
//!     Then the sum is <sum>
//!
//!     @fast
//!     Examples:
//!       | a | b | sum |
//!       | 1 | 2 | 3   |
//!       | 5 | 7 | 12  |
//! ",
//!     GherkinEnv::default(),
//! )
//! .unwrap();
//!
//! let filter = TagFilter::new("@fast").unwrap();
//! let scenarios = process_document(&feature, Some(&filter));
//!
//! assert_eq!(scenarios.len(), 2);
//! assert_eq!(scenarios[1].name, "Add 5 and 7");
//! assert_eq!(scenarios[1].steps[2].text, "the sum is 12");
//! ```
//!
//! [1]: https://cucumber.io/docs/cucumber/api#tag-expressions
//! [2]: https://github.com/cucumber/cucumber-expressions
//! [Examples]: https://cucumber.io/docs/gherkin/reference#examples
//! [Gherkin]: https://cucumber.io/docs/gherkin/reference
//! [Scenario Outline]: https://cucumber.io/docs/gherkin/reference#scenario-outline

#![deny(nonstandard_style, rustdoc::broken_intra_doc_links)]
#![forbid(non_ascii_idents, unsafe_code)]
#![warn(
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::missing_errors_doc,
    missing_debug_implementations,
    missing_docs,
    unused_qualifications,
    unused_results
)]

pub mod cli;
pub mod data_table;
pub mod error;
pub mod examples;
pub mod feature;
pub mod hook;
pub mod scenario;
pub mod step;
pub mod support;
pub mod tag;

#[doc(no_inline)]
pub use gherkin;

#[doc(inline)]
pub use self::{
    data_table::DataTable,
    error::{Error, Result},
    examples::ExampleValues,
    feature::{process_document, process_scenario_outline},
    hook::{HookOptions, Phase},
    scenario::{ConcreteScenario, ConcreteStep, ScenarioId},
    support::Support,
    tag::TagFilter,
};
