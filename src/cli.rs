// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! CLI (command line interface) options.

use std::time::Duration;

use clap::Parser;

use crate::{step::MatchPolicy, support::Support, tag::TagFilter};

/// CLI options configuring scenario selection, step matching and hooks.
///
/// May be embedded into a harness CLI via `#[command(flatten)]`.
///
/// # Example
///
/// ```rust
/// use clap::Parser as _;
/// use cuke_core::cli;
///
/// let opts = cli::Opts::try_parse_from([
///     "harness",
///     "--tags",
///     "@smoke and not @slow",
///     "--hook-timeout",
///     "5s",
/// ])
/// .unwrap();
///
/// assert!(opts.tags_filter.unwrap().evaluate(["@smoke"]));
/// ```
#[derive(Clone, Debug, Default, Parser)]
#[command(name = "cuke", about = "Select and run Gherkin scenarios")]
pub struct Opts {
    /// Tag expression to filter scenarios by.
    ///
    /// Note: Tags from Feature, Rule, Scenario and Examples are merged
    /// together on filtering, so be careful about conflicting tags on
    /// different levels.
    #[arg(
        id = "tags",
        long = "tags",
        short = 't',
        value_name = "tagexpr",
        global = true
    )]
    pub tags_filter: Option<TagFilter>,

    /// Fail steps matching more than one step definition, instead of running
    /// the earliest registered one.
    #[arg(long, global = true)]
    pub strict_steps: bool,

    /// Timeout of hooks registered without their own one.
    #[arg(
        long,
        value_name = "duration",
        value_parser = humantime::parse_duration,
        global = true
    )]
    pub hook_timeout: Option<Duration>,
}

impl Opts {
    /// Shortcut for [`clap::Parser::parse()`], which doesn't require the trait
    /// being imported.
    #[must_use]
    pub fn parsed() -> Self {
        <Self as Parser>::parse()
    }

    /// Returns the [`MatchPolicy`] these [`Opts`] ask for.
    #[must_use]
    pub const fn match_policy(&self) -> MatchPolicy {
        if self.strict_steps {
            MatchPolicy::RejectAmbiguous
        } else {
            MatchPolicy::FirstMatch
        }
    }

    /// Applies these [`Opts`] to the given [`Support`].
    ///
    /// The tag filter is not part of [`Support`], pass
    /// [`Opts::tags_filter`] to [`process_document()`] instead.
    ///
    /// [`process_document()`]: crate::process_document
    pub fn apply<World>(&self, support: &mut Support<World>) {
        support.steps_mut().set_policy(self.match_policy());
        if let Some(timeout) = self.hook_timeout {
            support.hooks_mut().set_default_timeout(Some(timeout));
        }
    }
}
