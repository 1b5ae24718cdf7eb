// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Registry of step definitions.

use std::{fmt, sync::Arc};

use futures::future::LocalBoxFuture;
use tracing::{debug, trace};

use super::{
    context::{Arg, Context},
    error::{AmbiguousMatchError, PatternError, StepError},
    location::Location,
    pattern::{Matcher, StepPattern},
};
use crate::{data_table::DataTable, scenario::ConcreteStep};

/// Alias for a step handler returning a [`LocalBoxFuture`].
pub type StepFn<World> = Arc<
    dyn for<'a> Fn(
            &'a mut World,
            Context,
        ) -> LocalBoxFuture<'a, anyhow::Result<()>>
        + Send
        + Sync,
>;

/// Strategy of resolving step text matching several step definitions.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum MatchPolicy {
    /// The earliest registered definition wins.
    #[default]
    FirstMatch,

    /// More than one matching definition is an [`AmbiguousMatchError`].
    RejectAmbiguous,
}

/// Registered step definition.
pub struct Definition<World> {
    /// Pattern this [`Definition`] was registered with.
    pub pattern: StepPattern,

    /// Compiled [`Definition::pattern`].
    matcher: Matcher,

    /// Handler to invoke.
    pub handler: StepFn<World>,

    /// Where this [`Definition`] was registered.
    pub location: Location,
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<World> Clone for Definition<World> {
    fn clone(&self) -> Self {
        Self {
            pattern: self.pattern.clone(),
            matcher: self.matcher.clone(),
            handler: Arc::clone(&self.handler),
            location: self.location,
        }
    }
}

impl<World> fmt::Debug for Definition<World> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("pattern", &self.pattern)
            .field("handler", &format!("{:p}", Arc::as_ptr(&self.handler)))
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl<World> Definition<World> {
    /// Returns the [`Arg`]s this [`Definition`] extracts out of the given
    /// step `text`, if it accepts the `text`.
    #[must_use]
    pub fn captures(&self, text: &str) -> Option<Vec<Arg>> {
        self.matcher.captures(text)
    }
}

/// [`Definition`] accepting some step text, along with the [`Arg`]s it
/// extracted.
pub struct StepMatch<'me, World> {
    /// Matched [`Definition`].
    pub definition: &'me Definition<World>,

    /// Extracted [`Arg`]s.
    pub args: Vec<Arg>,
}

impl<World> fmt::Debug for StepMatch<'_, World> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepMatch")
            .field("definition", self.definition)
            .field("args", &self.args)
            .finish()
    }
}

/// Collection of step [`Definition`]s, kept in registration order.
pub struct Collection<World> {
    /// Registered [`Definition`]s.
    definitions: Vec<Definition<World>>,

    /// How ambiguous matches are resolved.
    policy: MatchPolicy,
}

impl<World> fmt::Debug for Collection<World> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("definitions", &self.definitions)
            .field("policy", &self.policy)
            .finish()
    }
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<World> Clone for Collection<World> {
    fn clone(&self) -> Self {
        Self { definitions: self.definitions.clone(), policy: self.policy }
    }
}

// Implemented manually to omit redundant `World: Default` trait bound, imposed
// by `#[derive(Default)]`.
impl<World> Default for Collection<World> {
    fn default() -> Self {
        Self { definitions: Vec::new(), policy: MatchPolicy::default() }
    }
}

impl<World> Collection<World> {
    /// Creates a new empty [`Collection`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the [`MatchPolicy`] of this [`Collection`].
    #[must_use]
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the [`MatchPolicy`] of this [`Collection`] in place.
    pub fn set_policy(&mut self, policy: MatchPolicy) {
        self.policy = policy;
    }

    /// Returns the [`MatchPolicy`] of this [`Collection`].
    #[must_use]
    pub const fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Registers a new step [`Definition`], remembering the caller's
    /// [`Location`].
    ///
    /// # Errors
    ///
    /// If the `pattern` fails to compile.
    #[track_caller]
    pub fn register<F>(
        &mut self,
        pattern: impl Into<StepPattern>,
        handler: F,
    ) -> Result<&mut Self, PatternError>
    where
        F: for<'a> Fn(
                &'a mut World,
                Context,
            ) -> LocalBoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        let location = Location::caller();
        let pattern = pattern.into();
        let matcher = Matcher::compile(&pattern)?;
        self.definitions.push(Definition {
            pattern,
            matcher,
            handler: Arc::new(handler),
            location,
        });
        Ok(self)
    }

    /// Returns all the registered [`Definition`]s in registration order.
    ///
    /// Only the [`Definition::pattern`], [`Definition::handler`] and
    /// [`Definition::location`] are exposed, the compiled matcher stays
    /// private.
    #[must_use]
    pub fn definitions(&self) -> &[Definition<World>] {
        &self.definitions
    }

    /// Returns the number of registered [`Definition`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Checks whether no [`Definition`]s are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Returns every [`Definition`] accepting the given step `text`, in
    /// registration order.
    #[must_use]
    pub fn find_all(&self, text: &str) -> Vec<StepMatch<'_, World>> {
        self.definitions
            .iter()
            .filter_map(|definition| {
                definition
                    .captures(text)
                    .map(|args| StepMatch { definition, args })
            })
            .collect()
    }

    /// Returns the [`Definition`] accepting the given step `text`, if any.
    ///
    /// With [`MatchPolicy::FirstMatch`] the earliest registered one is
    /// returned.
    ///
    /// # Errors
    ///
    /// With [`MatchPolicy::RejectAmbiguous`], if several [`Definition`]s
    /// accept the `text`.
    pub fn find(
        &self,
        text: &str,
    ) -> Result<Option<StepMatch<'_, World>>, AmbiguousMatchError> {
        let found = match self.policy {
            MatchPolicy::FirstMatch => {
                self.definitions.iter().find_map(|definition| {
                    definition
                        .captures(text)
                        .map(|args| StepMatch { definition, args })
                })
            }
            MatchPolicy::RejectAmbiguous => {
                let mut all = self.find_all(text);
                if all.len() > 1 {
                    debug!(text, candidates = all.len(), "ambiguous step");
                    return Err(AmbiguousMatchError {
                        text: text.to_owned(),
                        possible_matches: all
                            .into_iter()
                            .map(|m| {
                                (
                                    m.definition.pattern.clone(),
                                    m.definition.location,
                                )
                            })
                            .collect(),
                    });
                }
                all.pop()
            }
        };

        trace!(
            text,
            pattern = found.as_ref().map(|m| m.definition.pattern.as_str()),
            "step lookup",
        );
        Ok(found)
    }

    /// Executes the given step `text` on the `world`, with no data table or
    /// doc string.
    ///
    /// # Errors
    ///
    /// See [`StepError`] for details.
    pub async fn execute_step(
        &self,
        text: &str,
        world: &mut World,
    ) -> Result<(), StepError> {
        self.run(text, None, None, world).await
    }

    /// Executes the given [`ConcreteStep`] on the `world`, passing its data
    /// table and doc string to the handler.
    ///
    /// # Errors
    ///
    /// See [`StepError`] for details.
    pub async fn execute(
        &self,
        step: &ConcreteStep,
        world: &mut World,
    ) -> Result<(), StepError> {
        self.run(&step.text, step.table.clone(), step.docstring.clone(), world)
            .await
    }

    /// Looks up the `text` and invokes the matched handler.
    async fn run(
        &self,
        text: &str,
        table: Option<DataTable>,
        docstring: Option<String>,
        world: &mut World,
    ) -> Result<(), StepError> {
        let Some(StepMatch { definition, args }) = self.find(text)? else {
            debug!(text, "undefined step");
            return Err(StepError::Undefined { text: text.to_owned() });
        };

        let ctx = Context { text: text.to_owned(), args, table, docstring };
        (definition.handler)(world, ctx).await.map_err(|error| {
            StepError::Failed { text: text.to_owned(), error }
        })
    }
}
