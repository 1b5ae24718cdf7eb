// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Lifecycle hooks around [`Scenario`]s and the whole suite.
//!
//! [`Scenario`]: gherkin::Scenario

use std::{any::Any, fmt, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use derive_more::{Display, Error};
use futures::{future::LocalBoxFuture, FutureExt as _};
use tracing::{debug_span, trace, warn, Instrument as _};

use crate::{
    step::Location,
    tag::{TagFilter, TagFilterError},
};

/// Phase of the run a [`Hook`] is attached to.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Phase {
    /// Before each [`Scenario`].
    ///
    /// [`Scenario`]: gherkin::Scenario
    #[display("before scenario")]
    BeforeScenario,

    /// After each [`Scenario`].
    ///
    /// [`Scenario`]: gherkin::Scenario
    #[display("after scenario")]
    AfterScenario,

    /// Once before the whole suite.
    #[display("before suite")]
    BeforeSuite,

    /// Once after the whole suite.
    #[display("after suite")]
    AfterSuite,
}

impl Phase {
    /// Checks whether this [`Phase`] is bound to a single [`Scenario`], so
    /// [`Hook`]s of it may be filtered by tags.
    ///
    /// [`Scenario`]: gherkin::Scenario
    #[must_use]
    pub const fn is_scenario(self) -> bool {
        matches!(self, Self::BeforeScenario | Self::AfterScenario)
    }
}

/// Options of a [`Hook`] registration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HookOptions {
    /// Tag expression restricting the [`Scenario`]s the [`Hook`] runs for.
    ///
    /// [`Scenario`]: gherkin::Scenario
    pub tags: Option<String>,

    /// Timeout for the executor to enforce.
    pub timeout: Option<Duration>,

    /// Human-readable name of the [`Hook`].
    pub name: Option<String>,
}

impl HookOptions {
    /// Sets the [`HookOptions::tags`] expression.
    #[must_use]
    pub fn tags(mut self, expression: impl Into<String>) -> Self {
        self.tags = Some(expression.into());
        self
    }

    /// Sets the [`HookOptions::timeout`].
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the [`HookOptions::name`].
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl From<&str> for HookOptions {
    fn from(tags: &str) -> Self {
        Self::default().tags(tags)
    }
}

/// Alias for a hook handler returning a [`LocalBoxFuture`].
pub type HookFn<World> = Arc<
    dyn for<'a> Fn(&'a mut World) -> LocalBoxFuture<'a, anyhow::Result<()>>
        + Send
        + Sync,
>;

/// Registered hook.
pub struct Hook<World> {
    /// [`Phase`] this [`Hook`] runs in.
    pub phase: Phase,

    /// Name of this [`Hook`], if any.
    pub name: Option<String>,

    /// [`TagFilter`] restricting [`Phase::is_scenario()`] hooks.
    pub filter: Option<TagFilter>,

    /// Own timeout of this [`Hook`].
    pub timeout: Option<Duration>,

    /// Where this [`Hook`] was registered.
    pub location: Location,

    /// Handler to invoke.
    pub handler: HookFn<World>,
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<World> Clone for Hook<World> {
    fn clone(&self) -> Self {
        Self {
            phase: self.phase,
            name: self.name.clone(),
            filter: self.filter.clone(),
            timeout: self.timeout,
            location: self.location,
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<World> fmt::Debug for Hook<World> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("phase", &self.phase)
            .field("name", &self.name)
            .field("filter", &self.filter.as_ref().map(TagFilter::as_str))
            .field("timeout", &self.timeout)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Error of registering a [`Hook`] with a malformed tag expression.
#[derive(Debug, Display, Error)]
#[display("Invalid tags of {phase} hook at {location}: {source}")]
pub struct ConfigError {
    /// [`Phase`] of the rejected [`Hook`].
    pub phase: Phase,

    /// Where the rejected [`Hook`] was registered.
    pub location: Location,

    /// Tag expression parsing error.
    pub source: TagFilterError,
}

/// Reason of a [`Hook`] failure.
#[derive(Debug)]
pub enum HookFailure {
    /// Handler returned an error.
    Error(anyhow::Error),

    /// Handler panicked, with the panic message.
    Panic(String),
}

impl fmt::Display for HookFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(e) => write!(f, "{e}"),
            Self::Panic(msg) => f.write_str(msg),
        }
    }
}

/// Error of executing [`Hook`]s.
#[derive(Debug)]
pub enum HookError {
    /// A [`Hook`] failed, so the remaining ones of the [`Phase`] were not run.
    Failed {
        /// [`Phase`] being executed.
        phase: Phase,

        /// Index of the failed [`Hook`] among the ones of its [`Phase`].
        index: usize,

        /// Name of the failed [`Hook`], if any.
        name: Option<String>,

        /// Where the failed [`Hook`] was registered.
        location: Location,

        /// Reason of the failure.
        cause: HookFailure,
    },
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { cause, .. } => write!(f, "Hook failed: {cause}"),
        }
    }
}

// Implemented manually, as `anyhow::Error` doesn't implement `Error`.
impl std::error::Error for HookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Failed { cause: HookFailure::Error(e), .. } => Some(&**e),
            Self::Failed { cause: HookFailure::Panic(_), .. } => None,
        }
    }
}

/// Registry of [`Hook`]s, executed in registration order.
pub struct Registry<World> {
    /// Registered [`Hook`]s of all [`Phase`]s.
    hooks: Vec<Hook<World>>,

    /// Timeout of [`Hook`]s registered without their own one.
    default_timeout: Option<Duration>,
}

impl<World> fmt::Debug for Registry<World> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("hooks", &self.hooks)
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<World> Clone for Registry<World> {
    fn clone(&self) -> Self {
        Self {
            hooks: self.hooks.clone(),
            default_timeout: self.default_timeout,
        }
    }
}

// Implemented manually to omit redundant `World: Default` trait bound, imposed
// by `#[derive(Default)]`.
impl<World> Default for Registry<World> {
    fn default() -> Self {
        Self { hooks: Vec::new(), default_timeout: None }
    }
}

impl<World> Registry<World> {
    /// Creates a new empty [`Registry`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout of [`Hook`]s without their own one.
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Sets the timeout of [`Hook`]s without their own one in place.
    pub fn set_default_timeout(&mut self, timeout: Option<Duration>) {
        self.default_timeout = timeout;
    }

    /// Registers a [`Hook`] running for every [`Scenario`] of the `phase`.
    ///
    /// [`Scenario`]: gherkin::Scenario
    #[track_caller]
    pub fn register<F>(&mut self, phase: Phase, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut World) -> LocalBoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        self.hooks.push(Hook {
            phase,
            name: None,
            filter: None,
            timeout: None,
            location: Location::caller(),
            handler: Arc::new(handler),
        });
        self
    }

    /// Registers a [`Hook`] configured with the given [`HookOptions`].
    ///
    /// # Errors
    ///
    /// If the [`HookOptions::tags`] is not a valid tag expression.
    #[track_caller]
    pub fn register_with<F>(
        &mut self,
        phase: Phase,
        options: impl Into<HookOptions>,
        handler: F,
    ) -> Result<&mut Self, ConfigError>
    where
        F: for<'a> Fn(&'a mut World) -> LocalBoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        let location = Location::caller();
        let HookOptions { tags, timeout, name } = options.into();
        let filter = tags
            .map(TagFilter::new)
            .transpose()
            .map_err(|source| ConfigError { phase, location, source })?;
        self.hooks.push(Hook {
            phase,
            name,
            filter,
            timeout,
            location,
            handler: Arc::new(handler),
        });
        Ok(self)
    }

    /// Iterates over the [`Hook`]s of the given `phase` in registration order.
    pub fn hooks(&self, phase: Phase) -> impl Iterator<Item = &Hook<World>> {
        self.hooks.iter().filter(move |h| h.phase == phase)
    }

    /// Returns the timeout the executor should enforce for the given `hook`.
    #[must_use]
    pub fn timeout(&self, hook: &Hook<World>) -> Option<Duration> {
        hook.timeout.or(self.default_timeout)
    }

    /// Executes the [`Hook`]s of the given `phase` in registration order.
    ///
    /// For [`Phase::is_scenario()`] phases, [`Hook`]s whose [`TagFilter`]
    /// rejects the `tags` are skipped. Tags are ignored by suite phases.
    ///
    /// # Errors
    ///
    /// On the first failed [`Hook`], leaving the remaining ones not run.
    pub async fn execute_hooks<S: AsRef<str>>(
        &self,
        phase: Phase,
        world: &mut World,
        tags: &[S],
    ) -> Result<(), HookError> {
        for (index, hook) in self.hooks(phase).enumerate() {
            if let (true, Some(filter)) = (phase.is_scenario(), &hook.filter) {
                if !filter.evaluate(tags) {
                    trace!(%phase, index, filter = %filter, "skipping hook");
                    continue;
                }
            }

            let span = debug_span!(
                "hook",
                %phase,
                index,
                name = hook.name.as_deref(),
            );
            let result = AssertUnwindSafe(async { (hook.handler)(world).await })
                .catch_unwind()
                .instrument(span)
                .await;

            let cause = match result {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => HookFailure::Error(e),
                Err(panic) => HookFailure::Panic(panic_message(&*panic)),
            };
            warn!(
                %phase,
                index,
                location = %hook.location,
                error = %cause,
                "hook failed",
            );
            return Err(HookError::Failed {
                phase,
                index,
                name: hook.name.clone(),
                location: hook.location,
                cause,
            });
        }
        Ok(())
    }

    /// Executes [`Phase::BeforeScenario`] [`Hook`]s for a [`Scenario`]
    /// carrying the given `tags`.
    ///
    /// # Errors
    ///
    /// See [`Registry::execute_hooks()`] for details.
    ///
    /// [`Scenario`]: gherkin::Scenario
    pub async fn execute_before_hooks<S: AsRef<str>>(
        &self,
        world: &mut World,
        tags: &[S],
    ) -> Result<(), HookError> {
        self.execute_hooks(Phase::BeforeScenario, world, tags).await
    }

    /// Executes [`Phase::AfterScenario`] [`Hook`]s for a [`Scenario`]
    /// carrying the given `tags`.
    ///
    /// # Errors
    ///
    /// See [`Registry::execute_hooks()`] for details.
    ///
    /// [`Scenario`]: gherkin::Scenario
    pub async fn execute_after_hooks<S: AsRef<str>>(
        &self,
        world: &mut World,
        tags: &[S],
    ) -> Result<(), HookError> {
        self.execute_hooks(Phase::AfterScenario, world, tags).await
    }

    /// Executes [`Phase::BeforeSuite`] [`Hook`]s.
    ///
    /// # Errors
    ///
    /// See [`Registry::execute_hooks()`] for details.
    pub async fn execute_before_all_hooks(
        &self,
        world: &mut World,
    ) -> Result<(), HookError> {
        self.execute_hooks::<&str>(Phase::BeforeSuite, world, &[]).await
    }

    /// Executes [`Phase::AfterSuite`] [`Hook`]s.
    ///
    /// # Errors
    ///
    /// See [`Registry::execute_hooks()`] for details.
    pub async fn execute_after_all_hooks(
        &self,
        world: &mut World,
    ) -> Result<(), HookError> {
        self.execute_hooks::<&str>(Phase::AfterSuite, world, &[]).await
    }
}

/// Extracts a readable message out of a [`catch_unwind()`] payload.
///
/// [`catch_unwind()`]: std::panic::catch_unwind
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "Unknown panic payload".to_owned()
    }
}
