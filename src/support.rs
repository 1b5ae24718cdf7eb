// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Support code bundle: step definitions and hooks of a single world type.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::{Mutex, PoisonError},
};

use futures::future::LocalBoxFuture;
use once_cell::sync::Lazy;

use crate::{
    hook::{self, ConfigError, HookOptions, Phase},
    step::{self, Context, PatternError, StepPattern},
};

/// Step definitions and hooks operating on the `World` type.
///
/// # Example
///
/// ```rust
/// use cuke_core::{step::Context, Support};
/// use futures::{future::LocalBoxFuture, FutureExt as _};
///
/// #[derive(Default)]
/// struct Calculator(Vec<i64>);
///
/// fn enter<'a>(
///     calc: &'a mut Calculator,
///     ctx: Context,
/// ) -> LocalBoxFuture<'a, anyhow::Result<()>> {
///     async move {
///         calc.0.push(ctx.int(0)?);
///         Ok(())
///     }
///     .boxed_local()
/// }
///
/// # fn main() -> anyhow::Result<()> {
/// let mut support = Support::new();
/// _ = support.given("I enter {int}", enter)?;
///
/// let mut calc = Calculator::default();
/// support
///     .steps()
///     .execute_step("I enter 5", &mut calc)
///     .now_or_never()
///     .unwrap_or_else(|| unreachable!())?;
/// assert_eq!(calc.0, [5]);
/// # Ok(())
/// # }
/// ```
pub struct Support<World> {
    /// Registered step definitions.
    steps: step::Collection<World>,

    /// Registered hooks.
    hooks: hook::Registry<World>,
}

impl<World> fmt::Debug for Support<World> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Support")
            .field("steps", &self.steps)
            .field("hooks", &self.hooks)
            .finish()
    }
}

// Implemented manually to omit redundant `World: Default` trait bound, imposed
// by `#[derive(Default)]`.
impl<World> Default for Support<World> {
    fn default() -> Self {
        Self { steps: step::Collection::new(), hooks: hook::Registry::new() }
    }
}

// Implemented manually to omit redundant `World: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<World> Clone for Support<World> {
    fn clone(&self) -> Self {
        Self { steps: self.steps.clone(), hooks: self.hooks.clone() }
    }
}

impl<World> Support<World> {
    /// Creates a new empty [`Support`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the step definitions.
    #[must_use]
    pub const fn steps(&self) -> &step::Collection<World> {
        &self.steps
    }

    /// Returns the step definitions mutably.
    pub fn steps_mut(&mut self) -> &mut step::Collection<World> {
        &mut self.steps
    }

    /// Returns the hooks.
    #[must_use]
    pub const fn hooks(&self) -> &hook::Registry<World> {
        &self.hooks
    }

    /// Returns the hooks mutably.
    pub fn hooks_mut(&mut self) -> &mut hook::Registry<World> {
        &mut self.hooks
    }

    /// Splits this [`Support`] into its step definitions and hooks.
    #[must_use]
    pub fn into_parts(
        self,
    ) -> (step::Collection<World>, hook::Registry<World>) {
        (self.steps, self.hooks)
    }

    /// Registers a step definition.
    ///
    /// Keywords don't take part in matching, so this is what [`given()`],
    /// [`when()`] and [`then()`] do as well.
    ///
    /// # Errors
    ///
    /// If the `pattern` fails to compile.
    ///
    /// [`given()`]: Support::given
    /// [`then()`]: Support::then
    /// [`when()`]: Support::when
    #[track_caller]
    pub fn step<F>(
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
        _ = self.steps.register(pattern, handler)?;
        Ok(self)
    }

    /// Registers a [Given] step definition.
    ///
    /// # Errors
    ///
    /// If the `pattern` fails to compile.
    ///
    /// [Given]: https://cucumber.io/docs/gherkin/reference#given
    #[track_caller]
    pub fn given<F>(
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
        self.step(pattern, handler)
    }

    /// Registers a [When] step definition.
    ///
    /// # Errors
    ///
    /// If the `pattern` fails to compile.
    ///
    /// [When]: https://cucumber.io/docs/gherkin/reference#when
    #[track_caller]
    pub fn when<F>(
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
        self.step(pattern, handler)
    }

    /// Registers a [Then] step definition.
    ///
    /// # Errors
    ///
    /// If the `pattern` fails to compile.
    ///
    /// [Then]: https://cucumber.io/docs/gherkin/reference#then
    #[track_caller]
    pub fn then<F>(
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
        self.step(pattern, handler)
    }

    /// Registers a [`Phase::BeforeScenario`] hook.
    #[track_caller]
    pub fn before<F>(&mut self, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut World) -> LocalBoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        _ = self.hooks.register(Phase::BeforeScenario, handler);
        self
    }

    /// Registers a [`Phase::AfterScenario`] hook.
    #[track_caller]
    pub fn after<F>(&mut self, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut World) -> LocalBoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        _ = self.hooks.register(Phase::AfterScenario, handler);
        self
    }

    /// Registers a [`Phase::BeforeSuite`] hook.
    #[track_caller]
    pub fn before_all<F>(&mut self, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut World) -> LocalBoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        _ = self.hooks.register(Phase::BeforeSuite, handler);
        self
    }

    /// Registers a [`Phase::AfterSuite`] hook.
    #[track_caller]
    pub fn after_all<F>(&mut self, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut World) -> LocalBoxFuture<'a, anyhow::Result<()>>
            + Send
            + Sync
            + 'static,
    {
        _ = self.hooks.register(Phase::AfterSuite, handler);
        self
    }

    /// Registers a hook of the given `phase` configured with [`HookOptions`].
    ///
    /// # Errors
    ///
    /// If the [`HookOptions::tags`] is not a valid tag expression.
    #[track_caller]
    pub fn hook<F>(
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
        _ = self.hooks.register_with(phase, options, handler)?;
        Ok(self)
    }
}

/// Process-wide default [`Support`]s, one per world type.
static DEFAULTS: Lazy<Mutex<HashMap<TypeId, Box<dyn Any + Send>>>> =
    Lazy::new(Mutex::default);

/// Runs the given function on the process-wide default [`Support`] of the
/// `World` type, creating it if needed.
///
/// The default [`Support`] stays locked while `f` runs, so `f` must not call
/// [`with_default()`] or [`take_default()`] itself.
pub fn with_default<World: 'static, R>(
    f: impl FnOnce(&mut Support<World>) -> R,
) -> R {
    let mut defaults = DEFAULTS.lock().unwrap_or_else(PoisonError::into_inner);
    let support = defaults
        .entry(TypeId::of::<World>())
        .or_insert_with(|| Box::new(Support::<World>::new()))
        .downcast_mut::<Support<World>>()
        // Entries are keyed by the `TypeId` of their world.
        .unwrap_or_else(|| unreachable!());
    f(support)
}

/// Takes the process-wide default [`Support`] of the `World` type, leaving
/// an empty one in its place.
#[must_use]
pub fn take_default<World: 'static>() -> Support<World> {
    DEFAULTS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .remove(&TypeId::of::<World>())
        .and_then(|b| b.downcast::<Support<World>>().ok())
        .map(|b| *b)
        .unwrap_or_default()
}
