// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step definitions: [`StepPattern`]s bound to handlers inside a
//! [`Collection`], matched against step text.

pub mod collection;
pub mod context;
pub mod error;
pub mod location;
pub mod pattern;
pub mod regex;

pub use self::{
    collection::{Collection, Definition, MatchPolicy, StepFn, StepMatch},
    context::{Arg, Context},
    error::{AmbiguousMatchError, PatternError, StepError},
    location::Location,
    pattern::{Matcher, ParameterType, StepPattern},
    regex::HashableRegex,
};
