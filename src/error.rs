// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Crate-level [`Error`] consolidating every failure this crate reports.

use derive_more::{Display, Error, From};

use crate::{data_table, hook, step, tag};

/// Alias for a [`Result`] with the error type [`Error`].
///
/// [`Result`]: std::result::Result
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Any error of this crate.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// Malformed tag expression.
    #[display("{_0}")]
    TagFilter(tag::TagFilterError),

    /// Structural or conversion error of a [`DataTable`].
    ///
    /// [`DataTable`]: crate::DataTable
    #[display("{_0}")]
    DataTable(data_table::DataTableError),

    /// Step pattern failed to compile.
    #[display("{_0}")]
    Pattern(step::PatternError),

    /// Step lookup or execution failure.
    #[display("{_0}")]
    Step(step::StepError),

    /// Hook registration failure.
    #[display("{_0}")]
    HookConfig(hook::ConfigError),

    /// Hook execution failure.
    #[display("{_0}")]
    Hook(hook::HookError),
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn keeps_message_and_source() {
        let err: Error = tag::TagFilter::new("@a and").unwrap_err().into();

        assert!(err.to_string().starts_with("Failed to parse tag expression"));
        assert!(err.source().is_some());
    }

    #[test]
    fn wraps_step_failures() {
        let err = Error::from(step::StepError::Undefined {
            text: "I fly".into(),
        });

        assert_eq!(err.to_string(), "No step definition matches `I fly`");
    }
}
