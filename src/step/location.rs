// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Registration site of step definitions and hooks.

use std::panic;

use derive_more::{Debug, Display};

/// Location of a step definition or hook registration in Rust source code.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("{path}:{line}:{column}")]
pub struct Location {
    /// Path to the file where the registration happened.
    pub path: &'static str,

    /// Line of the file where the registration happened.
    pub line: u32,

    /// Column of the file where the registration happened.
    pub column: u32,
}

impl Location {
    /// Creates a new [`Location`] out of its parts.
    #[must_use]
    pub const fn new(path: &'static str, line: u32, column: u32) -> Self {
        Self { path, line, column }
    }

    /// Captures the [`Location`] of the caller.
    ///
    /// Propagates through any number of `#[track_caller]` frames, so
    /// registration methods report the user's code rather than this crate.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        let loc = panic::Location::caller();
        Self { path: loc.file(), line: loc.line(), column: loc.column() }
    }
}

#[cfg(test)]
mod tests {
    use super::Location;

    #[track_caller]
    fn registered_here() -> Location {
        Location::caller()
    }

    #[test]
    fn captures_caller() {
        let expected_line = line!() + 1;
        let loc = registered_here();

        assert_eq!(loc.line, expected_line);
        assert!(loc.path.ends_with("location.rs"), "{}", loc.path);
    }

    #[test]
    fn displays_as_path_line_column() {
        assert_eq!(
            Location::new("tests/steps.rs", 42, 10).to_string(),
            "tests/steps.rs:42:10",
        );
    }
}
