// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Placeholder substitution of a single [`Examples`] row.
//!
//! [`Examples`]: gherkin::Examples

use itertools::Itertools as _;

/// Mapping of `<column>` placeholders to the cell values of one [`Examples`]
/// row.
///
/// [`Examples`]: gherkin::Examples
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ExampleValues {
    /// `<column>` tokens, in header order.
    keys: Vec<String>,

    /// Cell values, matching `keys` one-to-one.
    values: Vec<String>,
}

impl ExampleValues {
    /// Zips the given `header` with a body `row`.
    ///
    /// Extra cells on either side are ignored.
    #[must_use]
    pub fn new<S: AsRef<str>>(header: &[S], row: &[S]) -> Self {
        let (keys, values) = header
            .iter()
            .zip(row)
            .map(|(k, v)| (format!("<{}>", k.as_ref()), v.as_ref().to_owned()))
            .unzip();
        Self { keys, values }
    }

    /// Checks whether there is nothing to substitute.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the value of the given `column`, if any.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.keys
            .iter()
            .position(|k| k.get(1..k.len() - 1) == Some(column))
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    /// Replaces every `<column>` occurrence in `text` with its value.
    ///
    /// This is a literal substring replacement: no escaping is recognized and
    /// unknown placeholders are left verbatim. Columns are applied in header
    /// order, so a value containing a later `<column>` token is substituted
    /// too.
    #[must_use]
    pub fn insert_values(&self, text: &str) -> String {
        self.keys
            .iter()
            .zip(&self.values)
            .fold(text.to_owned(), |acc, (k, v)| {
                if acc.contains(k.as_str()) {
                    acc.replace(k.as_str(), v)
                } else {
                    acc
                }
            })
    }

    /// Renders this row as `<a> = 1, <b> = 2`.
    #[must_use]
    pub fn as_string(&self) -> String {
        self.keys
            .iter()
            .zip(&self.values)
            .map(|(k, v)| format!("{k} = {v}"))
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::ExampleValues;

    fn values() -> ExampleValues {
        ExampleValues::new(&["a", "b", "sum"], &["1", "2", "3"])
    }

    #[test]
    fn replaces_every_occurrence() {
        assert_eq!(
            values().insert_values("<a> + <b> = <sum>, again <a>"),
            "1 + 2 = 3, again 1",
        );
    }

    #[test]
    fn leaves_unknown_placeholders_verbatim() {
        assert_eq!(values().insert_values("<a> and <c>"), "1 and <c>");
    }

    #[test]
    fn ignores_quoting_context() {
        assert_eq!(
            values().insert_values(r#""<a>" '\<b>' <<sum>>"#),
            r#""1" '\2' <3>"#,
        );
    }

    #[test]
    fn looks_up_by_column_name() {
        assert_eq!(values().get("sum"), Some("3"));
        assert_eq!(values().get("<sum>"), None);
        assert_eq!(values().get("missing"), None);
    }

    #[test]
    fn renders_row() {
        assert_eq!(values().as_string(), "<a> = 1, <b> = 2, <sum> = 3");
        assert!(ExampleValues::default().is_empty());
        assert_eq!(ExampleValues::default().insert_values("<a>"), "<a>");
    }
}
