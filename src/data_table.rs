// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Relational view over a step's data table.
//!
//! [`DataTable`] wraps an immutable row-major matrix of strings. Every view
//! ([`rows()`], [`hashes()`], ...) is computed from the original matrix and
//! never mutates it.
//!
//! [`hashes()`]: DataTable::hashes()
//! [`rows()`]: DataTable::rows()

use std::{collections::HashMap, fmt, sync::Arc};

use derive_more::{Display, Error};
use itertools::Itertools as _;
use linked_hash_map::LinkedHashMap;

/// Error of deriving a view from a [`DataTable`].
#[derive(Clone, Debug, Display, Error)]
pub enum DataTableError {
    /// [`DataTable::rows_hash()`] met a row not having exactly 2 columns.
    #[display(
        "Expected every row to have exactly 2 columns, but row {row} has \
         {width}"
    )]
    NotTwoColumns {
        /// Index of the offending row.
        row: usize,

        /// Actual width of the offending row.
        width: usize,
    },

    /// [`DataTable::columns()`] was asked for columns absent in the header.
    #[display("Unknown columns: {}", missing.join(", "))]
    UnknownColumns {
        /// Names not present in the header.
        #[error(not(source))]
        missing: Vec<String>,
    },

    /// Per-column conversion of a cell failed.
    #[display("Cannot convert `{value}` in column `{column}`: {message}")]
    Conversion {
        /// Column of the cell.
        #[error(not(source))]
        column: String,

        /// Raw cell value.
        value: String,

        /// Description of the conversion failure.
        message: String,
    },
}

/// Typed value of a [`DataTable`] cell, produced by [`Converters`].
#[derive(Clone, Debug, Display, PartialEq)]
pub enum Cell {
    /// Unconverted text.
    #[display("{_0}")]
    Text(String),

    /// Integer number.
    #[display("{_0}")]
    Int(i64),

    /// Floating point number.
    #[display("{_0}")]
    Float(f64),

    /// Boolean flag.
    #[display("{_0}")]
    Bool(bool),
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl Cell {
    /// Parses a [`Cell::Int`].
    ///
    /// # Errors
    ///
    /// If `raw` is not an integer.
    pub fn int(raw: &str) -> anyhow::Result<Self> {
        Ok(Self::Int(raw.trim().parse()?))
    }

    /// Parses a [`Cell::Float`].
    ///
    /// # Errors
    ///
    /// If `raw` is not a number.
    pub fn float(raw: &str) -> anyhow::Result<Self> {
        Ok(Self::Float(raw.trim().parse()?))
    }

    /// Parses a [`Cell::Bool`] out of `true`/`false`/`yes`/`no`.
    ///
    /// # Errors
    ///
    /// If `raw` is none of the above (case-insensitive).
    pub fn bool(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Ok(Self::Bool(true)),
            "false" | "no" => Ok(Self::Bool(false)),
            other => Err(anyhow::anyhow!("`{other}` is not a boolean")),
        }
    }
}

/// Conversion function applied to cells of a single column.
pub type Converter<T> = Arc<dyn Fn(&str) -> anyhow::Result<T> + Send + Sync>;

/// Per-column conversions used by [`DataTable::typed_raw()`] and
/// [`DataTable::typed_hashes()`].
///
/// Columns without a [`Converter`] are passed through as is (via
/// [`From<String>`]).
pub struct Converters<T> {
    /// [`Converter`]s by column name.
    by_column: HashMap<String, Converter<T>>,
}

// Implemented manually to omit redundant `T: Default` trait bound, imposed by
// `#[derive(Default)]`.
impl<T> Default for Converters<T> {
    fn default() -> Self {
        Self { by_column: HashMap::new() }
    }
}

// Implemented manually to omit redundant `T: Clone` trait bound, imposed by
// `#[derive(Clone)]`.
impl<T> Clone for Converters<T> {
    fn clone(&self) -> Self {
        Self { by_column: self.by_column.clone() }
    }
}

impl<T> fmt::Debug for Converters<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converters")
            .field("columns", &self.by_column.keys().sorted().collect_vec())
            .finish()
    }
}

impl<T: From<String>> Converters<T> {
    /// Creates empty [`Converters`] passing every cell through.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the [`Converter`] of the given `column`.
    #[must_use]
    pub fn column<F>(mut self, column: impl Into<String>, convert: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        _ = self.by_column.insert(column.into(), Arc::new(convert));
        self
    }

    /// Converts the given `value` of the `column`.
    fn apply(&self, column: &str, value: &str) -> Result<T, DataTableError> {
        self.by_column.get(column).map_or_else(
            || Ok(T::from(value.to_owned())),
            |convert| {
                convert(value).map_err(|e| DataTableError::Conversion {
                    column: column.to_owned(),
                    value: value.to_owned(),
                    message: e.to_string(),
                })
            },
        )
    }
}

/// Data table of a Gherkin step.
///
/// # Example
///
/// ```rust
/// use cuke_core::DataTable;
///
/// let table = DataTable::from(vec![
///     vec!["id", "name"],
///     vec!["1", "Ann"],
///     vec!["2", "Bo"],
/// ]);
///
/// let hashes = table.hashes();
/// assert_eq!(hashes[0]["name"], "Ann");
/// assert_eq!(
///     table.transpose().raw(),
///     vec![vec!["id", "1", "2"], vec!["name", "Ann", "Bo"]],
/// );
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct DataTable {
    /// Row-major cells, the first row being the header.
    rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Creates a new [`DataTable`] out of the given rows.
    #[must_use]
    pub const fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Returns a deep copy of the whole matrix, header included.
    #[must_use]
    pub fn raw(&self) -> Vec<Vec<String>> {
        self.rows.clone()
    }

    /// Returns the header row, if any.
    #[must_use]
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// Returns a copy of all the rows except the header.
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.rows.iter().skip(1).cloned().collect()
    }

    /// Zips the header with each body row.
    ///
    /// Mappings preserve the column order of the header.
    #[must_use]
    pub fn hashes(&self) -> Vec<LinkedHashMap<String, String>> {
        let Some((header, body)) = self.rows.split_first() else {
            return Vec::new();
        };
        body.iter()
            .map(|row| {
                header.iter().cloned().zip(row.iter().cloned()).collect()
            })
            .collect()
    }

    /// Builds a single mapping out of a two-column table, the first column
    /// being the keys.
    ///
    /// # Errors
    ///
    /// With [`DataTableError::NotTwoColumns`] if any row has other than 2
    /// columns.
    pub fn rows_hash(
        &self,
    ) -> Result<LinkedHashMap<String, String>, DataTableError> {
        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| match cells.as_slice() {
                [key, value] => Ok((key.clone(), value.clone())),
                _ => Err(DataTableError::NotTwoColumns {
                    row,
                    width: cells.len(),
                }),
            })
            .collect()
    }

    /// Returns a new [`DataTable`] with rows and columns swapped.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let width = self.width();
        Self::new(
            (0..width)
                .map(|col| {
                    self.rows
                        .iter()
                        .filter_map(|row| row.get(col).cloned())
                        .collect()
                })
                .collect(),
        )
    }

    /// Returns a new [`DataTable`] containing only the named columns, in the
    /// given order.
    ///
    /// # Errors
    ///
    /// With [`DataTableError::UnknownColumns`] listing every name absent in
    /// the header.
    pub fn columns<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Self, DataTableError> {
        let header = self.header().unwrap_or_default();
        let (indices, missing): (Vec<_>, Vec<_>) = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                header
                    .iter()
                    .position(|h| h == name)
                    .ok_or_else(|| name.to_owned())
            })
            .partition_result();
        if !missing.is_empty() {
            return Err(DataTableError::UnknownColumns { missing });
        }

        Ok(Self::new(
            self.rows
                .iter()
                .map(|row| {
                    indices
                        .iter()
                        .filter_map(|&i| row.get(i).cloned())
                        .collect()
                })
                .collect(),
        ))
    }

    /// Like [`raw()`], but converts the body cells column-wise with the given
    /// [`Converters`]. The header row is converted via [`From<String>`].
    ///
    /// # Errors
    ///
    /// With [`DataTableError::Conversion`] on the first failed conversion.
    ///
    /// [`raw()`]: Self::raw()
    pub fn typed_raw<T: From<String>>(
        &self,
        converters: &Converters<T>,
    ) -> Result<Vec<Vec<T>>, DataTableError> {
        let Some((header, body)) = self.rows.split_first() else {
            return Ok(Vec::new());
        };
        let head: Vec<T> = header.iter().cloned().map(T::from).collect();
        let body = body.iter().map(|row| {
            header
                .iter()
                .zip(row)
                .map(|(col, value)| converters.apply(col, value))
                .collect::<Result<Vec<_>, _>>()
        });
        std::iter::once(Ok(head)).chain(body).collect()
    }

    /// Like [`hashes()`], but converts values column-wise with the given
    /// [`Converters`].
    ///
    /// # Errors
    ///
    /// With [`DataTableError::Conversion`] on the first failed conversion.
    ///
    /// [`hashes()`]: Self::hashes()
    pub fn typed_hashes<T: From<String>>(
        &self,
        converters: &Converters<T>,
    ) -> Result<Vec<LinkedHashMap<String, T>>, DataTableError> {
        let Some((header, body)) = self.rows.split_first() else {
            return Ok(Vec::new());
        };
        body.iter()
            .map(|row| {
                header
                    .iter()
                    .zip(row)
                    .map(|(col, value)| {
                        converters.apply(col, value).map(|v| (col.clone(), v))
                    })
                    .collect::<Result<LinkedHashMap<_, _>, _>>()
            })
            .collect()
    }

    /// Returns a new [`DataTable`] with every cell mapped through `f`.
    #[must_use]
    pub fn map_cells(&self, mut f: impl FnMut(&str) -> String) -> Self {
        Self::new(
            self.rows
                .iter()
                .map(|row| row.iter().map(|c| f(c)).collect())
                .collect(),
        )
    }

    /// Checks if the table has no rows at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows, header included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns of the header (`0` if empty).
    #[must_use]
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }
}

impl From<Vec<Vec<&str>>> for DataTable {
    fn from(rows: Vec<Vec<&str>>) -> Self {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(str::to_owned).collect())
                .collect(),
        )
    }
}

impl From<Vec<Vec<String>>> for DataTable {
    fn from(rows: Vec<Vec<String>>) -> Self {
        Self::new(rows)
    }
}

impl From<&gherkin::Table> for DataTable {
    fn from(table: &gherkin::Table) -> Self {
        Self::new(table.rows.clone())
    }
}

impl fmt::Display for DataTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "| {} |", row.join(" | "))?;
        }
        Ok(())
    }
}
