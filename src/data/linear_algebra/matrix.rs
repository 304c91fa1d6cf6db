//! # Matrix implementations
//!
//! Compressed sparse storage. `ColumnMajor` is the bulk-load layout of a constraint matrix: the
//! entries of column `j` are found at positions `column_start[j]..column_start[j + 1]`, sorted by
//! row index. `RowMajor` is its transpose and is derived once.
use std::iter::Zip;
use std::slice::Iter;

use itertools::Itertools;

use crate::data::linear_algebra::SparseTuple;

/// Iterator over the `(index, value)` pairs of one major line of a compressed matrix.
pub type MajorIter<'a> = Zip<std::iter::Copied<Iter<'a, usize>>, std::iter::Copied<Iter<'a, f64>>>;

/// Compressed sparse column storage.
#[derive(PartialEq, Debug, Clone)]
pub struct ColumnMajor {
    /// Offsets into `row_index` and `value`, one more than the number of columns.
    column_start: Vec<usize>,
    /// Row index of each stored value, strictly increasing within each column.
    row_index: Vec<usize>,
    value: Vec<f64>,
    nr_rows: usize,
}

impl ColumnMajor {
    /// Create a matrix from columns that are each sorted by row index.
    ///
    /// # Arguments
    ///
    /// * `columns`: One `Vec` per column with `(row, value)` tuples, sorted and without duplicate
    /// rows.
    /// * `nr_rows`: Number of rows of the matrix, all row indices should be smaller.
    pub fn from_columns(columns: Vec<Vec<SparseTuple<f64>>>, nr_rows: usize) -> Self {
        debug_assert!(columns.iter().all(|column| column.iter().map(|&(i, _)| i).tuple_windows().all(|(a, b)| a < b)));
        debug_assert!(columns.iter().flatten().all(|&(i, _)| i < nr_rows));

        let nr_non_zeros = columns.iter().map(Vec::len).sum();
        let mut column_start = Vec::with_capacity(columns.len() + 1);
        let mut row_index = Vec::with_capacity(nr_non_zeros);
        let mut value = Vec::with_capacity(nr_non_zeros);

        column_start.push(0);
        for column in columns {
            for (i, v) in column {
                row_index.push(i);
                value.push(v);
            }
            column_start.push(row_index.len());
        }

        Self { column_start, row_index, value, nr_rows }
    }

    /// All `(row, value)` tuples of column `j`.
    pub fn column(&self, j: usize) -> MajorIter<'_> {
        debug_assert!(j < self.nr_columns());

        let range = self.column_start[j]..self.column_start[j + 1];
        self.row_index[range.clone()].iter().copied().zip(self.value[range].iter().copied())
    }

    /// Row indices of the nonzero values of column `j`.
    pub fn column_rows(&self, j: usize) -> &[usize] {
        debug_assert!(j < self.nr_columns());

        &self.row_index[self.column_start[j]..self.column_start[j + 1]]
    }

    /// Value at coordinate (`i`, `j`), zero if not stored.
    ///
    /// Binary search within the index range of column `j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < self.nr_rows);
        debug_assert!(j < self.nr_columns());

        let start = self.column_start[j];
        match self.column_rows(j).binary_search(&i) {
            Ok(offset) => self.value[start + offset],
            Err(_) => 0_f64,
        }
    }

    /// Derive the row-major representation of the same matrix.
    pub fn transpose(&self) -> RowMajor {
        let mut rows = vec![Vec::new(); self.nr_rows];
        for j in 0..self.nr_columns() {
            for (i, v) in self.column(j) {
                // Columns are visited in order, so every row stays sorted
                rows[i].push((j, v));
            }
        }

        let mut row_start = Vec::with_capacity(self.nr_rows + 1);
        let mut column_index = Vec::with_capacity(self.nr_non_zeros());
        let mut value = Vec::with_capacity(self.nr_non_zeros());
        row_start.push(0);
        for row in rows {
            for (j, v) in row {
                column_index.push(j);
                value.push(v);
            }
            row_start.push(column_index.len());
        }

        RowMajor { row_start, column_index, value, nr_columns: self.nr_columns() }
    }

    /// Offsets of the columns into the value arrays.
    pub fn column_start(&self) -> &[usize] {
        &self.column_start
    }

    /// Row indices of all stored values, column after column.
    pub fn row_index(&self) -> &[usize] {
        &self.row_index
    }

    /// All stored values, column after column.
    pub fn values(&self) -> &[f64] {
        &self.value
    }

    /// Number of rows.
    pub fn nr_rows(&self) -> usize {
        self.nr_rows
    }

    /// Number of columns.
    pub fn nr_columns(&self) -> usize {
        self.column_start.len() - 1
    }

    /// Number of explicitly stored values.
    pub fn nr_non_zeros(&self) -> usize {
        self.value.len()
    }
}

/// Compressed sparse row storage.
#[derive(PartialEq, Debug, Clone)]
pub struct RowMajor {
    row_start: Vec<usize>,
    column_index: Vec<usize>,
    value: Vec<f64>,
    nr_columns: usize,
}

impl RowMajor {
    /// All `(column, value)` tuples of row `i`, sorted by column.
    pub fn row(&self, i: usize) -> MajorIter<'_> {
        debug_assert!(i < self.nr_rows());

        let range = self.row_start[i]..self.row_start[i + 1];
        self.column_index[range.clone()].iter().copied().zip(self.value[range].iter().copied())
    }

    /// Column indices of the nonzero values of row `i`.
    pub fn row_columns(&self, i: usize) -> &[usize] {
        debug_assert!(i < self.nr_rows());

        &self.column_index[self.row_start[i]..self.row_start[i + 1]]
    }

    /// Number of nonzero values in row `i`.
    pub fn row_len(&self, i: usize) -> usize {
        self.row_start[i + 1] - self.row_start[i]
    }

    /// Inner product of row `i` with a dense vector.
    pub fn row_activity(&self, i: usize, x: &[f64]) -> f64 {
        debug_assert_eq!(x.len(), self.nr_columns);

        self.row(i).map(|(j, v)| v * x[j]).sum()
    }

    /// Number of rows.
    pub fn nr_rows(&self) -> usize {
        self.row_start.len() - 1
    }

    /// Number of columns.
    pub fn nr_columns(&self) -> usize {
        self.nr_columns
    }
}
