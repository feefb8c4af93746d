//! A simplified version of a general-purpose matrix library, containing just
//! the operations and trait implementations we need.

use std::{
    fmt::{self, Debug, Display, Formatter},
    ops::{Index, IndexMut},
};

/// A general-purpose MxN matrix laid out row by row in memory.
///
/// Every row has the same length for the lifetime of the matrix.
#[derive(Clone, PartialEq)]
pub struct Matrix<T> {
    cells: Box<[T]>,
    columns: usize,
    rows: usize,
}

impl<T> Matrix<T> {
    /// Create a new [`Matrix`] by invoking some `fn(row, column) -> T` function
    /// for each cell.
    pub fn init<F>(rows: usize, columns: usize, mut get_cell: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let mut cells = Vec::with_capacity(columns * rows);

        for row in 0..rows {
            for column in 0..columns {
                cells.push(get_cell(row, column));
            }
        }

        Matrix {
            cells: cells.into_boxed_slice(),
            columns,
            rows,
        }
    }

    /// A version of [`Matrix::init()`] which lets you initialize a matrix using
    /// a function which may fail.
    pub fn try_init<F, E>(
        rows: usize,
        columns: usize,
        mut get_cell: F,
    ) -> Result<Self, E>
    where
        F: FnMut(usize, usize) -> Result<T, E>,
    {
        let mut cells = Vec::with_capacity(columns * rows);

        for row in 0..rows {
            for column in 0..columns {
                cells.push(get_cell(row, column)?);
            }
        }

        Ok(Matrix {
            cells: cells.into_boxed_slice(),
            columns,
            rows,
        })
    }

    /// Create a matrix from a list of rows, rejecting ragged input.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, RaggedRows> {
        let columns = rows.first().map(Vec::len).unwrap_or(0);

        if let Some((row, r)) =
            rows.iter().enumerate().find(|(_, r)| r.len() != columns)
        {
            return Err(RaggedRows {
                row,
                expected: columns,
                found: r.len(),
            });
        }

        let num_rows = rows.len();
        let cells: Vec<T> = rows.into_iter().flatten().collect();

        Ok(Matrix {
            cells: cells.into_boxed_slice(),
            columns,
            rows: num_rows,
        })
    }

    pub fn num_rows(&self) -> usize { self.rows }

    pub fn num_columns(&self) -> usize { self.columns }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.cells.chunks_exact(self.columns.max(1)).take(self.rows)
    }

    pub fn row(&self, row: usize) -> &[T] {
        assert!(row < self.rows, "Row index out of bounds");
        &self.cells[row * self.columns..(row + 1) * self.columns]
    }

    /// The entries of a single column, top to bottom.
    pub fn column(&self, column: usize) -> impl Iterator<Item = &T> + '_ {
        assert!(column < self.columns, "Column index out of bounds");
        self.rows().map(move |row| &row[column])
    }

    fn index(&self, row: usize, column: usize) -> Option<usize> {
        if row < self.rows && column < self.columns {
            Some(row * self.columns + column)
        } else {
            None
        }
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&T> {
        self.index(row, column).map(|ix| &self.cells[ix])
    }

    pub fn get_mut(&mut self, row: usize, column: usize) -> Option<&mut T> {
        let ix = self.index(row, column)?;
        Some(&mut self.cells[ix])
    }

    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &T)> + '_ {
        let columns = self.columns;

        self.cells
            .iter()
            .enumerate()
            .map(move |(ix, value)| (ix / columns, ix % columns, value))
    }
}

/// The error returned by [`Matrix::from_rows()`] when rows have different
/// lengths.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
#[error("row {row} has {found} entries, but {expected} were expected")]
pub struct RaggedRows {
    pub row: usize,
    pub expected: usize,
    pub found: usize,
}

impl<T, const C: usize, const R: usize> From<[[T; C]; R]> for Matrix<T> {
    fn from(other: [[T; C]; R]) -> Self {
        let cells: Vec<T> = other.into_iter().flatten().collect();

        Matrix {
            cells: cells.into_boxed_slice(),
            columns: C,
            rows: R,
        }
    }
}

impl<T: Debug> Debug for Matrix<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows()).finish()
    }
}

/// Prints one row per line with tab-separated entries, wrapped in square
/// brackets.
impl<T: Display> Display for Matrix<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;

        for row in self.rows() {
            for cell in row {
                write!(f, "{}\t", cell)?;
            }
            writeln!(f)?;
        }

        write!(f, "]")
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (row, column): (usize, usize)) -> &Self::Output {
        assert!(column < self.columns, "Column index out of bounds");
        assert!(row < self.rows, "Row index out of bounds");

        self.get(row, column)
            .expect("We've already done bounds checks")
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(
        &mut self,
        (row, column): (usize, usize),
    ) -> &mut Self::Output {
        assert!(column < self.columns, "Column index out of bounds");
        assert!(row < self.rows, "Row index out of bounds");

        self.get_mut(row, column)
            .expect("We've already done bounds checks")
    }
}
