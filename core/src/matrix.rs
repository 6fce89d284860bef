//! Dense market x cell arrays.
//!
//! Rows are markets, columns are cells. Ids are mapped to positions once
//! per scenario run through an `IdIndex`; all later access is by position.

use std::collections::HashMap;

/// Id -> position mapping over an ordered list of ids.
#[derive(Debug, Clone, Default)]
pub struct IdIndex {
    ids:       Vec<i64>,
    positions: HashMap<i64, usize>,
}

impl IdIndex {
    pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
        let ids: Vec<i64> = ids.into_iter().collect();
        let positions = ids.iter().enumerate().map(|(pos, id)| (*id, pos)).collect();
        Self { ids, positions }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn position(&self, id: i64) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    pub fn id(&self, pos: usize) -> i64 {
        self.ids[pos]
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn contains(&self, id: i64) -> bool {
        self.positions.contains_key(&id)
    }
}

/// Row-major 2D array.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self { rows, cols, data: vec![value; rows * cols] }
    }
}

impl<T> Grid<T> {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = &T> + '_ {
        (0..self.rows).map(move |row| self.get(row, col))
    }

    pub fn values(&self) -> &[T] {
        &self.data
    }

    /// Element-wise combination of two grids of equal shape.
    pub fn zip_map<U, V>(&self, other: &Grid<U>, f: impl Fn(&T, &U) -> V) -> Grid<V> {
        assert_eq!(
            (self.rows, self.cols),
            (other.rows, other.cols),
            "grid shapes differ"
        );
        Grid {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&other.data).map(|(a, b)| f(a, b)).collect(),
        }
    }
}

impl Grid<f64> {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    pub fn column_sum(&self, col: usize) -> f64 {
        self.column(col).sum()
    }

    pub fn row_sum(&self, row: usize) -> f64 {
        self.row(row).iter().sum()
    }
}
