//! # Linear algebra primitives
//!
//! Sparse storage for constraint matrices, in column-major order as models are loaded and in
//! row-major order for algorithms that look at one constraint at a time.
pub mod matrix;

/// A value with its index in a sparse vector: `(index, value)`.
pub type SparseTuple<F> = (usize, F);

/// Absolute tolerance used for pivots and zero tests.
pub const EPSILON: f64 = 1e-10;
