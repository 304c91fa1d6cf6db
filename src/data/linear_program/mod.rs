//! # Representing mixed integer programs
//!
//! A `SparseModel` holds the rows and columns of a program, a `BlockPartition` splits it into
//! blocks and a `SolutionReport` describes the outcome of a solve.
pub mod elements;
pub mod model;
pub mod partition;
pub mod solution;
