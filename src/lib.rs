//! # A block structured mixed integer program solver
//!
//! Models are stored in sparse form, optionally partitioned into blocks that only interact through
//! linking rows, and solved with branch-and-price: each block is solved on its own with the
//! simplex method and local branch-and-bound, and the search branches on the variables of linking
//! rows that the combined block solutions violate.
#![warn(missing_docs)]

pub mod algorithm;
pub mod data;
pub mod error;
pub mod settings;

#[cfg(test)]
mod tests;
