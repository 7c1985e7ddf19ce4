//! Grid trading bots: spot and contract grids, their sub-orders, positions
//! and margin, plus the public sizing calculators.

pub mod operations;
pub mod requests;
pub mod responses;

#[cfg(feature = "http")]
mod rest;

pub use requests::*;
pub use responses::*;
