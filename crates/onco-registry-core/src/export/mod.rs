//! Export functionality for registry datasets.

mod dataset;

pub use dataset::*;
