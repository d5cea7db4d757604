//! Schema module - Catalogue, layout and configuration types for the packing search.

mod catalogue;
mod evolution;
mod job;
mod layout;

pub use catalogue::*;
pub use evolution::*;
pub use job::*;
pub use layout::*;
