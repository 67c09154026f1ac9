pub mod arcs;
pub mod dataset;
pub mod layer;

pub use arcs::*;
pub use dataset::*;
pub use layer::*;
