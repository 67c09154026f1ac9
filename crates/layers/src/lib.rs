pub mod group;
pub mod layer;
pub mod symbology;

pub use group::*;
pub use layer::*;
pub use symbology::*;
