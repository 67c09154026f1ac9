pub mod config;
pub mod coordinator;
pub mod events;
pub mod groups;
pub mod reset;
pub mod styles;
pub mod viewport;

#[cfg(test)]
mod test_support;

pub use config::*;
pub use coordinator::*;
pub use events::*;
pub use groups::*;
pub use reset::*;
pub use styles::*;
pub use viewport::*;
