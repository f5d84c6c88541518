// Declare the modules to re-export
pub mod signals;

#[cfg(feature = "connections")]
pub mod connections;

// Re-export everything
pub use signals::buffer::*;
pub use signals::record::*;
pub use signals::store::*;
