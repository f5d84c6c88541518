pub mod buffer;
pub mod record;
pub mod store;
