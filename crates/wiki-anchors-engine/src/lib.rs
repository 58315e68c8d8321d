pub mod admin;
pub mod io;
pub mod remap;
pub mod store;

// Re-export key types for easier usage
pub use admin::{AdminError, Administration, DocumentLocks, RemapLimits};
pub use io::*;
pub use remap::*;
pub use store::*;
