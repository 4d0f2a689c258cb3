pub mod context;
pub mod filter_engine;
pub mod members;
pub mod motion_repository;
pub mod payload_diff;
pub mod sort;

pub use context::*;
pub use filter_engine::*;
pub use members::*;
pub use motion_repository::*;
pub use payload_diff::*;
pub use sort::*;
