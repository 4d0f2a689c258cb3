pub mod json_file;
pub mod memory;
pub mod persister;
pub mod traits;

pub use json_file::*;
pub use memory::*;
pub use persister::*;
pub use traits::*;
