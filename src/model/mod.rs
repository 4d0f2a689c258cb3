pub mod action;
pub mod common;
pub mod filter;
pub mod member;
pub mod motion;
pub mod reference;

pub use action::*;
pub use common::*;
pub use filter::*;
pub use member::*;
pub use motion::*;
pub use reference::*;
