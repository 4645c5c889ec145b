//! Data models

pub mod event;
pub mod decision;
pub mod selection;

pub use event::*;
pub use decision::*;
pub use selection::*;
