//! Type definitions

pub mod decision;
pub mod responses;

pub use decision::*;
pub use responses::*;
