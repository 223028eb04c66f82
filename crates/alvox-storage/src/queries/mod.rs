//! Query modules, one per table group.

pub mod masks;
pub mod rounds;
