pub mod import;
pub mod universe;

pub use import::*;
pub use universe::*;
