pub mod grid_binary;
pub mod topology;

pub use grid_binary::*;
pub use topology::*;
