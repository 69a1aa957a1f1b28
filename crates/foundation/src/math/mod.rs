pub mod mat4;
pub mod mercator;
pub mod precision;
pub mod vec;

pub use mat4::*;
pub use mercator::*;
pub use precision::*;
pub use vec::*;
