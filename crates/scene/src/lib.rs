pub mod camera;
pub mod grid_record;
pub mod hit_set;

pub use camera::*;
pub use grid_record::*;
pub use hit_set::*;
