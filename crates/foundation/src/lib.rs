pub mod math;

// Foundation crate: small, well-tested numeric primitives only.
pub use math::*;
