pub mod client;
pub mod config;
pub mod error;
pub mod topo;

pub use client::*;
pub use config::*;
pub use error::*;
pub use topo::*;
