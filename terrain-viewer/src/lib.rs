//! Interactive terrain viewer with distance measurement and rover path
//! planning over slope and hazard rasters.

pub mod engine;
pub mod error;
pub mod rpc;
pub mod tools;

pub use engine::core::app_setup::create_app;
