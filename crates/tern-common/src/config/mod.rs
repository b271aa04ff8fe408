//! Configuration for the TernDB execution engine.

mod engine;

pub use engine::EngineConfig;
