pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod layouts;
pub mod observer;
pub mod rng;
pub mod types;
pub mod world;
