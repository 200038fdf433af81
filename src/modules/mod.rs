pub mod cell;
pub mod config;
pub mod engine;
pub mod grid;
pub mod observer;
pub mod rng;
pub mod scheduler;
pub mod snapshot;
pub mod stats;
pub mod view;
