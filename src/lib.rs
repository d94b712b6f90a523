pub mod geometry;
pub mod placement;
pub mod error;
pub mod board;
pub mod word_database;
pub mod scoring;
pub mod slot;
pub mod grid;
pub mod workspace;
pub mod generator;
pub mod queue;
pub mod settings;
pub mod traits;
pub mod runner;
