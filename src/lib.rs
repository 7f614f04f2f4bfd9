pub mod bracket;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod model;
pub mod service;
pub mod standings;
pub mod stats;
pub mod tiebreak;
pub mod tournament;
