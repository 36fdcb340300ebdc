pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod io;
pub mod relay;
pub mod test_utils;

pub use application::{analyze, AnalysisResult};
pub use domain::*;
