//! Builds areas (polygons with tags) out of closed OSM ways and multipolygon relations.

pub mod assembler;
pub mod config;
pub mod data;
pub mod errors;
pub mod etl;
pub mod geometry;
pub mod output;
pub mod problem;

pub use assembler::config::AssemblerConfig;
pub use assembler::stats::AreaStats;
pub use assembler::AreaAssembler;
pub use data::area::Area;
pub use output::{OutputBuffer, OutputSink};
pub use problem::ProblemReporter;
