// Library exports for chartflow

pub mod csv_reader;
pub mod render;

// Pipeline phases
pub mod error;
pub mod record;
pub mod ir;
pub mod extract;
pub mod scale;
pub mod path;
pub mod projection;
pub mod topology;
pub mod compiler;
pub mod transition;
pub mod scene;
pub mod viewport;
pub mod pipeline;
pub mod config;
