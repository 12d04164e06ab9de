pub mod charts;
pub mod config;
pub mod data;
pub mod filter;
pub mod logging;
pub mod pipeline;
pub mod remote;
pub mod render;
pub mod report;
pub mod style;
