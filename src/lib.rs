pub mod config;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod tag;
