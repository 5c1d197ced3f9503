pub mod cli;
pub mod config;
pub mod export;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod sessions;
pub mod source;
pub mod stats;
pub mod util;
