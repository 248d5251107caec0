pub mod cli;
pub mod config;
pub mod data;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod sources;
pub mod store;
