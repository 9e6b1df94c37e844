pub mod config;
pub mod dates;
pub mod fetch;
pub mod frame;
pub mod humanize;
pub mod observability;
pub mod orchestrator;
pub mod pipeline;
pub mod sources;
pub mod storage;
