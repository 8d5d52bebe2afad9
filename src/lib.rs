pub mod app;
pub mod config;
pub mod domain;
pub mod ena;
pub mod error;
pub mod eutils;
pub mod interrupt;
pub mod output;
pub mod pipeline;
pub mod prompt;
pub mod rate_limit;
pub mod transfer;
