pub mod batch;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod fetch;
pub mod infra;
pub mod output;
pub mod parser;
pub mod policy;
pub mod record;
pub mod services;
