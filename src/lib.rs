pub mod adapter;
pub mod checkpoint;
pub mod clean;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod providers;
pub mod queue;
pub mod shutdown;
pub mod vocabulary;
pub mod worker;
pub mod writer;
