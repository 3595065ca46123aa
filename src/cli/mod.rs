//! Command-line interface definitions

mod commands;

pub use commands::{
    Action, BenchmarkOptions, Commands, ConfigOptions, StartOptions, TestConnectionOptions,
};
