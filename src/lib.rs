//! Background utility that passively observes global keyboard and mouse
//! activity and aggregates it into daily and cumulative statistics.
//! Raw event payloads are discarded right after classification; only
//! counters and key-frequency labels are ever stored.

pub mod cli;
pub mod daemon;
pub mod input_api;
pub mod utils;
