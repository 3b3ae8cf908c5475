pub mod app;
pub mod config;
pub mod convert;
pub mod coverage;
pub mod domain;
pub mod download;
pub mod error;
pub mod fs_util;
pub mod output;
pub mod registry;
pub mod resolve;
pub mod retrieve;
pub mod store;
pub mod urls;
pub mod year;
