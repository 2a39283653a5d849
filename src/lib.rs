pub mod build;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod remote;
pub mod server;
pub mod tools;
pub mod ui;
pub mod warning;

pub use error::{Result, SitePublishError};
