//! Core types and configuration for unibin
//!
//! This crate provides the foundational types shared by the slice parser.

pub mod error;
pub mod types;
pub mod config;

pub use error::{Error, Result};
pub use types::*;
pub use config::ParserConfig;
