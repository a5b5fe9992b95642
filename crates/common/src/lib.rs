//! Shared types, error definitions, and utilities used across all herald crates.

pub mod error;
pub mod services;
pub mod types;

pub use {
    error::{Error, FromMessage, Result},
    services::{Services, ServicesBuilder},
    types::Reply,
};
