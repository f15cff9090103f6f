//! shush cli library: exposes modules for unit and integration tests.

pub mod app;
pub mod commands;
