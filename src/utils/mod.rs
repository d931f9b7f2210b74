//! Utility modules.

pub mod command;
