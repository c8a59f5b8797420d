//! Command handlers.

pub mod dump;
