//! featgate CLI library

pub mod commands;
