//! Adapter implementations for registration ports.

pub mod memory;
