//! Serde helpers for fields whose wire form differs from their Rust type.

pub mod duration;
pub mod string_u64;
