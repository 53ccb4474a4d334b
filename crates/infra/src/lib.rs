//! Infrastructure layer: background execution around the domain crates.

pub mod sweeper;
