//! Listing sources, each producing an in-memory guide.

pub mod espn;
pub mod zap2it;
