//! Projector algebra validators.

pub mod projectors;
