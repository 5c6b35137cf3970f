//! Conformance validators.
//!
//! - [`algebra`] checks the live projector algebra, with no file I/O.
//! - [`kernel`] checks kernel text, rendered on the fly or read from disk.

pub mod algebra;
pub mod kernel;
