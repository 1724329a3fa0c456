//! Test utilities.
//!
//! Hand-written collaborator fakes with scripted replies, usable from unit
//! tests and downstream crates alike.

mod mocks;

pub use mocks::{CannedGenerator, FailingGenerator, StaticSearch};
