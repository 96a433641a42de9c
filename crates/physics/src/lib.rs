//! Heightfield physics: ground-following movement and terrain ray picking.
//!
//! There is no general collision here. Everything resolves against a
//! [`terrain::Ground`] height query.

pub mod movement;
pub mod raycast;

pub use movement::*;
pub use raycast::*;
