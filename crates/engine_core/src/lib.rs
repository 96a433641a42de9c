//! Core engine types shared by every other crate in the workspace.
//!
//! This crate provides the foundational pieces the terrain, physics and
//! renderer crates agree on:
//! - Transform and entity components
//! - Lights, camera and projection
//! - Frame timing
//! - CPU-side mesh data and asset handles

pub mod assets;
pub mod camera;
pub mod components;
pub mod error;
pub mod mesh;
pub mod time;
pub mod transform;

pub use assets::*;
pub use camera::*;
pub use components::*;
pub use error::*;
pub use mesh::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Vec2, Vec3, Vec4};
pub use hecs::{Entity as EntityId, World};
