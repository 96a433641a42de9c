//! Rendering: batching front end plus a wgpu backend.

pub mod batch;
pub mod camera;
pub mod error;
pub mod frame;
pub mod master;
pub mod mesh;
pub mod obj;
pub mod pipeline;
pub mod renderer;
pub mod texture;
pub mod vertex;

pub use batch::*;
pub use camera::*;
pub use error::*;
pub use frame::*;
pub use master::*;
pub use mesh::*;
pub use obj::*;
pub use renderer::*;
pub use texture::*;
pub use vertex::*;
