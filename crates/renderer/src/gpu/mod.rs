//! wgpu implementation of the [`GraphicsContext`](crate::gl::GraphicsContext) seam.
//!
//! - `context` owns wgpu instance/device/surface wiring and the depth
//!   attachment, and knows how to rebuild swapchain state on resize.
//! - `reflect` compiles GLSL through naga and extracts the named interface
//!   (attribute locations, uniform block members) that GL-style lookups need.
//! - `pipeline` holds per-program uniform buffers, bind groups and a render
//!   pipeline per vertex layout.
//! - `backend` glues everything together as [`WgpuGraphics`], recording draws
//!   and encoding them into one render pass at flush.

mod backend;
mod context;
mod pipeline;
mod reflect;

pub use backend::WgpuGraphics;
