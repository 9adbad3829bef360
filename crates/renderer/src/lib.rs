//! Renderer crate for triquad.
//!
//! Draws a full-screen quad through a GL-shaped [`GraphicsContext`] and
//! animates it with `u_time`/`u_resolution` uniforms. The overall flow is:
//!
//! ```text
//!   CLI / triquad
//!          │ RendererConfig
//!          ▼
//!   window::run ──▶ Renderer::setup ──▶ winit event loop ──▶ Renderer::tick()
//!                        │                                      │
//!                        └─▶ load_pair ─▶ build_program          └─▶ flush()
//! ```
//!
//! [`Renderer`] only talks to the [`GraphicsContext`] trait; [`WgpuGraphics`]
//! implements it on a wgpu surface, compiling the GLSL stages with naga so
//! attributes and uniforms can be looked up by name.

mod bootstrap;
mod frame;
mod geometry;
mod gl;
mod gpu;
mod program;
mod types;
mod window;

#[cfg(test)]
mod testing;

pub use bootstrap::{Renderer, RendererSpec, SetupError, SetupReport};
pub use frame::{FrameLoop, UniformBindings, RESOLUTION_UNIFORM, TIME_UNIFORM};
pub use geometry::{
    upload_attribute, AttributeBinding, VertexBuffer, COLOR_ATTRIBUTE, POSITION_ATTRIBUTE,
    QUAD_COLORS, QUAD_COLOR_BUFFER, QUAD_POSITIONS, QUAD_POSITION_BUFFER, QUAD_VERTEX_COUNT,
};
pub use gl::{
    AttribLocation, BufferId, ClearMask, FrameError, GraphicsContext, Primitive, ProgramId,
    ShaderId, ShaderStage, SurfaceSize, UniformLocation,
};
pub use gpu::WgpuGraphics;
pub use program::{
    build_program, compile_stage, Diagnostic, DiagnosticOrigin, FailurePolicy, ProgramBuild,
    StageOutcome,
};
pub use types::{RendererConfig, DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER};
pub use window::run;
