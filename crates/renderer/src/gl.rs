//! The graphics-context seam.
//!
//! [`GraphicsContext`] is a GL-shaped immediate-mode API: shader and program
//! objects are created and queried by handle, attributes and uniforms are
//! looked up by name, and draw commands are issued against whatever program
//! and buffers are currently bound. The wgpu backend in [`crate::gpu`]
//! implements it on top of a real surface; tests drive the same calls through
//! a recording context.

use std::fmt;

use thiserror::Error;

/// Pixel dimensions of the drawable surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_vec2(self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

impl fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Binding slot of a vertex attribute (`layout(location = N)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttribLocation(pub u32);

/// Backend-assigned reference to a uniform within one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Buffers affected by [`GraphicsContext::clear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
}

impl ClearMask {
    pub const COLOR: ClearMask = ClearMask {
        color: true,
        depth: false,
    };
    pub const DEPTH: ClearMask = ClearMask {
        color: false,
        depth: true,
    };
    pub const COLOR_DEPTH: ClearMask = ClearMask {
        color: true,
        depth: true,
    };

    pub fn is_empty(self) -> bool {
        !self.color && !self.depth
    }
}

impl std::ops::BitOr for ClearMask {
    type Output = ClearMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        ClearMask {
            color: self.color || rhs.color,
            depth: self.depth || rhs.depth,
        }
    }
}

/// Topology passed to [`GraphicsContext::draw_arrays`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Primitive {
    /// Independent triangles, three vertices each.
    #[default]
    Triangles,
}

/// Failure surfaced from [`GraphicsContext::flush`].
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// GL-style graphics context bound to one drawing surface.
///
/// Lookups that can miss return `Option`; everything else mirrors the GL
/// convention of recording an error internally and carrying on, so a broken
/// shader renders nothing rather than aborting the frame loop.
pub trait GraphicsContext {
    fn surface_size(&self) -> SurfaceSize;
    fn set_surface_size(&mut self, size: SurfaceSize);

    fn create_shader(&mut self, stage: ShaderStage) -> ShaderId;
    fn shader_source(&mut self, shader: ShaderId, source: &str);
    fn compile_shader(&mut self, shader: ShaderId);
    fn shader_compile_status(&self, shader: ShaderId) -> bool;
    fn shader_info_log(&self, shader: ShaderId) -> String;

    fn create_program(&mut self) -> ProgramId;
    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId);
    fn link_program(&mut self, program: ProgramId);
    fn program_link_status(&self, program: ProgramId) -> bool;
    fn program_info_log(&self, program: ProgramId) -> String;
    fn use_program(&mut self, program: ProgramId);

    fn create_buffer(&mut self) -> BufferId;
    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<AttribLocation>;
    fn bind_array_buffer(&mut self, buffer: BufferId);
    fn enable_vertex_attrib(&mut self, location: AttribLocation);
    /// Describes a tightly packed, non-normalized `f32` attribute read from
    /// the currently bound array buffer.
    fn vertex_attrib_pointer(&mut self, location: AttribLocation, components: u32);
    /// Uploads static data into the currently bound array buffer.
    fn buffer_data(&mut self, data: &[f32]);

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    fn uniform_1f(&mut self, location: UniformLocation, value: f32);
    fn uniform_2f(&mut self, location: UniformLocation, value: [f32; 2]);

    fn clear(&mut self, mask: ClearMask);
    fn draw_arrays(&mut self, mode: Primitive, first: u32, count: u32);
    fn flush(&mut self) -> Result<(), FrameError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_mask_combines() {
        assert_eq!(ClearMask::COLOR | ClearMask::DEPTH, ClearMask::COLOR_DEPTH);
        assert!(ClearMask::default().is_empty());
        assert!(!ClearMask::COLOR.is_empty());
    }

    #[test]
    fn surface_size_as_vec2() {
        assert_eq!(SurfaceSize::new(800, 600).as_vec2(), [800.0, 600.0]);
        assert_eq!(SurfaceSize::new(1, 2).to_string(), "1x2");
    }
}
