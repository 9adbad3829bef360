use crate::geometry::QUAD_VERTEX_COUNT;
use crate::gl::{ClearMask, FrameError, GraphicsContext, Primitive, ProgramId, UniformLocation};

pub const TIME_UNIFORM: &str = "u_time";
pub const RESOLUTION_UNIFORM: &str = "u_resolution";

/// Uniform locations resolved once after link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformBindings {
    pub time: Option<UniformLocation>,
    pub resolution: Option<UniformLocation>,
}

impl UniformBindings {
    pub fn resolve<G>(ctx: &G, program: ProgramId) -> Self
    where
        G: GraphicsContext + ?Sized,
    {
        let bindings = Self {
            time: ctx.uniform_location(program, TIME_UNIFORM),
            resolution: ctx.uniform_location(program, RESOLUTION_UNIFORM),
        };
        if bindings.time.is_none() {
            tracing::debug!(uniform = TIME_UNIFORM, "uniform not active in program");
        }
        if bindings.resolution.is_none() {
            tracing::debug!(uniform = RESOLUTION_UNIFORM, "uniform not active in program");
        }
        bindings
    }
}

/// Per-frame state of the render loop.
///
/// Owns everything a tick needs besides the context itself, so a tick can be
/// driven directly against any [`GraphicsContext`].
#[derive(Debug, Clone)]
pub struct FrameLoop {
    program: ProgramId,
    uniforms: UniformBindings,
    vertex_count: u32,
    frames: u64,
}

impl FrameLoop {
    pub fn new(program: ProgramId, uniforms: UniformBindings) -> Self {
        Self {
            program,
            uniforms,
            vertex_count: QUAD_VERTEX_COUNT,
            frames: 0,
        }
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn uniforms(&self) -> UniformBindings {
        self.uniforms
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Renders one frame. `timestamp_ms` is the host's monotonic frame clock
    /// in milliseconds; the shader sees it in seconds.
    pub fn tick<G>(&mut self, ctx: &mut G, timestamp_ms: f64) -> Result<(), FrameError>
    where
        G: GraphicsContext + ?Sized,
    {
        let seconds = (timestamp_ms * 0.001) as f32;
        if let Some(location) = self.uniforms.time {
            ctx.uniform_1f(location, seconds);
        }
        if let Some(location) = self.uniforms.resolution {
            let size = ctx.surface_size();
            ctx.uniform_2f(location, size.as_vec2());
        }

        ctx.clear(ClearMask::COLOR_DEPTH);
        ctx.draw_arrays(Primitive::Triangles, 0, self.vertex_count);
        self.frames += 1;
        ctx.flush()
    }
}
