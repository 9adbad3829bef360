//! The [`Renderer`]: surface sizing, program bootstrap and the frame loop.
//!
//! ```text
//!   Renderer::new ── Constructed
//!        │ setup(provider)
//!        │   load_pair ─▶ build_program ─▶ upload_attribute ×2 ─▶ resolve uniforms
//!        ▼
//!      Ready(FrameLoop) ── tick(timestamp) ── tick ── …
//! ```

use shadersource::{load_pair, LoadError, ShaderSources, SourceProvider};
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::frame::{FrameLoop, UniformBindings};
use crate::geometry::{upload_attribute, AttributeBinding, QUAD_COLOR_BUFFER, QUAD_POSITION_BUFFER};
use crate::gl::{FrameError, GraphicsContext, ProgramId, SurfaceSize};
use crate::program::{build_program, Diagnostic, FailurePolicy, ProgramBuild};

/// Construction parameters: surface size plus the two shader locators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererSpec {
    pub width: u32,
    pub height: u32,
    pub vertex: String,
    pub fragment: String,
}

impl RendererSpec {
    pub fn new(
        width: u32,
        height: u32,
        vertex: impl Into<String>,
        fragment: impl Into<String>,
    ) -> Self {
        Self {
            width,
            height,
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Sources(#[from] LoadError),
    #[error("shader program failed to build ({} diagnostic(s))", .0.len())]
    Program(Vec<Diagnostic>),
    #[error("renderer is already set up")]
    AlreadyReady,
}

/// What setup produced; diagnostics are present only under
/// [`FailurePolicy::Proceed`].
#[derive(Debug, Clone)]
pub struct SetupReport {
    pub program: ProgramBuild,
    pub position: AttributeBinding,
    pub color: AttributeBinding,
    pub uniforms: UniformBindings,
}

#[derive(Debug)]
enum Phase {
    Constructed,
    Ready(FrameLoop),
}

pub struct Renderer<G: GraphicsContext> {
    context: G,
    spec: RendererSpec,
    policy: FailurePolicy,
    phase: Phase,
}

impl<G: GraphicsContext> Renderer<G> {
    /// Sizes the context's surface to the requested dimensions.
    pub fn new(mut context: G, spec: RendererSpec) -> Self {
        context.set_surface_size(spec.size());
        debug!(
            size = %spec.size(),
            vertex = %spec.vertex,
            fragment = %spec.fragment,
            "renderer constructed"
        );
        Self {
            context,
            spec,
            policy: FailurePolicy::default(),
            phase: Phase::Constructed,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn spec(&self) -> &RendererSpec {
        &self.spec
    }

    pub fn surface_size(&self) -> SurfaceSize {
        self.context.surface_size()
    }

    pub fn context(&self) -> &G {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut G {
        &mut self.context
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Ready(_))
    }

    pub fn frame_loop(&self) -> Option<&FrameLoop> {
        match &self.phase {
            Phase::Ready(frames) => Some(frames),
            Phase::Constructed => None,
        }
    }

    /// Fetches both shader sources, then builds the program and uploads the quad.
    pub fn setup<P>(&mut self, provider: &P) -> Result<SetupReport, SetupError>
    where
        P: SourceProvider + ?Sized,
    {
        if self.is_ready() {
            return Err(SetupError::AlreadyReady);
        }
        let sources = load_pair(provider, &self.spec.vertex, &self.spec.fragment)?;
        self.setup_with_sources(&sources)
    }

    /// Setup for sources that are already in memory.
    pub fn setup_with_sources(
        &mut self,
        sources: &ShaderSources,
    ) -> Result<SetupReport, SetupError> {
        if self.is_ready() {
            return Err(SetupError::AlreadyReady);
        }

        let build = build_program(&mut self.context, &sources.vertex, &sources.fragment);
        if !build.is_clean() && self.policy == FailurePolicy::Abort {
            return Err(SetupError::Program(build.diagnostics()));
        }

        let program = build.program;
        let position = upload_attribute(&mut self.context, program, &QUAD_POSITION_BUFFER);
        let color = upload_attribute(&mut self.context, program, &QUAD_COLOR_BUFFER);
        let uniforms = UniformBindings::resolve(&self.context, program);

        info!(
            program = program.0,
            clean = build.is_clean(),
            size = %self.context.surface_size(),
            "shader program ready"
        );
        self.phase = Phase::Ready(FrameLoop::new(program, uniforms));

        Ok(SetupReport {
            program: build,
            position,
            color,
            uniforms,
        })
    }

    /// Program handle once setup has completed.
    pub fn program(&self) -> Option<ProgramId> {
        self.frame_loop().map(FrameLoop::program)
    }

    /// Runs one frame; before setup completes this does nothing.
    pub fn tick(&mut self, timestamp_ms: f64) -> Result<(), FrameError> {
        match &mut self.phase {
            Phase::Ready(frames) => frames.tick(&mut self.context, timestamp_ms),
            Phase::Constructed => {
                trace!(timestamp_ms, "tick before setup; skipping");
                Ok(())
            }
        }
    }
}
