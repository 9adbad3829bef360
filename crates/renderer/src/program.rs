//! Shader compilation and program linking with typed outcomes.
//!
//! Compile and link failures never abort here: the diagnostics are logged and
//! collected, and the caller decides what to do with them through
//! [`FailurePolicy`].

use std::fmt;

use tracing::warn;

use crate::gl::{GraphicsContext, ProgramId, ShaderId, ShaderStage};

/// What to do when a stage fails to compile or the program fails to link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Keep going with the unusable program; draws render nothing.
    #[default]
    Proceed,
    /// Stop setup and report the diagnostics.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticOrigin {
    Stage(ShaderStage),
    Link,
}

impl fmt::Display for DiagnosticOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticOrigin::Stage(stage) => write!(f, "{stage} shader"),
            DiagnosticOrigin::Link => f.write_str("program link"),
        }
    }
}

/// Implementation-provided log text from a failed compile or link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub origin: DiagnosticOrigin,
    pub log: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.origin, self.log.trim_end())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub shader: ShaderId,
    pub stage: ShaderStage,
    pub diagnostic: Option<Diagnostic>,
}

impl StageOutcome {
    pub fn compiled(&self) -> bool {
        self.diagnostic.is_none()
    }
}

/// Result of [`build_program`]. The handle is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramBuild {
    pub program: ProgramId,
    pub vertex: StageOutcome,
    pub fragment: StageOutcome,
    pub link: Option<Diagnostic>,
}

impl ProgramBuild {
    pub fn is_clean(&self) -> bool {
        self.vertex.compiled() && self.fragment.compiled() && self.link.is_none()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        [
            self.vertex.diagnostic.as_ref(),
            self.fragment.diagnostic.as_ref(),
            self.link.as_ref(),
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }
}

/// Submits `source` to `shader`, compiles it and checks the compile status.
pub fn compile_stage<G>(
    ctx: &mut G,
    shader: ShaderId,
    stage: ShaderStage,
    source: &str,
) -> StageOutcome
where
    G: GraphicsContext + ?Sized,
{
    ctx.shader_source(shader, source);
    ctx.compile_shader(shader);

    let diagnostic = if ctx.shader_compile_status(shader) {
        None
    } else {
        let log = ctx.shader_info_log(shader);
        warn!(%stage, log = %log.trim_end(), "shader compilation failed");
        Some(Diagnostic {
            origin: DiagnosticOrigin::Stage(stage),
            log,
        })
    };

    StageOutcome {
        shader,
        stage,
        diagnostic,
    }
}

/// Compiles both stages, links them into a new program and activates it.
pub fn build_program<G>(ctx: &mut G, vertex_source: &str, fragment_source: &str) -> ProgramBuild
where
    G: GraphicsContext + ?Sized,
{
    let vertex_shader = ctx.create_shader(ShaderStage::Vertex);
    let fragment_shader = ctx.create_shader(ShaderStage::Fragment);
    let vertex = compile_stage(ctx, vertex_shader, ShaderStage::Vertex, vertex_source);
    let fragment = compile_stage(ctx, fragment_shader, ShaderStage::Fragment, fragment_source);

    let program = ctx.create_program();
    ctx.attach_shader(program, vertex_shader);
    ctx.attach_shader(program, fragment_shader);
    ctx.link_program(program);

    let link = if ctx.program_link_status(program) {
        None
    } else {
        let log = ctx.program_info_log(program);
        warn!(log = %log.trim_end(), "program link failed");
        Some(Diagnostic {
            origin: DiagnosticOrigin::Link,
            log,
        })
    };

    ctx.use_program(program);

    ProgramBuild {
        program,
        vertex,
        fragment,
        link,
    }
}
