//! Recording [`GraphicsContext`] used by the unit tests.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use crate::gl::{
    AttribLocation, BufferId, ClearMask, FrameError, GraphicsContext, Primitive, ProgramId,
    ShaderId, ShaderStage, SurfaceSize, UniformLocation,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    SetSurfaceSize(SurfaceSize),
    CreateShader(ShaderStage, ShaderId),
    CompileShader(ShaderId),
    CreateProgram(ProgramId),
    AttachShader(ProgramId, ShaderId),
    LinkProgram(ProgramId),
    UseProgram(ProgramId),
    CreateBuffer(BufferId),
    BindArrayBuffer(BufferId),
    EnableVertexAttrib(AttribLocation),
    VertexAttribPointer {
        location: AttribLocation,
        components: u32,
        buffer: Option<BufferId>,
    },
    BufferData {
        buffer: Option<BufferId>,
        len: usize,
    },
    Uniform1f(UniformLocation, f32),
    Uniform2f(UniformLocation, [f32; 2]),
    Clear(ClearMask),
    DrawArrays(Primitive, u32, u32),
    Flush,
}

#[derive(Debug, Default)]
struct MockShader {
    stage: Option<ShaderStage>,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct MockProgram {
    shaders: Vec<ShaderId>,
    linked: bool,
    log: String,
}

/// Accepts any source that declares `main` with balanced braces.
pub(crate) struct RecordingContext {
    pub calls: Vec<Call>,
    size: SurfaceSize,
    attributes: Vec<String>,
    uniforms: Vec<String>,
    shaders: Vec<MockShader>,
    programs: Vec<MockProgram>,
    next_buffer: u32,
    bound_buffer: Option<BufferId>,
    pub uploads: HashMap<BufferId, Vec<f32>>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            size: SurfaceSize::new(300, 150),
            attributes: vec!["vertexPosition".into(), "color".into()],
            uniforms: vec!["u_time".into(), "u_resolution".into()],
            shaders: Vec::new(),
            programs: Vec::new(),
            next_buffer: 0,
            bound_buffer: None,
            uploads: HashMap::new(),
        }
    }

    pub fn with_uniforms(mut self, names: &[&str]) -> Self {
        self.uniforms = names.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn with_attributes(mut self, names: &[&str]) -> Self {
        self.attributes = names.iter().map(|name| name.to_string()).collect();
        self
    }

    /// Simulates an external resize without going through the call log.
    pub fn resize_externally(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn clear_log(&mut self) {
        self.calls.clear();
    }

    fn shader_mut(&mut self, shader: ShaderId) -> Option<&mut MockShader> {
        self.shaders.get_mut(shader.0 as usize)
    }
}

fn mock_compile(source: &str) -> Result<(), String> {
    let opens = source.matches('{').count();
    let closes = source.matches('}').count();
    if !source.contains("main") {
        return Err("ERROR: 0:1: 'main' : function not found".to_string());
    }
    if opens != closes {
        return Err(format!(
            "ERROR: 0:{}: '' : syntax error, unexpected end of file",
            source.lines().count()
        ));
    }
    Ok(())
}

impl GraphicsContext for RecordingContext {
    fn surface_size(&self) -> SurfaceSize {
        self.size
    }

    fn set_surface_size(&mut self, size: SurfaceSize) {
        self.size = size;
        self.calls.push(Call::SetSurfaceSize(size));
    }

    fn create_shader(&mut self, stage: ShaderStage) -> ShaderId {
        let id = ShaderId(self.shaders.len() as u32);
        self.shaders.push(MockShader {
            stage: Some(stage),
            ..MockShader::default()
        });
        self.calls.push(Call::CreateShader(stage, id));
        id
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        if let Some(entry) = self.shader_mut(shader) {
            entry.source = source.to_string();
        }
    }

    fn compile_shader(&mut self, shader: ShaderId) {
        self.calls.push(Call::CompileShader(shader));
        if let Some(entry) = self.shader_mut(shader) {
            match mock_compile(&entry.source) {
                Ok(()) => {
                    entry.compiled = true;
                    entry.log.clear();
                }
                Err(log) => {
                    entry.compiled = false;
                    entry.log = log;
                }
            }
        }
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.shaders
            .get(shader.0 as usize)
            .is_some_and(|entry| entry.compiled)
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        self.shaders
            .get(shader.0 as usize)
            .map(|entry| entry.log.clone())
            .unwrap_or_default()
    }

    fn create_program(&mut self) -> ProgramId {
        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(MockProgram::default());
        self.calls.push(Call::CreateProgram(id));
        id
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        self.calls.push(Call::AttachShader(program, shader));
        if let Some(entry) = self.programs.get_mut(program.0 as usize) {
            entry.shaders.push(shader);
        }
    }

    fn link_program(&mut self, program: ProgramId) {
        self.calls.push(Call::LinkProgram(program));
        let Some(entry) = self.programs.get(program.0 as usize) else {
            return;
        };
        let mut has_vertex = false;
        let mut has_fragment = false;
        let mut all_compiled = true;
        for shader in &entry.shaders {
            let Some(mock) = self.shaders.get(shader.0 as usize) else {
                continue;
            };
            all_compiled &= mock.compiled;
            match mock.stage {
                Some(ShaderStage::Vertex) => has_vertex = true,
                Some(ShaderStage::Fragment) => has_fragment = true,
                None => {}
            }
        }
        let log = if !all_compiled {
            "error: linking with uncompiled shader".to_string()
        } else if !has_vertex || !has_fragment {
            "error: missing vertex or fragment stage".to_string()
        } else {
            String::new()
        };
        if let Some(entry) = self.programs.get_mut(program.0 as usize) {
            entry.linked = log.is_empty();
            entry.log = log;
        }
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        self.programs
            .get(program.0 as usize)
            .is_some_and(|entry| entry.linked)
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.programs
            .get(program.0 as usize)
            .map(|entry| entry.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&mut self, program: ProgramId) {
        self.calls.push(Call::UseProgram(program));
    }

    fn create_buffer(&mut self) -> BufferId {
        let id = BufferId(self.next_buffer);
        self.next_buffer += 1;
        self.calls.push(Call::CreateBuffer(id));
        id
    }

    fn attrib_location(&self, _program: ProgramId, name: &str) -> Option<AttribLocation> {
        self.attributes
            .iter()
            .position(|candidate| candidate == name)
            .map(|index| AttribLocation(index as u32))
    }

    fn bind_array_buffer(&mut self, buffer: BufferId) {
        self.bound_buffer = Some(buffer);
        self.calls.push(Call::BindArrayBuffer(buffer));
    }

    fn enable_vertex_attrib(&mut self, location: AttribLocation) {
        self.calls.push(Call::EnableVertexAttrib(location));
    }

    fn vertex_attrib_pointer(&mut self, location: AttribLocation, components: u32) {
        self.calls.push(Call::VertexAttribPointer {
            location,
            components,
            buffer: self.bound_buffer,
        });
    }

    fn buffer_data(&mut self, data: &[f32]) {
        if let Some(buffer) = self.bound_buffer {
            self.uploads.insert(buffer, data.to_vec());
        }
        self.calls.push(Call::BufferData {
            buffer: self.bound_buffer,
            len: data.len(),
        });
    }

    fn uniform_location(&self, _program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.uniforms
            .iter()
            .position(|candidate| candidate == name)
            .map(|index| UniformLocation(index as u32))
    }

    fn uniform_1f(&mut self, location: UniformLocation, value: f32) {
        self.calls.push(Call::Uniform1f(location, value));
    }

    fn uniform_2f(&mut self, location: UniformLocation, value: [f32; 2]) {
        self.calls.push(Call::Uniform2f(location, value));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.calls.push(Call::Clear(mask));
    }

    fn draw_arrays(&mut self, mode: Primitive, first: u32, count: u32) {
        self.calls.push(Call::DrawArrays(mode, first, count));
    }

    fn flush(&mut self) -> Result<(), FrameError> {
        self.calls.push(Call::Flush);
        Ok(())
    }
}

/// Log sink shared with a scoped `tracing` subscriber.
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().map(|buf| buf.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut sink) = self.0.lock() {
            sink.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a subscriber that records `warn` and above, returning its
/// result together with everything that was logged.
pub(crate) fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    (value, logs.contents())
}

pub(crate) const VALID_VERTEX: &str = "#version 450
layout(location = 0) in vec3 vertexPosition;
layout(location = 1) in vec4 color;
layout(location = 0) out vec4 v_color;
void main() {
    v_color = color;
    gl_Position = vec4(vertexPosition, 1.0);
}
";

pub(crate) const VALID_FRAGMENT: &str = "#version 450
layout(location = 0) in vec4 v_color;
layout(location = 0) out vec4 out_color;
layout(std140, set = 0, binding = 0) uniform Globals {
    float u_time;
    vec2 u_resolution;
};
void main() {
    out_color = v_color * (0.5 + 0.5 * sin(u_time + gl_FragCoord.x / u_resolution.x));
}
";

pub(crate) const BROKEN_FRAGMENT: &str = "#version 450
layout(location = 0) out vec4 out_color;
void main() {
    out_color = vec4(1.0
";
