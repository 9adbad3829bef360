use std::borrow::Cow;
use std::collections::BTreeMap;

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, trace, warn};
use wgpu::util::DeviceExt;

use crate::gl::{
    AttribLocation, BufferId, ClearMask, FrameError, GraphicsContext, Primitive, ProgramId,
    ShaderId, ShaderStage, SurfaceSize, UniformLocation,
};

use super::context::GpuContext;
use super::pipeline::{vertex_format, AttribSlot, PipelineKey, ProgramPipelines};
use super::reflect::{self, LinkedInterface, StageReflection, UniformKind};

struct ShaderObject {
    stage: ShaderStage,
    source: String,
    reflection: Option<StageReflection>,
    log: String,
}

struct LinkedProgram {
    interface: LinkedInterface,
    gpu: ProgramPipelines,
    warned_incomplete: bool,
}

#[derive(Default)]
struct ProgramObject {
    shaders: Vec<ShaderId>,
    linked: Option<LinkedProgram>,
    log: String,
    warned_unlinked: bool,
}

#[derive(Default, Clone, Copy)]
struct AttribState {
    enabled: bool,
    source: Option<(BufferId, u32)>,
}

struct PendingDraw {
    program: ProgramId,
    key: PipelineKey,
    buffers: Vec<BufferId>,
    first: u32,
    count: u32,
}

/// [`GraphicsContext`] over a wgpu surface.
///
/// Commands are recorded until [`GraphicsContext::flush`], which encodes them
/// into a single render pass on the next swapchain image and presents it.
pub struct WgpuGraphics {
    gpu: GpuContext,
    shaders: Vec<ShaderObject>,
    programs: Vec<ProgramObject>,
    buffers: Vec<Option<wgpu::Buffer>>,
    array_buffer: Option<BufferId>,
    attribs: BTreeMap<u32, AttribState>,
    current_program: Option<ProgramId>,
    clear_color: wgpu::Color,
    pending_clear: ClearMask,
    pending_draws: Vec<PendingDraw>,
}

impl WgpuGraphics {
    pub fn new<T>(target: &T, size: SurfaceSize) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        Ok(Self {
            gpu: GpuContext::new(target, size)?,
            shaders: Vec::new(),
            programs: Vec::new(),
            buffers: Vec::new(),
            array_buffer: None,
            attribs: BTreeMap::new(),
            current_program: None,
            clear_color: wgpu::Color::TRANSPARENT,
            pending_clear: ClearMask::default(),
            pending_draws: Vec::new(),
        })
    }

    pub fn set_clear_color(&mut self, rgba: [f64; 4]) {
        self.clear_color = wgpu::Color {
            r: rgba[0],
            g: rgba[1],
            b: rgba[2],
            a: rgba[3],
        };
    }

    /// Recovers from a lost or outdated swapchain.
    pub fn reconfigure(&mut self) {
        self.gpu.reconfigure();
    }

    fn shader(&self, shader: ShaderId) -> Option<&ShaderObject> {
        self.shaders.get(shader.0 as usize)
    }

    fn program(&self, program: ProgramId) -> Option<&ProgramObject> {
        self.programs.get(program.0 as usize)
    }

    fn linked(&self, program: ProgramId) -> Option<&LinkedProgram> {
        self.program(program)?.linked.as_ref()
    }

    fn try_link(&self, program: &ProgramObject) -> Result<LinkedProgram, String> {
        let mut vertex = None;
        let mut fragment = None;
        for id in &program.shaders {
            let shader = self
                .shader(*id)
                .ok_or_else(|| format!("shader {} does not exist", id.0))?;
            let reflection = shader
                .reflection
                .as_ref()
                .ok_or_else(|| format!("{} shader {} is not compiled", shader.stage, id.0))?;
            let slot = match shader.stage {
                ShaderStage::Vertex => &mut vertex,
                ShaderStage::Fragment => &mut fragment,
            };
            if slot.replace((shader, reflection)).is_some() {
                return Err(format!("more than one {} shader attached", shader.stage));
            }
        }
        let (Some((vertex_shader, vertex)), Some((fragment_shader, fragment))) = (vertex, fragment)
        else {
            return Err("program needs exactly one vertex and one fragment shader".to_string());
        };

        let interface = reflect::link(vertex, fragment)?;
        let device = &self.gpu.device;
        let vertex_module = create_module(device, ShaderStage::Vertex, &vertex_shader.source);
        let fragment_module = create_module(device, ShaderStage::Fragment, &fragment_shader.source);
        let gpu = ProgramPipelines::new(device, vertex_module, fragment_module, &interface.blocks);

        Ok(LinkedProgram {
            interface,
            gpu,
            warned_incomplete: false,
        })
    }

    fn write_uniform(&mut self, location: UniformLocation, kind: UniformKind, bytes: &[u8]) {
        let Some(program) = self.current_program else {
            trace!("uniform write without an active program");
            return;
        };
        let Some(linked) = self
            .programs
            .get_mut(program.0 as usize)
            .and_then(|object| object.linked.as_mut())
        else {
            return;
        };
        let Some(slot) = linked.interface.uniforms.get(location.0 as usize) else {
            trace!(location = location.0, "unknown uniform location");
            return;
        };
        if slot.kind != kind {
            debug!(
                uniform = %slot.name,
                expected = ?slot.kind,
                got = ?kind,
                "uniform type mismatch; write ignored"
            );
            return;
        }
        let Some(range) = slot.byte_range() else {
            return;
        };
        let block = slot.block;
        linked.gpu.write_uniform(block, range, bytes);
    }

    fn vertex_snapshot(&self) -> (Vec<AttribSlot>, Vec<BufferId>) {
        let mut slots = Vec::new();
        let mut buffers = Vec::new();
        for (location, state) in &self.attribs {
            let Some((buffer, components)) = state.source.filter(|_| state.enabled) else {
                continue;
            };
            if vertex_format(components).is_none() {
                continue;
            }
            slots.push(AttribSlot {
                location: *location,
                components,
            });
            buffers.push(buffer);
        }
        (slots, buffers)
    }
}

fn create_module(device: &wgpu::Device, stage: ShaderStage, source: &str) -> wgpu::ShaderModule {
    let (label, stage) = match stage {
        ShaderStage::Vertex => ("vertex stage", wgpu::naga::ShaderStage::Vertex),
        ShaderStage::Fragment => ("fragment stage", wgpu::naga::ShaderStage::Fragment),
    };
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source.to_string()),
            stage,
            defines: &[],
        },
    })
}

impl GraphicsContext for WgpuGraphics {
    fn surface_size(&self) -> SurfaceSize {
        self.gpu.size()
    }

    fn set_surface_size(&mut self, size: SurfaceSize) {
        if size != self.gpu.size() {
            debug!(%size, "resizing surface");
        }
        self.gpu.resize(size);
    }

    fn create_shader(&mut self, stage: ShaderStage) -> ShaderId {
        let id = ShaderId(self.shaders.len() as u32);
        self.shaders.push(ShaderObject {
            stage,
            source: String::new(),
            reflection: None,
            log: String::new(),
        });
        id
    }

    fn shader_source(&mut self, shader: ShaderId, source: &str) {
        if let Some(object) = self.shaders.get_mut(shader.0 as usize) {
            object.source = source.to_string();
        }
    }

    fn compile_shader(&mut self, shader: ShaderId) {
        let Some(object) = self.shaders.get_mut(shader.0 as usize) else {
            return;
        };
        match reflect::compile(object.stage, &object.source) {
            Ok(reflection) => {
                debug!(
                    stage = %object.stage,
                    inputs = reflection.inputs.len(),
                    uniform_blocks = reflection.uniform_blocks.len(),
                    "compiled shader"
                );
                object.reflection = Some(reflection);
                object.log.clear();
            }
            Err(log) => {
                object.reflection = None;
                object.log = log;
            }
        }
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.shader(shader)
            .is_some_and(|object| object.reflection.is_some())
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        self.shader(shader)
            .map(|object| object.log.clone())
            .unwrap_or_default()
    }

    fn create_program(&mut self) -> ProgramId {
        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(ProgramObject::default());
        id
    }

    fn attach_shader(&mut self, program: ProgramId, shader: ShaderId) {
        if let Some(object) = self.programs.get_mut(program.0 as usize) {
            if !object.shaders.contains(&shader) {
                object.shaders.push(shader);
            }
        }
    }

    fn link_program(&mut self, program: ProgramId) {
        let Some(object) = self.program(program) else {
            return;
        };
        let outcome = self.try_link(object);
        let Some(object) = self.programs.get_mut(program.0 as usize) else {
            return;
        };
        match outcome {
            Ok(linked) => {
                object.linked = Some(linked);
                object.log.clear();
            }
            Err(log) => {
                object.linked = None;
                object.log = log;
            }
        }
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        self.linked(program).is_some()
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.program(program)
            .map(|object| object.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&mut self, program: ProgramId) {
        if self.program(program).is_some() {
            self.current_program = Some(program);
        }
    }

    fn create_buffer(&mut self) -> BufferId {
        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(None);
        id
    }

    fn attrib_location(&self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        self.linked(program)?
            .interface
            .attribute(name)
            .map(AttribLocation)
    }

    fn bind_array_buffer(&mut self, buffer: BufferId) {
        if (buffer.0 as usize) < self.buffers.len() {
            self.array_buffer = Some(buffer);
        }
    }

    fn enable_vertex_attrib(&mut self, location: AttribLocation) {
        self.attribs.entry(location.0).or_default().enabled = true;
    }

    fn vertex_attrib_pointer(&mut self, location: AttribLocation, components: u32) {
        let Some(buffer) = self.array_buffer else {
            debug!(location = location.0, "vertex_attrib_pointer without a bound array buffer");
            return;
        };
        if vertex_format(components).is_none() {
            debug!(location = location.0, components, "unsupported attribute size");
            return;
        }
        self.attribs.entry(location.0).or_default().source = Some((buffer, components));
    }

    fn buffer_data(&mut self, data: &[f32]) {
        let Some(id) = self.array_buffer else {
            debug!("buffer_data without a bound array buffer");
            return;
        };
        let buffer = self
            .gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("vertex buffer"),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });
        if let Some(slot) = self.buffers.get_mut(id.0 as usize) {
            *slot = Some(buffer);
        }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.linked(program)?
            .interface
            .uniform_index(name)
            .map(|index| UniformLocation(index as u32))
    }

    fn uniform_1f(&mut self, location: UniformLocation, value: f32) {
        self.write_uniform(location, UniformKind::Float, bytemuck::bytes_of(&value));
    }

    fn uniform_2f(&mut self, location: UniformLocation, value: [f32; 2]) {
        self.write_uniform(location, UniformKind::Vec2, bytemuck::cast_slice(&value));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.pending_clear = self.pending_clear | mask;
    }

    fn draw_arrays(&mut self, mode: Primitive, first: u32, count: u32) {
        let Some(program) = self.current_program else {
            trace!("draw without an active program");
            return;
        };
        let (slots, buffers) = self.vertex_snapshot();
        let Some(object) = self.programs.get_mut(program.0 as usize) else {
            return;
        };
        let Some(linked) = object.linked.as_mut() else {
            if !object.warned_unlinked {
                warn!(program = program.0, "program is not linked; draws are skipped");
                object.warned_unlinked = true;
            }
            return;
        };

        let missing: Vec<u32> = linked
            .interface
            .required_locations
            .iter()
            .copied()
            .filter(|location| !slots.iter().any(|slot| slot.location == *location))
            .collect();
        if !missing.is_empty() {
            if !linked.warned_incomplete {
                warn!(?missing, "vertex inputs have no enabled attribute buffer; draw skipped");
                linked.warned_incomplete = true;
            }
            return;
        }
        if buffers
            .iter()
            .any(|id| self.buffers.get(id.0 as usize).map_or(true, Option::is_none))
        {
            trace!("attribute buffer has no data; draw skipped");
            return;
        }

        let key = PipelineKey {
            primitive: mode,
            slots,
        };
        linked
            .gpu
            .ensure_pipeline(&self.gpu.device, self.gpu.surface_format, &key);
        self.pending_draws.push(PendingDraw {
            program,
            key,
            buffers,
            first,
            count,
        });
    }

    fn flush(&mut self) -> Result<(), FrameError> {
        if self.pending_clear.is_empty() && self.pending_draws.is_empty() {
            return Ok(());
        }
        let clear = std::mem::take(&mut self.pending_clear);
        let draws = std::mem::take(&mut self.pending_draws);

        for object in &mut self.programs {
            if let Some(linked) = object.linked.as_mut() {
                linked.gpu.upload_uniforms(&self.gpu.queue);
            }
        }

        let frame = self.gpu.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        {
            let color_load = if clear.color {
                wgpu::LoadOp::Clear(self.clear_color)
            } else {
                wgpu::LoadOp::Load
            };
            let depth_load = if clear.depth {
                wgpu::LoadOp::Clear(1.0)
            } else {
                wgpu::LoadOp::Load
            };
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.gpu.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            for draw in &draws {
                let Some(linked) = self.linked(draw.program) else {
                    continue;
                };
                let Some(pipeline) = linked.gpu.pipeline(&draw.key) else {
                    continue;
                };
                pass.set_pipeline(pipeline);
                for (group, bind_group) in linked.gpu.bind_groups().iter().enumerate() {
                    pass.set_bind_group(group as u32, bind_group, &[]);
                }
                for (slot, id) in draw.buffers.iter().enumerate() {
                    if let Some(Some(buffer)) = self.buffers.get(id.0 as usize) {
                        pass.set_vertex_buffer(slot as u32, buffer.slice(..));
                    }
                }
                pass.draw(draw.first..draw.first + draw.count, 0..1);
            }
        }

        self.gpu.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }
}
