use std::collections::HashMap;

use crate::gl::Primitive;

use super::context::DEPTH_FORMAT;
use super::reflect::UniformBlock;

/// One enabled attribute as seen by a draw: a buffer slot feeding `location`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct AttribSlot {
    pub location: u32,
    pub components: u32,
}

/// Pipelines depend on topology and the vertex layout, not on buffer identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PipelineKey {
    pub primitive: Primitive,
    pub slots: Vec<AttribSlot>,
}

pub(crate) fn vertex_format(components: u32) -> Option<wgpu::VertexFormat> {
    match components {
        1 => Some(wgpu::VertexFormat::Float32),
        2 => Some(wgpu::VertexFormat::Float32x2),
        3 => Some(wgpu::VertexFormat::Float32x3),
        4 => Some(wgpu::VertexFormat::Float32x4),
        _ => None,
    }
}

fn topology(primitive: Primitive) -> wgpu::PrimitiveTopology {
    match primitive {
        Primitive::Triangles => wgpu::PrimitiveTopology::TriangleList,
    }
}

struct UniformBuffer {
    binding: u32,
    group: u32,
    shadow: Vec<u8>,
    buffer: wgpu::Buffer,
    dirty: bool,
}

/// GPU side of a linked program: modules, uniform storage and a pipeline per
/// vertex layout.
pub(crate) struct ProgramPipelines {
    vertex_module: wgpu::ShaderModule,
    fragment_module: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    bind_groups: Vec<wgpu::BindGroup>,
    uniforms: Vec<UniformBuffer>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl ProgramPipelines {
    pub fn new(
        device: &wgpu::Device,
        vertex_module: wgpu::ShaderModule,
        fragment_module: wgpu::ShaderModule,
        blocks: &[UniformBlock],
    ) -> Self {
        let uniforms: Vec<UniformBuffer> = blocks
            .iter()
            .map(|block| {
                let size = (block.size.max(16) as u64).next_multiple_of(16);
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("uniform block"),
                    size,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                UniformBuffer {
                    binding: block.binding,
                    group: block.group,
                    shadow: vec![0; size as usize],
                    buffer,
                    dirty: true,
                }
            })
            .collect();

        // Groups must be contiguous from zero; holes get empty layouts.
        let group_count = uniforms
            .iter()
            .map(|uniform| uniform.group + 1)
            .max()
            .unwrap_or(0);
        let mut group_layouts = Vec::with_capacity(group_count as usize);
        let mut bind_groups = Vec::with_capacity(group_count as usize);
        for group in 0..group_count {
            let members: Vec<&UniformBuffer> = uniforms
                .iter()
                .filter(|uniform| uniform.group == group)
                .collect();
            let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = members
                .iter()
                .map(|uniform| wgpu::BindGroupLayoutEntry {
                    binding: uniform.binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                })
                .collect();
            let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("uniform layout"),
                entries: &layout_entries,
            });
            let entries: Vec<wgpu::BindGroupEntry> = members
                .iter()
                .map(|uniform| wgpu::BindGroupEntry {
                    binding: uniform.binding,
                    resource: uniform.buffer.as_entire_binding(),
                })
                .collect();
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("uniform bind group"),
                layout: &layout,
                entries: &entries,
            });
            group_layouts.push(layout);
            bind_groups.push(bind_group);
        }

        let layout_refs: Vec<&wgpu::BindGroupLayout> = group_layouts.iter().collect();
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("program pipeline layout"),
            bind_group_layouts: &layout_refs,
            push_constant_ranges: &[],
        });

        Self {
            vertex_module,
            fragment_module,
            layout,
            bind_groups,
            uniforms,
            pipelines: HashMap::new(),
        }
    }

    /// Copies `bytes` into the CPU shadow of `block` at `range`.
    pub fn write_uniform(&mut self, block: usize, range: std::ops::Range<usize>, bytes: &[u8]) {
        if let Some(uniform) = self.uniforms.get_mut(block) {
            if let Some(target) = uniform.shadow.get_mut(range) {
                target.copy_from_slice(bytes);
                uniform.dirty = true;
            }
        }
    }

    pub fn upload_uniforms(&mut self, queue: &wgpu::Queue) {
        for uniform in &mut self.uniforms {
            if uniform.dirty {
                queue.write_buffer(&uniform.buffer, 0, &uniform.shadow);
                uniform.dirty = false;
            }
        }
    }

    pub fn bind_groups(&self) -> &[wgpu::BindGroup] {
        &self.bind_groups
    }

    pub fn pipeline(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }

    pub fn ensure_pipeline(
        &mut self,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        key: &PipelineKey,
    ) {
        if self.pipelines.contains_key(key) {
            return;
        }

        let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
            .slots
            .iter()
            .filter_map(|slot| {
                Some([wgpu::VertexAttribute {
                    format: vertex_format(slot.components)?,
                    offset: 0,
                    shader_location: slot.location,
                }])
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout> = attributes
            .iter()
            .map(|attribute| wgpu::VertexBufferLayout {
                array_stride: attribute[0].format.size(),
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attribute,
            })
            .collect();

        tracing::debug!(
            primitive = ?key.primitive,
            slots = key.slots.len(),
            "building render pipeline"
        );
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("program pipeline"),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module: &self.vertex_module,
                entry_point: Some("main"),
                buffers: &buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: topology(key.primitive),
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &self.fragment_module,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });
        self.pipelines.insert(key.clone(), pipeline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_counts_map_to_float_formats() {
        assert_eq!(vertex_format(3), Some(wgpu::VertexFormat::Float32x3));
        assert_eq!(vertex_format(4), Some(wgpu::VertexFormat::Float32x4));
        assert_eq!(vertex_format(0), None);
        assert_eq!(vertex_format(5), None);
        assert_eq!(vertex_format(3).unwrap().size(), 12);
    }

    #[test]
    fn pipeline_keys_follow_vertex_layout() {
        let a = PipelineKey {
            primitive: Primitive::Triangles,
            slots: vec![AttribSlot {
                location: 0,
                components: 3,
            }],
        };
        let b = a.clone();
        assert_eq!(a, b);
        let c = PipelineKey {
            slots: vec![AttribSlot {
                location: 0,
                components: 4,
            }],
            ..a.clone()
        };
        assert_ne!(a, c);
    }
}
