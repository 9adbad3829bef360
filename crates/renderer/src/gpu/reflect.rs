//! GLSL compilation and interface reflection through naga.
//!
//! wgpu has no notion of looking attributes or uniforms up by name, so the
//! backend parses each stage with naga's GLSL front end and keeps what the
//! GL-style API needs: named vertex inputs with their locations, the
//! locations a stage reads and writes, and the members of every uniform block.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Write as _;

use wgpu::naga;

use crate::gl::ShaderStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UniformKind {
    Float,
    Vec2,
    Other,
}

impl UniformKind {
    fn byte_len(self) -> Option<u32> {
        match self {
            UniformKind::Float => Some(4),
            UniformKind::Vec2 => Some(8),
            UniformKind::Other => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniformMember {
    pub name: String,
    pub offset: u32,
    pub kind: UniformKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniformBlock {
    pub group: u32,
    pub binding: u32,
    pub size: u32,
    pub members: Vec<UniformMember>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InterfaceVar {
    pub name: Option<String>,
    pub location: u32,
}

/// What one compiled stage exposes to linking.
#[derive(Debug, Clone)]
pub(crate) struct StageReflection {
    pub stage: ShaderStage,
    pub inputs: Vec<InterfaceVar>,
    pub outputs: Vec<u32>,
    pub uniform_blocks: Vec<UniformBlock>,
}

/// Parses and validates `source`, returning the reflection or the info log.
pub(crate) fn compile(stage: ShaderStage, source: &str) -> Result<StageReflection, String> {
    let naga_stage = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };

    let mut frontend = naga::front::glsl::Frontend::default();
    let module = frontend
        .parse(&naga::front::glsl::Options::from(naga_stage), source)
        .map_err(|errors| errors.emit_to_string(source))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    );
    validator
        .validate(&module)
        .map_err(|err| describe_error(&err))?;

    reflect(&module, stage, naga_stage)
}

fn describe_error(err: &dyn Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let _ = write!(text, ": {inner}");
        source = inner.source();
    }
    text
}

fn reflect(
    module: &naga::Module,
    stage: ShaderStage,
    naga_stage: naga::ShaderStage,
) -> Result<StageReflection, String> {
    let entry = module
        .entry_points
        .iter()
        .find(|entry| entry.stage == naga_stage)
        .ok_or_else(|| format!("no {stage} entry point named 'main'"))?;

    let inputs = entry
        .function
        .arguments
        .iter()
        .filter_map(|argument| match argument.binding {
            Some(naga::Binding::Location { location, .. }) => Some(InterfaceVar {
                name: argument.name.clone(),
                location,
            }),
            _ => None,
        })
        .collect();

    let mut outputs = Vec::new();
    if let Some(result) = entry.function.result.as_ref() {
        match (&result.binding, &module.types[result.ty].inner) {
            (Some(naga::Binding::Location { location, .. }), _) => outputs.push(*location),
            (None, naga::TypeInner::Struct { members, .. }) => {
                for member in members {
                    if let Some(naga::Binding::Location { location, .. }) = member.binding {
                        outputs.push(location);
                    }
                }
            }
            _ => {}
        }
    }
    outputs.sort_unstable();

    let mut uniform_blocks = Vec::new();
    for (_, global) in module.global_variables.iter() {
        if global.space != naga::AddressSpace::Uniform {
            continue;
        }
        // naga's GLSL front end only accepts uniforms inside bound blocks.
        let (Some(resource), naga::TypeInner::Struct { members, span }) =
            (global.binding.as_ref(), &module.types[global.ty].inner)
        else {
            continue;
        };
        let block = UniformBlock {
            group: resource.group,
            binding: resource.binding,
            size: *span,
            members: members
                .iter()
                .filter_map(|member| {
                    Some(UniformMember {
                        name: member.name.clone()?,
                        offset: member.offset,
                        kind: uniform_kind(&module.types[member.ty].inner),
                    })
                })
                .collect(),
        };
        uniform_blocks.push(block);
    }

    Ok(StageReflection {
        stage,
        inputs,
        outputs,
        uniform_blocks,
    })
}

fn uniform_kind(inner: &naga::TypeInner) -> UniformKind {
    match inner {
        naga::TypeInner::Scalar(scalar)
            if scalar.kind == naga::ScalarKind::Float && scalar.width == 4 =>
        {
            UniformKind::Float
        }
        naga::TypeInner::Vector { size, scalar }
            if *size == naga::VectorSize::Bi
                && scalar.kind == naga::ScalarKind::Float
                && scalar.width == 4 =>
        {
            UniformKind::Vec2
        }
        _ => UniformKind::Other,
    }
}

/// A named uniform resolved against the merged block list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UniformSlot {
    pub name: String,
    pub block: usize,
    pub offset: u32,
    pub kind: UniformKind,
}

impl UniformSlot {
    pub fn byte_range(&self) -> Option<std::ops::Range<usize>> {
        let len = self.kind.byte_len()?;
        let start = self.offset as usize;
        Some(start..start + len as usize)
    }
}

/// The combined interface of a linked vertex/fragment pair.
#[derive(Debug, Clone)]
pub(crate) struct LinkedInterface {
    pub attributes: BTreeMap<String, u32>,
    pub required_locations: Vec<u32>,
    pub blocks: Vec<UniformBlock>,
    pub uniforms: Vec<UniformSlot>,
}

impl LinkedInterface {
    pub fn attribute(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied()
    }

    pub fn uniform_index(&self, name: &str) -> Option<usize> {
        self.uniforms.iter().position(|slot| slot.name == name)
    }
}

/// Checks that `vertex` feeds every input of `fragment` and merges their uniforms.
pub(crate) fn link(
    vertex: &StageReflection,
    fragment: &StageReflection,
) -> Result<LinkedInterface, String> {
    if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
        return Err("program needs exactly one vertex and one fragment shader".to_string());
    }

    let mut problems = Vec::new();
    for input in &fragment.inputs {
        if !vertex.outputs.contains(&input.location) {
            problems.push(format!(
                "fragment input '{}' (location {}) is not written by the vertex shader",
                input.name.as_deref().unwrap_or("<unnamed>"),
                input.location
            ));
        }
    }

    let mut blocks: Vec<UniformBlock> = Vec::new();
    for block in vertex.uniform_blocks.iter().chain(&fragment.uniform_blocks) {
        match blocks
            .iter()
            .find(|known| known.group == block.group && known.binding == block.binding)
        {
            Some(known) if known.size != block.size || known.members != block.members => {
                problems.push(format!(
                    "uniform block at set {} binding {} is declared differently in each stage",
                    block.group, block.binding
                ));
            }
            Some(_) => {}
            None => blocks.push(block.clone()),
        }
    }

    if !problems.is_empty() {
        return Err(problems.join("\n"));
    }

    let mut uniforms: Vec<UniformSlot> = Vec::new();
    for (index, block) in blocks.iter().enumerate() {
        for member in &block.members {
            if uniforms.iter().any(|slot| slot.name == member.name) {
                continue;
            }
            uniforms.push(UniformSlot {
                name: member.name.clone(),
                block: index,
                offset: member.offset,
                kind: member.kind,
            });
        }
    }

    let attributes = vertex
        .inputs
        .iter()
        .filter_map(|input| Some((input.name.clone()?, input.location)))
        .collect();
    let mut required_locations: Vec<u32> =
        vertex.inputs.iter().map(|input| input.location).collect();
    required_locations.sort_unstable();
    required_locations.dedup();

    Ok(LinkedInterface {
        attributes,
        required_locations,
        blocks,
        uniforms,
    })
}
