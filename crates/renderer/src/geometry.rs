use tracing::debug;

use crate::gl::{AttribLocation, BufferId, GraphicsContext, ProgramId};

/// Vertex count of the full-canvas quad (two triangles).
pub const QUAD_VERTEX_COUNT: u32 = 6;

pub const POSITION_ATTRIBUTE: &str = "vertexPosition";
pub const COLOR_ATTRIBUTE: &str = "color";

#[rustfmt::skip]
pub const QUAD_POSITIONS: [f32; 18] = [
    -1.0,  1.0, 0.0,
    -1.0, -1.0, 0.0,
     1.0,  1.0, 0.0,
    -1.0, -1.0, 0.0,
     1.0, -1.0, 0.0,
     1.0,  1.0, 0.0,
];

#[rustfmt::skip]
pub const QUAD_COLORS: [f32; 24] = [
    1.0, 0.0, 0.0, 1.0,
    0.0, 1.0, 0.0, 1.0,
    0.0, 0.0, 1.0, 1.0,
    0.0, 1.0, 0.0, 1.0,
    0.0, 0.0, 0.0, 1.0,
    0.0, 0.0, 1.0, 1.0,
];

/// A named per-vertex attribute stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexBuffer<'a> {
    pub attribute: &'a str,
    pub components: u32,
    pub data: &'a [f32],
}

impl<'a> VertexBuffer<'a> {
    pub const fn new(attribute: &'a str, components: u32, data: &'a [f32]) -> Self {
        Self {
            attribute,
            components,
            data,
        }
    }

    pub fn vertex_count(&self) -> usize {
        if self.components == 0 {
            0
        } else {
            self.data.len() / self.components as usize
        }
    }
}

pub const QUAD_POSITION_BUFFER: VertexBuffer<'static> =
    VertexBuffer::new(POSITION_ATTRIBUTE, 3, &QUAD_POSITIONS);
pub const QUAD_COLOR_BUFFER: VertexBuffer<'static> =
    VertexBuffer::new(COLOR_ATTRIBUTE, 4, &QUAD_COLORS);

/// Where an uploaded stream ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding {
    pub buffer: BufferId,
    pub location: Option<AttribLocation>,
    pub components: u32,
}

/// Creates a buffer, binds it to the named attribute of `program` and uploads
/// the data as static.
///
/// An attribute name the program does not declare leaves the location
/// unbound; the data is still uploaded.
pub fn upload_attribute<G>(
    ctx: &mut G,
    program: ProgramId,
    stream: &VertexBuffer<'_>,
) -> AttributeBinding
where
    G: GraphicsContext + ?Sized,
{
    let buffer = ctx.create_buffer();
    let location = ctx.attrib_location(program, stream.attribute);

    ctx.bind_array_buffer(buffer);
    match location {
        Some(location) => {
            ctx.enable_vertex_attrib(location);
            ctx.vertex_attrib_pointer(location, stream.components);
        }
        None => {
            debug!(
                attribute = stream.attribute,
                "attribute not active in program; skipping binding"
            );
        }
    }
    ctx.buffer_data(stream.data);

    AttributeBinding {
        buffer,
        location,
        components: stream.components,
    }
}
