use bytemuck::{Pod, Zeroable};
use cisco_assets::{MeshData, VertexLayout};
use cisco_render::{Frame, RenderError};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

/// Per-frame uniform block, bind group 0.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct FrameUniforms {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
    ambient: [f32; 4],
}

impl FrameUniforms {
    pub(crate) fn new<M>(frame: &Frame<'_, M>) -> Self {
        let light = &frame.lighting;
        Self {
            view: frame.view.to_cols_array_2d(),
            projection: frame.projection.to_cols_array_2d(),
            light_dir: light.direction.extend(0.0).to_array(),
            light_color: light.color.extend(1.0).to_array(),
            ambient: light.ambient.extend(1.0).to_array(),
        }
    }
}

/// Per-mesh uniform block, bind group 1.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct MeshUniforms {
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
    color: [f32; 4],
}

impl MeshUniforms {
    pub(crate) fn new(model: Mat4, color: Vec3) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            color: color.extend(1.0).to_array(),
        }
    }
}

/// Vertex buffer layout for a mesh. Both layouts expose position at
/// location 0 and normal at location 1; texcoords are carried but unread.
pub(crate) fn vertex_buffer_layout(layout: VertexLayout) -> wgpu::VertexBufferLayout<'static> {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
    ];
    wgpu::VertexBufferLayout {
        array_stride: layout.stride_bytes(),
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRIBUTES,
    }
}

/// GPU-resident mesh owned by the [`WgpuBackend`](crate::WgpuBackend).
///
/// Buffers are destroyed when the handle drops.
#[derive(Debug)]
pub struct GpuMesh {
    label: String,
    layout: VertexLayout,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    lines: Option<(wgpu::Buffer, u32)>,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuMesh {
    /// Upload `mesh`. With `line_fallback`, an extra line-list index buffer
    /// is built for wireframe drawing on devices without line polygon mode.
    pub(crate) fn upload(
        device: &wgpu::Device,
        uniform_layout: &wgpu::BindGroupLayout,
        label: &str,
        mesh: &MeshData,
        line_fallback: bool,
    ) -> Result<Self, RenderError> {
        if mesh.indices().is_empty() {
            return Err(RenderError::EmptyMesh {
                label: label.to_string(),
            });
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(mesh.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(mesh.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        let lines = line_fallback.then(|| {
            let line_indices = mesh.wireframe_indices();
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label}_line_buffer")),
                contents: bytemuck::cast_slice(&line_indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            (buffer, line_indices.len() as u32)
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_uniforms")),
            contents: bytemuck::bytes_of(&MeshUniforms::new(Mat4::IDENTITY, Vec3::ONE)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}_bind_group")),
            layout: uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        tracing::debug!(
            label,
            vertices = mesh.vertex_count(),
            indices = mesh.indices().len(),
            "mesh uploaded"
        );

        Ok(Self {
            label: label.to_string(),
            layout: mesh.layout(),
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices().len() as u32,
            lines,
            uniform_buffer,
            bind_group,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub(crate) fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub(crate) fn triangles(&self) -> (&wgpu::Buffer, u32) {
        (&self.index_buffer, self.index_count)
    }

    pub(crate) fn lines(&self) -> Option<(&wgpu::Buffer, u32)> {
        self.lines.as_ref().map(|(buffer, count)| (buffer, *count))
    }

    pub(crate) fn uniform_buffer(&self) -> &wgpu::Buffer {
        &self.uniform_buffer
    }

    pub(crate) fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

impl Drop for GpuMesh {
    fn drop(&mut self) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        if let Some((buffer, _)) = &self.lines {
            buffer.destroy();
        }
        self.uniform_buffer.destroy();
        tracing::trace!(label = %self.label, "mesh released");
    }
}
