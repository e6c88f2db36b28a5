use crate::mesh::{FrameUniforms, GpuMesh, MeshUniforms, vertex_buffer_layout};
use crate::shaders;
use bytemuck::Zeroable;
use cisco_assets::{MeshData, VertexLayout};
use cisco_render::{FillMode, Frame, GraphicsBackend, RenderError};
use cisco_scene::MeshUploader;
use std::collections::HashMap;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const LAYOUTS: [VertexLayout; 2] = [VertexLayout::PositionNormal, VertexLayout::PositionNormalUv];
const FILLS: [FillMode; 2] = [FillMode::Solid, FillMode::Wireframe];

/// How wireframe draws are rasterised on this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireframeMode {
    /// Triangles drawn with `PolygonMode::Line`.
    PolygonLine,
    /// Triangle edges expanded into a line-list index buffer at upload.
    LineList,
}

impl WireframeMode {
    fn for_features(features: wgpu::Features) -> Self {
        if features.contains(wgpu::Features::POLYGON_MODE_LINE) {
            WireframeMode::PolygonLine
        } else {
            WireframeMode::LineList
        }
    }

    fn primitive(self, fill: FillMode) -> wgpu::PrimitiveState {
        match (fill, self) {
            (FillMode::Solid, _) => wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            (FillMode::Wireframe, WireframeMode::PolygonLine) => wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                polygon_mode: wgpu::PolygonMode::Line,
                ..Default::default()
            },
            (FillMode::Wireframe, WireframeMode::LineList) => wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
        }
    }
}

/// wgpu graphics backend drawing into a window surface.
///
/// Owns the surface, device and queue. One pipeline exists per vertex
/// layout and fill mode; each draw selects its own, so no rasteriser state
/// carries over between draws.
pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    wireframe: WireframeMode,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    mesh_layout: wgpu::BindGroupLayout,
    pipelines: HashMap<(VertexLayout, FillMode), wgpu::RenderPipeline>,
    depth_view: wgpu::TextureView,
}

impl WgpuBackend {
    /// Create a surface for `target`, pick an adapter and build pipelines.
    pub fn new(
        target: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(target)
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        let wireframe = WireframeMode::for_features(adapter.features());
        let required_features = match wireframe {
            WireframeMode::PolygonLine => wgpu::Features::POLYGON_MODE_LINE,
            WireframeMode::LineList => wgpu::Features::empty(),
        };

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("cisco_device"),
                required_features,
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::Device(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::Surface("surface reports no formats".into()))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let frame_layout = uniform_layout(&device, "frame_bind_group_layout");
        let mesh_layout = uniform_layout(&device, "mesh_bind_group_layout");

        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &mesh_layout],
            push_constant_ranges: &[],
        });

        let shader = shaders::compile_lighting_shader(&device)?;
        let mut pipelines = HashMap::new();
        for layout in LAYOUTS {
            for fill in FILLS {
                let pipeline = create_pipeline(
                    &device,
                    &pipeline_layout,
                    &shader,
                    surface_format,
                    layout,
                    wireframe.primitive(fill),
                )?;
                pipelines.insert((layout, fill), pipeline);
            }
        }

        let depth_view = create_depth_texture(&device, config.width, config.height);

        let info = adapter.get_info();
        tracing::info!(
            backend = info.backend.to_str(),
            adapter = %info.name,
            format = ?surface_format,
            wireframe = ?wireframe,
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            wireframe,
            frame_buffer,
            frame_bind_group,
            mesh_layout,
            pipelines,
            depth_view,
        })
    }

    pub fn wireframe_mode(&self) -> WireframeMode {
        self.wireframe
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Reconfigure the surface and depth buffer. Zero sizes (minimised
    /// windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_texture(&self.device, width, height);
        tracing::debug!(width, height, "surface resized");
    }

    fn acquire(&self) -> Result<Option<wgpu::SurfaceTexture>, RenderError> {
        match self.surface.get_current_texture() {
            Ok(texture) => Ok(Some(texture)),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                Ok(None)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timed out; skipping frame");
                Ok(None)
            }
            Err(e) => Err(RenderError::Frame(e.to_string())),
        }
    }
}

impl MeshUploader for WgpuBackend {
    type Mesh = GpuMesh;
    type Error = RenderError;

    fn upload_mesh(&mut self, label: &str, mesh: &MeshData) -> Result<GpuMesh, RenderError> {
        GpuMesh::upload(
            &self.device,
            &self.mesh_layout,
            label,
            mesh,
            self.wireframe == WireframeMode::LineList,
        )
    }
}

impl GraphicsBackend for WgpuBackend {
    fn submit(&mut self, frame: &Frame<'_, GpuMesh>) -> Result<(), RenderError> {
        let Some(output) = self.acquire()? else {
            return Ok(());
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::new(frame)),
        );
        for draw in &frame.draws {
            self.queue.write_buffer(
                draw.mesh.uniform_buffer(),
                0,
                bytemuck::bytes_of(&MeshUniforms::new(draw.model, draw.color)),
            );
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        {
            let [r, g, b, a] = frame.clear_color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.frame_bind_group, &[]);

            for draw in &frame.draws {
                let pipeline = self.pipelines.get(&(draw.layout, draw.fill)).ok_or_else(|| {
                    RenderError::Pipeline {
                        label: draw.label.to_string(),
                        message: format!("no pipeline for {:?}/{:?}", draw.layout, draw.fill),
                    }
                })?;

                let (indices, count) = match (draw.fill, self.wireframe) {
                    (FillMode::Wireframe, WireframeMode::LineList) => {
                        draw.mesh.lines().unwrap_or_else(|| draw.mesh.triangles())
                    }
                    _ => (draw.mesh.triangles().0, draw.index_count),
                };

                pass.set_pipeline(pipeline);
                pass.set_bind_group(1, draw.mesh.bind_group(), &[]);
                pass.set_vertex_buffer(0, draw.mesh.vertex_buffer().slice(..));
                pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

fn create_pipeline(
    device: &wgpu::Device,
    pipeline_layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    layout: VertexLayout,
    primitive: wgpu::PrimitiveState,
) -> Result<wgpu::RenderPipeline, RenderError> {
    let label = format!("{layout:?}_{:?}_pipeline", primitive.topology);

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&label),
        layout: Some(pipeline_layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[vertex_buffer_layout(layout)],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive,
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    });
    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        return Err(RenderError::Pipeline {
            label,
            message: error.to_string(),
        });
    }
    Ok(pipeline)
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wireframe_mode_follows_features() {
        assert_eq!(
            WireframeMode::for_features(wgpu::Features::POLYGON_MODE_LINE),
            WireframeMode::PolygonLine
        );
        assert_eq!(
            WireframeMode::for_features(wgpu::Features::empty()),
            WireframeMode::LineList
        );
    }

    #[test]
    fn solid_draws_always_fill_triangles() {
        for mode in [WireframeMode::PolygonLine, WireframeMode::LineList] {
            let p = mode.primitive(FillMode::Solid);
            assert_eq!(p.topology, wgpu::PrimitiveTopology::TriangleList);
            assert_eq!(p.polygon_mode, wgpu::PolygonMode::Fill);
        }
    }

    #[test]
    fn wireframe_primitive_per_mode() {
        let line = WireframeMode::PolygonLine.primitive(FillMode::Wireframe);
        assert_eq!(line.polygon_mode, wgpu::PolygonMode::Line);

        let list = WireframeMode::LineList.primitive(FillMode::Wireframe);
        assert_eq!(list.topology, wgpu::PrimitiveTopology::LineList);
        assert_eq!(list.polygon_mode, wgpu::PolygonMode::Fill);
    }

    #[test]
    fn pipeline_keys_cover_every_draw() {
        let keys: Vec<_> = LAYOUTS
            .iter()
            .flat_map(|l| FILLS.iter().map(move |f| (*l, *f)))
            .collect();
        assert_eq!(keys.len(), 4);
        assert!(keys.contains(&(VertexLayout::PositionNormalUv, FillMode::Wireframe)));
    }
}
