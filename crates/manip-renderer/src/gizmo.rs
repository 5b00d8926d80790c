//! Visible gizmo renderer
//!
//! Holds one vertex/index buffer pair per gizmo mode and a uniform with the
//! camera, the gizmo world matrix and one color per part. Each frame the
//! host passes the session's [`GizmoDrawData`] to [`GizmoRenderer::prepare`]
//! and then records [`GizmoRenderer::render`] into its main pass.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use manip_core::camera::Camera;
use manip_core::gizmo::{GizmoDrawData, GizmoGeometry, GizmoMode, GizmoVertex};
use wgpu::util::DeviceExt;

/// Gizmo uniform data
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GizmoUniform {
    /// Camera view-projection
    pub view_proj: [[f32; 4]; 4],
    /// Gizmo-to-world transform
    pub model: [[f32; 4]; 4],
    /// Color per part index; the eighth slot pads the array
    pub part_colors: [[f32; 4]; 8],
}

impl Default for GizmoUniform {
    fn default() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            part_colors: [[0.0; 4]; 8],
        }
    }
}

impl GizmoUniform {
    /// Uniform contents for one frame
    pub fn from_draw_data(camera: &Camera, data: &GizmoDrawData) -> Self {
        let mut part_colors = [[0.0; 4]; 8];
        part_colors[..data.part_colors.len()].copy_from_slice(&data.part_colors);
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            model: data.world_matrix.to_cols_array_2d(),
            part_colors,
        }
    }
}

struct ModeBuffers {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl ModeBuffers {
    fn new(device: &wgpu::Device, mode: GizmoMode) -> Self {
        let (vertices, indices) = GizmoGeometry::for_mode(mode).vertices();
        let name = mode.display_name();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Gizmo {name} Vertex Buffer")),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Gizmo {name} Index Buffer")),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }
}

/// Gizmo renderer
pub struct GizmoRenderer {
    pipeline: wgpu::RenderPipeline,
    translate: ModeBuffers,
    rotate: ModeBuffers,
    scale: ModeBuffers,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    mode: GizmoMode,
    visible: bool,
}

impl GizmoRenderer {
    /// Build the pipeline and upload geometry for all three modes
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Gizmo Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/gizmo.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Gizmo Uniform Buffer"),
            contents: bytemuck::cast_slice(&[GizmoUniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Gizmo Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Gizmo Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Gizmo Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Gizmo Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<GizmoVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x3,
                        },
                        wgpu::VertexAttribute {
                            offset: 12,
                            shader_location: 1,
                            format: wgpu::VertexFormat::Uint32,
                        },
                    ],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: false, // Gizmo always on top
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            translate: ModeBuffers::new(device, GizmoMode::Translate),
            rotate: ModeBuffers::new(device, GizmoMode::Rotate),
            scale: ModeBuffers::new(device, GizmoMode::Scale),
            uniform_buffer,
            bind_group,
            mode: GizmoMode::Translate,
            visible: false,
        }
    }

    /// Upload this frame's gizmo state. `None` hides the gizmo.
    pub fn prepare(&mut self, queue: &wgpu::Queue, camera: &Camera, data: Option<&GizmoDrawData>) {
        let Some(data) = data else {
            self.visible = false;
            return;
        };
        self.visible = true;
        self.mode = data.mode;
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[GizmoUniform::from_draw_data(camera, data)]),
        );
    }

    /// Whether the last [`prepare`](Self::prepare) call showed the gizmo
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Record the gizmo draw into `render_pass`
    pub fn render<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        if !self.visible {
            return;
        }

        let buffers = match self.mode {
            GizmoMode::Translate => &self.translate,
            GizmoMode::Rotate => &self.rotate,
            GizmoMode::Scale => &self.scale,
        };
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
        render_pass.set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..buffers.index_count, 0, 0..1);
    }
}
