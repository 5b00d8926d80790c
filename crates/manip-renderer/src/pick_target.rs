//! Offscreen wgpu pick target
//!
//! Draws are collected on the CPU during a pass (already in world space, one
//! flat color per vertex) and submitted as a single render pass when the
//! pass ends. Readback copies just the requested region into a staging
//! buffer and blocks until it is mapped.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use manip_core::camera::Viewport;
use manip_core::color::PickColor;
use manip_core::picker::{PickError, PickMesh, PickTarget, Region};
use wgpu::util::DeviceExt;

/// Color format of the pick texture. Unorm so palette values survive exactly.
pub const PICK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const BYTES_PER_PIXEL: u32 = 4;

/// World-space vertex with its pick color
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PickVertex {
    /// World-space position
    pub position: [f32; 3],
    /// Pick color, alpha always 255
    pub color: [u8; 4],
}

/// Row pitch of a texture-to-buffer copy for `width` pixels
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strip row padding from mapped readback data
pub fn unpad_rows(data: &[u8], width: u32, height: u32, padded_row: u32) -> Vec<PickColor> {
    let row_bytes = (width * BYTES_PER_PIXEL) as usize;
    let mut pixels = Vec::with_capacity((width * height) as usize);
    for row in 0..height as usize {
        let start = row * padded_row as usize;
        let Some(bytes) = data.get(start..start + row_bytes) else {
            break;
        };
        pixels.extend(
            bytes
                .chunks_exact(BYTES_PER_PIXEL as usize)
                .map(|texel| PickColor::from_rgba8([texel[0], texel[1], texel[2], texel[3]])),
        );
    }
    pixels
}

struct Targets {
    width: u32,
    height: u32,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
}

/// GPU pick target: single-sampled `Rgba8Unorm` color plus depth
pub struct WgpuPickTarget {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    targets: Option<Targets>,
    vertices: Vec<PickVertex>,
    indices: Vec<u32>,
    bound: bool,
}

impl WgpuPickTarget {
    /// Create the pick pipeline. Textures are allocated on the first pass.
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Pick Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/pick.wgsl").into()),
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Pick Uniform Buffer"),
            contents: bytemuck::cast_slice(&[Mat4::IDENTITY.to_cols_array_2d()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Pick Bind Group Layout"),
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
            label: Some("Pick Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Pick Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Pick Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<PickVertex>() as u64,
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
                            format: wgpu::VertexFormat::Unorm8x4,
                        },
                    ],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: PICK_FORMAT,
                    // Blending would mix palette colors
                    blend: None,
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
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        Self {
            device,
            queue,
            pipeline,
            uniform_buffer,
            bind_group,
            targets: None,
            vertices: Vec::new(),
            indices: Vec::new(),
            bound: false,
        }
    }

    fn ensure_targets(&mut self, width: u32, height: u32) {
        if let Some(targets) = &self.targets
            && targets.width == width
            && targets.height == height
        {
            return;
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let color = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Pick Color Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: PICK_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let depth = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Pick Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        tracing::debug!(width, height, "Pick target resized");

        self.targets = Some(Targets {
            width,
            height,
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            color,
        });
    }

    /// Submit the collected geometry in one render pass
    fn flush(&mut self) {
        let Some(targets) = &self.targets else {
            return;
        };

        let buffers = (!self.indices.is_empty()).then(|| {
            let vertex_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Pick Vertex Buffer"),
                    contents: bytemuck::cast_slice(&self.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            let index_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Pick Index Buffer"),
                    contents: bytemuck::cast_slice(&self.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
            (vertex_buffer, index_buffer)
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Pick Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Pick Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &targets.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &targets.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some((vertex_buffer, index_buffer)) = &buffers {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_bind_group(0, &self.bind_group, &[]);
                render_pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..self.indices.len() as u32, 0, 0..1);
            }
        }
        self.queue.submit(Some(encoder.finish()));

        self.vertices.clear();
        self.indices.clear();
    }
}

impl PickTarget for WgpuPickTarget {
    fn begin(
        &mut self,
        view: Mat4,
        projection: Mat4,
        viewport: Viewport,
    ) -> Result<(), PickError> {
        if self.bound {
            return Err(PickError::TargetUnavailable(
                "a pick pass is already open".into(),
            ));
        }
        let (width, height) = viewport.pixel_size();
        let limit = self.device.limits().max_texture_dimension_2d;
        if width > limit || height > limit {
            return Err(PickError::TargetUnavailable(format!(
                "{width}x{height} exceeds the {limit} texture limit"
            )));
        }

        self.ensure_targets(width, height);
        let view_projection = projection * view;
        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[view_projection.to_cols_array_2d()]),
        );
        self.vertices.clear();
        self.indices.clear();
        self.bound = true;
        Ok(())
    }

    fn draw_flat(&mut self, mesh: &PickMesh<'_>, color: PickColor) {
        if !self.bound {
            tracing::warn!("draw_flat called outside of a pick pass");
            return;
        }
        let base = self.vertices.len() as u32;
        let rgba = [color.r, color.g, color.b, 255];
        self.vertices.extend(mesh.positions.iter().map(|p| PickVertex {
            position: mesh.transform.transform_point3(Vec3::from(*p)).into(),
            color: rgba,
        }));
        self.indices.extend(mesh.indices.iter().map(|i| base + i));
    }

    fn end(&mut self) {
        if !self.bound {
            return;
        }
        self.flush();
        self.bound = false;
    }

    fn size(&self) -> (u32, u32) {
        self.targets
            .as_ref()
            .map(|t| (t.width, t.height))
            .unwrap_or((0, 0))
    }

    fn read_pixels(&mut self, region: Region) -> Result<Vec<PickColor>, PickError> {
        let targets = self
            .targets
            .as_ref()
            .ok_or_else(|| PickError::Readback("no pick pass has run".into()))?;
        if region.left < 0
            || region.top < 0
            || region.width == 0
            || region.height == 0
            || region.left as u32 + region.width > targets.width
            || region.top as u32 + region.height > targets.height
        {
            return Err(PickError::Readback(format!(
                "region {:?} outside {}x{} target",
                region, targets.width, targets.height
            )));
        }

        let padded_row = padded_bytes_per_row(region.width);
        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Pick Staging Buffer"),
            size: padded_row as u64 * region.height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Pick Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &targets.color,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: region.left as u32,
                    y: region.top as u32,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(region.height),
                },
            },
            wgpu::Extent3d {
                width: region.width,
                height: region.height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        // Blocking map: the region is small and the result is needed this frame
        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            sender.send(result).ok();
        });
        self.device.poll(wgpu::Maintain::Wait);

        match receiver.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(PickError::Readback(e.to_string())),
            Err(e) => return Err(PickError::Readback(e.to_string())),
        }

        let pixels = {
            let data = buffer_slice.get_mapped_range();
            unpad_rows(&data, region.width, region.height, padded_row)
        };
        staging_buffer.unmap();
        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_padding() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(20), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
    }

    #[test]
    fn test_unpad_rows() {
        let width = 2;
        let height = 2;
        let padded = padded_bytes_per_row(width);
        let mut data = vec![0u8; (padded * height) as usize];
        data[0..4].copy_from_slice(&[255, 0, 0, 255]);
        data[4..8].copy_from_slice(&[0, 255, 0, 255]);
        let second = padded as usize;
        data[second..second + 4].copy_from_slice(&[1, 0, 0, 255]);

        let pixels = unpad_rows(&data, width, height, padded);
        assert_eq!(
            pixels,
            vec![
                PickColor::RED,
                PickColor::GREEN,
                PickColor::new(1, 0, 0),
                PickColor::BACKGROUND,
            ]
        );
    }

    #[test]
    fn test_unpad_rows_short_buffer() {
        let pixels = unpad_rows(&[255, 255, 255, 255], 1, 2, 256);
        assert_eq!(pixels, vec![PickColor::WHITE]);
    }

    #[test]
    fn test_pick_vertex_layout() {
        assert_eq!(std::mem::size_of::<PickVertex>(), 16);
    }
}
