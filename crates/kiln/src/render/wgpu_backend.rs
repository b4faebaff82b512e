//! # WgpuBackend — the real GPU implementation of [`RenderBackend`]
//!
//! wgpu has no global "current program" or "current uniform" state, so the
//! backend keeps that state itself and replays it at the end of the frame:
//!
//! ```text
//!  during the frame                       present()
//!  ────────────────                       ─────────
//!  use_shader ──► current shader          write all uniform slots
//!  bind_texture ─► current texture        ─► one queue.write_buffer
//!  set_uniform_* ► current uniform block
//!  draw_* ──────► snapshot into slot N    one render pass:
//!                  + DrawCommand            per draw: pipeline,
//!                                           bind group 0 @ offset N,
//!                                           bind group 1 (texture),
//!                                           vertex/index buffers,
//!                                           draw_indexed
//! ```
//!
//! Per-draw uniforms live in one buffer addressed with a dynamic offset.
//! Slots are `ObjectUniforms::SIZE` rounded up to the device's
//! `min_uniform_buffer_offset_alignment`; the buffer doubles when a frame
//! needs more slots than it has.
//!
//! Batch buffers are written with `queue.write_buffer` at the time of the
//! call, so a batch written twice in one frame draws its last contents both
//! times.

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use super::gpu::GpuContext;
use super::shader::{Shader, reflect_uniforms};
use super::vertex::{ObjectUniforms, Vertex};
use super::{BatchBufferId, FilterMode, MeshId, RenderBackend, ShaderId, TextureId, UniformLocation};
use crate::color::Color;
use crate::error::RenderError;
use crate::math::Mat4;

const INITIAL_UNIFORM_SLOTS: u32 = 256;

struct MeshEntry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
}

struct TextureEntry {
    bind_group: wgpu::BindGroup,
}

struct BatchEntry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    max_vertices: u32,
    max_indices: u32,
}

#[derive(Clone, Copy)]
enum DrawTarget {
    Mesh(MeshId),
    Batch(BatchBufferId),
}

#[derive(Clone, Copy)]
struct DrawCommand {
    shader: ShaderId,
    texture: Option<TextureId>,
    target: DrawTarget,
    index_count: u32,
    slot: u32,
}

/// Records renderer commands during a frame and executes them in
/// [`present`](Self::present).
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,

    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    nearest_sampler: wgpu::Sampler,
    linear_sampler: wgpu::Sampler,
    white: TextureEntry,

    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,
    uniform_slots: u32,

    next_id: u32,
    meshes: HashMap<MeshId, MeshEntry>,
    textures: HashMap<TextureId, TextureEntry>,
    pipelines: HashMap<ShaderId, wgpu::RenderPipeline>,
    batches: HashMap<BatchBufferId, BatchEntry>,

    current_shader: Option<ShaderId>,
    current_texture: Option<TextureId>,
    current_uniforms: ObjectUniforms,
    frame_uniforms: Vec<ObjectUniforms>,
    draws: Vec<DrawCommand>,
}

impl WgpuBackend {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = gpu.device.clone();

        // Bind group layout 0: per-draw uniforms, dynamic offset
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object uniform bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(ObjectUniforms::SIZE),
                },
                count: None,
            }],
        });

        // Bind group layout 1: texture + sampler
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("kiln pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let nearest_sampler = create_sampler(&device, FilterMode::Nearest);
        let linear_sampler = create_sampler(&device, FilterMode::Linear);

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_stride = ObjectUniforms::SIZE.div_ceil(alignment) * alignment;
        let (uniform_buffer, uniform_bind_group) =
            create_uniform_buffer(&device, &uniform_layout, uniform_stride, INITIAL_UNIFORM_SLOTS);

        let white = create_texture_entry(
            &device,
            &gpu.queue,
            &texture_layout,
            &linear_sampler,
            "white 1x1",
            1,
            1,
            &[255, 255, 255, 255],
        );

        Self {
            device,
            queue: gpu.queue.clone(),
            surface_format: gpu.surface_format(),
            uniform_layout,
            texture_layout,
            pipeline_layout,
            nearest_sampler,
            linear_sampler,
            white,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            uniform_slots: INITIAL_UNIFORM_SLOTS,
            next_id: 0,
            meshes: HashMap::new(),
            textures: HashMap::new(),
            pipelines: HashMap::new(),
            batches: HashMap::new(),
            current_shader: None,
            current_texture: None,
            current_uniforms: ObjectUniforms::default(),
            frame_uniforms: Vec::new(),
            draws: Vec::new(),
        }
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn sampler(&self, filter: FilterMode) -> &wgpu::Sampler {
        match filter {
            FilterMode::Nearest => &self.nearest_sampler,
            FilterMode::Linear => &self.linear_sampler,
        }
    }

    fn record_draw(&mut self, target: DrawTarget, index_count: u32) {
        let Some(shader) = self.current_shader else {
            log::warn!("draw issued with no shader in use, skipping");
            return;
        };
        let slot = self.frame_uniforms.len() as u32;
        self.frame_uniforms.push(self.current_uniforms);
        self.draws.push(DrawCommand {
            shader,
            texture: self.current_texture,
            target,
            index_count,
            slot,
        });
    }

    fn ensure_uniform_capacity(&mut self, slots: u32) {
        if slots <= self.uniform_slots {
            return;
        }
        let new_slots = slots.next_power_of_two();
        log::debug!("growing uniform buffer to {new_slots} slots");
        let (buffer, bind_group) =
            create_uniform_buffer(&self.device, &self.uniform_layout, self.uniform_stride, new_slots);
        self.uniform_buffer = buffer;
        self.uniform_bind_group = bind_group;
        self.uniform_slots = new_slots;
    }

    /// Drop everything recorded this frame without drawing it.
    pub fn discard_frame(&mut self) {
        self.draws.clear();
        self.frame_uniforms.clear();
    }

    /// Execute the frame's draws in one render pass and present.
    ///
    /// Recorded commands are consumed whether or not the surface could be
    /// acquired.
    pub fn present(&mut self, gpu: &GpuContext, clear: Color) -> Result<(), wgpu::SurfaceError> {
        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(e) => {
                self.discard_frame();
                return Err(e);
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.ensure_uniform_capacity(self.frame_uniforms.len() as u32);
        if !self.frame_uniforms.is_empty() {
            let stride = self.uniform_stride as usize;
            let mut bytes = vec![0u8; stride * self.frame_uniforms.len()];
            for (i, block) in self.frame_uniforms.iter().enumerate() {
                let start = i * stride;
                bytes[start..start + ObjectUniforms::SIZE as usize]
                    .copy_from_slice(bytemuck::bytes_of(block));
            }
            self.queue.write_buffer(&self.uniform_buffer, 0, &bytes);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("kiln frame encoder"),
            });

        {
            let [r, g, b, a] = clear.to_f64_array();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("kiln main pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for draw in &self.draws {
                let Some(pipeline) = self.pipelines.get(&draw.shader) else {
                    log::warn!("unknown shader {} at present, skipping draw", draw.shader.0);
                    continue;
                };
                let texture = draw
                    .texture
                    .and_then(|id| self.textures.get(&id))
                    .unwrap_or(&self.white);
                let (vertex_buffer, index_buffer) = match draw.target {
                    DrawTarget::Mesh(id) => match self.meshes.get(&id) {
                        Some(mesh) => (&mesh.vertex_buffer, &mesh.index_buffer),
                        None => {
                            log::warn!("unknown mesh {} at present, skipping draw", id.0);
                            continue;
                        }
                    },
                    DrawTarget::Batch(id) => match self.batches.get(&id) {
                        Some(batch) => (&batch.vertex_buffer, &batch.index_buffer),
                        None => {
                            log::warn!("unknown batch buffer {} at present, skipping draw", id.0);
                            continue;
                        }
                    },
                };

                let offset = (draw.slot as u64 * self.uniform_stride) as wgpu::DynamicOffset;
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[offset]);
                pass.set_bind_group(1, &texture.bind_group, &[]);
                pass.set_vertex_buffer(0, vertex_buffer.slice(..));
                pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        self.discard_frame();

        Ok(())
    }
}

impl RenderBackend for WgpuBackend {
    fn create_mesh(&mut self, label: &str, vertices: &[Vertex], indices: &[u32]) -> Result<MeshId, RenderError> {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        let id = MeshId(self.next());
        self.meshes.insert(
            id,
            MeshEntry {
                vertex_buffer,
                index_buffer,
            },
        );
        Ok(id)
    }

    fn create_texture(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
        filter: FilterMode,
    ) -> Result<TextureId, RenderError> {
        let entry = create_texture_entry(
            &self.device,
            &self.queue,
            &self.texture_layout,
            self.sampler(filter),
            label,
            width,
            height,
            rgba,
        );
        let id = TextureId(self.next());
        self.textures.insert(id, entry);
        Ok(id)
    }

    fn update_texture(
        &mut self,
        id: TextureId,
        width: u32,
        height: u32,
        rgba: &[u8],
        filter: FilterMode,
    ) -> Result<(), RenderError> {
        if !self.textures.contains_key(&id) {
            return Err(RenderError::UnknownHandle { kind: "texture", id: id.0 });
        }
        let entry = create_texture_entry(
            &self.device,
            &self.queue,
            &self.texture_layout,
            self.sampler(filter),
            "updated texture",
            width,
            height,
            rgba,
        );
        self.textures.insert(id, entry);
        Ok(())
    }

    fn create_shader(&mut self, label: &str, source: &str) -> Result<Shader, RenderError> {
        // Catch validation errors instead of hitting the uncaptured-error panic.
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &module,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &module,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.surface_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::ShaderCompile {
                label: label.to_owned(),
                message: err.to_string(),
            });
        }

        let id = ShaderId(self.next());
        self.pipelines.insert(id, pipeline);
        log::debug!("compiled shader '{label}' as {}", id.0);
        Ok(Shader::new(id, label, reflect_uniforms(source)))
    }

    fn create_batch_buffer(&mut self, max_vertices: u32, max_indices: u32) -> Result<BatchBufferId, RenderError> {
        let vertex_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("batch vertex buffer"),
            size: (max_vertices.max(1) as u64) * std::mem::size_of::<Vertex>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let index_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("batch index buffer"),
            size: (max_indices.max(1) as u64) * std::mem::size_of::<u32>() as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let id = BatchBufferId(self.next());
        self.batches.insert(
            id,
            BatchEntry {
                vertex_buffer,
                index_buffer,
                max_vertices,
                max_indices,
            },
        );
        Ok(id)
    }

    fn write_batch_buffer(&mut self, id: BatchBufferId, vertices: &[Vertex], indices: &[u32]) {
        let Some(batch) = self.batches.get(&id) else {
            log::warn!("write to unknown batch buffer {}", id.0);
            return;
        };
        let vertices = &vertices[..vertices.len().min(batch.max_vertices as usize)];
        let indices = &indices[..indices.len().min(batch.max_indices as usize)];
        if !vertices.is_empty() {
            self.queue
                .write_buffer(&batch.vertex_buffer, 0, bytemuck::cast_slice(vertices));
        }
        // write_buffer sizes must be a multiple of 4 bytes; u32 indices always are.
        if !indices.is_empty() {
            self.queue
                .write_buffer(&batch.index_buffer, 0, bytemuck::cast_slice(indices));
        }
    }

    fn use_shader(&mut self, shader: ShaderId) {
        self.current_shader = Some(shader);
    }

    fn bind_texture(&mut self, texture: TextureId, unit: u32) {
        if unit != 0 {
            log::warn!("only texture unit 0 is supported, ignoring bind to unit {unit}");
            return;
        }
        self.current_texture = Some(texture);
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4) {
        self.current_uniforms.set_mat4(location.0, value);
    }

    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32) {
        self.current_uniforms.set_f32(location.0, value);
    }

    fn draw_mesh(&mut self, mesh: MeshId, index_count: u32) {
        self.record_draw(DrawTarget::Mesh(mesh), index_count);
    }

    fn draw_batch(&mut self, buffer: BatchBufferId, index_count: u32) {
        self.record_draw(DrawTarget::Batch(buffer), index_count);
    }
}

fn create_sampler(device: &wgpu::Device, filter: FilterMode) -> wgpu::Sampler {
    let mode = match filter {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    };
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("kiln sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: mode,
        min_filter: mode,
        ..Default::default()
    })
}

fn create_uniform_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    stride: u64,
    slots: u32,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("object uniform buffer"),
        size: stride * slots as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("object uniform bind group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(ObjectUniforms::SIZE),
            }),
        }],
    });
    (buffer, bind_group)
}

#[allow(clippy::too_many_arguments)]
fn create_texture_entry(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    label: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> TextureEntry {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        rgba,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    TextureEntry { bind_group }
}
