//! wgpu renderer shared by the web and native front-ends.
//!
//! The front-end owns the surface, device and queue; this type owns the
//! pipelines and buffers and records one frame into a given texture view.

use crate::frame::FrameContext;
use crate::layout::OrnamentKind;
use crate::particles::{FamilyAttributes, ParticleFamily};
use crate::photos::{Photo, PhotoId, PhotoPixels};
use crate::scene::Scene;
use fnv::FnvHashMap;
use glam::{Mat4, Vec3};
use std::hash::{Hash, Hasher};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct FamilyUniforms {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    time: f32,
    progress: f32,
    pixel_ratio: f32,
    kind: f32,
    viewport: [f32; 2],
    _pad: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadUniforms {
    view_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct QuadInstance {
    model: [[f32; 4]; 4],
    tint: [f32; 4],
    params: [f32; 4],
}

const QUAD_CORNERS: [f32; 12] = [
    -0.5, -0.5, 0.5, -0.5, 0.5, 0.5, -0.5, -0.5, 0.5, 0.5, -0.5, 0.5,
];

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.01,
    g: 0.015,
    b: 0.03,
    a: 1.0,
};

/// GPU side of one particle family: one vertex buffer per attribute plus a
/// uniform block.
struct FamilyGpu {
    count: u32,
    positions: wgpu::Buffer,
    colors: wgpu::Buffer,
    sizes: wgpu::Buffer,
    intensities: wgpu::Buffer,
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    kind: f32,
}

fn attribute_buffer(device: &wgpu::Device, label: &str, floats: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (floats.max(1) * std::mem::size_of::<f32>()) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl FamilyGpu {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        family: &dyn ParticleFamily,
        kind: f32,
    ) -> Self {
        let name = family.name();
        let attrs = family.attributes();
        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(name),
            size: std::mem::size_of::<FamilyUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(name),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });
        Self {
            count: attrs.len() as u32,
            positions: attribute_buffer(device, "positions", attrs.positions.len()),
            colors: attribute_buffer(device, "colors", attrs.colors.len()),
            sizes: attribute_buffer(device, "sizes", attrs.sizes.len()),
            intensities: attribute_buffer(device, "intensities", attrs.intensities.len()),
            uniforms,
            bind_group,
            kind,
        }
    }

    fn upload(&self, queue: &wgpu::Queue, attrs: &FamilyAttributes<'_>, uniforms: &FamilyUniforms) {
        if self.count == 0 {
            return;
        }
        queue.write_buffer(&self.positions, 0, bytemuck::cast_slice(attrs.positions));
        queue.write_buffer(&self.colors, 0, bytemuck::cast_slice(attrs.colors));
        queue.write_buffer(&self.sizes, 0, bytemuck::cast_slice(attrs.sizes));
        queue.write_buffer(&self.intensities, 0, bytemuck::cast_slice(attrs.intensities));
        queue.write_buffer(&self.uniforms, 0, bytemuck::bytes_of(uniforms));
    }
}

/// Uploaded photo texture; the bind group keeps the view alive.
struct PhotoTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

fn image_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    texture: &wgpu::Texture,
) -> wgpu::BindGroup {
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("photo_image_bg"),
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
    })
}

fn upload_rgba(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("photo_image"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );
    texture
}

/// Stable per-photo card tint derived from its id; shown until the photo's
/// pixels have been uploaded.
pub fn photo_tint(photo: &Photo) -> [f32; 4] {
    let mut h = fnv::FnvHasher::default();
    photo.id.hash(&mut h);
    let hue = (h.finish() % 360) as f32 / 360.0;
    let channel = |offset: f32| 0.55 + 0.35 * ((hue + offset) * std::f32::consts::TAU).cos();
    [channel(0.0), channel(1.0 / 3.0), channel(2.0 / 3.0), 1.0]
}

pub struct SceneRenderer {
    particle_pipeline: wgpu::RenderPipeline,
    quad_pipeline: wgpu::RenderPipeline,
    corners: wgpu::Buffer,
    families: Vec<FamilyGpu>,
    quad_uniforms: wgpu::Buffer,
    quad_bind_group: wgpu::BindGroup,
    quad_instances: wgpu::Buffer,
    quad_capacity: usize,
    scratch: Vec<QuadInstance>,
    image_bgl: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    /// 1x1 white stand-in bound for ornaments and untextured photos.
    blank: PhotoTexture,
    photo_textures: FnvHashMap<PhotoId, PhotoTexture>,
    /// Photo ids in the order their instances follow the ornaments.
    photo_draws: Vec<PhotoId>,
    ornament_draws: u32,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        scene: &Scene,
    ) -> Self {
        let particle_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("particles_shader"),
            source: wgpu::ShaderSource::Wgsl(crate::PARTICLES_WGSL.into()),
        });
        let quad_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("quads_shader"),
            source: wgpu::ShaderSource::Wgsl(crate::QUADS_WGSL.into()),
        });
        let uniform_layout = |label: &str| {
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
        };
        let family_bgl = uniform_layout("family_bgl");
        let quad_bgl = uniform_layout("quad_bgl");
        let image_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("photo_image_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
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
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("photo_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let corner_layout = wgpu::VertexBufferLayout {
            array_stride: (std::mem::size_of::<f32>() * 2) as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 0,
                shader_location: 0,
            }],
        };
        let per_instance = |format: wgpu::VertexFormat, location: u32, floats: usize| {
            (
                (std::mem::size_of::<f32>() * floats) as u64,
                [wgpu::VertexAttribute {
                    format,
                    offset: 0,
                    shader_location: location,
                }],
            )
        };
        let position = per_instance(wgpu::VertexFormat::Float32x3, 1, 3);
        let color = per_instance(wgpu::VertexFormat::Float32x3, 2, 3);
        let size = per_instance(wgpu::VertexFormat::Float32, 3, 1);
        let intensity = per_instance(wgpu::VertexFormat::Float32, 4, 1);
        let particle_buffers = [
            corner_layout.clone(),
            wgpu::VertexBufferLayout {
                array_stride: position.0,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &position.1,
            },
            wgpu::VertexBufferLayout {
                array_stride: color.0,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &color.1,
            },
            wgpu::VertexBufferLayout {
                array_stride: size.0,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &size.1,
            },
            wgpu::VertexBufferLayout {
                array_stride: intensity.0,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &intensity.1,
            },
        ];
        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::OVER,
        };
        let particle_pl = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("particles_pl"),
            bind_group_layouts: &[&family_bgl],
            push_constant_ranges: &[],
        });
        let particle_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("particles_pipeline"),
            layout: Some(&particle_pl),
            vertex: wgpu::VertexState {
                module: &particle_shader,
                entry_point: Some("vs_main"),
                buffers: &particle_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &particle_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(additive),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });

        let quad_attributes = wgpu::vertex_attr_array![
            1 => Float32x4,
            2 => Float32x4,
            3 => Float32x4,
            4 => Float32x4,
            5 => Float32x4,
            6 => Float32x4
        ];
        let quad_buffers = [
            corner_layout,
            wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<QuadInstance>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &quad_attributes,
            },
        ];
        let quad_pl = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("quads_pl"),
            bind_group_layouts: &[&quad_bgl, &image_bgl],
            push_constant_ranges: &[],
        });
        let quad_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("quads_pipeline"),
            layout: Some(&quad_pl),
            vertex: wgpu::VertexState {
                module: &quad_shader,
                entry_point: Some("vs_main"),
                buffers: &quad_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &quad_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });

        let corners = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad_corners"),
            contents: bytemuck::cast_slice(&QUAD_CORNERS),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let quad_uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quad_uniforms"),
            size: std::mem::size_of::<QuadUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let quad_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quad_bg"),
            layout: &quad_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: quad_uniforms.as_entire_binding(),
            }],
        });

        // Ornaments are drawn as quads, not sprites.
        let sources: [(&dyn ParticleFamily, f32); 4] = [
            (scene.foliage(), 0.0),
            (scene.ribbon(), 1.0),
            (scene.lights(), 2.0),
            (scene.halo(), 3.0),
        ];
        let families = sources
            .into_iter()
            .map(|(f, kind)| FamilyGpu::new(device, &family_bgl, f, kind))
            .collect();

        let blank_texture = upload_rgba(device, queue, 1, 1, &[255; 4]);
        let blank = PhotoTexture {
            bind_group: image_bind_group(device, &image_bgl, &sampler, &blank_texture),
            _texture: blank_texture,
        };

        let quad_capacity = 64;
        log::info!("[gpu] renderer ready ({format:?})");
        Self {
            particle_pipeline,
            quad_pipeline,
            corners,
            families,
            quad_uniforms,
            quad_bind_group,
            quad_instances: Self::quad_buffer(device, quad_capacity),
            quad_capacity,
            scratch: Vec::new(),
            image_bgl,
            sampler,
            blank,
            photo_textures: FnvHashMap::default(),
            photo_draws: Vec::new(),
            ornament_draws: 0,
        }
    }

    /// Upload (or replace) the decoded image shown on photo `id`.
    pub fn set_photo_pixels(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: &PhotoId,
        pixels: &PhotoPixels,
    ) {
        let texture = upload_rgba(device, queue, pixels.width(), pixels.height(), pixels.rgba());
        let bind_group = image_bind_group(device, &self.image_bgl, &self.sampler, &texture);
        log::debug!("[gpu] photo {id} texture {}x{}", pixels.width(), pixels.height());
        self.photo_textures.insert(
            id.clone(),
            PhotoTexture {
                _texture: texture,
                bind_group,
            },
        );
    }

    pub fn has_photo_pixels(&self, id: &PhotoId) -> bool {
        self.photo_textures.contains_key(id)
    }

    fn quad_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quad_instances"),
            size: (std::mem::size_of::<QuadInstance>() * capacity.max(1)) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn collect_quads(&mut self, scene: &Scene, parent: Mat4) {
        self.scratch.clear();
        self.photo_draws.clear();
        let ornaments = scene.ornaments();
        let positions = ornaments.attributes().positions;
        for ((o, rot), xyz) in ornaments
            .instances()
            .iter()
            .zip(ornaments.rotations())
            .zip(positions.chunks_exact(3))
        {
            let model = parent
                * Mat4::from_scale_rotation_translation(
                    Vec3::splat(o.scale),
                    *rot,
                    Vec3::new(xyz[0], xyz[1], xyz[2]),
                );
            let (style, gloss) = match o.kind {
                OrnamentKind::Box => (1.0, 0.0),
                OrnamentKind::MetallicBall => (2.0, 0.9),
                OrnamentKind::VelvetBall => (2.0, 0.15),
            };
            self.scratch.push(QuadInstance {
                model: model.to_cols_array_2d(),
                tint: o.color.extend(1.0).to_array(),
                params: [style, 1.0, gloss, 0.0],
            });
        }
        self.ornament_draws = self.scratch.len() as u32;
        for photo in scene.photos().iter() {
            if photo.current_scale <= 1e-3 {
                continue;
            }
            let textured = self.photo_textures.contains_key(&photo.id);
            self.scratch.push(QuadInstance {
                model: (parent * photo.model_matrix()).to_cols_array_2d(),
                tint: photo_tint(photo),
                params: [0.0, photo.aspect_ratio, 0.0, if textured { 1.0 } else { 0.0 }],
            });
            self.photo_draws.push(photo.id.clone());
        }
    }

    /// Record and submit one frame into `target`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        scene: &Scene,
        ctx: &FrameContext,
    ) {
        let camera = scene.camera();
        let view = camera.view_matrix();
        let proj = camera.projection_matrix();
        let parent = scene.rotation().matrix();

        let sources: [&dyn ParticleFamily; 4] =
            [scene.foliage(), scene.ribbon(), scene.lights(), scene.halo()];
        for (gpu, family) in self.families.iter().zip(sources) {
            let uniforms = FamilyUniforms {
                view: view.to_cols_array_2d(),
                proj: proj.to_cols_array_2d(),
                model: parent.to_cols_array_2d(),
                time: ctx.time,
                progress: family.progress().value(),
                pixel_ratio: ctx.pixel_ratio,
                kind: gpu.kind,
                viewport: ctx.viewport.to_array(),
                _pad: [0.0; 2],
            };
            gpu.upload(queue, &family.attributes(), &uniforms);
        }

        // deleted photos release their textures
        let photos = scene.photos();
        self.photo_textures.retain(|id, _| photos.get(id).is_some());
        self.collect_quads(scene, parent);
        if self.scratch.len() > self.quad_capacity {
            self.quad_capacity = self.scratch.len().next_power_of_two();
            self.quad_instances = Self::quad_buffer(device, self.quad_capacity);
            log::debug!("[gpu] quad capacity -> {}", self.quad_capacity);
        }
        if !self.scratch.is_empty() {
            queue.write_buffer(&self.quad_instances, 0, bytemuck::cast_slice(&self.scratch));
        }
        queue.write_buffer(
            &self.quad_uniforms,
            0,
            bytemuck::bytes_of(&QuadUniforms {
                view_proj: (proj * view).to_cols_array_2d(),
                light_dir: [0.3, 0.6, 1.0, 0.0],
            }),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("encoder"),
        });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_vertex_buffer(0, self.corners.slice(..));

            rpass.set_pipeline(&self.particle_pipeline);
            for gpu in self.families.iter().filter(|g| g.count > 0) {
                rpass.set_bind_group(0, &gpu.bind_group, &[]);
                rpass.set_vertex_buffer(1, gpu.positions.slice(..));
                rpass.set_vertex_buffer(2, gpu.colors.slice(..));
                rpass.set_vertex_buffer(3, gpu.sizes.slice(..));
                rpass.set_vertex_buffer(4, gpu.intensities.slice(..));
                rpass.draw(0..6, 0..gpu.count);
            }

            if !self.scratch.is_empty() {
                rpass.set_pipeline(&self.quad_pipeline);
                rpass.set_bind_group(0, &self.quad_bind_group, &[]);
                rpass.set_bind_group(1, &self.blank.bind_group, &[]);
                rpass.set_vertex_buffer(1, self.quad_instances.slice(..));
                if self.ornament_draws > 0 {
                    rpass.draw(0..6, 0..self.ornament_draws);
                }
                // one draw per photo so each binds its own image
                for (i, id) in self.photo_draws.iter().enumerate() {
                    let image = self.photo_textures.get(id).unwrap_or(&self.blank);
                    let instance = self.ornament_draws + i as u32;
                    rpass.set_bind_group(1, &image.bind_group, &[]);
                    rpass.draw(0..6, instance..instance + 1);
                }
            }
        }
        queue.submit(Some(encoder.finish()));
    }
}
