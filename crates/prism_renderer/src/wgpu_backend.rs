use std::{any::Any, collections::HashMap, mem};

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use prism_assets::{TextureData, TextureFormat};
use prism_core::{Rgb, ShaderKind, transform::normal_matrix};
use wgpu::{Device, Queue, RenderPipeline, util::DeviceExt};

use crate::{
    context::DEPTH_FORMAT,
    resources::{GeometryUpload, GpuBackend, MaterialUpload, ResourceId, ResourceKind, Topology},
    shaders::{
        DEFAULT_SHININESS, LINES_WGSL, NORMAL_WGSL, PHONG_WGSL, SILHOUETTE_WGSL, ShaderProgram,
        TOON_WGSL,
    },
};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub tangent: [f32; 4],
}

impl GpuVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2, 3 => Float32x4];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
}

impl LineVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GlobalsUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub sun_direction: [f32; 4],
    pub sun_color: [f32; 4],
    pub ambient_color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    pub params: [f32; 4], // x = shininess, y = use_map, z = opacity
}

impl MaterialUniform {
    fn from_program(program: &ShaderProgram) -> Self {
        let color = program.uniforms.color().unwrap_or(Rgb::WHITE);
        let shininess = program.uniforms.shininess().unwrap_or(DEFAULT_SHININESS);
        let use_map = if program.features.use_map { 1.0 } else { 0.0 };
        Self {
            color: color.extend(1.0),
            params: [shininess, use_map, 1.0, 0.0],
        }
    }

    fn from_upload(upload: &MaterialUpload<'_>) -> Self {
        match *upload {
            MaterialUpload::Program(program) => Self::from_program(program),
            MaterialUpload::Line { color, opacity } => Self {
                color: color.extend(opacity),
                params: [0.0, 0.0, opacity, 0.0],
            },
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
}

impl ObjectUniform {
    pub fn from_world(world: &Mat4) -> Self {
        Self {
            model: world.to_cols_array_2d(),
            normal_matrix: normal_matrix(world).to_cols_array_2d(),
        }
    }
}

/// Per-frame camera and light state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameGlobals {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    /// Points from the scene towards the sun.
    pub sun_direction: Vec3,
    pub sun_color: Rgb,
    pub ambient_color: Rgb,
}

impl FrameGlobals {
    fn to_uniform(self) -> GlobalsUniform {
        GlobalsUniform {
            view_proj: (self.projection * self.view).to_cols_array_2d(),
            view: self.view.to_cols_array_2d(),
            camera_position: self.camera_position.extend(1.0).to_array(),
            sun_direction: self.sun_direction.normalize_or_zero().extend(0.0).to_array(),
            sun_color: self.sun_color.extend(1.0),
            ambient_color: self.ambient_color.extend(1.0),
        }
    }
}

/// One visible geometry/material pair with its world matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    pub geometry: ResourceId,
    pub material: ResourceId,
    pub world: Mat4,
    pub topology: Topology,
}

struct GpuGeometry {
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    count: u32,
}

struct GpuTexture {
    view: wgpu::TextureView,
}

struct GpuMaterial {
    /// `None` for line materials.
    shader: Option<ShaderKind>,
    map: Option<ResourceId>,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct ObjectSlot {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Backend that mirrors the registry into real wgpu objects and draws them.
pub struct WgpuBackend {
    device: Device,
    queue: Queue,

    material_layout: wgpu::BindGroupLayout,
    object_layout: wgpu::BindGroupLayout,

    globals_buffer: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,

    sampler: wgpu::Sampler,
    default_texture: GpuTexture,

    mesh_pipelines: HashMap<ShaderKind, RenderPipeline>,
    line_pipeline: RenderPipeline,

    geometries: HashMap<ResourceId, GpuGeometry>,
    textures: HashMap<ResourceId, GpuTexture>,
    materials: HashMap<ResourceId, GpuMaterial>,
    objects: Vec<ObjectSlot>,
    prepared: usize,
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl WgpuBackend {
    pub fn new(device: &Device, queue: &Queue, format: wgpu::TextureFormat) -> Self {
        let global_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Globals Bind Group Layout"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            )],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Object Bind Group Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX)],
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Globals Buffer"),
            contents: bytemuck::bytes_of(&GlobalsUniform::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &global_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            ..Default::default()
        });

        let default_texture = create_texture(
            device,
            queue,
            &TextureData {
                name: String::from("Default White"),
                pixels: vec![255; 4],
                width: 1,
                height: 1,
                format: TextureFormat::Rgba8Unorm,
            },
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Viewer Pipeline Layout"),
            bind_group_layouts: &[&global_layout, &material_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let mesh_pipelines = [
            (ShaderKind::Normal, NORMAL_WGSL),
            (ShaderKind::Silhouette, SILHOUETTE_WGSL),
            (ShaderKind::Toon, TOON_WGSL),
            (ShaderKind::Phong, PHONG_WGSL),
        ]
        .into_iter()
        .map(|(kind, source)| {
            let pipeline = create_mesh_pipeline(device, &pipeline_layout, format, kind, source);
            (kind, pipeline)
        })
        .collect();

        let line_pipeline = create_line_pipeline(device, &pipeline_layout, format);

        Self {
            device: device.clone(),
            queue: queue.clone(),
            material_layout,
            object_layout,
            globals_buffer,
            globals_bind_group,
            sampler,
            default_texture,
            mesh_pipelines,
            line_pipeline,
            geometries: HashMap::new(),
            textures: HashMap::new(),
            materials: HashMap::new(),
            objects: Vec::new(),
            prepared: 0,
        }
    }

    fn material_bind_group(&self, buffer: &wgpu::Buffer, map: Option<ResourceId>) -> wgpu::BindGroup {
        let texture = map
            .and_then(|id| self.textures.get(&id))
            .unwrap_or(&self.default_texture);

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Bind Group"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }

    /// Uploads camera, lights and one object uniform per item. Call before `record`.
    pub fn prepare(&mut self, globals: &FrameGlobals, items: &[DrawItem]) {
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals.to_uniform()));

        while self.objects.len() < items.len() {
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Object Uniform Buffer"),
                size: mem::size_of::<ObjectUniform>() as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Object Bind Group"),
                layout: &self.object_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });
            self.objects.push(ObjectSlot { buffer, bind_group });
        }

        for (slot, item) in self.objects.iter().zip(items) {
            let uniform = ObjectUniform::from_world(&item.world);
            self.queue
                .write_buffer(&slot.buffer, 0, bytemuck::bytes_of(&uniform));
        }
        self.prepared = items.len();
    }

    /// Encodes the draw calls. Items whose resources are gone are skipped.
    pub fn record(&self, render_pass: &mut wgpu::RenderPass<'_>, items: &[DrawItem]) {
        render_pass.set_bind_group(0, &self.globals_bind_group, &[]);

        for (item, slot) in items.iter().zip(&self.objects).take(self.prepared) {
            let (Some(geometry), Some(material)) = (
                self.geometries.get(&item.geometry),
                self.materials.get(&item.material),
            ) else {
                log::trace!("Skipping draw of released or empty resource {}", item.geometry);
                continue;
            };
            if geometry.count == 0 {
                continue;
            }

            let pipeline = match (item.topology, material.shader) {
                (Topology::Lines, _) => &self.line_pipeline,
                (Topology::Triangles, Some(kind)) => match self.mesh_pipelines.get(&kind) {
                    Some(pipeline) => pipeline,
                    None => continue,
                },
                (Topology::Triangles, None) => continue,
            };

            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(1, &material.bind_group, &[]);
            render_pass.set_bind_group(2, &slot.bind_group, &[]);
            render_pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));

            match &geometry.index_buffer {
                Some(index_buffer) => {
                    render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..geometry.count, 0, 0..1);
                }
                None => render_pass.draw(0..geometry.count, 0..1),
            }
        }
    }
}

impl GpuBackend for WgpuBackend {
    fn upload_geometry(&mut self, id: ResourceId, data: GeometryUpload<'_>) {
        // wgpu cannot slice a zero-sized buffer.
        if data.is_empty() {
            return;
        }
        let geometry = match data {
            GeometryUpload::Triangles { vertices, indices } => {
                let vertices: Vec<GpuVertex> = vertices
                    .iter()
                    .map(|v| GpuVertex {
                        position: v.position,
                        normal: v.normal,
                        uv: v.uv,
                        tangent: v.tangent,
                    })
                    .collect();
                let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Vertex Buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Index Buffer"),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                GpuGeometry {
                    vertex_buffer,
                    index_buffer: Some(index_buffer),
                    count: indices.len() as u32,
                }
            }
            GeometryUpload::Lines { points } => {
                let vertices: Vec<LineVertex> = points
                    .iter()
                    .map(|p| LineVertex {
                        position: p.to_array(),
                    })
                    .collect();
                let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Line Vertex Buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                GpuGeometry {
                    vertex_buffer,
                    index_buffer: None,
                    count: vertices.len() as u32,
                }
            }
        };
        self.geometries.insert(id, geometry);
    }

    fn upload_texture(&mut self, id: ResourceId, data: &TextureData) {
        let texture = create_texture(&self.device, &self.queue, data);
        self.textures.insert(id, texture);
    }

    fn upload_material(&mut self, id: ResourceId, data: MaterialUpload<'_>) {
        let (shader, map) = match &data {
            MaterialUpload::Program(program) => (Some(program.kind), program.uniforms.map()),
            MaterialUpload::Line { .. } => (None, None),
        };
        let uniform = MaterialUniform::from_upload(&data);
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material Uniforms"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = self.material_bind_group(&buffer, map);

        self.materials.insert(
            id,
            GpuMaterial {
                shader,
                map,
                buffer,
                bind_group,
            },
        );
    }

    fn update_material(&mut self, id: ResourceId, data: MaterialUpload<'_>) {
        let Some(material) = self.materials.get(&id) else {
            log::warn!("Update of unknown material {}", id);
            return;
        };
        let uniform = MaterialUniform::from_upload(&data);
        self.queue
            .write_buffer(&material.buffer, 0, bytemuck::bytes_of(&uniform));

        let map = match &data {
            MaterialUpload::Program(program) => program.uniforms.map(),
            MaterialUpload::Line { .. } => None,
        };
        if map != material.map {
            let bind_group = self.material_bind_group(&material.buffer, map);
            if let Some(material) = self.materials.get_mut(&id) {
                material.bind_group = bind_group;
                material.map = map;
            }
        }
    }

    fn release(&mut self, id: ResourceId, kind: ResourceKind) {
        match kind {
            ResourceKind::Geometry => {
                self.geometries.remove(&id);
            }
            ResourceKind::Material => {
                self.materials.remove(&id);
            }
            ResourceKind::Texture => {
                self.textures.remove(&id);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn create_texture(device: &Device, queue: &Queue, data: &TextureData) -> GpuTexture {
    let size = wgpu::Extent3d {
        width: data.width,
        height: data.height,
        depth_or_array_layers: 1,
    };
    let format = match data.format {
        TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(data.name.as_str()),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
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
        &data.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * data.width),
            rows_per_image: Some(data.height),
        },
        size,
    );

    GpuTexture {
        view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
    }
}

fn create_mesh_pipeline(
    device: &Device,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    kind: ShaderKind,
    source: &str,
) -> RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(kind.name()),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(kind.name()),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[GpuVertex::desc()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

fn create_line_pipeline(
    device: &Device,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
) -> RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Lines"),
        source: wgpu::ShaderSource::Wgsl(LINES_WGSL.into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Overlay Line Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[LineVertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::LineList,
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
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};
    use prism_core::{Rgb, ShaderKind};

    use super::{FrameGlobals, MaterialUniform, ObjectUniform};
    use crate::{
        resources::MaterialUpload,
        shaders::{ShaderCatalog, ShaderOptions},
    };

    #[test]
    fn uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<MaterialUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 128);
        assert_eq!(std::mem::size_of::<super::GlobalsUniform>(), 192);
    }

    #[test]
    fn line_material_carries_opacity_in_alpha() {
        let uniform = MaterialUniform::from_upload(&MaterialUpload::Line {
            color: Rgb::YELLOW,
            opacity: 0.25,
        });
        assert_eq!(uniform.color, [1.0, 1.0, 0.0, 0.25]);
        assert_eq!(uniform.params[2], 0.25);
    }

    #[test]
    fn phong_material_packs_shininess() {
        let program = ShaderCatalog::builtin()
            .create(
                ShaderKind::Phong,
                &ShaderOptions {
                    shininess: 12.0,
                    ..Default::default()
                },
            )
            .unwrap();
        let uniform = MaterialUniform::from_upload(&MaterialUpload::Program(&program));
        assert_eq!(uniform.params, [12.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn globals_combine_projection_and_view() {
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));
        let projection = Mat4::from_scale(Vec3::splat(2.0));
        let globals = FrameGlobals {
            view,
            projection,
            camera_position: Vec3::new(0.0, 0.0, 5.0),
            sun_direction: Vec3::new(0.0, 10.0, 0.0),
            sun_color: Rgb::WHITE,
            ambient_color: Rgb::BLACK,
        }
        .to_uniform();

        assert_eq!(globals.view_proj, (projection * view).to_cols_array_2d());
        assert_eq!(globals.sun_direction, [0.0, 1.0, 0.0, 0.0]);
    }
}
