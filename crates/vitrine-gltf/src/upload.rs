use vitrine_3d::{GpuMesh, Material, MaterialUniform, SceneModel, Vertex};
use wgpu::util::DeviceExt;
use wgpu::*;

use crate::data::{MaterialData, MeshData, SceneData, TextureData};

/// Turns parsed scene data into GPU buffers and bind groups. Must run on
/// the thread that owns the device; the heavy parsing has already happened.
pub fn upload_scene(
    device: &Device,
    queue: &Queue,
    material_bgl: &BindGroupLayout,
    scene: &SceneData,
) -> SceneModel {
    let mut materials: Vec<Material> = scene
        .materials
        .iter()
        .map(|m| upload_material(device, queue, material_bgl, m))
        .collect();
    if materials.is_empty() {
        materials.push(upload_material(
            device,
            queue,
            material_bgl,
            &MaterialData::default_white(),
        ));
    }

    let meshes = scene
        .meshes
        .iter()
        .filter(|m| !m.indices.is_empty())
        .map(|m| upload_mesh(device, m, materials.len()))
        .collect();

    SceneModel { meshes, materials }
}

fn upload_mesh(device: &Device, mesh: &MeshData, material_count: usize) -> GpuMesh {
    let vertices: Vec<Vertex> = (0..mesh.positions.len())
        .map(|i| Vertex {
            position: mesh.positions[i],
            normal: mesh.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
            uv: mesh.uvs.get(i).copied().unwrap_or([0.0, 0.0]),
        })
        .collect();

    let vbuf = device.create_buffer_init(&util::BufferInitDescriptor {
        label: Some("mesh_vbuf"),
        contents: bytemuck::cast_slice(&vertices),
        usage: BufferUsages::VERTEX,
    });
    let ibuf = device.create_buffer_init(&util::BufferInitDescriptor {
        label: Some("mesh_ibuf"),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: BufferUsages::INDEX,
    });

    GpuMesh {
        vbuf,
        ibuf,
        index_count: mesh.indices.len() as u32,
        material_id: mesh.material_id.min(material_count - 1),
    }
}

fn upload_material(
    device: &Device,
    queue: &Queue,
    material_bgl: &BindGroupLayout,
    material: &MaterialData,
) -> Material {
    let uniform = MaterialUniform {
        base_color: material.base_color,
    };
    let ubo = device.create_buffer_init(&util::BufferInitDescriptor {
        label: Some("material_ubo"),
        contents: bytemuck::bytes_of(&uniform),
        usage: BufferUsages::UNIFORM,
    });

    let white = TextureData::white();
    let view = create_texture(device, queue, material.texture.as_ref().unwrap_or(&white));

    let sampler = device.create_sampler(&SamplerDescriptor {
        label: Some("material_sampler"),
        address_mode_u: AddressMode::Repeat,
        address_mode_v: AddressMode::Repeat,
        address_mode_w: AddressMode::Repeat,
        mag_filter: FilterMode::Linear,
        min_filter: FilterMode::Linear,
        mipmap_filter: FilterMode::Nearest,
        ..Default::default()
    });

    let bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("material_bg"),
        layout: material_bgl,
        entries: &[
            BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            },
            BindGroupEntry {
                binding: 1,
                resource: BindingResource::TextureView(&view),
            },
            BindGroupEntry {
                binding: 2,
                resource: BindingResource::Sampler(&sampler),
            },
        ],
    });

    Material { bind_group }
}

fn create_texture(device: &Device, queue: &Queue, data: &TextureData) -> TextureView {
    let size = Extent3d {
        width: data.width,
        height: data.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&TextureDescriptor {
        label: Some("base_color_tex"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: TextureFormat::Rgba8UnormSrgb,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: Origin3d::ZERO,
            aspect: TextureAspect::All,
        },
        &data.pixels,
        TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * data.width),
            rows_per_image: Some(data.height),
        },
        size,
    );
    texture.create_view(&TextureViewDescriptor::default())
}
