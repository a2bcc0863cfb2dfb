use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;
use wgpu::*;

// Fixed directional light for the viewport.
pub const LIGHT_DIRECTION: [f32; 3] = [3.3, 1.0, 4.4];
pub const LIGHT_INTENSITY: f32 = 1.6;
pub const AMBIENT_LEVEL: f32 = 0.25;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBS: [VertexAttribute; 3] =
        vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn desc() -> VertexBufferLayout<'static> {
        VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ModelUniform {
    pub transform: [[f32; 4]; 4],
    /// xyz = normalized light direction, w = intensity.
    pub light_dir: [f32; 4],
    /// rgb = ambient term, a unused.
    pub ambient: [f32; 4],
}

impl ModelUniform {
    pub fn new(xform: Mat4) -> Self {
        let dir = glam::Vec3::from(LIGHT_DIRECTION).normalize();
        Self {
            transform: xform.to_cols_array_2d(),
            light_dir: [dir.x, dir.y, dir.z, LIGHT_INTENSITY],
            ambient: [AMBIENT_LEVEL, AMBIENT_LEVEL, AMBIENT_LEVEL, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
}

pub struct GpuMesh {
    pub vbuf: Buffer,
    pub ibuf: Buffer,
    pub index_count: u32,
    pub material_id: usize,
}

pub struct Material {
    pub bind_group: BindGroup,
}

/// GPU-resident scene: what one catalog entry becomes after upload. Meshes
/// index into `materials`, which always holds at least one entry.
pub struct SceneModel {
    pub meshes: Vec<GpuMesh>,
    pub materials: Vec<Material>,
}

pub fn create_model_ubo(device: &Device, model_bgl: &BindGroupLayout, xform: Mat4) -> (Buffer, BindGroup) {
    let uniform = ModelUniform::new(xform);
    let buf = device.create_buffer_init(&util::BufferInitDescriptor {
        label: Some("model_ubo"),
        contents: bytemuck::bytes_of(&uniform),
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
    });
    let bg = device.create_bind_group(&BindGroupDescriptor {
        label: Some("model_bg"),
        layout: model_bgl,
        entries: &[BindGroupEntry {
            binding: 0,
            resource: buf.as_entire_binding(),
        }],
    });
    (buf, bg)
}

pub fn update_model_ubo(queue: &Queue, model_buf: &Buffer, xform: Mat4) {
    let uniform = ModelUniform::new(xform);
    queue.write_buffer(model_buf, 0, bytemuck::bytes_of(&uniform));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_stride_matches_attributes() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        assert_eq!(Vertex::desc().array_stride, 32);
    }

    #[test]
    fn uniform_sizes_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<ModelUniform>(), 96);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 16);
    }

    #[test]
    fn light_direction_normalizes() {
        let u = ModelUniform::new(Mat4::IDENTITY);
        let len = (u.light_dir[0].powi(2) + u.light_dir[1].powi(2) + u.light_dir[2].powi(2)).sqrt();
        assert!((len - 1.0).abs() < 1e-6, "light direction should be unit length, got {len}");
        assert_eq!(u.light_dir[3], LIGHT_INTENSITY);
    }
}
