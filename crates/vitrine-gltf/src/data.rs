use glam::Vec3;

/// Decoded RGBA8 texels ready for upload.
#[derive(Debug)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl TextureData {
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![255; 4],
        }
    }
}

#[derive(Debug)]
pub struct MaterialData {
    pub base_color: [f32; 4],
    pub texture: Option<TextureData>,
}

impl MaterialData {
    pub fn default_white() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            texture: None,
        }
    }
}

/// One primitive's geometry in world space. `positions`, `normals` and
/// `uvs` run in parallel; `material_id` indexes `SceneData::materials`.
#[derive(Debug)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    pub material_id: usize,
}

/// CPU-side scene, produced by the parser on a worker thread. `materials`
/// always ends with a plain white fallback entry.
#[derive(Debug)]
pub struct SceneData {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
}

impl SceneData {
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.indices.len() / 3).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.positions.len()).sum()
    }
}

/// Rebuilds a mesh so every triangle carries its own face normal: faces are
/// un-indexed, each corner repeats the face's geometric normal, and the
/// index list becomes trivial. Degenerate faces fall back to +Y.
pub fn flat_shade_mesh(mesh: &MeshData) -> MeshData {
    let mut positions = Vec::with_capacity(mesh.indices.len());
    let mut normals = Vec::with_capacity(mesh.indices.len());
    let mut uvs = Vec::with_capacity(mesh.indices.len());

    for tri in mesh.indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        if i0 >= mesh.positions.len() || i1 >= mesh.positions.len() || i2 >= mesh.positions.len() {
            continue;
        }

        let p0 = Vec3::from_array(mesh.positions[i0]);
        let p1 = Vec3::from_array(mesh.positions[i1]);
        let p2 = Vec3::from_array(mesh.positions[i2]);
        let cross = (p1 - p0).cross(p2 - p0);
        let normal = if cross.length_squared() > 1e-12 {
            cross.normalize()
        } else {
            Vec3::Y
        };

        for i in [i0, i1, i2] {
            positions.push(mesh.positions[i]);
            uvs.push(mesh.uvs.get(i).copied().unwrap_or([0.0, 0.0]));
            normals.push(normal.to_array());
        }
    }

    let indices = (0..positions.len() as u32).collect();
    MeshData {
        positions,
        normals,
        uvs,
        indices,
        material_id: mesh.material_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshData {
        // Two triangles sharing an edge, lying in the XY plane.
        MeshData {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            normals: Vec::new(),
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            indices: vec![0, 1, 2, 0, 2, 3],
            material_id: 0,
        }
    }

    #[test]
    fn faceting_unshares_vertices() {
        let flat = flat_shade_mesh(&quad());
        assert_eq!(flat.positions.len(), 6, "each triangle corner becomes its own vertex");
        assert_eq!(flat.normals.len(), 6);
        assert_eq!(flat.uvs.len(), 6);
        assert_eq!(flat.indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn face_normal_follows_winding() {
        let flat = flat_shade_mesh(&quad());
        for n in &flat.normals {
            assert_eq!(*n, [0.0, 0.0, 1.0], "counter-clockwise XY triangle faces +Z");
        }

        let mut flipped = quad();
        flipped.indices = vec![0, 2, 1, 0, 3, 2];
        let flat = flat_shade_mesh(&flipped);
        for n in &flat.normals {
            assert_eq!(*n, [0.0, 0.0, -1.0], "reversed winding flips the face normal");
        }
    }

    #[test]
    fn face_normals_are_unit_length() {
        let mesh = MeshData {
            positions: vec![[0.0, 0.0, 0.0], [3.0, 0.0, 0.0], [0.0, 0.0, 7.0]],
            normals: Vec::new(),
            uvs: vec![[0.0, 0.0]; 3],
            indices: vec![0, 1, 2],
            material_id: 0,
        };
        let flat = flat_shade_mesh(&mesh);
        for n in &flat.normals {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-6, "normal should be unit length, got {len}");
        }
    }

    #[test]
    fn degenerate_face_falls_back_to_up() {
        let mesh = MeshData {
            positions: vec![[1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 1.0]],
            normals: Vec::new(),
            uvs: vec![[0.0, 0.0]; 3],
            indices: vec![0, 0, 0],
            material_id: 0,
        };
        let flat = flat_shade_mesh(&mesh);
        assert_eq!(flat.normals, vec![[0.0, 1.0, 0.0]; 3]);
    }

    #[test]
    fn uvs_follow_their_corners() {
        let flat = flat_shade_mesh(&quad());
        assert_eq!(flat.uvs[0], [0.0, 0.0]);
        assert_eq!(flat.uvs[1], [1.0, 0.0]);
        assert_eq!(flat.uvs[2], [1.0, 1.0]);
    }

    #[test]
    fn out_of_range_indices_are_skipped() {
        let mesh = MeshData {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: Vec::new(),
            uvs: vec![[0.0, 0.0]; 3],
            indices: vec![0, 1, 9],
            material_id: 0,
        };
        let flat = flat_shade_mesh(&mesh);
        assert!(flat.positions.is_empty(), "a triangle referencing missing vertices is dropped");
    }

    #[test]
    fn counts_sum_over_meshes() {
        let scene = SceneData {
            meshes: vec![flat_shade_mesh(&quad()), flat_shade_mesh(&quad())],
            materials: vec![MaterialData::default_white()],
        };
        assert_eq!(scene.triangle_count(), 4);
        assert_eq!(scene.vertex_count(), 12);
    }
}
