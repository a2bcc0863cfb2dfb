use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use wgpu::*;

use crate::depth::DEPTH_FORMAT;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct AxisVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl AxisVertex {
    const ATTRIBS: [VertexAttribute; 2] = vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn desc() -> VertexBufferLayout<'static> {
        VertexBufferLayout {
            array_stride: std::mem::size_of::<AxisVertex>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

pub fn axes_vertices(extent: f32) -> [AxisVertex; 6] {
    let x = [0.9, 0.2, 0.2];
    let y = [0.2, 0.9, 0.2];
    let z = [0.2, 0.4, 0.9];
    [
        AxisVertex { position: [0.0, 0.0, 0.0], color: x },
        AxisVertex { position: [extent, 0.0, 0.0], color: x },
        AxisVertex { position: [0.0, 0.0, 0.0], color: y },
        AxisVertex { position: [0.0, extent, 0.0], color: y },
        AxisVertex { position: [0.0, 0.0, 0.0], color: z },
        AxisVertex { position: [0.0, 0.0, extent], color: z },
    ]
}

/// X/Y/Z reference lines drawn at the world origin.
pub struct AxesGizmo {
    pub pipeline: RenderPipeline,
    pub vbuf: Buffer,
    pub vertex_count: u32,
}

impl AxesGizmo {
    pub fn new(
        device: &Device,
        surface_format: TextureFormat,
        camera_bgl: &BindGroupLayout,
        extent: f32,
    ) -> Self {
        let shader = device.create_shader_module(include_wgsl!("axes.wgsl"));

        let vertices = axes_vertices(extent);
        let vbuf = device.create_buffer_init(&util::BufferInitDescriptor {
            label: Some("axes_vbuf"),
            contents: bytemuck::cast_slice(&vertices),
            usage: BufferUsages::VERTEX,
        });

        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("axes_pipeline_layout"),
            bind_group_layouts: &[camera_bgl],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("axes_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                buffers: &[AxisVertex::desc()],
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: CompareFunction::Less,
                stencil: StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            vbuf,
            vertex_count: vertices.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axes_span_from_origin_to_extent() {
        let verts = axes_vertices(5.0);
        assert_eq!(verts.len(), 6);
        assert_eq!(verts[1].position, [5.0, 0.0, 0.0]);
        assert_eq!(verts[3].position, [0.0, 5.0, 0.0]);
        assert_eq!(verts[5].position, [0.0, 0.0, 5.0]);
        for pair in verts.chunks(2) {
            assert_eq!(pair[0].position, [0.0, 0.0, 0.0], "each line starts at the origin");
            assert_eq!(pair[0].color, pair[1].color, "line endpoints share a color");
        }
    }
}
