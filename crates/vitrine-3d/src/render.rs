use crate::axes::AxesGizmo;
use crate::depth::create_depth;
use crate::model::{SceneModel, create_model_ubo, update_model_ubo};
use crate::pipeline::{Layouts, create_pipeline};
use wgpu::*;

const AXES_EXTENT: f32 = 5.0;

/// Draws whatever scene it is handed each frame; never owns or fetches one.
pub struct SceneRenderer {
    pub render_pipeline: RenderPipeline,
    pub depth_view: TextureView,
    pub depth_tex: Texture,
    pub camera_bg: BindGroup,
    pub camera_buf: Buffer,
    pub model_bg: BindGroup,
    pub model_buf: Buffer,
    pub axes: AxesGizmo,
}

impl SceneRenderer {
    pub fn new(
        device: &Device,
        surface_format: TextureFormat,
        width: u32,
        height: u32,
        model_xform: glam::Mat4,
        layouts: &Layouts,
    ) -> Self {
        let (depth_view, depth_tex) = create_depth(device, width, height);

        let (render_pipeline, camera_bg, camera_buf) =
            create_pipeline(device, surface_format, layouts);

        let (model_buf, model_bg) = create_model_ubo(device, &layouts.model_bgl, model_xform);

        let axes = AxesGizmo::new(device, surface_format, &layouts.camera_bgl, AXES_EXTENT);

        Self {
            render_pipeline,
            depth_view,
            depth_tex,
            camera_bg,
            camera_buf,
            model_bg,
            model_buf,
            axes,
        }
    }

    pub fn resize(&mut self, device: &Device, width: u32, height: u32) {
        let (dv, dt) = create_depth(device, width, height);
        self.depth_view = dv;
        self.depth_tex = dt;
    }

    pub fn set_model_transform(&self, queue: &Queue, xform: glam::Mat4) {
        update_model_ubo(queue, &self.model_buf, xform);
    }

    pub fn render(
        &self,
        encoder: &mut CommandEncoder,
        target_view: &TextureView,
        scene: Option<&SceneModel>,
        show_axes: bool,
    ) {
        let mut r_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("scene_pass"),
            color_attachments: &[Some(RenderPassColorAttachment {
                view: target_view,
                depth_slice: None,
                resolve_target: None,
                ops: Operations {
                    load: LoadOp::Clear(Color::BLACK),
                    store: StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(Operations {
                    load: LoadOp::Clear(1.0),
                    store: StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if show_axes {
            r_pass.set_pipeline(&self.axes.pipeline);
            r_pass.set_bind_group(0, &self.camera_bg, &[]);
            r_pass.set_vertex_buffer(0, self.axes.vbuf.slice(..));
            r_pass.draw(0..self.axes.vertex_count, 0..1);
        }

        let Some(scene) = scene else {
            return;
        };

        r_pass.set_pipeline(&self.render_pipeline);
        r_pass.set_bind_group(0, &self.camera_bg, &[]);
        r_pass.set_bind_group(1, &self.model_bg, &[]);

        for mesh in &scene.meshes {
            let mat = &scene.materials[mesh.material_id.min(scene.materials.len() - 1)];
            r_pass.set_bind_group(2, &mat.bind_group, &[]);
            r_pass.set_vertex_buffer(0, mesh.vbuf.slice(..));
            r_pass.set_index_buffer(mesh.ibuf.slice(..), IndexFormat::Uint32);
            r_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}
