use std::{path::PathBuf, time::Instant};

use winit::{
    dpi::PhysicalSize,
    event::{DeviceEvent, WindowEvent},
    event_loop::EventLoopProxy,
    window::Window,
};

use wgpu::{
    Adapter, CommandEncoderDescriptor, Device, ExperimentalFeatures, Features, Instance, Limits,
    MemoryHints, PowerPreference, Queue, RequestAdapterOptions, Surface, SurfaceConfiguration,
    Texture, TextureFormat, TextureView, TextureViewDescriptor,
};

pub type RcWindow = std::sync::Arc<Window>;

use vitrine_3d::{Layouts, SceneRenderer, create_bind_group_layouts};
use vitrine_camera::{CameraController, OrbitCamera, update_camera_buffer};
use vitrine_gltf::{load_scene_model, parse_scene};

pub use vitrine_3d::SceneModel;
pub use vitrine_gltf::SceneData;

use glam::{EulerRot, Mat4, Vec3};

const MOUSE_SENSITIVITY: f32 = 0.0025;
const CAMERA_TARGET: Vec3 = Vec3::new(0.0, 0.5, 0.0);
const CAMERA_DISTANCE: f32 = 5.0;

// Models render at the origin, flipped about X the way the source assets
// expect, with a uniform scale that the viewer state controls.
pub const MODEL_POSITION: Vec3 = Vec3::ZERO;
pub const MODEL_ROTATION_X: f32 = std::f32::consts::PI;

pub fn model_transform(scale: f32) -> Mat4 {
    Mat4::from_translation(MODEL_POSITION)
        * Mat4::from_euler(EulerRot::XYZ, MODEL_ROTATION_X, 0.0, 0.0)
        * Mat4::from_scale(Vec3::splat(scale))
}

/// Messages delivered through the winit user-event channel.
pub enum ViewerEvent {
    /// GPU setup finished; carries the initial scene if it loaded.
    Ready {
        graphics: Box<Graphics>,
        scene: Option<SceneModel>,
        error: Option<String>,
    },
    /// A background parse finished. Stale tickets are dropped by the viewer.
    SceneLoaded {
        ticket: u64,
        result: anyhow::Result<SceneData>,
    },
}

/// Runs the CPU half of a model load off the UI thread and reports back
/// through the event loop.
pub fn spawn_scene_load(proxy: EventLoopProxy<ViewerEvent>, ticket: u64, path: PathBuf) {
    std::thread::spawn(move || {
        log::info!("loading {} (ticket {ticket})", path.display());
        let result = parse_scene(&path);
        let _ = proxy.send_event(ViewerEvent::SceneLoaded { ticket, result });
    });
}

pub struct Viewport {
    pub color: Texture,
    pub color_view: TextureView,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl Viewport {
    pub fn new(device: &wgpu::Device, format: TextureFormat, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("viewport_color"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            color,
            color_view,
            width,
            height,
            format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        *self = Viewport::new(device, self.format, width, height);
    }
}

pub async fn create_graphics(
    window: RcWindow,
    proxy: EventLoopProxy<ViewerEvent>,
    initial_model: PathBuf,
    initial_scale: f32,
) {
    let instance = Instance::default();
    let surface = instance
        .create_surface(std::sync::Arc::clone(&window))
        .unwrap();

    let adapter = instance
        .request_adapter(&RequestAdapterOptions {
            power_preference: PowerPreference::default(),
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        })
        .await
        .expect("Could not get an adapter (GPU).");

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: Features::empty(),
            required_limits: Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits()),
            memory_hints: MemoryHints::Performance,
            trace: Default::default(),
            experimental_features: ExperimentalFeatures::disabled(),
        })
        .await
        .expect("Failed to get device");

    let size = window.inner_size();
    let width = size.width.max(1);
    let height = size.height.max(1);

    let surface_config = surface
        .get_default_config(&adapter, width, height)
        .expect("Failed to create surface config");
    surface.configure(&device, &surface_config);

    let layouts: Layouts = create_bind_group_layouts(&device);

    // The first model loads before the first frame; a failure is reported,
    // not fatal, and the viewer opens with an empty viewport.
    let (scene, error) =
        match load_scene_model(&device, &queue, &layouts.material_bgl, &initial_model) {
            Ok(scene) => (Some(scene), None),
            Err(e) => {
                log::warn!("initial load of {} failed: {e:#}", initial_model.display());
                (None, Some(format!("{e:#}")))
            }
        };

    let viewport = Viewport::new(
        &device,
        surface_config.format,
        surface_config.width,
        surface_config.height,
    );

    let renderer = SceneRenderer::new(
        &device,
        surface_config.format,
        surface_config.width,
        surface_config.height,
        model_transform(initial_scale),
        &layouts,
    );

    let camera = OrbitCamera::new(CAMERA_TARGET, CAMERA_DISTANCE);
    let controller = CameraController::new(MOUSE_SENSITIVITY);

    update_camera_buffer(
        &queue,
        &renderer.camera_buf,
        &camera,
        surface_config.width,
        surface_config.height,
    );

    let gfx = Graphics {
        window,
        instance,
        surface,
        surface_config,
        adapter,
        device,
        queue,
        layouts,
        renderer,
        camera,
        controller,
        viewport,
        last_frame_time: Instant::now(),
    };

    let _ = proxy.send_event(ViewerEvent::Ready {
        graphics: Box::new(gfx),
        scene,
        error,
    });
}

#[allow(dead_code)]
pub struct Graphics {
    pub(crate) window: RcWindow,
    pub viewport: Viewport,
    instance: Instance,
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,
    adapter: Adapter,
    device: Device,
    queue: Queue,
    layouts: Layouts,
    renderer: SceneRenderer,
    camera: OrbitCamera,
    controller: CameraController,
    last_frame_time: Instant,
}

impl Graphics {
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    pub fn viewport_view(&self) -> &TextureView {
        &self.viewport.color_view
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        let cfg = self.surface_config();
        (cfg.width, cfg.height)
    }

    /// GPU half of a finished background load.
    pub fn upload_scene(&self, data: &SceneData) -> SceneModel {
        vitrine_gltf::upload_scene(&self.device, &self.queue, &self.layouts.material_bgl, data)
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.surface_config.width = new_size.width.max(1);
        self.surface_config.height = new_size.height.max(1);
        self.surface.configure(&self.device, &self.surface_config);
        self.viewport.resize(
            &self.device,
            self.surface_config.width,
            self.surface_config.height,
        );
        self.renderer
            .resize(&self.device, self.viewport.width, self.viewport.height);

        update_camera_buffer(
            &self.queue,
            &self.renderer.camera_buf,
            &self.camera,
            self.viewport.width,
            self.viewport.height,
        );
    }

    pub fn draw<F>(&mut self, scene: Option<&SceneModel>, model_scale: f32, show_axes: bool, overlay: F)
    where
        F: FnOnce(&mut Self, &TextureView, &mut wgpu::CommandEncoder),
    {
        let now = Instant::now();
        let mut dt = (now - self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;
        if dt > 0.1 {
            dt = 0.1;
        }
        self.controller.update(&mut self.camera, dt);

        update_camera_buffer(
            &self.queue,
            &self.renderer.camera_buf,
            &self.camera,
            self.viewport.width,
            self.viewport.height,
        );
        self.renderer
            .set_model_transform(&self.queue, model_transform(model_scale));

        let frame = self
            .surface
            .get_current_texture()
            .expect("Failed to acquire next swap chain texture.");

        let swap_view = frame.texture.create_view(&TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor { label: None });
        self.renderer
            .render(&mut encoder, &self.viewport.color_view, scene, show_axes);
        overlay(self, &swap_view, &mut encoder);
        self.queue.submit(Some(encoder.finish()));
        frame.present();
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        self.controller.handle_window_event(event, &mut self.camera);
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        self.controller.handle_device_event(event, &mut self.camera);
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn surface_config(&self) -> &SurfaceConfiguration {
        &self.surface_config
    }

    pub fn eye(&self) -> Vec3 {
        self.camera.eye()
    }

    pub fn yaw(&self) -> f32 {
        self.camera.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.camera.pitch
    }

    pub fn camera_distance(&self) -> f32 {
        self.camera.distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_transform_scales_and_flips() {
        let m = model_transform(2.0);
        let p = m.transform_point3(Vec3::new(1.0, 1.0, 0.0));
        assert!((p - Vec3::new(2.0, -2.0, 0.0)).length() < 1e-5, "got {p:?}");
    }

    #[test]
    fn model_transform_keeps_the_origin_fixed() {
        let m = model_transform(0.1);
        let p = m.transform_point3(Vec3::ZERO);
        assert!(p.length() < 1e-6);
    }
}
