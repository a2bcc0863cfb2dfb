use egui::Sense;
use egui::load::SizedTexture;
use std::time::{Duration, Instant};
use vitrine_runtime::{
    Graphics, RcWindow, SceneModel, ViewerEvent, create_graphics, spawn_scene_load,
};
use vitrine_state::ViewerState;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy},
    window::{Window, WindowId},
};

const FPS: u64 = 120;
const FRAME_TIME: Duration = Duration::from_nanos(1_000_000_000 / FPS);

enum State {
    Ready(ReadyState),
    Init(Option<EventLoopProxy<ViewerEvent>>),
}

struct ReadyState {
    gfx: Graphics,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    viewport_tex_id: egui::TextureId,
}

/// A browse or zoom intent recorded by a HUD button, applied after the
/// egui pass.
#[derive(Debug, Clone, Copy)]
pub enum ViewerAction {
    NextModel,
    PreviousModel,
    ZoomIn,
    ZoomOut,
}

pub struct ViewerHud {
    pub show_catalog_panel: bool,
    pub show_debug_panel: bool,
    pub show_axes: bool,
    pub camera_active: bool,
    pub cursor_grab_request: Option<bool>,
    pub action: Option<ViewerAction>,
    pub quit_requested: bool,
}

impl ViewerHud {
    pub fn new() -> Self {
        Self {
            show_catalog_panel: true,
            show_debug_panel: true,
            show_axes: true,
            camera_active: false,
            cursor_grab_request: None,
            action: None,
            quit_requested: false,
        }
    }
}

pub struct App {
    state: State,
    render_target: Instant,
    proxy: EventLoopProxy<ViewerEvent>,
    viewer: ViewerState<SceneModel>,
    hud: ViewerHud,
}

impl App {
    pub fn new(event_loop: &EventLoop<ViewerEvent>, viewer: ViewerState<SceneModel>) -> Self {
        Self {
            state: State::Init(Some(event_loop.create_proxy())),
            render_target: Instant::now(),
            proxy: event_loop.create_proxy(),
            viewer,
            hud: ViewerHud::new(),
        }
    }

    fn init_egui_for_graphics(
        gfx: &Graphics,
    ) -> (
        egui::Context,
        egui_winit::State,
        egui_wgpu::Renderer,
        egui::TextureId,
    ) {
        let egui_ctx = egui::Context::default();
        let viewport_id = egui_ctx.viewport_id();

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            viewport_id,
            gfx.window(),
            None,
            None,
            None,
        );

        let mut egui_renderer = egui_wgpu::Renderer::new(
            gfx.device(),
            gfx.surface_config().format,
            egui_wgpu::RendererOptions::default(),
        );

        let viewport_tex_id = egui_renderer.register_native_texture(
            gfx.device(),
            gfx.viewport_view(),
            wgpu::FilterMode::Linear,
        );

        (egui_ctx, egui_state, egui_renderer, viewport_tex_id)
    }

    fn draw(&mut self) {
        if let State::Ready(ready) = &mut self.state {
            Self::draw_viewer(ready, &self.viewer, &mut self.hud);
        }
    }

    fn resized(&mut self, size: PhysicalSize<u32>) {
        if let State::Ready(ready) = &mut self.state {
            ready.gfx.resize(size);
            ready.egui_renderer.free_texture(&ready.viewport_tex_id);
            ready.viewport_tex_id = ready.egui_renderer.register_native_texture(
                ready.gfx.device(),
                ready.gfx.viewport_view(),
                wgpu::FilterMode::Linear,
            );
        }
    }

    /// Starts the load for a browse intent. `None` from the state machine
    /// means a load is already in flight and the click is dropped.
    fn apply_actions(&mut self, event_loop: &ActiveEventLoop) {
        if self.hud.quit_requested {
            event_loop.exit();
            return;
        }

        let Some(action) = self.hud.action.take() else {
            return;
        };
        match action {
            ViewerAction::NextModel => {
                if let Some(req) = self.viewer.request_next() {
                    spawn_scene_load(self.proxy.clone(), req.ticket, req.entry.path);
                }
            }
            ViewerAction::PreviousModel => {
                if let Some(req) = self.viewer.request_previous() {
                    spawn_scene_load(self.proxy.clone(), req.ticket, req.entry.path);
                }
            }
            ViewerAction::ZoomIn => self.viewer.zoom_in(),
            ViewerAction::ZoomOut => self.viewer.zoom_out(),
        }
    }

    fn draw_viewer(ready: &mut ReadyState, viewer: &ViewerState<SceneModel>, hud: &mut ViewerHud) {
        let raw_input = ready.egui_state.take_egui_input(ready.gfx.window());
        let viewport_tex_id = ready.viewport_tex_id;
        let cam_eye = ready.gfx.eye();
        let cam_yaw = ready.gfx.yaw();
        let cam_pitch = ready.gfx.pitch();
        let surface_cfg = ready.gfx.surface_config();
        let viewport_w = surface_cfg.width as f32;
        let viewport_h = surface_cfg.height as f32;
        let loading = viewer.is_loading();
        let egui_ctx = ready.egui_ctx.clone();
        let full_output = egui_ctx.run(raw_input, |ctx| {
            egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
                egui::MenuBar::new().ui(ui, |ui| {
                    ui.menu_button("File", |ui| {
                        if ui.button("Quit").clicked() {
                            hud.quit_requested = true;
                            ui.close();
                        }
                    });

                    ui.menu_button("View", |ui| {
                        ui.checkbox(&mut hud.show_catalog_panel, "Show catalog panel");
                        ui.checkbox(&mut hud.show_debug_panel, "Show viewport debug panel");
                        ui.checkbox(&mut hud.show_axes, "Show axes");
                    });

                    ui.menu_button("Help", |ui| {
                        ui.label("Vitrine Model Browser");
                    });
                });
            });
            egui::TopBottomPanel::top("controls").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui
                        .add_enabled(!loading, egui::Button::new("Previous Model"))
                        .clicked()
                    {
                        hud.action = Some(ViewerAction::PreviousModel);
                    }
                    if ui
                        .add_enabled(!loading, egui::Button::new("Next Model"))
                        .clicked()
                    {
                        hud.action = Some(ViewerAction::NextModel);
                    }

                    ui.separator();

                    if ui.button("Zoom In").clicked() {
                        hud.action = Some(ViewerAction::ZoomIn);
                    }
                    if ui.button("Zoom Out").clicked() {
                        hud.action = Some(ViewerAction::ZoomOut);
                    }

                    ui.separator();

                    ui.label("Current Model:");
                    ui.label(egui::RichText::new(viewer.current_name()).strong());
                    ui.weak(format!(
                        "{} / {}",
                        viewer.current_index() + 1,
                        viewer.catalog().len()
                    ));
                });

                if let Some(failure) = viewer.last_failure() {
                    ui.colored_label(egui::Color32::RED, format!("Load failed: {failure}"));
                }
            });
            egui::SidePanel::left("catalog_panel")
                .resizable(true)
                .default_width(220.0)
                .show_animated(ctx, hud.show_catalog_panel, |ui| {
                    ui.heading("Catalog");
                    ui.separator();

                    for (i, entry) in viewer.catalog().entries().iter().enumerate() {
                        let _ = ui.selectable_label(i == viewer.current_index(), &entry.name);
                    }
                });
            egui::TopBottomPanel::bottom("debug_panel")
                .resizable(true)
                .default_height(120.0)
                .show_animated(ctx, hud.show_debug_panel, |ui| {
                    ui.heading("Viewport Debug");
                    ui.separator();

                    ui.horizontal(|ui| {
                        ui.label("Camera eye:");
                        ui.monospace(format!("{:?}", cam_eye));
                    });

                    ui.horizontal(|ui| {
                        ui.label("Yaw / Pitch:");
                        ui.monospace(format!("{:.3} / {:.3}", cam_yaw, cam_pitch));
                    });

                    ui.horizontal(|ui| {
                        ui.label("Model scale:");
                        ui.monospace(format!("{:.4}", viewer.scale()));
                    });

                    ui.horizontal(|ui| {
                        ui.label("State:");
                        ui.monospace(if loading { "loading" } else { "idle" });
                    });

                    ui.separator();
                    ui.label(
                        "Double-click viewport to capture camera.\n\
                         Esc to release.",
                    );
                });

            egui::CentralPanel::default().show(ctx, |ui| {
                let available = ui.available_size();

                if available.x > 0.0 && available.y > 0.0 && viewport_w > 0.0 && viewport_h > 0.0 {
                    let tex_aspect = viewport_w / viewport_h;
                    let panel_aspect = available.x / available.y;
                    let (w, h) = if panel_aspect > tex_aspect {
                        let h = available.y;
                        let w = h * tex_aspect;
                        (w, h)
                    } else {
                        let w = available.x;
                        let h = w / tex_aspect;
                        (w, h)
                    };

                    let viewport_size = egui::vec2(w, h);
                    let sized = SizedTexture::new(viewport_tex_id, viewport_size);
                    let image = egui::Image::from_texture(sized).sense(Sense::click_and_drag());
                    let response = ui.add(image);

                    if response.double_clicked() && !hud.camera_active {
                        hud.camera_active = true;
                        hud.cursor_grab_request = Some(true);
                    }

                    if hud.camera_active {
                        let painter = ui.painter();
                        painter.rect_stroke(
                            response.rect.shrink(1.0),
                            0.0,
                            egui::Stroke::new(2.0, egui::Color32::YELLOW),
                            egui::StrokeKind::Inside,
                        );
                        painter.text(
                            response.rect.right_top() + egui::vec2(-10.0, 10.0),
                            egui::Align2::RIGHT_TOP,
                            "Camera Control (Esc to exit)",
                            egui::FontId::proportional(14.0),
                            egui::Color32::YELLOW,
                        );
                    }
                } else {
                    ui.label("Viewport area is too small.");
                }
            });

            if loading {
                egui::Window::new("loading_overlay")
                    .title_bar(false)
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                    .show(ctx, |ui| {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Loading…");
                        });
                    });
            }
        });

        let egui::FullOutput {
            platform_output,
            textures_delta,
            shapes,
            pixels_per_point,
            ..
        } = full_output;

        ready
            .egui_state
            .handle_platform_output(ready.gfx.window(), platform_output);

        let paint_jobs = ready.egui_ctx.tessellate(shapes, pixels_per_point);

        if let Some(grab) = hud.cursor_grab_request.take() {
            let window = ready.gfx.window();
            if grab {
                window.set_cursor_visible(false);
                let _ = window.set_cursor_grab(winit::window::CursorGrabMode::Confined);
            } else {
                window.set_cursor_visible(true);
                let _ = window.set_cursor_grab(winit::window::CursorGrabMode::None);
            }
        }
        let scene = viewer.scene();
        let scale = viewer.scale();
        let show_axes = hud.show_axes;
        ready
            .gfx
            .draw(scene, scale, show_axes, |gfx_inner, swap_view, encoder| {
                for (id, image_delta) in &textures_delta.set {
                    ready.egui_renderer.update_texture(
                        gfx_inner.device(),
                        gfx_inner.queue(),
                        *id,
                        image_delta,
                    );
                }
                for id in &textures_delta.free {
                    ready.egui_renderer.free_texture(id);
                }

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [
                        gfx_inner.surface_config().width,
                        gfx_inner.surface_config().height,
                    ],
                    pixels_per_point,
                };

                ready.egui_renderer.update_buffers(
                    gfx_inner.device(),
                    gfx_inner.queue(),
                    encoder,
                    &paint_jobs,
                    &screen_descriptor,
                );

                let rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_overlay_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: swap_view,
                        depth_slice: None,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });

                let mut rpass = rpass.forget_lifetime();
                ready
                    .egui_renderer
                    .render(&mut rpass, &paint_jobs, &screen_descriptor);
            });
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let State::Init(proxy) = &mut self.state {
            if let Some(proxy) = proxy.take() {
                let mut win_attr = Window::default_attributes();
                win_attr = win_attr.with_title("Vitrine");

                let window: RcWindow = std::sync::Arc::new(
                    event_loop
                        .create_window(win_attr)
                        .expect("create window err."),
                );
                let entry = self.viewer.catalog().get(self.viewer.current_index());
                pollster::block_on(create_graphics(
                    window,
                    proxy,
                    entry.path.clone(),
                    self.viewer.scale(),
                ));
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Ready {
                graphics,
                scene,
                error,
            } => {
                let gfx = *graphics;
                let (egui_ctx, egui_state, egui_renderer, viewport_tex_id) =
                    App::init_egui_for_graphics(&gfx);

                if let Some(scene) = scene {
                    self.viewer.install_scene(scene);
                }
                if let Some(message) = error {
                    self.viewer.record_failure(message);
                }

                gfx.request_redraw();
                self.state = State::Ready(ReadyState {
                    gfx,
                    egui_ctx,
                    egui_state,
                    egui_renderer,
                    viewport_tex_id,
                });
            }
            ViewerEvent::SceneLoaded { ticket, result } => {
                let State::Ready(ready) = &mut self.state else {
                    return;
                };
                match result {
                    Ok(data) => {
                        let scene = ready.gfx.upload_scene(&data);
                        if self.viewer.complete_load(ticket, scene) {
                            log::info!(
                                "showing \"{}\" ({} triangles)",
                                self.viewer.current_name(),
                                data.triangle_count()
                            );
                        } else {
                            log::debug!("dropping stale scene for ticket {ticket}");
                        }
                    }
                    Err(e) => {
                        log::warn!("model load failed: {e:#}");
                        self.viewer.fail_load(ticket, format!("{e:#}"));
                    }
                }
                ready.gfx.request_redraw();
            }
        }
    }

    fn new_events(&mut self, _event_loop: &ActiveEventLoop, _cause: StartCause) {
        if self.viewer.tick(Instant::now()) {
            log::warn!(
                "abandoning load: {}",
                self.viewer.last_failure().unwrap_or("timed out")
            );
        }
        if self.render_target <= Instant::now() {
            self.render_target += FRAME_TIME;
            if let State::Ready(ready) = &mut self.state {
                ready.gfx.request_redraw();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::Resized(size) => self.resized(size),
            WindowEvent::RedrawRequested => {
                self.draw();
                self.apply_actions(event_loop);
                let now = Instant::now();
                if self.render_target <= now {
                    self.render_target = now + FRAME_TIME;
                    if let State::Ready(ready) = &mut self.state {
                        ready.gfx.request_redraw();
                    }
                }
            }
            WindowEvent::CloseRequested => event_loop.exit(),
            other => {
                if let State::Ready(ready) = &mut self.state {
                    let response = ready.egui_state.on_window_event(ready.gfx.window(), &other);
                    if response.repaint {
                        ready.gfx.request_redraw();
                    }
                    if let WindowEvent::KeyboardInput {
                        event: key_event, ..
                    } = &other
                    {
                        use winit::event::ElementState;
                        use winit::keyboard::{KeyCode, PhysicalKey};

                        if let PhysicalKey::Code(KeyCode::Escape) = key_event.physical_key {
                            if key_event.state == ElementState::Pressed
                                && !key_event.repeat
                                && self.hud.camera_active
                            {
                                self.hud.camera_active = false;
                                self.hud.cursor_grab_request = Some(false);
                                ready.gfx.request_redraw();
                            }
                        }
                    }
                    if self.hud.camera_active && !response.consumed {
                        ready.gfx.handle_window_event(&other);
                    }
                }
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let State::Ready(ready) = &mut self.state {
            if self.hud.camera_active {
                ready.gfx.handle_device_event(&event);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.render_target));
    }
}
