use glam::{Mat4, Vec3};
use wgpu::{Buffer, Queue};
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::keyboard::KeyCode;

const MIN_DISTANCE: f32 = 0.2;
const MAX_DISTANCE: f32 = 500.0;

/// Camera that orbits a target point. `yaw`/`pitch` place the eye on a
/// sphere of radius `distance` around `target`.
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl OrbitCamera {
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            target,
            distance,
            yaw: 0.0,
            pitch: -0.3,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * -self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        let max_pitch = std::f32::consts::FRAC_PI_2 - 0.01;
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-max_pitch, max_pitch);
    }

    /// Positive delta moves the eye away from the target.
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance * (1.0 + delta * 0.1)).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }
}

/// Translates captured-viewport input into orbit camera motion: mouse drag
/// orbits, the wheel zooms, WASD/JK pan the target.
pub struct CameraController {
    pan_forward: bool,
    pan_back: bool,
    pan_left: bool,
    pan_right: bool,
    pan_up: bool,
    pan_down: bool,
    boost_speed: bool,
    sensitivity: f32,
}

impl CameraController {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            pan_forward: false,
            pan_back: false,
            pan_left: false,
            pan_right: false,
            pan_up: false,
            pan_down: false,
            boost_speed: false,
            sensitivity,
        }
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent, cam: &mut OrbitCamera) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: winit::keyboard::PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                if *repeat {
                    return;
                }
                let pressed = *state == ElementState::Pressed;
                match code {
                    KeyCode::KeyW => self.pan_forward = pressed,
                    KeyCode::KeyS => self.pan_back = pressed,
                    KeyCode::KeyA => self.pan_left = pressed,
                    KeyCode::KeyD => self.pan_right = pressed,
                    KeyCode::KeyJ => self.pan_up = pressed,
                    KeyCode::KeyK => self.pan_down = pressed,
                    KeyCode::ShiftLeft => self.boost_speed = pressed,
                    _ => {}
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y as f32) / 60.0,
                };
                cam.zoom(-scroll);
            }
            _ => {}
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent, cam: &mut OrbitCamera) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            cam.rotate(-(*dx as f32) * self.sensitivity, -(*dy as f32) * self.sensitivity);
        }
    }

    pub fn update(&mut self, cam: &mut OrbitCamera, dt: f32) {
        let mut movement = Vec3::ZERO;

        let forward = cam.target - cam.eye();
        let mut flat_forward = Vec3::new(forward.x, 0.0, forward.z);
        if flat_forward.length_squared() > 0.0 {
            flat_forward = flat_forward.normalize();
        }

        let mut right = flat_forward.cross(Vec3::Y);
        if right.length_squared() > 0.0 {
            right = right.normalize();
        }

        if self.pan_forward {
            movement += flat_forward;
        }
        if self.pan_back {
            movement -= flat_forward;
        }
        if self.pan_right {
            movement += right;
        }
        if self.pan_left {
            movement -= right;
        }
        if self.pan_up {
            movement += Vec3::Y;
        }
        if self.pan_down {
            movement -= Vec3::Y;
        }

        if movement.length_squared() > 0.0 {
            movement = movement.normalize();
            // Pan speed follows the zoom level so motion feels uniform.
            let mut speed = cam.distance * 0.4;
            if self.boost_speed {
                speed *= 5.0;
            }
            cam.target += movement * speed * dt;
        }
    }
}

pub fn update_camera_buffer(
    queue: &Queue,
    camera_buf: &Buffer,
    camera: &OrbitCamera,
    width: u32,
    height: u32,
) {
    let view = camera.view_matrix();
    let aspect = (width.max(1) as f32) / (height.max(1) as f32);
    let proj = Mat4::perspective_rh(45.0_f32.to_radians(), aspect, 0.1, 1000.0);

    let vp = (proj * view).to_cols_array();
    queue.write_buffer(camera_buf, 0, bytemuck::cast_slice(&[vp]));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eye_sits_on_the_orbit_sphere() {
        let cam = OrbitCamera {
            target: Vec3::new(1.0, 2.0, 3.0),
            distance: 5.0,
            yaw: 0.7,
            pitch: -0.4,
        };
        let radius = (cam.eye() - cam.target).length();
        assert!((radius - 5.0).abs() < 1e-4, "eye should be `distance` from the target");
    }

    #[test]
    fn level_camera_looks_down_negative_z() {
        let cam = OrbitCamera {
            target: Vec3::ZERO,
            distance: 2.0,
            yaw: 0.0,
            pitch: 0.0,
        };
        let eye = cam.eye();
        assert!((eye - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn pitch_is_clamped_short_of_the_poles() {
        let mut cam = OrbitCamera::new(Vec3::ZERO, 5.0);
        cam.rotate(0.0, 100.0);
        assert!(cam.pitch < std::f32::consts::FRAC_PI_2);
        cam.rotate(0.0, -200.0);
        assert!(cam.pitch > -std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn zoom_clamps_distance() {
        let mut cam = OrbitCamera::new(Vec3::ZERO, 5.0);
        for _ in 0..200 {
            cam.zoom(-1.0);
        }
        assert_eq!(cam.distance, MIN_DISTANCE);
        for _ in 0..200 {
            cam.zoom(10.0);
        }
        assert_eq!(cam.distance, MAX_DISTANCE);
    }
}
