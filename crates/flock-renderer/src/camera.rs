//! Orbit camera for 3D visualization

use glam::{Mat4, Quat, Vec3};

pub const DEFAULT_DISTANCE: f32 = 600.0;
pub const DEFAULT_FOVY_DEGREES: f32 = 65.0;
pub const ZNEAR: f32 = 0.1;
pub const ZFAR: f32 = 6000.0;

const MIN_DISTANCE: f32 = 1.0;

/// Camera orbiting a target point
#[derive(Clone, Debug)]
pub struct Camera {
    pub distance: f32,
    pub rotation: Quat,
    pub target: Vec3,
    pub aspect: f32,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    /// Camera [`DEFAULT_DISTANCE`] units in front of `target`.
    pub fn new(width: u32, height: u32, target: Vec3) -> Self {
        Self {
            distance: DEFAULT_DISTANCE,
            rotation: Quat::IDENTITY,
            target,
            aspect: aspect_ratio(width, height),
            fovy: DEFAULT_FOVY_DEGREES.to_radians(),
            znear: ZNEAR,
            zfar: ZFAR,
        }
    }

    pub fn position(&self) -> Vec3 {
        let offset = self.rotation * Vec3::new(0.0, 0.0, self.distance);
        self.target + offset
    }

    pub fn rotate(&mut self, delta_x: f32, delta_y: f32) {
        let up = self.rotation * Vec3::Y;
        let yaw_rotation = Quat::from_axis_angle(up, delta_x);

        let right = self.rotation * Vec3::X;
        let pitch_rotation = Quat::from_axis_angle(right, -delta_y);

        self.rotation = yaw_rotation * pitch_rotation * self.rotation;
        self.rotation = self.rotation.normalize();
    }

    /// Move towards (negative) or away from (positive) the target.
    /// The camera never passes the far plane or the target.
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance + delta).clamp(MIN_DISTANCE, self.zfar * 0.5);
    }

    pub fn build_view_projection_matrix(&self) -> Mat4 {
        let position = self.position();
        let rotation_matrix = Mat4::from_quat(self.rotation.conjugate());
        let translation_matrix = Mat4::from_translation(-position);
        let view = rotation_matrix * translation_matrix;
        let proj = Mat4::perspective_rh(self.fovy, self.aspect, self.znear, self.zfar);
        proj * view
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}
