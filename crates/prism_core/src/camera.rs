use glam::{Mat4, Vec3};

use crate::bounds::Aabb;

pub const DEFAULT_FOV_DEGREES: f32 = 35.0;
/// Extra room around a framed model.
pub const MODEL_PADDING_FACTOR: f32 = 2.0;
/// Used when the framing formula degenerates (zero-sized or non-finite model).
pub const FALLBACK_DISTANCE: f32 = 5.0;

#[derive(Clone, Debug)]
pub struct Camera {
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov: DEFAULT_FOV_DEGREES.to_radians(),
            aspect_ratio: 16.0 / 9.0,
            near: 1.0,
            far: 1000.0,
        }
    }
}

impl Camera {
    /// Computes the "Projection Matrix" (View -> Clip)
    pub fn compute_projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }
}

/// Distance at which a model whose largest side is `max_dim` fits the view.
///
/// `|max_dim / 2 * tan(2 * fov)| * padding`, falling back to `max_dim * 2`
/// when that is zero or NaN, and to [`FALLBACK_DISTANCE`] when even the
/// fallback is not a usable positive distance.
pub fn framing_distance(max_dim: f32, fov: f32) -> f32 {
    let mut distance = ((max_dim / 2.0) * (fov * 2.0).tan()).abs() * MODEL_PADDING_FACTOR;

    if distance == 0.0 || distance.is_nan() {
        distance = max_dim * 2.0;
    }

    if !distance.is_finite() || distance <= 0.0 {
        distance = FALLBACK_DISTANCE;
    }

    distance
}

/// Orbit camera around a target point with damped rotation, like a turntable.
#[derive(Clone, Debug)]
pub struct OrbitController {
    pub camera: Camera,
    pub target: Vec3,
    pub damping: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    position: Vec3,
    yaw_delta: f32,
    pitch_delta: f32,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(Camera::default())
    }
}

impl OrbitController {
    const MIN_POLAR: f32 = 1e-4;

    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            target: Vec3::ZERO,
            damping: 0.04,
            min_distance: 0.0,
            max_distance: 1000.0,
            position: Vec3::new(0.0, 0.0, FALLBACK_DISTANCE),
            yaw_delta: 0.0,
            pitch_delta: 0.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).length()
    }

    /// Re-targets the camera at the center of `bounds`, backed off along +Z by
    /// [`framing_distance`]. The offset is relative to the center, so a model
    /// far from the origin along Z is still in front of the camera.
    pub fn frame_bounds(&mut self, bounds: &Aabb) {
        let center = bounds.center();
        let distance = framing_distance(bounds.max_dimension(), self.camera.fov);

        self.position = center + Vec3::Z * distance;
        self.target = center;
        self.yaw_delta = 0.0;
        self.pitch_delta = 0.0;

        log::debug!(
            "Framed model: center {:?}, distance {:.3}",
            center,
            distance
        );
    }

    /// Queues a rotation (radians); it is applied over the next frames.
    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        self.yaw_delta += yaw;
        self.pitch_delta += pitch;
    }

    /// Scales the orbit radius; values below 1 move closer.
    pub fn zoom(&mut self, scale: f32) {
        if !scale.is_finite() || scale <= 0.0 {
            return;
        }
        let offset = self.position - self.target;
        let radius = (offset.length() * scale).clamp(self.min_distance, self.max_distance);
        self.position = self.target + offset.normalize_or(Vec3::Z) * radius;
    }

    /// Applies the damped part of the pending rotation. Call once per frame.
    pub fn update(&mut self) {
        let offset = self.position - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            self.yaw_delta = 0.0;
            self.pitch_delta = 0.0;
            return;
        }

        let theta = offset.x.atan2(offset.z) + self.yaw_delta * self.damping;
        let phi = ((offset.y / radius).clamp(-1.0, 1.0).acos() + self.pitch_delta * self.damping)
            .clamp(Self::MIN_POLAR, std::f32::consts::PI - Self::MIN_POLAR);

        self.position = self.target
            + Vec3::new(phi.sin() * theta.sin(), phi.cos(), phi.sin() * theta.cos()) * radius;

        self.yaw_delta *= 1.0 - self.damping;
        self.pitch_delta *= 1.0 - self.damping;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.camera.compute_projection_matrix() * self.view_matrix()
    }
}
