use glam::{Mat4, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: Vec3::new(x, y, z),
            ..Default::default()
        }
    }

    /// Splits an affine matrix back into translation / rotation / scale.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Creates the Model Matrix (Local -> Parent)
    pub fn compute_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Transpose(Inverse(Model)): keeps normals perpendicular under non-uniform scale.
pub fn normal_matrix(model: &Mat4) -> Mat4 {
    model.inverse().transpose()
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Quat, Vec3};

    use super::Transform;

    #[test]
    fn matrix_round_trip_keeps_components() {
        let transform = Transform {
            translation: Vec3::new(1.0, -2.0, 3.0),
            rotation: Quat::from_rotation_y(0.5),
            scale: Vec3::splat(2.0),
        };

        let back = Transform::from_matrix(transform.compute_matrix());
        assert!(back.translation.abs_diff_eq(transform.translation, 1e-5));
        assert!(back.scale.abs_diff_eq(transform.scale, 1e-5));
        assert!(back.rotation.abs_diff_eq(transform.rotation, 1e-5));
    }

    #[test]
    fn identity_matrix() {
        assert_eq!(Transform::IDENTITY.compute_matrix(), Mat4::IDENTITY);
    }
}
