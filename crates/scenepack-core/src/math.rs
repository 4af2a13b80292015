//! Matrix helpers

use glam::Mat4;

use crate::error::CoreError;

/// Compute the matrix that carries surface normals through `model`.
///
/// This is the transpose of the inverse, which keeps normals perpendicular
/// to the transformed surface under non-uniform scale. A model matrix with a
/// zero or non-finite determinant has no inverse and is rejected.
pub fn normal_matrix(model: Mat4) -> Result<Mat4, CoreError> {
    let determinant = model.determinant();
    if determinant == 0.0 || !determinant.is_finite() {
        return Err(CoreError::SingularMatrix { determinant });
    }

    let normal = model.inverse().transpose();
    if !normal.is_finite() {
        return Err(CoreError::SingularMatrix { determinant });
    }
    Ok(normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn assert_mat_eq(a: Mat4, b: Mat4) {
        assert!(a.abs_diff_eq(b, 1e-5), "{a:?} != {b:?}");
    }

    #[test]
    fn test_identity_stays_identity() {
        assert_mat_eq(normal_matrix(Mat4::IDENTITY).unwrap(), Mat4::IDENTITY);
    }

    #[test]
    fn test_uniform_scale_inverts() {
        let normal = normal_matrix(Mat4::from_scale(Vec3::splat(4.0))).unwrap();
        assert_mat_eq(normal, Mat4::from_scale(Vec3::splat(0.25)));
    }

    #[test]
    fn test_matches_inverse_transpose() {
        let model = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 0.5, 3.0),
            Quat::from_rotation_y(0.7),
            Vec3::new(1.0, -2.0, 5.0),
        );
        assert_mat_eq(normal_matrix(model).unwrap(), model.inverse().transpose());
    }

    #[test]
    fn test_pure_rotation_is_unchanged() {
        let model = Mat4::from_rotation_z(1.2);
        assert_mat_eq(normal_matrix(model).unwrap(), model);
    }

    #[test]
    fn test_non_uniform_scale_keeps_normals_perpendicular() {
        let model = Mat4::from_scale(Vec3::new(4.0, 1.0, 1.0));
        let normal = normal_matrix(model).unwrap();

        // A 45 degree slope in the xy plane and its normal.
        let tangent = Vec3::new(1.0, 1.0, 0.0);
        let n = Vec3::new(1.0, -1.0, 0.0);

        let t = model.transform_vector3(tangent);
        let n = normal.transform_vector3(n);
        assert!(t.dot(n).abs() < 1e-5);
    }

    #[test]
    fn test_singular_matrix_is_rejected() {
        let model = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        match normal_matrix(model) {
            Err(CoreError::SingularMatrix { determinant }) => assert_eq!(determinant, 0.0),
            other => panic!("expected SingularMatrix, got: {:?}", other),
        }
    }

    #[test]
    fn test_nan_matrix_is_rejected() {
        let mut model = Mat4::IDENTITY;
        model.x_axis.x = f32::NAN;
        assert!(normal_matrix(model).is_err());
    }
}
