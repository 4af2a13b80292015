/// Errors raised by the core math routines.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("matrix is not invertible (determinant {determinant})")]
    SingularMatrix { determinant: f32 },
}
