//! scenepack core - Math types shared by the scenepack crates
//!
//! This crate provides the small set of primitives the packer needs:
//! - Mathematical primitives (re-exported from glam)
//! - RGBA colors for material reflectance
//! - Normal-matrix computation for node transforms
//! - World-space extents and their accumulator

pub mod error;
pub mod extents;
pub mod math;
pub mod types;

pub use error::CoreError;
pub use extents::{Extents, ExtentsBuilder};
pub use glam::{Mat4, Vec2, Vec3, Vec4};
pub use math::normal_matrix;
pub use types::Color;
