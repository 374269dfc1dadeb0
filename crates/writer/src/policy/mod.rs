//! Rotation and retention policies
//!
//! Policies are plain strategy objects. The file writer asks its rotation
//! policies whether to roll the active file before each write and on every
//! periodic check, and after each rotation (and periodically) asks its
//! retention policies which rotated files to remove. Policies are looked up
//! by configured name through the [`PolicyRegistry`].

mod registry;
mod retention;
mod rotation;

pub use registry::PolicyRegistry;
pub use retention::{
    FileCountRetention, MaxAgeRetention, RetentionPolicy, RotatedFile, TotalSizeRetention,
};
pub use rotation::{
    ActiveFileState, FixedTimeRotation, RotationPolicy, SizeLimitRotation, TimeLimitRotation,
};
