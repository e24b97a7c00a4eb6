//! Viewport camera for terrain navigation.
//!
//! Orbit controls with smooth interpolation; tools detach the controls
//! while they own the pointer.

/// Viewport camera resource and controller system.
pub mod viewport_camera;
