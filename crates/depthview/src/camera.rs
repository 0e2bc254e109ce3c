//! Orbit camera around the image plane and the drag/scroll controls that move it.

use glam::{Mat4, Vec3};

/// Vertical field of view, degrees.
pub const FOV_Y_DEG: f32 = 60.0;
/// Starting distance from the orbit target; keeps the whole unit plane in view.
pub const INITIAL_DISTANCE: f32 = 2.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 1000.0;

const MIN_DISTANCE: f32 = 0.05;
const MAX_DISTANCE: f32 = 100.0;
// Keep short of the poles so the view basis never degenerates.
const MAX_ELEVATION: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Orbit camera around a target, Y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    /// Point the camera orbits and looks at.
    pub target: Vec3,
    /// Distance from the target.
    pub distance: f32,
    /// Rotation about +Y, radians. Zero looks down -Z.
    pub azimuth: f32,
    /// Angle above the XZ plane, radians.
    pub elevation: f32,
    /// Viewport `width / height`.
    pub aspect: f32,
}

impl OrbitCamera {
    /// Camera on +Z at [`INITIAL_DISTANCE`], looking at the origin.
    pub fn new(aspect: f32) -> Self {
        Self {
            target: Vec3::ZERO,
            distance: INITIAL_DISTANCE,
            azimuth: 0.0,
            elevation: 0.0,
            aspect: sanitize_aspect(aspect),
        }
    }

    /// Camera position in world space.
    pub fn eye(&self) -> Vec3 {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        self.target
            + self.distance * Vec3::new(cos_el * sin_az, sin_el, cos_el * cos_az)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    /// Right-handed projection with a `[0, 1]` depth range.
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(FOV_Y_DEG.to_radians(), self.aspect, NEAR, FAR)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// World-space height visible at the target plane.
    pub fn visible_height(&self) -> f32 {
        2.0 * self.distance * (FOV_Y_DEG.to_radians() * 0.5).tan()
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}

/// Orbit/pan/zoom input applied to an [`OrbitCamera`], with a reset snapshot
/// captured at construction.
///
/// These are the only mutation paths into camera state.
#[derive(Debug, Clone)]
pub struct CameraControls {
    camera: OrbitCamera,
    initial: OrbitCamera,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
}

impl CameraControls {
    pub fn new(camera: OrbitCamera) -> Self {
        Self {
            camera,
            initial: camera,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }

    #[inline]
    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    #[inline]
    pub fn initial(&self) -> &OrbitCamera {
        &self.initial
    }

    /// Rotates by a pointer drag of `(dx, dy)` pixels on a viewport
    /// `viewport_height` pixels tall. A full-height drag is one half turn.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        let k = std::f32::consts::TAU * self.rotate_speed / h;
        self.camera.azimuth -= dx * k;
        self.camera.elevation = (self.camera.elevation + dy * k).clamp(-MAX_ELEVATION, MAX_ELEVATION);
    }

    /// Moves the target in the view plane so the scene follows the pointer.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        let units_per_px = self.camera.visible_height() / h;

        let forward = (self.camera.target - self.camera.eye()).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);

        self.camera.target += (-dx * right + dy * up) * units_per_px;
    }

    /// Positive `steps` (wheel up) zooms in.
    pub fn zoom(&mut self, steps: f32) {
        let scale = 0.95f32.powf(steps * self.zoom_speed);
        self.camera.distance = (self.camera.distance * scale).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Viewport changes keep the reset snapshot's aspect in step.
    pub fn set_aspect(&mut self, aspect: f32) {
        let aspect = sanitize_aspect(aspect);
        self.camera.aspect = aspect;
        self.initial.aspect = aspect;
    }

    /// Restores the state captured at construction.
    pub fn reset(&mut self) {
        self.camera = self.initial;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_view_contains_the_plane() {
        let cam = OrbitCamera::new(16.0 / 9.0);
        assert_eq!(cam.eye(), Vec3::new(0.0, 0.0, 2.0));
        // Unit plane corners must project inside clip space.
        for corner in [
            Vec3::new(-0.5, -0.5, 0.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::new(-0.5, 0.5, 0.0),
        ] {
            let clip = cam.view_proj() * corner.extend(1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0, "{corner:?} -> {ndc:?}");
        }
    }

    #[test]
    fn reset_restores_snapshot_exactly() {
        let mut controls = CameraControls::new(OrbitCamera::new(1.5));
        controls.rotate(120.0, -40.0, 600.0);
        controls.pan(30.0, 10.0, 600.0);
        controls.zoom(3.0);
        assert_ne!(controls.camera(), controls.initial());

        controls.reset();
        assert_eq!(controls.camera(), controls.initial());
        assert_eq!(controls.camera().eye(), Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn elevation_is_clamped_short_of_the_pole() {
        let mut controls = CameraControls::new(OrbitCamera::new(1.0));
        controls.rotate(0.0, 10_000.0, 100.0);
        assert!(controls.camera().elevation < std::f32::consts::FRAC_PI_2);
        assert!(controls.camera().view().is_finite());
    }

    #[test]
    fn zoom_in_shrinks_distance_within_bounds() {
        let mut controls = CameraControls::new(OrbitCamera::new(1.0));
        controls.zoom(1.0);
        assert!(controls.camera().distance < INITIAL_DISTANCE);
        controls.zoom(10_000.0);
        assert_eq!(controls.camera().distance, MIN_DISTANCE);
        controls.zoom(-10_000.0);
        assert_eq!(controls.camera().distance, MAX_DISTANCE);
    }

    #[test]
    fn pan_moves_target_in_view_plane() {
        let mut controls = CameraControls::new(OrbitCamera::new(1.0));
        controls.pan(100.0, 0.0, 500.0);
        let t = controls.camera().target;
        assert!(t.x < 0.0);
        assert_eq!(t.z, 0.0);
    }

    #[test]
    fn degenerate_aspect_falls_back_to_square() {
        assert_eq!(OrbitCamera::new(f32::NAN).aspect, 1.0);
        assert_eq!(OrbitCamera::new(0.0).aspect, 1.0);
    }
}
