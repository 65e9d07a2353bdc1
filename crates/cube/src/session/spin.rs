use crate::config::SpinConfig;
use crate::math::Matrix;

/// Per-frame transforms produced by [`Spin::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMatrices {
    pub modelview: Matrix,
    pub mvp: Matrix,
}

/// Animation state for a cube spinning about a fixed axis.
///
/// The angle is in degrees and always stays in `[0, 360)`.
#[derive(Debug, Clone)]
pub struct Spin {
    angle: f32,
    step: f32,
    axis: [f32; 3],
    offset: [f32; 3],
}

impl Spin {
    pub fn new(config: &SpinConfig) -> Self {
        Self {
            angle: 0.0,
            step: config.step_degrees,
            axis: config.axis,
            offset: config.offset,
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = wrap_degrees(angle);
        self
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Modelview for the current angle: identity, translate, then rotate, in place.
    pub fn modelview(&self) -> Matrix {
        let [tx, ty, tz] = self.offset;
        let [ax, ay, az] = self.axis;

        let mut modelview = Matrix::identity();
        modelview.translate(tx, ty, tz);
        modelview.rotate(self.angle, ax, ay, az);
        modelview
    }

    pub fn advance(&mut self) {
        self.angle = wrap_degrees(self.angle + self.step);
    }

    /// Builds this frame's modelview, advances the angle, then derives mvp.
    ///
    /// The returned modelview uses the angle from *before* the advance.
    pub fn update(&mut self, projection: &Matrix) -> FrameMatrices {
        let modelview = self.modelview();
        self.advance();
        let mvp = Matrix::multiply(&modelview, projection);
        FrameMatrices { modelview, mvp }
    }
}

fn wrap_degrees(mut angle: f32) -> f32 {
    if angle >= 360.0 {
        angle -= 360.0;
    }
    if angle < 0.0 {
        angle += 360.0;
    }
    // Only reachable for steps larger than a full turn.
    if !(0.0..360.0).contains(&angle) {
        angle = angle.rem_euclid(360.0);
        if angle >= 360.0 {
            angle = 0.0;
        }
    }
    angle
}
