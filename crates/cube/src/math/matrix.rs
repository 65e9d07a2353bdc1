use glam::{Mat4, Vec3, Vec4};

/// A 4x4 transform addressed as `m[row][col]`, with translation stored in row 3.
///
/// Rows are composed with the row-vector convention: `multiply(a, b)` applies
/// `a` first and `b` second. Internally each row is kept as one column of a
/// [`Mat4`], which makes the row-major view here and glam's column-major
/// storage line up byte for byte. [`Matrix::to_gpu_array`] is therefore the
/// exact layout a shader expects for `mat4x4<f32>` without any transpose.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matrix(Mat4);

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Self = Self(Mat4::IDENTITY);

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn from_rows(rows: [[f32; 4]; 4]) -> Self {
        Self(Mat4::from_cols_array_2d(&rows))
    }

    pub fn to_rows(&self) -> [[f32; 4]; 4] {
        self.0.to_cols_array_2d()
    }

    pub fn row(&self, row: usize) -> Vec4 {
        self.0.col(row)
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.0.col(row)[col]
    }

    /// The matrix as glam sees it, i.e. the column-vector form of the same transform.
    pub fn as_mat4(&self) -> &Mat4 {
        &self.0
    }

    /// Sixteen floats in upload order (`m[0][0]`, `m[0][1]`, ..., `m[3][3]`).
    pub fn to_gpu_array(&self) -> [f32; 16] {
        self.0.to_cols_array()
    }

    /// Translates along the matrix's current local axes.
    ///
    /// Row 3 receives `tx * row0 + ty * row1 + tz * row2`. The update happens in
    /// place, so calling this before or after [`Matrix::rotate`] gives different
    /// results.
    pub fn translate(&mut self, tx: f32, ty: f32, tz: f32) {
        let offset = self.0.x_axis * tx + self.0.y_axis * ty + self.0.z_axis * tz;
        self.0.w_axis += offset;
    }

    /// Left-composes a rotation of `angle_degrees` about `(x, y, z)`: `m = R * m`.
    ///
    /// The axis is normalized first. A zero (or non-finite) axis leaves the
    /// matrix untouched.
    pub fn rotate(&mut self, angle_degrees: f32, x: f32, y: f32, z: f32) {
        let Some(axis) = Vec3::new(x, y, z).try_normalize() else {
            return;
        };

        let (sin, cos) = angle_degrees.to_radians().sin_cos();
        let one_minus_cos = 1.0 - cos;

        let (xx, yy, zz) = (axis.x * axis.x, axis.y * axis.y, axis.z * axis.z);
        let (xy, yz, zx) = (axis.x * axis.y, axis.y * axis.z, axis.z * axis.x);
        let (xs, ys, zs) = (axis.x * sin, axis.y * sin, axis.z * sin);

        let rotation = Self::from_rows([
            [one_minus_cos * xx + cos, one_minus_cos * xy + zs, one_minus_cos * zx - ys, 0.0],
            [one_minus_cos * xy - zs, one_minus_cos * yy + cos, one_minus_cos * yz + xs, 0.0],
            [one_minus_cos * zx + ys, one_minus_cos * yz - xs, one_minus_cos * zz + cos, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);

        *self = Self::multiply(&rotation, self);
    }

    /// `r[i][j] = sum_k a[i][k] * b[k][j]`.
    pub fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
        // Row-major a*b is column-major b*a over the same storage.
        Matrix(b.0 * a.0)
    }

    /// Left-composes a symmetric perspective projection: `m = P * m`.
    ///
    /// Degenerate input (`z_far == z_near`, `sin(fovy / 2) == 0` or
    /// `aspect == 0`) leaves the matrix untouched.
    pub fn perspective(&mut self, fovy_degrees: f32, aspect: f32, z_near: f32, z_far: f32) {
        let half_fovy = (fovy_degrees / 2.0).to_radians();
        let delta_z = z_far - z_near;
        let (sine, cosine) = half_fovy.sin_cos();

        if delta_z == 0.0 || sine == 0.0 || aspect == 0.0 {
            return;
        }

        let cotangent = cosine / sine;

        let projection = Self::from_rows([
            [cotangent / aspect, 0.0, 0.0, 0.0],
            [0.0, cotangent, 0.0, 0.0],
            [0.0, 0.0, -(z_far + z_near) / delta_z, -1.0],
            [0.0, 0.0, -2.0 * z_near * z_far / delta_z, 0.0],
        ]);

        *self = Self::multiply(&projection, self);
    }

    pub fn abs_diff_eq(&self, other: &Matrix, max_abs_diff: f32) -> bool {
        self.0.abs_diff_eq(other.0, max_abs_diff)
    }
}
