use std::ops::{
    Add, AddAssign, Deref, DerefMut, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub,
    SubAssign,
};

pub type Mat4x4 = Mat<f32, 4, 4>;

/// Row-major `M x N` matrix. Vectors are `N x 1` matrices, but transforms treat them as row vectors:
/// a point `p` is transformed as `p * M`, so composing `A * B` applies `A` first.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mat<T, const M: usize, const N: usize>([[T; N]; M]);

impl<T: Num, const M: usize, const N: usize> Mat<T, M, N> {
    pub fn zero() -> Self {
        Mat([[T::zero(); N]; M])
    }

    pub fn transpose(self) -> Mat<T, N, M> {
        let mut ret = Mat::zero();
        for i in 0..M {
            for j in 0..N {
                ret[(j, i)] = self[(i, j)];
            }
        }
        ret
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Mat<U, M, N>
    where
        U: Copy,
    {
        let mut f = f;
        Mat(self.0.map(|row| row.map(&mut f)))
    }

    pub fn rows(&self) -> &[[T; N]; M] {
        &self.0
    }
}

impl<T: Num, const N: usize> Mat<T, N, N> {
    pub fn identity() -> Self {
        let mut ret = Self::zero();
        for i in 0..N {
            ret[(i, i)] = T::one();
        }
        ret
    }
}

impl<T: Float> Mat<T, 4, 4> {
    #[rustfmt::skip]
    pub fn rotation_x(theta: T) -> Self {
        let o = T::one();
        let z = T::zero();
        let cos = theta.cos();
        let sin = theta.sin();
        Mat([[   o,   z,   z,   z],
             [   z, cos, sin,   z],
             [   z,-sin, cos,   z],
             [   z,   z,   z,   o]])
    }

    #[rustfmt::skip]
    pub fn rotation_y(theta: T) -> Self {
        let o = T::one();
        let z = T::zero();
        let cos = theta.cos();
        let sin = theta.sin();
        Mat([[ cos,   z, sin,   z],
             [   z,   o,   z,   z],
             [-sin,   z, cos,   z],
             [   z,   z,   z,   o]])
    }

    #[rustfmt::skip]
    pub fn rotation_z(theta: T) -> Self {
        let o = T::one();
        let z = T::zero();
        let cos = theta.cos();
        let sin = theta.sin();
        Mat([[ cos, sin,   z,   z],
             [-sin, cos,   z,   z],
             [   z,   z,   o,   z],
             [   z,   z,   z,   o]])
    }

    /// Perspective projection. `fovy` is measured in degrees and `aspect` is `width / height`.
    ///
    /// Maps view space depth `near..far` to `0..1` after the divide, and stores the view space `z` in `w`.
    pub fn perspective(aspect: T, fovy: T, near: T, far: T) -> Self {
        let two = T::one() + T::one();
        let f = T::one() / (fovy.to_radians() / two).tan();
        let mut ret = Mat::zero();
        ret[(0, 0)] = f / aspect;
        ret[(1, 1)] = f;
        ret[(2, 2)] = far / (far - near);
        ret[(2, 3)] = T::one();
        ret[(3, 2)] = -far * near / (far - near);
        ret
    }

    /// The matrix that places an object at `position` oriented towards `target`. Its inverse is the view matrix.
    pub fn point_at(position: Vec<T, 3>, target: Vec<T, 3>, up: Vec<T, 3>) -> Self {
        let forward = (target - position).normalized();
        let up = (up - forward * up.dot(forward)).normalized();
        let right = up.cross(forward);

        Mat([
            [right.x, right.y, right.z, T::zero()],
            [up.x, up.y, up.z, T::zero()],
            [forward.x, forward.y, forward.z, T::zero()],
            [position.x, position.y, position.z, T::one()],
        ])
    }

    pub fn look_at(position: Vec<T, 3>, target: Vec<T, 3>, up: Vec<T, 3>) -> Self {
        Self::point_at(position, target, up).quick_inverse()
    }

    /// Inverse of a rotation + translation matrix: transposes the rotation block and negates the translation
    /// projected onto each axis. Only valid for orthonormal rotations.
    pub fn quick_inverse(self) -> Self {
        let t = Vec::from([self[(3, 0)], self[(3, 1)], self[(3, 2)]]);
        let mut ret = self.transpose();
        for i in 0..3 {
            let axis = Vec::from([self[(i, 0)], self[(i, 1)], self[(i, 2)]]);
            ret[(i, 3)] = T::zero();
            ret[(3, i)] = -t.dot(axis);
        }
        ret[(3, 3)] = T::one();
        ret
    }
}

impl<T, const M: usize, const N: usize> From<[[T; N]; M]> for Mat<T, M, N> {
    fn from(value: [[T; N]; M]) -> Self {
        Mat(value)
    }
}

pub type Vec<T, const N: usize> = Mat<T, N, 1>;
pub type Vec2 = Vec<f32, 2>;
pub type Vec3 = Vec<f32, 3>;
pub type Vec4 = Vec<f32, 4>;
pub type Vec2i = Vec<i32, 2>;

impl<T: Num, const N: usize> Vec<T, N> {
    pub fn repeat(value: T) -> Self {
        Mat([[value]; N])
    }

    pub fn to_array(self) -> [T; N] {
        self.0.map(|[el]| el)
    }

    pub fn dot(self, rhs: Self) -> T {
        let mut ret = T::zero();
        for i in 0..N {
            ret += self.0[i][0] * rhs.0[i][0];
        }
        ret
    }

    pub fn mag_sq(self) -> T {
        self.dot(self)
    }

    pub fn lerp(self, to: Self, t: T) -> Self {
        self + (to - self) * t
    }
}

impl<T: Float, const N: usize> Vec<T, N> {
    pub fn mag(self) -> T {
        self.mag_sq().sqrt()
    }

    /// Undefined (NaN) for the zero vector.
    pub fn normalized(self) -> Self {
        self / self.mag()
    }
}

impl<T: Num> Vec<T, 3> {
    pub fn cross(self, rhs: Self) -> Self {
        Self::from([
            self.y * rhs.z - self.z * rhs.y,
            self.z * rhs.x - self.x * rhs.z,
            self.x * rhs.y - self.y * rhs.x,
        ])
    }

    /// Homogeneous point, `w = 1`.
    pub fn to_hom(self) -> Vec<T, 4> {
        Vec::from([self.x, self.y, self.z, T::one()])
    }

    /// Homogeneous direction, `w = 0`.
    pub fn to_hom_dir(self) -> Vec<T, 4> {
        Vec::from([self.x, self.y, self.z, T::zero()])
    }

    pub fn transform(self, m: Mat<T, 4, 4>) -> Vec<T, 4> {
        self.to_hom().transform(m)
    }

    pub fn to_rotation(self) -> Mat<T, 4, 4>
    where
        T: Float,
    {
        Mat::rotation_x(self.x) * Mat::rotation_y(self.y) * Mat::rotation_z(self.z)
    }

    pub fn to_translation(self) -> Mat<T, 4, 4> {
        let mut ret = Mat::identity();
        ret[(3, 0)] = self.x;
        ret[(3, 1)] = self.y;
        ret[(3, 2)] = self.z;
        ret
    }
}

impl<T: Num> Vec<T, 4> {
    /// Row vector times matrix.
    pub fn transform(self, m: Mat<T, 4, 4>) -> Self {
        let mut ret = Self::zero();
        for j in 0..4 {
            for i in 0..4 {
                ret.0[j][0] += self.0[i][0] * m[(i, j)];
            }
        }
        ret
    }
}

impl<T: Copy, const N: usize> From<[T; N]> for Vec<T, N> {
    fn from(value: [T; N]) -> Self {
        Mat(value.map(|el| [el]))
    }
}

impl<T, const M: usize, const N: usize> Index<(usize, usize)> for Mat<T, M, N> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        &self.0[i][j]
    }
}

impl<T, const M: usize, const N: usize> IndexMut<(usize, usize)> for Mat<T, M, N> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        &mut self.0[i][j]
    }
}

impl<T: Num, const M: usize, const N: usize> Add for Mat<T, M, N> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let mut ret = self;
        ret += rhs;
        ret
    }
}

impl<T: Num, const M: usize, const N: usize> AddAssign for Mat<T, M, N> {
    fn add_assign(&mut self, rhs: Self) {
        for i in 0..M {
            for j in 0..N {
                self[(i, j)] += rhs[(i, j)];
            }
        }
    }
}

impl<T: Num, const M: usize, const N: usize> Sub for Mat<T, M, N> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        let mut ret = self;
        ret -= rhs;
        ret
    }
}

impl<T: Num, const M: usize, const N: usize> SubAssign for Mat<T, M, N> {
    fn sub_assign(&mut self, rhs: Self) {
        for i in 0..M {
            for j in 0..N {
                self[(i, j)] -= rhs[(i, j)];
            }
        }
    }
}

impl<T: Num, const M: usize, const N: usize> Neg for Mat<T, M, N> {
    type Output = Self;

    fn neg(self) -> Self {
        self.map(|el| -el)
    }
}

impl<T: Num, const M: usize, const N: usize> Mul<T> for Mat<T, M, N> {
    type Output = Self;

    fn mul(self, rhs: T) -> Self {
        let mut ret = self;
        ret *= rhs;
        ret
    }
}

impl<T: Num, const M: usize, const N: usize> MulAssign<T> for Mat<T, M, N> {
    fn mul_assign(&mut self, rhs: T) {
        for i in 0..M {
            for j in 0..N {
                self[(i, j)] *= rhs;
            }
        }
    }
}

macro_rules! impl_mul_lhs {
    ($($ty:ty),+) => {
        $(impl<const M: usize, const N: usize> Mul<Mat<$ty, M, N>> for $ty {
            type Output = Mat<$ty, M, N>;

            fn mul(self, rhs: Mat<$ty, M, N>) -> Mat<$ty, M, N> {
                rhs * self
            }
        })+
    };
}

impl_mul_lhs!(f32, f64);

impl<T: Num, const M: usize, const K: usize, const N: usize> Mul<Mat<T, K, N>> for Mat<T, M, K> {
    type Output = Mat<T, M, N>;

    fn mul(self, rhs: Mat<T, K, N>) -> Self::Output {
        let mut ret = Mat::zero();
        for i in 0..M {
            for j in 0..N {
                for k in 0..K {
                    ret[(i, j)] += self[(i, k)] * rhs[(k, j)];
                }
            }
        }
        ret
    }
}

impl<T: Num, const M: usize, const N: usize> Div<T> for Mat<T, M, N> {
    type Output = Self;

    fn div(self, rhs: T) -> Self {
        let mut ret = self;
        ret /= rhs;
        ret
    }
}

impl<T: Num, const M: usize, const N: usize> DivAssign<T> for Mat<T, M, N> {
    fn div_assign(&mut self, rhs: T) {
        for i in 0..M {
            for j in 0..N {
                self[(i, j)] /= rhs;
            }
        }
    }
}

// SAFETY (for the derefs below): `Mat<T, N, 1>` is `repr(transparent)` over `[[T; 1]; N]`, which has the same
// layout as the `repr(C)` structs with `N` fields of type `T`.

impl<T: Num> Deref for Vec<T, 2> {
    type Target = XY<T>;

    fn deref(&self) -> &XY<T> {
        unsafe { &*(self as *const Self as *const XY<T>) }
    }
}

impl<T: Num> DerefMut for Vec<T, 2> {
    fn deref_mut(&mut self) -> &mut XY<T> {
        unsafe { &mut *(self as *mut Self as *mut XY<T>) }
    }
}

impl<T: Num> Deref for Vec<T, 3> {
    type Target = XYZ<T>;

    fn deref(&self) -> &XYZ<T> {
        unsafe { &*(self as *const Self as *const XYZ<T>) }
    }
}

impl<T: Num> DerefMut for Vec<T, 3> {
    fn deref_mut(&mut self) -> &mut XYZ<T> {
        unsafe { &mut *(self as *mut Self as *mut XYZ<T>) }
    }
}

impl<T: Num> Deref for Vec<T, 4> {
    type Target = XYZW<T>;

    fn deref(&self) -> &XYZW<T> {
        unsafe { &*(self as *const Self as *const XYZW<T>) }
    }
}

impl<T: Num> DerefMut for Vec<T, 4> {
    fn deref_mut(&mut self) -> &mut XYZW<T> {
        unsafe { &mut *(self as *mut Self as *mut XYZW<T>) }
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct XY<T> {
    pub x: T,
    pub y: T,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct XYZ<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T: Copy> XYZ<T> {
    pub fn xy(&self) -> Vec<T, 2> {
        Vec::from([self.x, self.y])
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct XYZW<T> {
    pub x: T,
    pub y: T,
    pub z: T,
    pub w: T,
}

impl<T: Copy> XYZW<T> {
    pub fn xy(&self) -> Vec<T, 2> {
        Vec::from([self.x, self.y])
    }

    pub fn xyz(&self) -> Vec<T, 3> {
        Vec::from([self.x, self.y, self.z])
    }
}

pub trait Num:
    Copy
    + PartialOrd
    + Add<Output = Self>
    + AddAssign
    + Sub<Output = Self>
    + SubAssign
    + Mul<Output = Self>
    + MulAssign
    + Div<Output = Self>
    + DivAssign
    + Neg<Output = Self>
{
    fn zero() -> Self;
    fn one() -> Self;
}

pub trait Float: Num {
    fn sqrt(self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn tan(self) -> Self;
    fn to_radians(self) -> Self;
}

macro_rules! impl_num {
    ($($ty:ty => $zero:literal, $one:literal);+ $(;)?) => {
        $(impl Num for $ty {
            fn zero() -> Self {
                $zero
            }

            fn one() -> Self {
                $one
            }
        })+
    };
}

impl_num! {
    f32 => 0.0, 1.0;
    f64 => 0.0, 1.0;
    i32 => 0, 1;
}

macro_rules! impl_float {
    ($($ty:ty),+) => {
        $(impl Float for $ty {
            fn sqrt(self) -> Self {
                <$ty>::sqrt(self)
            }

            fn sin(self) -> Self {
                <$ty>::sin(self)
            }

            fn cos(self) -> Self {
                <$ty>::cos(self)
            }

            fn tan(self) -> Self {
                <$ty>::tan(self)
            }

            fn to_radians(self) -> Self {
                <$ty>::to_radians(self)
            }
        })+
    };
}

impl_float!(f32, f64);
