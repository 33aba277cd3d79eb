use crate::{
    clip::{ClipPlanes, Plane},
    vec::{Mat4x4, Vec3},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl Camera {
    /// Unit vector from the position towards the target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalized()
    }

    /// Moves both position and target along the look direction.
    pub fn advance(&mut self, amount: f32) {
        let step = self.forward() * amount;
        self.position += step;
        self.target += step;
    }

    pub fn view_matrix(&self) -> Mat4x4 {
        Mat4x4::look_at(self.position, self.target, self.up)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            position: Vec3::zero(),
            target: Vec3::from([0., 0., 1.]),
            up: Vec3::from([0., 1., 0.]),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// Vertical field of view in degrees.
    pub fovy: f32,
    /// `width / height`
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn matrix(&self) -> Mat4x4 {
        Mat4x4::perspective(self.aspect, self.fovy, self.near, self.far)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Projection {
            fovy: 40.,
            aspect: 1.,
            near: 0.1,
            far: 500.,
        }
    }
}

/// Value derived from a key, rebuilt only when the key changes.
#[derive(Clone, Debug)]
struct Memo<K, V> {
    key: K,
    value: V,
    generation: u32,
}

impl<K: PartialEq + Copy, V> Memo<K, V> {
    fn new(key: K, build: impl FnOnce(&K) -> V) -> Self {
        Memo {
            value: build(&key),
            key,
            generation: 0,
        }
    }

    fn get(&mut self, key: K, build: impl FnOnce(&K) -> V) -> &V {
        if self.key != key {
            self.value = build(&key);
            self.key = key;
            self.generation += 1;
        }
        &self.value
    }
}

/// Everything the pipeline needs from the context for one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameState<'a> {
    pub world: Mat4x4,
    pub view: Mat4x4,
    pub projection: Mat4x4,
    pub planes: &'a [Plane],
    pub camera: Vec3,
    pub light_dir: Vec3,
}

/// Scene parameters that change between frames, with the matrices derived from them.
#[derive(Clone, Debug)]
pub struct RenderContext {
    pub camera: Camera,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vec3,
    pub projection: Projection,
    light_dir: Vec3,

    world: Memo<Vec3, Mat4x4>,
    view: Memo<Camera, Mat4x4>,
    proj: Memo<Projection, Mat4x4>,
    planes: Memo<(Projection, ClipPlanes), Vec<Plane>>,
}

fn build_planes(&(projection, set): &(Projection, ClipPlanes)) -> Vec<Plane> {
    set.planes(&projection.matrix(), projection.near, projection.far)
}

impl RenderContext {
    pub fn new(camera: Camera, projection: Projection) -> Self {
        let rotation = Vec3::zero();
        RenderContext {
            camera,
            rotation,
            projection,
            light_dir: Vec3::from([-1., -1., 0.]).normalized(),
            world: Memo::new(rotation, |r| r.to_rotation()),
            view: Memo::new(camera, Camera::view_matrix),
            proj: Memo::new(projection, Projection::matrix),
            planes: Memo::new((projection, ClipPlanes::default()), build_planes),
        }
    }

    pub fn light_dir(&self) -> Vec3 {
        self.light_dir
    }

    /// Stored normalized.
    pub fn set_light_dir(&mut self, dir: Vec3) {
        self.light_dir = dir.normalized();
    }

    /// Adds `delta` radians to the model rotation.
    pub fn rotate(&mut self, delta: Vec3) {
        self.rotation += delta;
    }

    pub fn set_aspect(&mut self, width: usize, height: usize) {
        self.projection.aspect = width as f32 / height as f32;
    }

    pub fn world_matrix(&mut self) -> Mat4x4 {
        *self.world.get(self.rotation, |r| r.to_rotation())
    }

    pub fn view_matrix(&mut self) -> Mat4x4 {
        *self.view.get(self.camera, Camera::view_matrix)
    }

    pub fn projection_matrix(&mut self) -> Mat4x4 {
        *self.proj.get(self.projection, Projection::matrix)
    }

    pub fn clip_planes(&mut self, set: ClipPlanes) -> &[Plane] {
        self.planes.get((self.projection, set), build_planes)
    }

    pub fn frame_state(&mut self, set: ClipPlanes) -> FrameState<'_> {
        let world = self.world_matrix();
        let view = self.view_matrix();
        let projection = self.projection_matrix();
        let camera = self.camera.position;
        let light_dir = self.light_dir;
        FrameState {
            world,
            view,
            projection,
            planes: self.clip_planes(set),
            camera,
            light_dir,
        }
    }
}
