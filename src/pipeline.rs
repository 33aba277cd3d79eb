use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::{
    buf::{Frame, MatrixSliceMut},
    clip::{ClipArena, ClipPlanes, ClipTriangle, Plane},
    color_to_pixel,
    context::RenderContext,
    lines,
    project::{self, ScreenTriangle, Viewport},
    raster,
    shaders::{FragAttrs, FragmentShader},
    vec::{Mat4x4, Vec2, Vec2i},
    vertex::{AmbientFloor, CullingMode, TransformStage},
    Mesh, Pixel, Triangle, UvTriangle,
};

/// Bands per rayon thread in the parallel fragment pass.
const BANDS_PER_THREAD: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub culling: CullingMode,
    /// Color of the triangle outlines drawn over the filled frame, if any.
    pub wireframe: Option<Pixel>,
    pub clip_planes: ClipPlanes,
    pub ambient: AmbientFloor,
    pub clear_color: Pixel,
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            culling: CullingMode::default(),
            wireframe: None,
            clip_planes: ClipPlanes::default(),
            ambient: AmbientFloor::default(),
            clear_color: [0, 0, 0, 255],
            parallel: false,
        }
    }
}

/// A triangle after the vertex pass, ready to be rasterized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedTriangle {
    pub screen: ScreenTriangle,
    pub lighting: f32,
    pub textured: bool,
    /// Index of the mesh triangle it was clipped from.
    pub source: usize,
}

enum Outcome {
    Culled,
    ClippedAway,
    Emitted,
}

struct VertexPass<'a> {
    stage: TransformStage,
    planes: &'a [Plane],
    projection: Mat4x4,
    viewport: Viewport,
    textured: bool,
}

impl VertexPass<'_> {
    fn process(
        &self,
        arena: &mut ClipArena,
        source: usize,
        tri: &Triangle,
        uv: &UvTriangle,
        out: &mut Vec<ProjectedTriangle>,
    ) -> Outcome {
        let Some(view) = self.stage.exec(tri, uv) else {
            return Outcome::Culled;
        };

        let input = ClipTriangle {
            points: view.points,
            uv: view.uv,
        };
        let clipped = arena.clip(input, self.planes);
        if clipped.is_empty() {
            return Outcome::ClippedAway;
        }

        out.extend(clipped.iter().map(|t| ProjectedTriangle {
            screen: project::project(&t.points, &t.uv, &self.projection, &self.viewport),
            lighting: view.lighting,
            textured: self.textured,
            source,
        }));
        Outcome::Emitted
    }
}

/// Rasterizes every triangle into one band of the frame and returns the number of shaded pixels.
fn shade_band<S>(
    tris: &[ProjectedTriangle],
    shader: &S,
    color: &mut MatrixSliceMut<Pixel>,
    depth: &mut MatrixSliceMut<f32>,
) -> usize
where
    S: FragmentShader + ?Sized,
{
    let mut shaded = 0;
    for tri in tris {
        raster::draw_triangle(&tri.screen, depth, |x, y, u, v| {
            let attrs = FragAttrs {
                uv: tri.textured.then(|| Vec2::from([u, v])),
                lighting: tri.lighting,
            };
            let c = shader.exec(Vec2i::from([x, y]), attrs);
            if let Some(px) = color.get_mut(x, y) {
                *px = color_to_pixel(c);
            }
            shaded += 1;
        });
    }
    shaded
}

pub struct Pipeline {
    config: PipelineConfig,
    arena: ClipArena,
    triangles: Vec<ProjectedTriangle>,
    metrics: Metrics,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline {
            config,
            arena: ClipArena::with_planes(6),
            triangles: Vec::new(),
            metrics: Metrics::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PipelineConfig {
        &mut self.config
    }

    pub fn with_culling(&mut self, culling: CullingMode) -> &mut Self {
        self.config.culling = culling;
        self
    }

    pub fn with_wireframe(&mut self, wireframe: Option<Pixel>) -> &mut Self {
        self.config.wireframe = wireframe;
        self
    }

    pub fn with_parallel(&mut self, parallel: bool) -> &mut Self {
        self.config.parallel = parallel;
        self
    }

    /// Triangles produced by the last vertex pass, in mesh order.
    pub fn triangles(&self) -> &[ProjectedTriangle] {
        &self.triangles
    }

    /// Clears `frame` and renders `mesh` into it.
    pub fn render<S>(&mut self, mesh: &Mesh, ctx: &mut RenderContext, shader: &S, frame: &mut Frame) -> Metrics
    where
        S: FragmentShader + Sync + ?Sized,
    {
        self.metrics.clear();
        frame.begin(frame.width(), frame.height(), self.config.clear_color);

        let start = Instant::now();
        self.vertex_pass(mesh, ctx, Viewport::new(frame.width(), frame.height()));
        self.metrics.vertex_time = start.elapsed();

        let start = Instant::now();
        self.metrics.pixels_shaded = if self.config.parallel {
            self.fragment_pass_parallel(shader, frame)
        } else {
            shade_band(
                &self.triangles,
                shader,
                &mut frame.color.borrow_mut(),
                &mut frame.depth.borrow_mut(),
            )
        };
        if let Some(color) = self.config.wireframe {
            self.draw_wireframe(frame, color);
        }
        self.metrics.fragment_time = start.elapsed();

        log::debug!("{}", self.metrics);
        self.metrics
    }

    fn vertex_pass(&mut self, mesh: &Mesh, ctx: &mut RenderContext, viewport: Viewport) {
        let state = ctx.frame_state(self.config.clip_planes);
        let pass = VertexPass {
            stage: TransformStage {
                world: state.world,
                view: state.view,
                camera: state.camera,
                light_dir: state.light_dir,
                culling: self.config.culling,
                ambient: self.config.ambient,
            },
            planes: state.planes,
            projection: state.projection,
            viewport,
            textured: mesh.has_uvs(),
        };

        self.metrics.triangles_in = mesh.len();
        self.triangles.clear();

        if self.config.parallel {
            let n_planes = pass.planes.len();
            let results: Vec<(Outcome, Vec<ProjectedTriangle>)> = mesh
                .triangles
                .par_iter()
                .enumerate()
                .map_init(
                    || ClipArena::with_planes(n_planes),
                    |arena, (i, tri)| {
                        let mut out = Vec::new();
                        let outcome = pass.process(arena, i, tri, &mesh.uv(i), &mut out);
                        (outcome, out)
                    },
                )
                .collect();

            for (outcome, tris) in results {
                self.metrics.count(outcome);
                self.triangles.extend(tris);
            }
        } else {
            for (i, tri) in mesh.triangles.iter().enumerate() {
                let outcome = pass.process(&mut self.arena, i, tri, &mesh.uv(i), &mut self.triangles);
                self.metrics.count(outcome);
            }
        }

        self.metrics.triangles_emitted = self.triangles.len();
    }

    /// Splits the frame into horizontal bands and rasterizes every triangle into each band on the rayon pool.
    /// Each pixel belongs to a single band, so depth tests never race.
    fn fragment_pass_parallel<S>(&self, shader: &S, frame: &mut Frame) -> usize
    where
        S: FragmentShader + Sync + ?Sized,
    {
        let n_bands = rayon::current_num_threads() * BANDS_PER_THREAD;
        let band_height = frame.height().div_ceil(n_bands).max(1);

        let color_bands: Vec<_> = frame.color.bands_mut(band_height).collect();
        let depth_bands: Vec<_> = frame.depth.bands_mut(band_height).collect();
        let tris = &self.triangles;

        color_bands
            .into_par_iter()
            .zip(depth_bands)
            .map(|(mut color, mut depth)| shade_band(tris, shader, &mut color, &mut depth))
            .sum()
    }

    fn draw_wireframe(&self, frame: &mut Frame, color: Pixel) {
        let mut target = frame.color.borrow_mut();
        for tri in &self.triangles {
            let points = tri.screen.points.map(|p| (p.x, p.y));
            lines::draw_outline(&mut target, points, color);
        }
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct Metrics {
    pub triangles_in: usize,
    pub backfaces_culled: usize,
    pub clipped_away: usize,
    pub triangles_emitted: usize,
    pub pixels_shaded: usize,
    pub vertex_time: Duration,
    pub fragment_time: Duration,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn count(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Culled => self.backfaces_culled += 1,
            Outcome::ClippedAway => self.clipped_away += 1,
            Outcome::Emitted => {}
        }
    }
}

impl std::fmt::Display for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let &Metrics {
            triangles_in,
            backfaces_culled,
            clipped_away,
            triangles_emitted,
            pixels_shaded,
            vertex_time,
            fragment_time,
        } = self;
        writeln!(f, "render metrics:")?;
        writeln!(f, "\ttriangles in: {triangles_in}")?;
        writeln!(f, "\tbackfaces culled: {backfaces_culled}")?;
        writeln!(f, "\tclipped away: {clipped_away}")?;
        writeln!(f, "\ttriangles emitted: {triangles_emitted}")?;
        writeln!(f, "\tpixels shaded: {pixels_shaded}")?;
        writeln!(f, "\tvertex pass: {vertex_time:.2?}")?;
        write!(f, "\tfragment pass: {fragment_time:.2?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        buf::Frame,
        context::{Camera, Projection},
        shaders::FlatShader,
        vec::{Vec3, Vec4},
    };

    fn v(x: f32, y: f32, z: f32) -> Vec3 {
        Vec3::from([x, y, z])
    }

    fn context() -> RenderContext {
        RenderContext::new(
            Camera::default(),
            Projection {
                fovy: 90.,
                aspect: 1.,
                near: 0.1,
                far: 1000.,
            },
        )
    }

    fn white() -> FlatShader {
        FlatShader {
            color: Vec4::repeat(1.),
        }
    }

    #[test]
    fn metrics_count_every_outcome() {
        let mesh = Mesh::new(vec![
            // faces the camera
            [v(-1., -1., 5.), v(0., 1., 5.), v(1., -1., 5.)],
            // faces away
            [v(-1., -1., 5.), v(1., -1., 5.), v(0., 1., 5.)],
            // behind the camera, facing it
            [v(-1., -1., -5.), v(1., -1., -5.), v(0., 1., -5.)],
        ]);
        let mut frame = Frame::new(32, 32, [0, 0, 0, 255]);
        let mut pipeline = Pipeline::new(PipelineConfig::default());
        let metrics = pipeline.render(&mesh, &mut context(), &white(), &mut frame);

        assert_eq!(metrics.triangles_in, 3);
        assert_eq!(metrics.backfaces_culled, 1);
        assert_eq!(metrics.clipped_away, 1);
        assert_eq!(metrics.triangles_emitted, 1);
        assert!(metrics.pixels_shaded > 0);
        assert!(pipeline.triangles().iter().all(|t| t.source == 0 && !t.textured));
    }

    #[test]
    fn wireframe_is_drawn_over_fill() {
        let mesh = Mesh::new(vec![[v(-1., -1., 5.), v(0., 1., 5.), v(1., -1., 5.)]]);
        let mut frame = Frame::new(32, 32, [0, 0, 0, 255]);
        let red = [255, 0, 0, 255];
        let mut pipeline = Pipeline::new(PipelineConfig::default());
        pipeline.with_wireframe(Some(red));
        pipeline.render(&mesh, &mut context(), &white(), &mut frame);

        let corner = pipeline.triangles()[0].screen.points[0];
        assert_eq!(frame.color.get(corner.x as i32, corner.y as i32), Some(red));
        assert!(frame.color.as_slice().iter().any(|&p| p != red && p != [0, 0, 0, 255]));
    }
}
