use softraster::{
    buf::Frame,
    clip::ClipPlanes,
    context::{Camera, Projection, RenderContext},
    obj,
    pipeline::{Pipeline, PipelineConfig},
    shaders::{self, FlatShader, TexturedShader},
    texture::Checkerboard,
    vec::{Vec2, Vec3, Vec4},
    vertex::CullingMode,
    Mesh, Pixel, Triangle,
};

const CLEAR: Pixel = [0, 0, 0, 255];

fn v(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::from([x, y, z])
}

/// Camera at the origin looking down +z.
fn context(fovy: f32, aspect: f32) -> RenderContext {
    RenderContext::new(
        Camera::default(),
        Projection {
            fovy,
            aspect,
            near: 0.1,
            far: 1000.,
        },
    )
}

fn flat(r: f32, g: f32, b: f32) -> FlatShader {
    FlatShader {
        color: Vec4::from([r, g, b, 1.]),
    }
}

// Normal (0, 0, -1): faces a camera at the origin.
fn facing(z: f32) -> Triangle {
    [v(-1., -1., z), v(0., 1., z), v(1., -1., z)]
}

fn covered(frame: &Frame) -> usize {
    frame.color.as_slice().iter().filter(|&&p| p != CLEAR).count()
}

#[test]
fn unit_triangle_in_front_of_camera_is_visible() {
    let mesh = Mesh::new(vec![[v(0., 0., 5.), v(0., 1., 5.), v(1., 0., 5.)]]);
    let mut frame = Frame::new(64, 64, CLEAR);
    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let metrics = pipeline.render(&mesh, &mut context(90., 1.), &flat(1., 1., 1.), &mut frame);

    assert_eq!(metrics.triangles_emitted, 1);
    for p in pipeline.triangles()[0].screen.points {
        assert!((0. ..=64.).contains(&p.x) && (0. ..=64.).contains(&p.y), "{p:?}");
    }
    assert!(metrics.pixels_shaded > 0);
    assert_eq!(covered(&frame), metrics.pixels_shaded);
}

#[test]
fn triangle_behind_near_plane_leaves_frame_clear() {
    let mesh = Mesh::new(vec![facing(0.05)]);
    let mut frame = Frame::new(32, 32, CLEAR);
    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let metrics = pipeline.render(&mesh, &mut context(90., 1.), &flat(1., 1., 1.), &mut frame);

    assert_eq!(metrics.clipped_away, 1);
    assert_eq!(metrics.pixels_shaded, 0);
    assert_eq!(covered(&frame), 0);
}

#[test]
fn triangle_facing_away_is_culled_unless_disabled() {
    let [a, b, c] = facing(5.);
    let mesh = Mesh::new(vec![[a, c, b]]);
    let mut frame = Frame::new(32, 32, CLEAR);

    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let metrics = pipeline.render(&mesh, &mut context(90., 1.), &flat(1., 1., 1.), &mut frame);
    assert_eq!(metrics.backfaces_culled, 1);
    assert_eq!(covered(&frame), 0);

    pipeline.with_culling(CullingMode::Disabled);
    let metrics = pipeline.render(&mesh, &mut context(90., 1.), &flat(1., 1., 1.), &mut frame);
    assert_eq!(metrics.backfaces_culled, 0);
    assert!(covered(&frame) > 0);
}

#[test]
fn nearest_triangle_wins_in_any_order() {
    let near = facing(4.);
    let far = [v(-2., -2., 6.), v(0., 2., 6.), v(2., -2., 6.)];
    // Constant uv per triangle tells them apart: red for the near one, green for the far one.
    let red = [v(1., 0., 0.); 3];
    let green = [v(0., 1., 0.); 3];
    let shader = shaders::from_fn(|_, attrs: shaders::FragAttrs| {
        let uv = attrs.uv.unwrap_or(Vec2::zero());
        Vec4::from([uv.x, uv.y, 0., 1.])
    });

    let render = |mesh: Mesh| {
        let mut frame = Frame::new(48, 48, CLEAR);
        let mut pipeline = Pipeline::new(PipelineConfig::default());
        pipeline.render(&mesh, &mut context(90., 1.), &shader, &mut frame);
        frame
    };

    let a = render(Mesh::with_uvs(vec![near, far], vec![red, green]));
    let b = render(Mesh::with_uvs(vec![far, near], vec![green, red]));
    assert_eq!(a.color, b.color);
    assert_eq!(a.depth, b.depth);

    assert_eq!(a.color.get(24, 24), Some([255, 0, 0, 255]));
    // Below the near triangle, still inside the far one.
    assert_eq!(a.color.get(24, 31), Some([0, 255, 0, 255]));
}

#[test]
fn parallel_matches_sequential() {
    let src = "\
v -1 -1 -1
v 1 -1 -1
v 1 1 -1
v -1 1 -1
v -1 -1 1
v 1 -1 1
v 1 1 1
v -1 1 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 4/4 3/3 2/2
f 5/1 6/2 7/3 8/4
f 1/1 5/4 8/3 4/2
f 2/1 3/2 7/3 6/4
f 4/1 8/2 7/3 3/4
f 1/1 2/2 6/3 5/4
";
    let mesh = obj::parse_obj(src).unwrap();
    assert_eq!(mesh.len(), 12);
    let shader = TexturedShader::new(Checkerboard::default());

    let render = |parallel: bool, clip_planes: ClipPlanes| {
        let mut ctx = RenderContext::new(
            Camera {
                position: v(0., 0., -4.),
                target: Vec3::zero(),
                up: v(0., 1., 0.),
            },
            Projection {
                fovy: 60.,
                aspect: 97. / 61.,
                near: 0.1,
                far: 100.,
            },
        );
        ctx.rotation = v(0.4, 0.7, 0.1);
        let mut frame = Frame::new(97, 61, CLEAR);
        let mut pipeline = Pipeline::new(PipelineConfig {
            parallel,
            clip_planes,
            wireframe: Some([0, 255, 0, 255]),
            ..Default::default()
        });
        let metrics = pipeline.render(&mesh, &mut ctx, &shader, &mut frame);
        (frame, metrics)
    };

    for planes in [ClipPlanes::Frustum, ClipPlanes::Near] {
        let (seq, seq_metrics) = render(false, planes);
        let (par, par_metrics) = render(true, planes);
        assert!(covered(&seq) > 0);
        assert_eq!(seq.color, par.color);
        assert_eq!(seq.depth, par.depth);
        assert_eq!(seq_metrics.pixels_shaded, par_metrics.pixels_shaded);
        assert_eq!(seq_metrics.triangles_emitted, par_metrics.triangles_emitted);
        assert_eq!(seq_metrics.backfaces_culled, par_metrics.backfaces_culled);
        assert!(seq_metrics.backfaces_culled >= 6);
    }
}

#[test]
fn untextured_mesh_gets_no_uv() {
    let mesh = Mesh::new(vec![facing(5.)]);
    let shader = shaders::from_fn(|_, attrs: shaders::FragAttrs| {
        assert!(attrs.uv.is_none());
        Vec4::repeat(1.)
    });
    let mut frame = Frame::new(16, 16, CLEAR);
    let metrics = Pipeline::new(PipelineConfig::default()).render(&mesh, &mut context(90., 1.), &shader, &mut frame);
    assert!(metrics.pixels_shaded > 0);
}

#[test]
fn wireframe_survives_huge_edges_without_side_planes() {
    // Near enough that the projected corners land hundreds of viewports away.
    let mesh = Mesh::new(vec![[v(-100., -100., 0.15), v(0., 100., 0.15), v(100., -100., 0.15)]]);
    let red = [255, 0, 0, 255];
    let mut frame = Frame::new(640, 640, CLEAR);
    let mut pipeline = Pipeline::new(PipelineConfig {
        culling: CullingMode::Disabled,
        clip_planes: ClipPlanes::NearFar,
        wireframe: Some(red),
        ..Default::default()
    });
    let metrics = pipeline.render(&mesh, &mut context(90., 1.), &flat(1., 1., 1.), &mut frame);

    assert_eq!(metrics.triangles_emitted, 1);
    // The triangle covers the whole viewport and none of its edges cross it.
    assert_eq!(covered(&frame), 640 * 640);
    assert!(frame.color.as_slice().iter().all(|&p| p != red));
}

#[test]
fn wireframe_skips_vertices_behind_the_camera_when_unclipped() {
    let mesh = Mesh::new(vec![[v(-1., -1., -2.), v(0., 1., 3.), v(1., -1., 0.)]]);
    let mut frame = Frame::new(64, 64, CLEAR);
    let mut pipeline = Pipeline::new(PipelineConfig {
        culling: CullingMode::Disabled,
        clip_planes: ClipPlanes::None,
        wireframe: Some([255, 0, 0, 255]),
        ..Default::default()
    });
    let metrics = pipeline.render(&mesh, &mut context(90., 1.), &flat(1., 1., 1.), &mut frame);
    assert_eq!(metrics.triangles_emitted, 1);
}
