use std::path::Path;

use softraster::{
    buf::Frame, config::Scene, obj, pipeline::Pipeline, shaders::TexturedShader, texture::Checkerboard,
};

fn demo_scene() -> Scene {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenes/cube.toml");
    Scene::load_toml(path).unwrap()
}

#[test]
fn model_path_is_relative_to_scene() {
    let scene = demo_scene();
    assert!(scene.model.path.ends_with("scenes/cube.obj"));
    assert!(scene.model.path.is_file());
}

#[test]
fn demo_scene_renders() {
    let scene = demo_scene();
    let mesh = obj::load_obj(&scene.model.path).unwrap();
    assert_eq!(mesh.len(), 12);
    assert!(mesh.has_uvs());

    let mut ctx = scene.render_context();
    let mut pipeline = Pipeline::new(scene.pipeline_config());
    let r = &scene.rendering;
    let mut frame = Frame::new(r.width, r.height, r.clear_color);
    let shader = TexturedShader::new(Checkerboard::default());
    let metrics = pipeline.render(&mesh, &mut ctx, &shader, &mut frame);

    assert!(metrics.pixels_shaded > 1000);
    assert_eq!(metrics.clipped_away, 0);
    let img = frame.to_image();
    assert_eq!(img.dimensions(), (640, 480));
    // Corners stay clear.
    assert_eq!(img.get_pixel(0, 0).0, r.clear_color);
}

#[test]
fn missing_scene_reports_path() {
    let err = Scene::load_toml("does/not/exist.toml").unwrap_err();
    assert!(format!("{err:#}").contains("exist.toml"));
}
