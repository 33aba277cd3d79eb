use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use pixels::{Pixels, SurfaceTexture};
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent},
    event_loop::EventLoop,
    window::WindowBuilder,
};

use softraster::{
    buf::Frame,
    config::Scene,
    context::RenderContext,
    obj,
    pipeline::Pipeline,
    shaders::{FragmentShader, TexturedShader},
    texture::{Checkerboard, Texture},
    utils::{FrameClock, FrameStats},
    vec::Vec3,
    vertex::CullingMode,
    Mesh, Pixel,
};

const ROTATION_STEP: f32 = 0.1;
const DEFAULT_WIREFRAME: Pixel = [255, 0, 0, 255];

fn usage() -> ! {
    eprintln!("usage: softraster <scene.toml> [--headless <out.png>]");
    std::process::exit(2);
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some((scene_path, headless)) = parse_args(std::env::args().skip(1)) else {
        usage()
    };

    let app = App::load(&scene_path)?;
    match headless {
        Some(out) => app.render_to_file(&out),
        None => app.run(),
    }
}

/// `<scene.toml> [--headless <out.png>]`
fn parse_args(mut args: impl Iterator<Item = String>) -> Option<(PathBuf, Option<PathBuf>)> {
    let scene_path = PathBuf::from(args.next()?);
    let headless = match (args.next().as_deref(), args.next()) {
        (None, _) => None,
        (Some("--headless"), Some(out)) => Some(PathBuf::from(out)),
        _ => return None,
    };
    if args.next().is_some() {
        return None;
    }
    Some((scene_path, headless))
}

type DynShader = Box<dyn FragmentShader + Sync>;

struct App {
    scene: Scene,
    mesh: Mesh,
    shader: DynShader,
    ctx: RenderContext,
    pipeline: Pipeline,
    frame: Frame,
}

impl App {
    fn load(path: &Path) -> Result<Self> {
        let scene = Scene::load_toml(path)?;
        let mesh = obj::load_obj(&scene.model.path)?;

        let shader: DynShader = match (&scene.model.texture, mesh.has_uvs()) {
            (Some(texture_path), true) => {
                let mut texture = Texture::load(texture_path)?;
                texture.wrap = scene.model.texture_wrap;
                Box::new(TexturedShader::new(texture))
            }
            (Some(texture_path), false) => {
                log::warn!(
                    "ignoring texture {}: mesh has no texture coordinates",
                    texture_path.display()
                );
                Box::new(TexturedShader::new(Checkerboard::default()))
            }
            (None, _) => Box::new(TexturedShader::new(Checkerboard::default())),
        };

        let r = &scene.rendering;
        let frame = Frame::new(r.width, r.height, r.clear_color);
        Ok(App {
            ctx: scene.render_context(),
            pipeline: Pipeline::new(scene.pipeline_config()),
            frame,
            shader,
            mesh,
            scene,
        })
    }

    fn render(&mut self) -> softraster::pipeline::Metrics {
        self.pipeline
            .render(&self.mesh, &mut self.ctx, self.shader.as_ref(), &mut self.frame)
    }

    fn render_to_file(mut self, out: &Path) -> Result<()> {
        let metrics = self.render();
        log::info!("{metrics}");
        self.frame
            .to_image()
            .save(out)
            .with_context(|| format!("failed to write {}", out.display()))?;
        log::info!("wrote {}", out.display());
        Ok(())
    }

    fn handle_key(&mut self, key: VirtualKeyCode) {
        let speed = self.scene.camera.speed;
        let config = self.pipeline.config_mut();
        match key {
            VirtualKeyCode::Key1 => self.ctx.rotate(Vec3::from([ROTATION_STEP, 0., 0.])),
            VirtualKeyCode::Key2 => self.ctx.rotate(Vec3::from([0., ROTATION_STEP, 0.])),
            VirtualKeyCode::Key3 => self.ctx.rotate(Vec3::from([0., 0., ROTATION_STEP])),
            VirtualKeyCode::A => self.ctx.rotate(Vec3::from([0., ROTATION_STEP, 0.])),
            VirtualKeyCode::D => self.ctx.rotate(Vec3::from([0., -ROTATION_STEP, 0.])),
            VirtualKeyCode::W => self.ctx.camera.advance(speed),
            VirtualKeyCode::S => self.ctx.camera.advance(-speed),
            VirtualKeyCode::F => {
                config.wireframe = match config.wireframe {
                    Some(_) => None,
                    None => Some(self.scene.rendering.wireframe.unwrap_or(DEFAULT_WIREFRAME)),
                };
            }
            VirtualKeyCode::C => {
                config.culling = match config.culling {
                    CullingMode::Disabled => match self.scene.rendering.culling_mode {
                        CullingMode::Disabled => CullingMode::BackFace,
                        mode => mode,
                    },
                    _ => CullingMode::Disabled,
                };
                log::info!("culling: {:?}", config.culling);
            }
            VirtualKeyCode::P => {
                let parallel = !config.parallel;
                self.pipeline.with_parallel(parallel);
                log::info!("parallel: {parallel}");
            }
            _ => {}
        }
    }

    fn run(mut self) -> Result<()> {
        let (width, height) = (self.frame.width() as u32, self.frame.height() as u32);
        if width == 0 || height == 0 {
            bail!("cannot open an empty window");
        }

        let event_loop = EventLoop::new();
        let window = WindowBuilder::new()
            .with_title("softraster")
            .with_inner_size(LogicalSize::new(width, height))
            .with_resizable(false)
            .build(&event_loop)
            .context("failed to create window")?;

        let mut pixels = {
            let size = window.inner_size();
            let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
            Pixels::new(width, height, surface_texture).context("failed to create pixel surface")?
        };

        let now = Instant::now();
        let mut clock = FrameClock::new(self.scene.rendering.fps, now);
        let mut stats = FrameStats::new(Duration::from_secs(1), now);

        event_loop.run(move |event, _, control_flow| match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => control_flow.set_exit(),
            Event::WindowEvent {
                event:
                    WindowEvent::KeyboardInput {
                        input:
                            KeyboardInput {
                                state: ElementState::Pressed,
                                virtual_keycode: Some(key),
                                ..
                            },
                        is_synthetic: false,
                        ..
                    },
                ..
            } => {
                if key == VirtualKeyCode::Escape {
                    control_flow.set_exit();
                } else {
                    self.handle_key(key);
                }
            }
            Event::MainEventsCleared => {
                let now = Instant::now();
                if clock.is_due(now) {
                    clock.tick(now);
                    let metrics = self.render();
                    stats.record(&metrics, now);
                    stats.report(now);
                    window.request_redraw();
                }
                control_flow.set_wait_until(clock.deadline());
            }
            Event::RedrawRequested(_) => {
                self.frame.write_rgba(pixels.frame_mut());
                if let Err(err) = pixels.render() {
                    log::error!("failed to present frame: {err}");
                    control_flow.set_exit();
                }
            }
            _ => (),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Option<(PathBuf, Option<PathBuf>)> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn arguments() {
        assert_eq!(parse(&["a.toml"]), Some((PathBuf::from("a.toml"), None)));
        assert_eq!(
            parse(&["a.toml", "--headless", "out.png"]),
            Some((PathBuf::from("a.toml"), Some(PathBuf::from("out.png"))))
        );
        assert_eq!(parse(&[]), None);
        assert_eq!(parse(&["a.toml", "--headless"]), None);
        assert_eq!(parse(&["a.toml", "--window"]), None);
        assert_eq!(parse(&["a.toml", "--headless", "out.png", "extra"]), None);
    }
}
