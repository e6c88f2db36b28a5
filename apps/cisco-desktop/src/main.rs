use anyhow::{Context, Result};
use cisco_common::{EngineConfig, ObjectConfig};
use cisco_input::{Action, InputState, KeyBindings};
use cisco_render::{Camera, Renderer};
use cisco_render_wgpu::{GpuMesh, WgpuBackend};
use cisco_scene::Scene;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

#[derive(Parser)]
#[command(name = "cisco-desktop", about = "First-person viewer for OBJ meshes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML engine config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// OBJ file to place in the scene; repeatable
    #[arg(short, long = "object", value_name = "PATH[@X,Y,Z]")]
    objects: Vec<ObjectConfig>,
}

fn default_bindings() -> KeyBindings<KeyCode> {
    KeyBindings::new()
        .bind(KeyCode::KeyW, Action::MoveForward)
        .bind(KeyCode::KeyS, Action::MoveBackward)
        .bind(KeyCode::KeyA, Action::StrafeLeft)
        .bind(KeyCode::KeyD, Action::StrafeRight)
        .bind(KeyCode::Space, Action::Ascend)
        .bind(KeyCode::ControlLeft, Action::Descend)
        .bind(KeyCode::ShiftLeft, Action::Sprint)
}

/// Window-independent application state.
struct AppState {
    config: EngineConfig,
    camera: Camera,
    renderer: Renderer,
    input: InputState,
    bindings: KeyBindings<KeyCode>,
    mouse_captured: bool,
    last_frame: Instant,
}

impl AppState {
    fn new(config: EngineConfig) -> Self {
        let mut input = InputState::new();
        let [x, y] = config.camera.initial_cursor;
        input.set_pointer(x, y);

        Self {
            camera: Camera::new(&config.camera),
            renderer: Renderer::new(&config),
            input,
            bindings: default_bindings(),
            mouse_captured: false,
            last_frame: Instant::now(),
            config,
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if let Some(action) = self.bindings.apply(&mut self.input, &key, pressed) {
            tracing::trace!(?action, pressed, "action");
        }
    }

    fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        if !self.mouse_captured {
            return;
        }
        let pointer = self.input.move_pointer(dx, dy);
        self.camera.on_pointer_move(pointer.x, pointer.y);
    }

    fn set_mouse_captured(&mut self, captured: bool) {
        self.mouse_captured = captured;
        if captured {
            // The first sample after capture re-seeds the camera.
            self.camera.reset_pointer();
        }
    }

    fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;
        self.camera.update(&self.input, dt);
        dt
    }
}

struct GpuApp {
    state: AppState,
    window: Option<Arc<Window>>,
    backend: Option<WgpuBackend>,
    scene: Option<Scene<GpuMesh>>,
    error: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(config: EngineConfig) -> Self {
        Self {
            state: AppState::new(config),
            window: None,
            backend: None,
            scene: None,
            error: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_config = &self.state.config.window;
        let attrs = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let size = window.inner_size();
        let mut backend = WgpuBackend::new(window.clone(), size.width, size.height)?;
        self.state.renderer.resize(size.width, size.height);

        let config = &self.state.config;
        let mut scene = Scene::init(&mut backend, config.grid)?
            .with_default_color(config.scene.default_color);
        for error in scene.add_objects(&mut backend, &config.scene.objects) {
            tracing::error!("{error}");
        }
        tracing::info!(objects = scene.len(), "scene ready");

        self.window = Some(window);
        self.backend = Some(backend);
        self.scene = Some(scene);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn capture_mouse(&mut self, captured: bool) {
        self.state.set_mouse_captured(captured);
        let Some(window) = &self.window else {
            return;
        };
        window.set_cursor_visible(!captured);
        let grab = if captured {
            window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(e) = grab {
            tracing::debug!("cursor grab unavailable: {e}");
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.state.tick();

        let (Some(backend), Some(scene)) = (&mut self.backend, &self.scene) else {
            return;
        };
        if let Err(e) = self
            .state
            .renderer
            .render(backend, scene, &self.state.camera, dt)
        {
            self.fail(event_loop, e.into());
            return;
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(backend) = &mut self.backend {
                    backend.resize(new_size.width, new_size.height);
                }
                self.state.renderer.resize(new_size.width, new_size.height);
            }
            WindowEvent::Focused(false) => {
                self.state.input.clear();
                self.capture_mouse(false);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                let pressed = key_state == ElementState::Pressed;
                if key == KeyCode::Escape && pressed {
                    event_loop.exit();
                    return;
                }
                self.state.handle_key(key, pressed);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Right,
                state: btn_state,
                ..
            } => {
                self.capture_mouse(btn_state == ElementState::Pressed);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.state.handle_mouse_motion(delta.0, delta.1);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(scene) = &mut self.scene {
            scene.cleanup();
        }
        tracing::info!("cisco-desktop shutting down");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    config.scene.objects.extend(cli.objects);

    tracing::info!("cisco-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_cover_every_action() {
        let bindings = default_bindings();
        for action in Action::ALL {
            let bound = [
                KeyCode::KeyW,
                KeyCode::KeyS,
                KeyCode::KeyA,
                KeyCode::KeyD,
                KeyCode::Space,
                KeyCode::ControlLeft,
                KeyCode::ShiftLeft,
            ]
            .iter()
            .any(|k| bindings.action_for(k) == Some(action));
            assert!(bound, "{action:?} has no key");
        }
    }

    #[test]
    fn mouse_look_only_while_captured() {
        let mut state = AppState::new(EngineConfig::default());
        state.handle_mouse_motion(50.0, 0.0);
        assert_eq!(state.camera.yaw(), -90.0);

        state.set_mouse_captured(true);
        state.handle_mouse_motion(50.0, 0.0);
        state.handle_mouse_motion(50.0, 0.0);
        assert!((state.camera.yaw() - -85.0).abs() < 1e-4);
    }

    #[test]
    fn cli_parses_objects() {
        let cli = Cli::try_parse_from(["cisco-desktop", "-o", "a.obj@1,2,3", "--object", "b.obj"])
            .unwrap();
        assert_eq!(cli.objects.len(), 2);
        assert_eq!(cli.objects[0].position.to_array(), [1.0, 2.0, 3.0]);
        assert_eq!(cli.objects[1].path, PathBuf::from("b.obj"));
    }
}
