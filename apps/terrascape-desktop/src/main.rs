use anyhow::{Context, Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use terrascape_camera::Camera;
use terrascape_common::{ConfigError, Rgb};
use terrascape_input::{InputState, Key, ModeChange};
use terrascape_render_wgpu::WgpuBackend;
use terrascape_scene::{FrameStats, Scene, SceneConfig, TerrainConfig};
use terrascape_terrain::Biome;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

#[derive(Parser)]
#[command(name = "terrascape-desktop", about = "Fly over procedural terrain")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration (YAML); built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Application state that outlives the GPU surface.
struct AppState {
    config: SceneConfig,
    camera: Camera,
    input: InputState,
    show_settings: bool,
    last_frame: Instant,
    fps: f32,
    stats: FrameStats,
    terrain_edit: TerrainConfig,
    pending_terrain: Option<TerrainConfig>,
}

impl AppState {
    fn new(config: SceneConfig) -> Result<Self> {
        config.validate().context("invalid scene configuration")?;
        let camera = config.camera.build()?;
        Ok(Self {
            terrain_edit: config.terrain.clone(),
            config,
            camera,
            input: InputState::new(),
            show_settings: true,
            last_frame: Instant::now(),
            fps: 0.0,
            stats: FrameStats::default(),
            pending_terrain: None,
        })
    }

    fn update(&mut self, dt: f32) {
        self.input.process_input(&mut self.camera, dt);
        if dt > 0.0 {
            self.fps = 0.9 * self.fps + 0.1 / dt;
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext, scene: &mut Scene) {
        if !self.show_settings {
            return;
        }

        egui::SidePanel::left("settings")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Terrascape");
                ui.separator();
                let pos = self.camera.position();
                ui.label(format!("Camera: ({:.2}, {:.2}, {:.2})", pos.x, pos.y, pos.z));
                ui.label(format!(
                    "Yaw {:.1}  Pitch {:.1}",
                    self.camera.yaw(),
                    self.camera.pitch()
                ));
                ui.label(format!("FPS: {:.0}", self.fps));
                ui.label(format!("Vertices: {}", self.stats.terrain_vertices));
                let histogram = scene.histogram();
                for biome in Biome::ALL {
                    ui.label(format!("{}: {}", biome.label(), histogram.get(biome)));
                }
                ui.separator();

                egui::CollapsingHeader::new("Noise")
                    .default_open(true)
                    .show(ui, |ui| self.noise_controls(ui, scene));
                egui::CollapsingHeader::new("Light")
                    .default_open(true)
                    .show(ui, |ui| light_controls(ui, scene));
                egui::CollapsingHeader::new("Water").show(ui, |ui| water_controls(ui, scene));
                egui::CollapsingHeader::new("Camera").show(ui, |ui| self.camera_controls(ui));
                egui::CollapsingHeader::new("Grid").show(ui, |ui| self.grid_controls(ui));

                ui.separator();
                if ui.button("Reset terrain and light").clicked() {
                    scene.reset_settings();
                    tracing::info!("scene settings reset");
                }

                ui.separator();
                ui.small("F: fly mode | Esc: release | WASD/Space/Shift: move | F1: panel");
            });
    }

    fn noise_controls(&mut self, ui: &mut egui::Ui, scene: &mut Scene) {
        let noise = *scene.noise();

        let mut seed = noise.seed();
        let seed_changed = ui
            .horizontal(|ui| {
                ui.label("Seed");
                ui.add(egui::DragValue::new(&mut seed))
            })
            .inner
            .changed();
        if seed_changed {
            scene.noise_mut().set_seed(seed);
        }

        if let Some(v) = drag(ui, "Amplitude", noise.amplitude(), 0.01, 0.01..=10.0) {
            report(scene.noise_mut().set_amplitude(v));
        }
        if let Some(v) = drag(ui, "Frequency", noise.frequency(), 0.01, 0.01..=10.0) {
            report(scene.noise_mut().set_frequency(v));
        }
        if let Some(v) = drag(ui, "Gain", noise.gain(), 0.01, 0.01..=2.0) {
            report(scene.noise_mut().set_gain(v));
        }
        if let Some(v) = drag(ui, "Lacunarity", noise.lacunarity(), 0.01, 0.01..=8.0) {
            report(scene.noise_mut().set_lacunarity(v));
        }
        if let Some(v) = drag(ui, "Fudge", noise.fudge(), 0.01, 0.0..=5.0) {
            report(scene.noise_mut().set_fudge(v));
        }
    }

    fn camera_controls(&mut self, ui: &mut egui::Ui) {
        if let Some(v) = drag(ui, "Speed", self.camera.speed(), 0.1, 0.1..=50.0) {
            report(self.camera.set_speed(v));
        }
        if let Some(v) = drag(ui, "Sensitivity", self.camera.sensitivity(), 0.005, 0.01..=1.0) {
            report(self.camera.set_sensitivity(v));
        }
        if ui.button("Reset camera").clicked() {
            self.camera.reset_settings();
        }
    }

    fn grid_controls(&mut self, ui: &mut egui::Ui) {
        let edit = &mut self.terrain_edit;
        ui.horizontal(|ui| {
            ui.add(
                egui::DragValue::new(&mut edit.width)
                    .prefix("W: ")
                    .speed(0.1)
                    .range(0.1..=200.0),
            );
            ui.add(
                egui::DragValue::new(&mut edit.height)
                    .prefix("H: ")
                    .speed(0.1)
                    .range(0.1..=200.0),
            );
        });
        ui.horizontal(|ui| {
            ui.label("Subdivisions");
            ui.add(egui::DragValue::new(&mut edit.subdivisions).range(1..=2048));
        });
        if ui.button("Rebuild terrain").clicked() {
            self.pending_terrain = Some(edit.clone());
        }
        if ui.button("Restore configured grid").clicked() {
            *edit = self.config.terrain.clone();
            self.pending_terrain = Some(edit.clone());
        }
    }
}

fn light_controls(ui: &mut egui::Ui, scene: &mut Scene) {
    let light = *scene.light();
    let mut pos = light.position().to_array();
    ui.horizontal(|ui| {
        ui.add(egui::DragValue::new(&mut pos[0]).prefix("X: ").speed(0.1));
        ui.add(egui::DragValue::new(&mut pos[1]).prefix("Y: ").speed(0.1));
        ui.add(egui::DragValue::new(&mut pos[2]).prefix("Z: ").speed(0.1));
    });
    if pos != light.position().to_array() {
        report(scene.light_mut().set_position(pos[0], pos[1], pos[2]));
    }

    let mut color = light.color().to_array();
    let changed = ui
        .horizontal(|ui| {
            ui.label("Colour");
            ui.color_edit_button_rgb(&mut color)
        })
        .inner
        .changed();
    if changed {
        report(scene.light_mut().set_color(color[0], color[1], color[2]));
    }
}

fn water_controls(ui: &mut egui::Ui, scene: &mut Scene) {
    let water = *scene.water();
    if let Some(v) = drag(ui, "Level", water.level(), 0.005, -1.0..=1.0) {
        report(scene.water_mut().set_level(v));
    }
    if let Some(v) = drag(ui, "Opacity", water.opacity(), 0.01, 0.0..=1.0) {
        report(scene.water_mut().set_opacity(v));
    }
    let mut color = water.color().to_array();
    let changed = ui
        .horizontal(|ui| {
            ui.label("Colour");
            ui.color_edit_button_rgb(&mut color)
        })
        .inner
        .changed();
    if changed {
        report(scene.water_mut().set_color(Rgb::new(color[0], color[1], color[2])));
    }
}

/// Labelled drag value; returns the new value when the user changed it.
fn drag(
    ui: &mut egui::Ui,
    label: &str,
    value: f32,
    speed: f64,
    range: RangeInclusive<f32>,
) -> Option<f32> {
    let mut v = value;
    let changed = ui
        .horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(&mut v).speed(speed).range(range))
        })
        .inner
        .changed();
    changed.then_some(v)
}

fn report(result: Result<(), ConfigError>) {
    if let Err(e) = result {
        tracing::warn!("rejected setting: {e}");
    }
}

fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::KeyW => Some(Key::KeyW),
        KeyCode::KeyA => Some(Key::KeyA),
        KeyCode::KeyS => Some(Key::KeyS),
        KeyCode::KeyD => Some(Key::KeyD),
        KeyCode::Space => Some(Key::Space),
        KeyCode::ShiftLeft => Some(Key::ShiftLeft),
        KeyCode::KeyF => Some(Key::KeyF),
        KeyCode::Escape => Some(Key::Escape),
        _ => None,
    }
}

/// Window, surface and everything drawn into it.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    backend: WgpuBackend,
    scene: Scene,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    pointer_locked: bool,
}

impl Gpu {
    fn new(
        event_loop: &ActiveEventLoop,
        egui_ctx: &EguiContext,
        state: &mut AppState,
    ) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Terrascape")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no suitable GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("terrascape_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        state.camera.set_aspect_ratio(config.width, config.height);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        let mut backend = WgpuBackend::new(device, queue, surface_format, config.width, config.height);
        let scene = Scene::new(&mut backend, &state.config).context("build scene")?;

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(backend.device(), surface_format, None, 1, false);

        Ok(Self {
            window,
            surface,
            config,
            backend,
            scene,
            egui_winit,
            egui_renderer,
            pointer_locked: false,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>, camera: &mut Camera) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(self.backend.device(), &self.config);
        self.backend.resize(self.config.width, self.config.height);
        camera.set_aspect_ratio(self.config.width, self.config.height);
    }

    fn apply_mode(&mut self, change: ModeChange) {
        match change {
            ModeChange::Entered => {
                self.pointer_locked = match self.window.set_cursor_grab(CursorGrabMode::Locked) {
                    Ok(()) => true,
                    Err(_) => {
                        if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::Confined) {
                            tracing::warn!("cursor grab failed: {e}");
                        }
                        false
                    }
                };
                self.window.set_cursor_visible(false);
            }
            ModeChange::Left => {
                if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
                    tracing::warn!("cursor release failed: {e}");
                }
                self.window.set_cursor_visible(true);
                self.pointer_locked = false;
            }
        }
        tracing::info!(?change, locked = self.pointer_locked, "fly mode");
    }
}

struct GpuApp {
    state: AppState,
    egui_ctx: EguiContext,
    gpu: Option<Gpu>,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            egui_ctx: EguiContext::default(),
            gpu: None,
        }
    }

    fn redraw(&mut self) -> Result<()> {
        let Some(gpu) = self.gpu.as_mut() else {
            return Ok(());
        };
        let state = &mut self.state;

        let now = Instant::now();
        let dt = (now - state.last_frame).as_secs_f32().min(0.1);
        state.last_frame = now;
        state.update(dt);

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(gpu.backend.device(), &gpu.config);
                return Ok(());
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return Ok(());
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.backend.set_target(view.clone());
        state.stats = gpu.scene.render(&mut gpu.backend, &state.camera)?;

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx, &mut gpu.scene);
        });

        if let Some(terrain) = state.pending_terrain.take() {
            if let Err(e) = gpu.scene.resize_terrain(
                &mut gpu.backend,
                terrain.width,
                terrain.height,
                terrain.subdivisions,
            ) {
                tracing::warn!("terrain rebuild rejected: {e}");
            }
        }

        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let device = gpu.backend.device();
        let queue = gpu.backend.queue();
        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        gpu.egui_renderer.update_buffers(
            device,
            queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
        Ok(())
    }

    fn key(&mut self, code: KeyCode, pressed: bool) {
        if code == KeyCode::F1 && pressed {
            self.state.show_settings = !self.state.show_settings;
            return;
        }
        let Some(key) = map_key(code) else {
            return;
        };
        if let Some(change) = self.state.input.key_event(key, pressed) {
            if let Some(gpu) = &mut self.gpu {
                gpu.apply_mode(change);
            }
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx, &mut self.state) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("startup failed: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let consumed = match self.gpu.as_mut() {
            Some(gpu) => gpu.egui_winit.on_window_event(&gpu.window, &event).consumed,
            None => return,
        };
        if consumed && !self.state.input.camera_mode() {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size, &mut self.state.camera);
                }
            }
            WindowEvent::Focused(false) if self.state.input.camera_mode() => {
                self.key(KeyCode::Escape, true);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.key(code, key_state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let locked = self.gpu.as_ref().is_some_and(|gpu| gpu.pointer_locked);
                if !locked {
                    self.state.input.pointer_moved(
                        &mut self.state.camera,
                        position.x as f32,
                        position.y as f32,
                    );
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    tracing::error!("frame failed: {e:#}");
                    event_loop.exit();
                }
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
        let Some(gpu) = &self.gpu else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta } = event {
            if gpu.pointer_locked {
                self.state
                    .input
                    .pointer_delta(&mut self.state.camera, delta.0 as f32, delta.1 as f32);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("terrascape-desktop starting");

    let config = match &cli.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };
    let state = AppState::new(config)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
