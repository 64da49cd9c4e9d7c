//! GPGPU Flocking
//!
//! Boids simulated and drawn entirely on the GPU.

mod config;
mod gui;

use config::AppConfig;
use flock_core::{seed_particles, RunState, SPAWN_OFFSET};
use flock_renderer::{
    AxesRenderer, Camera, DepthTarget, RenderStage, RenderUniforms, POINTS_PROGRAM,
};
use flock_simulation::{
    GpuContext, IndexStream, ProgramSource, SetupError, SimulationBuffer, UpdateStage,
    UPDATE_PROGRAM,
};
use glam::Vec3;
use gui::{Gui, UiState};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Point the flock is recentred towards and the camera orbits
const REFERENCE_POINT: Vec3 = Vec3::ZERO;

const FPS_WINDOW: usize = 100;

/// Records logged by the debug dump key
const DUMP_COUNT: usize = 10;

struct GpuState {
    surface: wgpu::Surface<'static>,
    ctx: GpuContext,
    config: wgpu::SurfaceConfiguration,

    buffer: SimulationBuffer,
    index_stream: IndexStream,
    update: UpdateStage,
    render: RenderStage,
    points_bind_group: wgpu::BindGroup,
    axes: AxesRenderer,
    depth: DepthTarget,
    camera: Camera,

    gui: Gui,
    ui_state: UiState,
    step_requested: bool,

    frame_times: VecDeque<f32>,
    last_frame_time: Instant,
}

impl GpuState {
    async fn new(window: Arc<Window>, app_config: &AppConfig) -> Result<Self, SetupError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .map_err(flock_simulation::GpuError::from)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(flock_simulation::GpuError::from)?;

        let ctx = GpuContext::from_adapter(&adapter).await?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .unwrap_or(wgpu::TextureFormat::Bgra8UnormSrgb);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: app_config.present_mode(),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&ctx.device, &config);

        // Seed the flock
        let spawn_center = REFERENCE_POINT + Vec3::from_array(SPAWN_OFFSET);
        let buffer = SimulationBuffer::create_with(&ctx, app_config.particle_count, |count| {
            seed_particles(count, spawn_center, &mut rand::rng())
        })?;
        let index_stream = IndexStream::create(&ctx, buffer.count());
        log::info!("✓ Seeded {} boids around {}", buffer.count(), spawn_center);

        let update_source = ProgramSource::file_or(app_config.update_shader.clone(), UPDATE_PROGRAM);
        let mut update = UpdateStage::new(&ctx, &update_source, app_config.shader_policy)?;
        update.set_reference_point(REFERENCE_POINT);

        let render_source = ProgramSource::file_or(app_config.render_shader.clone(), POINTS_PROGRAM);
        let render = RenderStage::new(
            &ctx,
            &render_source,
            config.format,
            app_config.point_mode,
            app_config.shader_policy,
        )?;
        let points_bind_group = render.bind(&ctx, &buffer);

        let axes = AxesRenderer::new(&ctx, config.format, REFERENCE_POINT, app_config.shader_policy)?;
        let depth = DepthTarget::new(&ctx.device, config.width, config.height);
        let camera = Camera::new(config.width, config.height, REFERENCE_POINT);

        let gui = Gui::new(&ctx.device, config.format, &window);
        let ui_state = UiState::new(buffer.count());

        Ok(Self {
            surface,
            ctx,
            config,
            buffer,
            index_stream,
            update,
            render,
            points_bind_group,
            axes,
            depth,
            camera,
            gui,
            ui_state,
            step_requested: false,
            frame_times: VecDeque::with_capacity(FPS_WINDOW),
            last_frame_time: Instant::now(),
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.ctx.device, &self.config);
            self.depth = DepthTarget::new(&self.ctx.device, new_size.width, new_size.height);
            self.camera.resize(new_size.width, new_size.height);
        }
    }

    /// Log the first `count` records. Blocks on the GPU.
    fn dump_records(&self, count: usize) {
        match self.buffer.read_records(&self.ctx) {
            Ok(records) => {
                log::info!("First {} of {} boids:", count.min(records.len()), records.len());
                for (i, r) in records.iter().take(count).enumerate() {
                    log::info!(
                        "    [{}] pos={:?} vel={:?} damping={:.3} color={:?}",
                        i,
                        r.position,
                        r.velocity().to_array(),
                        r.damping,
                        r.color
                    );
                }
            }
            Err(e) => log::warn!("Debug dump failed: {}", e),
        }
    }

    fn render(&mut self, window: &Window) -> Result<(), wgpu::SurfaceError> {
        // Track frame time
        let now = Instant::now();
        let frame_time = (now - self.last_frame_time).as_secs_f32() * 1000.0;
        self.last_frame_time = now;

        if self.frame_times.len() == FPS_WINDOW {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(frame_time);
        let avg_frame_time = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        self.ui_state.frame_time = avg_frame_time;
        self.ui_state.fps = if avg_frame_time > 0.0 {
            1000.0 / avg_frame_time
        } else {
            0.0
        };

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        // Update before draw, in the same encoder
        let run_state = if std::mem::take(&mut self.step_requested) {
            RunState::Stepping
        } else {
            self.ui_state.run_state
        };
        self.update.step(
            &self.ctx,
            &mut encoder,
            &self.buffer,
            &self.ui_state.params,
            run_state,
        );

        let uniforms = RenderUniforms::new(
            &self.camera,
            &self.ui_state.params,
            self.config.width,
            self.config.height,
        );
        self.render.prepare(&self.ctx, &uniforms);
        self.axes
            .prepare(&self.ctx, self.camera.build_view_projection_matrix());

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(self.depth.attachment()),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.axes.draw(&mut render_pass);
            self.render
                .draw(&mut render_pass, &self.points_bind_group, &self.index_stream);
        }

        self.gui.render(
            &self.ctx.device,
            &self.ctx.queue,
            &mut encoder,
            window,
            &view,
            &mut self.ui_state,
        );

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

struct App {
    config: AppConfig,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    exit_code: i32,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            window: None,
            gpu_state: None,
            mouse_pressed: false,
            last_mouse_pos: None,
            exit_code: 0,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, message: &str) {
        log::error!("{}", message);
        self.exit_code = 1;
        event_loop.exit();
    }

    fn handle_key(&mut self, key_code: KeyCode) {
        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };

        match key_code {
            KeyCode::Space => {
                gpu_state.ui_state.run_state.toggle();
                log::info!("Simulation {:?}", gpu_state.ui_state.run_state);
            }
            KeyCode::KeyR => {
                gpu_state.ui_state.params.reset();
                log::info!("Parameters reset to defaults");
            }
            KeyCode::KeyN => {
                if !gpu_state.ui_state.run_state.is_stepping() {
                    gpu_state.step_requested = true;
                }
            }
            KeyCode::KeyD => gpu_state.dump_records(DUMP_COUNT),
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("GPGPU Flocking")
            .with_decorations(false)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.width,
                self.config.height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, &format!("Failed to create window: {}", e));
                return;
            }
        };

        match pollster::block_on(GpuState::new(window.clone(), &self.config)) {
            Ok(gpu_state) => {
                self.window = Some(window);
                self.gpu_state = Some(gpu_state);
            }
            Err(e) => self.fail(event_loop, &format!("Startup failed: {}", e)),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // Handle GUI events
        if let (Some(gpu_state), Some(window)) = (&mut self.gpu_state, &self.window) {
            if gpu_state.gui.handle_event(window, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),

            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(key_code),

            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    let over_gui = self
                        .gpu_state
                        .as_ref()
                        .is_some_and(|gpu_state| gpu_state.gui.wants_pointer());
                    self.mouse_pressed = state == ElementState::Pressed && !over_gui;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some(last_pos) = self.last_mouse_pos {
                        let delta_x = (position.x - last_pos.0) as f32;
                        let delta_y = (position.y - last_pos.1) as f32;

                        if let Some(gpu_state) = &mut self.gpu_state {
                            gpu_state.camera.rotate(-delta_x * 0.005, delta_y * 0.005);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_x, y) => y * 10.0,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };

                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state
                        .camera
                        .zoom(-scroll * gpu_state.camera.distance / 100.0);
                }
            }

            WindowEvent::RedrawRequested => {
                let out_of_memory = match (&self.window, &mut self.gpu_state) {
                    (Some(window), Some(gpu_state)) => match gpu_state.render(window) {
                        Ok(()) => false,
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            gpu_state.resize(window.inner_size());
                            false
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => true,
                        Err(e) => {
                            log::warn!("Render error: {:?}", e);
                            false
                        }
                    },
                    _ => false,
                };

                if out_of_memory {
                    self.fail(event_loop, "Surface out of memory");
                    return;
                }
            }

            _ => {}
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env();
    log::info!("Starting GPGPU flocking with {} boids...", config.particle_count);

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("Event loop error: {}", e);
        std::process::exit(1);
    }
    std::process::exit(app.exit_code);
}
