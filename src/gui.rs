use egui::Context;
use egui_wgpu::Renderer;
use egui_winit::State;
use flock_core::{ParameterSet, RunState, PARAM_RANGES};
use wgpu::{Device, TextureFormat};
use winit::{event::WindowEvent, window::Window};

pub struct UiState {
    pub fps: f32,
    pub frame_time: f32,
    pub boid_count: u32,
    pub params: ParameterSet,
    pub run_state: RunState,
}

impl UiState {
    pub fn new(boid_count: u32) -> Self {
        Self {
            fps: 0.0,
            frame_time: 0.0,
            boid_count,
            params: ParameterSet::default(),
            run_state: RunState::default(),
        }
    }
}

/// True while egui owns the pointer (hovering a window or dragging a widget)
fn pointer_captured(context: &Context) -> bool {
    context.wants_pointer_input() || context.is_pointer_over_area()
}

pub struct Gui {
    context: Context,
    state: State,
    renderer: Renderer,
}

impl Gui {
    pub fn new(device: &Device, output_color_format: TextureFormat, window: &Window) -> Self {
        let context = Context::default();
        let id = context.viewport_id();

        let state = State::new(
            context.clone(),
            id,
            window,
            Some(window.scale_factor() as f32),
            None,
            Some(device.limits().max_texture_dimension_2d as usize),
        );

        let renderer = Renderer::new(
            device,
            output_color_format,
            egui_wgpu::RendererOptions::default(),
        );

        Self {
            context,
            state,
            renderer,
        }
    }

    pub fn handle_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.state.on_window_event(window, event);
        response.consumed
    }

    pub fn wants_pointer(&self) -> bool {
        pointer_captured(&self.context)
    }

    pub fn render(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &Window,
        view: &wgpu::TextureView,
        ui_state: &mut UiState,
    ) {
        let raw_input = self.state.take_egui_input(window);

        let full_output = self.context.run(raw_input, |ctx| {
            Self::ui(ctx, ui_state);
        });

        self.state
            .handle_platform_output(window, full_output.platform_output);

        let clipped_primitives = self
            .context
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        let size = window.inner_size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.width, size.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.renderer.update_buffers(
            device,
            queue,
            encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Egui Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.renderer.render(
            &mut render_pass.forget_lifetime(),
            &clipped_primitives,
            &screen_descriptor,
        );

        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }

    fn ui(ctx: &Context, state: &mut UiState) {
        // Stats overlay (Top Left)
        egui::Area::new(egui::Id::new("stats_overlay"))
            .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
            .interactable(false)
            .show(ctx, |ui| {
                ui.label(format!("FPS: {:.0} ({:.2} ms)", state.fps, state.frame_time));
                ui.label(format!("Boids: {}", state.boid_count));
            });

        // Parameter panel (Top Right)
        egui::Window::new("Params")
            .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
            .resizable(false)
            .collapsible(true)
            .default_open(false)
            .show(ctx, |ui| {
                for range in &PARAM_RANGES {
                    if range.separated {
                        ui.separator();
                    }
                    ui.add(
                        egui::Slider::new(
                            state.params.field_mut(range.field),
                            range.min..=range.max,
                        )
                        .step_by(range.step as f64)
                        .text(range.label),
                    );
                }

                ui.separator();
                let mut running = state.run_state.is_stepping();
                if ui.checkbox(&mut running, "Run (Space)").changed() {
                    state.run_state = RunState::from_stepping(running);
                }
                if ui.button("Reset (R)").clicked() {
                    state.params.reset();
                }
            });
    }
}
