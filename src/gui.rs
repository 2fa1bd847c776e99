use egui::Context;
use egui_wgpu::Renderer;
use egui_winit::State;
use swarm_physics::{BoundaryMode, ForceConfig, RadiusMode};
use wgpu::{Device, TextureFormat};
use winit::{event::WindowEvent, window::Window};

pub struct UiState {
    pub fps: f32,
    pub frame_time: f32,
    pub particle_count: u32,
    pub grid_side: u32,
    pub frame: u64,
    pub force: ForceConfig,
    pub paused: bool,
    pub step_once: bool,
    pub reset_requested: bool,
}

impl UiState {
    pub fn new(force: ForceConfig) -> Self {
        Self {
            fps: 0.0,
            frame_time: 0.0,
            particle_count: 0,
            grid_side: 0,
            frame: 0,
            force,
            paused: false,
            step_once: false,
            reset_requested: false,
        }
    }

    /// Whether the simulation should advance this frame. Consumes a pending
    /// single-step request.
    pub fn should_step(&mut self) -> bool {
        !self.paused || std::mem::take(&mut self.step_once)
    }
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
            egui_wgpu::RendererOptions {
                msaa_samples: 1,
                depth_stencil_format: None,
                dithering: false,
                ..Default::default()
            },
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

        {
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

            let mut render_pass = render_pass.forget_lifetime();
            self.renderer
                .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }

    fn ui(ctx: &Context, state: &mut UiState) {
        // Diagnostics Panel (Top Left)
        egui::Window::new("Diagnostics")
            .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
            .resizable(false)
            .collapsible(true)
            .show(ctx, |ui| {
                ui.label(format!("FPS: {:.1}", state.fps));
                ui.label(format!("Frame Time: {:.2} ms", state.frame_time));
                ui.separator();
                ui.label(format!("Particles: {}", state.particle_count));
                ui.label(format!("Grid: {0}x{0}", state.grid_side));
                ui.label(format!("Step: {}", state.frame));
            });

        // Swarm Controls (Bottom Left)
        egui::Window::new("Swarm Controls")
            .anchor(egui::Align2::LEFT_BOTTOM, [10.0, -10.0])
            .resizable(false)
            .collapsible(true)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let label = if state.paused { "Resume" } else { "Pause" };
                    if ui.button(label).clicked() {
                        state.paused = !state.paused;
                    }
                    if ui
                        .add_enabled(state.paused, egui::Button::new("Step"))
                        .clicked()
                    {
                        state.step_once = true;
                    }
                    if ui.button("Reset").clicked() {
                        state.reset_requested = true;
                    }
                });

                ui.separator();
                ui.heading("Forces");
                ui.add(egui::Slider::new(&mut state.force.friction, 0.0..=1.0).text("Friction"));
                ui.add(
                    egui::Slider::new(&mut state.force.stiffness, 0.0..=200_000.0)
                        .text("Stiffness")
                        .logarithmic(true),
                );
                ui.add(
                    egui::Slider::new(&mut state.force.pointer_scale, 0.0..=0.1)
                        .text("Pointer Scale")
                        .logarithmic(true),
                );
                ui.add(
                    egui::Slider::new(&mut state.force.max_speed, 0.001..=0.2)
                        .text("Max Speed")
                        .logarithmic(true),
                );

                ui.separator();
                ui.heading("Boundary");
                ui.horizontal(|ui| {
                    ui.radio_value(&mut state.force.boundary, BoundaryMode::Reflect, "Reflect");
                    ui.radio_value(&mut state.force.boundary, BoundaryMode::Wrap, "Wrap");
                });

                ui.heading("Radius");
                ui.horizontal(|ui| {
                    ui.radio_value(&mut state.force.radius_mode, RadiusMode::Fixed, "Fixed");
                    ui.radio_value(
                        &mut state.force.radius_mode,
                        RadiusMode::PerParticle,
                        "Per Particle",
                    );
                });

                ui.separator();
                ui.label("Left drag: attract, right drag: repel");
                ui.label("Space: pause, N: step, R: reset, B: boundary");
            });
    }
}
