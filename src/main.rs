//! Color Swarm
//!
//! Thousands of colored particles pulling and pushing on each other, stepped
//! on the GPU every frame. Left mouse attracts, right mouse repels.

mod cli;
mod gui;

use clap::Parser;
use cli::Args;
use gui::{Gui, UiState};
use std::collections::VecDeque;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use swarm_physics::{Engagement, PointerAdapter, PointerEvent, PointerSender, SimulationConfig};
use swarm_renderer::SwarmRenderer;
use swarm_simulation::{GpuBackend, Simulation, SimulationError, request_device};
use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

const FRAME_TIME_WINDOW: usize = 60;

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    simulation: Simulation<GpuBackend>,
    renderer: SwarmRenderer,
    pointer: PointerAdapter,

    gui: Gui,
    ui_state: UiState,

    last_frame_time: Instant,
    frame_times: VecDeque<f32>,
}

impl GpuState {
    async fn new(
        window: Arc<Window>,
        simulation_config: SimulationConfig,
    ) -> Result<(Self, PointerSender), AppError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(SimulationError::from)?;

        log::info!("Using GPU: {}", adapter.get_info().name);

        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let simulation = Simulation::gpu(device.clone(), queue.clone(), simulation_config)?;
        log::info!("Simulation initialized");

        let renderer = SwarmRenderer::new(&device, &config);
        log::info!("Renderer initialized");

        let (pointer, sender) = PointerAdapter::new();

        let gui = Gui::new(&device, config.format, &window);
        let ui_state = UiState::new(simulation_config.force);

        let state = Self {
            surface,
            device,
            queue,
            config,
            simulation,
            renderer,
            pointer,
            gui,
            ui_state,
            last_frame_time: Instant::now(),
            frame_times: VecDeque::with_capacity(FRAME_TIME_WINDOW),
        };
        Ok((state, sender))
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.renderer.resize(&self.config);
        }
    }

    fn reset(&mut self) -> Result<(), SimulationError> {
        self.simulation.reset()
    }

    /// Steps (unless paused), draws and presents one frame
    fn render(&mut self, window: &Window) -> Result<(f32, f32), AppError> {
        let now = Instant::now();
        let frame_time = (now - self.last_frame_time).as_secs_f32() * 1000.0;
        self.last_frame_time = now;

        if self.frame_times.len() == FRAME_TIME_WINDOW {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(frame_time);
        let avg_frame_time = self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32;
        let fps = if avg_frame_time > 0.0 {
            1000.0 / avg_frame_time
        } else {
            0.0
        };

        if std::mem::take(&mut self.ui_state.reset_requested) {
            self.reset()?;
        }

        self.simulation.set_config(self.ui_state.force);
        let pointer = self.pointer.poll();
        if self.ui_state.should_step() {
            self.simulation.step(pointer)?;
        }

        let layout = self.simulation.layout();
        self.ui_state.fps = fps;
        self.ui_state.frame_time = avg_frame_time;
        self.ui_state.particle_count = layout.count();
        self.ui_state.grid_side = layout.side();
        self.ui_state.frame = self.simulation.frame();

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Same queue as the step, so the draw sees the finished tick
        self.renderer.render(
            &self.device,
            &self.queue,
            &view,
            self.simulation.backend().current(),
            &layout,
        );

        {
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("GUI Encoder"),
                });

            self.gui.render(
                &self.device,
                &self.queue,
                &mut encoder,
                window,
                &view,
                &mut self.ui_state,
            );

            self.queue.submit(std::iter::once(encoder.finish()));
        }

        output.present();
        Ok((fps, avg_frame_time))
    }
}

struct App {
    simulation_config: SimulationConfig,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    pointer_sender: Option<PointerSender>,
    failure: Option<AppError>,
}

impl App {
    fn new(simulation_config: SimulationConfig) -> Self {
        Self {
            simulation_config,
            window: None,
            gpu_state: None,
            pointer_sender: None,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        self.failure = Some(error);
        event_loop.exit();
    }

    fn send_pointer(&self, event: PointerEvent) {
        if let Some(sender) = &self.pointer_sender {
            if sender.send(event).is_err() {
                log::warn!("Pointer event dropped, simulation is gone");
            }
        }
    }

    fn create(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_attributes = Window::default_attributes()
            .with_title("Color Swarm")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 1280));

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let (gpu_state, sender) =
            pollster::block_on(GpuState::new(window.clone(), self.simulation_config))?;

        self.window = Some(window);
        self.gpu_state = Some(gpu_state);
        self.pointer_sender = Some(sender);
        Ok(())
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key_code: KeyCode) {
        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };

        match key_code {
            KeyCode::Space => {
                gpu_state.ui_state.paused = !gpu_state.ui_state.paused;
                log::info!(
                    "Simulation {}",
                    if gpu_state.ui_state.paused { "paused" } else { "resumed" }
                );
            }
            KeyCode::KeyN => gpu_state.ui_state.step_once = true,
            KeyCode::KeyR => {
                if let Err(error) = gpu_state.reset() {
                    self.fail(event_loop, error.into());
                }
            }
            KeyCode::KeyB => {
                let boundary = gpu_state.ui_state.force.boundary.toggled();
                gpu_state.ui_state.force.boundary = boundary;
                log::info!("Boundary mode: {}", boundary.label());
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(error) = self.create(event_loop) {
                self.fail(event_loop, error);
            }
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

            WindowEvent::CursorMoved { position, .. } => {
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    if let Some(event) =
                        PointerEvent::moved_from_pixels(position.x, position.y, size.width, size.height)
                    {
                        self.send_pointer(event);
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let engagement = match button {
                    MouseButton::Left => Engagement::Attract,
                    MouseButton::Right => Engagement::Repel,
                    _ => return,
                };
                let event = match state {
                    ElementState::Pressed => PointerEvent::Engaged(engagement),
                    ElementState::Released => PointerEvent::Released,
                };
                self.send_pointer(event);
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
            } => self.handle_key(event_loop, key_code),

            WindowEvent::RedrawRequested => {
                let (Some(window), Some(gpu_state)) = (&self.window, &mut self.gpu_state) else {
                    return;
                };
                match gpu_state.render(window) {
                    Ok((fps, frame_time)) => {
                        window.set_title(&format!(
                            "Color Swarm - {:.0} FPS ({:.2}ms) - {} particles",
                            fps,
                            frame_time,
                            gpu_state.simulation.layout().count()
                        ));
                    }
                    Err(AppError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                        gpu_state.resize(window.inner_size())
                    }
                    Err(AppError::Surface(wgpu::SurfaceError::Timeout)) => {
                        log::warn!("Surface timeout, skipping frame")
                    }
                    Err(error) => self.fail(event_loop, error),
                }
            }

            _ => {}
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let simulation_config = args.simulation_config();

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(simulation_config);
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn main() -> ExitCode {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting color swarm with {} particles...", args.particles);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("Fatal: {error}");
            ExitCode::FAILURE
        }
    }
}
