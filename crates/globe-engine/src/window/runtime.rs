use anyhow::{Context, Result, anyhow};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::render::{RenderScheduler, Renderer, Schedule, SchedulerConfig, WgpuBackend};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "globe".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.commands.push(Command::SetTitle(title.into()));
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }
}

enum Command {
    SetTitle(String),
    Exit,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs the event loop until the window closes, the app exits, or the
    /// renderer fails. Fatal initialization and rendering errors are returned.
    pub fn run<A>(
        initial: RuntimeConfig,
        gpu_init: GpuInit,
        scheduler: SchedulerConfig,
        app: A,
    ) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(initial, gpu_init, scheduler, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    renderer: RenderScheduler<WgpuBackend<'this>>,
}

/// Creates the GPU backend for `window`, binds it and sizes it.
fn build_renderer<'w>(
    window: &'w Window,
    gpu_init: GpuInit,
    config: &SchedulerConfig,
) -> Result<RenderScheduler<WgpuBackend<'w>>> {
    let gpu = pollster::block_on(Gpu::new(window, gpu_init))?;
    let mut renderer = RenderScheduler::new(WgpuBackend::new(gpu), config);
    renderer.use_context()?;

    let size = window.inner_size();
    let surface = renderer
        .backend()
        .surface_info(size.width, size.height, window.scale_factor());
    if let Err(err) = renderer.resize(&surface) {
        // Minimized at startup; the first real resize fixes it.
        log::warn!("initial surface rejected: {err}");
    }

    Ok(renderer)
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    initial: RuntimeConfig,
    gpu_init: GpuInit,
    scheduler: SchedulerConfig,
    app: A,

    entry: Option<WindowEntry>,
    exit_requested: bool,
    fatal: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(initial: RuntimeConfig, gpu_init: GpuInit, scheduler: SchedulerConfig, app: A) -> Self {
        Self {
            initial,
            gpu_init,
            scheduler,
            app,
            entry: None,
            exit_requested: false,
            fatal: None,
        }
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    fn fail(&mut self, err: anyhow::Error) {
        log::error!("{err:#}");
        self.fatal.get_or_insert(err);
        self.request_exit();
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.initial.title.clone())
            .with_inner_size(self.initial.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let config = self.scheduler.clone();

        let entry = WindowEntryTryBuilder {
            window,
            renderer_builder: |w| build_renderer(w, gpu_init, &config),
        }
        .try_build()
        .context("failed to initialize renderer")?;

        self.entry = Some(entry);
        Ok(())
    }

    fn apply_commands(&mut self, mut ctx: RuntimeCtx) {
        for cmd in ctx.commands.drain(..) {
            match cmd {
                Command::SetTitle(title) => {
                    if let Some(entry) = &self.entry {
                        entry.with_window(|w| w.set_title(&title));
                    }
                }
                Command::Exit => self.request_exit(),
            }
        }
    }

    /// Runs an app callback with a fresh `FrameCtx`.
    fn with_app<F>(&mut self, f: F) -> AppControl
    where
        F: FnOnce(&mut A, &mut FrameCtx<'_, '_>) -> AppControl,
    {
        let mut runtime_ctx = RuntimeCtx::default();
        let mut control = AppControl::Continue;

        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let (app, entry) = (&mut self.app, &mut self.entry);
        if let Some(entry) = entry {
            entry.with_mut(|fields| {
                let now = fields.renderer.now();
                let mut ctx = FrameCtx {
                    window: WindowCtx {
                        window: fields.window,
                    },
                    renderer: fields.renderer,
                    now,
                    runtime: &mut runtime_ctx,
                };
                control = f(app, &mut ctx);
            });
        }

        if control == AppControl::Exit {
            runtime_ctx.exit();
        }
        self.apply_commands(runtime_ctx);
        control
    }

    fn resize_to_window(&mut self) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        entry.with_mut(|fields| {
            let size = fields.window.inner_size();
            let surface = fields.renderer.backend().surface_info(
                size.width,
                size.height,
                fields.window.scale_factor(),
            );
            // Rejections are logged by the scheduler; old targets stay valid.
            let _ = fields.renderer.resize(&surface);
        });
    }

    fn draw_frame(&mut self) {
        if self.with_app(|app, ctx| app.on_frame(ctx)) == AppControl::Exit {
            return;
        }

        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        let failed = entry.with_mut(|fields| {
            let budget = fields.renderer.frame_interval();
            fields.window.pre_present_notify();
            fields.renderer.render(budget);
            fields.renderer.has_failed()
        });

        if failed {
            self.fail(anyhow!("renderer stopped after a fatal frame error"));
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        match self.entry.as_mut() {
            None => {
                if let Err(e) = self.create_window_entry(event_loop) {
                    self.fail(e);
                    event_loop.exit();
                }
            }
            Some(entry) => {
                if let Err(e) = entry.with_renderer_mut(|r| r.use_context()) {
                    self.fail(e.context("failed to rebind context on resume"));
                    event_loop.exit();
                }
            }
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(entry) = self.entry.as_mut() {
            entry.with_renderer_mut(|r| r.context_lost());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(entry) = self.entry.as_ref() else {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        };

        match entry.with_renderer(|r| r.schedule()) {
            Schedule::RenderNow => {
                entry.with_window(|w| w.request_redraw());
                event_loop.set_control_flow(ControlFlow::Wait);
            }
            Schedule::WaitUntil(t) => event_loop.set_control_flow(ControlFlow::WaitUntil(t)),
            Schedule::Idle => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.with_app(|app, ctx| app.on_window_event(ctx, &event)) == AppControl::Exit {
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.entry = None;
                self.request_exit();
            }

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.resize_to_window();
            }

            // Also delivered by the platform (expose), not only on our request.
            WindowEvent::RedrawRequested => self.draw_frame(),

            _ => {}
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }
}
