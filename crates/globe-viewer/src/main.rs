use std::time::Duration;

use anyhow::Result;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use globe_engine::core::{App, AppControl, FrameCtx};
use globe_engine::device::GpuInit;
use globe_engine::logging::{LoggingConfig, init_logging};
use globe_engine::paint::{Color, ColorFade};
use globe_engine::render::{Renderer, SchedulerConfig};
use globe_engine::time::FrameReport;
use globe_engine::window::{Runtime, RuntimeConfig};

const FADE_DURATION: Duration = Duration::from_millis(750);

/// Day/dusk/night backdrop cycle.
fn palette() -> [Color; 4] {
    [
        Color::from_srgb_u8(0x0b, 0x3d, 0x91, 0xff),
        Color::from_srgb_u8(0x7a, 0x3b, 0x69, 0xff),
        Color::from_srgb_u8(0x0a, 0x0f, 0x24, 0xff),
        Color::from_srgb_u8(0x1d, 0x6f, 0x5a, 0xff),
    ]
}

/// Cycles the backdrop through `palette()` with a fade on every click or space.
struct FadeViewer {
    palette: [Color; 4],
    current: usize,
    fade: Option<ColorFade>,
    shown_report: Option<FrameReport>,
}

impl FadeViewer {
    fn new() -> Self {
        Self {
            palette: palette(),
            current: 0,
            fade: None,
            shown_report: None,
        }
    }

    fn start_fade(&mut self, ctx: &mut FrameCtx<'_, '_>) {
        let from = ctx.renderer.clear_color();
        self.current = (self.current + 1) % self.palette.len();
        let fade = ColorFade::new(from, self.palette[self.current], ctx.now, FADE_DURATION);

        let deadline = fade.deadline(ctx.renderer.frame_interval());
        ctx.renderer.set_render_until(deadline);
        self.fade = Some(fade);
        log::info!("fading to palette entry {}", self.current);
    }
}

impl App for FadeViewer {
    fn on_window_event(&mut self, ctx: &mut FrameCtx<'_, '_>, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Escape) => return AppControl::Exit,
                    PhysicalKey::Code(KeyCode::Space) if !event.repeat => self.start_fade(ctx),
                    _ => {}
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => self.start_fade(ctx),
            _ => {}
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if let Some(fade) = self.fade {
            ctx.renderer.set_clear_color(fade.sample(ctx.now));
            if fade.is_finished(ctx.now) {
                self.fade = None;
            }
        }

        let report = ctx.renderer.stats().last_report();
        if report != self.shown_report {
            if let Some(r) = report {
                ctx.runtime.set_title(format!("globe viewer ({:.0} fps)", r.fps));
            }
            self.shown_report = report;
        }

        AppControl::Continue
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut scheduler = SchedulerConfig::from_env();
    scheduler.clear_color = palette()[0];
    if scheduler.perf_interval == 0 {
        scheduler.perf_interval = 120;
    }

    log::info!(
        "starting viewer: target_fps={} perf_interval={}",
        scheduler.target_fps,
        scheduler.perf_interval
    );

    Runtime::run(
        RuntimeConfig {
            title: "globe viewer".to_string(),
            ..Default::default()
        },
        GpuInit::default(),
        scheduler,
        FadeViewer::new(),
    )
}
