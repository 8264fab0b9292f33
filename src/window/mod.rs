use std::time::Instant;

use glam::vec2;
use orom_miniquad::*;
use tracing::{debug, error, info};

use crate::config::UniverseConfig;
use crate::error::Result;
use crate::input::Control;
use crate::rendering::compositor::Compositor;
use crate::universe::Universe;

/// The game side of the window: sets the scene up once and renders its
/// grids every frame.
pub trait UniverseHandler {
    fn window_title(&self) -> &str;
    /// Registers textures and behaviors. Runs before any GPU resource exists.
    fn init(&mut self, universe: &mut Universe) -> Result<()>;
    /// Called between `start_frame` and `post_frame`.
    fn scene(&mut self, universe: &mut Universe) -> Result<()>;
    fn on_control(&mut self, _universe: &mut Universe, _control: Control) {}
}

pub struct Stage<H: UniverseHandler> {
    universe: Universe,
    compositor: Compositor,
    handler: H,
    started: Instant,
}

impl<H: UniverseHandler> Stage<H> {
    pub fn new(ctx: &mut Context, mut handler: H, config: UniverseConfig) -> Result<Self> {
        let mut universe = Universe::new(config);
        handler.init(&mut universe)?;
        let compositor = Compositor::new(ctx, &mut universe)?;
        info!(
            textures = universe.atlas().len(),
            behaviors = universe.behaviors().len(),
            "stage ready"
        );
        Ok(Self {
            universe,
            compositor,
            handler,
            started: Instant::now(),
        })
    }

    fn frame(&mut self, ctx: &mut Context) -> Result<()> {
        let (width, height) = ctx.screen_size();
        let now = self.started.elapsed().as_secs_f64();
        self.universe.start_frame(now, (width as u32, height as u32))?;
        self.handler.scene(&mut self.universe)?;
        self.universe.post_frame()?;
        self.compositor.draw(ctx, &mut self.universe)
    }
}

impl<H: UniverseHandler> EventHandler for Stage<H> {
    fn update(&mut self, _ctx: &mut Context) {}

    fn draw(&mut self, ctx: &mut Context) {
        if let Err(e) = self.frame(ctx) {
            fatal(e);
        }
    }

    fn resize_event(&mut self, _ctx: &mut Context, width: f32, height: f32) {
        debug!(width, height, "window resized");
    }

    fn mouse_motion_event(&mut self, _ctx: &mut Context, x: f32, y: f32) {
        self.universe.input_mut().set_cursor(vec2(x, y));
    }

    fn mouse_wheel_event(&mut self, _ctx: &mut Context, _x: f32, y: f32) {
        self.universe.scroll_zoom(y.clamp(-1.0, 1.0));
    }

    fn mouse_button_down_event(&mut self, _ctx: &mut Context, button: MouseButton, x: f32, y: f32) {
        let input = self.universe.input_mut();
        input.set_cursor(vec2(x, y));
        input.mouse_down(button);
    }

    fn mouse_button_up_event(&mut self, _ctx: &mut Context, button: MouseButton, x: f32, y: f32) {
        let input = self.universe.input_mut();
        input.set_cursor(vec2(x, y));
        input.mouse_up(button);
    }

    fn key_down_event(&mut self, _ctx: &mut Context, keycode: KeyCode, _keymods: KeyMods, repeat: bool) {
        if let Some(control) = self.universe.input_mut().key_down(keycode) {
            if repeat {
                return;
            }
            if control == Control::ResetZoom {
                self.universe.reset_zoom();
            }
            self.handler.on_control(&mut self.universe, control);
        }
    }

    fn key_up_event(&mut self, _ctx: &mut Context, keycode: KeyCode, _keymods: KeyMods) {
        self.universe.input_mut().key_up(keycode);
    }
}

fn fatal(e: crate::HeliumError) -> ! {
    error!(error = %e, details = ?e, "unrecoverable error");
    std::process::exit(1)
}

pub fn start<H: 'static + UniverseHandler>(handler: H, config: UniverseConfig) {
    let conf = conf::Conf {
        window_title: handler.window_title().to_string(),
        window_width: 1280,
        window_height: 800,
        high_dpi: true,
        fullscreen: false,
        sample_count: 1,
        window_resizable: true,
    };

    orom_miniquad::start(conf, |mut ctx| match Stage::new(&mut ctx, handler, config) {
        Ok(stage) => UserData::owning(stage, ctx),
        Err(e) => fatal(e),
    });
}
