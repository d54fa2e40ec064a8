//! Sandlot entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent, TouchEvent};

    use sandlot::audio::AudioManager;
    use sandlot::consts::*;
    use sandlot::hud::{FrameStats, HudModel};
    use sandlot::platform::{self, ListenerSet};
    use sandlot::renderer::{RenderState, compose_frame};
    use sandlot::sim::{FloorDemo, Level, PointerKind, TouchKind};
    use sandlot::{Result, SandlotError, Settings};

    const INIT_FAILED: &str = "Couldn't initialize the level. This is serious.";

    /// Game instance holding all state
    struct Game {
        level: Level,
        render_state: Option<RenderState>,
        audio: Option<AudioManager>,
        settings: Settings,
        stats: FrameStats,
        canvas: HtmlCanvasElement,
        /// Input listeners of the current level
        listeners: ListenerSet,
        last_time: f64,
        paused: bool,
        game_end_shown: bool,
    }

    impl Game {
        fn start_level(&mut self, seed: u64) -> Result<()> {
            let mut level = FloorDemo::level(seed)?;
            level.set_audio_enabled(self.audio.is_some());
            level.set_viewport(self.canvas.client_width() as f32, self.canvas.client_height() as f32);

            if let (Some(audio), Some(bgm)) = (self.audio.as_mut(), level.bgm()) {
                audio.start_music(bgm);
            }

            log::info!("Level '{}' started with seed: {}", level.name(), seed);
            self.level = level;
            self.last_time = 0.0;
            self.paused = false;
            self.game_end_shown = false;
            platform::set_visible("game-end", false);
            Ok(())
        }

        /// Destroy the level, drop its listeners and stop the music
        fn teardown(&mut self) {
            self.level.destroy();
            self.listeners.remove_all();
            if let Some(audio) = self.audio.as_mut() {
                audio.stop_music();
            }
        }

        /// Advance, play queued sounds, draw
        fn frame(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            self.last_time = time;
            self.stats.record(time);

            if !self.paused {
                self.level.step(dt);
            }

            let sounds = self.level.drain_sounds();
            if let Some(audio) = self.audio.as_mut() {
                audio.set_listener_position(self.level.listener_position());
                for request in &sounds {
                    audio.play_request(request);
                }
            }

            self.render();
            self.update_hud();
        }

        fn render(&mut self) {
            let Some(render_state) = self.render_state.as_mut() else {
                return;
            };
            let frame = compose_frame(&self.level, &self.settings, &self.stats);
            match render_state.render(&frame.to_clip_space()) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    render_state.resize(render_state.size.0, render_state.size.1);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&mut self) {
            let hud = HudModel::from_level(&self.level, &self.stats, &self.settings);

            platform::set_text("#hud-level .hud-value", &hud.level_name);
            platform::set_text("#hud-score .hud-value", &hud.score);
            platform::set_visible("hud-fps", hud.fps.is_some());
            if let Some(fps) = &hud.fps {
                platform::set_text("#hud-fps .hud-value", fps);
            }

            if let Some(message) = hud.game_end {
                if !self.game_end_shown {
                    platform::set_text("#game-end-message", &message);
                    platform::set_visible("game-end", true);
                    self.game_end_shown = true;
                }
            }
        }

        fn set_paused(&mut self, paused: bool) {
            if self.paused == paused {
                return;
            }
            self.paused = paused;
            // Keys released while unfocused never arrive
            self.level.input_mut().clear();
            if self.settings.mute_on_blur {
                if let Some(audio) = self.audio.as_mut() {
                    audio.set_muted(paused);
                }
            }
            log::info!("{}", if paused { "Auto-paused" } else { "Resumed" });
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Sandlot starting...");

        if let Err(e) = start().await {
            log::error!("Initialization failed: {}", e);
            platform::alert(INIT_FAILED);
        }
    }

    async fn start() -> Result<()> {
        let window = platform::window()?;
        let settings = Settings::load();

        platform::set_visible("loading", false);

        let canvas = platform::canvas("canvas")?;
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let seed = js_sys::Date::now() as u64;

        let audio = match AudioManager::new(seed) {
            Ok(mut audio) => {
                audio.apply_settings(&settings);
                Some(audio)
            }
            Err(e) => {
                log::error!("Audio unavailable, continuing without sound: {}", e);
                None
            }
        };

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| SandlotError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| SandlotError::Adapter(e.to_string()))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = RenderState::new(surface, &adapter, width, height).await?;

        let mut game = Game {
            level: Level::new(FloorDemo::config()),
            render_state: Some(render_state),
            audio,
            settings,
            stats: FrameStats::new(),
            canvas: canvas.clone(),
            listeners: ListenerSet::new(),
            last_time: 0.0,
            paused: false,
            game_end_shown: false,
        };
        game.start_level(seed)?;

        let game = Rc::new(RefCell::new(game));
        let listeners = setup_input_handlers(&canvas, game.clone())?;
        game.borrow_mut().listeners = listeners;
        setup_restart_button(game.clone());

        platform::set_visible("hud", true);

        request_animation_frame(game);

        log::info!("Sandlot running!");
        Ok(())
    }

    /// Keyboard, pointer, touch and focus listeners for the current level
    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) -> Result<ListenerSet> {
        let window = platform::window()?;
        let document = platform::document()?;
        let mut listeners = ListenerSet::new();

        // Keyboard
        for (event_name, down) in [("keydown", true), ("keyup", false)] {
            let game = game.clone();
            listeners.listen(&window, event_name, move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                let mut g = game.borrow_mut();
                if let Some(audio) = g.audio.as_ref() {
                    audio.resume();
                }
                let key = event.key();
                let handled = if down {
                    g.level.input_mut().key_down(&key)
                } else {
                    g.level.input_mut().key_up(&key)
                };
                if handled {
                    event.prevent_default();
                } else if down && key == "`" {
                    // Toggle the frame-time graph
                    g.settings.debug_graph = !g.settings.debug_graph;
                    g.settings.save();
                }
            })?;
        }

        // Mouse
        for (event_name, kind) in [
            ("click", PointerKind::Click),
            ("mousedown", PointerKind::Down),
            ("mouseup", PointerKind::Up),
            ("mousemove", PointerKind::Move),
        ] {
            let game = game.clone();
            let canvas = canvas.clone();
            listeners.listen(&document, event_name, move |event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                let point = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                let origin = platform::canvas_origin(&canvas);
                let inside = game.borrow_mut().level.handle_pointer_event(kind, point, origin);
                if inside {
                    event.prevent_default();
                }
            })?;
        }

        // Touch
        for (event_name, kind) in [
            ("touchstart", TouchKind::Start),
            ("touchmove", TouchKind::Move),
            ("touchend", TouchKind::End),
        ] {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            listeners.listen(canvas, event_name, move |event| {
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                event.prevent_default();
                let touch = event
                    .touches()
                    .get(0)
                    .map(|t| Vec2::new(t.client_x() as f32, t.client_y() as f32));
                let origin = platform::canvas_origin(&canvas_clone);
                game.borrow_mut().level.handle_touch_event(kind, touch, origin);
            })?;
        }

        // Auto-pause on tab switch or when the window loses focus
        {
            let game = game.clone();
            let doc = document.clone();
            listeners.listen(&document, "visibilitychange", move |_event| {
                let hidden = doc.visibility_state() == web_sys::VisibilityState::Hidden;
                game.borrow_mut().set_paused(hidden);
            })?;
        }
        {
            let game = game.clone();
            listeners.listen(&window, "blur", move |_event| {
                game.borrow_mut().set_paused(true);
            })?;
        }
        listeners.listen(&window, "focus", move |_event| {
            game.borrow_mut().set_paused(false);
        })?;

        Ok(listeners)
    }

    fn restart(game: &Rc<RefCell<Game>>) -> Result<()> {
        let seed = js_sys::Date::now() as u64;
        let canvas = {
            let mut g = game.borrow_mut();
            g.teardown();
            g.start_level(seed)?;
            g.canvas.clone()
        };
        let listeners = setup_input_handlers(&canvas, game.clone())?;
        game.borrow_mut().listeners = listeners;
        Ok(())
    }

    fn setup_restart_button(game: Rc<RefCell<Game>>) {
        let Ok(btn) = platform::element("restart-btn") else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            if let Err(e) = restart(&game) {
                log::error!("Restart failed: {}", e);
                platform::alert(INIT_FAILED);
            }
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Ok(window) = platform::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        game.borrow_mut().frame(time);
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Sandlot (native) starting...");
    log::info!("Native mode runs the floor demo headless - use `trunk serve` for the web version");

    if let Err(e) = headless::run(10.0) {
        log::error!("Couldn't initialize the level: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Simulate the floor demo without a window, walking the player toward the
/// ball for a while.
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use sandlot::Settings;
    use sandlot::consts::SIM_DT;
    use sandlot::hud::FrameStats;
    use sandlot::renderer::compose_frame;
    use sandlot::sim::FloorDemo;

    pub fn run(seconds: f32) -> sandlot::Result<()> {
        let mut level = FloorDemo::level(1)?;
        level.set_audio_enabled(false);
        level.input_mut().key_down("ArrowLeft");

        let frames = (seconds / SIM_DT) as u32;
        let mut stats = FrameStats::new();
        for i in 0..frames {
            stats.record(i as f64 * SIM_DT as f64 * 1000.0);
            level.step(SIM_DT);
            if level.outcome().is_some() {
                break;
            }
        }

        let frame = compose_frame(&level, &Settings::default(), &stats);
        log::info!(
            "After {} ticks: camera at {:?}, score {}, {} triangles",
            level.context().time_ticks,
            level.camera().center,
            level.score(),
            frame.world.triangle_count()
        );
        match level.outcome() {
            Some(outcome) => println!("{}", outcome.message()),
            None => println!("Still playing after {} seconds, score {}", seconds, level.score()),
        }

        level.destroy();
        Ok(())
    }
}
