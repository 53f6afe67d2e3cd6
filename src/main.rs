//! No End entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent};

    use no_end::audio::WebAudioSink;
    use no_end::consts::*;
    use no_end::persistence::{self, LocalStorage, MemoryStorage, Storage};
    use no_end::platform::chrome::DomChrome;
    use no_end::platform::{Control, InputSource, KeyboardState, now_ms};
    use no_end::renderer::CanvasRenderer;
    use no_end::{Game, Settings, Tuning};

    /// Everything the page callbacks share
    struct App {
        game: Game<WebAudioSink, DomChrome>,
        renderer: CanvasRenderer,
        storage: Box<dyn Storage>,
        keyboard: KeyboardState,
        last_time: f64,
        /// Audio can only start after the first user gesture
        audio_started: bool,
    }

    impl App {
        fn save(&mut self) {
            if let Err(e) = self.game.save(self.storage.as_mut(), now_ms()) {
                log::warn!("Session not saved: {e}");
            }
        }

        fn key_down(&mut self, key: &str) {
            if !self.audio_started {
                self.game.audio().sink().resume();
                self.game.start();
                self.audio_started = true;
            }
            if self.keyboard.key_down(key) == Some(Control::Debug) {
                self.game.toggle_debug();
            }
        }
    }

    fn open_storage() -> Box<dyn Storage> {
        match LocalStorage::open() {
            Ok(storage) => Box::new(storage),
            Err(e) => {
                log::warn!("{e}; progress will not be kept");
                Box::new(MemoryStorage::new())
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("No End starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("gameCanvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");
        canvas.set_width(ARENA_SIZE.x as u32);
        canvas.set_height(ARENA_SIZE.y as u32);
        let renderer = CanvasRenderer::new(canvas).expect("no 2D context");

        let mut storage = open_storage();
        let settings = Settings::load(storage.as_ref());
        let record = persistence::load_session(storage.as_mut()).unwrap_or_else(|e| {
            log::warn!("Ignoring saved session: {e}");
            None
        });
        let resume = persistence::plan_resume(record.as_ref(), now_ms(), &settings);

        let seed = js_sys::Date::now() as u64;
        let game = Game::new(
            seed,
            Tuning::default(),
            settings,
            WebAudioSink::new(),
            DomChrome::new(&document),
            resume,
        );

        let app = Rc::new(RefCell::new(App {
            game,
            renderer,
            storage,
            keyboard: KeyboardState::new(),
            last_time: 0.0,
            audio_started: false,
        }));

        setup_keyboard(app.clone());
        setup_focus(app.clone());
        setup_unload(app.clone());

        request_animation_frame(app);

        log::info!("No End running!");
    }

    fn setup_keyboard(app: Rc<RefCell<App>>) {
        let window = web_sys::window().expect("no window");

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                // Keep space and arrows from scrolling, F1 from opening help
                if Control::from_key(&key).is_some() {
                    event.prevent_default();
                }
                app.borrow_mut().key_down(&key);
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                app.borrow_mut().keyboard.key_up(&event.key());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_focus(app: Rc<RefCell<App>>) {
        let window = web_sys::window().expect("no window");

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut a = app.borrow_mut();
                a.keyboard.clear();
                a.game.focus_changed(false);
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                app.borrow_mut().game.focus_changed(true);
            });
            let _ =
                window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_unload(app: Rc<RefCell<App>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            app.borrow_mut().save();
        });
        let _ = window
            .add_event_listener_with_callback("beforeunload", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();
            let a = &mut *a;

            let dt = if a.last_time > 0.0 {
                ((time - a.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            a.last_time = time;

            let input = a.keyboard.tick_input();
            a.game.frame(dt, &input);
            a.game.render(&mut a.renderer);
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("No End (native) starting...");

    let mut args = std::env::args().skip(1);
    let seconds: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(60.0);
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| no_end::Tuning::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(tuning) => tuning,
            Err(e) => {
                log::error!("Could not load tuning from {path}: {e}");
                std::process::exit(1);
            }
        },
        None => no_end::Tuning::default(),
    };

    headless::run(seconds, tuning);
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use no_end::audio::LogSink;
    use no_end::consts::SIM_DT;
    use no_end::persistence::{self, MemoryStorage};
    use no_end::platform::{InputSource, LogChrome, ScriptedInput, now_ms};
    use no_end::{Game, Settings, Tuning};

    /// Play `seconds` of scripted input without a display
    pub fn run(seconds: f32, tuning: Tuning) {
        let seed = now_ms() as u64;
        let settings = Settings::default();
        let resume = persistence::plan_resume(None, now_ms(), &settings);
        let mut game = Game::new(seed, tuning, settings, LogSink::default(), LogChrome::new(), resume);
        game.start();

        let mut input = ScriptedInput::default();
        let mut elapsed = 0.0;
        let mut next_report = 10.0;
        while elapsed < seconds {
            game.frame(SIM_DT, &input.tick_input());
            input.advance(SIM_DT);
            elapsed += SIM_DT;

            if elapsed >= next_report {
                report(&game);
                next_report += 10.0;
            }
        }

        report(&game);
        let mut storage = MemoryStorage::new();
        match game.save(&mut storage, now_ms()) {
            Ok(()) => log::info!("Session record: {:?}", game.record(now_ms())),
            Err(e) => log::warn!("Session not saved: {e}"),
        }
    }

    fn report(game: &Game<LogSink, LogChrome>) {
        let c = game.state().counters();
        log::info!(
            "t={:.1}s deaths={} exits={} restarts={} intensity={:.2}",
            c.playtime_secs,
            c.deaths,
            c.exits_reached,
            c.restarts,
            game.state().intensity()
        );
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
