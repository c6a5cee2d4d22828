mod audio;
mod cli;
mod renderer;
mod ui;
mod utils;

use audio::{decode_track, Player};
use clap::Parser;
use cli::Cli;
use nannou::prelude::*;
use renderer::{track_status, Resolution, SceneRenderer};
use std::path::{Path, PathBuf};
use tonescape_engine::{
    check_track_name, AnalysisTap, Engine, EngineError, TickHandle, TickOutcome, Transition,
    Viewport,
};
use ui::bindings::{parse_key, Action};
use ui::help_overlay::HelpOverlay;
use ui::mode_picker::{draw_mode_picker, ModePicker};
use utils::Config;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    if cli.audio_info {
        utils::log_audio_info();
        return;
    }

    nannou::app(model).update(update).run();
}

struct Model {
    engine: Engine,
    /// Handle of the generation this loop is ticking
    tick: Option<TickHandle>,
    player: Option<Player>,
    renderer: SceneRenderer,
    picker: ModePicker,
    help: HelpOverlay,
    config: Config,
}

fn model(app: &App) -> Model {
    let cli = Cli::parse();
    let config = Config::load();
    let mut resolution = Resolution::current(cli.windowed);
    if !resolution.fullscreen {
        (resolution.width, resolution.height) = config.window_size();
    }
    app.set_exit_on_escape(false);

    let mut win = app
        .new_window()
        .title("tonescape")
        .view(view)
        .key_pressed(key_pressed)
        .mouse_pressed(mouse_pressed)
        .resized(resized)
        .dropped_file(dropped_file)
        .size(resolution.width, resolution.height)
        .min_size(400, 300);

    if resolution.fullscreen {
        win = win.fullscreen();
    }

    if let Err(e) = win.build() {
        log::error!("Failed to open window: {:?}", e);
        std::process::exit(1);
    }

    let bounds = app.window_rect();
    log::info!(
        "Window size: {}x{} (requested: {}x{})",
        bounds.w(),
        bounds.h(),
        resolution.width,
        resolution.height
    );

    let settings = config.engine(cli.mode, cli.seed);
    let mut engine = Engine::new(settings, Viewport::new(bounds.w(), bounds.h()));
    let mut renderer = SceneRenderer::new();

    let tick = match engine.start() {
        Ok(handle) => Some(handle),
        Err(e) => {
            renderer.show_notification(e.to_string());
            None
        }
    };

    let mut model = Model {
        engine,
        tick,
        player: None,
        renderer,
        picker: ModePicker::new(),
        help: HelpOverlay::new(),
        config,
    };

    let startup_track = cli
        .track
        .or_else(|| model.config.last_track.clone().filter(|p| p.exists()));
    if let Some(path) = startup_track {
        load_track(&mut model, path);
    }

    model
}

fn update(app: &App, model: &mut Model, _update: Update) {
    model.renderer.update();

    let before = model.engine.selected();
    if let Some(result) = model.engine.apply_pending() {
        match follow_transition(&mut model.tick, result) {
            Ok(()) if model.engine.selected() != before => {
                let name = model.engine.selected().name();
                model.renderer.show_notification(name.to_string());
            }
            Ok(()) => {}
            Err(e) => model.renderer.show_notification(e.to_string()),
        }
    }

    let Some(handle) = model.tick else {
        return;
    };
    let tap = model.player.as_ref().map(|p| p as &dyn AnalysisTap);
    if model.engine.tick(handle, tap, app.time) == TickOutcome::Cancelled {
        log::warn!("tick handle is stale; stopping until the next transition");
        model.tick = None;
    }
}

/// Track the handle of the generation a transition produced
fn follow_transition(
    tick: &mut Option<TickHandle>,
    result: Result<TickHandle, EngineError>,
) -> Result<(), EngineError> {
    match result {
        Ok(handle) => {
            *tick = Some(handle);
            Ok(())
        }
        Err(e) => {
            *tick = None;
            Err(e)
        }
    }
}

fn view(app: &App, model: &Model, frame: Frame) {
    let draw = app.draw();
    let bounds = app.window_rect();

    model.renderer.draw_scene(&draw, bounds, model.engine.scene());

    let status = match &model.player {
        Some(player) => track_status(Some(player.name()), player.is_paused()),
        None => track_status(None, true),
    };
    model.renderer.draw_prompt(&draw, bounds, &status);

    model.renderer.draw_notification(&draw, bounds);

    if model.picker.active {
        draw_mode_picker(&draw, bounds, &model.picker);
    }
    model.help.draw(&draw);

    if let Err(e) = draw.to_frame(app, &frame) {
        log::warn!("Failed to render frame: {:?}", e);
    }
}

fn resized(_app: &App, model: &mut Model, size: Vec2) {
    model.engine.resize(size.x, size.y);
}

fn dropped_file(_app: &App, model: &mut Model, path: PathBuf) {
    load_track(model, path);
}

fn open_player(path: &Path) -> anyhow::Result<Player> {
    let track = decode_track(path)?;
    Player::new(track)
}

/// Replace the current track. Rejected names leave everything untouched.
fn load_track(model: &mut Model, path: PathBuf) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if let Err(e) = check_track_name(&name) {
        model.renderer.show_notification(e.to_string());
        return;
    }

    if let Some(old) = &model.player {
        old.pause();
    }

    match open_player(&path) {
        Ok(player) => {
            model.player = Some(player);
            model.engine.queue(Transition::AudioSourceChanged);
            model.config.set_last_track(path);
            model
                .renderer
                .show_notification(format!("Loaded {} (click to play)", name));
        }
        Err(e) => {
            log::warn!("Failed to load {}: {:#}", name, e);
            model
                .renderer
                .show_notification(format!("Failed to load {}", name));
        }
    }
}

fn toggle_playback(model: &mut Model) {
    match &model.player {
        Some(player) => {
            let playing = player.toggle();
            let state = if playing { "Playing" } else { "Paused" };
            model
                .renderer
                .show_notification(format!("{}: {}", state, player.name()));
        }
        None => model
            .renderer
            .show_notification("No track loaded".to_string()),
    }
}

fn select_from_picker(model: &mut Model) {
    if let Some(mode) = model.picker.selected_mode() {
        model.engine.queue(Transition::SelectMode(mode));
    }
    model.picker.hide();
}

fn key_pressed(app: &App, model: &mut Model, key: Key) {
    match parse_key(key, model.picker.active) {
        Some(Action::Quit) => app.quit(),
        Some(Action::ShowHelp) => {
            model.help.toggle();
            model.picker.hide();
        }

        Some(Action::PickerShow) => {
            model.help.hide();
            let live = model.engine.scene().map(|s| s.owner());
            model.picker.show(live);
        }
        Some(Action::PickerHide) => model.picker.hide(),
        Some(Action::PickerMoveUp) => model.picker.move_up(),
        Some(Action::PickerMoveDown) => model.picker.move_down(),
        Some(Action::PickerSelect) => select_from_picker(model),

        Some(Action::SelectMode(mode)) => model.engine.queue(Transition::SelectMode(mode)),
        Some(Action::CycleNext) => model.engine.queue(Transition::CycleNext),
        Some(Action::TogglePlayback) => toggle_playback(model),

        None => {}
    }
}

fn mouse_pressed(_app: &App, model: &mut Model, button: MouseButton) {
    if button != MouseButton::Left {
        return;
    }
    if model.picker.active {
        select_from_picker(model);
    } else {
        toggle_playback(model);
    }
}
