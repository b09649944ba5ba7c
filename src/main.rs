//! Retrohaunt headless runner
//!
//! Plays the shipped levels without a window. The player walks a scripted
//! square so probes, deaths and map travel all get exercised.
//!
//! Usage: `retrohaunt [settings.json] [frames]`

#[cfg(not(target_arch = "wasm32"))]
use std::process::ExitCode;

#[cfg(not(target_arch = "wasm32"))]
use retrohaunt::{
    Settings,
    audio::{AudioManager, LogBackend},
    game::{GeometryOracle, PlayerInput, Session},
    sim::{LevelError, LevelSet},
};

#[cfg(not(target_arch = "wasm32"))]
static LEVEL_DATA: &[u8] = include_bytes!("../assets/levels.bin");

#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_FRAMES: u32 = 600;

#[cfg(not(target_arch = "wasm32"))]
const FRAME_SECONDS: f32 = 1.0 / 60.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Retrohaunt (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = args.next().map(|path| Settings::load(path)).unwrap_or_default();
    let frames = match args.next().map(|s| s.parse::<u32>()) {
        None => DEFAULT_FRAMES,
        Some(Ok(n)) => n,
        Some(Err(e)) => {
            log::error!("Invalid frame count: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(settings, frames) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Level data error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page on the web
}

#[cfg(not(target_arch = "wasm32"))]
fn run(settings: Settings, frames: u32) -> Result<(), LevelError> {
    let levels = LevelSet::decode(LEVEL_DATA)?;
    log::info!("Loaded {} levels", levels.len());

    let mut audio = AudioManager::new(LogBackend::default());
    audio.set_master_volume(settings.master_volume);
    audio.set_sfx_volume(settings.sfx_volume);
    audio.set_muted(settings.muted);

    let mut session = Session::new(levels, settings)?;
    let oracle = GeometryOracle::default();

    let (mut ticks, mut deaths, mut travels) = (0, 0, 0);
    for frame in 0..frames {
        let report = session.frame(FRAME_SECONDS, scripted_input(frame), &oracle)?;
        ticks += report.ticks;
        deaths += report.restarted as u32;
        travels += report.traveled as u32;
        for cue in report.sounds {
            audio.play(cue);
        }
    }

    log::info!(
        "Ran {} frames ({} ticks): {} deaths, {} map changes, {} sounds, ended in level {}",
        frames,
        ticks,
        deaths,
        travels,
        audio.backend().effects_played,
        session.level_index()
    );
    Ok(())
}

/// Two seconds per side of a square walk
#[cfg(not(target_arch = "wasm32"))]
fn scripted_input(frame: u32) -> PlayerInput {
    match (frame / 120) % 4 {
        0 => PlayerInput::new(1.0, 0.0),
        1 => PlayerInput::new(0.0, 1.0),
        2 => PlayerInput::new(-1.0, 0.0),
        _ => PlayerInput::new(0.0, -1.0),
    }
}
