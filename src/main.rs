use galaxy_generator::config::{AppConfig, ConfigSource};
use galaxy_generator::core::initialize_logging;
use galaxy_generator::galaxy::{GalaxyGenerator, ParameterStore};
use galaxy_generator::render::{FrameLoop, HeadlessBackend};
use std::time::Duration;

/// 无头运行的帧数
const HEADLESS_FRAMES: u64 = 120;

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (mut config, source) = AppConfig::load_or_default();
    config.apply_env_overrides();
    config.validate()?;

    initialize_logging(&config.logging);
    match &source {
        ConfigSource::File(path) => {
            tracing::info!(target: "config", "Loaded configuration from {}", path.display())
        }
        ConfigSource::Default => tracing::info!(target: "config", "Using default configuration"),
    }

    let mut generator = GalaxyGenerator::new(
        config.galaxy.clone(),
        config.generation.clone(),
        HeadlessBackend::new(),
    )?;
    let mut store = ParameterStore::new(config.galaxy.clone(), config.generation.max_particle_count)?;
    generator.subscribe(&mut store);

    // 命令行参数：key=value，例如 branchCount=5 insideColor=#ffffff
    for arg in std::env::args().skip(1) {
        let Some((key, value)) = arg.split_once('=') else {
            tracing::warn!(target: "config", "Ignoring argument `{}` (expected key=value)", arg);
            continue;
        };
        if let Err(e) = store.stage_str(key.trim(), value.trim()) {
            tracing::warn!(target: "config", "Ignoring `{}`: {}", arg, e);
        }
    }
    if let Some(commit) = store.commit() {
        tracing::info!(target: "galaxy", "Applying command line parameters (revision {})", commit.revision);
    }

    let mut frame_loop = FrameLoop::from_config(&config.viewport);
    frame_loop.run(&mut generator, Some(HEADLESS_FRAMES))?;
    if generator.is_background() {
        generator.wait_background(Duration::from_secs(30))?;
    }

    let stats = generator.stats();
    let backend = generator.backend().stats();
    tracing::info!(
        target: "galaxy",
        "Done: {} particles live, {} regenerations, {} rejected, last generation {:.2}ms",
        stats.live_particle_count,
        stats.regenerations,
        stats.rejected,
        stats.last_generation_time.as_secs_f64() * 1000.0
    );
    tracing::info!(
        target: "render",
        "Frames drawn: {}, uploads: {}, releases: {}, resident bytes: {}",
        backend.frames_drawn,
        backend.uploads,
        backend.releases,
        generator.backend().resident_bytes()
    );
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Galaxy generator failed: {}", e);
        std::process::exit(1);
    }
}
