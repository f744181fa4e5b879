use galaxy_generator::config::{AppConfig, GenerationConfig};
use galaxy_generator::galaxy::{
    generate_seeded, Color, GalaxyGenerator, GalaxyParameters, ParameterKey, ParameterStore,
    MAX_PARTICLE_COUNT,
};
use galaxy_generator::render::{FrameLoop, HeadlessBackend, PerspectiveCamera, Viewport};
use std::collections::HashMap;
use std::time::{Duration, Instant};

fn seeded(seed: u64) -> GenerationConfig {
    GenerationConfig {
        seed: Some(seed),
        ..GenerationConfig::default()
    }
}

#[test]
fn test_two_branch_scenario() -> anyhow::Result<()> {
    let params = GalaxyParameters {
        particle_count: 4,
        radius: 5.0,
        branch_count: 2,
        spin: 0.0,
        randomness: 0.0,
        ..GalaxyParameters::default()
    };
    let field = generate_seeded(&params, 11)?;

    assert_eq!(field.len(), 4);
    for (i, p) in field.positions().iter().enumerate() {
        assert!(p.y.abs() < 1e-6);
        if i % 2 == 0 {
            // 分支 0 在 +X 轴上
            assert!(p.z.abs() < 1e-5);
            assert!(p.x >= 0.0);
        } else {
            // 分支 1 在 -X 轴上
            assert!(p.z.abs() < 1e-4);
            assert!(p.x <= 0.0);
        }
        assert!(p.length() <= 5.0 + 1e-5);
    }
    Ok(())
}

#[test]
fn test_editing_session_replaces_field() -> anyhow::Result<()> {
    let mut generator =
        GalaxyGenerator::new(GalaxyParameters::default(), seeded(3), HeadlessBackend::new())?;
    let mut store = ParameterStore::new(GalaxyParameters::default(), MAX_PARTICLE_COUNT)?;
    generator.subscribe(&mut store);

    let mut frame_loop = FrameLoop::new(
        PerspectiveCamera::default(),
        Viewport::new(640, 480, 1.0),
        60,
    );
    let t0 = Instant::now();

    // 拖动滑块：多次提交，同一帧内只重新生成一次
    for count in [2000u32, 3000, 5000] {
        store.set(ParameterKey::ParticleCount, count.into())?;
    }
    frame_loop.tick(&mut generator, t0)?;
    assert_eq!(generator.live_field().map(|f| f.len()), Some(5000));
    assert_eq!(generator.stats().regenerations, 2);

    store.stage_str("insideColor", "#ffffff")?;
    store.stage_str("outsideColor", "#000000")?;
    store.commit();
    frame_loop.tick(&mut generator, t0 + Duration::from_millis(16))?;

    assert_eq!(generator.params().inside_color, Color::WHITE);
    assert_eq!(generator.backend().resident_buffers(), 1);
    assert_eq!(generator.backend().stats().releases, 2);
    assert_eq!(generator.backend().stats().last_draw_count, 5000);
    Ok(())
}

#[test]
fn test_rejected_commit_keeps_previous_field() -> anyhow::Result<()> {
    let config = GenerationConfig {
        max_particle_count: 10_000,
        ..seeded(4)
    };
    let mut generator =
        GalaxyGenerator::new(GalaxyParameters::default(), config, HeadlessBackend::new())?;
    // 存储的上限比生成器宽松，非法提交会到达生成器
    let mut store = ParameterStore::new(GalaxyParameters::default(), MAX_PARTICLE_COUNT)?;
    generator.subscribe(&mut store);
    let before = generator.live_field().cloned();

    store.set(ParameterKey::ParticleCount, 20_000u32.into())?;
    assert!(generator.process_commits().is_err());
    assert_eq!(generator.live_field().cloned(), before);
    assert_eq!(generator.stats().rejected, 1);
    Ok(())
}

#[test]
fn test_background_session() -> anyhow::Result<()> {
    let config = GenerationConfig {
        background: true,
        ..seeded(8)
    };
    let mut generator =
        GalaxyGenerator::new(GalaxyParameters::default(), config, HeadlessBackend::new())?;
    let mut store = ParameterStore::new(GalaxyParameters::default(), MAX_PARTICLE_COUNT)?;
    generator.subscribe(&mut store);

    store.set(ParameterKey::BranchCount, 7u32.into())?;
    assert!(generator.process_commits()?);
    assert!(generator.wait_background(Duration::from_secs(10))?);
    assert_eq!(generator.params().branch_count, 7);
    assert_eq!(generator.backend().resident_buffers(), 1);
    Ok(())
}

#[test]
fn test_config_drives_generator() -> anyhow::Result<()> {
    let toml = r##"
        [galaxy]
        particleCount = 250
        branchCount = 4
        insideColor = "#ff0000"

        [generation]
        seed = 99
    "##;
    let mut config = AppConfig::from_toml_str(toml)?;
    let env: HashMap<&str, &str> = [("GALAXY_SPIN", "-2")].into_iter().collect();
    config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));
    config.validate()?;

    let generator = GalaxyGenerator::new(
        config.galaxy.clone(),
        config.generation.clone(),
        HeadlessBackend::new(),
    )?;
    let field = generator.live_field().cloned();
    assert_eq!(field.as_ref().map(|f| f.len()), Some(250));
    assert_eq!(generator.params().spin, -2.0);

    // 相同种子得到相同结果
    let again = generate_seeded(&config.galaxy, 99)?;
    assert_eq!(field, Some(again));
    Ok(())
}

#[test]
fn test_resize_during_session() -> anyhow::Result<()> {
    let mut generator =
        GalaxyGenerator::new(GalaxyParameters::default(), seeded(6), HeadlessBackend::new())?;
    let mut frame_loop = FrameLoop::from_config(&AppConfig::default().viewport);
    let before = generator.live_field().cloned();

    assert!(frame_loop.resize(&mut generator, 1920, 1080, 3.0));
    frame_loop.tick(&mut generator, Instant::now())?;

    assert_eq!(generator.backend().surface_size(), (3840, 2160));
    assert_eq!(generator.live_field().cloned(), before);
    Ok(())
}
