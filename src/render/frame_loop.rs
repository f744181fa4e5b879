//! 帧循环
//!
//! 每一帧依次执行：更新计时器、处理参数提交、换入后台结果、逐帧更新场景、
//! 同步绘制，然后等待下一帧。循环可以通过 `CancelHandle` 从任意线程取消。

use super::backend::RenderBackend;
use super::camera::{PerspectiveCamera, Viewport};
use super::scene::Scene;
use crate::config::ViewportConfig;
use crate::core::error::GalaxyResult;
use crate::galaxy::controller::GalaxyGenerator;
use glam::Quat;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 单帧时间信息
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// 帧序号（从 0 开始）
    pub frame: u64,
    /// 自第一帧起经过的秒数
    pub elapsed: f32,
    /// 距上一帧的秒数
    pub delta: f32,
}

/// 计时器
#[derive(Debug, Default, Clone)]
pub struct Timer {
    start: Option<Instant>,
    previous: Option<Instant>,
    frame: u64,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 推进到 `now`，第一帧的 delta 为 0
    pub fn update(&mut self, now: Instant) -> FrameTime {
        let start = *self.start.get_or_insert(now);
        let previous = self.previous.replace(now).unwrap_or(now);

        let time = FrameTime {
            frame: self.frame,
            elapsed: now.saturating_duration_since(start).as_secs_f32(),
            delta: now.saturating_duration_since(previous).as_secs_f32(),
        };
        self.frame += 1;
        time
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 逐帧场景更新
pub trait FrameUpdater {
    fn update(&mut self, scene: &mut Scene, time: &FrameTime);
}

impl<F: FnMut(&mut Scene, &FrameTime)> FrameUpdater for F {
    fn update(&mut self, scene: &mut Scene, time: &FrameTime) {
        self(scene, time)
    }
}

/// 绕 Y 轴自转
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoRotate {
    pub radians_per_second: f32,
}

impl FrameUpdater for AutoRotate {
    fn update(&mut self, scene: &mut Scene, time: &FrameTime) {
        scene.transform.rot *= Quat::from_rotation_y(self.radians_per_second * time.delta);
    }
}

/// 取消句柄
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// 帧循环
pub struct FrameLoop {
    timer: Timer,
    camera: PerspectiveCamera,
    viewport: Viewport,
    updaters: Vec<Box<dyn FrameUpdater>>,
    cancel: CancelHandle,
    frame_interval: Duration,
    frames: u64,
}

impl FrameLoop {
    pub fn new(camera: PerspectiveCamera, viewport: Viewport, target_fps: u32) -> Self {
        Self {
            timer: Timer::new(),
            camera,
            viewport,
            updaters: Vec::new(),
            cancel: CancelHandle::default(),
            frame_interval: Duration::from_secs_f64(1.0 / target_fps.max(1) as f64),
            frames: 0,
        }
    }

    /// 按配置创建；`auto_rotate_speed` 非零时自动加入 `AutoRotate`
    pub fn from_config(config: &ViewportConfig) -> Self {
        let mut frame_loop = Self::new(
            PerspectiveCamera::from_config(config),
            Viewport::from_config(config),
            config.target_fps,
        );
        if config.auto_rotate_speed != 0.0 {
            frame_loop.add_updater(AutoRotate {
                radians_per_second: config.auto_rotate_speed,
            });
        }
        frame_loop
    }

    pub fn add_updater(&mut self, updater: impl FrameUpdater + 'static) {
        self.updaters.push(Box::new(updater));
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 执行一帧
    ///
    /// 被拒绝的参数提交只记录警告，不中断循环；绘制失败会返回错误。
    pub fn tick<B: RenderBackend>(
        &mut self,
        generator: &mut GalaxyGenerator<B>,
        now: Instant,
    ) -> GalaxyResult<FrameTime> {
        let time = self.timer.update(now);

        if let Err(e) = generator.process_commits() {
            tracing::warn!(target: "render", "Frame {}: commit ignored: {}", time.frame, e);
        }
        if let Err(e) = generator.poll_background() {
            tracing::warn!(target: "render", "Frame {}: background result dropped: {}", time.frame, e);
        }

        for updater in &mut self.updaters {
            updater.update(generator.scene_mut(), &time);
        }

        generator.draw(&self.camera)?;
        self.frames += 1;
        Ok(time)
    }

    /// 运行直到取消或达到 `max_frames`，返回本次运行的帧数
    pub fn run<B: RenderBackend>(
        &mut self,
        generator: &mut GalaxyGenerator<B>,
        max_frames: Option<u64>,
    ) -> GalaxyResult<u64> {
        let mut frames = 0;
        while !self.cancel.is_cancelled() && max_frames.map_or(true, |max| frames < max) {
            let frame_start = Instant::now();
            self.tick(generator, frame_start)?;
            frames += 1;

            let spent = frame_start.elapsed();
            if spent < self.frame_interval {
                std::thread::sleep(self.frame_interval - spent);
            }
        }
        tracing::info!(target: "render", "Frame loop stopped after {} frames", frames);
        Ok(frames)
    }

    /// 处理窗口尺寸变化
    ///
    /// 只更新相机、视口和后端输出尺寸，粒子场不受影响。
    pub fn resize<B: RenderBackend>(
        &mut self,
        generator: &mut GalaxyGenerator<B>,
        width: u32,
        height: u32,
        device_pixel_ratio: f32,
    ) -> bool {
        match self
            .viewport
            .resize(width, height, device_pixel_ratio, &mut self.camera)
        {
            Some((physical_width, physical_height)) => {
                generator
                    .backend_mut()
                    .resize(physical_width, physical_height);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::galaxy::parameters::GalaxyParameters;
    use crate::render::backend::HeadlessBackend;

    fn generator() -> GalaxyGenerator<HeadlessBackend> {
        let config = GenerationConfig {
            seed: Some(2),
            ..GenerationConfig::default()
        };
        GalaxyGenerator::new(GalaxyParameters::default(), config, HeadlessBackend::new()).unwrap()
    }

    #[test]
    fn test_timer_delta() {
        let mut timer = Timer::new();
        let t0 = Instant::now();
        let first = timer.update(t0);
        assert_eq!(first.frame, 0);
        assert_eq!(first.delta, 0.0);

        let second = timer.update(t0 + Duration::from_millis(500));
        assert_eq!(second.frame, 1);
        assert!((second.delta - 0.5).abs() < 1e-6);
        assert!((second.elapsed - 0.5).abs() < 1e-6);

        let third = timer.update(t0 + Duration::from_millis(750));
        assert!((third.delta - 0.25).abs() < 1e-6);
        assert!((third.elapsed - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_tick_draws_live_field() {
        let mut generator = generator();
        let mut frame_loop = FrameLoop::new(
            PerspectiveCamera::default(),
            Viewport::new(800, 600, 1.0),
            60,
        );
        frame_loop.tick(&mut generator, Instant::now()).unwrap();
        assert_eq!(generator.backend().stats().frames_drawn, 1);
        assert_eq!(generator.backend().stats().last_draw_count, 1000);
    }

    #[test]
    fn test_auto_rotate_and_closure_updaters() {
        let mut generator = generator();
        let mut frame_loop = FrameLoop::new(
            PerspectiveCamera::default(),
            Viewport::new(800, 600, 1.0),
            60,
        );
        frame_loop.add_updater(AutoRotate {
            radians_per_second: 1.0,
        });
        frame_loop.add_updater(|scene: &mut Scene, time: &FrameTime| {
            scene.transform.pos.y = time.elapsed;
        });

        let t0 = Instant::now();
        frame_loop.tick(&mut generator, t0).unwrap();
        frame_loop
            .tick(&mut generator, t0 + Duration::from_secs(1))
            .unwrap();

        let transform = generator.scene().transform;
        let expected = Quat::from_rotation_y(1.0);
        assert!(transform.rot.angle_between(expected) < 1e-4);
        assert!((transform.pos.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_run_stops_on_cancel() {
        let mut generator = generator();
        let mut frame_loop = FrameLoop::new(
            PerspectiveCamera::default(),
            Viewport::new(800, 600, 1.0),
            1000,
        );
        let handle = frame_loop.cancel_handle();
        frame_loop.add_updater(move |_: &mut Scene, time: &FrameTime| {
            if time.frame == 2 {
                handle.cancel();
            }
        });
        let frames = frame_loop.run(&mut generator, Some(100)).unwrap();
        assert_eq!(frames, 3);
    }

    #[test]
    fn test_run_respects_max_frames() {
        let mut generator = generator();
        let mut frame_loop = FrameLoop::new(
            PerspectiveCamera::default(),
            Viewport::new(800, 600, 1.0),
            1000,
        );
        assert_eq!(frame_loop.run(&mut generator, Some(4)).unwrap(), 4);
        assert_eq!(frame_loop.frames(), 4);
    }

    #[test]
    fn test_resize_leaves_field_untouched() {
        let mut generator = generator();
        let before = generator.live_field().unwrap().clone();
        let handle = generator.scene().live_handle();
        let mut frame_loop = FrameLoop::new(
            PerspectiveCamera::default(),
            Viewport::new(800, 600, 1.0),
            60,
        );

        assert!(frame_loop.resize(&mut generator, 1024, 512, 2.0));
        assert!((frame_loop.camera().aspect - 2.0).abs() < 1e-6);
        assert_eq!(generator.backend().surface_size(), (2048, 1024));
        assert_eq!(generator.live_field().unwrap(), &before);
        assert_eq!(generator.scene().live_handle(), handle);

        assert!(!frame_loop.resize(&mut generator, 0, 0, 1.0));
    }
}
