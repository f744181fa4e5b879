//! 星系生成控制器
//!
//! `GalaxyGenerator` 持有当前参数、场景（其中唯一的活动点云）和渲染后端。
//! 重新生成的顺序固定为：
//!
//! 1. 校验参数（失败则什么都不改）
//! 2. 生成新的粒子场
//! 3. 上传新缓冲区（失败则旧点云继续显示）
//! 4. 在场景中替换
//! 5. 释放旧缓冲区
//!
//! 任意时刻场景只引用一个点云，且从不引用已释放的缓冲区。
//!
//! 后台模式下只有最近一次排队的请求可以换入。同步写入（`regenerate`、
//! `set_parameter`）会作废尚未完成的后台请求。

use super::field::ParticleField;
use super::generator::generate_with_rng;
use super::parameters::{GalaxyParameters, ParameterKey, ParameterValue};
use super::store::{latest_commit, ParameterCommit, ParameterStore};
use super::worker::{GenerationResult, GenerationWorker};
use crate::config::GenerationConfig;
use crate::core::error::{GalaxyError, GalaxyResult};
use crate::render::backend::RenderBackend;
use crate::render::camera::PerspectiveCamera;
use crate::render::points::Points;
use crate::render::scene::Scene;
use crossbeam_channel::Receiver;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};

/// 生成统计
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct GenerationStats {
    /// 成功替换的次数（含首次生成）
    pub regenerations: u64,
    /// 被拒绝的请求数
    pub rejected: u64,
    /// 当前活动粒子数
    pub live_particle_count: usize,
    /// 最近一次生成耗时
    pub last_generation_time: Duration,
}

/// 星系生成控制器
pub struct GalaxyGenerator<B: RenderBackend> {
    params: GalaxyParameters,
    config: GenerationConfig,
    backend: B,
    scene: Scene,
    rng: StdRng,
    commits: Option<Receiver<ParameterCommit>>,
    last_commit_revision: u64,
    worker: Option<GenerationWorker>,
    /// 仍可换入的后台请求
    pending_request: Option<u64>,
    stats: GenerationStats,
}

impl<B: RenderBackend> GalaxyGenerator<B> {
    /// 创建控制器并生成第一个粒子场
    pub fn new(params: GalaxyParameters, config: GenerationConfig, backend: B) -> GalaxyResult<Self> {
        params.validate_with_limit(config.max_particle_count)?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let worker = config
            .background
            .then(|| GenerationWorker::new(config.seed.map(|s| s.wrapping_add(1))));

        let mut generator = Self {
            params: params.clone(),
            config,
            backend,
            scene: Scene::new(),
            rng,
            commits: None,
            last_commit_revision: 0,
            worker,
            pending_request: None,
            stats: GenerationStats::default(),
        };

        // 首个粒子场总是同步生成，保证第一帧就有内容
        generator.regenerate_inline(params)?;
        Ok(generator)
    }

    /// 用新参数重新生成并替换活动粒子场
    ///
    /// 同步执行。参数不合法或上传失败时返回错误，当前粒子场保持不变。
    pub fn regenerate(&mut self, params: GalaxyParameters) -> GalaxyResult<()> {
        self.regenerate_inline(params)
    }

    /// 写入单个参数并重新生成
    pub fn set_parameter(&mut self, key: ParameterKey, value: ParameterValue) -> GalaxyResult<()> {
        let mut params = self.params.clone();
        params.set(key, value).map_err(|e| self.reject(e))?;
        self.regenerate(params)
    }

    /// 订阅参数存储的提交
    pub fn subscribe(&mut self, store: &mut ParameterStore) {
        self.commits = Some(store.subscribe());
        self.last_commit_revision = store.revision();
    }

    /// 处理积压的参数提交
    ///
    /// 多个提交只处理最新的一个，每次调用最多触发一次重新生成。后台模式下
    /// 只提交请求，结果由 `poll_background` 换入。返回是否发起了重新生成。
    pub fn process_commits(&mut self) -> GalaxyResult<bool> {
        let Some(commit) = self.commits.as_ref().and_then(latest_commit) else {
            return Ok(false);
        };
        if commit.revision <= self.last_commit_revision {
            return Ok(false);
        }
        self.last_commit_revision = commit.revision;

        if let Err(e) = commit
            .params
            .validate_with_limit(self.config.max_particle_count)
        {
            return Err(self.reject(e));
        }

        match self.worker.as_mut() {
            Some(worker) => {
                let id = worker.request(commit.params)?;
                self.pending_request = Some(id);
                tracing::debug!(
                    target: "galaxy",
                    "Queued background generation {} for revision {}",
                    id,
                    commit.revision
                );
            }
            None => self.regenerate_inline(commit.params)?,
        }
        Ok(true)
    }

    /// 换入后台生成完成的最新结果
    ///
    /// 返回是否替换了活动粒子场。
    pub fn poll_background(&mut self) -> GalaxyResult<bool> {
        let result = self.worker.as_mut().and_then(GenerationWorker::try_latest);
        self.accept_background(result)
    }

    /// 阻塞等待后台最新结果并换入（测试、无头运行使用）
    pub fn wait_background(&mut self, timeout: Duration) -> GalaxyResult<bool> {
        let Some(result) = self
            .worker
            .as_mut()
            .and_then(|worker| worker.wait_latest(timeout))
        else {
            return Ok(false);
        };
        self.accept_background(Some(result))
    }

    /// 绘制一帧
    pub fn draw(&mut self, camera: &PerspectiveCamera) -> GalaxyResult<()> {
        self.backend.draw(&self.scene, camera)?;
        Ok(())
    }

    fn accept_background(&mut self, result: Option<GenerationResult>) -> GalaxyResult<bool> {
        let Some(result) = result else {
            return Ok(false);
        };
        if self.pending_request != Some(result.id) {
            tracing::debug!(
                target: "galaxy",
                "Dropping background generation {} (superseded)",
                result.id
            );
            return Ok(false);
        }
        self.pending_request = None;

        let field = result.outcome.map_err(|e| self.reject(e))?;
        self.install(result.params, field, result.elapsed)?;
        Ok(true)
    }

    fn regenerate_inline(&mut self, params: GalaxyParameters) -> GalaxyResult<()> {
        if let Err(e) = params.validate_with_limit(self.config.max_particle_count) {
            return Err(self.reject(e));
        }

        if let Some(id) = self.pending_request.take() {
            tracing::debug!(target: "galaxy", "Background generation {} superseded by direct write", id);
        }

        let start = Instant::now();
        let field = generate_with_rng(&params, &mut self.rng).map_err(|e| self.reject(e))?;
        self.install(params, field, start.elapsed())
    }

    fn install(
        &mut self,
        params: GalaxyParameters,
        field: ParticleField,
        elapsed: Duration,
    ) -> GalaxyResult<()> {
        let points = Points::galaxy(field, &params);
        let handle = self
            .backend
            .upload_points(&points)
            .map_err(|e| self.reject(e.into()))?;

        let count = points.len();
        if let Some(previous) = self.scene.replace_points(points, handle) {
            if let Err(e) = self.backend.release_points(previous.handle) {
                tracing::warn!(target: "galaxy", "Failed to release previous field: {}", e);
            }
        }

        self.params = params;
        self.stats.regenerations += 1;
        self.stats.live_particle_count = count;
        self.stats.last_generation_time = elapsed;
        tracing::info!(
            target: "galaxy",
            "Generated galaxy: {} particles, {} branches in {:.2}ms",
            count,
            self.params.branch_count,
            elapsed.as_secs_f64() * 1000.0
        );
        Ok(())
    }

    fn reject(&mut self, error: GalaxyError) -> GalaxyError {
        self.stats.rejected += 1;
        tracing::warn!(target: "galaxy", "Regeneration rejected: {}", error);
        error
    }

    /// 当前生效的参数
    pub fn params(&self) -> &GalaxyParameters {
        &self.params
    }

    /// 当前活动粒子场
    pub fn live_field(&self) -> Option<&ParticleField> {
        self.scene.points().map(Points::field)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn stats(&self) -> GenerationStats {
        self.stats
    }

    pub fn is_background(&self) -> bool {
        self.worker.is_some()
    }
}

impl<B: RenderBackend> Drop for GalaxyGenerator<B> {
    fn drop(&mut self) {
        if let Some(live) = self.scene.take_points() {
            let _ = self.backend.release_points(live.handle);
        }
    }
}
