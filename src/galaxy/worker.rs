//! 后台生成
//!
//! 生成在工作线程上执行，渲染线程继续绘制旧的粒子场。请求带有递增的
//! 请求号：工作线程开始生成前先清空队列只保留最新请求，渲染线程收到结果时
//! 丢弃比最新请求更早的结果（最新请求优先）。
//!
//! 工作线程只产出 CPU 端的 `ParticleField`；上传和替换在渲染线程完成，
//! 所以旧缓冲区的释放总发生在渲染线程不再读取它之后。

use super::field::ParticleField;
use super::generator::generate_with_rng;
use super::parameters::GalaxyParameters;
use crate::core::error::{GalaxyError, GalaxyResult};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::thread;
use std::time::{Duration, Instant};

struct GenerationRequest {
    id: u64,
    params: GalaxyParameters,
}

/// 后台生成结果
#[derive(Debug)]
pub struct GenerationResult {
    /// 请求号
    pub id: u64,
    /// 生成所用参数
    pub params: GalaxyParameters,
    /// 生成结果
    pub outcome: GalaxyResult<ParticleField>,
    /// 生成耗时
    pub elapsed: Duration,
}

/// 后台生成工作线程
pub struct GenerationWorker {
    request_sender: Option<Sender<GenerationRequest>>,
    result_receiver: Receiver<GenerationResult>,
    worker_thread: Option<thread::JoinHandle<()>>,
    next_id: u64,
    latest_requested: u64,
    discarded: u64,
}

impl GenerationWorker {
    /// 启动工作线程
    ///
    /// `seed` 为 `Some` 时工作线程使用固定种子的随机源。
    pub fn new(seed: Option<u64>) -> Self {
        let (request_sender, request_receiver) = unbounded();
        let (result_sender, result_receiver) = unbounded();

        let worker_thread = thread::Builder::new()
            .name("galaxy-generation".to_string())
            .spawn(move || Self::worker_loop(request_receiver, result_sender, seed))
            .ok();

        if worker_thread.is_none() {
            tracing::warn!(target: "galaxy", "Failed to spawn generation worker");
        }

        Self {
            request_sender: Some(request_sender),
            result_receiver,
            worker_thread,
            next_id: 0,
            latest_requested: 0,
            discarded: 0,
        }
    }

    fn worker_loop(
        requests: Receiver<GenerationRequest>,
        results: Sender<GenerationResult>,
        seed: Option<u64>,
    ) {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        while let Ok(mut request) = requests.recv() {
            // 跳过排队中的旧请求
            for newer in requests.try_iter() {
                request = newer;
            }

            let start = Instant::now();
            let outcome = generate_with_rng(&request.params, &mut rng);
            let result = GenerationResult {
                id: request.id,
                params: request.params,
                outcome,
                elapsed: start.elapsed(),
            };
            if results.send(result).is_err() {
                break;
            }
        }
    }

    /// 提交生成请求，返回请求号
    pub fn request(&mut self, params: GalaxyParameters) -> GalaxyResult<u64> {
        let sender = self
            .request_sender
            .as_ref()
            .ok_or(GalaxyError::WorkerDisconnected)?;
        if self.worker_thread.is_none() {
            return Err(GalaxyError::WorkerDisconnected);
        }

        let id = self.next_id + 1;
        sender
            .send(GenerationRequest { id, params })
            .map_err(|_| GalaxyError::WorkerDisconnected)?;
        self.next_id = id;
        self.latest_requested = id;
        Ok(id)
    }

    /// 非阻塞地取出最新请求的结果
    ///
    /// 更早请求的结果被丢弃；最新请求尚未完成时返回 `None`。
    pub fn try_latest(&mut self) -> Option<GenerationResult> {
        let mut latest = None;
        while let Ok(result) = self.result_receiver.try_recv() {
            if let Some(kept) = self.accept(result) {
                latest = Some(kept);
            }
        }
        latest
    }

    /// 阻塞等待最新请求的结果，超时返回 `None`
    pub fn wait_latest(&mut self, timeout: Duration) -> Option<GenerationResult> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.result_receiver.recv_timeout(remaining) {
                Ok(result) => {
                    if let Some(kept) = self.accept(result) {
                        return Some(kept);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return None
                }
            }
        }
    }

    fn accept(&mut self, result: GenerationResult) -> Option<GenerationResult> {
        if result.id == self.latest_requested {
            Some(result)
        } else {
            self.discarded += 1;
            tracing::debug!(
                target: "galaxy",
                "Discarding stale generation {} (latest {})",
                result.id,
                self.latest_requested
            );
            None
        }
    }

    /// 最新请求号
    pub fn latest_requested(&self) -> u64 {
        self.latest_requested
    }

    /// 已丢弃的过期结果数
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

impl Drop for GenerationWorker {
    fn drop(&mut self) {
        // 关闭请求通道，工作线程随之退出
        self.request_sender.take();
        if let Some(handle) = self.worker_thread.take() {
            let _ = handle.join();
        }
    }
}
