//! 参数存储与提交通知
//!
//! 调试面板的每次编辑先暂存（立即校验），编辑结束时 `commit()` 生成一个带
//! 版本号的 `ParameterCommit`，广播给所有订阅者。订阅者通过无锁通道接收，
//! 可以只处理最新的一次提交。

use super::parameters::{GalaxyParameters, ParameterKey, ParameterValue};
use crate::core::error::GalaxyResult;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// 一次参数提交
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterCommit {
    /// 单调递增的版本号
    pub revision: u64,
    /// 提交时的参数快照
    pub params: GalaxyParameters,
}

/// 参数存储
pub struct ParameterStore {
    committed: GalaxyParameters,
    staged: GalaxyParameters,
    revision: u64,
    max_particle_count: u32,
    subscribers: Vec<Sender<ParameterCommit>>,
}

impl ParameterStore {
    /// 创建存储，初始参数必须合法
    pub fn new(params: GalaxyParameters, max_particle_count: u32) -> GalaxyResult<Self> {
        params.validate_with_limit(max_particle_count)?;
        Ok(Self {
            committed: params.clone(),
            staged: params,
            revision: 0,
            max_particle_count,
            subscribers: Vec::new(),
        })
    }

    /// 订阅提交
    pub fn subscribe(&mut self) -> Receiver<ParameterCommit> {
        let (sender, receiver) = unbounded();
        self.subscribers.push(sender);
        receiver
    }

    /// 暂存一次编辑
    ///
    /// 非法值直接拒绝，暂存区保持原样。
    pub fn stage(&mut self, key: ParameterKey, value: ParameterValue) -> GalaxyResult<()> {
        let mut candidate = self.staged.clone();
        candidate.set(key, value)?;
        candidate.validate_with_limit(self.max_particle_count)?;
        self.staged = candidate;
        Ok(())
    }

    /// 按文本键值暂存
    pub fn stage_str(&mut self, key: &str, raw: &str) -> GalaxyResult<()> {
        let key: ParameterKey = key.parse()?;
        let value = ParameterValue::parse_for(key, raw)?;
        self.stage(key, value)
    }

    /// 整体替换暂存参数
    pub fn stage_all(&mut self, params: GalaxyParameters) -> GalaxyResult<()> {
        params.validate_with_limit(self.max_particle_count)?;
        self.staged = params;
        Ok(())
    }

    /// 是否有未提交的修改
    pub fn has_pending(&self) -> bool {
        self.staged != self.committed
    }

    /// 丢弃未提交的修改
    pub fn discard(&mut self) {
        self.staged = self.committed.clone();
    }

    /// 提交暂存的修改并通知订阅者
    ///
    /// 没有修改时不产生提交，返回 `None`。已断开的订阅者会被移除。
    pub fn commit(&mut self) -> Option<ParameterCommit> {
        if !self.has_pending() {
            return None;
        }

        self.revision += 1;
        self.committed = self.staged.clone();
        let commit = ParameterCommit {
            revision: self.revision,
            params: self.committed.clone(),
        };

        self.subscribers
            .retain(|subscriber| subscriber.send(commit.clone()).is_ok());
        tracing::debug!(
            target: "galaxy",
            "Committed revision {} to {} subscriber(s)",
            commit.revision,
            self.subscribers.len()
        );
        Some(commit)
    }

    /// 暂存并立即提交（任何写入都触发重新生成）
    pub fn set(
        &mut self,
        key: ParameterKey,
        value: ParameterValue,
    ) -> GalaxyResult<Option<ParameterCommit>> {
        self.stage(key, value)?;
        Ok(self.commit())
    }

    pub fn committed(&self) -> &GalaxyParameters {
        &self.committed
    }

    pub fn staged(&self) -> &GalaxyParameters {
        &self.staged
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

/// 取出通道中最新的提交，丢弃更早的
pub fn latest_commit(receiver: &Receiver<ParameterCommit>) -> Option<ParameterCommit> {
    receiver
        .try_iter()
        .fold(None, |latest: Option<ParameterCommit>, commit| match latest {
            Some(prev) if prev.revision >= commit.revision => Some(prev),
            _ => Some(commit),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::parameters::MAX_PARTICLE_COUNT;

    fn store() -> ParameterStore {
        ParameterStore::new(GalaxyParameters::default(), MAX_PARTICLE_COUNT).unwrap()
    }

    #[test]
    fn test_commit_notifies_subscribers() {
        let mut store = store();
        let receiver = store.subscribe();

        store.stage(ParameterKey::Spin, (-1.0f32).into()).unwrap();
        assert!(store.has_pending());
        let commit = store.commit().unwrap();
        assert_eq!(commit.revision, 1);
        assert_eq!(commit.params.spin, -1.0);

        assert_eq!(receiver.try_recv().unwrap(), commit);
        assert!(!store.has_pending());
    }

    #[test]
    fn test_commit_without_changes() {
        let mut store = store();
        let receiver = store.subscribe();
        assert!(store.commit().is_none());
        assert!(receiver.try_recv().is_err());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_rejected_stage_keeps_state() {
        let mut store = store();
        let err = store.stage_str("branchCount", "0").unwrap_err();
        assert_eq!(err.field(), Some("branchCount"));
        assert!(!store.has_pending());
        assert!(store.stage_str("nebula", "1").is_err());
    }

    #[test]
    fn test_store_particle_limit() {
        let mut store = ParameterStore::new(GalaxyParameters::default(), 2000).unwrap();
        assert!(store.stage_str("particleCount", "2001").is_err());
        assert!(store.stage_str("particleCount", "2000").is_ok());
    }

    #[test]
    fn test_store_raised_particle_limit() {
        let mut store = ParameterStore::new(GalaxyParameters::default(), 2_000_000).unwrap();
        store.stage_str("particleCount", "1500000").unwrap();
        assert_eq!(store.commit().unwrap().params.particle_count, 1_500_000);
        assert!(store.stage_str("particleCount", "2000001").is_err());
    }

    #[test]
    fn test_discard() {
        let mut store = store();
        store.stage_str("radius", "9").unwrap();
        store.discard();
        assert!(!store.has_pending());
        assert_eq!(store.staged().radius, 5.0);
    }

    #[test]
    fn test_latest_commit_coalesces() {
        let mut store = store();
        let receiver = store.subscribe();
        for count in [100u32, 200, 300] {
            store
                .set(ParameterKey::ParticleCount, count.into())
                .unwrap();
        }
        let latest = latest_commit(&receiver).unwrap();
        assert_eq!(latest.revision, 3);
        assert_eq!(latest.params.particle_count, 300);
        assert!(latest_commit(&receiver).is_none());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut store = store();
        let receiver = store.subscribe();
        let _kept = store.subscribe();
        drop(receiver);
        store.stage_str("spin", "2").unwrap();
        store.commit();
        assert_eq!(store.subscriber_count(), 1);
    }
}
