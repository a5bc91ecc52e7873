//! 异步操作包装器 - 基础设施层
//!
//! 把任意一个远程调用包装成统一的可观察单元：`data` / `error` / `loading`，
//! 外加 `execute` 和 `reset` 两个触发器。
//!
//! ## 状态转换
//!
//! - `execute` 开始：`loading = true, error = None`，`data` 保持不变（刷新期间旧结果仍可见）
//! - 成功：`{data: Some(result), error: None, loading: false}`
//! - 失败：`{data: None, error: Some(err), loading: false}`
//! - `reset`：无条件回到初始状态
//!
//! ## 过期结果
//!
//! 每次 `execute` 领取一个递增的代号，`reset` 也会推进代号。
//! 调用完成时如果代号已经不是最新的，结果被直接丢弃，不会覆盖状态。
//! 底层请求不会被取消，只是它的结果不再生效。

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::debug;

use crate::error::OperationError;

/// 包装器当前状态
#[derive(Debug, Clone, PartialEq)]
pub struct OperationState<T> {
    pub data: Option<T>,
    pub error: Option<OperationError>,
    pub loading: bool,
}

impl<T> Default for OperationState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            loading: false,
        }
    }
}

/// 状态的标签视图，任一时刻只有一种成立
#[derive(Debug, PartialEq)]
pub enum OperationStatus<'a, T> {
    Idle,
    /// 进行中，`previous` 是上一次成功的结果（如果有）
    Loading { previous: Option<&'a T> },
    Success(&'a T),
    Failure(&'a OperationError),
}

impl<T> OperationState<T> {
    pub fn status(&self) -> OperationStatus<'_, T> {
        if self.loading {
            return OperationStatus::Loading {
                previous: self.data.as_ref(),
            };
        }
        match (&self.data, &self.error) {
            (_, Some(err)) => OperationStatus::Failure(err),
            (Some(data), None) => OperationStatus::Success(data),
            (None, None) => OperationStatus::Idle,
        }
    }
}

/// 异步操作包装器
///
/// 状态保存在 `watch` 通道里，界面层可以通过 [`AsyncOperation::subscribe`] 观察变化。
/// 代号只在通道的锁内修改，检查和写入对 `reset` 是原子的。
#[derive(Debug)]
pub struct AsyncOperation<T> {
    name: &'static str,
    state: watch::Sender<OperationState<T>>,
    generation: AtomicU64,
}

impl<T: Clone> AsyncOperation<T> {
    pub fn new(name: &'static str) -> Self {
        let (state, _) = watch::channel(OperationState::default());
        Self {
            name,
            state,
            generation: AtomicU64::new(0),
        }
    }

    /// 当前状态快照
    pub fn state(&self) -> OperationState<T> {
        self.state.borrow().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.state.borrow().data.clone()
    }

    pub fn error(&self) -> Option<OperationError> {
        self.state.borrow().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<OperationState<T>> {
        self.state.subscribe()
    }

    /// 执行一次包装的远程调用
    ///
    /// 返回本次调用被采纳的成功结果；失败或结果已过期时返回 `None`
    pub async fn execute<Fut>(&self, call: Fut) -> Option<T>
    where
        Fut: Future<Output = Result<T, OperationError>>,
    {
        let mut ticket = 0;
        self.state.send_modify(|state| {
            ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.loading = true;
            state.error = None;
        });

        let outcome = call.await;

        let mut accepted = None;
        let applied = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != ticket {
                return false;
            }
            *state = match &outcome {
                Ok(data) => {
                    accepted = Some(data.clone());
                    OperationState {
                        data: Some(data.clone()),
                        error: None,
                        loading: false,
                    }
                }
                Err(err) => OperationState {
                    data: None,
                    error: Some(err.clone()),
                    loading: false,
                },
            };
            true
        });

        if !applied {
            debug!("[{}] 丢弃过期结果 (代号 {})", self.name, ticket);
        }

        accepted
    }

    /// 回到初始状态，进行中的调用结果将被丢弃
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            self.generation.fetch_add(1, Ordering::SeqCst);
            *state = OperationState::default();
        });
    }
}
