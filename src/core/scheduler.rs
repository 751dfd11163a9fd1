//! 帧调度状态机
//!
//! 特效实例的生命周期只有两个状态：运行中和已销毁（终态）。
//! 没有暂停/恢复 —— 只有 run-until-destroyed。
//!
//! 每个视觉帧恰好执行一次传播 + 交换，然后恰好一次合成。
//! 销毁是显式的状态转换，转换后不再提交任何 GPU 工作。

/// 特效状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectState {
    /// 运行中
    Running,
    /// 已销毁（终态）
    Destroyed,
}

/// 帧调度器
///
/// 由宿主的帧节奏机制（winit 重绘回调）驱动。调度器本身不持有
/// 任何 GPU 资源，只负责状态转换和帧计数。
#[derive(Debug)]
pub struct FrameScheduler {
    /// 当前状态
    state: EffectState,
    /// 已执行的帧数
    frames: u64,
}

impl FrameScheduler {
    /// 创建处于运行状态的调度器
    pub fn new() -> Self {
        Self {
            state: EffectState::Running,
            frames: 0,
        }
    }

    /// 当前状态
    pub fn state(&self) -> EffectState {
        self.state
    }

    /// 是否仍在运行
    pub fn is_running(&self) -> bool {
        self.state == EffectState::Running
    }

    /// 尝试开始一帧
    ///
    /// 运行中返回 `true` 并递增帧计数；已销毁返回 `false`，
    /// 调用方不得提交任何 GPU 工作。
    pub fn begin_frame(&mut self) -> bool {
        match self.state {
            EffectState::Running => {
                self.frames += 1;
                true
            }
            EffectState::Destroyed => false,
        }
    }

    /// 转换到终态
    ///
    /// 幂等：重复调用无副作用。
    pub fn destroy(&mut self) {
        if self.state == EffectState::Running {
            tracing::info!(target: "effect", frames = self.frames, "Effect destroyed");
        }
        self.state = EffectState::Destroyed;
    }

    /// 已执行的帧数
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_running() {
        let scheduler = FrameScheduler::new();
        assert_eq!(scheduler.state(), EffectState::Running);
        assert!(scheduler.is_running());
        assert_eq!(scheduler.frames(), 0);
    }

    #[test]
    fn test_begin_frame_counts() {
        let mut scheduler = FrameScheduler::new();
        assert!(scheduler.begin_frame());
        assert!(scheduler.begin_frame());
        assert_eq!(scheduler.frames(), 2);
    }

    #[test]
    fn test_destroy_is_terminal() {
        let mut scheduler = FrameScheduler::new();
        scheduler.begin_frame();
        scheduler.destroy();
        assert_eq!(scheduler.state(), EffectState::Destroyed);

        // 销毁后不再允许任何帧
        assert!(!scheduler.begin_frame());
        assert_eq!(scheduler.frames(), 1);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut scheduler = FrameScheduler::new();
        scheduler.destroy();
        scheduler.destroy();
        assert_eq!(scheduler.state(), EffectState::Destroyed);
        assert!(!scheduler.begin_frame());
    }
}
