//! 核心模块
//!
//! 包含特效实例、帧调度状态机、错误类型和窗口化运行器。

pub mod effect;
pub mod error;
pub mod runner;
pub mod scheduler;

pub use effect::RippleEffect;
pub use error::{EffectError, EffectResult, RenderError, RenderResult};
pub use runner::Runner;
pub use scheduler::{EffectState, FrameScheduler};
