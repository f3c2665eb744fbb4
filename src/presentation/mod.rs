//! 展示层（Presentation Layer）
//!
//! - `views` - 纯函数渲染：队列、详情、报告、定价表
//! - `console` - 交互式命令行，订阅队列事件实时刷新

pub mod console;
pub mod views;

pub use console::{Command, Console, ItemRef};
