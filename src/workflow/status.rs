//! 条目状态机
//!
//! ```text
//! idle ──► analyzing ──► success
//!             ▲   │
//!             │   ▼
//!             └─ error
//! ```
//!
//! `success` 是终态，只能通过移除离开队列

use crate::models::{AnalysisResult, ItemState, ItemStatus};

/// 对单个条目的一次状态转换请求
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// 进入 analyzing（首次分析或重新分析失败项）
    StartAnalyzing,
    /// 分析成功，附带结果
    Succeed(AnalysisResult),
    /// 分析失败，附带展示给用户的错误信息
    Fail(String),
}

impl Transition {
    pub fn target(&self) -> ItemStatus {
        match self {
            Transition::StartAnalyzing => ItemStatus::Analyzing,
            Transition::Succeed(_) => ItemStatus::Success,
            Transition::Fail(_) => ItemStatus::Error,
        }
    }
}

/// 计算转换后的新状态；不允许的转换返回 `None`
///
/// 进入 analyzing 会清除旧的错误信息，进入 error 不保留任何结果
pub fn next_state(current: &ItemState, transition: Transition) -> Option<ItemState> {
    match (current.status(), transition) {
        (ItemStatus::Idle | ItemStatus::Error, Transition::StartAnalyzing) => {
            Some(ItemState::Analyzing)
        }
        (ItemStatus::Analyzing, Transition::Succeed(result)) => {
            Some(ItemState::Success(Box::new(result)))
        }
        (ItemStatus::Analyzing, Transition::Fail(message)) => Some(ItemState::Error(message)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> AnalysisResult {
        serde_json::from_str(
            r#"{"estimatedDuration":"3s","screenCoverage":"1/4","transitionCount":0,
                "suggestedPriceUsd":0.3,"suggestedDiamonds":3000,"reasoning":"小视频"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_happy_path() {
        let analyzing = next_state(&ItemState::Idle, Transition::StartAnalyzing).unwrap();
        assert_eq!(analyzing, ItemState::Analyzing);

        let done = next_state(&analyzing, Transition::Succeed(result())).unwrap();
        assert_eq!(done.status(), ItemStatus::Success);
        assert!(done.result().is_some());
        assert!(done.error_message().is_none());
    }

    #[test]
    fn test_error_can_be_retried_and_message_is_cleared() {
        let failed = next_state(&ItemState::Analyzing, Transition::Fail("分析失败".into())).unwrap();
        assert_eq!(failed.error_message(), Some("分析失败"));
        assert!(failed.result().is_none());

        let retry = next_state(&failed, Transition::StartAnalyzing).unwrap();
        assert_eq!(retry, ItemState::Analyzing);
        assert!(retry.error_message().is_none());
    }

    #[test]
    fn test_success_is_terminal() {
        let done = ItemState::Success(Box::new(result()));
        assert!(next_state(&done, Transition::StartAnalyzing).is_none());
        assert!(next_state(&done, Transition::Fail("x".into())).is_none());
    }

    #[test]
    fn test_idle_cannot_finish_without_analyzing() {
        assert!(next_state(&ItemState::Idle, Transition::Succeed(result())).is_none());
        assert!(next_state(&ItemState::Idle, Transition::Fail("x".into())).is_none());
        assert!(next_state(&ItemState::Analyzing, Transition::StartAnalyzing).is_none());
    }
}
