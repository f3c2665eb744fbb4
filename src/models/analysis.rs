use serde::{Deserialize, Serialize};

/// 模型返回的结构化分析结果
///
/// 视为完全可信的载荷，只要求 JSON 结构正确
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// 预计时长 (例如 "4s", "12s")
    pub estimated_duration: String,
    /// 屏占比: 1/4, 2/4, 3/4, 或 全屏
    pub screen_coverage: String,
    /// 转场次数（仅计算镜头硬切/场景跳变）
    pub transition_count: u32,
    /// 视觉复杂度: 低, 中, 或 高
    #[serde(default)]
    pub visual_complexity: String,
    /// 建议等级 (1-5)
    #[serde(default)]
    pub suggested_level: Option<u8>,
    pub suggested_price_usd: f64,
    pub suggested_diamonds: u64,
    /// 定价理由
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

impl AnalysisResult {
    /// 屏幕覆盖率（百分比），用于详情页的视觉权重条
    pub fn coverage_percent(&self) -> u8 {
        let coverage = self.screen_coverage.trim();
        if coverage == "全屏" || coverage.eq_ignore_ascii_case("full screen") {
            100
        } else if coverage.contains("3/4") {
            75
        } else if coverage.contains("2/4") {
            50
        } else {
            25
        }
    }

    pub fn warnings(&self) -> &[String] {
        self.warnings.as_deref().unwrap_or(&[])
    }
}
