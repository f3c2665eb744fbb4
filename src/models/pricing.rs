//! 定价参考表
//!
//! 静态数据，只读，程序运行期间不会被修改

use serde::Serialize;

/// 一行定价参考
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRule {
    /// 等级 (1-5)
    pub level: u8,
    /// 时长区间
    pub duration: &'static str,
    /// 规格描述
    pub specs: &'static str,
    /// 钻石价格
    pub price_diamonds: u64,
    /// 美元价格
    pub price_usd: f64,
    pub description: &'static str,
}

/// 定价表下方的提示
pub const PRICING_CAUTION: &str = "如果转场效果相对于时长不足，价格和等级都会相应降低。";

/// 定价参考表，从静态图片（最低）到 18 秒以上多转场全屏动画（最高）
pub static PRICING_RULES: [PricingRule; 11] = [
    PricingRule {
        level: 1,
        duration: "静态",
        specs: "静态图片",
        price_diamonds: 50,
        price_usd: 0.01,
        description: "用于分发，小批量。",
    },
    PricingRule {
        level: 2,
        duration: "3s",
        specs: "PNG 缩放/缩小特效",
        price_diamonds: 1000,
        price_usd: 0.1,
        description: "简单的缩放效果。",
    },
    PricingRule {
        level: 2,
        duration: "3s",
        specs: "小型 SVGA (非视频)",
        price_diamonds: 2000,
        price_usd: 0.2,
        description: "小面积矢量动画。",
    },
    PricingRule {
        level: 2,
        duration: "3s",
        specs: "视频 < 1/4 屏幕",
        price_diamonds: 3000,
        price_usd: 0.3,
        description: "小视频元素。",
    },
    PricingRule {
        level: 2,
        duration: "4s",
        specs: "视频 2/4 屏幕, 无转场",
        price_diamonds: 10000,
        price_usd: 1.0,
        description: "中等大小，连续镜头。",
    },
    PricingRule {
        level: 3,
        duration: "5s",
        specs: "视频 3/4 屏幕, 1次转场",
        price_diamonds: 20000,
        price_usd: 2.0,
        description: "大范围覆盖，简单剪辑。",
    },
    PricingRule {
        level: 4,
        duration: "7s",
        specs: "视频 3/4 到 全屏, 1次转场",
        price_diamonds: 30000,
        price_usd: 3.0,
        description: "沉浸式效果。",
    },
    PricingRule {
        level: 4,
        duration: "10s",
        specs: "全屏, 2次转场",
        price_diamonds: 70000,
        price_usd: 7.0,
        description: "全屏接管，多场景。",
    },
    PricingRule {
        level: 4,
        duration: "12s",
        specs: "全屏, 3次转场",
        price_diamonds: 130000,
        price_usd: 13.0,
        description: "扩展的全屏序列。",
    },
    PricingRule {
        level: 5,
        duration: "15s",
        specs: "全屏, 4次转场",
        price_diamonds: 200000,
        price_usd: 20.0,
        description: "高级复杂动画。若转场较少则缩短。",
    },
    PricingRule {
        level: 5,
        duration: "18s+",
        specs: "全屏, 4+次转场",
        price_diamonds: 700000,
        price_usd: 70.0,
        description: "超高级，长篇幅。",
    },
];

/// 某个等级下的所有参考行（保持表内顺序）
pub fn rules_for_level(level: u8) -> impl Iterator<Item = &'static PricingRule> {
    PRICING_RULES.iter().filter(move |rule| rule.level == level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_ordered_by_price() {
        assert_eq!(PRICING_RULES.len(), 11);
        assert!(PRICING_RULES
            .windows(2)
            .all(|w| w[0].price_diamonds < w[1].price_diamonds && w[0].level <= w[1].level));
        assert_eq!(PRICING_RULES[0].specs, "静态图片");
        assert_eq!(PRICING_RULES[10].duration, "18s+");
    }

    #[test]
    fn test_rules_for_level() {
        let level_four: Vec<_> = rules_for_level(4).map(|r| r.price_usd).collect();
        assert_eq!(level_four, vec![3.0, 7.0, 13.0]);
        assert_eq!(rules_for_level(9).count(), 0);
    }
}
