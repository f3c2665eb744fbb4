//! 定价审计提示词与输出结构
//!
//! 系统指令就是模型需要遵守的定价规则，原样发送

use serde_json::{json, Value};

/// 系统指令：定价逻辑表 + 转场的严格定义
pub const SYSTEM_PROMPT: &str = r#"
你是一位专业的虚拟礼物定价审计师。你的工作是分析视觉文件（视频、图片或动画录屏），并严格根据提供的“定价逻辑”确定其定价层级。请使用中文输出分析结果。

**定价逻辑表:**
1. 等级 1 (静态): 50-100 钻石。
2. 等级 2 (3秒, PNG 缩放): 1000+ 钻石 ($0.1)。
3. 等级 2 (3秒, 小型 SVGA): 2000+ 钻石 ($0.2)。
4. 等级 2 (3秒, 视频 1/4 屏): 3000+ 钻石 ($0.3)。
5. 等级 2 (4秒, 视频 2/4 屏, 无转场): 10,000+ 钻石 ($1)。
6. 等级 3 (5秒, 视频 3/4 屏, 1次转场): 20,000+ 钻石 ($2)。
7. 等级 4 (7秒, 视频 3/4 - 全屏, 1次转场): 30,000 钻石 ($3)。
8. 等级 4 (10秒, 全屏, 2次转场): 70,000+ 钻石 ($7)。
9. 等级 4 (12秒, 全屏, 3次转场): 130,000+ 钻石 ($13)。
10. 等级 5 (15秒, 全屏, 4次转场): 200,000+ 钻石 ($20)。(注意：如果少于4次转场，价格应降低)。
11. 等级 5 (18秒+, 全屏, 4+次转场): 700,000 钻石 ($70)。

**特殊规则:**
- 盲盒 小: 2000+, 大: 25000+。
- “屏占比”指的是特效的视觉权重。一个1920x1080的画布上只有一个小球跳动属于“小/1/4屏”，而不是“全屏”。
- **关于“转场”的严格定义 (非常重要)**: 
    - **转场 (Transition)** 仅指 **镜头硬切 (Camera Cut)** 或 **场景完全改变 (Scene Change)**。
    - **非转场**: 镜头推拉 (Zoom in/out)、镜头平移 (Pan)、人物动作改变、新特效出现/消失、光影变化、或者同一背景下的连续动画，统统 **严禁** 算作转场。
    - **判定标准**: 如果背景环境没有突变，且视角是连续的，无论特效多复杂，转场数均为 **0**。

**你的任务:**
分析输入的媒体文件。确定：
1. 时长 (秒)。
2. 屏占比 (视觉冲击力: 1/4, 2/4, 3/4, 或 全屏)。
3. 转场次数 (严格计数：仅计算画面切断/场景跳变的次数。连续长镜头记为 0)。
4. 视觉复杂度 (低/中/高)。

根据这些因素，从定价逻辑中找到最匹配的层级。如果介于两个层级之间，请说明理由并给出一个合理的中间价格。请确保所有输出字段（尤其是 reasoning）都使用中文。
"#;

/// 随媒体一起发送的任务提示
pub const TASK_PROMPT: &str = "请分析此礼物特效文件，并根据系统指令提供中文定价建议。";

/// 结构中的必填字段
pub const REQUIRED_FIELDS: [&str; 6] = [
    "estimatedDuration",
    "screenCoverage",
    "transitionCount",
    "suggestedPriceUsd",
    "suggestedDiamonds",
    "reasoning",
];

/// Gemini `responseSchema` 形式的输出结构
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "estimatedDuration": { "type": "STRING", "description": "预计时长 (例如 '4s', '12s')" },
            "screenCoverage": { "type": "STRING", "description": "1/4, 2/4, 3/4, 或 全屏" },
            "transitionCount": { "type": "INTEGER", "description": "视觉转场次数" },
            "visualComplexity": { "type": "STRING", "description": "低, 中, 或 高" },
            "suggestedLevel": { "type": "INTEGER", "description": "建议等级 (1-5)" },
            "suggestedPriceUsd": { "type": "NUMBER", "description": "建议美元价格" },
            "suggestedDiamonds": { "type": "INTEGER", "description": "建议钻石价格" },
            "reasoning": { "type": "STRING", "description": "基于规则的定价理由 (中文)" },
            "warnings": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "关于质量或缺失标准的警告 (中文)"
            }
        },
        "required": REQUIRED_FIELDS,
    })
}

/// 不支持结构化输出的接口：把输出结构写进提示词
pub fn task_prompt_with_schema() -> String {
    let schema = serde_json::to_string_pretty(&response_schema()).unwrap_or_default();
    format!(
        "{}\n\n只返回一个 JSON 对象，不要返回任何其他内容。JSON 必须符合以下结构：\n{}",
        TASK_PROMPT, schema
    )
}
