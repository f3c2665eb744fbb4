use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use gift_pricer::presentation::views;
use gift_pricer::utils::logging;
use gift_pricer::{App, Config};

/// 礼物特效定价 AI
#[derive(Parser, Debug)]
#[command(name = "gift-pricer", version, about = "批量分析礼物特效文件并给出定价建议")]
struct Cli {
    /// 要分析的视频/图片文件
    files: Vec<PathBuf>,

    /// TOML 配置文件
    #[arg(short, long, env = "GIFT_PRICER_CONFIG")]
    config: Option<PathBuf>,

    /// 进入交互模式
    #[arg(short, long)]
    interactive: bool,

    /// 把结果导出为 JSON
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// 只打印定价标准
    #[arg(long)]
    pricing: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref())?;
    logging::init(config.verbose_logging);

    if cli.pricing {
        println!("{}", views::render_pricing_table());
        return Ok(());
    }

    // 初始化并运行应用
    let app = App::initialize(config).await?;
    app.add_files(&cli.files).await;

    if cli.interactive || cli.files.is_empty() {
        app.console().await?;
    } else {
        app.run_batch(cli.output.as_deref()).await?;
    }

    Ok(())
}
