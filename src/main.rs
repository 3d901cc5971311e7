//! Markflow 命令行入口
//!
//! 读取一个Markdown文件，整趟翻译后输出到标准输出或指定文件；
//! 进度与日志走标准错误，不污染译文输出。

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use markflow::config::TranslatorConfig;
use markflow::core::TranslationSession;
use markflow::provider::DeepLxTransformer;

#[derive(Parser, Debug)]
#[command(name = "markflow", version, about = "增量式Markdown翻译引擎")]
struct Cli {
    /// 待翻译的Markdown文件
    input: PathBuf,

    /// 目标语言代码
    #[arg(short, long)]
    lang: Option<String>,

    /// 转换服务端点
    #[arg(long)]
    api_url: Option<String>,

    /// 最大并发任务数
    #[arg(long)]
    concurrency: Option<usize>,

    /// 单个批次的最大条目数
    #[arg(long)]
    batch_size: Option<usize>,

    /// 输出文件（缺省写到标准输出）
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("markflow=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // 配置优先级：命令行 > 环境变量 > 配置文件 > 默认值
    let mut config = TranslatorConfig::load();
    if let Some(lang) = cli.lang {
        config.target_lang = lang;
    }
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = batch_size;
    }
    config.validate()?;

    let document = std::fs::read_to_string(&cli.input)?;

    let transformer = Arc::new(DeepLxTransformer::from_config(&config));
    let mut session = TranslationSession::new(config, transformer)?;

    let outcome = session
        .translate(
            &document,
            |_snapshot| {},
            |done, total| {
                eprint!("\r翻译进度: {}/{}", done, total);
                let _ = std::io::stderr().flush();
            },
        )
        .await?;
    eprintln!();

    if outcome.failed_items > 0 {
        tracing::warn!("{} 个条目翻译失败，已回填原文", outcome.failed_items);
    }

    match cli.output {
        Some(path) => std::fs::write(path, outcome.document)?,
        None => println!("{}", outcome.document),
    }

    let stats = session.cache_stats();
    tracing::info!(
        "缓存: {} 命中, {} 未命中, 命中率 {:.1}%",
        stats.hits,
        stats.misses,
        stats.hit_rate() * 100.0
    );

    Ok(())
}
