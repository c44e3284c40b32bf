//! # 媒体转换客户端 — 命令行入口
//!
//! 本文件仅负责日志初始化、配置加载与命令分派。
//! 业务逻辑分布在库的各子模块中，详见 `lib.rs` 架构文档。

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use media_transform::config::ServiceConfig;
use media_transform::storage;
use media_transform::transform::{
    DEFAULT_AUDIO_BITRATE_KBPS, DEFAULT_IMAGE_QUALITY, DEFAULT_VIDEO_BITRATE_KBPS,
    FsResourceStore, HttpTransport, InputSelection, InvokeOutcome, ModeSelector, ParameterUpdate,
    ResourceStore, SteganographySubMode, TransformMode, TransformResult,
};

/// 远程媒体压缩与图片隐写客户端
#[derive(Parser)]
#[command(name = "media-transform")]
#[command(version)]
#[command(about = "Compress images, video and audio or hide/reveal text in images via a remote service")]
struct Cli {
    /// 配置文件路径（JSON，缺省为用户配置目录下的 media-transform/config.json）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 覆盖配置中的服务地址
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 压缩图片（JPEG 质量）
    Image {
        file: PathBuf,
        #[arg(long, default_value_t = DEFAULT_IMAGE_QUALITY, value_parser = clap::value_parser!(u8).range(0..=100))]
        quality: u8,
        /// 导出目录
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// 按码率压缩视频（kbps）
    Video {
        file: PathBuf,
        #[arg(long, default_value_t = DEFAULT_VIDEO_BITRATE_KBPS, value_parser = clap::value_parser!(u32).range(300..=5000))]
        bitrate: u32,
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// 按码率压缩音频（kbps）
    Audio {
        file: PathBuf,
        #[arg(long, default_value_t = DEFAULT_AUDIO_BITRATE_KBPS, value_parser = clap::value_parser!(u32).range(30..=320))]
        bitrate: u32,
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// 将文本隐藏到图片中
    Hide {
        file: PathBuf,
        #[arg(short, long, default_value = "")]
        message: String,
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// 读取图片中隐藏的文本
    Reveal { file: PathBuf },

    /// 检查转换服务是否可达
    Ping,

    /// 查看预览缓存目录占用
    Cache,
}

/// 一次转换任务的参数。
struct Job {
    mode: TransformMode,
    file: PathBuf,
    sub_mode: Option<SteganographySubMode>,
    updates: Vec<ParameterUpdate>,
    out: Option<PathBuf>,
}

impl Job {
    fn from_command(command: Commands) -> Option<Self> {
        let job = match command {
            Commands::Image { file, quality, out } => Self {
                mode: TransformMode::Image,
                file,
                sub_mode: None,
                updates: vec![ParameterUpdate::Quality(quality)],
                out: Some(out),
            },
            Commands::Video { file, bitrate, out } => Self {
                mode: TransformMode::Video,
                file,
                sub_mode: None,
                updates: vec![ParameterUpdate::Bitrate(bitrate)],
                out: Some(out),
            },
            Commands::Audio { file, bitrate, out } => Self {
                mode: TransformMode::Audio,
                file,
                sub_mode: None,
                updates: vec![ParameterUpdate::Bitrate(bitrate)],
                out: Some(out),
            },
            Commands::Hide { file, message, out } => Self {
                mode: TransformMode::ImageSteganography,
                file,
                sub_mode: Some(SteganographySubMode::Hide),
                updates: vec![ParameterUpdate::Message(message)],
                out: Some(out),
            },
            Commands::Reveal { file } => Self {
                mode: TransformMode::ImageSteganography,
                file,
                sub_mode: Some(SteganographySubMode::Reveal),
                updates: Vec::new(),
                out: None,
            },
            Commands::Ping | Commands::Cache => return None,
        };
        Some(job)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => {
            log::error!("运行失败: {err:#}");
            eprintln!("错误：{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
        config.validate()?;
    }

    match cli.command {
        Commands::Ping => {
            let transport = HttpTransport::new(&config)?;
            let message = transport
                .service_info()
                .await
                .with_context(|| format!("无法访问转换服务 {}", transport.base_url()))?;
            println!("✅ {} 可用：{}", transport.base_url(), message);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Cache => {
            let dir = storage::resolve_cache_dir(config.cache_dir.as_deref())?;
            let info = storage::cache_dir_info(&dir);
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(ExitCode::SUCCESS)
        }
        command => match Job::from_command(command) {
            Some(job) => run_job(job, &config).await,
            None => Ok(ExitCode::SUCCESS),
        },
    }
}

fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match dirs::config_dir() {
            Some(dir) => dir.join("media-transform").join("config.json"),
            None => return Ok(ServiceConfig::default()),
        },
    };
    ServiceConfig::load(&path).with_context(|| format!("加载配置失败: {}", path.display()))
}

async fn run_job(job: Job, config: &ServiceConfig) -> Result<ExitCode> {
    let cache_dir = storage::resolve_cache_dir(config.cache_dir.as_deref())?;
    let store: Arc<dyn ResourceStore> = Arc::new(FsResourceStore::new(&cache_dir)?);
    let transport = HttpTransport::new(config)?;

    let mut selector = ModeSelector::new(transport, store, job.mode)
        .with_export_fallback_name(config.export_fallback_name.clone());
    let orchestrator = selector.active_mut();

    let input = InputSelection::from_path(&job.file, config.max_upload_size)?;
    orchestrator.select_input(input);
    if let Some(sub_mode) = job.sub_mode {
        orchestrator.set_sub_mode(sub_mode);
    }
    for update in job.updates {
        orchestrator.set_parameter(update);
    }

    let outcome = orchestrator.invoke().await;
    let controls = orchestrator.control_state();

    let code = match outcome {
        InvokeOutcome::Succeeded => {
            match orchestrator.result() {
                TransformResult::RevealedText { text } => {
                    println!("🔍 隐藏消息：{}", text);
                }
                TransformResult::BinaryOutput { .. } => {
                    let out = job.out.unwrap_or_else(|| PathBuf::from("."));
                    let exported = orchestrator.export(&out)?;
                    println!(
                        "✅ 原始 {} → 结果 {}，已导出到 {}",
                        controls.original_size.as_deref().unwrap_or("-"),
                        controls.output_size.as_deref().unwrap_or("未知大小"),
                        exported.display()
                    );
                }
                TransformResult::Absent => {}
            }
            ExitCode::SUCCESS
        }
        InvokeOutcome::Failed(_) => {
            for notice in orchestrator.take_notices() {
                eprintln!("❌ 转换失败 [{}/{}]：{}", notice.stage, notice.code, notice.message);
                if notice.retryable {
                    eprintln!("   可用 `media-transform ping` 检查服务后重试");
                }
            }
            ExitCode::FAILURE
        }
        InvokeOutcome::Rejected(err) => {
            eprintln!("🚫 未发出请求：{}", err);
            ExitCode::FAILURE
        }
        InvokeOutcome::Discarded => ExitCode::FAILURE,
    };

    selector.dispose();
    Ok(code)
}
