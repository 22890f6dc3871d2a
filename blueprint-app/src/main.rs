use std::path::{Path, PathBuf};

use blueprint_config::{AppConfig, ConfigError, DefaultCommand};
use blueprint_frontend::FrontendSettings;
use blueprint_frontend::cli::run_command;
use blueprint_frontend::command::CommandRequest;
use blueprint_frontend::errors::FrontendError;
use blueprint_frontend::loader::{LoadedBlueprint, load_blueprint, load_from_env_or_demo};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// 平面图合规检查、DXF 导出与路径视图迁移
#[derive(Debug, Parser)]
#[command(name = "blueprint", version)]
struct Cli {
    /// 配置文件路径，缺省时读取 `BLUEPRINT_CONFIG` 或 `./config/default.toml`
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 图纸索引
    #[arg(long, global = true, default_value_t = 0)]
    sheet: usize,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 打印合规报告与徽标
    Check {
        /// 项目 JSON，缺省时使用 `BLUEPRINT_SAMPLE` 或内置示例
        input: Option<PathBuf>,
    },
    /// 写出 DXF
    Export {
        input: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// 生成路径式导出视图
    Migrate {
        input: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// 应用可机械修复的合规修复
    Fix {
        input: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// 校验项目向导答案
    Wizard { answers: PathBuf },
    /// 对示例项目执行检查与导出
    Demo,
}

fn main() {
    let cli = Cli::parse();
    let config = load_configuration(cli.config.clone());
    init_logging(&config);
    info!("启动 Blueprint 应用");

    let settings = FrontendSettings::from_config(&config);
    let result = match cli.command {
        Some(Command::Demo) => blueprint_frontend::run_cli_demo(&settings),
        Some(command) => execute(command, cli.sheet, &settings),
        None => {
            let command = match config.frontend.default_command {
                DefaultCommand::Check => Command::Check { input: None },
                DefaultCommand::Export => Command::Export {
                    input: None,
                    out: None,
                },
                DefaultCommand::Migrate => Command::Migrate {
                    input: None,
                    out: None,
                },
            };
            info!(command = ?command, "未指定子命令，使用配置中的默认命令");
            execute(command, cli.sheet, &settings)
        }
    };

    if let Err(err) = result {
        error!(error = %err, "命令执行失败");
        std::process::exit(1);
    }
}

fn execute(command: Command, sheet: usize, settings: &FrontendSettings) -> Result<(), FrontendError> {
    let (name, input, args) = match command {
        Command::Check { input } => ("check", input, Vec::new()),
        Command::Export { input, out } => ("export", input, path_args(out)),
        Command::Migrate { input, out } => ("migrate", input, path_args(out)),
        Command::Fix { input, out } => ("fix", input, path_args(out)),
        Command::Wizard { answers } => {
            let request = CommandRequest::new("wizard", path_args(Some(answers)));
            return run_command(request, LoadedBlueprint::demo(), sheet, settings);
        }
        Command::Demo => return blueprint_frontend::run_cli_demo(settings),
    };
    let loaded = load_input(input.as_deref())?;
    run_command(CommandRequest::new(name, args), loaded, sheet, settings)
}

fn path_args(path: Option<PathBuf>) -> Vec<String> {
    path.map(|path| path.to_string_lossy().into_owned())
        .into_iter()
        .collect()
}

fn load_input(input: Option<&Path>) -> Result<LoadedBlueprint, FrontendError> {
    match input {
        Some(path) => load_blueprint(path),
        None => Ok(load_from_env_or_demo()),
    }
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
