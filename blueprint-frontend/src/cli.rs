use tracing::{info, warn};

use crate::FrontendSettings;
use crate::command::{CommandBus, CommandContext, CommandRequest};
use crate::errors::FrontendError;
use crate::loader::{BlueprintSource, LoadedBlueprint, load_from_env_or_demo};

/// 在已加载的项目上执行单个命令并打印结果。
pub fn run_command(
    request: CommandRequest,
    loaded: LoadedBlueprint,
    sheet_index: usize,
    settings: &FrontendSettings,
) -> Result<(), FrontendError> {
    let LoadedBlueprint {
        mut blueprint,
        source,
    } = loaded;
    info!(command = %request.name, source = %source, sheet_index, "执行 CLI 命令");

    let bus = CommandBus::new();
    let mut context = CommandContext {
        blueprint: &mut blueprint,
        sheet_index,
        settings,
    };
    let response = bus.dispatch(&request, &mut context);
    if let Some(message) = &response.message {
        println!("{message}");
    }
    if response.success {
        Ok(())
    } else {
        Err(FrontendError::CommandFailed(request.name))
    }
}

/// 简易 CLI 演示：加载示例项目（环境变量或内置），执行检查与导出。
pub fn run_demo(settings: &FrontendSettings) -> Result<(), FrontendError> {
    let loaded = load_from_env_or_demo();
    let bus = CommandBus::new();
    println!("Blueprint 合规与导出演示");
    println!("支持的命令: {}", bus.available_commands().join(", "));
    match &loaded.source {
        BlueprintSource::File(path) => println!("已从 JSON 加载项目：{}", path.display()),
        BlueprintSource::Demo => println!("使用内置两卧室示例项目"),
    }
    if let Err(err) = run_command(CommandRequest::new("export", Vec::new()), loaded, 0, settings) {
        warn!("CLI 命令执行失败: {err}");
        return Err(err);
    }
    Ok(())
}
