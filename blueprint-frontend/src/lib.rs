pub mod cli;
pub mod command;
pub mod errors;
pub mod loader;
pub mod pipeline;
pub mod report;

use std::path::PathBuf;

use blueprint_config::AppConfig;
use blueprint_engine::plan::EngineSettings;
use blueprint_io::ExportSettings;
use errors::FrontendError;
use tracing::info;

/// 命令执行所需的全部设置，由配置文件折算而来。
#[derive(Debug, Clone, PartialEq)]
pub struct FrontendSettings {
    pub engine: EngineSettings,
    pub export: ExportSettings,
    pub output_dir: PathBuf,
}

impl FrontendSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let export = &config.export;
        Self {
            engine: EngineSettings {
                tolerance: config.topology.tolerance,
            },
            export: ExportSettings {
                margin: export.margin,
                border_inset: export.border_inset,
                text_height: export.text_height,
                tag_height: export.tag_height,
                title_text_height: export.title_text_height,
            },
            output_dir: config.frontend.output_dir.clone(),
        }
    }
}

impl Default for FrontendSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// 启动 CLI 演示：对示例项目并行执行合规检查与 DXF 导出。
pub fn run_cli_demo(settings: &FrontendSettings) -> Result<(), FrontendError> {
    info!("启动 CLI 演示前端");
    cli::run_demo(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_configuration() {
        let mut config = AppConfig::default();
        config.topology.tolerance = 0.02;
        config.export.margin = 4.0;
        config.frontend.output_dir = PathBuf::from("tegninger");
        let settings = FrontendSettings::from_config(&config);
        assert_eq!(settings.engine.tolerance, 0.02);
        assert_eq!(settings.export.margin, 4.0);
        assert_eq!(settings.export.border_inset, 10.0);
        assert_eq!(settings.output_dir, PathBuf::from("tegninger"));

        let defaults = FrontendSettings::default();
        assert_eq!(defaults.engine, EngineSettings::default());
        assert_eq!(defaults.export, ExportSettings::default());
    }
}
