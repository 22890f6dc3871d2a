use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 显式指定配置文件的环境变量。
pub const CONFIG_ENV: &str = "BLUEPRINT_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub topology: TopologyConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// 自动发现配置文件：优先读取环境变量 `BLUEPRINT_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TopologyConfig {
    /// 端点匹配容差（米）。
    #[serde(default = "TopologyConfig::default_tolerance")]
    pub tolerance: f64,
}

impl TopologyConfig {
    fn default_tolerance() -> f64 {
        0.05
    }
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            tolerance: Self::default_tolerance(),
        }
    }
}

/// 图框与文字尺寸，单位与图纸坐标一致。
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub margin: f64,
    pub border_inset: f64,
    pub text_height: f64,
    pub tag_height: f64,
    pub title_text_height: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            margin: 20.0,
            border_inset: 10.0,
            text_height: 0.25,
            tag_height: 0.18,
            title_text_height: 0.35,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultCommand {
    #[default]
    Check,
    Export,
    Migrate,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FrontendConfig {
    #[serde(default)]
    pub default_command: DefaultCommand,
    #[serde(default = "FrontendConfig::default_output_dir")]
    pub output_dir: PathBuf,
}

impl FrontendConfig {
    fn default_output_dir() -> PathBuf {
        PathBuf::from("out")
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            default_command: DefaultCommand::default(),
            output_dir: Self::default_output_dir(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_returned_when_file_missing() {
        let cfg = AppConfig::discover().expect("discover should succeed");
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.topology.tolerance, 0.05);
        assert_eq!(cfg.export, ExportConfig::default());
        assert_eq!(cfg.frontend.default_command, DefaultCommand::Check);
        assert_eq!(cfg.frontend.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [topology]
            tolerance = 0.01

            [export]
            margin = 5.0
            tag_height = 0.2

            [frontend]
            default_command = "export"
            output_dir = "../drawings"
            "#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.topology.tolerance, 0.01);
        assert_eq!(cfg.export.margin, 5.0);
        assert_eq!(cfg.export.tag_height, 0.2);
        // 未给出的字段保持默认
        assert_eq!(cfg.export.border_inset, 10.0);
        assert_eq!(cfg.frontend.default_command, DefaultCommand::Export);
        assert_eq!(cfg.frontend.output_dir, PathBuf::from("../drawings"));
    }

    #[test]
    fn parse_errors_carry_the_path() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(file, "[frontend]\ndefault_command = \"render\"").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == file.path()));

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            AppConfig::from_file(&missing),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn shipped_default_file_matches_builtin_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/default.toml");
        let cfg = AppConfig::from_file(path).expect("load shipped config");
        assert_eq!(cfg, AppConfig::default());
    }
}
