use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use blueprint_core::model::BlueprintData;
use blueprint_engine::demo::demo_blueprint;
use blueprint_io::{BlueprintLoader, JsonFacade};
use tracing::{info, warn};

use crate::errors::FrontendError;

/// 指定示例项目文件的环境变量。
pub const SAMPLE_ENV: &str = "BLUEPRINT_SAMPLE";

/// 项目来源，便于前端呈现加载信息。
#[derive(Debug, Clone, PartialEq)]
pub enum BlueprintSource {
    File(PathBuf),
    Demo,
}

impl fmt::Display for BlueprintSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlueprintSource::File(path) => write!(f, "{}", path.display()),
            BlueprintSource::Demo => f.write_str("内置示例"),
        }
    }
}

#[derive(Debug)]
pub struct LoadedBlueprint {
    pub blueprint: BlueprintData,
    pub source: BlueprintSource,
}

impl LoadedBlueprint {
    pub fn demo() -> Self {
        Self {
            blueprint: demo_blueprint(),
            source: BlueprintSource::Demo,
        }
    }
}

/// 显式给出的项目文件必须能读取，错误直接返回。
pub fn load_blueprint(path: &Path) -> Result<LoadedBlueprint, FrontendError> {
    let blueprint = JsonFacade::new().load(path)?;
    info!(path = %path.display(), "从 JSON 加载项目成功");
    Ok(LoadedBlueprint {
        blueprint,
        source: BlueprintSource::File(path.to_path_buf()),
    })
}

/// 从环境变量 `BLUEPRINT_SAMPLE` 指定的路径加载项目，
/// 若失败则回退到内置示例。
pub fn load_from_env_or_demo() -> LoadedBlueprint {
    load_sample_or_demo(env::var_os(SAMPLE_ENV).map(PathBuf::from))
}

pub fn load_sample_or_demo(sample: Option<PathBuf>) -> LoadedBlueprint {
    if let Some(path) = sample {
        match load_blueprint(&path) {
            Ok(loaded) => return loaded,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "加载示例项目失败，回退到内置示例");
            }
        }
    }
    LoadedBlueprint::demo()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_sample_falls_back_to_demo() {
        let loaded = load_sample_or_demo(Some(PathBuf::from("/nonexistent/plan.json")));
        assert_eq!(loaded.source, BlueprintSource::Demo);
        assert_eq!(loaded.blueprint, demo_blueprint());
        assert_eq!(load_sample_or_demo(None).source, BlueprintSource::Demo);
    }

    #[test]
    fn explicit_file_errors_are_returned() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            load_blueprint(file.path()),
            Err(FrontendError::Io(blueprint_io::IoError::Json(_)))
        ));
    }

    #[test]
    fn sample_file_is_preferred_over_demo() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        let json = serde_json::to_string(&demo_blueprint()).unwrap();
        write!(file, "{json}").unwrap();
        let loaded = load_sample_or_demo(Some(file.path().to_path_buf()));
        assert_eq!(loaded.source, BlueprintSource::File(file.path().to_path_buf()));
        assert_eq!(loaded.blueprint.project_name, "Parcelhus Skovvej 12");
    }
}
