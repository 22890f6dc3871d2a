use std::fs;
use std::path::{Path, PathBuf};

use blueprint_core::model::BlueprintData;
use blueprint_engine::errors::EngineError;
use blueprint_engine::migration::SvgBlueprint;
use blueprint_engine::plan::EngineSettings;
use thiserror::Error;
use tracing::debug;

pub mod dxf;
pub mod summary;

pub use dxf::{ExportSettings, serialize, serialize_resolved};
pub use summary::{DxfSummary, summarize};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid blueprint JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid document structure: {0}")]
    InvalidDocument(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub trait BlueprintLoader {
    fn load(&self, path: &Path) -> Result<BlueprintData, IoError>;
}

/// 将指定图纸写入文件。
pub trait DrawingSaver {
    fn save(&self, blueprint: &BlueprintData, sheet_index: usize, path: &Path) -> Result<(), IoError>;
}

/// 项目数据与派生视图的 JSON 读写。
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFacade;

impl JsonFacade {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, source: &str) -> Result<BlueprintData, IoError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn save_blueprint(&self, blueprint: &BlueprintData, path: &Path) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(blueprint)?;
        write_file(path, json.as_bytes())?;
        debug!(path = %path.display(), "项目文件已保存");
        Ok(())
    }

    /// 派生视图只写不读：它总能从项目数据重新生成。
    pub fn save_view(&self, view: &SvgBlueprint, path: &Path) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(view)?;
        write_file(path, json.as_bytes())
    }
}

impl BlueprintLoader for JsonFacade {
    fn load(&self, path: &Path) -> Result<BlueprintData, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let blueprint = self.parse(&data)?;
        debug!(path = %path.display(), sheets = blueprint.sheets.len(), "已读取项目文件");
        Ok(blueprint)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DxfFacade {
    pub engine: EngineSettings,
    pub export: ExportSettings,
}

impl DxfFacade {
    pub fn new(engine: EngineSettings, export: ExportSettings) -> Self {
        Self { engine, export }
    }
}

impl DrawingSaver for DxfFacade {
    fn save(&self, blueprint: &BlueprintData, sheet_index: usize, path: &Path) -> Result<(), IoError> {
        let bytes = serialize(blueprint, sheet_index, &self.engine, &self.export)?;
        write_file(path, &bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "DXF 已写出");
        Ok(())
    }
}

/// 写出文件，必要时创建上级目录。
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<(), IoError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| IoError::WriteError {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, bytes).map_err(|source| IoError::WriteError {
        path: path.to_path_buf(),
        source,
    })
}
