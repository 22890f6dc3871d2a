use blueprint_core::errors::ModelError;
use blueprint_engine::errors::EngineError;
use blueprint_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("修复未能应用: {0}")]
    Edit(#[from] ModelError),
    #[error("命令 `{command}` 缺少参数 {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("命令 `{0}` 执行失败")]
    CommandFailed(String),
}
