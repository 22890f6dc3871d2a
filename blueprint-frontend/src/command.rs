use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use blueprint_core::edit::PendingEdit;
use blueprint_core::model::BlueprintData;
use blueprint_engine::compliance::{
    ComplianceSubject, Field, PlanSnapshot, ProjectAnswers, auto_fix, evaluate,
};
use blueprint_engine::compliance::wizard::{validate_confirm, validate_field};
use blueprint_engine::errors::EngineError;
use blueprint_engine::migration::migrate_resolved;
use blueprint_engine::plan::{resolve_sheet, select_sheet};
use blueprint_io::{IoError, JsonFacade, summarize, write_file};
use tracing::{debug, info, warn};

use crate::FrontendSettings;
use crate::errors::FrontendError;
use crate::pipeline::check_and_export;
use crate::report::{render_check, render_export, render_wizard};

#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl CommandRequest {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandResponse {
    pub success: bool,
    pub message: Option<String>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> Result<CommandResponse, FrontendError>;
}

pub struct CommandContext<'a> {
    pub blueprint: &'a mut BlueprintData,
    pub sheet_index: usize,
    pub settings: &'a FrontendSettings,
}

impl CommandContext<'_> {
    /// 输出目录下以图纸编号命名的默认文件。
    fn default_output(&self, extension: &str) -> PathBuf {
        let stem = self
            .blueprint
            .sheet(self.sheet_index)
            .map(|sheet| sheet.number.trim())
            .filter(|number| !number.is_empty())
            .map(|number| number.replace(['/', '\\', ' '], "_"))
            .unwrap_or_else(|| format!("sheet-{}", self.sheet_index));
        self.settings
            .output_dir
            .join(format!("{stem}.{extension}"))
    }
}

pub struct CommandBus {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBus {
    pub fn new() -> Self {
        let mut bus = Self {
            handlers: HashMap::new(),
        };
        bus.register(CheckCommand);
        bus.register(ExportCommand);
        bus.register(MigrateCommand);
        bus.register(FixCommand);
        bus.register(WizardCommand);
        bus
    }

    pub fn register<H: CommandHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    pub fn dispatch(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> CommandResponse {
        let Some(handler) = self.handlers.get(request.name.as_str()) else {
            return CommandResponse::err(format!("未知命令: {}", request.name));
        };
        debug!(command = %request.name, args = request.args.len(), "执行命令");
        match handler.execute(request, context) {
            Ok(response) => response,
            Err(err) => {
                warn!(command = %request.name, error = %err, "命令执行失败");
                CommandResponse::err(err.to_string())
            }
        }
    }

    /// 按名称排序，保证输出稳定。
    pub fn available_commands(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

struct CheckCommand;

impl CommandHandler for CheckCommand {
    fn name(&self) -> &'static str {
        "check"
    }

    fn execute(
        &self,
        _request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> Result<CommandResponse, FrontendError> {
        let blueprint = &*context.blueprint;
        let sheet = select_sheet(blueprint, context.sheet_index)?;
        let plan = resolve_sheet(sheet, &context.settings.engine)?;
        let report = evaluate(&PlanSnapshot::new(sheet, &plan));
        Ok(CommandResponse::ok(render_check(blueprint, sheet, &plan, &report)))
    }
}

/// 导出 DXF，同时附上同一快照上的合规报告。
struct ExportCommand;

impl CommandHandler for ExportCommand {
    fn name(&self) -> &'static str {
        "export"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> Result<CommandResponse, FrontendError> {
        let path = request
            .args
            .first()
            .map(PathBuf::from)
            .unwrap_or_else(|| context.default_output("dxf"));
        let blueprint = &*context.blueprint;
        let outcome = check_and_export(blueprint, context.sheet_index, context.settings)?;
        write_file(&path, &outcome.dxf)?;
        info!(path = %path.display(), bytes = outcome.dxf.len(), "DXF 已写出");

        let sheet = select_sheet(blueprint, context.sheet_index)?;
        let summary = summarize(&outcome.dxf)?;
        let message = format!(
            "{}\n{}",
            render_check(blueprint, sheet, &outcome.plan, &outcome.report),
            render_export(&path, outcome.dxf.len(), &summary)
        );
        Ok(CommandResponse::ok(message))
    }
}

struct MigrateCommand;

impl CommandHandler for MigrateCommand {
    fn name(&self) -> &'static str {
        "migrate"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> Result<CommandResponse, FrontendError> {
        let blueprint = &*context.blueprint;
        let sheet = select_sheet(blueprint, context.sheet_index)?;
        let plan = resolve_sheet(sheet, &context.settings.engine)?;
        let view = migrate_resolved(blueprint, sheet, &plan);
        match request.args.first() {
            Some(path) => {
                let path = Path::new(path);
                JsonFacade::new().save_view(&view, path)?;
                Ok(CommandResponse::ok(format!(
                    "导出视图已写出：{}（外墙 {} 段，洞口 {} 个）",
                    path.display(),
                    view.exterior_segment_count(),
                    view.openings.len()
                )))
            }
            None => {
                let json = serde_json::to_string_pretty(&view).map_err(IoError::from)?;
                Ok(CommandResponse::ok(json))
            }
        }
    }
}

/// 对可机械修复的问题应用修复，可选地保存修复后的项目。
struct FixCommand;

impl CommandHandler for FixCommand {
    fn name(&self) -> &'static str {
        "fix"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        context: &mut CommandContext<'_>,
    ) -> Result<CommandResponse, FrontendError> {
        let index = context.sheet_index;
        let edits: Vec<PendingEdit> = {
            let sheet = select_sheet(context.blueprint, index)?;
            let plan = resolve_sheet(sheet, &context.settings.engine)?;
            let report = evaluate(&PlanSnapshot::new(sheet, &plan));
            report
                .issues()
                .filter_map(|issue| auto_fix(issue, sheet))
                .collect()
        };

        let count = context.blueprint.sheets.len();
        let sheet = context
            .blueprint
            .sheet_mut(index)
            .ok_or(EngineError::SheetNotFound { index, count })?;
        let mut fixed = Vec::with_capacity(edits.len());
        for edit in edits {
            let id = edit.target_id().to_string();
            edit.apply(sheet)?;
            debug!(element = %id, "已应用自动修复");
            fixed.push(id);
        }

        let blueprint = &*context.blueprint;
        let sheet = select_sheet(blueprint, index)?;
        let plan = resolve_sheet(sheet, &context.settings.engine)?;
        let report = evaluate(&PlanSnapshot::new(sheet, &plan));

        let mut message = if fixed.is_empty() {
            "没有可自动修复的问题".to_string()
        } else {
            format!("已修复：{}", fixed.join(", "))
        };
        if let Some(path) = request.args.first() {
            let path = Path::new(path);
            JsonFacade::new().save_blueprint(blueprint, path)?;
            message.push_str(&format!("\n项目已保存：{}", path.display()));
        }
        message.push('\n');
        message.push_str(&render_check(blueprint, sheet, &plan, &report));
        Ok(CommandResponse::ok(message))
    }
}

/// 校验向导答案文件（JSON）。
struct WizardCommand;

impl CommandHandler for WizardCommand {
    fn name(&self) -> &'static str {
        "wizard"
    }

    fn execute(
        &self,
        request: &CommandRequest,
        _context: &mut CommandContext<'_>,
    ) -> Result<CommandResponse, FrontendError> {
        let path = request
            .args
            .first()
            .map(PathBuf::from)
            .ok_or(FrontendError::MissingArgument {
                command: "wizard",
                argument: "<answers.json>",
            })?;
        let content = fs::read_to_string(&path).map_err(|source| IoError::ReadError {
            path: path.clone(),
            source,
        })?;
        let answers: ProjectAnswers = serde_json::from_str(&content).map_err(IoError::from)?;

        let fields: Vec<_> = Field::ALL
            .iter()
            .map(|field| (*field, validate_field(*field, &answers)))
            .collect();
        let outcome = validate_confirm(&answers);
        let report = answers.evaluate();
        Ok(CommandResponse::ok(render_wizard(&fields, &outcome, &report)))
    }
}
