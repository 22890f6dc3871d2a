//! 终端输出的文本排版。

use std::fmt::Write as _;
use std::path::Path;

use blueprint_core::model::{BlueprintData, Sheet};
use blueprint_engine::compliance::{
    ComplianceIssue, ComplianceReport, ConfirmOutcome, Field, FieldValidation,
};
use blueprint_engine::plan::ResolvedPlan;
use blueprint_engine::topology::LoopStatus;
use blueprint_io::DxfSummary;

fn issue_line(out: &mut String, marker: char, issue: &ComplianceIssue) {
    let element = issue
        .element_id
        .as_deref()
        .map(|id| format!(" <{id}>"))
        .unwrap_or_default();
    let _ = writeln!(out, "  {marker} [{}]{element} {}", issue.code, issue.message);
}

fn issues(out: &mut String, report: &ComplianceReport) {
    if !report.violations.is_empty() {
        let _ = writeln!(out, "违规项：");
        report.violations.iter().for_each(|issue| issue_line(out, '✗', issue));
    }
    if !report.warnings.is_empty() {
        let _ = writeln!(out, "提示项：");
        report.warnings.iter().for_each(|issue| issue_line(out, '!', issue));
    }
    let _ = write!(out, "合规徽标：{}", report.badge());
}

pub fn render_check(
    blueprint: &BlueprintData,
    sheet: &Sheet,
    plan: &ResolvedPlan,
    report: &ComplianceReport,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}) - {} {}",
        blueprint.project_name, blueprint.project_number, sheet.number, sheet.title
    );
    let status = match plan.exterior.status() {
        LoopStatus::Closed => "闭合",
        LoopStatus::Open => "未闭合",
        LoopStatus::Placeholder => "占位",
    };
    let _ = writeln!(
        out,
        "外墙环：{} 段，周长 {:.2} m（{status}）；洞口 {} 个，出口 {} 个",
        plan.exterior.segments().len(),
        plan.exterior.perimeter(),
        plan.openings.len(),
        plan.exits().count()
    );
    if !plan.diagnostics.is_empty() {
        let _ = writeln!(out, "数据诊断：");
        for diagnostic in &plan.diagnostics {
            let _ = writeln!(out, "  - [{}] {diagnostic}", diagnostic.code());
        }
    }
    issues(&mut out, report);
    out
}

pub fn render_export(path: &Path, bytes: usize, summary: &DxfSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "DXF 已写出：{}（{bytes} 字节）", path.display());
    let counts: Vec<String> = summary
        .entities
        .iter()
        .map(|(kind, count)| format!("{kind}×{count}"))
        .collect();
    let _ = write!(out, "实体统计：{}", counts.join(", "));
    out
}

pub fn render_wizard(
    fields: &[(Field, FieldValidation)],
    outcome: &ConfirmOutcome,
    report: &ComplianceReport,
) -> String {
    let mut out = String::new();
    for (field, validation) in fields {
        let verdict = match validation {
            FieldValidation::Ok => "OK".to_string(),
            FieldValidation::Warning { code, message } => format!("[{code}] {message}"),
            FieldValidation::Error {
                code,
                message,
                suggested_value,
            } => match suggested_value {
                Some(value) => format!("[{code}] {message}（建议值 {value}）"),
                None => format!("[{code}] {message}"),
            },
        };
        let _ = writeln!(out, "{}: {verdict}", field.label());
    }
    for note in &outcome.notes {
        let _ = writeln!(out, "  * [{}] {}", note.code, note.message);
    }
    issues(&mut out, report);
    out
}
