use blueprint_core::model::BlueprintData;
use blueprint_engine::compliance::{ComplianceReport, PlanSnapshot, evaluate};
use blueprint_engine::plan::{ResolvedPlan, resolve_sheet, select_sheet};
use blueprint_io::serialize_resolved;
use tracing::debug;

use crate::FrontendSettings;
use crate::errors::FrontendError;

/// 一张图纸的合规报告与 DXF 字节，二者出自同一几何快照。
#[derive(Debug, Clone)]
pub struct SheetOutcome {
    pub plan: ResolvedPlan,
    pub report: ComplianceReport,
    pub dxf: Vec<u8>,
}

/// 解析一次，再并行执行合规评估与 DXF 序列化。快照只读，两侧互不影响。
pub fn check_and_export(
    blueprint: &BlueprintData,
    sheet_index: usize,
    settings: &FrontendSettings,
) -> Result<SheetOutcome, FrontendError> {
    let sheet = select_sheet(blueprint, sheet_index)?;
    let plan = resolve_sheet(sheet, &settings.engine)?;
    let (report, dxf) = rayon::join(
        || evaluate(&PlanSnapshot::new(sheet, &plan)),
        || serialize_resolved(blueprint, sheet, &plan, &settings.export),
    );
    debug!(
        sheet = %sheet.number,
        violations = report.violations.len(),
        warnings = report.warnings.len(),
        bytes = dxf.len(),
        "检查与导出完成"
    );
    Ok(SheetOutcome { plan, report, dxf })
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_engine::demo::demo_blueprint;
    use blueprint_engine::errors::EngineError;
    use blueprint_io::serialize;

    #[test]
    fn parallel_run_matches_sequential_consumers() {
        let blueprint = demo_blueprint();
        let settings = FrontendSettings::default();
        let outcome = check_and_export(&blueprint, 0, &settings).unwrap();

        let sequential = serialize(&blueprint, 0, &settings.engine, &settings.export).unwrap();
        assert_eq!(outcome.dxf, sequential);

        let sheet = &blueprint.sheets[0];
        let report = evaluate(&PlanSnapshot::new(sheet, &outcome.plan));
        assert_eq!(outcome.report, report);
        assert!(outcome.report.is_compliant());
    }

    #[test]
    fn missing_sheet_is_an_error() {
        let err = check_and_export(&demo_blueprint(), 2, &FrontendSettings::default()).unwrap_err();
        assert!(matches!(
            err,
            FrontendError::Engine(EngineError::SheetNotFound { index: 2, count: 1 })
        ));
    }
}
