//! BR18/BR23 规则评估。
//!
//! 合规结论是一等输出值，从不以错误形式抛出。评估是纯函数：对同一输入重复
//! 执行得到完全相同的报告。

pub mod area;
pub mod fixes;
pub mod rules;
pub mod wizard;

use serde::Serialize;

pub use area::{max_reasonable_area, min_realistic_area};
pub use fixes::auto_fix;
pub use rules::PlanSnapshot;
pub use wizard::{ConfirmOutcome, CrossFieldNote, Field, FieldValidation, Occupants, ProjectAnswers};

/// 稳定的规则代码，外部修复建议按此匹配。
pub mod codes {
    pub const AREA_MIN: &str = "BR18-AREA-MIN";
    pub const AREA_MAX: &str = "BR18-AREA-MAX";
    pub const BATH_RATIO: &str = "BR18-BATH-RATIO";
    pub const DOOR_WIDTH: &str = "BR18-DOOR-WIDTH";
    pub const CEILING_HEIGHT: &str = "BR18-CEILING-HEIGHT";
    pub const DAYLIGHT: &str = "BR18-DAYLIGHT";
    pub const RESCUE_WINDOW: &str = "BR18-RESCUE-WINDOW";
    pub const BATH_TURNING: &str = "BR18-BATH-TURNING";
    pub const EGRESS_BEDROOM: &str = "BR18-EGRESS-BEDROOM";
    pub const EGRESS_ROOM: &str = "BR18-EGRESS-ROOM";
    pub const EGRESS_NO_EXIT: &str = "BR18-EGRESS-NO-EXIT";
    pub const CORRIDOR_WIDTH: &str = "BR18-CORRIDOR-WIDTH";
    pub const TECH_ROOM: &str = "BR18-TECH-ROOM";
    pub const AREA_RECHECK: &str = "BR18-AREA-RECHECK";
    pub const REQUIRED: &str = "WIZ-REQUIRED";
    pub const FLOORS: &str = "WIZ-FLOORS";
    pub const NOTE_ELDERLY: &str = "WIZ-NOTE-ELDERLY";
    pub const NOTE_CHILDREN: &str = "WIZ-NOTE-CHILDREN";
    pub const NOTE_WHEELCHAIR: &str = "WIZ-NOTE-WHEELCHAIR";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

impl Severity {
    /// `major`/`critical` 阻止审批与导出确认。
    #[inline]
    pub fn is_blocking(self) -> bool {
        self >= Severity::Major
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceIssue {
    pub code: &'static str,
    pub message: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
}

impl ComplianceIssue {
    pub fn new(code: &'static str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            severity,
            element_id: None,
        }
    }

    pub fn on(mut self, element_id: impl Into<String>) -> Self {
        self.element_id = Some(element_id.into());
        self
    }
}

pub const COMPLIANT_BADGE: &str = "BR18/BR23 Compliant";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComplianceReport {
    pub violations: Vec<ComplianceIssue>,
    pub warnings: Vec<ComplianceIssue>,
}

impl ComplianceReport {
    /// 按严重度分流：阻断级进入 violations，其余进入 warnings。
    pub fn push(&mut self, issue: ComplianceIssue) {
        if issue.severity.is_blocking() {
            self.violations.push(issue);
        } else {
            self.warnings.push(issue);
        }
    }

    pub fn extend(&mut self, other: ComplianceReport) {
        self.violations.extend(other.violations);
        self.warnings.extend(other.warnings);
    }

    #[inline]
    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }

    #[inline]
    pub fn issue_count(&self) -> usize {
        self.violations.len() + self.warnings.len()
    }

    pub fn issues(&self) -> impl Iterator<Item = &ComplianceIssue> {
        self.violations.iter().chain(self.warnings.iter())
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.issues().any(|issue| issue.code == code)
    }

    /// UI 徽标文本。
    pub fn badge(&self) -> String {
        if self.is_compliant() {
            COMPLIANT_BADGE.to_string()
        } else {
            let count = self.issue_count();
            format!("{count} {}", if count == 1 { "issue" } else { "issues" })
        }
    }
}

/// 可被评估的对象：向导答案或已解析的平面图。
pub trait ComplianceSubject {
    fn evaluate(&self) -> ComplianceReport;
}

pub fn evaluate<S: ComplianceSubject + ?Sized>(subject: &S) -> ComplianceReport {
    subject.evaluate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_routes_issues() {
        let mut report = ComplianceReport::default();
        report.push(ComplianceIssue::new(codes::TECH_ROOM, Severity::Minor, "lille"));
        assert!(report.is_compliant());
        assert_eq!(report.badge(), COMPLIANT_BADGE);

        report.push(ComplianceIssue::new(codes::DOOR_WIDTH, Severity::Major, "smal").on("d1"));
        report.push(ComplianceIssue::new(codes::EGRESS_NO_EXIT, Severity::Critical, "ingen"));
        assert_eq!(report.violations.len(), 2);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.badge(), "3 issues");
        assert!(report.has_code(codes::DOOR_WIDTH));
    }

    #[test]
    fn issue_serializes_with_stable_code() {
        let issue = ComplianceIssue::new(codes::DAYLIGHT, Severity::Major, "mørkt / dark").on("r1");
        let json = serde_json::to_string(&issue).unwrap();
        assert_eq!(
            json,
            r#"{"code":"BR18-DAYLIGHT","message":"mørkt / dark","severity":"major","elementId":"r1"}"#
        );
    }
}
