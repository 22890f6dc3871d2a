//! 项目向导答案的逐字段校验与确认阶段的跨字段校验。

use serde::{Deserialize, Serialize};

use super::area::{RECHECK_FACTOR, bathroom_ratio_exceeded, max_reasonable_area, min_realistic_area};
use super::{ComplianceIssue, ComplianceReport, ComplianceSubject, Severity, codes};

/// 独栋住宅向导允许的最大楼层数。
pub const MAX_FLOORS: u32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Occupants {
    pub elderly: bool,
    pub children: bool,
    pub wheelchair: bool,
}

/// 向导收集到的答案，未回答的字段为 `None`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectAnswers {
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub total_area: Option<f64>,
    pub floors: Option<u32>,
    pub occupants: Occupants,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Bedrooms,
    Bathrooms,
    TotalArea,
    Floors,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Bedrooms, Field::Bathrooms, Field::TotalArea, Field::Floors];

    pub fn label(self) -> &'static str {
        match self {
            Field::Bedrooms => "Soveværelser / Bedrooms",
            Field::Bathrooms => "Badeværelser / Bathrooms",
            Field::TotalArea => "Boligareal / Floor area",
            Field::Floors => "Etager / Floors",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValidation {
    Ok,
    Warning {
        code: &'static str,
        message: String,
    },
    Error {
        code: &'static str,
        message: String,
        suggested_value: Option<f64>,
    },
}

impl FieldValidation {
    #[inline]
    pub fn is_ok(&self) -> bool {
        matches!(self, FieldValidation::Ok)
    }

    pub fn suggested_value(&self) -> Option<f64> {
        match self {
            FieldValidation::Error {
                suggested_value, ..
            } => *suggested_value,
            _ => None,
        }
    }

    fn into_issue(self) -> Option<ComplianceIssue> {
        match self {
            FieldValidation::Ok => None,
            FieldValidation::Warning { code, message } => {
                Some(ComplianceIssue::new(code, Severity::Minor, message))
            }
            FieldValidation::Error { code, message, .. } => {
                Some(ComplianceIssue::new(code, Severity::Major, message))
            }
        }
    }
}

fn required(field: Field) -> FieldValidation {
    FieldValidation::Error {
        code: codes::REQUIRED,
        message: format!("{} skal udfyldes / is required", field.label()),
        suggested_value: None,
    }
}

/// 校验单个字段。依赖的其他字段未回答时按 0 处理。
pub fn validate_field(field: Field, answers: &ProjectAnswers) -> FieldValidation {
    let bedrooms = answers.bedrooms.unwrap_or(0);
    let bathrooms = answers.bathrooms.unwrap_or(0);
    match field {
        Field::Bedrooms => match answers.bedrooms {
            None => required(field),
            Some(_) => FieldValidation::Ok,
        },
        Field::Bathrooms => match answers.bathrooms {
            None => required(field),
            Some(0) => FieldValidation::Error {
                code: codes::REQUIRED,
                message: "Boligen skal have mindst ét badeværelse / The dwelling needs at least one bathroom"
                    .to_string(),
                suggested_value: Some(1.0),
            },
            Some(count) if bathroom_ratio_exceeded(bedrooms, count) => FieldValidation::Warning {
                code: codes::BATH_RATIO,
                message: format!(
                    "{count} badeværelser til {bedrooms} soveværelser er usædvanligt / \
                     {count} bathrooms for {bedrooms} bedrooms is unusual"
                ),
            },
            Some(_) => FieldValidation::Ok,
        },
        Field::TotalArea => {
            let Some(area) = answers.total_area else {
                return required(field);
            };
            let min = min_realistic_area(bedrooms, bathrooms);
            let max = max_reasonable_area(bedrooms, bathrooms);
            if !(area > 0.0 && area.is_finite()) || area < min {
                FieldValidation::Error {
                    code: codes::AREA_MIN,
                    message: format!(
                        "{area:.0} m² er for lidt til {bedrooms} soveværelser og {bathrooms} bad, \
                         minimum er {min:.0} m² / {area:.0} m² is too small for {bedrooms} \
                         bedrooms and {bathrooms} bathrooms, minimum is {min:.0} m²"
                    ),
                    suggested_value: Some(min),
                }
            } else if area > max {
                FieldValidation::Warning {
                    code: codes::AREA_MAX,
                    message: format!(
                        "{area:.0} m² er mere end de typiske {max:.0} m² / \
                         {area:.0} m² exceeds the typical {max:.0} m²"
                    ),
                }
            } else {
                FieldValidation::Ok
            }
        }
        Field::Floors => match answers.floors {
            None => required(field),
            Some(0) => FieldValidation::Error {
                code: codes::FLOORS,
                message: "Boligen skal have mindst én etage / The dwelling needs at least one floor"
                    .to_string(),
                suggested_value: Some(1.0),
            },
            Some(floors) if floors > MAX_FLOORS => FieldValidation::Error {
                code: codes::FLOORS,
                message: format!(
                    "{floors} etager er for mange til et enfamiliehus, maksimum er {MAX_FLOORS} / \
                     {floors} floors is too many for a single-family house, maximum is {MAX_FLOORS}"
                ),
                suggested_value: Some(f64::from(MAX_FLOORS)),
            },
            Some(_) => FieldValidation::Ok,
        },
    }
}

/// 跨字段提示，仅供参考，不阻断。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossFieldNote {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfirmOutcome {
    pub notes: Vec<CrossFieldNote>,
    pub report: ComplianceReport,
}

/// 确认阶段：所有字段都已知后执行一次。
pub fn validate_confirm(answers: &ProjectAnswers) -> ConfirmOutcome {
    let mut outcome = ConfirmOutcome::default();
    let multi_floor = answers.floors.is_some_and(|floors| floors > 1);
    let occupants = answers.occupants;

    if multi_floor && occupants.elderly {
        outcome.notes.push(CrossFieldNote {
            code: codes::NOTE_ELDERLY,
            message: "Ældre beboere: placér master-suiten i stueetagen / \
                      Elderly occupants: place the master suite on the ground floor"
                .to_string(),
        });
    }
    if multi_floor && occupants.children {
        outcome.notes.push(CrossFieldNote {
            code: codes::NOTE_CHILDREN,
            message: "Børn i flere etager: planlæg trappelåger og værn / \
                      Children on several floors: plan stair gates and guards"
                .to_string(),
        });
    }
    if multi_floor && occupants.wheelchair {
        outcome.notes.push(CrossFieldNote {
            code: codes::NOTE_WHEELCHAIR,
            message: "Kørestolsbruger: øvre etager bliver sekundære / \
                      Wheelchair user: upper floors become secondary"
                .to_string(),
        });
    }

    if let (Some(bedrooms), Some(bathrooms), Some(area)) =
        (answers.bedrooms, answers.bathrooms, answers.total_area)
    {
        let min = min_realistic_area(bedrooms, bathrooms);
        let threshold = min * RECHECK_FACTOR;
        if area < threshold {
            outcome.report.push(ComplianceIssue::new(
                codes::AREA_RECHECK,
                Severity::Major,
                format!(
                    "Samlet vurdering: {area:.0} m² er under {threshold:.1} m² (90 % af {min:.0} m²) / \
                     Overall check: {area:.0} m² is below {threshold:.1} m² (90 % of {min:.0} m²)"
                ),
            ));
        }
    }
    outcome
}

impl ComplianceSubject for ProjectAnswers {
    fn evaluate(&self) -> ComplianceReport {
        let mut report = ComplianceReport::default();
        for field in Field::ALL {
            if let Some(issue) = validate_field(field, self).into_issue() {
                report.push(issue);
            }
        }
        report.extend(validate_confirm(self).report);
        report
    }
}
