use std::fmt;

use blueprint_core::model::{BlueprintData, Sheet};
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::EngineError;
use crate::openings::{ResolvedOpening, resolve_opening};
use crate::topology::{
    DEFAULT_TOLERANCE, ExteriorLoop, LoopStatus, WallConnection, interior_connections,
    reconstruct_exterior,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// 端点匹配容差（米）。
    pub tolerance: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// 数据完整性告警：不会中断处理，但输出质量会下降。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "kebab-case")]
pub enum Diagnostic {
    DanglingOpening {
        opening_id: String,
        wall_id: String,
    },
    OpeningClamped {
        opening_id: String,
        requested: f64,
        applied: f64,
    },
    OpenExteriorLoop {
        placed: usize,
        unplaced: Vec<String>,
    },
    PlaceholderBoundary,
    UnknownMaterial {
        wall_id: String,
    },
}

impl Diagnostic {
    pub fn code(&self) -> &'static str {
        match self {
            Diagnostic::DanglingOpening { .. } => "dangling-opening",
            Diagnostic::OpeningClamped { .. } => "opening-clamped",
            Diagnostic::OpenExteriorLoop { .. } => "open-exterior-loop",
            Diagnostic::PlaceholderBoundary => "placeholder-boundary",
            Diagnostic::UnknownMaterial { .. } => "unknown-material",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DanglingOpening { opening_id, wall_id } => {
                write!(f, "opening `{opening_id}` references missing wall `{wall_id}`")
            }
            Diagnostic::OpeningClamped {
                opening_id,
                requested,
                applied,
            } => write!(
                f,
                "opening `{opening_id}` moved from {requested:.3} m to {applied:.3} m to fit its wall"
            ),
            Diagnostic::OpenExteriorLoop { placed, unplaced } => write!(
                f,
                "exterior loop is open after {placed} walls (unplaced: {})",
                unplaced.join(", ")
            ),
            Diagnostic::PlaceholderBoundary => {
                write!(f, "no exterior walls; using a unit-square placeholder boundary")
            }
            Diagnostic::UnknownMaterial { wall_id } => {
                write!(f, "wall `{wall_id}` has an unknown material and will not be hatched")
            }
        }
    }
}

/// 两个下游消费者（合规评估与 CAD 导出）共享的不可变几何快照。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPlan {
    pub exterior: ExteriorLoop,
    pub connections: Vec<WallConnection>,
    pub openings: Vec<ResolvedOpening>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolvedPlan {
    pub fn opening(&self, id: &str) -> Option<&ResolvedOpening> {
        self.openings.iter().find(|opening| opening.opening_id == id)
    }

    /// 位于外墙上的门，即建筑出口。
    pub fn exits(&self) -> impl Iterator<Item = &ResolvedOpening> {
        self.openings
            .iter()
            .filter(|opening| opening.on_exterior && opening.is_door())
    }

    pub fn windows(&self) -> impl Iterator<Item = &ResolvedOpening> {
        self.openings.iter().filter(|opening| opening.is_window())
    }
}

pub fn select_sheet(blueprint: &BlueprintData, index: usize) -> Result<&Sheet, EngineError> {
    blueprint.sheet(index).ok_or(EngineError::SheetNotFound {
        index,
        count: blueprint.sheets.len(),
    })
}

/// 校验图纸后依次执行拓扑重建与洞口参数化。
pub fn resolve_sheet(sheet: &Sheet, settings: &EngineSettings) -> Result<ResolvedPlan, EngineError> {
    sheet.validate()?;

    let walls = &sheet.elements.walls;
    let mut diagnostics = Vec::new();

    let exterior = reconstruct_exterior(walls, settings.tolerance);
    match exterior.status() {
        LoopStatus::Closed => {}
        LoopStatus::Open => {
            warn!(
                placed = exterior.segments().len(),
                unplaced = exterior.unplaced().len(),
                "外墙环未闭合"
            );
            diagnostics.push(Diagnostic::OpenExteriorLoop {
                placed: exterior.segments().len(),
                unplaced: exterior.unplaced().to_vec(),
            });
        }
        LoopStatus::Placeholder => {
            warn!(sheet = %sheet.number, "图纸没有外墙，使用占位边界");
            diagnostics.push(Diagnostic::PlaceholderBoundary);
        }
    }

    for wall in walls.iter().filter(|wall| !wall.material.is_known()) {
        warn!(wall = %wall.id, "墙体材料未知，导出时不生成填充");
        diagnostics.push(Diagnostic::UnknownMaterial {
            wall_id: wall.id.clone(),
        });
    }

    let connections = interior_connections(walls, settings.tolerance);

    let mut openings = Vec::with_capacity(sheet.elements.openings.len());
    for opening in &sheet.elements.openings {
        let Some(resolved) = sheet
            .wall(&opening.wall_id)
            .and_then(|wall| resolve_opening(opening, wall))
        else {
            warn!(opening = %opening.id, wall = %opening.wall_id, "洞口引用的墙体不存在，已跳过");
            diagnostics.push(Diagnostic::DanglingOpening {
                opening_id: opening.id.clone(),
                wall_id: opening.wall_id.clone(),
            });
            continue;
        };
        if resolved.clamped {
            warn!(
                opening = %opening.id,
                requested = opening.dist_from_start,
                applied = resolved.dist_from_start,
                "洞口超出墙体范围，已收回"
            );
            diagnostics.push(Diagnostic::OpeningClamped {
                opening_id: opening.id.clone(),
                requested: opening.dist_from_start,
                applied: resolved.dist_from_start,
            });
        }
        openings.push(resolved);
    }

    debug!(
        sheet = %sheet.number,
        openings = openings.len(),
        diagnostics = diagnostics.len(),
        "图纸几何解析完成"
    );

    Ok(ResolvedPlan {
        exterior,
        connections,
        openings,
        diagnostics,
    })
}

pub fn resolve_blueprint(
    blueprint: &BlueprintData,
    index: usize,
    settings: &EngineSettings,
) -> Result<ResolvedPlan, EngineError> {
    resolve_sheet(select_sheet(blueprint, index)?, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::{demo_blueprint, demo_sheet};
    use blueprint_core::errors::ModelError;

    #[test]
    fn demo_resolves_without_diagnostics() {
        let plan = resolve_sheet(&demo_sheet(), &EngineSettings::default()).unwrap();
        assert!(plan.exterior.is_closed());
        assert!(plan.diagnostics.is_empty(), "{:?}", plan.diagnostics);
        assert_eq!(plan.openings.len(), 9);
        let exits: Vec<&str> = plan.exits().map(|o| o.opening_id.as_str()).collect();
        assert_eq!(exits, ["d1"]);
        let entrance = plan.opening("d1").unwrap();
        assert!(entrance.center.coincides(blueprint_core::geometry::Point2::new(0.0, 4.5), 1e-9));
    }

    #[test]
    fn dangling_and_overflowing_openings_degrade() {
        let mut sheet = demo_sheet();
        sheet.elements.openings[0].wall_id = "gone".into();
        sheet.elements.openings[4].dist_from_start = 5.5;
        let plan = resolve_sheet(&sheet, &EngineSettings::default()).unwrap();
        assert_eq!(plan.openings.len(), 8);
        assert!(plan.opening("d1").is_none());
        let codes: Vec<&str> = plan.diagnostics.iter().map(Diagnostic::code).collect();
        assert_eq!(codes, ["dangling-opening", "opening-clamped"]);
        // 原始数据保持不变
        assert_eq!(sheet.elements.openings[0].wall_id, "gone");
    }

    #[test]
    fn missing_exterior_wall_reports_open_loop() {
        let mut sheet = demo_sheet();
        sheet.elements.walls.retain(|wall| wall.id != "e3");
        sheet.elements.openings.retain(|opening| opening.wall_id != "e3");
        let plan = resolve_sheet(&sheet, &EngineSettings::default()).unwrap();
        assert!(!plan.exterior.is_closed());
        assert!(matches!(
            plan.diagnostics[0],
            Diagnostic::OpenExteriorLoop { placed: 2, .. }
        ));
    }

    #[test]
    fn contract_failures_abort() {
        let blueprint = demo_blueprint();
        assert_eq!(
            resolve_blueprint(&blueprint, 3, &EngineSettings::default()),
            Err(EngineError::SheetNotFound { index: 3, count: 1 })
        );

        let mut sheet = demo_sheet();
        sheet.elements.rooms[0].polygon.truncate(2);
        assert!(matches!(
            resolve_sheet(&sheet, &EngineSettings::default()),
            Err(EngineError::Model(ModelError::MalformedPolygon { .. }))
        ));
    }
}
