//! 由坐标模型单向生成路径式导出视图（`svg-enhanced`）。
//!
//! 该视图随时可由 [`BlueprintData`] 重新生成，外墙路径复用拓扑重建结果，
//! `atPosition` 复用洞口参数化结果。

use std::fmt::Write as _;

use blueprint_core::geometry::Point2;
use blueprint_core::model::{
    BlueprintData, Material, OpeningType, Sheet, Swing, SwingDirection, WallType,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::EngineError;
use crate::plan::{EngineSettings, ResolvedPlan, resolve_sheet, select_sheet};
use crate::topology::{EXTERIOR_TOKEN, LoopStatus};

pub const FORMAT_TAG: &str = "svg-enhanced";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SvgMetadata {
    pub project_name: String,
    pub project_number: String,
    pub sheet_title: String,
    pub sheet_number: String,
    pub scale: String,
    pub building_code: String,
    pub total_area: f64,
    pub generated_from: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SvgExterior {
    pub path: String,
    pub thickness: f64,
    pub material: Material,
    pub insulated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteriorDivision {
    pub id: String,
    pub path: String,
    pub thickness: f64,
    pub connects: Vec<String>,
    pub material: Material,
    pub structural: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SvgRoom {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub room_type: String,
    pub area: f64,
    pub center: Point2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SvgOpening {
    pub id: String,
    #[serde(rename = "type")]
    pub opening_type: OpeningType,
    /// `"exterior"` 或内墙 id。
    pub on_path: String,
    /// 洞口起点在所在路径上的长度比例，范围 `[0, 1]`。
    pub at_position: f64,
    pub width: f64,
    pub tag: String,
    pub swing: Swing,
    pub swing_direction: SwingDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SvgBlueprint {
    pub format: String,
    pub metadata: SvgMetadata,
    pub exterior: SvgExterior,
    pub divisions: Vec<InteriorDivision>,
    pub rooms: Vec<SvgRoom>,
    pub openings: Vec<SvgOpening>,
}

impl SvgBlueprint {
    /// 外墙路径的线段数：`L` 指令数，闭合时加上 `Z` 的回程段。
    pub fn exterior_segment_count(&self) -> usize {
        let tokens = self.exterior.path.split_whitespace();
        tokens.filter(|token| matches!(*token, "L" | "Z")).count()
    }
}

/// 保留四位小数，去掉负零，按最短形式输出。
fn coord(value: f64) -> f64 {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 { 0.0 } else { rounded }
}

fn path_of(points: &[Point2], closed: bool) -> String {
    let mut path = String::new();
    for (index, point) in points.iter().enumerate() {
        let command = if index == 0 { "M" } else { "L" };
        if !path.is_empty() {
            path.push(' ');
        }
        let _ = write!(path, "{command} {} {}", coord(point.x()), coord(point.y()));
    }
    if closed && points.len() > 1 {
        path.push_str(" Z");
    }
    path
}

pub fn migrate(
    blueprint: &BlueprintData,
    sheet_index: usize,
    settings: &EngineSettings,
) -> Result<SvgBlueprint, EngineError> {
    let sheet = select_sheet(blueprint, sheet_index)?;
    let plan = resolve_sheet(sheet, settings)?;
    Ok(migrate_resolved(blueprint, sheet, &plan))
}

/// 基于已有解析结果生成导出视图。
pub fn migrate_resolved(blueprint: &BlueprintData, sheet: &Sheet, plan: &ResolvedPlan) -> SvgBlueprint {
    let walls = &sheet.elements.walls;
    let ring = &plan.exterior;

    let loop_walls: Vec<_> = ring
        .segments()
        .iter()
        .filter_map(|segment| sheet.wall(&segment.wall_id))
        .collect();
    let closed = ring.status() != LoopStatus::Open;
    let exterior = SvgExterior {
        path: path_of(&ring.vertices(), closed),
        thickness: walls
            .iter()
            .filter(|wall| wall.is_external)
            .map(|wall| wall.thickness)
            .fold(0.0, f64::max),
        material: loop_walls
            .first()
            .map_or_else(|| Material::Unknown("unknown".to_string()), |wall| wall.material.clone()),
        insulated: loop_walls
            .iter()
            .any(|wall| wall.wall_type == WallType::ExteriorInsulated),
    };

    let divisions = plan
        .connections
        .iter()
        .filter_map(|connection| {
            let wall = sheet.wall(&connection.wall_id)?;
            Some(InteriorDivision {
                id: wall.id.clone(),
                path: path_of(&[wall.start, wall.end], false),
                thickness: wall.thickness,
                connects: connection.connects.clone(),
                material: wall.material.clone(),
                structural: wall.wall_type.is_structural(),
            })
        })
        .collect();

    let rooms = sheet
        .elements
        .rooms
        .iter()
        .map(|room| SvgRoom {
            id: room.id.clone(),
            label: room.label.clone(),
            room_type: room.room_type.clone(),
            area: room.area.value,
            center: room.center,
            path: (!room.polygon.is_empty()).then(|| path_of(&room.polygon, true)),
        })
        .collect();

    let perimeter = ring.perimeter();
    let mut openings = Vec::new();
    for resolved in &plan.openings {
        let Some(source) = sheet.opening(&resolved.opening_id) else {
            continue;
        };
        let placement = if resolved.on_exterior {
            ring.locate(&resolved.wall_id).map(|(index, offset)| {
                let along = if ring.segments()[index].reversed {
                    resolved.wall_length - resolved.dist_from_start
                } else {
                    resolved.dist_from_start
                };
                let position = if perimeter > 0.0 {
                    (offset + along) / perimeter
                } else {
                    0.0
                };
                (EXTERIOR_TOKEN.to_string(), position)
            })
        } else {
            Some((resolved.wall_id.clone(), resolved.t))
        };
        let Some((on_path, at_position)) = placement else {
            debug!(opening = %resolved.opening_id, "外墙未接入环，导出视图中省略该洞口");
            continue;
        };
        openings.push(SvgOpening {
            id: resolved.opening_id.clone(),
            opening_type: resolved.opening_type,
            on_path,
            at_position: coord(at_position.clamp(0.0, 1.0)),
            width: resolved.width,
            tag: resolved.tag.clone(),
            swing: source.swing,
            swing_direction: source.swing_direction,
        });
    }

    SvgBlueprint {
        format: FORMAT_TAG.to_string(),
        metadata: SvgMetadata {
            project_name: blueprint.project_name.clone(),
            project_number: blueprint.project_number.clone(),
            sheet_title: sheet.title.clone(),
            sheet_number: sheet.number.clone(),
            scale: sheet.scale.clone(),
            building_code: blueprint.building_code.clone(),
            total_area: sheet.total_area(),
            generated_from: blueprint.updated_at.clone(),
        },
        exterior,
        divisions,
        rooms,
        openings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::demo_blueprint;

    #[test]
    fn demo_migrates_to_closed_path() {
        let view = migrate(&demo_blueprint(), 0, &EngineSettings::default()).unwrap();
        assert_eq!(view.format, FORMAT_TAG);
        assert_eq!(view.exterior_segment_count(), 8);
        assert!(view.exterior.path.starts_with("M 0 0 L 6 0 L 12 0"));
        assert!(view.exterior.path.ends_with("L 0 8 Z"));
        assert_eq!(view.exterior.thickness, 0.35);
        assert_eq!(view.exterior.material, Material::Brick);
        assert!(view.exterior.insulated);
    }

    #[test]
    fn divisions_carry_connectivity_and_structure() {
        let view = migrate(&demo_blueprint(), 0, &EngineSettings::default()).unwrap();
        assert_eq!(view.divisions.len(), 5);
        let i1 = &view.divisions[0];
        assert_eq!(i1.path, "M 6 0 L 6 4");
        assert_eq!(i1.connects, ["exterior", "i2", "i3"]);
        assert!(i1.structural);
        assert!(!view.divisions[2].structural);
    }

    #[test]
    fn exterior_positions_follow_loop_direction() {
        let view = migrate(&demo_blueprint(), 0, &EngineSettings::default()).unwrap();
        let at = |id: &str| view.openings.iter().find(|o| o.id == id).unwrap();
        // 周长 40；v1 在 e1 上 1 m 处
        assert_eq!(at("v1").on_path, "exterior");
        assert_eq!(at("v1").at_position, 0.025);
        // e6 反向录入：(6,8)→(9,8) 上 1 m 处，沿环为 23 + (3 − 1) = 25
        assert_eq!(at("v5").at_position, 0.625);
        // 内墙直接使用 t
        assert_eq!(at("d2").on_path, "i1");
        assert_eq!(at("d2").at_position, 0.625);
    }

    #[test]
    fn placeholder_and_dangling_openings() {
        let mut blueprint = demo_blueprint();
        let sheet = &mut blueprint.sheets[0];
        sheet.elements.walls.retain(|wall| !wall.is_external);
        let view = migrate(&blueprint, 0, &EngineSettings::default()).unwrap();
        assert_eq!(view.exterior.path, "M 0 0 L 1 0 L 1 1 L 0 1 Z");
        assert_eq!(view.exterior_segment_count(), 4);
        assert!(!view.exterior.material.is_known());
        assert!(view.openings.iter().all(|o| o.on_path != "exterior"));
        assert_eq!(view.openings.len(), 3);
    }

    #[test]
    fn view_round_trips_through_json() {
        let view = migrate(&demo_blueprint(), 0, &EngineSettings::default()).unwrap();
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains(r#""onPath":"exterior""#));
        let back: SvgBlueprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back.exterior_segment_count(), view.exterior_segment_count());
    }
}
