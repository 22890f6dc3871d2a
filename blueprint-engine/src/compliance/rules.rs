//! 针对已解析平面图的 BR18 规则。

use blueprint_core::geometry::{
    Bounds2D, Point2, distance_to_polygon_boundary, polygon_area,
};
use blueprint_core::model::{RoomCategory, RoomZone, Sheet};
use tracing::debug;

use super::area::{bathroom_ratio_exceeded, max_reasonable_area, min_realistic_area};
use super::{ComplianceIssue, ComplianceReport, ComplianceSubject, Severity, codes};
use crate::openings::ResolvedOpening;
use crate::plan::ResolvedPlan;

/// 无障碍最小净门宽（米）。
pub const MIN_DOOR_WIDTH: f64 = 0.77;
pub const MIN_CEILING_HABITABLE: f64 = 2.30;
pub const MIN_CEILING_SECONDARY: f64 = 2.10;
/// 窗面积与地板面积之比下限。
pub const DAYLIGHT_RATIO: f64 = 0.10;
pub const RESCUE_WINDOW_SUM: f64 = 1.50;
pub const RESCUE_SILL_MAX: f64 = 1.20;
/// 1.50 m 轮椅回转圆。
pub const TURNING_DIAMETER: f64 = 1.50;
pub const TURNING_MIN_AREA: f64 = 2.25;
pub const EGRESS_BEDROOM_MAX: f64 = 15.0;
pub const EGRESS_ROOM_MAX: f64 = 25.0;
pub const MIN_CORRIDOR_WIDTH: f64 = 1.00;
pub const MIN_TECH_ROOM_AREA: f64 = 4.0;
/// 窗中心到房间边界的附加容差，叠加在半墙厚之上。
pub const WINDOW_REACH: f64 = 0.30;

/// 一张图纸及其解析结果的只读快照，两者必须来自同一次解析。
#[derive(Debug, Clone, Copy)]
pub struct PlanSnapshot<'a> {
    pub sheet: &'a Sheet,
    pub plan: &'a ResolvedPlan,
}

impl<'a> PlanSnapshot<'a> {
    pub fn new(sheet: &'a Sheet, plan: &'a ResolvedPlan) -> Self {
        Self { sheet, plan }
    }

    /// 与房间相邻的窗：窗中心距房间多边形边界不超过半墙厚加 0.30 m。
    pub fn windows_of(&self, room: &RoomZone) -> Vec<&'a ResolvedOpening> {
        if room.polygon.is_empty() {
            return Vec::new();
        }
        self.plan
            .windows()
            .filter(|window| {
                let reach = window.wall_thickness * 0.5 + WINDOW_REACH;
                distance_to_polygon_boundary(&room.polygon, window.center) <= reach
            })
            .collect()
    }

    /// 房间的采光窗面积。`naturalLightArea` 存在时总是优先；否则无多边形的
    /// 房间无法评估，返回 `None`。
    pub fn light_area(&self, room: &RoomZone) -> Option<f64> {
        if let Some(area) = room.natural_light_area {
            return Some(area);
        }
        if room.polygon.is_empty() {
            return None;
        }
        Some(self.windows_of(room).iter().map(|window| window.area()).sum())
    }

    fn room_counts(&self) -> (u32, u32) {
        self.sheet
            .elements
            .rooms
            .iter()
            .fold((0, 0), |(bedrooms, bathrooms), room| match room.category() {
                RoomCategory::Bedroom => (bedrooms + 1, bathrooms),
                RoomCategory::Bathroom => (bedrooms, bathrooms + 1),
                _ => (bedrooms, bathrooms),
            })
    }
}

pub fn min_ceiling_height(category: RoomCategory) -> f64 {
    if category.is_habitable() {
        MIN_CEILING_HABITABLE
    } else {
        MIN_CEILING_SECONDARY
    }
}

impl ComplianceSubject for PlanSnapshot<'_> {
    fn evaluate(&self) -> ComplianceReport {
        let mut report = ComplianceReport::default();
        check_area(self, &mut report);
        check_doors(self, &mut report);
        for room in &self.sheet.elements.rooms {
            check_ceiling(room, &mut report);
            check_daylight(self, room, &mut report);
            check_rescue_window(self, room, &mut report);
            check_bathroom_turning(room, &mut report);
            check_corridor(room, &mut report);
            check_technical(room, &mut report);
        }
        check_egress(self, &mut report);
        debug!(
            sheet = %self.sheet.number,
            violations = report.violations.len(),
            warnings = report.warnings.len(),
            "合规评估完成"
        );
        report
    }
}

fn check_area(snapshot: &PlanSnapshot<'_>, report: &mut ComplianceReport) {
    if snapshot.sheet.elements.rooms.is_empty() {
        return;
    }
    let (bedrooms, bathrooms) = snapshot.room_counts();
    let total = snapshot.sheet.total_area();
    let min = min_realistic_area(bedrooms, bathrooms);
    let max = max_reasonable_area(bedrooms, bathrooms);
    if total < min {
        report.push(ComplianceIssue::new(
            codes::AREA_MIN,
            Severity::Major,
            format!(
                "Boligarealet {total:.1} m² er under minimum {min:.0} m² / \
                 Floor area {total:.1} m² is below the minimum of {min:.0} m²"
            ),
        ));
    } else if total > max {
        report.push(ComplianceIssue::new(
            codes::AREA_MAX,
            Severity::Minor,
            format!(
                "Boligarealet {total:.1} m² overstiger typiske {max:.0} m² / \
                 Floor area {total:.1} m² exceeds the typical {max:.0} m²"
            ),
        ));
    }
    if bathroom_ratio_exceeded(bedrooms, bathrooms) {
        report.push(ComplianceIssue::new(
            codes::BATH_RATIO,
            Severity::Minor,
            format!(
                "{bathrooms} badeværelser til {bedrooms} soveværelser / \
                 {bathrooms} bathrooms for {bedrooms} bedrooms"
            ),
        ));
    }
}

fn check_doors(snapshot: &PlanSnapshot<'_>, report: &mut ComplianceReport) {
    for door in snapshot
        .sheet
        .elements
        .openings
        .iter()
        .filter(|opening| opening.opening_type.is_door())
    {
        if door.width < MIN_DOOR_WIDTH {
            report.push(
                ComplianceIssue::new(
                    codes::DOOR_WIDTH,
                    Severity::Major,
                    format!(
                        "Dør {tag} har fri bredde {w:.2} m, minimum er 0,77 m / \
                         Door {tag} has a clear width of {w:.2} m, minimum is 0.77 m",
                        tag = door.display_tag(),
                        w = door.width
                    ),
                )
                .on(&door.id),
            );
        }
    }
}

fn check_ceiling(room: &RoomZone, report: &mut ComplianceReport) {
    let Some(height) = room.ceiling_height else {
        return;
    };
    let min = min_ceiling_height(room.category());
    if height < min {
        report.push(
            ComplianceIssue::new(
                codes::CEILING_HEIGHT,
                Severity::Major,
                format!(
                    "{label}: loftshøjde {height:.2} m er under {min:.2} m / \
                     {label}: ceiling height {height:.2} m is below {min:.2} m",
                    label = room.label
                ),
            )
            .on(&room.id),
        );
    }
}

fn check_daylight(snapshot: &PlanSnapshot<'_>, room: &RoomZone, report: &mut ComplianceReport) {
    if !room.category().is_habitable() {
        return;
    }
    let Some(glazing) = snapshot.light_area(room) else {
        debug!(room = %room.id, "房间没有多边形也没有采光面积，跳过采光检查");
        return;
    };
    let required = room.area.value * DAYLIGHT_RATIO;
    if glazing < required {
        report.push(
            ComplianceIssue::new(
                codes::DAYLIGHT,
                Severity::Major,
                format!(
                    "{label}: vinduesareal {glazing:.2} m² er under 10 % af gulvarealet ({required:.2} m²) / \
                     {label}: window area {glazing:.2} m² is below 10 % of the floor area ({required:.2} m²)",
                    label = room.label
                ),
            )
            .on(&room.id),
        );
    }
}

fn is_rescue_window(window: &ResolvedOpening) -> bool {
    window.width + window.height >= RESCUE_WINDOW_SUM
        && window.sill_height.is_none_or(|sill| sill <= RESCUE_SILL_MAX)
}

fn check_rescue_window(snapshot: &PlanSnapshot<'_>, room: &RoomZone, report: &mut ComplianceReport) {
    if room.category() != RoomCategory::Bedroom {
        return;
    }
    if room.polygon.is_empty() {
        debug!(room = %room.id, "卧室没有多边形，跳过救援窗检查");
        return;
    }
    if snapshot.windows_of(room).iter().any(|window| is_rescue_window(window)) {
        return;
    }
    report.push(
        ComplianceIssue::new(
            codes::RESCUE_WINDOW,
            Severity::Critical,
            format!(
                "{label}: mangler redningsåbning (højde + bredde ≥ 1,50 m, brystning ≤ 1,20 m) / \
                 {label}: no rescue window (height + width ≥ 1.50 m, sill ≤ 1.20 m)",
                label = room.label
            ),
        )
        .on(&room.id),
    );
}

fn check_bathroom_turning(room: &RoomZone, report: &mut ComplianceReport) {
    if room.category() != RoomCategory::Bathroom {
        return;
    }
    let too_small = room.area.value < TURNING_MIN_AREA
        || (!room.polygon.is_empty() && {
            let bounds: Bounds2D = room.polygon.iter().copied().collect();
            bounds.width().min(bounds.height()) < TURNING_DIAMETER
        });
    if too_small {
        report.push(
            ComplianceIssue::new(
                codes::BATH_TURNING,
                Severity::Major,
                format!(
                    "{label}: plads til en vendecirkel på 1,50 m mangler / \
                     {label}: no room for a 1.50 m turning circle",
                    label = room.label
                ),
            )
            .on(&room.id),
        );
    }
}

fn check_corridor(room: &RoomZone, report: &mut ComplianceReport) {
    if room.category() != RoomCategory::Corridor || room.polygon.is_empty() {
        return;
    }
    let bounds: Bounds2D = room.polygon.iter().copied().collect();
    let width = bounds.width().min(bounds.height());
    if width < MIN_CORRIDOR_WIDTH {
        report.push(
            ComplianceIssue::new(
                codes::CORRIDOR_WIDTH,
                Severity::Major,
                format!(
                    "{label}: gangbredde {width:.2} m er under 1,00 m / \
                     {label}: corridor width {width:.2} m is below 1.00 m",
                    label = room.label
                ),
            )
            .on(&room.id),
        );
    }
}

fn check_technical(room: &RoomZone, report: &mut ComplianceReport) {
    if room.category() != RoomCategory::Technical {
        return;
    }
    let area = if room.polygon.is_empty() {
        room.area.value
    } else {
        polygon_area(&room.polygon)
    };
    if area < MIN_TECH_ROOM_AREA {
        report.push(
            ComplianceIssue::new(
                codes::TECH_ROOM,
                Severity::Minor,
                format!(
                    "{label}: teknikrum på {area:.1} m² er under anbefalet 4 m² / \
                     {label}: technical room of {area:.1} m² is below the recommended 4 m²",
                    label = room.label
                ),
            )
            .on(&room.id),
        );
    }
}

fn check_egress(snapshot: &PlanSnapshot<'_>, report: &mut ComplianceReport) {
    let rooms = &snapshot.sheet.elements.rooms;
    if rooms.is_empty() {
        return;
    }
    let exits: Vec<Point2> = snapshot.plan.exits().map(|exit| exit.center).collect();
    if exits.is_empty() {
        report.push(ComplianceIssue::new(
            codes::EGRESS_NO_EXIT,
            Severity::Critical,
            "Planen har ingen udgangsdør i ydervæggen / The plan has no exit door in an exterior wall",
        ));
        return;
    }

    for room in rooms {
        let distance = exits
            .iter()
            .map(|exit| room.center.distance_to(*exit))
            .fold(f64::INFINITY, f64::min);
        let bedroom = room.category() == RoomCategory::Bedroom;
        let (code, limit) = if bedroom {
            (codes::EGRESS_BEDROOM, EGRESS_BEDROOM_MAX)
        } else {
            (codes::EGRESS_ROOM, EGRESS_ROOM_MAX)
        };
        if distance > limit {
            report.push(
                ComplianceIssue::new(
                    code,
                    Severity::Major,
                    format!(
                        "{label}: {distance:.1} m til nærmeste udgang, maksimum er {limit:.0} m / \
                         {label}: {distance:.1} m to the nearest exit, maximum is {limit:.0} m",
                        label = room.label
                    ),
                )
                .on(&room.id),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::evaluate;
    use crate::demo::demo_sheet;
    use crate::plan::{EngineSettings, resolve_sheet};
    use blueprint_core::model::{Area, Sheet};

    fn run(sheet: &Sheet) -> ComplianceReport {
        let plan = resolve_sheet(sheet, &EngineSettings::default()).unwrap();
        evaluate(&PlanSnapshot::new(sheet, &plan))
    }

    fn room_mut<'s>(sheet: &'s mut Sheet, id: &str) -> &'s mut RoomZone {
        sheet.elements.rooms.iter_mut().find(|room| room.id == id).unwrap()
    }

    #[test]
    fn demo_plan_is_compliant_and_stable() {
        let sheet = demo_sheet();
        let first = run(&sheet);
        assert!(first.violations.is_empty(), "{:#?}", first.violations);
        assert!(first.warnings.is_empty(), "{:#?}", first.warnings);
        assert_eq!(first, run(&sheet));
    }

    #[test]
    fn door_width_threshold_is_inclusive() {
        let mut sheet = demo_sheet();
        sheet.elements.openings[2].width = 0.77;
        assert!(!run(&sheet).has_code(codes::DOOR_WIDTH));
        sheet.elements.openings[2].width = 0.76;
        let report = run(&sheet);
        let issue = report.violations.iter().find(|i| i.code == codes::DOOR_WIDTH).unwrap();
        assert_eq!(issue.element_id.as_deref(), Some("d3"));
    }

    #[test]
    fn bathroom_ceiling_uses_secondary_minimum() {
        let mut sheet = demo_sheet();
        room_mut(&mut sheet, "r3").ceiling_height = Some(2.15);
        assert!(!run(&sheet).has_code(codes::CEILING_HEIGHT));
        room_mut(&mut sheet, "r2").ceiling_height = Some(2.25);
        let report = run(&sheet);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].element_id.as_deref(), Some("r2"));
    }

    #[test]
    fn daylight_counts_adjacent_windows_and_honours_override() {
        let mut sheet = demo_sheet();
        sheet.elements.openings.retain(|opening| opening.id != "v3");
        let report = run(&sheet);
        let rooms: Vec<_> = report
            .violations
            .iter()
            .filter(|issue| issue.code == codes::DAYLIGHT || issue.code == codes::RESCUE_WINDOW)
            .map(|issue| (issue.code, issue.element_id.clone().unwrap()))
            .collect();
        assert_eq!(
            rooms,
            [(codes::DAYLIGHT, "r2".to_string()), (codes::RESCUE_WINDOW, "r2".to_string())]
        );

        room_mut(&mut sheet, "r2").natural_light_area = Some(3.0);
        assert!(!run(&sheet).has_code(codes::DAYLIGHT));
    }

    #[test]
    fn high_sill_disqualifies_rescue_window() {
        let mut sheet = demo_sheet();
        let v4 = sheet.elements.openings.iter_mut().find(|o| o.id == "v4").unwrap();
        v4.sill_height = Some(1.25);
        let report = run(&sheet);
        assert!(report.violations.iter().any(|issue| issue.code == codes::RESCUE_WINDOW
            && issue.severity == Severity::Critical
            && issue.element_id.as_deref() == Some("r4")));

        room_mut(&mut sheet, "r4").polygon.clear();
        let report = run(&sheet);
        assert!(!report.has_code(codes::RESCUE_WINDOW));
        assert!(!report.has_code(codes::DAYLIGHT));
    }

    #[test]
    fn no_exterior_door_is_critical() {
        let mut sheet = demo_sheet();
        sheet.elements.openings.retain(|opening| opening.id != "d1");
        let report = run(&sheet);
        assert!(report.has_code(codes::EGRESS_NO_EXIT));
        assert!(!report.is_compliant());
    }

    #[test]
    fn small_rooms_are_flagged_by_category() {
        let mut sheet = demo_sheet();
        {
            let bath = room_mut(&mut sheet, "r3");
            bath.area = Area::square_meters(2.0);
            bath.polygon.clear();
        }
        {
            let store = room_mut(&mut sheet, "r4");
            store.room_type = "teknik".into();
            store.label = "Teknikrum".into();
            store.polygon.clear();
            store.area = Area::square_meters(3.0);
        }
        let report = run(&sheet);
        assert!(report.has_code(codes::BATH_TURNING));
        let tech = report.warnings.iter().find(|i| i.code == codes::TECH_ROOM).unwrap();
        assert_eq!(tech.severity, Severity::Minor);
    }

    #[test]
    fn narrow_corridor_is_major() {
        let mut sheet = demo_sheet();
        let hall = room_mut(&mut sheet, "r4");
        hall.room_type = "gang".into();
        hall.polygon = vec![
            Point2::new(9.0, 4.0),
            Point2::new(12.0, 4.0),
            Point2::new(12.0, 4.9),
            Point2::new(9.0, 4.9),
        ];
        hall.center = Point2::new(10.5, 4.45);
        let report = run(&sheet);
        assert!(report.violations.iter().any(|i| i.code == codes::CORRIDOR_WIDTH));
    }

    /// 把房间移到距唯一出口 `offset` 米处；去掉多边形以免中心落在多边形外。
    fn move_away_from_exit(sheet: &mut Sheet, id: &str, offset: f64) {
        let plan = resolve_sheet(sheet, &EngineSettings::default()).unwrap();
        let exit = plan.exits().next().unwrap().center;
        let room = room_mut(sheet, id);
        room.polygon.clear();
        room.center = Point2::new(exit.x() + offset, exit.y());
    }

    #[test]
    fn bedroom_egress_limit_is_fifteen_metres() {
        let mut sheet = demo_sheet();
        move_away_from_exit(&mut sheet, "r2", 15.0);
        assert!(!run(&sheet).has_code(codes::EGRESS_BEDROOM));

        move_away_from_exit(&mut sheet, "r2", 15.1);
        let report = run(&sheet);
        let issue = report
            .violations
            .iter()
            .find(|i| i.code == codes::EGRESS_BEDROOM)
            .unwrap();
        assert_eq!(issue.element_id.as_deref(), Some("r2"));
        assert_eq!(issue.severity, Severity::Major);
        assert!(!report.has_code(codes::EGRESS_ROOM));
    }

    #[test]
    fn other_rooms_may_reach_twenty_five_metres() {
        let mut sheet = demo_sheet();
        move_away_from_exit(&mut sheet, "r1", 20.0);
        assert!(!run(&sheet).has_code(codes::EGRESS_ROOM));

        move_away_from_exit(&mut sheet, "r1", 25.5);
        let report = run(&sheet);
        let issue = report
            .violations
            .iter()
            .find(|i| i.code == codes::EGRESS_ROOM)
            .unwrap();
        assert_eq!(issue.element_id.as_deref(), Some("r1"));
        assert!(!report.has_code(codes::EGRESS_BEDROOM));
    }

    #[test]
    fn oversized_plan_only_warns() {
        let mut sheet = demo_sheet();
        // 两卧一卫的合理上限为 195 m²
        sheet.metadata.total_area = 200.0;
        let report = run(&sheet);
        let issue = report.warnings.iter().find(|i| i.code == codes::AREA_MAX).unwrap();
        assert_eq!(issue.severity, Severity::Minor);
        assert!(report.violations.is_empty(), "{:#?}", report.violations);
        assert!(report.is_compliant());
    }

    #[test]
    fn too_many_bathrooms_only_warns() {
        let mut sheet = demo_sheet();
        for id in ["r2", "r4"] {
            let room = room_mut(&mut sheet, id);
            room.room_type = "bathroom".into();
            room.label = "Bad".into();
        }
        let report = run(&sheet);
        assert!(report.warnings.iter().any(|i| i.code == codes::BATH_RATIO));
        assert!(!report.violations.iter().any(|i| i.code == codes::BATH_RATIO));
        assert!(report.is_compliant(), "{:#?}", report.violations);
    }

    #[test]
    fn undersized_plan_fails_area_minimum() {
        let mut sheet = demo_sheet();
        sheet.metadata.total_area = 60.0;
        let report = run(&sheet);
        assert!(report.violations.iter().any(|i| i.code == codes::AREA_MIN));
    }
}
