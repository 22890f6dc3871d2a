//! 洞口参数化：由宿主墙与 `distFromStart` 求出绝对位置、朝向与开启几何。
//!
//! 开启几何只由 `(swing, swingDirection)` 推导，从不保存绝对角度，因此修改墙厚
//! 等属性不会使洞口失效。

use blueprint_core::geometry::{Point2, Vector2, offset_segment};
use blueprint_core::model::{Opening, OpeningType, Swing, SwingDirection, WallSegment};
use serde::Serialize;

/// 推拉门/法式门单扇宽度占洞口宽度的比例。
pub const PANEL_RATIO: f64 = 0.55;

const CLAMP_EPSILON: f64 = 1e-9;

/// 摆动弧线，在平面坐标中从 `start_angle` 逆时针扫到 `end_angle`（弧度）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwingArc {
    pub center: Point2,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

/// 单扇门：铰链点、门扇长度、关闭方向（沿墙指向另一侧门框）与开启方向（垂直于墙）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoorLeaf {
    pub hinge: Point2,
    pub radius: f64,
    pub closed_direction: Vector2,
    pub open_direction: Vector2,
}

impl DoorLeaf {
    /// 门扇完全打开时的端点。
    pub fn open_tip(&self) -> Point2 {
        self.hinge.translate(self.open_direction.scale(self.radius))
    }

    pub fn closed_tip(&self) -> Point2 {
        self.hinge.translate(self.closed_direction.scale(self.radius))
    }

    pub fn arc(&self) -> SwingArc {
        let closed = self.closed_direction.angle();
        let open = self.open_direction.angle();
        let (start_angle, end_angle) = if self.closed_direction.cross(self.open_direction) > 0.0 {
            (closed, open)
        } else {
            (open, closed)
        };
        SwingArc {
            center: self.hinge,
            radius: self.radius,
            start_angle,
            end_angle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlidingPanel {
    pub start: Point2,
    pub end: Point2,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OpeningGeometry {
    Hinged { leaves: Vec<DoorLeaf> },
    Panels { panels: [SlidingPanel; 2] },
    Window,
}

/// 解析后的洞口，所有坐标均为平面坐标。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedOpening {
    pub opening_id: String,
    pub wall_id: String,
    pub opening_type: OpeningType,
    pub tag: String,
    /// 洞口在墙上的起点（`distFromStart` 处）。
    pub start: Point2,
    pub end: Point2,
    pub center: Point2,
    /// `distFromStart / wallLength`，限制在 `[0, 1]`。
    pub t: f64,
    /// 宿主墙方向角（弧度）。
    pub angle: f64,
    pub width: f64,
    pub height: f64,
    pub sill_height: Option<f64>,
    pub wall_thickness: f64,
    pub wall_length: f64,
    pub dist_from_start: f64,
    pub clamped: bool,
    pub on_exterior: bool,
    pub geometry: OpeningGeometry,
}

impl ResolvedOpening {
    #[inline]
    pub fn is_door(&self) -> bool {
        self.opening_type.is_door()
    }

    #[inline]
    pub fn is_window(&self) -> bool {
        self.opening_type == OpeningType::Window
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// 洞口在墙体上的切口矩形，与墙体轮廓共用同一偏移计算。
    pub fn cut_outline(&self) -> Option<[Point2; 4]> {
        offset_segment(self.start, self.end, self.wall_thickness * 0.5)
    }
}

/// 解析单个洞口。宿主墙退化时返回 `None`。
///
/// `distFromStart` 被限制到 `[0, max(0, L − width)]`；洞口宽于墙体时宽度同时
/// 截断为墙长，两种情况都将 `clamped` 置位。
pub fn resolve_opening(opening: &Opening, wall: &WallSegment) -> Option<ResolvedOpening> {
    let direction = wall.direction()?;
    let length = wall.length();

    let width = opening.width.min(length);
    let max_dist = (length - width).max(0.0);
    let dist = opening.dist_from_start.clamp(0.0, max_dist);
    let clamped = (dist - opening.dist_from_start).abs() > CLAMP_EPSILON
        || (width - opening.width).abs() > CLAMP_EPSILON;

    let start = wall.start.translate(direction.scale(dist));
    let end = start.translate(direction.scale(width));
    let center = start.midpoint(end);
    let t = (dist / length).clamp(0.0, 1.0);

    let geometry = build_geometry(opening, direction, start, end, width, wall.thickness);

    Some(ResolvedOpening {
        opening_id: opening.id.clone(),
        wall_id: wall.id.clone(),
        opening_type: opening.opening_type,
        tag: opening.display_tag().to_string(),
        start,
        end,
        center,
        t,
        angle: direction.angle(),
        width,
        height: opening.height,
        sill_height: opening.sill_height,
        wall_thickness: wall.thickness,
        wall_length: length,
        dist_from_start: dist,
        clamped,
        on_exterior: wall.is_external,
        geometry,
    })
}

fn build_geometry(
    opening: &Opening,
    direction: Vector2,
    start: Point2,
    end: Point2,
    width: f64,
    thickness: f64,
) -> OpeningGeometry {
    let left = direction.perp();
    let side = match opening.swing_direction {
        SwingDirection::Inward => left,
        SwingDirection::Outward => left.scale(-1.0),
    };
    let backwards = direction.scale(-1.0);

    match opening.opening_type {
        OpeningType::Door => {
            let leaf = match opening.swing {
                Swing::Right => DoorLeaf {
                    hinge: end,
                    radius: width,
                    closed_direction: backwards,
                    open_direction: side,
                },
                Swing::Left | Swing::None => DoorLeaf {
                    hinge: start,
                    radius: width,
                    closed_direction: direction,
                    open_direction: side,
                },
            };
            OpeningGeometry::Hinged { leaves: vec![leaf] }
        }
        OpeningType::DoubleDoor => {
            let radius = width * 0.5;
            OpeningGeometry::Hinged {
                leaves: vec![
                    DoorLeaf {
                        hinge: start,
                        radius,
                        closed_direction: direction,
                        open_direction: side,
                    },
                    DoorLeaf {
                        hinge: end,
                        radius,
                        closed_direction: backwards,
                        open_direction: side,
                    },
                ],
            }
        }
        OpeningType::SlidingDoor | OpeningType::FrenchDoor => {
            let panel = width * PANEL_RATIO;
            let shift = left.scale(thickness * 0.25);
            let back_shift = shift.scale(-1.0);
            OpeningGeometry::Panels {
                panels: [
                    SlidingPanel {
                        start: start.translate(shift),
                        end: start.translate(direction.scale(panel)).translate(shift),
                    },
                    SlidingPanel {
                        start: end.translate(backwards.scale(panel)).translate(back_shift),
                        end: end.translate(back_shift),
                    },
                ],
            }
        }
        OpeningType::Window => OpeningGeometry::Window,
    }
}
