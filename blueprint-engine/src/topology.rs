//! 由无序墙段重建外墙闭合环与内墙连通关系。

use blueprint_core::geometry::{Point2, polygon_signed_area};
use blueprint_core::model::WallSegment;
use serde::Serialize;
use tracing::debug;

/// 端点匹配的默认容差（米）。
pub const DEFAULT_TOLERANCE: f64 = 0.05;

/// 连通关系中代表“任一外墙”的标记。
pub const EXTERIOR_TOKEN: &str = "exterior";

/// 环中的一段外墙，`reversed` 表示相对录入方向被翻转。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopSegment {
    pub wall_id: String,
    pub start: Point2,
    pub end: Point2,
    pub reversed: bool,
}

impl LoopSegment {
    #[inline]
    pub fn length(&self) -> f64 {
        self.start.distance_to(self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopStatus {
    /// 全部外墙已使用且首尾相接。
    Closed,
    /// 链在某处断开或首尾不闭合，仅保留已拼接的前缀。
    Open,
    /// 没有任何外墙，以单位正方形占位。
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExteriorLoop {
    segments: Vec<LoopSegment>,
    status: LoopStatus,
    unplaced: Vec<String>,
}

impl ExteriorLoop {
    fn placeholder() -> Self {
        Self {
            segments: Vec::new(),
            status: LoopStatus::Placeholder,
            unplaced: Vec::new(),
        }
    }

    #[inline]
    pub fn segments(&self) -> &[LoopSegment] {
        &self.segments
    }

    #[inline]
    pub fn status(&self) -> LoopStatus {
        self.status
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.status == LoopStatus::Closed
    }

    /// 未能接入环的外墙 id（按录入顺序）。
    #[inline]
    pub fn unplaced(&self) -> &[String] {
        &self.unplaced
    }

    /// 环顶点序列。闭合环不重复首点；开放链包含末端点；占位为单位正方形。
    pub fn vertices(&self) -> Vec<Point2> {
        if self.status == LoopStatus::Placeholder {
            return vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(0.0, 1.0),
            ];
        }
        let mut vertices: Vec<Point2> = self.segments.iter().map(|segment| segment.start).collect();
        if self.status == LoopStatus::Open {
            if let Some(last) = self.segments.last() {
                vertices.push(last.end);
            }
        }
        vertices
    }

    /// 沿环的总长度。
    pub fn perimeter(&self) -> f64 {
        self.segments.iter().map(LoopSegment::length).sum()
    }

    /// 外墙在环中的位置：(索引, 该段之前的累计长度)。
    pub fn locate(&self, wall_id: &str) -> Option<(usize, f64)> {
        let mut offset = 0.0;
        for (index, segment) in self.segments.iter().enumerate() {
            if segment.wall_id == wall_id {
                return Some((index, offset));
            }
            offset += segment.length();
        }
        None
    }

    /// 闭合环的有向面积；y 向下坐标系中顺时针为正。
    pub fn signed_area(&self) -> f64 {
        polygon_signed_area(&self.vertices())
    }
}

/// 将标记为外墙的墙段拼成有序环。
///
/// 从第一段外墙开始，依次寻找起点与链尾重合的未用墙段；若没有，再尝试以
/// 终点匹配并翻转该墙段。多个候选时取录入顺序中的第一个。找不到匹配时提前
/// 结束，返回已拼接的前缀。
pub fn reconstruct_exterior(walls: &[WallSegment], tolerance: f64) -> ExteriorLoop {
    let exterior: Vec<&WallSegment> = walls.iter().filter(|wall| wall.is_external).collect();
    let Some(first) = exterior.first() else {
        debug!("没有外墙，使用占位边界");
        return ExteriorLoop::placeholder();
    };

    let mut placed = vec![false; exterior.len()];
    placed[0] = true;
    let mut segments = vec![LoopSegment {
        wall_id: first.id.clone(),
        start: first.start,
        end: first.end,
        reversed: false,
    }];

    while segments.len() < exterior.len() {
        let tail = segments[segments.len() - 1].end;
        let forward = exterior
            .iter()
            .enumerate()
            .find(|(index, wall)| !placed[*index] && wall.start.coincides(tail, tolerance));
        let next = match forward {
            Some((index, wall)) => Some((index, wall.start, wall.end, false)),
            None => exterior
                .iter()
                .enumerate()
                .find(|(index, wall)| !placed[*index] && wall.end.coincides(tail, tolerance))
                .map(|(index, wall)| (index, wall.end, wall.start, true)),
        };
        let Some((index, start, end, reversed)) = next else {
            break;
        };
        placed[index] = true;
        segments.push(LoopSegment {
            wall_id: exterior[index].id.clone(),
            start,
            end,
            reversed,
        });
    }

    let unplaced: Vec<String> = exterior
        .iter()
        .zip(&placed)
        .filter(|(_, used)| !**used)
        .map(|(wall, _)| wall.id.clone())
        .collect();
    let closes = segments[segments.len() - 1]
        .end
        .coincides(segments[0].start, tolerance);
    let status = if unplaced.is_empty() && closes {
        LoopStatus::Closed
    } else {
        LoopStatus::Open
    };

    debug!(
        placed = segments.len(),
        total = exterior.len(),
        status = ?status,
        "外墙环重建完成"
    );

    ExteriorLoop {
        segments,
        status,
        unplaced,
    }
}

/// 一段内墙与其他墙体的连接关系。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallConnection {
    pub wall_id: String,
    /// 相连的内墙 id，或 [`EXTERIOR_TOKEN`]；按扫描顺序去重。
    pub connects: Vec<String>,
}

/// 计算每段内墙的连接集合。仅识别端点与端点的重合，T 形接头不计入。
pub fn interior_connections(walls: &[WallSegment], tolerance: f64) -> Vec<WallConnection> {
    walls
        .iter()
        .filter(|wall| !wall.is_external)
        .map(|wall| {
            let mut connects: Vec<String> = Vec::new();
            for other in walls {
                if other.id == wall.id || !endpoints_touch(wall, other, tolerance) {
                    continue;
                }
                let label = if other.is_external {
                    EXTERIOR_TOKEN
                } else {
                    other.id.as_str()
                };
                if !connects.iter().any(|existing| existing == label) {
                    connects.push(label.to_string());
                }
            }
            WallConnection {
                wall_id: wall.id.clone(),
                connects,
            }
        })
        .collect()
}

fn endpoints_touch(a: &WallSegment, b: &WallSegment, tolerance: f64) -> bool {
    [a.start, a.end]
        .iter()
        .any(|point| point.coincides(b.start, tolerance) || point.coincides(b.end, tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_core::model::{Material, WallType};

    use crate::demo::demo_sheet;

    fn ext(id: &str, start: (f64, f64), end: (f64, f64)) -> WallSegment {
        WallSegment {
            id: id.to_string(),
            start: Point2::new(start.0, start.1),
            end: Point2::new(end.0, end.1),
            thickness: 0.3,
            wall_type: WallType::ExteriorInsulated,
            material: Material::Brick,
            is_external: true,
        }
    }

    fn square_walls() -> Vec<WallSegment> {
        vec![
            ext("a", (0.0, 0.0), (5.0, 0.0)),
            ext("b", (5.0, 0.0), (5.0, 4.0)),
            ext("c", (5.0, 4.0), (0.0, 4.0)),
            ext("d", (0.0, 4.0), (0.0, 0.0)),
        ]
    }

    /// 判断两个闭合顶点序列是否描述同一多边形（允许起点旋转与方向反转）。
    fn same_polygon(a: &[Point2], b: &[Point2]) -> bool {
        if a.len() != b.len() {
            return false;
        }
        let n = a.len();
        let matches = |reverse: bool, shift: usize| {
            (0..n).all(|i| {
                let j = if reverse { (shift + n - i) % n } else { (shift + i) % n };
                a[i].coincides(b[j], 1e-9)
            })
        };
        (0..n).any(|shift| matches(false, shift) || matches(true, shift))
    }

    #[test]
    fn ordered_square_closes() {
        let ring = reconstruct_exterior(&square_walls(), DEFAULT_TOLERANCE);
        assert!(ring.is_closed());
        assert_eq!(ring.segments().len(), 4);
        assert!(ring.unplaced().is_empty());
        assert!((ring.perimeter() - 18.0).abs() < 1e-9);
        assert!((ring.signed_area().abs() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn shuffled_and_reversed_walls_trace_same_polygon() {
        let reference = reconstruct_exterior(&square_walls(), DEFAULT_TOLERANCE).vertices();
        let orders: [[usize; 4]; 4] = [[2, 0, 3, 1], [3, 2, 1, 0], [1, 3, 0, 2], [0, 2, 1, 3]];
        for (round, order) in orders.iter().enumerate() {
            let mut walls: Vec<WallSegment> = order.iter().map(|&i| square_walls()[i].clone()).collect();
            // 每轮翻转不同的墙段
            for (k, wall) in walls.iter_mut().enumerate() {
                if (k + round) % 2 == 0 {
                    std::mem::swap(&mut wall.start, &mut wall.end);
                }
            }
            let ring = reconstruct_exterior(&walls, DEFAULT_TOLERANCE);
            assert!(ring.is_closed(), "round {round} should close");
            assert!(same_polygon(&reference, &ring.vertices()), "round {round}");
        }
    }

    #[test]
    fn endpoints_within_tolerance_are_joined() {
        let mut walls = square_walls();
        walls[1].start = Point2::new(5.03, 0.02);
        let ring = reconstruct_exterior(&walls, DEFAULT_TOLERANCE);
        assert!(ring.is_closed());

        let strict = reconstruct_exterior(&walls, 0.01);
        assert_eq!(strict.status(), LoopStatus::Open);
        assert_eq!(strict.segments().len(), 1);
        assert_eq!(strict.unplaced(), &["b".to_string(), "c".to_string(), "d".to_string()]);
    }

    #[test]
    fn gap_yields_open_prefix() {
        let mut walls = square_walls();
        walls.remove(2);
        let ring = reconstruct_exterior(&walls, DEFAULT_TOLERANCE);
        assert_eq!(ring.status(), LoopStatus::Open);
        assert_eq!(ring.segments().len(), 2);
        assert_eq!(ring.vertices().len(), 3);
        assert_eq!(ring.unplaced(), &["d".to_string()]);
    }

    #[test]
    fn no_exterior_walls_gives_unit_square() {
        let mut walls = square_walls();
        for wall in &mut walls {
            wall.is_external = false;
        }
        let ring = reconstruct_exterior(&walls, DEFAULT_TOLERANCE);
        assert_eq!(ring.status(), LoopStatus::Placeholder);
        assert_eq!(ring.vertices().len(), 4);
        assert!((ring.signed_area().abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn first_match_wins_on_branching_endpoint() {
        let walls = vec![
            ext("a", (0.0, 0.0), (2.0, 0.0)),
            ext("spur", (2.0, 0.0), (2.0, -3.0)),
            ext("b", (2.0, 0.0), (2.0, 2.0)),
        ];
        let ring = reconstruct_exterior(&walls, DEFAULT_TOLERANCE);
        assert_eq!(ring.segments()[1].wall_id, "spur");
        assert_eq!(ring.status(), LoopStatus::Open);
    }

    #[test]
    fn demo_loop_reverses_backwards_walls() {
        let sheet = demo_sheet();
        let ring = reconstruct_exterior(&sheet.elements.walls, DEFAULT_TOLERANCE);
        assert!(ring.is_closed());
        let ids: Vec<&str> = ring.segments().iter().map(|s| s.wall_id.as_str()).collect();
        assert_eq!(ids, ["e1", "e2", "e3", "e4", "e5", "e6", "e7", "e8"]);
        let reversed: Vec<bool> = ring.segments().iter().map(|s| s.reversed).collect();
        assert_eq!(reversed, [false, false, false, false, true, true, false, false]);
        assert_eq!(ring.locate("e3"), Some((2, 12.0)));
    }

    #[test]
    fn demo_interior_connections() {
        let sheet = demo_sheet();
        let connections = interior_connections(&sheet.elements.walls, DEFAULT_TOLERANCE);
        let lookup = |id: &str| {
            connections
                .iter()
                .find(|c| c.wall_id == id)
                .map(|c| c.connects.clone())
                .unwrap_or_default()
        };
        assert_eq!(connections.len(), 5);
        assert_eq!(lookup("i1"), ["exterior", "i2", "i3"]);
        assert_eq!(lookup("i2"), ["exterior", "i1", "i3"]);
        assert_eq!(lookup("i3"), ["i1", "i2", "i4", "i5"]);
        assert_eq!(lookup("i5"), ["exterior", "i3", "i4"]);
    }
}
