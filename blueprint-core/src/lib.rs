pub mod edit;
pub mod model;

pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 平面点（单位：米），y 轴向下为正，与平面图约定一致。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    #[serde(from = "PointRepr", into = "PointRepr")]
    pub struct Point2(pub DVec2);

    #[derive(Serialize, Deserialize)]
    struct PointRepr {
        x: f64,
        y: f64,
    }

    impl From<PointRepr> for Point2 {
        fn from(value: PointRepr) -> Self {
            Self::new(value.x, value.y)
        }
    }

    impl From<Point2> for PointRepr {
        fn from(value: Point2) -> Self {
            Self {
                x: value.x(),
                y: value.y(),
            }
        }
    }

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn vector_to(self, other: Point2) -> Vector2 {
            Vector2(other.0 - self.0)
        }

        #[inline]
        pub fn distance_to(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }

        #[inline]
        pub fn midpoint(self, other: Point2) -> Point2 {
            Self((self.0 + other.0) * 0.5)
        }

        /// 在线段 `self -> other` 上按参数 `t` 插值。
        #[inline]
        pub fn lerp(self, other: Point2, t: f64) -> Point2 {
            Self(self.0.lerp(other.0, t))
        }

        /// 容差内的点重合判断，拓扑重建依赖此函数。
        #[inline]
        pub fn coincides(self, other: Point2, tolerance: f64) -> bool {
            self.distance_to(other) <= tolerance
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 二维向量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_points(start: Point2, end: Point2) -> Self {
            Self(end.0 - start.0)
        }

        /// 由角度（弧度）构造单位向量。
        #[inline]
        pub fn from_angle(angle: f64) -> Self {
            Self(DVec2::new(angle.cos(), angle.sin()))
        }

        #[inline]
        pub fn length(self) -> f64 {
            self.0.length()
        }

        #[inline]
        pub fn length_squared(self) -> f64 {
            self.0.length_squared()
        }

        #[inline]
        pub fn normalize(self) -> Option<Self> {
            let len = self.0.length();
            if len <= f64::EPSILON {
                None
            } else {
                Some(Self(self.0 / len))
            }
        }

        /// 左手法向 `(-y, x)`，不做归一化。
        #[inline]
        pub fn perp(self) -> Self {
            Self(DVec2::new(-self.0.y, self.0.x))
        }

        #[inline]
        pub fn scale(self, factor: f64) -> Self {
            Self(self.0 * factor)
        }

        #[inline]
        pub fn dot(self, other: Vector2) -> f64 {
            self.0.dot(other.0)
        }

        /// 二维叉积（z 分量）。
        #[inline]
        pub fn cross(self, other: Vector2) -> f64 {
            self.0.perp_dot(other.0)
        }

        /// 方向角（弧度），范围 `(-π, π]`。
        #[inline]
        pub fn angle(self) -> f64 {
            self.0.y.atan2(self.0.x)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }
    }

    impl From<DVec2> for Vector2 {
        fn from(value: DVec2) -> Self {
            Self(value)
        }
    }

    /// 轴对齐边界框，用于估算图纸范围。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn width(&self) -> f64 {
            if self.is_empty() {
                0.0
            } else {
                self.max.x() - self.min.x()
            }
        }

        #[inline]
        pub fn height(&self) -> f64 {
            if self.is_empty() {
                0.0
            } else {
                self.max.y() - self.min.y()
            }
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        pub fn include_bounds(&mut self, other: &Bounds2D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }

        /// 各方向外扩 `amount`，空框保持为空。
        pub fn expanded(&self, amount: f64) -> Bounds2D {
            if self.is_empty() {
                return *self;
            }
            Bounds2D::new(
                Point2::new(self.min.x() - amount, self.min.y() - amount),
                Point2::new(self.max.x() + amount, self.max.y() + amount),
            )
        }

        #[inline]
        pub fn center(&self) -> Point2 {
            debug_assert!(!self.is_empty());
            let center = (self.min.as_vec2() + self.max.as_vec2()) * 0.5;
            Point2::from_vec(center)
        }
    }

    impl FromIterator<Point2> for Bounds2D {
        fn from_iter<T: IntoIterator<Item = Point2>>(iter: T) -> Self {
            let mut bounds = Bounds2D::empty();
            for point in iter {
                bounds.include_point(point);
            }
            bounds
        }
    }

    /// 将中心线按垂直单位向量向两侧偏移 `half_width`，得到墙体矩形四角。
    ///
    /// 顶点顺序：起点左侧、终点左侧、终点右侧、起点右侧。轮廓线与填充边界
    /// 必须共用此函数。退化线段返回 `None`。
    pub fn offset_segment(start: Point2, end: Point2, half_width: f64) -> Option<[Point2; 4]> {
        let normal = Vector2::from_points(start, end).normalize()?.perp();
        let offset = normal.scale(half_width);
        let back = offset.scale(-1.0);
        Some([
            start.translate(offset),
            end.translate(offset),
            end.translate(back),
            start.translate(back),
        ])
    }

    /// 点到线段的最短距离。
    pub fn distance_to_segment(point: Point2, start: Point2, end: Point2) -> f64 {
        let segment = Vector2::from_points(start, end);
        let len_sq = segment.length_squared();
        if len_sq <= f64::EPSILON {
            return point.distance_to(start);
        }
        let t = (Vector2::from_points(start, point).dot(segment) / len_sq).clamp(0.0, 1.0);
        point.distance_to(start.lerp(end, t))
    }

    /// 判定两条线段是否真正相交（端点接触不算）。
    pub fn segments_cross(a1: Point2, a2: Point2, b1: Point2, b2: Point2) -> bool {
        let d1 = Vector2::from_points(b1, b2).cross(Vector2::from_points(b1, a1));
        let d2 = Vector2::from_points(b1, b2).cross(Vector2::from_points(b1, a2));
        let d3 = Vector2::from_points(a1, a2).cross(Vector2::from_points(a1, b1));
        let d4 = Vector2::from_points(a1, a2).cross(Vector2::from_points(a1, b2));
        ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
            && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    }

    /// 多边形有向面积（鞋带公式），隐式闭合。
    pub fn polygon_signed_area(vertices: &[Point2]) -> f64 {
        if vertices.len() < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for (index, current) in vertices.iter().enumerate() {
            let next = vertices[(index + 1) % vertices.len()];
            sum += current.x() * next.y() - next.x() * current.y();
        }
        sum * 0.5
    }

    #[inline]
    pub fn polygon_area(vertices: &[Point2]) -> f64 {
        polygon_signed_area(vertices).abs()
    }

    /// 射线法判断点是否位于多边形内部。
    pub fn polygon_contains(vertices: &[Point2], point: Point2) -> bool {
        if vertices.len() < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = vertices.len() - 1;
        for i in 0..vertices.len() {
            let (pi, pj) = (vertices[i], vertices[j]);
            if (pi.y() > point.y()) != (pj.y() > point.y()) {
                let x_cross = (pj.x() - pi.x()) * (point.y() - pi.y()) / (pj.y() - pi.y()) + pi.x();
                if point.x() < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// 简单多边形：至少三个顶点、非零面积且非相邻边互不相交。
    pub fn polygon_is_simple(vertices: &[Point2]) -> bool {
        let count = vertices.len();
        if count < 3 || polygon_area(vertices) <= f64::EPSILON {
            return false;
        }
        for i in 0..count {
            let (a1, a2) = (vertices[i], vertices[(i + 1) % count]);
            for j in (i + 1)..count {
                let adjacent = j == i + 1 || (i == 0 && j == count - 1);
                if adjacent {
                    continue;
                }
                let (b1, b2) = (vertices[j], vertices[(j + 1) % count]);
                if segments_cross(a1, a2, b1, b2) {
                    return false;
                }
            }
        }
        true
    }

    /// 点到多边形边界的最短距离。
    pub fn distance_to_polygon_boundary(vertices: &[Point2], point: Point2) -> f64 {
        let count = vertices.len();
        (0..count)
            .map(|i| distance_to_segment(point, vertices[i], vertices[(i + 1) % count]))
            .fold(f64::INFINITY, f64::min)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn square(size: f64) -> Vec<Point2> {
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(size, 0.0),
                Point2::new(size, size),
                Point2::new(0.0, size),
            ]
        }

        #[test]
        fn offset_segment_builds_rectangle_around_centerline() {
            let corners = offset_segment(Point2::new(0.0, 0.0), Point2::new(4.0, 0.0), 0.15)
                .expect("non-degenerate wall");
            assert!((corners[0].y() - 0.15).abs() < 1e-12);
            assert!((corners[1].x() - 4.0).abs() < 1e-12);
            assert!((corners[2].y() + 0.15).abs() < 1e-12);
            assert!((polygon_area(&corners) - 4.0 * 0.3).abs() < 1e-9);

            assert!(offset_segment(Point2::new(1.0, 1.0), Point2::new(1.0, 1.0), 0.1).is_none());
        }

        #[test]
        fn polygon_helpers_agree_on_square() {
            let poly = square(3.0);
            assert!((polygon_area(&poly) - 9.0).abs() < 1e-12);
            assert!(polygon_contains(&poly, Point2::new(1.5, 1.5)));
            assert!(!polygon_contains(&poly, Point2::new(4.0, 1.5)));
            assert!(polygon_is_simple(&poly));
            assert!((distance_to_polygon_boundary(&poly, Point2::new(1.5, 1.0)) - 1.0).abs() < 1e-12);
        }

        #[test]
        fn bow_tie_is_not_simple() {
            let bow_tie = vec![
                Point2::new(0.0, 0.0),
                Point2::new(2.0, 2.0),
                Point2::new(2.0, 0.0),
                Point2::new(0.0, 2.0),
            ];
            assert!(!polygon_is_simple(&bow_tie));
        }

        #[test]
        fn distance_to_segment_clamps_to_endpoints() {
            let a = Point2::new(0.0, 0.0);
            let b = Point2::new(2.0, 0.0);
            assert!((distance_to_segment(Point2::new(1.0, 3.0), a, b) - 3.0).abs() < 1e-12);
            assert!((distance_to_segment(Point2::new(5.0, 4.0), a, b) - 5.0).abs() < 1e-12);
        }

        #[test]
        fn point_serializes_as_xy_object() {
            let json = serde_json::to_string(&Point2::new(1.5, -2.0)).unwrap();
            assert_eq!(json, r#"{"x":1.5,"y":-2.0}"#);
            let back: Point2 = serde_json::from_str(r#"{"x":3,"y":4}"#).unwrap();
            assert_eq!(back, Point2::new(3.0, 4.0));
        }

        #[test]
        fn bounds_collects_points() {
            let bounds: Bounds2D = square(2.0).into_iter().collect();
            assert_eq!(bounds.width(), 2.0);
            assert_eq!(bounds.center(), Point2::new(1.0, 1.0));
            let grown = bounds.expanded(1.0);
            assert_eq!(grown.min(), Point2::new(-1.0, -1.0));
            assert!(Bounds2D::empty().expanded(5.0).is_empty());
        }
    }
}

pub mod errors {
    use thiserror::Error;

    /// 数据模型层的契约错误：调用方传入了不满足不变量的数据。
    #[derive(Debug, Error, PartialEq)]
    pub enum ModelError {
        #[error("duplicate element id `{0}`")]
        DuplicateId(String),
        #[error("wall `{0}` has coincident start and end points")]
        DegenerateWall(String),
        #[error("wall `{id}` has non-positive thickness {thickness}")]
        InvalidThickness { id: String, thickness: f64 },
        #[error("room `{id}` has a malformed polygon: {reason}")]
        MalformedPolygon { id: String, reason: String },
        #[error("element `{0}` not found")]
        ElementNotFound(String),
        #[error("opening `{id}` does not fit on wall `{wall_id}` ({required:.3} m > {available:.3} m)")]
        OpeningDoesNotFit {
            id: String,
            wall_id: String,
            required: f64,
            available: f64,
        },
        #[error("invalid value for `{field}`: {value}")]
        InvalidValue { field: &'static str, value: f64 },
    }
}
