use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::geometry::{Point2, Vector2, polygon_contains, polygon_is_simple};

const LENGTH_EPSILON: f64 = 1e-9;

/// 墙体类型，序列化为大写下划线形式（如 `EXTERIOR_INSULATED`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WallType {
    ExteriorInsulated,
    LoadBearing,
    InteriorPartition,
    FireRated,
}

impl WallType {
    /// 承重或防火墙在导出视图中视为结构构件。
    #[inline]
    pub fn is_structural(self) -> bool {
        matches!(self, WallType::LoadBearing | WallType::FireRated)
    }
}

/// 墙体材料。无法识别的标记保存在 `Unknown` 中原样写回，导出时不生成填充。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Material {
    Brick,
    Concrete,
    Insulation,
    Gasbeton,
    Timber,
    GypsumBoard,
    Clt,
    SteelStud,
    VaporBarrier,
    Unknown(String),
}

impl Material {
    pub const KNOWN: [Material; 9] = [
        Material::Brick,
        Material::Concrete,
        Material::Insulation,
        Material::Gasbeton,
        Material::Timber,
        Material::GypsumBoard,
        Material::Clt,
        Material::SteelStud,
        Material::VaporBarrier,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Material::Brick => "brick",
            Material::Concrete => "concrete",
            Material::Insulation => "insulation",
            Material::Gasbeton => "gasbeton",
            Material::Timber => "timber",
            Material::GypsumBoard => "gypsum-board",
            Material::Clt => "CLT",
            Material::SteelStud => "steel-stud",
            Material::VaporBarrier => "vapor-barrier",
            Material::Unknown(token) => token,
        }
    }

    #[inline]
    pub fn is_known(&self) -> bool {
        !matches!(self, Material::Unknown(_))
    }
}

impl From<&str> for Material {
    fn from(token: &str) -> Self {
        Material::KNOWN
            .into_iter()
            .find(|material| material.as_str() == token)
            .unwrap_or_else(|| Material::Unknown(token.to_string()))
    }
}

impl From<String> for Material {
    fn from(token: String) -> Self {
        Material::from(token.as_str())
    }
}

impl From<Material> for String {
    fn from(material: Material) -> Self {
        match material {
            Material::Unknown(token) => token,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallSegment {
    pub id: String,
    pub start: Point2,
    pub end: Point2,
    pub thickness: f64,
    #[serde(rename = "type")]
    pub wall_type: WallType,
    pub material: Material,
    #[serde(default)]
    pub is_external: bool,
}

impl WallSegment {
    #[inline]
    pub fn length(&self) -> f64 {
        self.start.distance_to(self.end)
    }

    /// 单位方向向量；退化墙体返回 `None`。
    #[inline]
    pub fn direction(&self) -> Option<Vector2> {
        Vector2::from_points(self.start, self.end).normalize()
    }

    /// 墙体方向角（弧度）。
    #[inline]
    pub fn angle(&self) -> f64 {
        Vector2::from_points(self.start, self.end).angle()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpeningType {
    Door,
    DoubleDoor,
    SlidingDoor,
    FrenchDoor,
    Window,
}

impl OpeningType {
    /// 门类洞口（可作为出口）。
    #[inline]
    pub fn is_door(self) -> bool {
        !matches!(self, OpeningType::Window)
    }

    /// 铰链开启、带摆动弧线的洞口。
    #[inline]
    pub fn is_hinged(self) -> bool {
        matches!(self, OpeningType::Door | OpeningType::DoubleDoor)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OpeningType::Door => "door",
            OpeningType::DoubleDoor => "double-door",
            OpeningType::SlidingDoor => "sliding-door",
            OpeningType::FrenchDoor => "french-door",
            OpeningType::Window => "window",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Swing {
    #[default]
    Left,
    Right,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwingDirection {
    #[default]
    Inward,
    Outward,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opening {
    pub id: String,
    pub wall_id: String,
    #[serde(rename = "type")]
    pub opening_type: OpeningType,
    pub width: f64,
    #[serde(default = "Opening::default_height")]
    pub height: f64,
    pub dist_from_start: f64,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub swing: Swing,
    #[serde(default)]
    pub swing_direction: SwingDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sill_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_height: Option<f64>,
}

impl Opening {
    pub const DEFAULT_DOOR_HEIGHT: f64 = 2.1;

    fn default_height() -> f64 {
        Self::DEFAULT_DOOR_HEIGHT
    }

    /// `0 ≤ distFromStart` 且 `distFromStart + width ≤ wallLength`。
    pub fn fits_on(&self, wall_length: f64) -> bool {
        self.dist_from_start >= -LENGTH_EPSILON
            && self.dist_from_start + self.width <= wall_length + LENGTH_EPSILON
    }

    /// 洞口净面积（宽 × 高）。
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// 显示标签，缺省时退化为 id。
    pub fn display_tag(&self) -> &str {
        if self.tag.is_empty() { &self.id } else { &self.tag }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub value: f64,
    #[serde(default = "Area::default_unit")]
    pub unit: String,
}

impl Area {
    fn default_unit() -> String {
        "m²".to_string()
    }

    pub fn square_meters(value: f64) -> Self {
        Self {
            value,
            unit: Self::default_unit(),
        }
    }
}

/// 自由文本房间类型归类后的封闭枚举，规则引擎按此分派。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoomCategory {
    Bedroom,
    Bathroom,
    Kitchen,
    Living,
    Corridor,
    Storage,
    Technical,
    Other,
}

impl RoomCategory {
    /// 同时识别丹麦语与英语的房间类型写法。
    pub fn classify(raw: &str) -> Self {
        let text = raw.trim().to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|needle| text.contains(needle));
        if has(&["bath", "bad", "wc", "toilet"]) {
            RoomCategory::Bathroom
        } else if has(&["bed", "sove", "værelse", "vaerelse"]) {
            RoomCategory::Bedroom
        } else if has(&["kitchen", "køkken", "koekken"]) {
            RoomCategory::Kitchen
        } else if has(&["living", "stue", "alrum", "dining", "spise"]) {
            RoomCategory::Living
        } else if has(&["corridor", "hall", "gang", "entré", "entre", "entry"]) {
            RoomCategory::Corridor
        } else if has(&["technical", "teknik", "utility", "bryggers"]) {
            RoomCategory::Technical
        } else if has(&["storage", "depot", "closet", "garderobe"]) {
            RoomCategory::Storage
        } else {
            RoomCategory::Other
        }
    }

    /// 可居住房间（适用 2.30 m 净高要求）。
    #[inline]
    pub fn is_habitable(self) -> bool {
        matches!(
            self,
            RoomCategory::Bedroom | RoomCategory::Kitchen | RoomCategory::Living | RoomCategory::Other
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomZone {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub room_type: String,
    pub area: Area,
    #[serde(default)]
    pub flooring: String,
    pub center: Point2,
    #[serde(default)]
    pub polygon: Vec<Point2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ceiling_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural_light_area: Option<f64>,
    #[serde(default)]
    pub compliant: bool,
}

impl RoomZone {
    #[inline]
    pub fn category(&self) -> RoomCategory {
        RoomCategory::classify(&self.room_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FurnitureKind {
    Bed,
    Sofa,
    Table,
    Wardrobe,
    Toilet,
    Sink,
    Shower,
    Bathtub,
    KitchenCounter,
    Desk,
}

impl FurnitureKind {
    pub fn label(self) -> &'static str {
        match self {
            FurnitureKind::Bed => "SENG",
            FurnitureKind::Sofa => "SOFA",
            FurnitureKind::Table => "BORD",
            FurnitureKind::Wardrobe => "SKAB",
            FurnitureKind::Toilet => "WC",
            FurnitureKind::Sink => "VASK",
            FurnitureKind::Shower => "BRUSER",
            FurnitureKind::Bathtub => "KAR",
            FurnitureKind::KitchenCounter => "KØKKEN",
            FurnitureKind::Desk => "SKRIVEBORD",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Furniture {
    pub id: String,
    pub kind: FurnitureKind,
    pub center: Point2,
    pub width: f64,
    pub depth: f64,
    /// 旋转角（度）。
    #[serde(default)]
    pub rotation: f64,
}

impl Furniture {
    /// 旋转后的外轮廓四角。
    pub fn outline(&self) -> [Point2; 4] {
        let along = Vector2::from_angle(self.rotation.to_radians());
        let across = along.perp();
        let half_w = along.scale(self.width * 0.5);
        let half_d = across.scale(self.depth * 0.5);
        let c = self.center;
        [
            c.translate(half_w.scale(-1.0)).translate(half_d.scale(-1.0)),
            c.translate(half_w).translate(half_d.scale(-1.0)),
            c.translate(half_w).translate(half_d),
            c.translate(half_w.scale(-1.0)).translate(half_d),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub id: String,
    pub start: Point2,
    pub end: Point2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Dimension {
    /// 标注文字：显式标签优先，否则为两位小数的测量长度。
    pub fn text(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => format!("{:.2} m", self.start.distance_to(self.end)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub spacing: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetElements {
    #[serde(default)]
    pub walls: Vec<WallSegment>,
    #[serde(default)]
    pub openings: Vec<Opening>,
    #[serde(default)]
    pub rooms: Vec<RoomZone>,
    #[serde(default)]
    pub furniture: Vec<Furniture>,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetMetadata {
    #[serde(default)]
    pub total_area: f64,
    #[serde(default)]
    pub floor_level: i32,
    #[serde(default)]
    pub compliance: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub title: String,
    pub number: String,
    #[serde(rename = "type", default)]
    pub sheet_type: String,
    pub scale: String,
    pub elements: SheetElements,
    #[serde(default)]
    pub metadata: SheetMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<Grid>,
}

impl Sheet {
    pub fn wall(&self, id: &str) -> Option<&WallSegment> {
        self.elements.walls.iter().find(|wall| wall.id == id)
    }

    pub fn opening(&self, id: &str) -> Option<&Opening> {
        self.elements.openings.iter().find(|opening| opening.id == id)
    }

    pub fn room(&self, id: &str) -> Option<&RoomZone> {
        self.elements.rooms.iter().find(|room| room.id == id)
    }

    /// 图纸总面积：元数据非零时采用之，否则累加房间面积。
    pub fn total_area(&self) -> f64 {
        if self.metadata.total_area > 0.0 {
            self.metadata.total_area
        } else {
            self.elements.rooms.iter().map(|room| room.area.value).sum()
        }
    }

    /// 校验契约不变量。悬空 `wallId` 与洞口越界不在此报错，由下游降级处理。
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut ids: HashSet<&str> = HashSet::new();
        let all_ids = self
            .elements
            .walls
            .iter()
            .map(|wall| wall.id.as_str())
            .chain(self.elements.openings.iter().map(|opening| opening.id.as_str()))
            .chain(self.elements.rooms.iter().map(|room| room.id.as_str()));
        for id in all_ids {
            if !ids.insert(id) {
                return Err(ModelError::DuplicateId(id.to_string()));
            }
        }

        for wall in &self.elements.walls {
            if wall.length() <= LENGTH_EPSILON {
                return Err(ModelError::DegenerateWall(wall.id.clone()));
            }
            if !(wall.thickness > 0.0 && wall.thickness.is_finite()) {
                return Err(ModelError::InvalidThickness {
                    id: wall.id.clone(),
                    thickness: wall.thickness,
                });
            }
        }

        for opening in &self.elements.openings {
            if !(opening.width > 0.0 && opening.width.is_finite()) {
                return Err(ModelError::InvalidValue {
                    field: "width",
                    value: opening.width,
                });
            }
        }

        for room in &self.elements.rooms {
            validate_room_polygon(room)?;
        }
        Ok(())
    }
}

fn validate_room_polygon(room: &RoomZone) -> Result<(), ModelError> {
    if room.polygon.is_empty() {
        return Ok(());
    }
    let malformed = |reason: &str| ModelError::MalformedPolygon {
        id: room.id.clone(),
        reason: reason.to_string(),
    };
    if room.polygon.len() < 3 {
        return Err(malformed("fewer than three vertices"));
    }
    if !polygon_is_simple(&room.polygon) {
        return Err(malformed("self-intersecting or zero area"));
    }
    if !polygon_contains(&room.polygon, room.center) {
        return Err(malformed("center lies outside the polygon"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintData {
    pub project_name: String,
    #[serde(default)]
    pub project_number: String,
    #[serde(default)]
    pub architect: String,
    #[serde(default)]
    pub client: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub building_code: String,
    pub sheets: Vec<Sheet>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl BlueprintData {
    #[inline]
    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    #[inline]
    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    /// `updatedAt` 的日期部分（`YYYY-MM-DD`），用于标题栏。
    pub fn revision_date(&self) -> &str {
        let stamp = if self.updated_at.is_empty() {
            &self.created_at
        } else {
            &self.updated_at
        };
        stamp.split('T').next().unwrap_or_default()
    }
}
