//! ASCII DXF（AC1015）写出。
//!
//! 输出按固定顺序生成：头段、表段（视口、线型、图层、文字样式、应用、块记录）、
//! 块定义、实体、对象。每个表、记录、块与实体都带句柄和子类标记，句柄按写出顺序
//! 分配，因此相同输入逐字节相同；所有数值先舍入到六位小数再以 `{:.6}` 输出。
//!
//! 平面坐标 y 向下，写出时映射为 CAD 坐标 `(x, −y)`，所有角度都由映射后的
//! 向量重新计算。

use std::borrow::Cow;
use std::fmt::Display;

use blueprint_core::geometry::{Bounds2D, Point2, Vector2, offset_segment};
use blueprint_core::model::{BlueprintData, Material, Sheet};
use blueprint_engine::openings::{DoorLeaf, OpeningGeometry, ResolvedOpening};
use blueprint_engine::plan::{EngineSettings, ResolvedPlan, resolve_sheet, select_sheet};
use tracing::{debug, warn};

use crate::IoError;

pub const ACAD_VERSION: &str = "AC1015";
/// `$INSUNITS` 6 = 米。
pub const UNITS_METERS: i32 = 6;
pub const TEXT_STYLE: &str = "BLUEPRINT";
pub const TEXT_FONT: &str = "arial.ttf";

pub const BLOCK_DOOR: &str = "DOOR";
pub const BLOCK_DOUBLE_DOOR: &str = "DOUBLE_DOOR";
pub const BLOCK_WINDOW: &str = "WINDOW";
pub const BLOCK_SLIDING: &str = "SLIDING";
const MODEL_SPACE: &str = "*Model_Space";
const PAPER_SPACE: &str = "*Paper_Space";
const BLOCK_NAMES: [&str; 6] = [
    MODEL_SPACE,
    PAPER_SPACE,
    BLOCK_DOOR,
    BLOCK_DOUBLE_DOOR,
    BLOCK_WINDOW,
    BLOCK_SLIDING,
];

pub const TITLE_BLOCK_WIDTH: f64 = 24.0;
pub const TITLE_BLOCK_HEIGHT: f64 = 10.0;
const TITLE_ROWS: usize = 5;
const MAX_GRID_LINES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSettings {
    /// 外框到图形范围的距离。
    pub margin: f64,
    /// 内框相对外框的内缩量。
    pub border_inset: f64,
    pub text_height: f64,
    pub tag_height: f64,
    pub title_text_height: f64,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            margin: 20.0,
            border_inset: 10.0,
            text_height: 0.25,
            tag_height: 0.18,
            title_text_height: 0.35,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Wall,
    Door,
    Glazing,
    Annotation,
    Furniture,
    Grid,
}

impl Layer {
    pub const ALL: [Layer; 6] = [
        Layer::Wall,
        Layer::Door,
        Layer::Glazing,
        Layer::Annotation,
        Layer::Furniture,
        Layer::Grid,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Layer::Wall => "A-WALL",
            Layer::Door => "A-DOOR",
            Layer::Glazing => "A-GLAZ",
            Layer::Annotation => "A-ANNO",
            Layer::Furniture => "A-FURN",
            Layer::Grid => "A-GRID",
        }
    }

    /// ACI 颜色号。
    pub fn color(self) -> i32 {
        match self {
            Layer::Wall => 7,
            Layer::Door => 3,
            Layer::Glazing => 4,
            Layer::Annotation => 2,
            Layer::Furniture => 8,
            Layer::Grid => 1,
        }
    }

    /// 线宽，单位 0.01 mm。
    pub fn lineweight(self) -> i32 {
        match self {
            Layer::Wall => 50,
            Layer::Door | Layer::Glazing => 25,
            Layer::Annotation => 18,
            Layer::Furniture | Layer::Grid => 13,
        }
    }

    pub fn linetype(self) -> &'static str {
        match self {
            Layer::Grid => "CENTER",
            _ => "CONTINUOUS",
        }
    }
}

/// 材料到填充图案的查找表；`None` 表示不生成填充。
pub fn hatch_pattern(material: &Material) -> Option<&'static str> {
    match material {
        Material::Brick => Some("BRICK"),
        Material::Concrete => Some("AR-CONC"),
        Material::Insulation => Some("INSUL"),
        Material::Gasbeton => Some("AR-SAND"),
        Material::Timber => Some("AR-RSHKE"),
        Material::GypsumBoard => Some("ANSI31"),
        Material::Clt => Some("AR-PARQ1"),
        Material::SteelStud => Some("ANSI32"),
        Material::VaporBarrier | Material::Unknown(_) => None,
    }
}

/// 舍入到六位小数并消除负零。
pub fn format_number(value: f64) -> String {
    let rounded = (value * 1_000_000.0).round() / 1_000_000.0;
    let normalized = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{normalized:.6}")
}

#[inline]
fn to_cad(point: Point2) -> Point2 {
    Point2::new(point.x(), -point.y())
}

#[inline]
fn to_cad_vector(vector: Vector2) -> Vector2 {
    Vector2::new(vector.x(), -vector.y())
}

/// 方向角（度），范围 `[0, 360)`。
fn degrees(vector: Vector2) -> f64 {
    let angle = vector.angle().to_degrees();
    if angle < 0.0 { angle + 360.0 } else { angle }
}

/// 使文字保持可读：角度限制在 `(-90, 90]`。
fn readable_degrees(vector: Vector2) -> f64 {
    let angle = vector.angle().to_degrees();
    if angle > 90.0 {
        angle - 180.0
    } else if angle <= -90.0 {
        angle + 180.0
    } else {
        angle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Right,
}

fn push_pair(out: &mut String, code: i32, value: impl Display) {
    out.push_str(&code.to_string());
    out.push('\n');
    out.push_str(&value.to_string());
    out.push('\n');
}

/// 字符串值中的控制字符按 DXF 脱字符记法编码（`\n` → `^J`），`^` 本身写作 `^ `，
/// 保证每个值只占一行。
pub fn escape_text(value: &str) -> Cow<'_, str> {
    if !value.chars().any(|c| c.is_control() || c == '^') {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        match c {
            '^' => out.push_str("^ "),
            c if (c as u32) < 0x20 => {
                out.push('^');
                out.push(char::from(b'@' + c as u8));
            }
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// 组码对写出器。句柄从 1 起按写出顺序分配，输出为大写十六进制。
struct DxfWriter {
    out: String,
    next_handle: u32,
    /// 后续实体所属块记录的句柄（组码 330）。
    owner: String,
}

impl DxfWriter {
    fn new() -> Self {
        Self {
            out: String::new(),
            next_handle: 1,
            owner: "0".to_string(),
        }
    }

    fn pair(&mut self, code: i32, value: impl Display) {
        push_pair(&mut self.out, code, value);
    }

    /// 来自项目数据的字符串一律经由此处写出。
    fn string(&mut self, code: i32, value: &str) {
        push_pair(&mut self.out, code, escape_text(value));
    }

    fn num(&mut self, code: i32, value: f64) {
        self.pair(code, format_number(value));
    }

    fn point(&mut self, code: i32, point: Point2) {
        self.num(code, point.x());
        self.num(code + 10, point.y());
        self.num(code + 20, 0.0);
    }

    fn allocate(&mut self) -> String {
        let handle = format!("{:X}", self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// 下一个未分配的句柄，即 `$HANDSEED`。
    fn handle_seed(&self) -> String {
        format!("{:X}", self.next_handle)
    }

    fn append(&mut self, other: DxfWriter) {
        self.out.push_str(&other.out);
    }

    fn begin_section(&mut self, name: &str) {
        self.pair(0, "SECTION");
        self.pair(2, name);
    }

    fn end_section(&mut self) {
        self.pair(0, "ENDSEC");
    }

    fn begin_table(&mut self, name: &str, count: usize) -> String {
        self.pair(0, "TABLE");
        self.pair(2, name);
        let handle = self.allocate();
        self.pair(5, &handle);
        self.pair(330, "0");
        self.pair(100, "AcDbSymbolTable");
        self.pair(70, count);
        handle
    }

    fn table_record(&mut self, kind: &str, table: &str, subclass: &str, name: &str) -> String {
        self.pair(0, kind);
        let handle = self.allocate();
        self.pair(5, &handle);
        self.pair(330, table);
        self.pair(100, "AcDbSymbolTableRecord");
        self.pair(100, subclass);
        self.pair(2, name);
        handle
    }

    fn end_table(&mut self) {
        self.pair(0, "ENDTAB");
    }

    /// 实体公共部分：类型、句柄、所属块记录、图层与子类标记。
    fn entity(&mut self, kind: &str, layer: &str, subclass: &str) {
        self.pair(0, kind);
        let handle = self.allocate();
        self.pair(5, handle);
        push_pair(&mut self.out, 330, &self.owner);
        self.pair(100, "AcDbEntity");
        self.pair(8, layer);
        self.pair(100, subclass);
    }

    fn header_point(&mut self, name: &str, point: Point2) {
        self.pair(9, name);
        self.point(10, point);
    }

    fn line(&mut self, layer: &str, start: Point2, end: Point2) {
        self.entity("LINE", layer, "AcDbLine");
        self.point(10, start);
        self.point(11, end);
    }

    fn arc(&mut self, layer: &str, center: Point2, radius: f64, start_deg: f64, end_deg: f64) {
        self.entity("ARC", layer, "AcDbCircle");
        self.point(10, center);
        self.num(40, radius);
        self.pair(100, "AcDbArc");
        self.num(50, start_deg);
        self.num(51, end_deg);
    }

    fn polyline(&mut self, layer: &str, points: &[Point2], closed: bool) {
        self.entity("LWPOLYLINE", layer, "AcDbPolyline");
        self.pair(90, points.len());
        self.pair(70, i32::from(closed));
        for point in points {
            self.num(10, point.x());
            self.num(20, point.y());
        }
    }

    fn hatch(&mut self, layer: &str, pattern: &str, boundary: &[Point2]) {
        self.entity("HATCH", layer, "AcDbHatch");
        self.point(10, Point2::new(0.0, 0.0));
        self.num(210, 0.0);
        self.num(220, 0.0);
        self.num(230, 1.0);
        self.pair(2, pattern);
        self.pair(70, 0);
        self.pair(71, 0);
        self.pair(91, 1);
        // 外部多段线边界
        self.pair(92, 3);
        self.pair(72, 0);
        self.pair(73, 1);
        self.pair(93, boundary.len());
        for point in boundary {
            self.num(10, point.x());
            self.num(20, point.y());
        }
        self.pair(97, 0);
        self.pair(75, 0);
        self.pair(76, 1);
        self.num(52, 0.0);
        self.num(41, 1.0);
        self.pair(77, 0);
        self.pair(78, 0);
        self.pair(98, 0);
    }

    fn insert(&mut self, layer: &str, block: &str, at: Point2, scale: (f64, f64), rotation: f64) {
        self.entity("INSERT", layer, "AcDbBlockReference");
        self.pair(2, block);
        self.point(10, at);
        self.num(41, scale.0);
        self.num(42, scale.1);
        self.num(43, 1.0);
        self.num(50, rotation);
    }

    fn text(&mut self, layer: &str, at: Point2, height: f64, content: &str, rotation: f64, align: Align) {
        self.entity("TEXT", layer, "AcDbText");
        self.point(10, at);
        self.num(40, height);
        self.string(1, content);
        self.num(50, rotation);
        self.pair(7, TEXT_STYLE);
        match align {
            Align::Left => {}
            Align::Center | Align::Right => {
                self.pair(72, if align == Align::Center { 1 } else { 2 });
                self.point(11, at);
            }
        }
        self.pair(100, "AcDbText");
    }

    fn finish(mut self) -> Vec<u8> {
        self.pair(0, "EOF");
        self.out.into_bytes()
    }
}

/// 解析指定图纸并写出 DXF。图纸索引越界与模型契约错误会中止导出。
pub fn serialize(
    blueprint: &BlueprintData,
    sheet_index: usize,
    engine: &EngineSettings,
    export: &ExportSettings,
) -> Result<Vec<u8>, IoError> {
    let sheet = select_sheet(blueprint, sheet_index)?;
    let plan = resolve_sheet(sheet, engine)?;
    Ok(serialize_resolved(blueprint, sheet, &plan, export))
}

/// 基于已解析的几何快照写出 DXF，可与合规评估并行执行。
pub fn serialize_resolved(
    blueprint: &BlueprintData,
    sheet: &Sheet,
    plan: &ResolvedPlan,
    export: &ExportSettings,
) -> Vec<u8> {
    let extents = plan_extents(sheet, plan);
    let outer = extents.expanded(export.margin);
    let inner = outer.expanded(-export.border_inset);

    let mut body = DxfWriter::new();
    let records = write_tables(&mut body, export);
    write_blocks(&mut body, &records);

    body.begin_section("ENTITIES");
    body.owner = records.model_space().to_string();
    write_border(&mut body, sheet, &outer, &inner, export);
    write_title_block(&mut body, blueprint, sheet, &inner, export);
    if let Some(grid) = &sheet.grid {
        write_grid(&mut body, &extents, grid.spacing);
    }
    write_walls(&mut body, sheet);
    for opening in &plan.openings {
        write_opening(&mut body, opening, export);
    }
    write_rooms(&mut body, sheet, export);
    write_furniture(&mut body, sheet, export);
    write_dimensions(&mut body, sheet, export);
    body.end_section();
    write_objects(&mut body);

    // 头段需要 `$HANDSEED`，因此在其余各段分配完句柄后再写
    let title = format!("{} - {} {}", blueprint.project_name, sheet.number, sheet.title);
    let mut writer = DxfWriter::new();
    write_header(&mut writer, &outer, &title, &body.handle_seed());
    writer.append(body);

    let bytes = writer.finish();
    debug!(
        sheet = %sheet.number,
        openings = plan.openings.len(),
        bytes = bytes.len(),
        "DXF 序列化完成"
    );
    bytes
}

/// CAD 坐标下的图形范围。外墙环顶点总是计入，因此没有任何元素时退化为占位边界。
fn plan_extents(sheet: &Sheet, plan: &ResolvedPlan) -> Bounds2D {
    let mut bounds: Bounds2D = plan.exterior.vertices().into_iter().map(to_cad).collect();
    for wall in &sheet.elements.walls {
        if let Some(corners) = offset_segment(wall.start, wall.end, wall.thickness * 0.5) {
            corners.into_iter().for_each(|corner| bounds.include_point(to_cad(corner)));
        }
    }
    for room in &sheet.elements.rooms {
        bounds.include_point(to_cad(room.center));
        room.polygon.iter().for_each(|point| bounds.include_point(to_cad(*point)));
    }
    for item in &sheet.elements.furniture {
        item.outline().into_iter().for_each(|corner| bounds.include_point(to_cad(corner)));
    }
    for dimension in &sheet.elements.dimensions {
        bounds.include_point(to_cad(dimension.start));
        bounds.include_point(to_cad(dimension.end));
    }
    bounds
}

fn write_header(writer: &mut DxfWriter, outer: &Bounds2D, title: &str, handle_seed: &str) {
    writer.begin_section("HEADER");
    writer.pair(9, "$ACADVER");
    writer.pair(1, ACAD_VERSION);
    writer.pair(9, "$HANDSEED");
    writer.pair(5, handle_seed);
    writer.pair(9, "$INSUNITS");
    writer.pair(70, UNITS_METERS);
    writer.pair(9, "$MEASUREMENT");
    writer.pair(70, 1);
    writer.header_point("$EXTMIN", outer.min());
    writer.header_point("$EXTMAX", outer.max());
    writer.pair(9, "$PROJECTNAME");
    writer.string(1, title);
    writer.end_section();
}

/// 块记录表中的名称与句柄，按写出顺序排列。
struct BlockRecords {
    entries: Vec<(&'static str, String)>,
}

impl BlockRecords {
    fn handle(&self, name: &str) -> &str {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map_or("0", |(_, handle)| handle.as_str())
    }

    fn model_space(&self) -> &str {
        self.handle(MODEL_SPACE)
    }
}

fn write_tables(writer: &mut DxfWriter, export: &ExportSettings) -> BlockRecords {
    writer.begin_section("TABLES");

    writer.begin_table("VPORT", 0);
    writer.end_table();

    let table = writer.begin_table("LTYPE", 4);
    for name in ["ByBlock", "ByLayer", "CONTINUOUS"] {
        writer.table_record("LTYPE", &table, "AcDbLinetypeTableRecord", name);
        writer.pair(70, 0);
        writer.pair(3, if name == "CONTINUOUS" { "Solid line" } else { "" });
        writer.pair(72, 65);
        writer.pair(73, 0);
        writer.num(40, 0.0);
    }
    writer.table_record("LTYPE", &table, "AcDbLinetypeTableRecord", "CENTER");
    writer.pair(70, 0);
    writer.pair(3, "Center ____ _ ____ _ ____");
    writer.pair(72, 65);
    writer.pair(73, 4);
    writer.num(40, 2.0);
    for dash in [1.25, -0.25, 0.25, -0.25] {
        writer.num(49, dash);
        writer.pair(74, 0);
    }
    writer.end_table();

    let table = writer.begin_table("LAYER", Layer::ALL.len() + 1);
    writer.table_record("LAYER", &table, "AcDbLayerTableRecord", "0");
    writer.pair(70, 0);
    writer.pair(62, 7);
    writer.pair(6, "CONTINUOUS");
    writer.pair(370, -3);
    for layer in Layer::ALL {
        writer.table_record("LAYER", &table, "AcDbLayerTableRecord", layer.name());
        writer.pair(70, 0);
        writer.pair(62, layer.color());
        writer.pair(6, layer.linetype());
        writer.pair(370, layer.lineweight());
    }
    writer.end_table();

    let table = writer.begin_table("STYLE", 1);
    writer.table_record("STYLE", &table, "AcDbTextStyleTableRecord", TEXT_STYLE);
    writer.pair(70, 0);
    writer.num(40, 0.0);
    writer.num(41, 1.0);
    writer.num(50, 0.0);
    writer.pair(71, 0);
    writer.num(42, export.text_height);
    writer.pair(3, TEXT_FONT);
    writer.pair(4, "");
    writer.end_table();

    let table = writer.begin_table("APPID", 1);
    writer.table_record("APPID", &table, "AcDbRegAppTableRecord", "ACAD");
    writer.pair(70, 0);
    writer.end_table();

    let table = writer.begin_table("BLOCK_RECORD", BLOCK_NAMES.len());
    let entries = BLOCK_NAMES
        .into_iter()
        .map(|name| {
            let handle = writer.table_record("BLOCK_RECORD", &table, "AcDbBlockTableRecord", name);
            (name, handle)
        })
        .collect();
    writer.end_table();

    writer.end_section();
    BlockRecords { entries }
}

fn begin_block(writer: &mut DxfWriter, records: &BlockRecords, name: &str) {
    writer.owner = records.handle(name).to_string();
    writer.entity("BLOCK", "0", "AcDbBlockBegin");
    writer.pair(2, name);
    writer.pair(70, 0);
    writer.point(10, Point2::new(0.0, 0.0));
    writer.pair(3, name);
    writer.pair(1, "");
}

fn end_block(writer: &mut DxfWriter) {
    writer.entity("ENDBLK", "0", "AcDbBlockEnd");
}

/// 块都以单位尺寸定义，插入时按洞口实际尺寸缩放。
fn write_blocks(writer: &mut DxfWriter, records: &BlockRecords) {
    writer.begin_section("BLOCKS");

    begin_block(writer, records, MODEL_SPACE);
    end_block(writer);
    begin_block(writer, records, PAPER_SPACE);
    end_block(writer);

    // 门：关闭位置沿 +x，门扇画在打开位置 +y，弧线 0°→90°
    begin_block(writer, records, BLOCK_DOOR);
    writer.line("0", Point2::new(0.0, 0.0), Point2::new(0.0, 1.0));
    writer.arc("0", Point2::new(0.0, 0.0), 1.0, 0.0, 90.0);
    end_block(writer);

    // 双开门：两扇半宽门扇分别铰接在两端，向同一侧打开
    begin_block(writer, records, BLOCK_DOUBLE_DOOR);
    writer.line("0", Point2::new(0.0, 0.0), Point2::new(0.0, 0.5));
    writer.arc("0", Point2::new(0.0, 0.0), 0.5, 0.0, 90.0);
    writer.line("0", Point2::new(1.0, 0.0), Point2::new(1.0, 0.5));
    writer.arc("0", Point2::new(1.0, 0.0), 0.5, 90.0, 180.0);
    end_block(writer);

    // 窗：外层玻璃、玻璃中线、内层玻璃
    begin_block(writer, records, BLOCK_WINDOW);
    for y in [-0.5, 0.0, 0.5] {
        writer.line("0", Point2::new(0.0, y), Point2::new(1.0, y));
    }
    end_block(writer);

    begin_block(writer, records, BLOCK_SLIDING);
    writer.line("0", Point2::new(0.0, 0.25), Point2::new(0.55, 0.25));
    writer.line("0", Point2::new(0.45, -0.25), Point2::new(1.0, -0.25));
    end_block(writer);

    writer.end_section();
}

/// 根字典及其 `ACAD_GROUP` 子字典。
fn write_objects(writer: &mut DxfWriter) {
    writer.begin_section("OBJECTS");
    let root = writer.allocate();
    let groups = writer.allocate();
    writer.pair(0, "DICTIONARY");
    writer.pair(5, &root);
    writer.pair(330, "0");
    writer.pair(100, "AcDbDictionary");
    writer.pair(281, 1);
    writer.pair(3, "ACAD_GROUP");
    writer.pair(350, &groups);
    writer.pair(0, "DICTIONARY");
    writer.pair(5, &groups);
    writer.pair(330, &root);
    writer.pair(100, "AcDbDictionary");
    writer.pair(281, 1);
    writer.end_section();
}

fn write_border(
    writer: &mut DxfWriter,
    sheet: &Sheet,
    outer: &Bounds2D,
    inner: &Bounds2D,
    export: &ExportSettings,
) {
    let layer = Layer::Annotation.name();
    writer.polyline(layer, &rectangle(outer), true);
    writer.polyline(layer, &rectangle(inner), true);

    let height = export.title_text_height;
    let scale_at = Point2::new(inner.min().x() + 1.0, inner.min().y() + 1.0);
    writer.text(layer, scale_at, height, &format!("Mål {}", sheet.scale), 0.0, Align::Left);
    let number_at = Point2::new(inner.max().x() - 1.0, inner.max().y() - 1.0 - height);
    writer.text(layer, number_at, height * 2.0, &sheet.number, 0.0, Align::Right);
}

fn rectangle(bounds: &Bounds2D) -> [Point2; 4] {
    let (min, max) = (bounds.min(), bounds.max());
    [
        min,
        Point2::new(max.x(), min.y()),
        max,
        Point2::new(min.x(), max.y()),
    ]
}

/// 标题栏固定为 24 × 10，贴在内框右下角，五行两列。
fn write_title_block(
    writer: &mut DxfWriter,
    blueprint: &BlueprintData,
    sheet: &Sheet,
    inner: &Bounds2D,
    export: &ExportSettings,
) {
    let layer = Layer::Annotation.name();
    let x1 = inner.max().x();
    let x0 = x1 - TITLE_BLOCK_WIDTH;
    let y0 = inner.min().y();
    let y1 = y0 + TITLE_BLOCK_HEIGHT;
    let row_height = TITLE_BLOCK_HEIGHT / TITLE_ROWS as f64;
    let column = x0 + TITLE_BLOCK_WIDTH * 0.5;

    let frame = Bounds2D::new(Point2::new(x0, y0), Point2::new(x1, y1));
    writer.polyline(layer, &rectangle(&frame), true);
    for row in 1..TITLE_ROWS {
        let y = y0 + row_height * row as f64;
        writer.line(layer, Point2::new(x0, y), Point2::new(x1, y));
    }
    writer.line(layer, Point2::new(column, y0), Point2::new(column, y1));

    let rows: [[(&str, &str); 2]; TITLE_ROWS] = [
        [("Projekt", blueprint.project_name.as_str()), ("Nr.", blueprint.project_number.as_str())],
        [("Tegning", sheet.title.as_str()), ("Tegn.nr.", sheet.number.as_str())],
        [("Mål", sheet.scale.as_str()), ("Dato", blueprint.revision_date())],
        [("Arkitekt", blueprint.architect.as_str()), ("Bygherre", blueprint.client.as_str())],
        [("Reglement", blueprint.building_code.as_str()), ("Adresse", blueprint.location.as_str())],
    ];
    for (index, row) in rows.iter().enumerate() {
        let baseline = y1 - row_height * (index + 1) as f64 + row_height * 0.35;
        for (slot, (label, value)) in row.iter().enumerate() {
            let x = 0.5 + if slot == 0 { x0 } else { column };
            let content = format!("{label}: {value}");
            writer.text(layer, Point2::new(x, baseline), export.title_text_height, &content, 0.0, Align::Left);
        }
    }
}

fn write_grid(writer: &mut DxfWriter, extents: &Bounds2D, spacing: f64) {
    if !(spacing > 0.0 && spacing.is_finite()) {
        warn!(spacing, "轴网间距无效，跳过轴网");
        return;
    }
    let layer = Layer::Grid.name();
    let (min, max) = (extents.min(), extents.max());
    let first_x = (min.x() / spacing).ceil() as i64;
    let last_x = (max.x() / spacing).floor() as i64;
    let first_y = (min.y() / spacing).ceil() as i64;
    let last_y = (max.y() / spacing).floor() as i64;
    let columns = (last_x - first_x + 1).max(0) as usize;
    let rows = (last_y - first_y + 1).max(0) as usize;
    if columns > MAX_GRID_LINES || rows > MAX_GRID_LINES {
        warn!(spacing, columns, rows, "轴网线过多，跳过轴网");
        return;
    }
    for k in first_x..=last_x {
        let x = k as f64 * spacing;
        writer.line(layer, Point2::new(x, min.y()), Point2::new(x, max.y()));
    }
    for k in first_y..=last_y {
        let y = k as f64 * spacing;
        writer.line(layer, Point2::new(min.x(), y), Point2::new(max.x(), y));
    }
}

/// 每段墙一条闭合多段线加一个填充，两者共用 `offset_segment` 的四角。
fn write_walls(writer: &mut DxfWriter, sheet: &Sheet) {
    let layer = Layer::Wall.name();
    for wall in &sheet.elements.walls {
        let Some(corners) = offset_segment(wall.start, wall.end, wall.thickness * 0.5) else {
            continue;
        };
        let outline = corners.map(to_cad);
        writer.polyline(layer, &outline, true);
        match hatch_pattern(&wall.material) {
            Some(pattern) => writer.hatch(layer, pattern, &outline),
            None => debug!(wall = %wall.id, material = wall.material.as_str(), "材料无填充图案"),
        }
    }
}

/// `width` 是块的单位宽度对应的实际长度：单扇门为门扇半径，双开门为洞口宽度。
fn door_insert(writer: &mut DxfWriter, block: &str, leaf: &DoorLeaf, width: f64) {
    let closed = to_cad_vector(leaf.closed_direction);
    let open = to_cad_vector(leaf.open_direction);
    // 块内门扇向 +y 打开；映射后若开启侧在关闭方向右侧则沿 y 镜像
    let mirror = if closed.cross(open) >= 0.0 { 1.0 } else { -1.0 };
    writer.insert(
        Layer::Door.name(),
        block,
        to_cad(leaf.hinge),
        (width, width * mirror),
        degrees(closed),
    );
}

fn write_opening(writer: &mut DxfWriter, opening: &ResolvedOpening, export: &ExportSettings) {
    let along = to_cad_vector(Vector2::from_points(opening.start, opening.end));
    let rotation = degrees(along);
    let at = to_cad(opening.start);
    let layer = match &opening.geometry {
        OpeningGeometry::Hinged { leaves } => {
            match leaves.as_slice() {
                [leaf] => door_insert(writer, BLOCK_DOOR, leaf, leaf.radius),
                [first, _] => door_insert(writer, BLOCK_DOUBLE_DOOR, first, first.radius * 2.0),
                others => {
                    for leaf in others {
                        door_insert(writer, BLOCK_DOOR, leaf, leaf.radius);
                    }
                }
            }
            Layer::Door
        }
        OpeningGeometry::Panels { .. } => {
            // 平面左法向映射后对应块的 −y
            let scale = (opening.width, -opening.wall_thickness);
            writer.insert(Layer::Door.name(), BLOCK_SLIDING, at, scale, rotation);
            Layer::Door
        }
        OpeningGeometry::Window => {
            let scale = (opening.width, opening.wall_thickness);
            writer.insert(Layer::Glazing.name(), BLOCK_WINDOW, at, scale, rotation);
            Layer::Glazing
        }
    };

    let direction = Vector2::from_points(opening.start, opening.end);
    let offset = direction
        .normalize()
        .map(|unit| unit.perp().scale(-(opening.wall_thickness * 0.5 + export.tag_height * 1.5)))
        .unwrap_or(Vector2::new(0.0, 0.0));
    let tag_at = to_cad(opening.center.translate(offset));
    writer.text(
        layer.name(),
        tag_at,
        export.tag_height,
        &opening.tag,
        readable_degrees(along),
        Align::Center,
    );
}

fn write_rooms(writer: &mut DxfWriter, sheet: &Sheet, export: &ExportSettings) {
    let layer = Layer::Annotation.name();
    let step = export.text_height * 1.5;
    for room in &sheet.elements.rooms {
        let center = to_cad(room.center);
        let mut lines = vec![
            room.label.clone(),
            format!("{:.1} {}", room.area.value, room.area.unit),
        ];
        if !room.flooring.is_empty() {
            lines.push(room.flooring.clone());
        }
        let top = center.y() + step * (lines.len() - 1) as f64 * 0.5;
        for (index, content) in lines.iter().enumerate() {
            let at = Point2::new(center.x(), top - step * index as f64);
            writer.text(layer, at, export.text_height, content, 0.0, Align::Center);
        }
    }
}

fn write_furniture(writer: &mut DxfWriter, sheet: &Sheet, export: &ExportSettings) {
    let layer = Layer::Furniture.name();
    for item in &sheet.elements.furniture {
        let outline = item.outline().map(to_cad);
        writer.polyline(layer, &outline, true);
        writer.text(
            layer,
            to_cad(item.center),
            export.tag_height,
            item.kind.label(),
            0.0,
            Align::Center,
        );
    }
}

fn write_dimensions(writer: &mut DxfWriter, sheet: &Sheet, export: &ExportSettings) {
    let layer = Layer::Annotation.name();
    for dimension in &sheet.elements.dimensions {
        let start = to_cad(dimension.start);
        let end = to_cad(dimension.end);
        writer.line(layer, start, end);
        let along = Vector2::from_points(start, end);
        let lift = along
            .normalize()
            .map(|unit| unit.perp().scale(export.tag_height))
            .unwrap_or(Vector2::new(0.0, export.tag_height));
        let at = start.midpoint(end).translate(lift);
        writer.text(
            layer,
            at,
            export.tag_height,
            &dimension.text(),
            readable_degrees(along),
            Align::Center,
        );
    }
}
