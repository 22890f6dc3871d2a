use std::fs;
use std::path::PathBuf;

use blueprint_core::model::{BlueprintData, Material, OpeningType};
use blueprint_engine::migration::migrate;
use blueprint_engine::plan::{Diagnostic, EngineSettings, resolve_blueprint};
use blueprint_io::{
    BlueprintLoader, DrawingSaver, DxfFacade, ExportSettings, IoError, JsonFacade, serialize,
    summarize,
};

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

fn load(name: &str) -> BlueprintData {
    JsonFacade::new().load(&fixture(name)).expect("读取项目文件失败")
}

fn export(blueprint: &BlueprintData) -> Vec<u8> {
    serialize(
        blueprint,
        0,
        &EngineSettings::default(),
        &ExportSettings::default(),
    )
    .expect("导出 DXF 失败")
}

/// 以 (组码, 值) 序列读取导出结果。
fn pairs(bytes: &[u8]) -> Vec<(i32, String)> {
    let text = std::str::from_utf8(bytes).expect("DXF 应为 UTF-8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len() % 2, 0, "组码与值应成对出现");
    lines
        .chunks(2)
        .map(|chunk| (chunk[0].trim().parse().expect("组码应为整数"), chunk[1].to_string()))
        .collect()
}

fn is_fixed_six(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let Some((whole, fraction)) = digits.split_once('.') else {
        return false;
    };
    !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.len() == 6
        && fraction.bytes().all(|b| b.is_ascii_digit())
}

#[test]
fn export_is_byte_identical_across_runs() {
    let blueprint = load("two_room_house.json");
    assert_eq!(export(&blueprint), export(&blueprint));
}

#[test]
fn export_declares_tables_and_blocks() {
    let summary = summarize(&export(&load("two_room_house.json"))).expect("读回 DXF 失败");
    assert_eq!(summary.version.as_deref(), Some("AC1015"));
    assert_eq!(
        summary.layers,
        ["0", "A-WALL", "A-DOOR", "A-GLAZ", "A-ANNO", "A-FURN", "A-GRID"]
    );
    assert_eq!(
        summary.blocks,
        ["*Model_Space", "*Paper_Space", "DOOR", "DOUBLE_DOOR", "WINDOW", "SLIDING"]
    );
    assert_eq!(
        summary.project_name.as_deref(),
        Some("Sommerhus Hornbæk - A-101 Stueplan")
    );
}

#[test]
fn entities_carry_handles_and_subclass_markers() {
    let summary = summarize(&export(&load("two_room_house.json"))).expect("读回 DXF 失败");
    assert_eq!(summary.entities_without_handle, 0);
    assert!(summary.handles_are_consistent());
    assert!(summary.handles.len() > 100);
    for (kind, marker) in [
        ("LINE", "AcDbLine"),
        ("ARC", "AcDbArc"),
        ("LWPOLYLINE", "AcDbPolyline"),
        ("HATCH", "AcDbHatch"),
        ("INSERT", "AcDbBlockReference"),
        ("TEXT", "AcDbText"),
    ] {
        assert!(summary.has_marker(kind, "AcDbEntity"), "{kind} 缺少 AcDbEntity");
        assert!(summary.has_marker(kind, marker), "{kind} 缺少 {marker}");
    }
}

#[test]
fn control_characters_in_labels_are_escaped() {
    let mut blueprint = load("two_room_house.json");
    blueprint.sheets[0].elements.rooms[0].label = "Stue\nKøkken".to_string();
    blueprint.sheets[0].elements.openings[0].tag = "D01\r".to_string();
    blueprint.project_name = "Hus ^ Have".to_string();

    let bytes = export(&blueprint);
    // 组码与值仍然逐行成对
    let _ = pairs(&bytes);
    let summary = summarize(&bytes).expect("含换行的标签不应破坏文件结构");
    assert!(summary.texts.iter().any(|text| text == "Stue^JKøkken"));
    assert!(summary.texts.iter().any(|text| text == "D01^M"));
    assert!(summary.texts.iter().any(|text| text == "Projekt: Hus ^  Have"));
}

#[test]
fn double_door_is_a_single_insert() {
    let mut blueprint = load("two_room_house.json");
    let d2 = blueprint.sheets[0]
        .elements
        .openings
        .iter_mut()
        .find(|opening| opening.id == "d2")
        .unwrap();
    d2.opening_type = OpeningType::DoubleDoor;
    d2.width = 1.6;

    let summary = summarize(&export(&blueprint)).unwrap();
    assert_eq!(summary.entity_count("INSERT"), 4);
    assert_eq!(
        summary.inserts.iter().filter(|block| *block == "DOUBLE_DOOR").count(),
        1
    );
    assert_eq!(summary.inserts.iter().filter(|block| *block == "DOOR").count(), 1);
}

#[test]
fn every_real_value_has_six_decimals() {
    let bytes = export(&load("two_room_house.json"));
    let reals = pairs(&bytes)
        .into_iter()
        .filter(|(code, _)| matches!(code, 10..=59 | 210..=239));
    let mut seen = 0;
    for (code, value) in reals {
        assert!(is_fixed_six(&value), "组码 {code} 的值 {value:?} 不是六位小数");
        assert_ne!(value, "-0.000000");
        seen += 1;
    }
    assert!(seen > 100);
}

#[test]
fn walls_openings_and_annotations_are_emitted() {
    let summary = summarize(&export(&load("two_room_house.json"))).unwrap();
    // 四段外墙加一段内墙，材料都有填充图案
    assert_eq!(
        summary.hatch_patterns,
        ["BRICK", "AR-CONC", "AR-PARQ1", "AR-RSHKE", "ANSI31"]
    );
    // 两扇单开门、两樘窗
    assert_eq!(summary.entity_count("INSERT"), 4);
    assert!(summary.texts.iter().any(|text| text == "Dato: 2024-06-20"));
    assert!(summary.texts.iter().any(|text| text == "35.0 m²"));
    assert!(summary.texts.iter().any(|text| text == "Soveværelse"));
    assert!(summary.texts.iter().any(|text| text == "10.00 m"));
    assert!(summary.texts.iter().any(|text| text == "SENG"));
    assert!(summary.texts.iter().any(|text| text == "D02"));
    // 轴网 1 m，覆盖带墙厚的 [-0.15, 10.15] × [-7.15, 1]
    assert!(summary.entity_count("LINE") > 20);
}

#[test]
fn degraded_plan_still_exports() {
    let blueprint = load("degraded_plan.json");
    let plan = resolve_blueprint(&blueprint, 0, &EngineSettings::default()).unwrap();
    let codes: Vec<&str> = plan.diagnostics.iter().map(Diagnostic::code).collect();
    assert_eq!(codes, ["unknown-material", "dangling-opening", "opening-clamped"]);
    assert!(plan.exterior.is_closed());
    assert!(plan.opening("x1").is_none());
    let clamped = plan.opening("v2").unwrap();
    assert!((clamped.dist_from_start - 2.0).abs() < 1e-9);

    let summary = summarize(&export(&blueprint)).unwrap();
    // 未知材料与隔汽层不生成填充
    assert_eq!(summary.hatch_patterns, ["BRICK", "BRICK"]);
    assert_eq!(summary.entity_count("INSERT"), 2);
    assert!(!summary.texts.iter().any(|text| text == "D99"));
    assert!(summary.texts.iter().any(|text| text == "12.0 m²"));
}

#[test]
fn migrated_view_matches_exterior_walls() {
    let blueprint = load("two_room_house.json");
    let view = migrate(&blueprint, 0, &EngineSettings::default()).unwrap();
    let exterior_walls = blueprint.sheets[0]
        .elements
        .walls
        .iter()
        .filter(|wall| wall.is_external)
        .count();
    assert_eq!(view.exterior_segment_count(), exterior_walls);
    assert_eq!(view.exterior.path, "M 0 0 L 10 0 L 10 7 L 0 7 Z");
    assert_eq!(view.metadata.total_area, 70.0);

    // 周长 34：d1 位于 w3 上 2 m 处，环内偏移 17
    let d1 = view.openings.iter().find(|opening| opening.id == "d1").unwrap();
    assert_eq!(d1.on_path, "exterior");
    assert!((d1.at_position - 19.0 / 34.0).abs() < 1e-4);
}

#[test]
fn views_and_drawings_are_saved_to_disk() {
    let blueprint = load("two_room_house.json");
    let dir = tempfile::tempdir().expect("创建临时目录失败");

    let dxf_path = dir.path().join("out/plan.dxf");
    let saver = DxfFacade::new(EngineSettings::default(), ExportSettings::default());
    saver.save(&blueprint, 0, &dxf_path).expect("写出 DXF 失败");
    assert_eq!(fs::read(&dxf_path).unwrap(), export(&blueprint));

    let view_path = dir.path().join("plan.svg.json");
    let view = migrate(&blueprint, 0, &EngineSettings::default()).unwrap();
    JsonFacade::new().save_view(&view, &view_path).unwrap();
    let saved = fs::read_to_string(&view_path).unwrap();
    assert!(saved.contains(r#""format": "svg-enhanced""#));

    let project_path = dir.path().join("copy.json");
    let facade = JsonFacade::new();
    facade.save_blueprint(&blueprint, &project_path).unwrap();
    assert_eq!(facade.load(&project_path).unwrap(), blueprint);
}

#[test]
fn missing_file_and_bad_sheet_are_reported() {
    let err = JsonFacade::new()
        .load(&fixture("does_not_exist.json"))
        .unwrap_err();
    assert!(matches!(err, IoError::ReadError { .. }));

    let blueprint = load("two_room_house.json");
    let err = serialize(
        &blueprint,
        3,
        &EngineSettings::default(),
        &ExportSettings::default(),
    )
    .unwrap_err();
    assert!(matches!(err, IoError::Engine(_)));
}

#[test]
fn unknown_materials_survive_a_save() {
    let blueprint = load("degraded_plan.json");
    assert_eq!(
        blueprint.sheets[0].elements.walls[0].material,
        Material::Unknown("marble".to_string())
    );

    let dir = tempfile::tempdir().expect("创建临时目录失败");
    let path = dir.path().join("degraded.json");
    let facade = JsonFacade::new();
    facade.save_blueprint(&blueprint, &path).unwrap();
    let saved = fs::read_to_string(&path).unwrap();
    assert!(saved.contains(r#""material": "marble""#));
    assert!(!saved.contains(r#""unknown""#));
    assert_eq!(facade.load(&path).unwrap(), blueprint);
}

#[test]
fn malformed_json_is_rejected() {
    let err = JsonFacade::new().parse(r#"{"projectName": 1}"#).unwrap_err();
    assert!(matches!(err, IoError::Json(_)));
}
