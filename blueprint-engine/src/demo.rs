use blueprint_core::geometry::Point2;
use blueprint_core::model::{
    Area, BlueprintData, Dimension, Furniture, FurnitureKind, Grid, Material, Opening,
    OpeningType, RoomZone, Sheet, SheetElements, SheetMetadata, Swing, SwingDirection, WallSegment,
    WallType,
};
use tracing::debug;

fn exterior(id: &str, start: (f64, f64), end: (f64, f64)) -> WallSegment {
    WallSegment {
        id: id.to_string(),
        start: Point2::new(start.0, start.1),
        end: Point2::new(end.0, end.1),
        thickness: 0.35,
        wall_type: WallType::ExteriorInsulated,
        material: Material::Brick,
        is_external: true,
    }
}

fn interior(id: &str, start: (f64, f64), end: (f64, f64), load_bearing: bool) -> WallSegment {
    let (thickness, wall_type, material) = if load_bearing {
        (0.2, WallType::LoadBearing, Material::Concrete)
    } else {
        (0.12, WallType::InteriorPartition, Material::GypsumBoard)
    };
    WallSegment {
        id: id.to_string(),
        start: Point2::new(start.0, start.1),
        end: Point2::new(end.0, end.1),
        thickness,
        wall_type,
        material,
        is_external: false,
    }
}

fn door(id: &str, wall_id: &str, tag: &str, dist: f64, width: f64, swing: Swing) -> Opening {
    Opening {
        id: id.to_string(),
        wall_id: wall_id.to_string(),
        opening_type: OpeningType::Door,
        width,
        height: Opening::DEFAULT_DOOR_HEIGHT,
        dist_from_start: dist,
        tag: tag.to_string(),
        swing,
        swing_direction: SwingDirection::Inward,
        sill_height: None,
        threshold_height: Some(0.0),
    }
}

fn window(id: &str, wall_id: &str, tag: &str, dist: f64, size: (f64, f64), sill: f64) -> Opening {
    Opening {
        id: id.to_string(),
        wall_id: wall_id.to_string(),
        opening_type: OpeningType::Window,
        width: size.0,
        height: size.1,
        dist_from_start: dist,
        tag: tag.to_string(),
        swing: Swing::None,
        swing_direction: SwingDirection::Inward,
        sill_height: Some(sill),
        threshold_height: None,
    }
}

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2> {
    vec![
        Point2::new(x0, y0),
        Point2::new(x1, y0),
        Point2::new(x1, y1),
        Point2::new(x0, y1),
    ]
}

fn room(id: &str, label: &str, room_type: &str, bounds: (f64, f64, f64, f64), ceiling: f64) -> RoomZone {
    let (x0, y0, x1, y1) = bounds;
    RoomZone {
        id: id.to_string(),
        label: label.to_string(),
        room_type: room_type.to_string(),
        area: Area::square_meters((x1 - x0) * (y1 - y0)),
        flooring: if room_type == "bathroom" { "klinker" } else { "egeparket" }.to_string(),
        center: Point2::new((x0 + x1) * 0.5, (y0 + y1) * 0.5),
        polygon: rect(x0, y0, x1, y1),
        ceiling_height: Some(ceiling),
        natural_light_area: None,
        compliant: true,
    }
}

/// 12 × 8 m 的两居室住宅：八段外墙（含两段反向录入）、五段内墙、
/// 四个门、五个窗，满足全部 BR18 规则。
pub fn demo_sheet() -> Sheet {
    let walls = vec![
        exterior("e1", (0.0, 0.0), (6.0, 0.0)),
        exterior("e2", (6.0, 0.0), (12.0, 0.0)),
        exterior("e3", (12.0, 0.0), (12.0, 4.0)),
        exterior("e4", (12.0, 4.0), (12.0, 8.0)),
        exterior("e5", (9.0, 8.0), (12.0, 8.0)),
        exterior("e6", (6.0, 8.0), (9.0, 8.0)),
        exterior("e7", (6.0, 8.0), (0.0, 8.0)),
        exterior("e8", (0.0, 8.0), (0.0, 0.0)),
        interior("i1", (6.0, 0.0), (6.0, 4.0), true),
        interior("i2", (6.0, 4.0), (6.0, 8.0), true),
        interior("i3", (6.0, 4.0), (9.0, 4.0), false),
        interior("i4", (9.0, 4.0), (12.0, 4.0), false),
        interior("i5", (9.0, 4.0), (9.0, 8.0), false),
    ];

    let openings = vec![
        door("d1", "e8", "D1", 3.0, 1.0, Swing::Left),
        door("d2", "i1", "D2", 2.5, 0.9, Swing::Right),
        door("d3", "i2", "D3", 1.5, 0.8, Swing::Left),
        door("d4", "i4", "D4", 1.0, 0.9, Swing::Left),
        window("v1", "e1", "V1", 1.0, (2.4, 1.4), 0.6),
        window("v2", "e7", "V2", 2.0, (1.8, 1.4), 0.6),
        window("v3", "e2", "V3", 2.0, (2.0, 1.3), 0.8),
        window("v4", "e4", "V4", 1.0, (1.2, 1.2), 0.9),
        window("v5", "e6", "V5", 1.0, (0.6, 0.6), 1.5),
    ];

    let rooms = vec![
        room("r1", "Køkken-alrum", "kitchen", (0.0, 0.0, 6.0, 8.0), 2.5),
        room("r2", "Soveværelse 1", "bedroom", (6.0, 0.0, 12.0, 4.0), 2.5),
        room("r3", "Badeværelse", "bathroom", (6.0, 4.0, 9.0, 8.0), 2.3),
        room("r4", "Soveværelse 2", "bedroom", (9.0, 4.0, 12.0, 8.0), 2.5),
    ];

    let furniture = vec![
        Furniture {
            id: "f1".to_string(),
            kind: FurnitureKind::Bed,
            center: Point2::new(10.0, 2.0),
            width: 1.8,
            depth: 2.0,
            rotation: 0.0,
        },
        Furniture {
            id: "f2".to_string(),
            kind: FurnitureKind::Sofa,
            center: Point2::new(2.0, 6.0),
            width: 2.2,
            depth: 0.9,
            rotation: 0.0,
        },
        Furniture {
            id: "f3".to_string(),
            kind: FurnitureKind::Toilet,
            center: Point2::new(8.5, 7.5),
            width: 0.4,
            depth: 0.6,
            rotation: 90.0,
        },
    ];

    let dimensions = vec![Dimension {
        id: "m1".to_string(),
        start: Point2::new(0.0, -1.0),
        end: Point2::new(12.0, -1.0),
        label: None,
    }];

    debug!(
        walls = walls.len(),
        openings = openings.len(),
        rooms = rooms.len(),
        "已构建演示平面图"
    );

    Sheet {
        title: "Stueplan".to_string(),
        number: "A-101".to_string(),
        sheet_type: "floor-plan".to_string(),
        scale: "1:100".to_string(),
        elements: SheetElements {
            walls,
            openings,
            rooms,
            furniture,
            dimensions,
        },
        metadata: SheetMetadata {
            total_area: 96.0,
            floor_level: 0,
            compliance: vec!["BR18".to_string()],
        },
        grid: Some(Grid { spacing: 3.0 }),
    }
}

/// 包含单张演示图纸的项目。
pub fn demo_blueprint() -> BlueprintData {
    BlueprintData {
        project_name: "Parcelhus Skovvej 12".to_string(),
        project_number: "2024-017".to_string(),
        architect: "Tegnestuen Nord".to_string(),
        client: "Familien Jensen".to_string(),
        location: "Aarhus".to_string(),
        building_code: "BR18".to_string(),
        sheets: vec![demo_sheet()],
        created_at: "2024-05-02T09:00:00Z".to_string(),
        updated_at: "2024-05-14T15:30:00Z".to_string(),
    }
}
