//! 属性面板的“待提交编辑”：先整体校验，再一次性写入目标元素。

use crate::errors::ModelError;
use crate::model::{Material, Sheet, Swing, SwingDirection, WallType};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WallChanges {
    pub thickness: Option<f64>,
    pub material: Option<Material>,
    pub wall_type: Option<WallType>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpeningChanges {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub dist_from_start: Option<f64>,
    pub swing: Option<Swing>,
    pub swing_direction: Option<SwingDirection>,
    pub sill_height: Option<f64>,
    pub threshold_height: Option<f64>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomChanges {
    pub label: Option<String>,
    pub room_type: Option<String>,
    pub flooring: Option<String>,
    pub ceiling_height: Option<f64>,
}

/// 针对单个元素的编辑。墙体几何（起止点）不可编辑。
#[derive(Debug, Clone, PartialEq)]
pub enum PendingEdit {
    Wall { id: String, changes: WallChanges },
    Opening { id: String, changes: OpeningChanges },
    Room { id: String, changes: RoomChanges },
}

impl PendingEdit {
    pub fn target_id(&self) -> &str {
        match self {
            PendingEdit::Wall { id, .. }
            | PendingEdit::Opening { id, .. }
            | PendingEdit::Room { id, .. } => id,
        }
    }

    /// 应用编辑。任一字段校验失败时图纸保持原样。
    pub fn apply(self, sheet: &mut Sheet) -> Result<(), ModelError> {
        match self {
            PendingEdit::Wall { id, changes } => apply_wall(sheet, &id, changes),
            PendingEdit::Opening { id, changes } => apply_opening(sheet, &id, changes),
            PendingEdit::Room { id, changes } => apply_room(sheet, &id, changes),
        }
    }
}

fn require_positive(field: &'static str, value: Option<f64>) -> Result<(), ModelError> {
    match value {
        Some(value) if !(value > 0.0 && value.is_finite()) => {
            Err(ModelError::InvalidValue { field, value })
        }
        _ => Ok(()),
    }
}

fn require_non_negative(field: &'static str, value: Option<f64>) -> Result<(), ModelError> {
    match value {
        Some(value) if !(value >= 0.0 && value.is_finite()) => {
            Err(ModelError::InvalidValue { field, value })
        }
        _ => Ok(()),
    }
}

fn apply_wall(sheet: &mut Sheet, id: &str, changes: WallChanges) -> Result<(), ModelError> {
    require_positive("thickness", changes.thickness)?;
    let wall = sheet
        .elements
        .walls
        .iter_mut()
        .find(|wall| wall.id == id)
        .ok_or_else(|| ModelError::ElementNotFound(id.to_string()))?;
    if let Some(thickness) = changes.thickness {
        wall.thickness = thickness;
    }
    if let Some(material) = changes.material {
        wall.material = material;
    }
    if let Some(wall_type) = changes.wall_type {
        wall.wall_type = wall_type;
    }
    Ok(())
}

fn apply_opening(sheet: &mut Sheet, id: &str, changes: OpeningChanges) -> Result<(), ModelError> {
    require_positive("width", changes.width)?;
    require_positive("height", changes.height)?;
    require_non_negative("distFromStart", changes.dist_from_start)?;
    require_non_negative("sillHeight", changes.sill_height)?;
    require_non_negative("thresholdHeight", changes.threshold_height)?;

    let current = sheet
        .opening(id)
        .ok_or_else(|| ModelError::ElementNotFound(id.to_string()))?;
    let width = changes.width.unwrap_or(current.width);
    let dist = changes.dist_from_start.unwrap_or(current.dist_from_start);
    // 宿主墙缺失时无法校验位置，由几何层按悬空引用处理。
    if let Some(wall) = sheet.wall(&current.wall_id) {
        let available = wall.length();
        if dist + width > available + 1e-9 {
            return Err(ModelError::OpeningDoesNotFit {
                id: id.to_string(),
                wall_id: wall.id.clone(),
                required: dist + width,
                available,
            });
        }
    }

    let opening = sheet
        .elements
        .openings
        .iter_mut()
        .find(|opening| opening.id == id)
        .ok_or_else(|| ModelError::ElementNotFound(id.to_string()))?;
    opening.width = width;
    opening.dist_from_start = dist;
    if let Some(height) = changes.height {
        opening.height = height;
    }
    if let Some(swing) = changes.swing {
        opening.swing = swing;
    }
    if let Some(direction) = changes.swing_direction {
        opening.swing_direction = direction;
    }
    if let Some(sill) = changes.sill_height {
        opening.sill_height = Some(sill);
    }
    if let Some(threshold) = changes.threshold_height {
        opening.threshold_height = Some(threshold);
    }
    if let Some(tag) = changes.tag {
        opening.tag = tag;
    }
    Ok(())
}

fn apply_room(sheet: &mut Sheet, id: &str, changes: RoomChanges) -> Result<(), ModelError> {
    require_positive("ceilingHeight", changes.ceiling_height)?;
    let room = sheet
        .elements
        .rooms
        .iter_mut()
        .find(|room| room.id == id)
        .ok_or_else(|| ModelError::ElementNotFound(id.to_string()))?;
    if let Some(label) = changes.label {
        room.label = label;
    }
    if let Some(room_type) = changes.room_type {
        room.room_type = room_type;
    }
    if let Some(flooring) = changes.flooring {
        room.flooring = flooring;
    }
    if let Some(height) = changes.ceiling_height {
        room.ceiling_height = Some(height);
    }
    Ok(())
}
