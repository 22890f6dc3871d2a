use blueprint_core::edit::{OpeningChanges, PendingEdit, RoomChanges};
use blueprint_core::model::Sheet;

use super::rules::{MIN_DOOR_WIDTH, min_ceiling_height};
use super::{ComplianceIssue, codes};

/// 为可机械修复的问题生成待提交编辑，其余问题返回 `None`。
///
/// 门宽：加宽到 0.77 m；原位置放不下时沿墙向起点方向回移。
/// 净高：提高到房间类别的最低值。
pub fn auto_fix(issue: &ComplianceIssue, sheet: &Sheet) -> Option<PendingEdit> {
    let id = issue.element_id.as_deref()?;
    match issue.code {
        codes::DOOR_WIDTH => {
            let door = sheet.opening(id)?;
            let wall = sheet.wall(&door.wall_id)?;
            let length = wall.length();
            if length < MIN_DOOR_WIDTH {
                return None;
            }
            let dist = door.dist_from_start.min(length - MIN_DOOR_WIDTH).max(0.0);
            Some(PendingEdit::Opening {
                id: id.to_string(),
                changes: OpeningChanges {
                    width: Some(MIN_DOOR_WIDTH),
                    dist_from_start: (dist != door.dist_from_start).then_some(dist),
                    ..OpeningChanges::default()
                },
            })
        }
        codes::CEILING_HEIGHT => {
            let room = sheet.room(id)?;
            Some(PendingEdit::Room {
                id: id.to_string(),
                changes: RoomChanges {
                    ceiling_height: Some(min_ceiling_height(room.category())),
                    ..RoomChanges::default()
                },
            })
        }
        _ => None,
    }
}
