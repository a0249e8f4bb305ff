//! Dragging objects with the cursor
//!
//! While the drag is live the object is only re-bucketed; ownership moves to
//! the level under it once the drag finishes.

use crate::document::Document;
use bevy::prelude::Resource;
use overworld_core::{ObjectId, Rect};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveDrag {
    id: ObjectId,
    /// Cursor offset from the object's top-left corner
    grab_dx: f32,
    grab_dy: f32,
    /// Rectangle before the drag started
    origin: Rect,
}

/// Result of a finished drag, enough to undo it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragOutcome {
    pub id: ObjectId,
    pub from: Rect,
    pub to: Rect,
    /// Owner after the drop, `None` when dropped outside every level
    pub level: Option<Uuid>,
}

/// In-progress object drag
#[derive(Debug, Clone, Default, Resource)]
pub struct DragState {
    active: Option<ActiveDrag>,
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn dragged(&self) -> Option<ObjectId> {
        self.active.map(|drag| drag.id)
    }

    /// Grab the topmost object under the cursor
    pub fn begin(&mut self, document: &mut Document, x: f32, y: f32) -> Option<ObjectId> {
        let id = document.pick_object(x, y)?;
        let origin = document.object(id)?.rect;
        self.active = Some(ActiveDrag {
            id,
            grab_dx: x - origin.x,
            grab_dy: y - origin.y,
            origin,
        });
        Some(id)
    }

    /// Follow the cursor. Returns whether the object changed grid cells.
    pub fn update(&mut self, document: &mut Document, x: f32, y: f32) -> bool {
        let Some(drag) = self.active else {
            return false;
        };
        let Some(object) = document.object_mut(drag.id) else {
            self.active = None;
            return false;
        };
        object.set_position(x - drag.grab_dx, y - drag.grab_dy);
        document.update_spatial_entity(drag.id)
    }

    /// Drop the object and hand it to the level beneath it
    pub fn finish(&mut self, document: &mut Document) -> Option<DragOutcome> {
        let drag = self.active.take()?;
        let level = document.relocate(drag.id);
        let to = document.object(drag.id)?.rect;
        Some(DragOutcome {
            id: drag.id,
            from: drag.origin,
            to,
            level,
        })
    }

    /// Put the object back where it was
    pub fn cancel(&mut self, document: &mut Document) {
        let Some(drag) = self.active.take() else {
            return;
        };
        if let Some(object) = document.object_mut(drag.id) {
            object.rect = drag.origin;
            document.update_spatial_entity(drag.id);
        }
    }
}
