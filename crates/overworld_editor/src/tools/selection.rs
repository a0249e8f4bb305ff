//! Object selection

use crate::document::Document;
use bevy::prelude::Resource;
use overworld_core::{ObjectId, Rect};
use std::collections::HashSet;
use uuid::Uuid;

/// How a new pick combines with the current selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectMode {
    #[default]
    Replace,
    Add,
    Toggle,
}

/// Currently selected objects
#[derive(Debug, Clone, Default, Resource)]
pub struct Selection {
    objects: HashSet<ObjectId>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.iter().copied()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    fn apply(&mut self, found: HashSet<ObjectId>, mode: SelectMode) {
        match mode {
            SelectMode::Replace => self.objects = found,
            SelectMode::Add => self.objects.extend(found),
            SelectMode::Toggle => {
                for id in found {
                    if !self.objects.remove(&id) {
                        self.objects.insert(id);
                    }
                }
            }
        }
    }

    /// Select objects overlapping a marquee, optionally only those owned by one level
    pub fn select_rect(
        &mut self,
        document: &mut Document,
        rect: Rect,
        level: Option<Uuid>,
        mode: SelectMode,
    ) {
        let mut found = HashSet::new();
        match level {
            Some(level) => document.search_level_objects(rect, level, &mut found),
            None => document.search_objects(rect, true, &mut found),
        }
        self.apply(found, mode);
    }

    /// Select the topmost object under the cursor. Returns what was picked.
    pub fn pick(
        &mut self,
        document: &mut Document,
        x: f32,
        y: f32,
        mode: SelectMode,
    ) -> Option<ObjectId> {
        let picked = document.pick_object(x, y);
        self.apply(picked.into_iter().collect(), mode);
        picked
    }

    /// Forget ids whose objects no longer exist
    pub fn retain_existing(&mut self, document: &Document) {
        self.objects.retain(|&id| document.object(id).is_some());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overworld_core::{GridConfig, ObjectKind};

    fn npc() -> ObjectKind {
        ObjectKind::Npc {
            image: "guard.png".to_string(),
            script: String::new(),
        }
    }

    #[test]
    fn test_marquee_modes() {
        let mut doc = Document::new_level("solo".to_string(), 64, 64, &GridConfig::default());
        let a = doc.place_object(npc(), Rect::new(10.0, 10.0, 16.0, 16.0), 0);
        let b = doc.place_object(npc(), Rect::new(300.0, 300.0, 16.0, 16.0), 0);
        let (Some(a), Some(b)) = (a, b) else {
            panic!("objects not placed");
        };

        let mut selection = Selection::default();
        selection.select_rect(&mut doc, Rect::new(0.0, 0.0, 100.0, 100.0), None, SelectMode::Replace);
        assert!(selection.contains(a) && !selection.contains(b));

        selection.select_rect(&mut doc, Rect::new(250.0, 250.0, 100.0, 100.0), None, SelectMode::Add);
        assert_eq!(selection.len(), 2);

        selection.select_rect(&mut doc, Rect::new(0.0, 0.0, 100.0, 100.0), None, SelectMode::Toggle);
        assert!(!selection.contains(a) && selection.contains(b));

        doc.remove_object(b);
        selection.retain_existing(&doc);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_pick_replaces_with_nothing_on_empty_space() {
        let mut doc = Document::new_level("solo".to_string(), 64, 64, &GridConfig::default());
        let a = doc.place_object(npc(), Rect::new(10.0, 10.0, 16.0, 16.0), 0);

        let mut selection = Selection::default();
        assert_eq!(selection.pick(&mut doc, 12.0, 12.0, SelectMode::Replace), a);
        assert_eq!(selection.len(), 1);
        assert_eq!(selection.pick(&mut doc, 500.0, 500.0, SelectMode::Replace), None);
        assert!(selection.is_empty());
    }
}
