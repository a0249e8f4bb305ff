//! Loose level objects and the arena + grid that index them

use crate::spatial::{Bounded, SearchOutput, SpatialGrid};
use crate::{GridConfig, Rect, WorldContext};
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use std::cmp::Ordering;
use uuid::Uuid;

new_key_type! {
    /// Stable identity of an object inside its owning [`ObjectIndex`]
    pub struct ObjectId;
}

/// What an object is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A scripted character
    Npc {
        image: String,
        #[serde(default)]
        script: String,
    },
    /// A warp area leading to another level
    Link {
        destination: String,
        dest_x: f32,
        dest_y: f32,
    },
    /// Readable sign text
    Sign { text: String },
}

impl ObjectKind {
    /// Get display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            ObjectKind::Npc { .. } => "NPC",
            ObjectKind::Link { .. } => "Link",
            ObjectKind::Sign { .. } => "Sign",
        }
    }
}

/// A discrete object placed in a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapObject {
    pub kind: ObjectKind,
    /// World-space bounding box
    pub rect: Rect,
    /// Coarse drawing depth
    pub depth: i32,
    /// Tiebreak among equal depths, assigned once at creation
    pub micro_depth: f64,
    /// Owning level; `None` while detached (e.g. mid-drag outside every level)
    #[serde(skip)]
    pub level: Option<Uuid>,
}

impl MapObject {
    pub fn new(ctx: &mut WorldContext, kind: ObjectKind, rect: Rect, depth: i32) -> Self {
        Self {
            kind,
            rect,
            depth,
            micro_depth: ctx.next_micro_depth(),
            level: None,
        }
    }

    /// Move the top-left corner. The owner must re-index the object afterwards.
    pub fn set_position(&mut self, x: f32, y: f32) {
        self.rect.x = x;
        self.rect.y = y;
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.rect = self.rect.translated(dx, dy);
    }

    /// Drawing order key: depth, then micro-depth
    pub fn sort_key(&self) -> (i32, f64) {
        (self.depth, self.micro_depth)
    }
}

impl Bounded for MapObject {
    fn bounds(&self) -> Rect {
        self.rect
    }
}

/// Total order on `(depth, micro_depth)` keys
pub fn compare_sort_keys(a: (i32, f64), b: (i32, f64)) -> Ordering {
    a.0.cmp(&b.0).then_with(|| a.1.total_cmp(&b.1))
}

/// Objects owned by one standalone level or one overworld, plus their grid.
///
/// Removing an object always unindexes it first, so the grid never holds a
/// key whose slot is gone.
#[derive(Debug, Clone)]
pub struct ObjectIndex {
    objects: SlotMap<ObjectId, MapObject>,
    grid: SpatialGrid<ObjectId>,
}

impl ObjectIndex {
    pub fn new(bounds: Rect, config: &GridConfig) -> Self {
        Self {
            objects: SlotMap::with_key(),
            grid: SpatialGrid::new(bounds, config.cell_width, config.cell_height),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn grid(&self) -> &SpatialGrid<ObjectId> {
        &self.grid
    }

    /// Take ownership of an object and index it
    pub fn insert(&mut self, object: MapObject) -> ObjectId {
        let bounds = object.rect;
        let id = self.objects.insert(object);
        self.grid.add(id, bounds);
        id
    }

    /// Unindex and drop an object
    pub fn remove(&mut self, id: ObjectId) -> Option<MapObject> {
        self.grid.remove(id);
        self.objects.remove(id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&MapObject> {
        self.objects.get(id)
    }

    /// Mutable access; call [`update_spatial_entity`](Self::update_spatial_entity)
    /// after changing the bounds.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut MapObject> {
        self.objects.get_mut(id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &MapObject)> {
        self.objects.iter()
    }

    pub fn is_indexed(&self, id: ObjectId) -> bool {
        self.grid.is_indexed(id)
    }

    /// Index an owned object again, e.g. when an undo restores it
    pub fn add_to_spatial_map(&mut self, id: ObjectId) -> bool {
        match self.objects.get(id) {
            Some(object) => self.grid.add(id, object.rect),
            None => false,
        }
    }

    /// Stop indexing an owned object without dropping it
    pub fn remove_from_spatial_map(&mut self, id: ObjectId) -> bool {
        self.grid.remove(id)
    }

    /// Re-bucket an object after its bounds changed
    pub fn update_spatial_entity(&mut self, id: ObjectId) -> bool {
        match self.objects.get(id) {
            Some(object) => self.grid.update_entity(id, object.rect),
            None => false,
        }
    }

    pub fn search<O: SearchOutput<ObjectId>>(
        &mut self,
        ctx: &mut WorldContext,
        rect: Rect,
        accurate: bool,
        out: &mut O,
    ) {
        self.grid.search(ctx, rect, accurate, &self.objects, out);
    }

    pub fn search_filtered<O, P>(
        &mut self,
        ctx: &mut WorldContext,
        rect: Rect,
        accurate: bool,
        out: &mut O,
        mut predicate: P,
    ) where
        O: SearchOutput<ObjectId>,
        P: FnMut(ObjectId, &MapObject) -> bool,
    {
        let objects = &self.objects;
        self.grid
            .search_filtered(ctx, rect, accurate, objects, out, |id| {
                objects.get(id).is_some_and(|object| predicate(id, object))
            });
    }

    pub fn search_first<P>(&self, rect: Rect, accurate: bool, mut predicate: P) -> Option<ObjectId>
    where
        P: FnMut(ObjectId, &MapObject) -> bool,
    {
        self.grid.search_first(rect, accurate, &self.objects, |id| {
            self.objects
                .get(id)
                .is_some_and(|object| predicate(id, object))
        })
    }

    pub fn object_at(&self, x: f32, y: f32) -> Option<ObjectId> {
        self.grid.entity_at(x, y, &self.objects)
    }

    /// Drop every object
    pub fn clear(&mut self) {
        self.grid.clear();
        self.objects.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npc(ctx: &mut WorldContext, x: f32, y: f32) -> MapObject {
        MapObject::new(
            ctx,
            ObjectKind::Npc {
                image: "npc.png".to_string(),
                script: String::new(),
            },
            Rect::new(x, y, 32.0, 32.0),
            0,
        )
    }

    fn index() -> ObjectIndex {
        ObjectIndex::new(Rect::new(0.0, 0.0, 1024.0, 1024.0), &GridConfig::default())
    }

    #[test]
    fn test_micro_depth_orders_creation() {
        let mut ctx = WorldContext::new();
        let a = npc(&mut ctx, 0.0, 0.0);
        let b = npc(&mut ctx, 0.0, 0.0);
        assert_eq!(
            compare_sort_keys(a.sort_key(), b.sort_key()),
            Ordering::Less
        );

        let mut deep = npc(&mut ctx, 0.0, 0.0);
        deep.depth = -1;
        assert_eq!(
            compare_sort_keys(deep.sort_key(), a.sort_key()),
            Ordering::Less
        );
    }

    #[test]
    fn test_insert_indexes_and_remove_unindexes() {
        let mut ctx = WorldContext::new();
        let mut objects = index();
        let id = objects.insert(npc(&mut ctx, 100.0, 100.0));
        assert!(objects.is_indexed(id));
        assert_eq!(objects.object_at(110.0, 110.0), Some(id));

        let removed = objects.remove(id);
        assert!(removed.is_some());
        assert!(!objects.is_indexed(id));
        assert_eq!(objects.object_at(110.0, 110.0), None);
        assert!(objects.remove(id).is_none());
    }

    #[test]
    fn test_spatial_map_calls_follow_object_state() {
        let mut ctx = WorldContext::new();
        let mut objects = index();
        let id = objects.insert(npc(&mut ctx, 100.0, 100.0));

        assert!(objects.remove_from_spatial_map(id));
        assert!(!objects.remove_from_spatial_map(id));
        assert!(objects.contains(id));

        if let Some(object) = objects.get_mut(id) {
            object.set_position(700.0, 700.0);
        }
        // Not indexed: update does nothing.
        assert!(!objects.update_spatial_entity(id));
        assert!(objects.add_to_spatial_map(id));
        assert_eq!(objects.object_at(710.0, 710.0), Some(id));

        if let Some(object) = objects.get_mut(id) {
            object.set_position(10.0, 10.0);
        }
        assert!(objects.update_spatial_entity(id));

        let mut found = Vec::new();
        objects.search(&mut ctx, Rect::new(0.0, 0.0, 50.0, 50.0), true, &mut found);
        assert_eq!(found, vec![id]);
    }

    #[test]
    fn test_filtered_search_sees_objects() {
        let mut ctx = WorldContext::new();
        let mut objects = index();
        let npc_id = objects.insert(npc(&mut ctx, 10.0, 10.0));
        let sign_id = objects.insert(MapObject::new(
            &mut ctx,
            ObjectKind::Sign {
                text: "Welcome".to_string(),
            },
            Rect::new(20.0, 20.0, 16.0, 16.0),
            0,
        ));

        let mut signs = Vec::new();
        objects.search_filtered(
            &mut ctx,
            Rect::new(0.0, 0.0, 100.0, 100.0),
            true,
            &mut signs,
            |_, object| matches!(object.kind, ObjectKind::Sign { .. }),
        );
        assert_eq!(signs, vec![sign_id]);

        let first_npc = objects.search_first(Rect::new(0.0, 0.0, 100.0, 100.0), true, |_, o| {
            o.kind.display_name() == "NPC"
        });
        assert_eq!(first_npc, Some(npc_id));
    }
}
