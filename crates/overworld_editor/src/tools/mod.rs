//! Editor tools - viewport culling, selection, dragging, tile fill
//!
//! The viewport systems keep the set of visible drawables current and pull
//! child levels in from the [`LevelSource`] as they scroll into view.

mod drag;
mod fill;
mod selection;

pub use drag::*;
pub use fill::*;
pub use selection::*;

use bevy::prelude::*;
use overworld_core::{Drawable, LevelLoader, Rect};

use crate::document::Document;
use crate::preferences::EditorPreferences;

/// Plugin for editor tools and viewport state
pub struct EditorToolsPlugin;

impl Plugin for EditorToolsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Viewport>()
            .init_resource::<VisibleSet>()
            .init_resource::<Selection>()
            .init_resource::<DragState>()
            .add_systems(Update, (load_visible_levels, refresh_visible_set).chain());
    }
}

/// World-space rectangle the editor camera shows
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct Viewport {
    pub rect: Rect,
}

/// Drawables inside the viewport, back to front
#[derive(Resource, Debug, Clone, Default)]
pub struct VisibleSet {
    pub drawables: Vec<Drawable>,
    /// Rectangle the set was collected for
    pub collected_for: Rect,
}

/// Where child levels of an overworld are read from
#[derive(Resource)]
pub struct LevelSource(pub Box<dyn LevelLoader + Send + Sync>);

impl LevelSource {
    pub fn new(loader: impl LevelLoader + Send + Sync + 'static) -> Self {
        Self(Box::new(loader))
    }
}

fn padded_viewport(viewport: &Viewport, preferences: Option<&EditorPreferences>) -> Rect {
    let margin = preferences.map_or(0.0, |prefs| prefs.viewport_margin);
    viewport.rect.expanded(margin)
}

/// Load child levels that scrolled into view
fn load_visible_levels(
    viewport: Res<Viewport>,
    preferences: Option<Res<EditorPreferences>>,
    document: Option<ResMut<Document>>,
    source: Option<ResMut<LevelSource>>,
) {
    let (Some(mut document), Some(mut source)) = (document, source) else {
        return;
    };
    if !document.is_overworld() {
        return;
    }

    let rect = padded_viewport(&viewport, preferences.as_deref());
    // Searching bumps the document's counters; only a real load counts as a change.
    match document
        .bypass_change_detection()
        .load_visible(rect, source.0.as_mut())
    {
        Ok(0) => {}
        Ok(loaded) => {
            info!("Loaded {} level(s) around the viewport", loaded);
            document.set_changed();
        }
        Err(e) => error!("Failed to load level: {}", e),
    }
}

/// Recollect visible drawables when the viewport or the document changed
fn refresh_visible_set(
    viewport: Res<Viewport>,
    preferences: Option<Res<EditorPreferences>>,
    document: Option<ResMut<Document>>,
    mut visible: ResMut<VisibleSet>,
) {
    let Some(mut document) = document else {
        if !visible.drawables.is_empty() {
            visible.drawables.clear();
        }
        return;
    };
    let rect = padded_viewport(&viewport, preferences.as_deref());
    if !document.is_changed() && !viewport.is_changed() && visible.collected_for == rect {
        return;
    }

    visible.drawables = document.bypass_change_detection().collect_drawables(rect);
    visible.collected_for = rect;
}

#[cfg(test)]
mod tests {
    use super::*;
    use overworld_core::{
        DrawItem, GridConfig, LevelContents, LevelLoadError, MapObject, ObjectKind, TileMap,
        WorldContext,
    };

    /// Serves every level with one layer and one sign
    struct GeneratedLevels;

    impl LevelLoader for GeneratedLevels {
        fn load_level(
            &mut self,
            ctx: &mut WorldContext,
            name: &str,
        ) -> Result<LevelContents, LevelLoadError> {
            Ok(LevelContents {
                layers: vec![TileMap::new(0, 64, 64)],
                objects: vec![MapObject::new(
                    ctx,
                    ObjectKind::Sign {
                        text: name.to_string(),
                    },
                    Rect::new(120.0, 120.0, 16.0, 16.0),
                    0,
                )],
            })
        }
    }

    fn editor_app() -> App {
        let mut app = App::new();
        app.add_plugins(EditorToolsPlugin);
        app.insert_resource(Document::new_overworld(
            "kingdom".to_string(),
            3,
            3,
            1024.0,
            1024.0,
            &GridConfig::default(),
        ));
        app.insert_resource(LevelSource::new(GeneratedLevels));
        app
    }

    #[test]
    fn test_levels_load_as_viewport_scrolls() {
        let mut app = editor_app();
        app.world_mut().resource_mut::<Viewport>().rect = Rect::new(100.0, 100.0, 400.0, 300.0);
        app.update();

        let visible = app.world().resource::<VisibleSet>();
        let layers = visible
            .drawables
            .iter()
            .filter(|d| matches!(d.item, DrawItem::Layer { .. }))
            .count();
        let objects = visible
            .drawables
            .iter()
            .filter(|d| matches!(d.item, DrawItem::Object(_)))
            .count();
        assert_eq!(layers, 1);
        assert_eq!(objects, 1);

        // Straddle four levels.
        app.world_mut().resource_mut::<Viewport>().rect = Rect::new(900.0, 900.0, 400.0, 300.0);
        app.update();

        let document = app.world().resource::<Document>();
        let loaded = match &document.world {
            crate::document::EditedWorld::Overworld(overworld) => {
                overworld.levels().filter(|l| l.is_loaded()).count()
            }
            crate::document::EditedWorld::Level(_) => 0,
        };
        assert_eq!(loaded, 4);
        let visible = app.world().resource::<VisibleSet>();
        assert!(visible
            .drawables
            .iter()
            .any(|d| matches!(d.item, DrawItem::Layer { .. })));
    }

    #[test]
    fn test_layers_draw_before_objects_of_same_depth() {
        let mut app = editor_app();
        app.world_mut().resource_mut::<Viewport>().rect = Rect::new(0.0, 0.0, 200.0, 200.0);
        app.update();

        let visible = app.world().resource::<VisibleSet>();
        assert!(matches!(
            visible.drawables.first().map(|d| d.item),
            Some(DrawItem::Layer { .. })
        ));
        assert!(matches!(
            visible.drawables.last().map(|d| d.item),
            Some(DrawItem::Object(_))
        ));
    }
}
