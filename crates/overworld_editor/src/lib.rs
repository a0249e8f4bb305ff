//! overworld_editor - Editor glue for tile levels and overworlds
//!
//! This crate wires [`overworld_core`] into a Bevy app:
//! - The open [`Document`] (a standalone level or an overworld)
//! - Persisted [`EditorPreferences`]
//! - Selection, dragging and tile fill tools
//! - Viewport culling with lazy level loading
//!
//! # Usage
//!
//! ```rust,ignore
//! use bevy::prelude::*;
//! use overworld_editor::{Document, OverworldEditorPlugin};
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(OverworldEditorPlugin)
//!         .insert_resource(Document::new_level(
//!             "house.nw".to_string(),
//!             64,
//!             64,
//!             &Default::default(),
//!         ))
//!         .run();
//! }
//! ```

pub mod document;
pub mod preferences;
pub mod tools;

pub use overworld_core;

pub use document::{Document, EditedWorld};
pub use preferences::{EditorPreferences, PreferencesError};

use bevy::prelude::*;
use tools::EditorToolsPlugin;

/// Main editor plugin
pub struct OverworldEditorPlugin;

impl Plugin for OverworldEditorPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(EditorPreferences::load())
            .add_plugins(EditorToolsPlugin);
    }
}
