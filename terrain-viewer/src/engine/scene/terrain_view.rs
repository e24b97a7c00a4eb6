use crate::engine::loading::terrain_creator::TerrainMaterials;
use crate::engine::scene::landing_zones::LandingZone;
use crate::tools::bevy_engine::TerrainSurface;
use crate::tools::tool_manager::{TerrainView, ToolManager};
use bevy::prelude::*;

impl TerrainMaterials {
    pub fn for_view(&self, view: TerrainView) -> Handle<StandardMaterial> {
        match view {
            TerrainView::Textured => self.textured.clone(),
            TerrainView::Slope => self.slope.clone(),
            TerrainView::Hazard => self.hazard.clone(),
        }
    }
}

/// Swap the terrain material and landing-zone visibility when the view
/// changes. Tool artifacts are handled by the state machine itself.
pub fn apply_terrain_view(
    manager: Res<ToolManager>,
    terrain_materials: Res<TerrainMaterials>,
    mut terrain: Query<&mut MeshMaterial3d<StandardMaterial>, With<TerrainSurface>>,
    mut zones: Query<&mut Visibility, With<LandingZone>>,
    mut applied: Local<Option<TerrainView>>,
) {
    let view = manager.view();
    if *applied == Some(view) {
        return;
    }

    let material = terrain_materials.for_view(view);
    for mut terrain_material in &mut terrain {
        terrain_material.0 = material.clone();
    }

    let visibility = if view.shows_overlays() {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for mut zone_visibility in &mut zones {
        *zone_visibility = visibility;
    }

    info!("{}", view.label());
    *applied = Some(view);
}
