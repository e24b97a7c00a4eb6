use bevy::prelude::*;

/// Per-asset load result. `Failed` still counts as settled so a missing
/// raster degrades sampling instead of blocking startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssetReadiness {
    #[default]
    Pending,
    Ready,
    Failed,
}

impl AssetReadiness {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Resource, Default, Debug)]
pub struct LoadingProgress {
    pub manifest_loaded: bool,
    pub slope_raster: AssetReadiness,
    pub hazard_raster: AssetReadiness,
    pub sampler_ready: bool,
    pub terrain_created: bool,
    pub asset_loading_states: Vec<(String, i32)>,
    /// Set when the terrain mesh cannot be used; loading stops here.
    pub terrain_error: Option<String>,
}

impl LoadingProgress {
    pub fn rasters_settled(&self) -> bool {
        self.slope_raster.is_settled() && self.hazard_raster.is_settled()
    }

    pub fn ready_to_run(&self) -> bool {
        self.sampler_ready && self.terrain_created
    }

    /// Record a terrain failure once; later reports are ignored.
    pub fn fail_terrain(&mut self, reason: String) -> bool {
        if self.terrain_error.is_some() {
            return false;
        }
        self.terrain_error = Some(reason);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_rasters_do_not_block_startup() {
        let mut progress = LoadingProgress {
            slope_raster: AssetReadiness::Failed,
            ..default()
        };
        assert!(!progress.rasters_settled());
        progress.hazard_raster = AssetReadiness::Ready;
        assert!(progress.rasters_settled());
        assert!(!progress.ready_to_run());
    }

    #[test]
    fn terrain_failure_is_recorded_once() {
        let mut progress = LoadingProgress::default();
        assert!(progress.fail_terrain("mesh missing".into()));
        assert!(!progress.fail_terrain("again".into()));
        assert_eq!(progress.terrain_error.as_deref(), Some("mesh missing"));
        assert!(!progress.ready_to_run());
    }
}
