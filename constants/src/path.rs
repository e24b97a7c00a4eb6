/// Asset-relative location of the terrain manifest.
pub const RELATIVE_MANIFEST_PATH: &str = "terrain/manifest.json";

/// Path-finding endpoint used when the manifest does not name one.
pub const DEFAULT_PATH_SERVICE_URL: &str = "http://127.0.0.1:5000/find_rover_path";

/// Environment variable that overrides the path-finding endpoint.
pub const PATH_SERVICE_URL_ENV: &str = "TERRAIN_PATH_SERVICE_URL";

/// Seconds before an outstanding path request is reported as timed out.
pub const DEFAULT_PATH_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum traversable slope (degrees) offered when a path session starts.
pub const DEFAULT_MAX_SLOPE_DEGREES: f32 = 25.0;
