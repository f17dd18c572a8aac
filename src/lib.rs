pub mod analysis;
pub mod commands;
pub mod models;

use commands::{
    db::SqliteStore,
    fetch::CodeforcesClient,
    refresh::RefreshCoordinator,
    settings::{load_effective_settings, EffectiveSettings},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DATA_DIR_ENV: &str = "CFSTATS_DATA_DIR";

/// Everything a front end needs: settings, the on-disk store and the coordinator wired to
/// the live Codeforces client.
pub struct AppContext {
    pub data_dir: PathBuf,
    pub settings: EffectiveSettings,
    pub coordinator: Arc<RefreshCoordinator>,
}

pub fn init_context(data_dir: &Path) -> Result<AppContext, String> {
    let settings = load_effective_settings(data_dir)?;
    let store = Arc::new(SqliteStore::open(data_dir)?);
    let client = CodeforcesClient::new(
        &settings.api_base_url,
        settings.connect_timeout,
        settings.read_timeout,
    )?;

    let coordinator = Arc::new(RefreshCoordinator::new(
        Arc::new(client),
        store,
        settings.heatmap.cache_enabled,
    ));

    Ok(AppContext {
        data_dir: data_dir.to_path_buf(),
        settings,
        coordinator,
    })
}

/// Platform data directory for the app, e.g. `~/.local/share/cfstats` on Linux.
pub fn default_data_dir() -> Result<PathBuf, String> {
    let dirs = directories::ProjectDirs::from("com", "example", "cfstats")
        .ok_or("Unable to determine data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
