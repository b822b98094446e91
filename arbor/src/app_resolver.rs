//! Lookup of the optional `_app` wrapper module.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::component::AppComponent;
use crate::error::Result;
use crate::loader::ModuleLoader;
use crate::tree::{list_entries, APP_MARKER};

/// Load the first `_app` module in `directory`, if one exists.
///
/// A program without one renders commands through [`crate::DefaultApp`].
pub async fn read_custom_app(
    directory: &Path,
    loader: &dyn ModuleLoader,
) -> Result<Option<Arc<dyn AppComponent>>> {
    for entry in list_entries(directory).await? {
        if entry.is_dir || !entry.name.starts_with(APP_MARKER) {
            continue;
        }
        if loader.module_stem(&entry.name) != Some(APP_MARKER) {
            continue;
        }
        debug!(path = %entry.path.display(), "found custom app module");
        return loader.load_app(&entry.path).await;
    }
    Ok(None)
}
