//! Debug artifacts written when a listing fails to load.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use trendbot_core::Platform;

/// Writes `html` to `<dir>/<platform>_<unix-ts>.html`, creating `dir` if needed.
///
/// # Errors
///
/// Returns any I/O error from creating the directory or writing the file.
pub fn dump_page(dir: &Path, platform: Platform, html: &str) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{platform}_{}.html", Utc::now().timestamp()));
    std::fs::write(&path, html)?;
    tracing::info!(platform = %platform, path = %path.display(), "saved debug page");
    Ok(path)
}
