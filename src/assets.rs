//! Client-side files every generated page links to.

use crate::workspace::{Workspace, write_atomic};

/// Bundled assets as `(path under <docs>/assets, contents)`.
pub const BUNDLED: [(&str, &str); 2] = [
    ("js/main.js", include_str!("../templates/assets/js/main.js")),
    ("css/style.css", include_str!("../templates/assets/css/style.css")),
];

/// Writes bundled assets into the docs tree. Existing files are kept unless
/// `force` is set, so a customised stylesheet survives rebuilds.
pub fn install(ws: &Workspace, force: bool) -> anyhow::Result<usize> {
    let mut written = 0usize;
    for (relative, contents) in BUNDLED {
        let path = ws.asset_path(relative);
        if path.exists() && !force {
            continue;
        }
        write_atomic(&path, contents)?;
        tracing::debug!(path = %path.display(), "asset written");
        written += 1;
    }
    Ok(written)
}
