use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

/// Resolved on-disk layout of a site workspace.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub catalog: PathBuf,
    pub prompts_dir: PathBuf,
    pub content_dir: PathBuf,
    pub docs_dir: PathBuf,
    pub template: PathBuf,
}

impl Workspace {
    pub fn at(root: &Path) -> Self {
        Self {
            catalog: root.join("config").join("grammar_points.json"),
            prompts_dir: root.join("prompts").join("generated"),
            content_dir: root.join("content"),
            docs_dir: root.join("docs"),
            template: root.join("templates").join("grammar_page.html"),
        }
    }

    pub fn prompt_path(&self, point_id: &str) -> PathBuf {
        self.prompts_dir.join(format!("prompt_{point_id}.txt"))
    }

    pub fn content_path(&self, point_id: &str) -> PathBuf {
        self.content_dir.join(format!("{point_id}.json"))
    }

    pub fn page_path(&self, index: u32) -> PathBuf {
        self.docs_dir.join(format!("{index:02}.html"))
    }

    pub fn page_path_for_stem(&self, stem: &str) -> PathBuf {
        self.docs_dir.join(format!("{stem}.html"))
    }

    /// Location of a bundled client asset under `<docs>/assets`.
    pub fn asset_path(&self, relative: &str) -> PathBuf {
        self.docs_dir.join("assets").join(relative)
    }
}

#[cfg(unix)]
const OUTPUT_MODE: u32 = 0o644;

/// Replaces `path` with `contents` via a sibling temp file.
pub fn write_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create output dir: {}", parent.display()))?;

    let mut file = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in: {}", parent.display()))?;
    // Temp files start at 0600; published output must stay world-readable.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        file.as_file()
            .set_permissions(std::fs::Permissions::from_mode(OUTPUT_MODE))
            .with_context(|| format!("set permissions: {}", path.display()))?;
    }
    file.write_all(contents.as_bytes())
        .with_context(|| format!("write output: {}", path.display()))?;
    file.flush()
        .with_context(|| format!("flush output: {}", path.display()))?;
    file.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("persist output: {}", path.display()))?;
    Ok(())
}
