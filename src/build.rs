use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::Context as _;
use regex::Regex;

use crate::catalog::Catalog;
use crate::cli::BuildArgs;
use crate::page::{build_page, load_template};
use crate::sweep::{Outcome, SweepReport};
use crate::workspace::Workspace;

static CONTENT_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}\.json$").expect("valid content file regex"));

/// `NN.json` files in `dir`, sorted by name. A missing dir yields nothing.
pub fn list_content_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("read content dir: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if CONTENT_FILE.is_match(name) && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// True when `page` exists and was modified no earlier than `source`.
pub fn is_up_to_date(page: &Path, source: &Path) -> anyhow::Result<bool> {
    if !page.exists() {
        return Ok(false);
    }
    let page_mtime = std::fs::metadata(page)
        .and_then(|m| m.modified())
        .with_context(|| format!("stat page: {}", page.display()))?;
    let source_mtime = std::fs::metadata(source)
        .and_then(|m| m.modified())
        .with_context(|| format!("stat content: {}", source.display()))?;
    Ok(page_mtime >= source_mtime)
}

fn build_one(
    ws: &Workspace,
    catalog: &Catalog,
    template: &str,
    source: &Path,
    force: bool,
) -> anyhow::Result<Outcome> {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow::anyhow!("content file has no stem: {}", source.display()))?;
    let expected_page = ws.page_path_for_stem(stem);

    if !force && is_up_to_date(&expected_page, source)? {
        tracing::info!(id = stem, "page is up to date; skipping");
        return Ok(Outcome::Skipped);
    }

    let written = build_page(ws, catalog, template, source)?;
    if written != expected_page {
        tracing::warn!(
            id = stem,
            page = %written.display(),
            "content index differs from its file name; page written under the content index"
        );
    }
    Ok(Outcome::Written)
}

pub fn build_all(
    ws: &Workspace,
    catalog: &Catalog,
    template: &str,
    force: bool,
) -> anyhow::Result<SweepReport> {
    crate::assets::install(ws, force).context("install page assets")?;

    let files = list_content_files(&ws.content_dir)?;
    let mut report = SweepReport::default();
    if files.is_empty() {
        tracing::warn!(
            dir = %ws.content_dir.display(),
            "no content files found; run `grammarsite generate` first"
        );
        return Ok(report);
    }

    tracing::info!(files = files.len(), force, "build sweep");
    for source in &files {
        match build_one(ws, catalog, template, source, force) {
            Ok(outcome) => report.record(outcome),
            Err(err) => {
                tracing::error!(source = %source.display(), "build failed: {err:#}");
                report.record_failure();
            }
        }
    }
    Ok(report)
}

pub fn run(args: BuildArgs) -> anyhow::Result<()> {
    let ws = args.workspace.workspace();
    let catalog = Catalog::load(&ws.catalog)?;
    let template = load_template(&ws.template)?;
    let report = build_all(&ws, &catalog, &template, args.force)?;
    println!("build finished: {report}");
    Ok(())
}
