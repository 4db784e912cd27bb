use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Context as _;
use regex::{Captures, Regex};

use crate::catalog::{Catalog, PointInfo, normalize_point_id};
use crate::cli::PromptArgs;
use crate::workspace::{Workspace, write_atomic};

/// Instruction template sent as the user message.
///
/// Only `{grammar_point}`, `{category}`, `{index}` and `{total}` are
/// substituted; every other brace is literal JSON sample syntax.
pub const PROMPT_TEMPLATE: &str = include_str!("templates/prompt.txt");

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(grammar_point|category|index|total)\}").expect("valid placeholder regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptFields {
    pub grammar_point: String,
    pub category: String,
    pub index: u32,
    pub total: usize,
}

impl PromptFields {
    pub fn for_point(info: &PointInfo<'_>, total: usize) -> anyhow::Result<Self> {
        let index = info
            .point
            .id
            .parse::<u32>()
            .with_context(|| format!("point id is not numeric: {}", info.point.id))?;
        Ok(Self {
            grammar_point: info.point.name.clone(),
            category: info.category.name.clone(),
            index,
            total,
        })
    }
}

pub fn render_prompt(fields: &PromptFields) -> anyhow::Result<String> {
    if fields.grammar_point.trim().is_empty() {
        anyhow::bail!("prompt field `grammar_point` is empty");
    }
    if fields.category.trim().is_empty() {
        anyhow::bail!("prompt field `category` is empty");
    }

    // Single pass so substituted values are never rescanned for tokens.
    let rendered = PLACEHOLDER.replace_all(PROMPT_TEMPLATE, |caps: &Captures<'_>| {
        match &caps[1] {
            "grammar_point" => fields.grammar_point.clone(),
            "category" => fields.category.clone(),
            "index" => fields.index.to_string(),
            _ => fields.total.to_string(),
        }
    });
    Ok(rendered.into_owned())
}

/// Renders and persists the prompt for one point id.
pub fn write_prompt(ws: &Workspace, catalog: &Catalog, point_id: &str) -> anyhow::Result<PathBuf> {
    let total = catalog.total();
    let last = catalog.max_point_number().unwrap_or(0);
    let number: u32 = point_id
        .parse()
        .with_context(|| format!("point id must be numeric: {point_id}"))?;
    if !(1..=last).contains(&number) {
        anyhow::bail!("point id {point_id} is out of range (1-{last})");
    }

    let info = catalog
        .find(point_id)
        .ok_or_else(|| anyhow::anyhow!("no grammar point with id {point_id}"))?;
    let fields = PromptFields::for_point(&info, total)?;
    let prompt = render_prompt(&fields).with_context(|| format!("render prompt: {point_id}"))?;

    let path = ws.prompt_path(point_id);
    write_atomic(&path, &prompt)?;
    tracing::info!(
        id = point_id,
        point = %fields.grammar_point,
        category = %fields.category,
        path = %path.display(),
        "prompt written"
    );
    Ok(path)
}

/// Renders prompts for the whole catalog; returns how many were written.
pub fn write_all_prompts(ws: &Workspace, catalog: &Catalog) -> anyhow::Result<usize> {
    let mut written = 0usize;
    for category in &catalog.categories {
        tracing::info!(category = %category.name, points = category.points.len(), "rendering prompts");
        for point in &category.points {
            write_prompt(ws, catalog, &point.id)?;
            written += 1;
        }
    }
    Ok(written)
}

pub fn load_prompt(ws: &Workspace, point_id: &str) -> std::io::Result<String> {
    std::fs::read_to_string(ws.prompt_path(point_id))
}

pub fn run(args: PromptArgs) -> anyhow::Result<()> {
    let ws = args.workspace.workspace();
    let catalog = Catalog::load(&ws.catalog)?;

    if args.all {
        let written = write_all_prompts(&ws, &catalog)?;
        println!(
            "wrote {written} prompt file(s) to {}",
            ws.prompts_dir.display()
        );
        return Ok(());
    }

    let Some(raw_id) = args.id.as_deref() else {
        anyhow::bail!("missing --id (or pass --all)");
    };
    let point_id = normalize_point_id(raw_id)?;
    let path = write_prompt(&ws, &catalog, &point_id)?;
    println!("{}", path.display());
    Ok(())
}
