use std::io::Write as _;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Context as _;
use regex::Regex;

use crate::catalog::{Catalog, normalize_point_id};
use crate::cli::GenerateArgs;
use crate::content::missing_required_field;
use crate::error::GenerateError;
use crate::openai::{ChatClient, CompletionProvider, EndpointConfig};
use crate::prompt::load_prompt;
use crate::sweep::{Outcome, SweepReport};
use crate::workspace::{Workspace, write_atomic};

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("valid fence regex"));
static FENCED_ANY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```\s*(.*?)\s*```").expect("valid fence regex"));

/// Parses the whole response, then the first ```json block, then the first
/// untagged block.
pub fn extract_json(text: &str) -> Result<serde_json::Value, GenerateError> {
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }

    for pattern in [&*FENCED_JSON, &*FENCED_ANY] {
        let Some(body) = pattern.captures(text).and_then(|caps| caps.get(1)) else {
            continue;
        };
        if let Ok(value) = serde_json::from_str(body.as_str()) {
            return Ok(value);
        }
    }

    Err(GenerateError::Unparseable)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratorConfig {
    pub force: bool,
    /// Pause after each successful generation within a sweep.
    pub delay: Duration,
}

pub struct ContentGenerator<'a, P> {
    provider: P,
    ws: &'a Workspace,
    catalog: &'a Catalog,
    config: GeneratorConfig,
}

impl<'a, P: CompletionProvider> ContentGenerator<'a, P> {
    pub fn new(
        provider: P,
        ws: &'a Workspace,
        catalog: &'a Catalog,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            provider,
            ws,
            catalog,
            config,
        }
    }

    /// Obtains and persists content for one point unless it already exists.
    pub fn generate_one(&self, point_id: &str) -> Result<Outcome, GenerateError> {
        let info = self
            .catalog
            .find(point_id)
            .ok_or_else(|| GenerateError::UnknownPoint {
                id: point_id.to_owned(),
            })?;

        let out_path = self.ws.content_path(point_id);
        if out_path.exists() && !self.config.force {
            tracing::info!(
                id = point_id,
                path = %out_path.display(),
                "content exists; skipping (use --force to overwrite)"
            );
            return Ok(Outcome::Skipped);
        }

        tracing::info!(
            id = point_id,
            total = self.catalog.total(),
            point = %info.point.name,
            category = %info.category.name,
            "generating content"
        );

        let prompt = load_prompt(self.ws, point_id).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                GenerateError::MissingPrompt {
                    path: self.ws.prompt_path(point_id).display().to_string(),
                }
            } else {
                GenerateError::Io(anyhow::Error::new(err).context("read prompt"))
            }
        })?;

        let response = self
            .provider
            .complete(&prompt)
            .map_err(GenerateError::Endpoint)?;

        let value = extract_json(&response)?;
        if let Some(field) = missing_required_field(&value) {
            return Err(GenerateError::Malformed { field });
        }

        let mut pretty = serde_json::to_string_pretty(&value)
            .context("serialize content")
            .map_err(GenerateError::Io)?;
        pretty.push('\n');
        write_atomic(&out_path, &pretty).map_err(GenerateError::Io)?;

        tracing::info!(id = point_id, path = %out_path.display(), "content written");
        Ok(Outcome::Written)
    }

    /// Runs every catalog point numbered within `start..=end`, tolerating
    /// per-item failures.
    pub fn sweep(&self, start: u32, end: u32) -> SweepReport {
        let mut report = SweepReport::default();
        for point_id in self.catalog.point_ids_in_range(start, end) {
            match self.generate_one(&point_id) {
                Ok(outcome) => {
                    report.record(outcome);
                    if outcome == Outcome::Written && !self.config.delay.is_zero() {
                        std::thread::sleep(self.config.delay);
                    }
                }
                Err(err) => {
                    tracing::error!(id = %point_id, transient = err.is_transient(), "{err}");
                    report.record_failure();
                }
            }
        }
        report
    }
}

/// Writes the catalog grouped by category with a content-present marker.
pub fn write_status(
    out: &mut impl std::io::Write,
    ws: &Workspace,
    catalog: &Catalog,
) -> std::io::Result<()> {
    for category in &catalog.categories {
        writeln!(out, "【{}】", category.name)?;
        for point in &category.points {
            let mark = if ws.content_path(&point.id).exists() {
                "✓"
            } else {
                "○"
            };
            writeln!(out, "  {mark} {}. {}", point.id, point.name)?;
        }
    }
    Ok(())
}

pub fn parse_range(catalog: &Catalog, start: &str, end: Option<&str>) -> anyhow::Result<(u32, u32)> {
    let start: u32 = normalize_point_id(start)?.parse()?;
    let end: u32 = match end {
        Some(end) => normalize_point_id(end)?.parse()?,
        None => catalog
            .max_point_number()
            .ok_or_else(|| anyhow::anyhow!("catalog has no numeric point ids"))?,
    };
    if start == 0 || start > end {
        anyhow::bail!("invalid id range: {start:02}..={end:02}");
    }
    Ok((start, end))
}

pub fn run(args: GenerateArgs) -> anyhow::Result<()> {
    let ws = args.workspace.workspace();
    let catalog = Catalog::load(&ws.catalog)?;

    if args.list {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        write_status(&mut out, &ws, &catalog).context("write status")?;
        out.flush().context("flush status")?;
        return Ok(());
    }

    let endpoint = EndpointConfig::from_args(&args.endpoint)?;
    let client = ChatClient::new(endpoint)?;
    let config = GeneratorConfig {
        force: args.force,
        delay: Duration::from_millis(args.endpoint.delay_ms),
    };
    let generator = ContentGenerator::new(client, &ws, &catalog, config);

    if let Some(single) = args.single.as_deref() {
        let point_id = normalize_point_id(single)?;
        let outcome = generator
            .generate_one(&point_id)
            .with_context(|| format!("generate content: {point_id}"))?;
        println!("{point_id}: {outcome:?}");
        return Ok(());
    }

    let (start, end) = parse_range(&catalog, &args.start, args.end.as_deref())?;
    tracing::info!(start, end, force = args.force, "generation sweep");
    let report = generator.sweep(start, end);
    println!("generation finished: {report}");
    Ok(())
}
