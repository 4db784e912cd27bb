use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::workspace::Workspace;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render prompt files from the catalog.
    Prompt(PromptArgs),
    /// Generate content JSON through the chat completions endpoint.
    Generate(GenerateArgs),
    /// Render one content file into an HTML page.
    Page(PageArgs),
    /// Rebuild every stale page from the content directory.
    Build(BuildArgs),
    /// Prompts, content, then pages for the whole catalog.
    Pipeline(PipelineArgs),
}

#[derive(Debug, Clone, Args)]
pub struct WorkspaceArgs {
    /// Site workspace root (holds config/, prompts/, content/, docs/, templates/).
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Catalog file (default: <root>/config/grammar_points.json).
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Rendered prompt directory (default: <root>/prompts/generated).
    #[arg(long)]
    pub prompts: Option<PathBuf>,

    /// Content JSON directory (default: <root>/content).
    #[arg(long)]
    pub content: Option<PathBuf>,

    /// HTML output directory (default: <root>/docs).
    #[arg(long)]
    pub docs: Option<PathBuf>,

    /// Page template (default: <root>/templates/grammar_page.html).
    #[arg(long)]
    pub template: Option<PathBuf>,
}

impl WorkspaceArgs {
    pub fn workspace(&self) -> Workspace {
        let mut ws = Workspace::at(&self.root);
        if let Some(path) = &self.catalog {
            ws.catalog = path.clone();
        }
        if let Some(path) = &self.prompts {
            ws.prompts_dir = path.clone();
        }
        if let Some(path) = &self.content {
            ws.content_dir = path.clone();
        }
        if let Some(path) = &self.docs {
            ws.docs_dir = path.clone();
        }
        if let Some(path) = &self.template {
            ws.template = path.clone();
        }
        ws
    }
}

#[derive(Debug, Args)]
pub struct PromptArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Point id to render (e.g. 05).
    #[arg(long, conflicts_with = "all", required_unless_present = "all")]
    pub id: Option<String>,

    /// Render prompts for every point in the catalog.
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Clone, Args)]
pub struct EndpointArgs {
    /// Chat completions base URL (must be http/https).
    #[arg(long, default_value = "https://api.deepseek.com")]
    pub base_url: String,

    /// Model identifier sent with every request.
    #[arg(long, default_value = "deepseek-chat")]
    pub model: String,

    /// Sampling temperature sent with every request.
    #[arg(long, default_value_t = 0.7)]
    pub temperature: f32,

    /// Upper bound on tokens in each completion.
    #[arg(long, default_value_t = 4000)]
    pub max_tokens: u32,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,

    /// Courtesy delay after each successful generation in a sweep.
    #[arg(long, default_value_t = 1000)]
    pub delay_ms: u64,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    #[command(flatten)]
    pub endpoint: EndpointArgs,

    /// First point id of the sweep.
    #[arg(long, default_value = "01")]
    pub start: String,

    /// Last point id of the sweep (default: last catalog point).
    #[arg(long)]
    pub end: Option<String>,

    /// Generate a single point; exits non-zero on failure.
    #[arg(long, conflicts_with_all = ["start", "end"])]
    pub single: Option<String>,

    /// Overwrite existing content.
    #[arg(long)]
    pub force: bool,

    /// Print catalog status without generating.
    #[arg(long)]
    pub list: bool,
}

#[derive(Debug, Args)]
pub struct PageArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Content JSON file to render.
    #[arg(long)]
    pub input: PathBuf,
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    /// Rebuild pages even when they are up to date.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct PipelineArgs {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    #[command(flatten)]
    pub endpoint: EndpointArgs,

    /// Regenerate content and rebuild pages even when present.
    #[arg(long)]
    pub force: bool,
}
