use std::time::Duration;

use anyhow::Context as _;

use crate::catalog::Catalog;
use crate::cli::PipelineArgs;
use crate::generate::{ContentGenerator, GeneratorConfig, parse_range};
use crate::openai::{ChatClient, EndpointConfig};

pub fn run(args: PipelineArgs) -> anyhow::Result<()> {
    let ws = args.workspace.workspace();
    let catalog = Catalog::load(&ws.catalog)?;
    let template = crate::page::load_template(&ws.template)?;
    let endpoint = EndpointConfig::from_args(&args.endpoint)?;

    tracing::info!(root = %args.workspace.root.display(), "pipeline: prompts");
    let prompts = crate::prompt::write_all_prompts(&ws, &catalog).context("render prompts")?;

    tracing::info!(prompts, "pipeline: generate");
    let client = ChatClient::new(endpoint)?;
    let generator = ContentGenerator::new(
        client,
        &ws,
        &catalog,
        GeneratorConfig {
            force: args.force,
            delay: Duration::from_millis(args.endpoint.delay_ms),
        },
    );
    let (start, end) = parse_range(&catalog, "01", None)?;
    let generated = generator.sweep(start, end);
    println!("generation finished: {generated}");

    tracing::info!("pipeline: build");
    let built = crate::build::build_all(&ws, &catalog, &template, args.force)
        .context("build pages")?;
    println!("build finished: {built}");

    Ok(())
}
