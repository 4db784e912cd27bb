use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    grammarsite::logging::init("info").context("init logging")?;

    let cli = grammarsite::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        grammarsite::cli::Command::Prompt(args) => {
            grammarsite::prompt::run(args).context("prompt")?;
        }
        grammarsite::cli::Command::Generate(args) => {
            grammarsite::generate::run(args).context("generate")?;
        }
        grammarsite::cli::Command::Page(args) => {
            grammarsite::page::run(args).context("page")?;
        }
        grammarsite::cli::Command::Build(args) => {
            grammarsite::build::run(args).context("build")?;
        }
        grammarsite::cli::Command::Pipeline(args) => {
            grammarsite::pipeline::run(args).context("pipeline")?;
        }
    }

    Ok(())
}
