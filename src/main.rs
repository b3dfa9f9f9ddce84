use anyhow::Result;
use clap::{Parser, Subcommand};
use mdbook::preprocess::{CmdPreprocessor, Preprocessor};
use mdbook_aoc_macros::AocMacrosPreprocessor;
use std::io;
use std::process::exit;

/// mdBook preprocessor expanding link_day, link_input and include_source macros
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether a renderer is supported (exit status 0 if it is)
    Supports { renderer: String },
}

pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let preprocessor = AocMacrosPreprocessor::new();

    if let Some(Command::Supports { renderer }) = cli.command {
        if preprocessor.supports_renderer(&renderer) {
            exit(0);
        } else {
            exit(1);
        }
    }

    // Run as preprocessor
    if let Err(e) = handle_preprocessing(&preprocessor) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

fn handle_preprocessing(preprocessor: &AocMacrosPreprocessor) -> Result<()> {
    let (ctx, book) = CmdPreprocessor::parse_input(io::stdin())?;

    if ctx.mdbook_version != mdbook::MDBOOK_VERSION {
        log::warn!(
            "The {} preprocessor was built against mdbook {}, but is called from mdbook {}",
            preprocessor.name(),
            mdbook::MDBOOK_VERSION,
            ctx.mdbook_version
        );
    }

    let processed_book = preprocessor.run(&ctx, book)?;

    serde_json::to_writer(io::stdout(), &processed_book)?;

    Ok(())
}
