// mundi-reflect: CLI entry point for the reflection tools (generate, parse, clean).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mundi-reflect", about = "Reflection code generator for the Mundi engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the source tree and emit .generated.h / .generated.cpp files.
    Generate {
        /// Path to mundi-reflect.toml.
        #[arg(long, default_value = "mundi-reflect.toml")]
        config: PathBuf,
        /// Ignore the build cache and re-render every header.
        #[arg(long)]
        force: bool,
    },
    /// Parse one header and print the classified entity as JSON.
    Parse {
        header: PathBuf,
        /// Header with the ADD_PROPERTY_* definitions.
        #[arg(long)]
        macro_header: Option<PathBuf>,
    },
    /// Delete the build cache.
    Clean {
        /// Path to mundi-reflect.toml.
        #[arg(long, default_value = "mundi-reflect.toml")]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate { config, force } => {
            mundi_reflect_codegen::run_generate(&config, force).map(|summary| {
                if summary.failures > 0 {
                    eprintln!("mundi-reflect: {} failures, see errors above", summary.failures);
                }
            })
        }
        Commands::Parse { header, macro_header } => {
            mundi_reflect_codegen::run_parse(&header, macro_header.as_deref()).map(|entity| match entity {
                Some(entity) => match serde_json::to_string_pretty(&entity) {
                    Ok(json) => println!("{json}"),
                    Err(e) => eprintln!("Error: {e}"),
                },
                None => eprintln!("{}: not a reflected type", header.display()),
            })
        }
        Commands::Clean { config } => mundi_reflect_codegen::run_clean(&config).map(|removed| {
            if removed {
                eprintln!("mundi-reflect: cache removed");
            } else {
                eprintln!("mundi-reflect: no cache to remove");
            }
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
