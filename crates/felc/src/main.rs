//! The FEL compiler CLI.
//!
//! Provides the `felc` command with the following subcommands:
//!
//! - `felc build <dir>` - Compile a FEL project to static HTML/CSS

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use felc::BuildError;

#[derive(Parser)]
#[command(name = "felc", version, about = "The FEL compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a FEL project (must contain config.fel and templates/)
    Build {
        /// Path to the project directory
        dir: PathBuf,

        /// Print diagnostics as a JSON array on stdout instead of rendering
        /// them with ariadne on stderr
        #[arg(long = "json-diagnostics")]
        json_diagnostics: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { dir, json_diagnostics } => {
            if let Err(code) = build(&dir, json_diagnostics) {
                process::exit(code);
            }
        }
    }
}

fn build(dir: &PathBuf, json_diagnostics: bool) -> Result<(), i32> {
    match felc::build_project(dir) {
        Ok(output) => {
            eprintln!("  wrote {} HTML file(s)", output.html_files.len());
            eprintln!("  wrote {}", output.css_file.display());
            Ok(())
        }
        Err(BuildError::Diagnostics(bundle)) => {
            if json_diagnostics {
                felc::report::render_json(&bundle);
            } else {
                felc::report::render_to_stderr(&bundle);
            }
            Err(1)
        }
        Err(BuildError::Layout(message)) => {
            eprintln!("error: {message}");
            Err(1)
        }
        Err(BuildError::Config(message)) => {
            eprintln!("error: {message}");
            Err(1)
        }
        Err(BuildError::Io(message)) => {
            eprintln!("error: {message}");
            Err(1)
        }
    }
}
