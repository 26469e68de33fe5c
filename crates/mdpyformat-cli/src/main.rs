use std::{
    fs,
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mdpyformat::{Document, RenderConfig, run_script, toc};

#[derive(Parser)]
#[command(name = "mdpyformat")]
#[command(about = "Render literate Python scripts to markdown")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a literate script and write the generated markdown
    Render {
        /// Python script calling header_md / print_md / eval_and_quote
        script: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML render configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Insert a table of contents into the rendered document
        #[arg(long)]
        toc: bool,

        /// Marker put in front of every line of captured output
        #[arg(long)]
        prefix: Option<String>,

        /// Do not escape underscores in prose and headers
        #[arg(long)]
        no_escape: bool,
    },

    /// Add anchors and a table of contents to a markdown file
    Toc {
        /// Markdown input
        input: PathBuf,

        /// Markdown output
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render {
            script,
            output,
            config,
            toc,
            prefix,
            no_escape,
        } => load_config(config.as_deref(), toc, prefix, no_escape)
            .and_then(|config| render(&script, output.as_deref(), config)),
        Commands::Toc { input, output } => add_toc(&input, &output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Reads the configuration file, if any, and applies the command-line overrides.
fn load_config(path: Option<&Path>, toc: bool, prefix: Option<String>, no_escape: bool) -> Result<RenderConfig> {
    let mut config = match path {
        Some(path) => RenderConfig::from_toml_file(path)?,
        None => RenderConfig::default(),
    };
    if toc {
        config.toc = true;
    }
    if let Some(prefix) = prefix {
        config.result_prefix = prefix;
    }
    if no_escape {
        config.escape_underscores = false;
    }
    Ok(config)
}

fn render(script: &Path, output: Option<&Path>, config: RenderConfig) -> Result<()> {
    let source = fs::read_to_string(script).with_context(|| format!("cannot read {}", script.display()))?;
    let script_name = script.display().to_string();
    log::info!("rendering {script_name}");

    if config.toc {
        // the TOC needs the whole document, so render into memory first
        let mut document = Document::new(Vec::new(), config);
        let result = run_script(&source, &script_name, &mut document);
        let text = String::from_utf8(document.into_inner()).context("rendered document is not valid UTF-8")?;
        let text = if result.is_ok() { toc::generate(&text)? } else { text };
        let mut out = open_output(output)?;
        out.write_all(text.as_bytes())?;
        out.flush()?;
        return result.map_err(anyhow::Error::new);
    }

    let mut document = Document::new(open_output(output)?, config);
    match run_script(&source, &script_name, &mut document) {
        Ok(()) => {
            document.finish()?;
            Ok(())
        }
        Err(err) => {
            // keep whatever was rendered up to the failure
            document.into_inner().flush()?;
            Err(anyhow::Error::new(err))
        }
    }
}

fn add_toc(input: &Path, output: &Path) -> Result<()> {
    let text = fs::read_to_string(input).with_context(|| format!("cannot read {}", input.display()))?;
    let text = toc::generate(&text).with_context(|| format!("cannot generate TOC for {}", input.display()))?;
    fs::write(output, text).with_context(|| format!("cannot write {}", output.display()))?;
    Ok(())
}

fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}
