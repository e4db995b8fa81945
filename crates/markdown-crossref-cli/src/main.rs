use anyhow::{Context, Result};
use clap::Parser;
use markdown_crossref_config::{Config, expand_sources};
use markdown_crossref_engine::Markdown;
use markdown_crossref_engine::extensions::{attributions, cite, figures, tables};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "markdown-crossref")]
#[command(about = "Render markdown with numbered figures, tables, citations and attributions")]
#[command(version)]
struct Cli {
    /// Markdown file to render, or `-` for stdin
    input: PathBuf,

    /// Write HTML here instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Config file (defaults to ./crossref.toml when present)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Extra bibliography file or glob, may be repeated
    #[arg(long = "bib", value_name = "PATH")]
    bibliographies: Vec<PathBuf>,

    /// Leave images untouched
    #[arg(long)]
    no_figures: bool,

    /// Leave tables untouched
    #[arg(long)]
    no_tables: bool,

    /// Number everything but skip the summary lists
    #[arg(long)]
    no_lists: bool,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    fn load_config(&self) -> Result<Config> {
        let loaded = match &self.config {
            Some(path) => {
                let config = Config::load_from_path(path)?;
                if config.is_none() {
                    anyhow::bail!("config file {} does not exist", path.display());
                }
                config
            }
            None => Config::load()?,
        };
        match loaded {
            Some(config) => Ok(config),
            None => {
                log::info!("no {} found, using defaults", Config::FILE_NAME);
                Ok(Config::default())
            }
        }
    }

    /// Merge command-line overrides into the loaded config.
    fn apply(&self, mut config: Config) -> Result<Config> {
        let extra = expand_sources(&self.bibliographies, Path::new(""))?;
        config.citations.sources.extend(extra);
        if self.no_lists {
            config.figures.list.enable = false;
            config.tables.list.enable = false;
            config.citations.list.enable = false;
            config.attributions.list.enable = false;
        }
        Ok(config)
    }

    fn pipeline(&self, config: Config) -> Result<Markdown> {
        let mut md = Markdown::new();
        if !self.no_figures {
            figures::add(&mut md, config.figures)?;
        }
        if !self.no_tables {
            tables::add(&mut md, config.tables)?;
        }
        if !config.citations.sources.is_empty() {
            cite::add(&mut md, config.citations).context("Failed to load bibliography")?;
        }
        if !config.attributions.sources.is_empty() {
            attributions::add(&mut md, config.attributions)?;
        }
        Ok(md)
    }
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut src = String::new();
        std::io::stdin()
            .read_to_string(&mut src)
            .context("Failed to read stdin")?;
        return Ok(src);
    }
    std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))
}

fn write_output(output: Option<&Path>, html: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, html)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.apply(cli.load_config()?)?;
    let md = cli.pipeline(config)?;

    let src = read_input(&cli.input)?;
    let html = md.render(&src);
    write_output(cli.output.as_deref(), &html)?;

    log::info!("rendered {} ({} bytes)", cli.input.display(), html.len());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(cli.log_level())
        .init();

    run(&cli)
}
