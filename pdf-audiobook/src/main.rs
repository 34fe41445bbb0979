//! pdf-audio - Convert PDF files to audiobooks using text-to-speech

mod audio;
mod config;
mod error;
mod pdf;
mod pipeline;
mod text;
mod tts;

use anyhow::{Context, Result};
use audio::{Capabilities, select_assembler};
use clap::{Parser, Subcommand};
use config::AudiobookConfig;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use pdf::{PageRange, PdfiumExtractor};
use pipeline::{ConversionReport, ConversionResult, ConvertOptions, Pipeline};
use speech_client::{ProviderOptions, get_provider, languages};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "pdf-audio")]
#[command(about = "Convert PDF files to audiobooks using text-to-speech", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the PDF file
    pdf_path: Option<PathBuf>,

    /// Output directory for audio files (default: audiobooks)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Language code for speech (e.g. en, fr, de)
    #[arg(short, long)]
    language: Option<String>,

    /// Speak slowly
    #[arg(short, long, default_value_t = false, overrides_with = "no_slow")]
    slow: bool,

    /// Speak at normal speed, even if the config says slow
    #[arg(long, default_value_t = false, overrides_with = "slow")]
    no_slow: bool,

    /// Merge parts into one file, even if the config disables it
    #[arg(long, default_value_t = false, overrides_with = "no_merge")]
    merge: bool,

    /// Keep separate part files instead of merging
    #[arg(long, default_value_t = false, overrides_with = "merge")]
    no_merge: bool,

    /// Keep part files after merging
    #[arg(long, default_value_t = false, overrides_with = "cleanup_parts")]
    keep_parts: bool,

    /// Delete part files after merging, even if the config keeps them
    #[arg(long, default_value_t = false, overrides_with = "keep_parts")]
    cleanup_parts: bool,

    /// Maximum characters per speech chunk
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Page range to convert (e.g., "3-10" or "5")
    #[arg(long)]
    pages: Option<String>,

    /// Print the conversion report as JSON on stdout
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Append log output to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// List supported language codes
    Languages,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default language
    SetLanguage {
        /// Language code (e.g. en, fr)
        code: String,
    },
    /// Set default output directory
    SetOutputDir {
        /// Directory for generated audio
        path: PathBuf,
    },
    /// Set default chunk size
    SetChunkSize {
        /// Maximum characters per chunk
        size: usize,
    },
    /// Set the speech endpoint's top-level domain
    SetTld {
        /// Domain suffix (e.g. com, co.uk)
        tld: String,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(&args) {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let level = if args.debug { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
    builder.format_timestamp_secs();

    if let Some(ref path) = args.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    Ok(())
}

fn run(args: Args) -> Result<ExitCode> {
    // Handle subcommands
    match &args.command {
        Some(Commands::Config { action }) => {
            handle_config_command(action)?;
            return Ok(ExitCode::SUCCESS);
        }
        Some(Commands::Languages) => {
            for (code, name) in languages::LANGUAGES {
                println!("{:<8} {}", code, name);
            }
            return Ok(ExitCode::SUCCESS);
        }
        None => {}
    }

    let pdf_path = args.pdf_path.clone().ok_or_else(|| {
        anyhow::anyhow!("PDF file path is required. Run 'pdf-audio --help' for usage.")
    })?;

    let config = AudiobookConfig::load().context("Failed to load configuration")?;
    let options = build_options(&args, &config, pdf_path)?;

    debug!("PDF: {}", options.pdf_path.display());
    debug!("Output: {}", options.output_dir.display());
    debug!("Language: {} (slow: {})", options.language, options.slow);
    debug!("Chunk size: {}", options.chunk_size);

    let capabilities = Capabilities::detect(config.ffmpeg_path.as_deref());
    debug!("Capabilities: {:?}", capabilities.list());
    let assembler = select_assembler(&capabilities);

    let provider = get_provider(
        config.provider,
        &ProviderOptions {
            tld: config.tld.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        },
    )?;

    let pdfium_path = config
        .pdfium_path
        .clone()
        .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));
    let extractor = PdfiumExtractor::new(pdfium_path);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let pb = if args.json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    let mut pipeline = Pipeline::new(
        options.clone(),
        capabilities,
        &extractor,
        provider.as_ref(),
        assembler.as_ref(),
    );

    let outcome = runtime.block_on(pipeline.run(|progress| {
        pb.set_length(progress.total as u64);
        pb.set_position(progress.completed as u64);
        pb.set_message(format!("{} ok", progress.succeeded));
    }));

    let report = match outcome {
        Ok(report) => {
            pb.finish_and_clear();
            report
        }
        Err(e) => {
            pb.abandon();
            return Err(e.into());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, &options);
    }

    Ok(ExitCode::SUCCESS)
}

/// Merge CLI flags over config defaults.
fn build_options(
    args: &Args,
    config: &AudiobookConfig,
    pdf_path: PathBuf,
) -> Result<ConvertOptions> {
    let chunk_size = args.chunk_size.unwrap_or(config.chunk_size);
    if chunk_size == 0 {
        anyhow::bail!("Chunk size must be greater than 0");
    }

    let page_range = args.pages.as_deref().map(PageRange::parse).transpose()?;

    Ok(ConvertOptions {
        pdf_path,
        output_dir: args
            .output
            .clone()
            .unwrap_or_else(|| config.output_dir.clone()),
        language: args
            .language
            .clone()
            .unwrap_or_else(|| config.language.clone()),
        slow: switch(args.slow, args.no_slow, config.slow),
        merge_files: switch(args.merge, args.no_merge, config.merge_files),
        cleanup_parts: switch(args.cleanup_parts, args.keep_parts, config.cleanup_parts),
        chunk_size,
        min_line_length: config.min_line_length,
        page_range,
    })
}

/// Resolve an on/off flag pair against the config default.
fn switch(on: bool, off: bool, default: bool) -> bool {
    if on {
        true
    } else if off {
        false
    } else {
        default
    }
}

fn print_summary(report: &ConversionReport, options: &ConvertOptions) {
    eprintln!();
    eprintln!(
        "Book: {} ({} of {} pages read)",
        report.book_name, report.pages_read, report.page_count
    );
    eprintln!(
        "Chunks: {} synthesized, {} failed",
        report.chunks_synthesized,
        report.chunk_failures.len()
    );
    if !report.cleanup_failures.is_empty() {
        eprintln!(
            "Warning: {} part file(s) could not be deleted",
            report.cleanup_failures.len()
        );
    }
    eprintln!(
        "{}",
        pipeline::describe_result(&report.result, &options.output_dir)
    );
    if let ConversionResult::Parts(_) = report.result {
        for path in report.result.paths() {
            eprintln!("  {}", path.display());
        }
    }
    info!(
        "Conversion complete in {}s",
        report.elapsed().num_seconds()
    );
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    let mut config = AudiobookConfig::load().context("Failed to load configuration")?;

    match action {
        ConfigAction::Show => {
            let path = AudiobookConfig::config_path()?;
            println!("Config file: {}", path.display());
            println!();
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::SetLanguage { code } => {
            if !languages::is_supported(code) {
                anyhow::bail!(
                    "Unsupported language '{}'. Run 'pdf-audio languages' to list supported codes",
                    code
                );
            }
            config.language = code.clone();
            config.save()?;
            println!("Default language set to: {}", code);
        }
        ConfigAction::SetOutputDir { path } => {
            config.output_dir = path.clone();
            config.save()?;
            println!("Default output directory set to: {}", path.display());
        }
        ConfigAction::SetChunkSize { size } => {
            if *size == 0 {
                anyhow::bail!("Chunk size must be greater than 0");
            }
            config.chunk_size = *size;
            config.save()?;
            println!("Default chunk size set to: {}", size);
        }
        ConfigAction::SetTld { tld } => {
            let tld = tld.trim().trim_start_matches('.');
            if tld.is_empty() {
                anyhow::bail!("Top-level domain must not be empty");
            }
            config.tld = tld.to_string();
            config.save()?;
            println!("Speech endpoint domain set to: translate.google.{}", tld);
        }
    }

    Ok(())
}
