use std::{path::PathBuf, sync::Arc};

use clap::{CommandFactory, Parser, error::ErrorKind};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use vobsrt::{
    ConvertOptions, Converter, FfmpegLogLevel, ProgressCallback, ProgressEvent, ProgressInfo,
    RecognitionLevel, RecognitionOptions, VobsrtError,
};

const CLI_AFTER_HELP: &str = "Examples:\n  vobsrt -i movie.idx -o movie.srt\n  vobsrt -i movie.idx -o movie.srt -q accurate --progress --verbose\n  vobsrt -i film.idx -o film.srt --language deu --overwrite\n  vobsrt --completions zsh > _vobsrt\n\nThe payload (.sub) must sit next to the index with the same name.";

#[derive(Debug, Parser)]
#[command(
    name = "vobsrt",
    version,
    about = "Convert VobSub (.idx/.sub) subtitles to SubRip (.srt)",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Path to the VobSub index file (.idx).
    #[arg(short, long, required_unless_present = "completions")]
    input: Option<PathBuf>,

    /// Path of the SubRip file to write.
    #[arg(short, long, required_unless_present = "completions")]
    output: Option<PathBuf>,

    /// Show additional logging output.
    #[arg(short, long)]
    verbose: bool,

    /// Recognition quality (fast, accurate).
    #[arg(short, long, default_value = "fast")]
    quality: String,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Allow overwriting an existing output file.
    #[arg(long)]
    overwrite: bool,

    /// FFmpeg executable to use.
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Tesseract executable to use.
    #[arg(long, default_value = "tesseract")]
    tesseract: PathBuf,

    /// Tesseract language code (for example eng, fra, deu+eng).
    #[arg(long, default_value = "eng")]
    language: String,

    /// FFmpeg log level while rendering: quiet, panic, fatal, error, warning,
    /// info, verbose, debug, or trace.
    #[arg(long)]
    log_level: Option<String>,

    /// Number of recognition workers.
    #[arg(long)]
    threads: Option<usize>,

    /// Images per recognition batch.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Minimum word confidence between 0.0 and 1.0.
    #[arg(long)]
    min_confidence: Option<f32>,

    /// Maximum characters per subtitle line.
    #[arg(long)]
    max_line_length: Option<usize>,

    /// Keep the working directory with the rendered frames.
    #[arg(long)]
    keep_work_dir: bool,

    /// Print a shell completion script and exit.
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn parse_quality(value: &str) -> Option<RecognitionLevel> {
    RecognitionLevel::from_name(value.trim())
}

fn parse_log_level(value: &str) -> Option<FfmpegLogLevel> {
    FfmpegLogLevel::from_name(value.trim())
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    if let Err(error) = SimpleLogger::new().with_level(level).env().init() {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("could not initialize logging: {error}").yellow()
        );
    }
}

fn build_options(cli: &Cli) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
    let level = parse_quality(&cli.quality)
        .ok_or(format!("unsupported --quality: {} (use fast or accurate)", cli.quality))?;

    let mut recognition = RecognitionOptions::new().with_level(level);
    if let Some(threads) = cli.threads {
        recognition = recognition.with_max_threads(threads);
    }
    if let Some(size) = cli.batch_size {
        recognition = recognition.with_batch_size(size);
    }
    if let Some(confidence) = cli.min_confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(
                format!("--min-confidence must be between 0.0 and 1.0, got {confidence}").into(),
            );
        }
        recognition = recognition.with_min_confidence(confidence);
    }

    let mut options = ConvertOptions::new()
        .with_recognition(recognition)
        .with_ffmpeg(cli.ffmpeg.clone())
        .with_tesseract(cli.tesseract.clone())
        .with_language(cli.language.clone())
        .with_overwrite(cli.overwrite)
        .with_keep_work_dir(cli.keep_work_dir);

    if let Some(level) = &cli.log_level {
        let parsed = parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?;
        options = options.with_ffmpeg_log_level(parsed);
    }
    if let Some(length) = cli.max_line_length {
        if length == 0 {
            return Err("--max-line-length must be at least 1".into());
        }
        options = options.with_max_line_length(length);
    }

    Ok(options)
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if info.event == ProgressEvent::Started {
            self.bar.reset();
            self.bar.set_message(info.stage.label());
        }
        if let Some(slots) = info.slots {
            self.bar.set_length(slots as u64);
        }
        self.bar.set_position(info.handled as u64);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let code = match error.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            // Printing can only fail if the terminal is gone.
            let _ = error.print();
            std::process::exit(code);
        }
    };

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "vobsrt", &mut std::io::stdout());
        return Ok(());
    }

    init_logging(cli.verbose);

    let input = cli.input.clone().ok_or("missing --input")?;
    let output = cli.output.clone().ok_or("missing --output")?;

    if output.exists() && cli.overwrite {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!("overwriting {}", output.display()).yellow()
        );
    }

    let mut options = build_options(&cli)?;
    let progress = if cli.progress {
        let progress = Arc::new(TerminalProgress::new()?);
        options = options.with_progress(progress.clone());
        Some(progress)
    } else {
        None
    };

    let result = Converter::new(options).convert(&input, &output);

    if let Some(progress) = progress {
        progress.bar.finish_and_clear();
    }

    let summary = result.map_err(|error| match error {
        VobsrtError::OutputExists(path) => format!(
            "output already exists: {} (use --overwrite to replace)",
            path.display()
        )
        .into(),
        other => Box::<dyn std::error::Error>::from(other),
    })?;

    println!(
        "{} {}",
        "success:".green().bold(),
        format!("Wrote {} ({summary})", output.display()).green()
    );
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        if error
            .downcast_ref::<VobsrtError>()
            .is_some_and(VobsrtError::is_empty_result)
        {
            eprintln!("no subtitle file was written");
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, build_options, parse_log_level, parse_quality};
    use vobsrt::{FfmpegLogLevel, RecognitionLevel};

    #[test]
    fn parse_quality_names() {
        assert_eq!(parse_quality("fast"), Some(RecognitionLevel::Fast));
        assert_eq!(parse_quality("ACCURATE"), Some(RecognitionLevel::Accurate));
        assert!(parse_quality("best").is_none());
    }

    #[test]
    fn parse_log_level_aliases() {
        assert_eq!(parse_log_level("warn"), Some(FfmpegLogLevel::Warning));
        assert_eq!(parse_log_level("quiet"), Some(FfmpegLogLevel::Quiet));
        assert!(parse_log_level("loud").is_none());
    }

    #[test]
    fn input_and_output_are_required() {
        assert!(Cli::try_parse_from(["vobsrt", "-i", "a.idx"]).is_err());
        assert!(Cli::try_parse_from(["vobsrt", "-o", "a.srt"]).is_err());
        assert!(Cli::try_parse_from(["vobsrt", "-i", "a.idx", "-o", "a.srt"]).is_ok());
    }

    #[test]
    fn completions_do_not_need_input() {
        let cli = Cli::try_parse_from(["vobsrt", "--completions", "bash"]).unwrap();
        assert!(cli.completions.is_some());
    }

    #[test]
    fn options_reject_out_of_range_confidence() {
        let cli = Cli::try_parse_from([
            "vobsrt",
            "-i",
            "a.idx",
            "-o",
            "a.srt",
            "--min-confidence",
            "1.5",
        ])
        .unwrap();
        assert!(build_options(&cli).is_err());
    }

    #[test]
    fn options_apply_quality() {
        let cli =
            Cli::try_parse_from(["vobsrt", "-i", "a.idx", "-o", "a.srt", "-q", "accurate", "-v"])
                .unwrap();
        let options = build_options(&cli).unwrap();
        assert_eq!(options.recognition().level, RecognitionLevel::Accurate);
        assert!(cli.verbose);
    }
}
