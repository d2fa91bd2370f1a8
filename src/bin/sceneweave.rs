use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use sceneweave::{
    CpuRenderer, CpuRendererOpts, FfmpegSoundResolver, FfmpegTool, FrameSink, MovieWriter,
    NullSink, Quality, Scene, Script, audio::timeline::MIX_SAMPLE_RATE,
    encode::ffmpeg::is_ffmpeg_on_path, script::run::run_script,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sceneweave", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a scene script into a movie (requires `ffmpeg` on PATH unless `--no-movie`).
    Render(RenderArgs),
    /// Parse and validate a scene script without rendering.
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input scene script (JSON).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Root of the output tree.
    #[arg(long)]
    media_dir: Option<PathBuf>,

    /// Resolution and frame-rate preset; overrides the script's canvas and fps.
    #[arg(long, value_enum)]
    quality: Option<QualityChoice>,

    /// First operation to encode; earlier ones are skipped.
    #[arg(long)]
    start_at: Option<u64>,

    /// Stop once this many operations have been played.
    #[arg(long)]
    end_at: Option<u64>,

    /// Skip every operation (state and time still advance).
    #[arg(long)]
    skip: bool,

    /// Render without writing any video.
    #[arg(long)]
    no_movie: bool,

    /// Save the final frame as PNG.
    #[arg(long)]
    save_last_frame: Option<PathBuf>,

    /// Show a progress bar per operation.
    #[arg(long)]
    progress: bool,

    /// Movie container: `.mp4` or `.mov` (keeps alpha).
    #[arg(long)]
    movie_ext: Option<String>,

    /// Directory sound names are resolved against (defaults to the script's directory).
    #[arg(long)]
    sounds: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Input scene script (JSON).
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum QualityChoice {
    Low,
    Medium,
    High,
    Production,
}

impl From<QualityChoice> for Quality {
    fn from(q: QualityChoice) -> Self {
        match q {
            QualityChoice::Low => Quality::Low,
            QualityChoice::Medium => Quality::Medium,
            QualityChoice::High => Quality::High,
            QualityChoice::Production => Quality::Production,
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Check(args) => cmd_check(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn read_script(path: &Path) -> anyhow::Result<Script> {
    let script = Script::load(path).with_context(|| format!("load script '{}'", path.display()))?;
    script
        .validate()
        .with_context(|| format!("validate script '{}'", path.display()))?;
    Ok(script)
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let script = read_script(&args.in_path)?;
    eprintln!(
        "ok: '{}' with {} items and {} ops",
        script.config.name,
        script.items.len(),
        script.ops.len()
    );
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut script = read_script(&args.in_path)?;
    apply_overrides(&mut script, &args);
    script.validate().context("validate command-line overrides")?;

    let config = script.config.clone();
    let renderer = CpuRenderer::new(CpuRendererOpts {
        canvas: config.canvas,
        background: config.background,
    })?;

    let sink: Box<dyn FrameSink> = if args.no_movie {
        Box::new(NullSink)
    } else {
        if !is_ffmpeg_on_path() {
            anyhow::bail!("ffmpeg not found on PATH (use --no-movie to render without video)");
        }
        Box::new(MovieWriter::new(
            &config,
            script.writer.clone(),
            Box::new(FfmpegTool::new()),
        )?)
    };

    let sounds_root = match &args.sounds {
        Some(dir) => dir.clone(),
        None => args
            .in_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let mut scene = Scene::new(config, Box::new(renderer), sink)?.with_sound_resolver(Box::new(
        FfmpegSoundResolver::new(sounds_root, MIX_SAMPLE_RATE),
    ));

    let report = run_script(&mut scene, &script)?;
    if !report.failed_segments.is_empty() {
        eprintln!(
            "warning: {} segment(s) failed to encode and were left out: {:?}",
            report.failed_segments.len(),
            report.failed_segments
        );
    }
    match &report.output {
        Some(path) => eprintln!("wrote {}", path.display()),
        None => eprintln!("played {} operations, no movie written", report.num_plays),
    }
    Ok(())
}

fn apply_overrides(script: &mut Script, args: &RenderArgs) {
    let config = &mut script.config;
    if let Some(q) = args.quality {
        let q = Quality::from(q);
        config.canvas = q.canvas();
        config.fps = q.fps();
    }
    if args.start_at.is_some() {
        config.start_at_animation = args.start_at;
    }
    if args.end_at.is_some() {
        config.end_at_animation = args.end_at;
    }
    config.skip_animations |= args.skip;
    config.show_progress |= args.progress;
    if let Some(path) = &args.save_last_frame {
        config.last_frame_path = Some(path.clone());
    }

    let writer = &mut script.writer;
    if let Some(dir) = &args.media_dir {
        writer.media_dir = dir.clone();
    }
    if let Some(ext) = &args.movie_ext {
        writer.movie_extension = ext.clone();
    }
}
