use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use reelforge::{
    ExportConfig, FfmpegAudioLoader, FrameCompositor, FrameIndex, FrameRange, FsMediaSource,
    NoopObserver, NoopStickerRenderer, PngSequenceSink, RenderContext, TextRenderer, Timeline,
    collect_audio_sources, mix_audio, render_frames, total_frames,
};

#[derive(Parser, Debug)]
#[command(name = "reelforge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render a frame range as a numbered PNG sequence.
    Frames(FramesArgs),
    /// Mix the timeline's audio into raw interleaved f32le PCM.
    Audio(AudioArgs),
}

#[derive(Parser, Debug)]
struct JobArgs {
    /// Input timeline JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Export config JSON; defaults apply to every missing field.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra font files for text elements.
    #[arg(long = "font")]
    fonts: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    job: JobArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct FramesArgs {
    #[command(flatten)]
    job: JobArgs,

    /// Output directory for `frame_NNNNNN.png` files.
    #[arg(long)]
    out_dir: PathBuf,

    /// First frame (inclusive).
    #[arg(long, default_value_t = 0)]
    start: u64,

    /// Last frame (exclusive); defaults to the timeline's total frame count.
    #[arg(long)]
    end: Option<u64>,

    /// Print a SHA-256 digest over every rendered frame.
    #[arg(long, default_value_t = false)]
    digest: bool,
}

#[derive(Parser, Debug)]
struct AudioArgs {
    #[command(flatten)]
    job: JobArgs,

    /// Output PCM path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Frames(args) => cmd_frames(args),
        Command::Audio(args) => cmd_audio(args),
    }
}

fn load_job(job: &JobArgs) -> anyhow::Result<(Timeline, ExportConfig)> {
    let timeline = Timeline::load_json(&job.in_path)
        .with_context(|| format!("load timeline '{}'", job.in_path.display()))?;
    let mut config = match &job.config {
        Some(path) => ExportConfig::load_json(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => ExportConfig::default(),
    };
    config.text.font_paths.extend(job.fonts.iter().cloned());
    Ok((timeline, config))
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (timeline, config) = load_job(&args.job)?;
    let text = TextRenderer::from_config(&config.text);
    let media = FsMediaSource;
    let compositor =
        FrameCompositor::new(&media, &timeline, &NoopStickerRenderer, &text, &config);
    let mut ctx = RenderContext::new(&timeline, &config)?;

    let time = config.fps.frame_time_secs(FrameIndex(args.frame));
    let report = compositor.render_frame(&mut ctx, time)?;
    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.element_id, skipped.reason);
    }

    ensure_parent_dir(&args.out)?;
    ctx.surface()
        .to_rgba_image()?
        .save(&args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let (timeline, config) = load_job(&args.job)?;
    let text = TextRenderer::from_config(&config.text);
    let media = FsMediaSource;
    let compositor =
        FrameCompositor::new(&media, &timeline, &NoopStickerRenderer, &text, &config);
    let mut ctx = RenderContext::new(&timeline, &config)?;

    let end = args
        .end
        .unwrap_or_else(|| total_frames(timeline.duration_secs(), config.fps));
    let range = FrameRange::new(FrameIndex(args.start), FrameIndex(end))?;

    let mut sink = PngSequenceSink::new(&args.out_dir);
    if args.digest {
        sink = sink.with_digest();
    }
    let stats = render_frames(&compositor, &mut ctx, range, &mut sink, &NoopObserver)?;
    ctx.dispose();

    if let Some(digest) = sink.digest_hex() {
        println!("{digest}");
    }
    eprintln!(
        "wrote {} frames to {} ({} elements skipped)",
        stats.frames,
        args.out_dir.display(),
        stats.skipped_elements
    );
    Ok(())
}

fn cmd_audio(args: AudioArgs) -> anyhow::Result<()> {
    let (timeline, config) = load_job(&args.job)?;
    let sources = collect_audio_sources(&timeline, config.fps);
    let mix = mix_audio(
        &sources,
        config.fps,
        timeline.duration_secs(),
        &FfmpegAudioLoader,
        &config.audio,
    )?;
    for err in &mix.errors {
        eprintln!("audio source {} failed: {}", err.element_id, err.error);
    }

    ensure_parent_dir(&args.out)?;
    std::fs::write(&args.out, mix.buffer.to_f32le_bytes())
        .with_context(|| format!("write pcm '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} sources, {:.3}s @ {} Hz, {} ch)",
        args.out.display(),
        mix.source_count,
        mix.duration,
        mix.buffer.sample_rate,
        mix.buffer.channels
    );
    Ok(())
}
