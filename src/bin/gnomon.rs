use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use gnomon::{
    Canvas, CpuBackend, Fps, FrameIndex, FrameRange, PreparedAssetStore, RenderSettings,
    RenderToMp4Opts, geometry::LegPair, scene,
};

#[derive(Parser, Debug)]
#[command(name = "gnomon", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the proof animation to MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Print the generated composition as JSON.
    Dump(DumpArgs),
}

#[derive(Parser, Debug)]
struct SceneArgs {
    /// First leg of the initial triangle.
    #[arg(long, default_value_t = 2.0)]
    a: f64,

    /// Second leg of the initial triangle.
    #[arg(long, default_value_t = 1.2)]
    b: f64,

    /// First leg after the dimension change.
    #[arg(long, default_value_t = 1.5)]
    a2: f64,

    /// Second leg after the dimension change.
    #[arg(long, default_value_t = 2.5)]
    b2: f64,

    /// Output resolution/framerate preset.
    #[arg(long, value_enum, default_value_t = Quality::Medium)]
    quality: Quality,

    /// Font family for labels and formulas (system sans-serif if unset).
    #[arg(long)]
    font: Option<String>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Output MP4 path.
    #[arg(long, default_value = "out/pythagoras.mp4")]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long, default_value = "out/frame.png")]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct DumpArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Output JSON path (stdout if unset).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Quality {
    /// 854x480 @ 15 fps
    Low,
    /// 1280x720 @ 30 fps
    Medium,
    /// 1920x1080 @ 60 fps
    High,
}

impl Quality {
    fn canvas(self) -> Canvas {
        match self {
            Self::Low => Canvas {
                width: 854,
                height: 480,
            },
            Self::Medium => Canvas {
                width: 1280,
                height: 720,
            },
            Self::High => Canvas {
                width: 1920,
                height: 1080,
            },
        }
    }

    fn fps(self) -> Fps {
        let num = match self {
            Self::Low => 15,
            Self::Medium => 30,
            Self::High => 60,
        };
        Fps { num, den: 1 }
    }
}

const BACKGROUND: [u8; 4] = [18, 20, 28, 255];

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Dump(args) => cmd_dump(args),
    }
}

fn build_config(args: &SceneArgs) -> anyhow::Result<scene::ProofConfig> {
    let first = LegPair::new(args.a, args.b).context("invalid --a/--b")?;
    let second = LegPair::new(args.a2, args.b2).context("invalid --a2/--b2")?;
    Ok(scene::ProofConfig {
        first,
        second,
        fps: args.quality.fps(),
        canvas: args.quality.canvas(),
        font_family: args.font.clone(),
        ..scene::ProofConfig::default()
    })
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let cfg = build_config(&args.scene)?;
    let comp = scene::build_composition(&cfg)?;

    let settings = RenderSettings {
        clear_rgba: Some(BACKGROUND),
    };
    let mut backend = CpuBackend::new(settings.clone());
    let assets = PreparedAssetStore::prepare(&comp)?;

    let opts = RenderToMp4Opts {
        range: FrameRange::new(FrameIndex(0), comp.duration)?,
        bg_rgba: settings.clear_rgba.unwrap_or([0, 0, 0, 255]),
        overwrite: true,
    };
    gnomon::render_to_mp4(&comp, &args.out, opts, &mut backend, &assets)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = build_config(&args.scene)?;
    let comp = scene::build_composition(&cfg)?;

    let settings = RenderSettings {
        clear_rgba: Some(BACKGROUND),
    };
    let mut backend = CpuBackend::new(settings);
    let assets = PreparedAssetStore::prepare(&comp)?;

    let frame = gnomon::render_frame(&comp, FrameIndex(args.frame), &mut backend, &assets)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_dump(args: DumpArgs) -> anyhow::Result<()> {
    let cfg = build_config(&args.scene)?;
    let comp = scene::build_composition(&cfg)?;
    let json = serde_json::to_string_pretty(&comp).context("serialize composition")?;

    match args.out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(&path, json)
                .with_context(|| format!("write json '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
