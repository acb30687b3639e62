use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stagecraft::{
    Compositor, EditorSettings, FontRegistry, ImageLoader, Point, Project, Scene,
    StickerRegistry, Surface, TextShaper, hit_test, resolve_visible_bounds,
};

#[derive(Parser, Debug)]
#[command(name = "stagecraft", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one frame of a project as a PNG.
    Frame(FrameArgs),
    /// Print the resolved bounds of every visible element as JSON.
    Bounds(BoundsArgs),
    /// Print the id of the topmost element under a canvas point.
    Hit(HitArgs),
}

#[derive(Args, Debug)]
struct ProjectArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Playhead time in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Directory of font files to register.
    #[arg(long)]
    fonts: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Editor settings JSON.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Sticker root containing `icons/`, `emoji/`, `flags/` and `shapes/`. Defaults to the
    /// project's directory.
    #[arg(long)]
    stickers: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct BoundsArgs {
    #[command(flatten)]
    project: ProjectArgs,
}

#[derive(Args, Debug)]
struct HitArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Canvas x in pixels.
    #[arg(long, allow_negative_numbers = true)]
    x: f64,

    /// Canvas y in pixels.
    #[arg(long, allow_negative_numbers = true)]
    y: f64,
}

fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_env("STAGECRAFT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Bounds(args) => cmd_bounds(args),
        Command::Hit(args) => cmd_hit(args),
    }
}

fn project_dir(in_path: &Path) -> &Path {
    in_path.parent().unwrap_or_else(|| Path::new("."))
}

fn load(args: &ProjectArgs) -> anyhow::Result<(Project, TextShaper)> {
    let project = Project::from_path(&args.in_path)?;
    let mut fonts = FontRegistry::new();
    if let Some(dir) = &args.fonts {
        let n = fonts.load_dir(dir)?;
        tracing::info!(dir = %dir.display(), fonts = n, "fonts registered");
    }
    Ok((project, TextShaper::new(Arc::new(fonts))))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (project, shaper) = load(&args.project)?;
    let settings = match &args.settings {
        Some(p) => EditorSettings::from_json_file(p)?,
        None => EditorSettings::default(),
    }
    .with_env_overrides();

    let root = project_dir(&args.project.in_path);
    let sticker_root = args.stickers.as_deref().unwrap_or(root);
    let mut compositor = Compositor::new(
        ImageLoader::new(root, None)?,
        StickerRegistry::with_directory_providers(sticker_root),
        shaper,
        settings.render,
    );

    let scene = Scene::build(&project);
    let mut surface = Surface::for_canvas(project.canvas)?;
    let time = args.project.time;
    compositor.render(&scene, time, &mut surface)?;
    if compositor.wait_for_assets() > 0 {
        compositor.render(&scene, time, &mut surface)?;
    }
    for n in compositor.take_notifications() {
        eprintln!("warning: element '{}': {}", n.element_id, n.message);
    }

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    surface.save_png(&args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_bounds(args: BoundsArgs) -> anyhow::Result<()> {
    let (project, mut shaper) = load(&args.project)?;
    let resolved = resolve_visible_bounds(
        &project.tracks,
        args.project.time,
        project.canvas,
        &project.assets,
        &mut shaper,
    );
    let json = serde_json::to_string_pretty(&resolved).context("serialize bounds")?;
    println!("{json}");
    Ok(())
}

fn cmd_hit(args: HitArgs) -> anyhow::Result<()> {
    let (project, mut shaper) = load(&args.project)?;
    let resolved = resolve_visible_bounds(
        &project.tracks,
        args.project.time,
        project.canvas,
        &project.assets,
        &mut shaper,
    );
    if let Some(hit) = hit_test(Point::new(args.x, args.y), &resolved) {
        println!("{}", hit.element_id);
    }
    Ok(())
}
