#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless Necrowarp session.

mod config;
mod input;
mod region_file;
mod session;

use std::{
    fs, io,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use glam::IVec2;
use necrowarp_core::PlayerAction;
use necrowarp_rendering::{Camera, Presentation, RenderingBackend, TextBackend};
use necrowarp_system_bootstrap::Bootstrap;
use necrowarp_world::{query, Region, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use region_file::RegionSnapshot;
use session::Session;

const DEFAULT_LOG_FILTER: &str = "necrowarp=info";
const DEFAULT_TURNS: u64 = 100;

/// Plays Necrowarp without a window.
#[derive(Debug, Parser)]
#[command(name = "necrowarp", version, about)]
struct Args {
    /// Seed of the random source; drawn from the OS when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of turns to play before stopping.
    #[arg(long)]
    turns: Option<u64>,
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Region file to play instead of generating a cave.
    #[arg(long)]
    region: Option<PathBuf>,
    /// Writes the played region to this file.
    #[arg(long)]
    save_region: Option<PathBuf>,
    /// Prints a text frame after every turn.
    #[arg(long)]
    render: bool,
    /// Minimum delay between turns in milliseconds.
    #[arg(long)]
    epoch_ms: Option<u64>,
    /// Log filter directives, taking precedence over `RUST_LOG`.
    #[arg(long)]
    log_filter: Option<String>,
    /// Player keys: hjklyubn move, `.` waits, r/s/g/m act, `@x,y` warps.
    #[arg(long, default_value = "")]
    script: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    install_tracing(args.log_filter.as_deref());

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

fn install_tracing(directives: Option<&str>) {
    let filter = match directives {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(args: Args) -> Result<()> {
    let mut config = GameConfig::load(args.config.as_deref())?;
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.turns.is_some() {
        config.turns = args.turns;
    }
    if args.region.is_some() {
        config.region = args.region;
    }
    if let Some(epoch_ms) = args.epoch_ms {
        config.session.epoch_interval_ms = epoch_ms;
    }
    let actions = input::decode_script(&args.script).context("could not decode script")?;

    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let settings = config.bootstrap();
    let region = config.region.as_deref().map(load_region).transpose()?;
    let world = match region {
        Some(region) => Bootstrap.from_region(region, &settings, &mut rng),
        None => Bootstrap.generate(&settings, &mut rng),
    }
    .context("could not prepare the world")?;
    tracing::info!(seed, "{}", Bootstrap.title(&world));

    if let Some(path) = &args.save_region {
        let line = RegionSnapshot::capture(query::map(&world)).encode()?;
        fs::write(path, line + "\n")
            .with_context(|| format!("could not write region file {}", path.display()))?;
        tracing::info!(path = %path.display(), "region saved");
    }

    let mut session = Session::new(world, config.spawning(), rng, config.epoch_interval());
    let mut backend = args.render.then(|| TextBackend::new(io::stdout()));
    if let Some(backend) = backend.as_mut() {
        present(backend, session.world())?;
    }

    let turns = config.turns.unwrap_or(DEFAULT_TURNS);
    let mut scripted = actions.into_iter();
    while query::turn(session.world()) < turns && !session.is_over() {
        let action = scripted.next().unwrap_or(PlayerAction::Wait);
        match session.step(action) {
            Ok(_) => {
                if let Some(backend) = backend.as_mut() {
                    present(backend, session.world())?;
                }
            }
            Err(reason) => tracing::info!(?action, ?reason, "action refused"),
        }
    }

    let world = session.world();
    tracing::info!(
        turns = query::turn(world),
        kills = query::kills(world),
        alive = query::player(world).is_some(),
        "session finished"
    );
    Ok(())
}

fn load_region(path: &Path) -> Result<Region> {
    let line = fs::read_to_string(path)
        .with_context(|| format!("could not read region file {}", path.display()))?;
    let snapshot = RegionSnapshot::decode(&line)
        .with_context(|| format!("malformed region file {}", path.display()))?;
    Ok(snapshot.into_region()?)
}

fn present<B: RenderingBackend>(backend: &mut B, world: &World) -> Result<()> {
    let map = query::map(world);
    let extent = IVec2::new(map.extent().width(), map.extent().height());
    let camera = match query::player(world) {
        Some(player) => Camera::centered(player.position(), extent, map),
        None => Camera::new(IVec2::ZERO, extent),
    };
    let presentation = Presentation::compose(world, &camera)?;
    backend.present(&presentation)
}
