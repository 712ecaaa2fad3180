use clap::{Parser, Subcommand};
use eda_common::db::instance::GridInstance;
use eda_common::geom::coord::GridCoord;
use eda_common::util::config::Config;
use eda_common::util::{check, generator, logger};
use eda_router::{route_instance, GridRoute};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Route {
        /// Grid instance to route; overrides `input.instance_file`.
        #[arg(long, value_name = "FILE")]
        instance: Option<PathBuf>,
    },
    Generate {
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        #[arg(long)]
        layers: Option<u8>,
        #[arg(long, default_value_t = 8)]
        pairs: usize,
        #[arg(long, default_value_t = 0.10)]
        obstacles: f64,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = "inputs/instance.toml")]
        output: String,
    },
}

#[derive(Serialize)]
struct RoutedSegment {
    from: GridCoord,
    to: GridCoord,
    cost: u32,
}

#[derive(Serialize)]
struct RoutedForest {
    design: String,
    total_cost: u32,
    lower_bound: f64,
    rounds: usize,
    pruned: usize,
    steiner_nodes: Vec<GridCoord>,
    segments: Vec<RoutedSegment>,
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();

    let config = if args.config.exists() {
        log::info!("Loading configuration from {:?}", args.config);
        let config_str = std::fs::read_to_string(&args.config)
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;
        toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?
    } else {
        log::warn!(
            "Configuration file {:?} not found. Using internal defaults.",
            args.config
        );
        Config::default()
    };

    let command = args.command.unwrap_or(Commands::Route { instance: None });

    match command {
        Commands::Generate {
            width,
            height,
            layers,
            pairs,
            obstacles,
            seed,
            output,
        } => {
            let mut grid = config.grid.clone();
            if let Some(w) = width {
                grid.width = w;
            }
            if let Some(h) = height {
                grid.height = h;
            }
            if let Some(l) = layers {
                grid.layers = l;
            }

            prepare_output_dir(&output)?;
            log::info!(
                "Generating random instance ({}x{}x{}, Pairs: {}, Obstacles: {:.0}%)...",
                grid.width,
                grid.height,
                grid.layers,
                pairs,
                obstacles * 100.0
            );
            let instance = generator::generate_random_instance(&grid, pairs, obstacles, seed);
            let text = toml::to_string(&instance)
                .map_err(|e| anyhow::anyhow!("Failed to serialize instance: {}", e))?;
            std::fs::write(&output, text)?;
            log::info!("Generated: {}", output);
        }
        Commands::Route { instance } => {
            let path = instance.unwrap_or_else(|| PathBuf::from(&config.input.instance_file));
            if let Err(e) = run_routing(&config, &path) {
                log::error!("{}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn prepare_output_dir(path_str: &str) -> anyhow::Result<()> {
    if let Some(parent) = Path::new(path_str).parent() {
        if !parent.exists() && !parent.as_os_str().is_empty() {
            log::info!("Creating output directory: {:?}", parent);
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn load_instance(path: &Path) -> anyhow::Result<GridInstance> {
    if !path.exists() {
        return Err(anyhow::anyhow!("Input instance file missing: {:?}", path));
    }
    log::info!("Parsing instance: {:?}", path);
    let text = std::fs::read_to_string(path)?;
    toml::from_str(&text).map_err(|e| anyhow::anyhow!("Invalid instance TOML in {:?}: {}", path, e))
}

fn run_routing(config: &Config, path: &Path) -> anyhow::Result<()> {
    let instance = load_instance(path)?;
    log::info!(
        "Routing '{}': {}x{}x{} grid, {} obstacles, {} pairs",
        instance.name,
        instance.width,
        instance.height,
        instance.layers,
        instance.obstacles.len(),
        instance.pairs.len()
    );

    let routed = route_instance(&instance, &config.steiner)
        .map_err(|e| anyhow::anyhow!("Routing failed: {}", e))?;

    if config.steiner.verify {
        check::run(
            &routed.graph,
            &routed.forest.edge_ids(),
            routed.forest.total_cost(),
        )
        .map_err(|e| anyhow::anyhow!("Verification Failed: {}", e))?;
    }

    for (from, to) in routed.segments() {
        println!("{} -> {}", from, to);
    }

    let forest = &routed.forest;
    let stats = forest.stats();
    log::info!(
        "Total cost {} (lower bound {:.2}, ratio {:.3}), {} rounds, {} stale tight edges",
        forest.total_cost(),
        forest.lower_bound(),
        forest.total_cost() as f64 / forest.lower_bound().max(f64::MIN_POSITIVE),
        stats.rounds,
        stats.stale_events
    );

    if let Some(out) = &config.input.output_file {
        prepare_output_dir(out)?;
        log::info!("Writing routed forest to {}", out);
        save_forest(&instance, &routed, out)?;
    }

    Ok(())
}

fn save_forest(instance: &GridInstance, routed: &GridRoute, filename: &str) -> anyhow::Result<()> {
    use eda_router::grid::RoutingGrid;

    let forest = &routed.forest;
    let report = RoutedForest {
        design: instance.name.clone(),
        total_cost: forest.total_cost(),
        lower_bound: forest.lower_bound(),
        rounds: forest.rounds(),
        pruned: forest.pruned_count(),
        steiner_nodes: forest
            .steiner_nodes()
            .iter()
            .map(|&n| routed.grid.coord(n))
            .collect(),
        segments: forest
            .edges()
            .iter()
            .map(|e| RoutedSegment {
                from: routed.grid.coord(e.u),
                to: routed.grid.coord(e.v),
                cost: e.cost,
            })
            .collect(),
    };
    let text = toml::to_string(&report)
        .map_err(|e| anyhow::anyhow!("Failed to serialize forest: {}", e))?;
    std::fs::write(filename, text)?;
    Ok(())
}
