use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hexcover::regression::{run_regression, RegressionSettings};
use hexcover::{Config, Scenario, Sweep, TileCover, ViewCone};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

/// Absolute tolerance when checking expected covers
const TOLERANCE: f64 = 1e-9;

#[derive(Parser)]
#[command(name = "hexcover")]
#[command(about = "Hex-grid field of view with fractional cover")]
struct Cmd {
    /// Log at debug level regardless of config.toml
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Compute covers for a scenario file
    Run {
        scenario: PathBuf,
        /// Print covers as JSON
        #[arg(long)]
        json: bool,
        /// Override the viewer, as X,Y
        #[arg(long, value_parser = parse_pair, allow_hyphen_values = true)]
        viewer: Option<(i32, i32)>,
        /// Restrict the view to a cone this many degrees wide
        #[arg(long)]
        fov_degrees: Option<f64>,
        /// Direction the viewer faces, as X,Y
        #[arg(long, value_parser = parse_pair, allow_hyphen_values = true)]
        facing: Option<(i32, i32)>,
    },
    /// Print each tile as the sweep classifies it
    Step { scenario: PathBuf },
    /// Sweep seeded random maps and sanity-check the results
    Regress {
        /// Seed or inclusive seed range, as A or A-B
        #[arg(long, value_parser = parse_seeds)]
        seeds: Option<(u64, u64)>,
        /// Map size, as WxH
        #[arg(long, value_parser = parse_geometry)]
        geometry: Option<(i32, i32)>,
        #[arg(long)]
        wall_chance: Option<f64>,
        /// Cave smoothing passes over each map, 0 for raw noise
        #[arg(long)]
        smoothing: Option<u32>,
    },
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let (config, source) = Config::load();
    let level = if cmd.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::from_str(&config.logging.level).unwrap_or(LevelFilter::INFO)
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
    source.log(Path::new(Config::DEFAULT_PATH));

    match cmd.action {
        Action::Run {
            scenario,
            json,
            viewer,
            fov_degrees,
            facing,
        } => run(&config, scenario, json, viewer, fov_degrees, facing),
        Action::Step { scenario } => step(&config, scenario),
        Action::Regress {
            seeds,
            geometry,
            wall_chance,
            smoothing,
        } => regress(&config, seeds, geometry, wall_chance, smoothing),
    }
}

fn load(path: &Path) -> Result<Scenario> {
    Scenario::load_from_file(path).with_context(|| format!("loading {}", path.display()))
}

/// Command line first, then the scenario file, then config.toml
fn resolve_view(
    config: &Config,
    scenario: &Scenario,
    fov_degrees: Option<f64>,
    facing: Option<(i32, i32)>,
) -> Option<ViewCone> {
    match fov_degrees {
        Some(degrees) => {
            let facing = facing
                .or(scenario.facing)
                .unwrap_or((config.view.facing_x, config.view.facing_y));
            Some(ViewCone::new(facing, degrees.to_radians()))
        }
        None => scenario.view_cone().or_else(|| config.view.view_cone()),
    }
}

fn run(
    config: &Config,
    path: PathBuf,
    json: bool,
    viewer: Option<(i32, i32)>,
    fov_degrees: Option<f64>,
    facing: Option<(i32, i32)>,
) -> Result<()> {
    let scenario = load(&path)?;
    let viewer = viewer
        .or(scenario.viewer)
        .unwrap_or((config.viewer.x, config.viewer.y));
    let view = resolve_view(config, &scenario, fov_degrees, facing);
    tracing::info!(scenario = %scenario.name, viewer = ?viewer, view = ?view, "run");

    let covers = scenario.run_with(viewer, view)?;
    print!("{}", render_covers(&covers, json)?);

    let mismatches = scenario.check(&covers, TOLERANCE);
    if !mismatches.is_empty() {
        for m in &mismatches {
            eprintln!("mismatch {}", m);
        }
        bail!("{} of {} expectations failed", mismatches.len(), scenario.expected.len());
    }
    Ok(())
}

/// Covers as pretty JSON, or one `x y cover d2` line per tile
fn render_covers(covers: &[TileCover], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(covers)? + "\n");
    }
    Ok(covers
        .iter()
        .map(|c| format!("{} {} {:.6} {}\n", c.x, c.y, c.cover, c.d2))
        .collect())
}

fn step(config: &Config, path: PathBuf) -> Result<()> {
    let scenario = load(&path)?;
    let viewer = scenario
        .viewer
        .unwrap_or((config.viewer.x, config.viewer.y));
    let sweep = Sweep::new(viewer, &scenario.tiles, None)?;
    for (index, step) in sweep.enumerate() {
        let step = step?;
        let next = match step.next {
            Some((x, y)) => format!("({}, {})", x, y),
            None => "none".to_string(),
        };
        println!(
            "{:>4}: ({}, {}) d2={} cover={:.6} next={}",
            index, step.tile.x, step.tile.y, step.tile.d2, step.tile.cover, next
        );
    }
    Ok(())
}

fn regress(
    config: &Config,
    seeds: Option<(u64, u64)>,
    geometry: Option<(i32, i32)>,
    wall_chance: Option<f64>,
    smoothing: Option<u32>,
) -> Result<()> {
    let (seed_start, seed_end) =
        seeds.unwrap_or((config.regression.seed_start, config.regression.seed_end));
    let (width, height) =
        geometry.unwrap_or((config.regression.width, config.regression.height));
    let settings = RegressionSettings {
        seeds: seed_start..=seed_end,
        width,
        height,
        wall_chance: wall_chance.unwrap_or(config.regression.wall_chance),
        smoothing_passes: smoothing.unwrap_or(config.regression.smoothing_passes),
    };
    tracing::info!(?settings, "regress");

    let report = run_regression(&settings);
    if !report.is_clean() {
        for failure in &report.failures {
            eprintln!(
                "seed {} viewer {:?}: {}",
                failure.seed, failure.viewer, failure.reason
            );
        }
        bail!("failed with {} errors", report.failures.len());
    }
    println!("{} maps completed successfully", report.successes);
    Ok(())
}

fn parse_pair(s: &str) -> Result<(i32, i32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {:?}", s))?;
    let parse = |v: &str| v.trim().parse::<i32>().map_err(|e| format!("{:?}: {}", v, e));
    Ok((parse(x)?, parse(y)?))
}

fn parse_seeds(s: &str) -> Result<(u64, u64), String> {
    let parse = |v: &str| v.trim().parse::<u64>().map_err(|e| format!("{:?}: {}", v, e));
    match s.split_once('-') {
        Some((a, b)) => {
            let range = (parse(a)?, parse(b)?);
            if range.0 > range.1 {
                return Err(format!("empty seed range {}", s));
            }
            Ok(range)
        }
        None => {
            let seed = parse(s)?;
            Ok((seed, seed))
        }
    }
}

fn parse_geometry(s: &str) -> Result<(i32, i32), String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WxH, got {:?}", s))?;
    let parse = |v: &str| match v.trim().parse::<i32>() {
        Ok(n) if n > 0 => Ok(n),
        Ok(n) => Err(format!("map size must be positive, got {}", n)),
        Err(e) => Err(format!("{:?}: {}", v, e)),
    };
    Ok((parse(w)?, parse(h)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(parse_pair("3,-4"), Ok((3, -4)));
        assert_eq!(parse_pair(" 1 , 2 "), Ok((1, 2)));
        assert!(parse_pair("3").is_err());
        assert!(parse_pair("a,b").is_err());
    }

    #[test]
    fn test_parse_seeds() {
        assert_eq!(parse_seeds("7"), Ok((7, 7)));
        assert_eq!(parse_seeds("0-255"), Ok((0, 255)));
        assert!(parse_seeds("9-3").is_err());
    }

    #[test]
    fn test_parse_geometry() {
        assert_eq!(parse_geometry("25x13"), Ok((25, 13)));
        assert!(parse_geometry("25").is_err());
        assert!(parse_geometry("0x5").is_err());
    }

    #[test]
    fn test_json_output_parses_back() {
        let scenario = Scenario::load_from_file("test_data/01_single_blocker.json").unwrap();
        let covers = scenario.run().unwrap();
        let rendered = render_covers(&covers, true).unwrap();
        let parsed: Vec<TileCover> = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed.len(), covers.len());
        for (a, b) in parsed.iter().zip(&covers) {
            assert_eq!((a.x, a.y, a.d2), (b.x, b.y, b.d2));
            assert!((a.cover - b.cover).abs() < 1e-12);
        }
    }

    #[test]
    fn test_plain_output_has_a_line_per_tile() {
        let covers = [
            TileCover { x: 0, y: 0, cover: 0.0, d2: 0 },
            TileCover { x: -1, y: 2, cover: 0.5, d2: 7 },
        ];
        let rendered = render_covers(&covers, false).unwrap();
        assert_eq!(rendered, "0 0 0.000000 0\n-1 2 0.500000 7\n");
    }

    #[test]
    fn test_cli_shape() {
        use clap::CommandFactory;
        Cmd::command().debug_assert();
    }
}
