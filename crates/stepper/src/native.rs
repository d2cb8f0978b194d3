//! Terminal front end: generate a graph, play the run, print the result.

use crate::actions::Action;
use crate::runner::{Mode, Phase};
use crate::serialization;
use crate::settings::Settings;
use crate::state::State;
use crate::store::Store;
use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use sssp::step::fmt_distance;
use sssp::{Algorithm, GraphType, NodeId};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AlgorithmArg {
    Dijkstra,
    BellmanFord,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Dijkstra => Algorithm::Dijkstra,
            AlgorithmArg::BellmanFord => Algorithm::BellmanFord,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LayoutArg {
    Circular,
    Spatial,
}

impl From<LayoutArg> for GraphType {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Circular => GraphType::Circular,
            LayoutArg::Spatial => GraphType::Spatial,
        }
    }
}

/// Step through Dijkstra or Bellman-Ford on a generated graph
#[derive(Parser, Debug)]
#[command(name = "stepper")]
#[command(version)]
pub struct Cli {
    /// JSON settings file; flags below override it
    #[arg(long)]
    pub settings: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    pub algorithm: Option<AlgorithmArg>,

    /// Number of nodes (3..=15)
    #[arg(short, long)]
    pub nodes: Option<usize>,

    /// Extra edge density (0..=1)
    #[arg(short, long)]
    pub density: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub min_weight: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    pub max_weight: Option<f64>,

    /// Allow negative edge weights (Bellman-Ford only)
    #[arg(long, default_value_t = false)]
    pub negative: bool,

    /// Inject a negative cycle (Bellman-Ford with --negative)
    #[arg(long, default_value_t = false)]
    pub negative_cycle: bool,

    #[arg(long, default_value_t = false)]
    pub undirected: bool,

    #[arg(short, long, value_enum)]
    pub layout: Option<LayoutArg>,

    /// Seed for reproducible graphs
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Destination node id whose path is reported
    #[arg(short, long)]
    pub target: Option<NodeId>,

    /// Delay between steps in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Skip playback and show the final result
    #[arg(long, default_value_t = false)]
    pub view: bool,

    /// Print the run as JSON instead of playing it
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Also write the JSON run export to this file
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

impl Cli {
    fn apply_to(&self, settings: &mut Settings) {
        let g = &mut settings.generator;
        if let Some(a) = self.algorithm {
            g.algorithm = a.into();
        }
        if let Some(n) = self.nodes {
            g.node_count = n;
        }
        if let Some(d) = self.density {
            g.density = d;
        }
        if let Some(w) = self.min_weight {
            g.min_weight = w;
        }
        if let Some(w) = self.max_weight {
            g.max_weight = w;
        }
        if let Some(l) = self.layout {
            g.graph_type = l.into();
        }
        g.allow_negative_edges |= self.negative;
        g.negative_cycle |= self.negative_cycle;
        if self.undirected {
            g.is_directed = false;
        }
        if let Some(ms) = self.delay_ms {
            settings.playback.delay_ms = ms;
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Flush queued work and surface any rejected action as an error.
fn settle(state: &mut State) -> Result<()> {
    state.flush();
    if let Some(message) = state.store.error_message.take() {
        bail!(message);
    }
    Ok(())
}

/// Entry point used by the native executable.
pub fn run() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut state = State::new(Store::default());

    if let Some(path) = &cli.settings {
        state.dispatch(Action::LoadSettings { path: path.clone() });
        settle(&mut state).context("loading settings")?;
    }

    let mut settings = state.store.settings.clone();
    cli.apply_to(&mut settings);
    state.dispatch(Action::SetGeneratorSettings {
        settings: settings.generator,
    });
    state.dispatch(Action::SetDelay {
        delay_ms: settings.playback.delay_ms,
    });
    state.dispatch(Action::GenerateGraph { seed: cli.seed });
    settle(&mut state).context("generating graph")?;

    if cli.target.is_some() {
        state.dispatch(Action::SetDestination { node: cli.target });
        settle(&mut state).context("selecting destination")?;
    }

    if cli.view || cli.json {
        state.dispatch(Action::SetMode { mode: Mode::View });
        settle(&mut state)?;
    } else {
        play(&mut state)?;
    }

    if let Some(path) = &cli.out {
        serialization::save_to_file(&state.store, path)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    if cli.json {
        println!("{}", serialization::to_json(&state.store)?);
    } else {
        print_summary(&state.store);
    }
    Ok(())
}

fn play(state: &mut State) -> Result<()> {
    state.dispatch(Action::Play {
        now: Instant::now(),
    });
    settle(state)?;

    let total = state.store.runner.len();
    while state.store.runner.phase() == Phase::Running {
        if let Some(due) = state.store.runner.next_due() {
            std::thread::sleep(due.saturating_duration_since(Instant::now()));
        }
        if state.tick(Instant::now()) {
            let runner = &state.store.runner;
            println!(
                "[{:>3}/{}] {}",
                runner.current_step(),
                total,
                runner.explanation()
            );
        }
    }
    Ok(())
}

fn print_summary(store: &Store) {
    let graph = store.graph.get();
    let Some(result) = store.runner.result() else {
        return;
    };
    let label = |id: NodeId| {
        graph
            .node(id)
            .map_or_else(|| id.to_string(), |n| n.label.clone())
    };

    println!();
    println!(
        "{} from {}",
        store.runner.algorithm(),
        store.source.map(label).unwrap_or_default()
    );
    if result.has_negative_cycle {
        let cycle: Vec<&str> = result.cycle_edges.iter().map(|e| e.as_str()).collect();
        println!("negative cycle reachable from the source: {}", cycle.join(", "));
        return;
    }
    for id in graph.node_ids() {
        let path = result
            .path(id)
            .map(|p| p.iter().map(|&n| label(n)).collect::<Vec<_>>().join(" -> "))
            .unwrap_or_else(|| "unreachable".to_string());
        println!("{:>4}  {:>6}  {}", label(id), fmt_distance(result.distance(id)), path);
    }
    if let Some(path) = store.destination_path() {
        let names: Vec<String> = path.iter().map(|&n| label(n)).collect();
        println!("path to destination: {}", names.join(" -> "));
    }
}
