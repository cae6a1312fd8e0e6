#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::process::ExitCode;

use sparse_life::batch::{BatchConfig, BatchResult, Workload};
use sparse_life::identify::{PatternKind, identify};
use sparse_life::topology::BoundaryPolicy;
use sparse_life::{RuleDefinition, Simulation, decode_rle, load_rule, population_csv, rle};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

const USAGE: &str = "usage:
  sparse-life run <rule> <rle> [--gens N] [--bounds SPEC] [--csv FILE]
  sparse-life identify <rule> <rle> [--kind any|osc|gun|replicator] [--bounds SPEC]
  sparse-life geneascopy <rule> [--soups N] [--gens N] [--size N] [--density P] [--threads N] [--max-threads N] [--seed S] [--out FILE]
  sparse-life agar <rule> --bounds SPEC [--soups N] [--cap N] [--density P] [--threads N] [--max-threads N] [--seed S]";

enum Command {
    Run {
        gens: u64,
        csv: Option<String>,
    },
    Identify {
        kind: PatternKind,
    },
    Batch {
        workload: Workload,
        config: BatchConfig,
        out: Option<String>,
    },
}

struct MainArgs {
    command: Command,
    rule_path: String,
    pattern_path: Option<String>,
    policy: BoundaryPolicy,
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> T {
    args.get(i)
        .unwrap_or_else(|| panic!("{flag} requires a value\n{USAGE}"))
        .parse()
        .unwrap_or_else(|_| panic!("{flag} got an invalid value: {}\n{USAGE}", args[i]))
}

fn parse_args() -> MainArgs {
    let args: Vec<String> = std::env::args().collect();
    let sub = args.get(1).map(String::as_str).unwrap_or_else(|| panic!("{USAGE}"));
    let positional = match sub {
        "run" | "identify" => 2,
        "geneascopy" | "agar" => 1,
        other => panic!("unknown command: {other}\n{USAGE}"),
    };
    let positionals: Vec<String> = args.iter().skip(2).take(positional).cloned().collect();
    if positionals.len() < positional || positionals.iter().any(|p| p.starts_with("--")) {
        panic!("{sub} requires {positional} path argument(s)\n{USAGE}");
    }

    let mut gens = None;
    let mut csv = None;
    let mut kind = PatternKind::Any;
    let mut policy = None;
    let mut config = BatchConfig::default();
    let mut out = None;

    let mut i = 2 + positional;
    while i < args.len() {
        let flag = args[i].as_str();
        i += 1;
        match flag {
            "--gens" => gens = Some(parse_value::<u64>(&args, i, flag)),
            "--csv" => csv = Some(parse_value::<String>(&args, i, flag)),
            "--out" => out = Some(parse_value::<String>(&args, i, flag)),
            "--kind" => kind = parse_value(&args, i, flag),
            "--bounds" => policy = Some(parse_value::<BoundaryPolicy>(&args, i, flag)),
            "--soups" => config = config.soups(parse_value(&args, i, flag)),
            "--size" => config = config.soup_size(parse_value(&args, i, flag)),
            "--density" => config = config.density(parse_value(&args, i, flag)),
            "--cap" => config = config.generation_cap(parse_value(&args, i, flag)),
            "--threads" => config = config.thread_count(parse_value(&args, i, flag)),
            "--max-threads" => config = config.max_threads(parse_value(&args, i, flag)),
            "--seed" => config = config.seed(parse_value(&args, i, flag)),
            other => panic!("unknown argument: {other}\n{USAGE}"),
        }
        i += 1;
    }

    let command = match sub {
        "run" => Command::Run {
            gens: gens.unwrap_or(100),
            csv,
        },
        "identify" => Command::Identify { kind },
        _ => {
            if let Some(gens) = gens {
                config = config.generations(gens);
            }
            if let Some(policy) = policy {
                config = config.policy(policy);
            }
            let workload = if sub == "agar" {
                Workload::Agar
            } else {
                Workload::Geneascopy
            };
            Command::Batch {
                workload,
                config,
                out,
            }
        }
    };

    MainArgs {
        command,
        rule_path: positionals[0].clone(),
        pattern_path: positionals.get(1).cloned(),
        policy: policy.unwrap_or_default(),
    }
}

fn read(path: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))
}

fn write_or_print(path: Option<&str>, text: &str) -> Result<(), String> {
    match path {
        Some(path) => {
            std::fs::write(path, text).map_err(|e| format!("cannot write {path}: {e}"))?;
            info!(path, "wrote output");
            Ok(())
        }
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

fn load_pattern(rule: &RuleDefinition, path: &str) -> Result<sparse_life::SparseGrid, String> {
    let pattern = decode_rle(&read(path)?, rule.n_states()).map_err(|e| e.to_string())?;
    if let Some(name) = pattern.rule.as_deref().filter(|n| *n != rule.name()) {
        info!(pattern_rule = name, loaded_rule = rule.name(), "pattern names a different rule");
    }
    Ok(pattern.grid)
}

fn execute(args: MainArgs) -> Result<(), String> {
    let rule = load_rule(&read(&args.rule_path)?).map_err(|e| e.to_string())?;
    match args.command {
        Command::Run { gens, csv } => {
            let path = args.pattern_path.as_deref().unwrap_or_default();
            let grid = load_pattern(&rule, path)?;
            let mut sim = Simulation::with_grid(&rule, args.policy, grid);
            let mut populations = Vec::with_capacity(gens as usize + 1);
            populations.push(sim.population());
            for _ in 0..gens {
                sim.step();
                populations.push(sim.population());
            }
            print!(
                "{}",
                rle::encode_grid(sim.grid(), rule.name()).map_err(|e| e.to_string())?
            );
            write_or_print(csv.as_deref(), &population_csv(&populations))
        }
        Command::Identify { kind } => {
            let path = args.pattern_path.as_deref().unwrap_or_default();
            let grid = load_pattern(&rule, path)?;
            println!("{}", identify(&rule, &grid, kind, 0, args.policy));
            Ok(())
        }
        Command::Batch {
            workload,
            config,
            out,
        } => match sparse_life::run_batch(&rule, &config, workload).map_err(|e| e.to_string())? {
            BatchResult::Geneascopy(report) => write_or_print(out.as_deref(), &report.to_csv()),
            BatchResult::Agar(report) => write_or_print(out.as_deref(), &report.summary()),
        },
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match execute(parse_args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}
