//! Cadence CLI - replay tab-switch scenarios and print the trace

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::json;

use cadence::clock::as_millis_u64;
use cadence::error::{CadenceError, FixSuggestion};
use cadence::{DemoHarness, HarnessConfig, Scenario, Step, Strategy};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Cadence - priority-aware update scheduling with an observable trace")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone, Copy)]
struct ReplayOpts {
    /// Pace waits in wall-clock time instead of jumping the clock
    #[arg(long)]
    realtime: bool,

    /// Print the trace as JSON
    #[arg(long)]
    json: bool,

    /// Keep at most this many log entries (overrides env and file)
    #[arg(long)]
    max_entries: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario file
    Run {
        /// Path to scenario .yaml file
        file: String,

        #[command(flatten)]
        opts: ReplayOpts,
    },

    /// Validate a scenario file (parse only)
    Validate {
        /// Path to scenario .yaml file
        file: String,
    },

    /// Replay the built-in interrupted-switch demo
    Demo {
        /// Switching strategy
        #[arg(value_enum)]
        strategy: Strategy,

        #[command(flatten)]
        opts: ReplayOpts,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { file, opts } => run_scenario(&file, opts).await,
        Commands::Validate { file } => validate_scenario(&file).await,
        Commands::Demo { strategy, opts } => {
            let scenario = Scenario::demo(strategy, HarnessConfig::default());
            replay(scenario, opts).await
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

async fn run_scenario(file: &str, opts: ReplayOpts) -> Result<(), CadenceError> {
    let scenario = Scenario::load(file).await?;
    replay(scenario, opts).await
}

async fn replay(mut scenario: Scenario, opts: ReplayOpts) -> Result<(), CadenceError> {
    // File < env < flags
    scenario.config = scenario.config.with_env()?;
    if let Some(max) = opts.max_entries {
        scenario.config.log.max_entries = Some(max);
    }
    scenario.config.validate()?;

    if !opts.json {
        println!(
            "{} Strategy: {} | steps: {} | expensive tab: {}ms",
            "→".cyan(),
            scenario.strategy.to_string().cyan().bold(),
            scenario.steps.len(),
            scenario.config.expensive_tab_ms
        );
    }

    let mut harness = DemoHarness::new(scenario.strategy, scenario.config);
    if opts.realtime {
        harness.replay_realtime(&scenario.steps).await?;
    } else {
        harness.replay(&scenario.steps)?;
    }

    if opts.json {
        print_json(&harness)
    } else {
        print_trace(&harness);
        Ok(())
    }
}

fn print_trace(harness: &DemoHarness) {
    println!("{}", "Trace:".cyan().bold());
    for event in harness.log().events() {
        let stamp = format!("[{:>6}ms]", event.timestamp_ms);
        if harness.is_discarded(&event) {
            println!(
                "  {} {} {}",
                stamp.dimmed(),
                event.entry.dimmed(),
                "(discarded)".dimmed()
            );
        } else if event.attribution.generation().is_some() {
            println!("  {} {}", stamp.dimmed(), event.entry.blue());
        } else {
            println!("  {} {}", stamp.dimmed(), event.entry);
        }
    }

    println!("{}", "Screen:".cyan().bold());
    for line in harness.render() {
        println!("  {}", line);
    }
    println!(
        "{} Settled at {}ms on tab {}",
        "✓".green(),
        harness.now().as_millis(),
        harness.shown_tab().to_string().bold()
    );
}

fn print_json(harness: &DemoHarness) -> Result<(), CadenceError> {
    let output = json!({
        "strategy": harness.strategy(),
        "shown_tab": harness.shown_tab(),
        "now_ms": as_millis_u64(harness.now()),
        "discarded": harness.scheduler().discarded(),
        "events": harness.log().to_json(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn validate_scenario(file: &str) -> Result<(), CadenceError> {
    let scenario = Scenario::load(file).await?;

    println!("{} Scenario '{}' is valid", "✓".green(), file);
    println!("  Strategy: {}", scenario.strategy);
    println!("  Steps: {}", scenario.steps.len());
    println!("  Clicks: {}", scenario.click_count());
    println!(
        "  Waits: {}ms",
        scenario
            .steps
            .iter()
            .filter_map(|s| match s {
                Step::Wait(by) => Some(as_millis_u64(*by)),
                _ => None,
            })
            .fold(0u64, u64::saturating_add)
    );

    Ok(())
}
