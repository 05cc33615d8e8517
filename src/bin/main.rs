use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "tfl-journey-e2e")]
#[command(about = "End-to-end browser tests for the TfL journey planner")]
#[command(version)]
struct Cli {
    /// Scenario files to run, in order
    #[arg(required = true)]
    scenarios: Vec<PathBuf>,

    /// Run in headless mode (overrides scenario config)
    #[arg(long)]
    headless: bool,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate scenario files without launching a browser
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> tfl_journey_e2e::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let mut failures = 0;
    for path in &cli.scenarios {
        let mut scenario = tfl_journey_e2e::Scenario::load(path)?;

        if cli.check {
            println!("Scenario valid: {}", scenario.name);
            println!("  Steps: {}", scenario.steps.len());
            continue;
        }

        if cli.headless {
            scenario.browser.headless = true;
        }

        println!("Running: {}", scenario.name);

        // Each scenario gets its own exclusive session; run_scenario tears
        // it down on every exit path before reporting.
        let report = tfl_journey_e2e::run_scenario(&scenario).await?;

        if report.passed {
            println!("✓ Passed");
        } else {
            println!("✗ Failed");
            if let Some(ref error) = report.error {
                println!("  Error: {}", error);
            }
            failures += 1;
        }
        println!("  Steps: {}", report.steps_executed);
        println!("  Duration: {}ms", report.duration_ms);
        println!();
    }

    if failures > 0 {
        std::process::exit(1);
    }

    Ok(())
}
