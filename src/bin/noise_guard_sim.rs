use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use noise_guard::config::{MonitorConfig, AXIS_CENTER};
use noise_guard::hal::{AdcFeeder, FifoAdc, RecordingIndicator, SimAxis, SimButton, TextSurface};
use noise_guard::{MonitorHandle, NoiseMonitor, Peripherals};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;

/// Codes pushed into the simulated converter FIFO per millisecond
const CODES_PER_MS: usize = 4;
const FIFO_CAPACITY: usize = 1024;
/// Length of one quiet-loud-quiet sweep of the simulated room
const ENVELOPE_PERIOD_MS: u64 = 8000;
const QUIET_CODE: f64 = 400.0;
const JITTER: i32 = 200;

#[derive(Parser, Debug)]
#[command(
    name = "noise_guard_sim",
    about = "Run the noise monitor against simulated peripherals"
)]
struct Cli {
    /// Log task activity at debug level
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive the monitor with synthetic noise and a scripted operator
    Run {
        #[arg(long, default_value_t = 10)]
        seconds: u64,
        /// JSON config file; missing or invalid files fall back to defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Peak converter code reached by the simulated noise envelope
        #[arg(long, default_value_t = 3800)]
        amplitude: u16,
        /// Print one JSON snapshot per display refresh instead of the frame
        #[arg(long)]
        json: bool,
    },
    /// Print the default configuration as JSON
    DumpConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Run {
            seconds,
            config,
            amplitude,
            json,
        } => run_simulation(seconds, config, amplitude, json).await,
        Commands::DumpConfig => {
            println!("{}", serde_json::to_string_pretty(&MonitorConfig::default())?);
            Ok(ExitCode::from(0))
        }
    }
}

struct Operator {
    lower: SimButton,
    raise: SimButton,
    axis: SimAxis,
}

async fn run_simulation(
    seconds: u64,
    config_path: Option<PathBuf>,
    amplitude: u16,
    json: bool,
) -> Result<ExitCode> {
    let config = config_path
        .map(MonitorConfig::load_from_file)
        .unwrap_or_default();
    let refresh = config.display.period();

    let (adc, feeder) = FifoAdc::new(FIFO_CAPACITY);
    let operator = Operator {
        lower: SimButton::new(),
        raise: SimButton::new(),
        axis: SimAxis::centered(AXIS_CENTER as u16),
    };
    let indicator = RecordingIndicator::new();

    let peripherals = Peripherals {
        sample_source: Box::new(adc),
        indicator: Box::new(indicator.clone()),
        lower_button: Box::new(operator.lower.clone()),
        raise_button: Box::new(operator.raise.clone()),
        control_axis: Box::new(operator.axis.clone()),
        render_target: TextSurface::default(),
    };
    let handle =
        NoiseMonitor::spawn(config, peripherals).context("starting the noise monitor")?;

    let noise = tokio::spawn(feed_noise(feeder, amplitude));
    let script = tokio::spawn(operate(operator));

    let deadline = Instant::now() + Duration::from_secs(seconds);
    tokio::select! {
        result = report(&handle, refresh, deadline, json) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Interrupted, shutting down"),
    }

    noise.abort();
    script.abort();
    let snapshot = handle.shutdown().await;
    if json {
        println!("{}", serde_json::to_string(&snapshot)?);
    } else {
        println!(
            "final: level {} ({}) warn {} dang {} gap {}",
            snapshot.noise_level,
            snapshot.alert.label(),
            snapshot.warning,
            snapshot.danger,
            snapshot.gap
        );
        println!("{}", serde_json::to_string_pretty(&snapshot.stats)?);
    }
    Ok(ExitCode::from(0))
}

/// Print the monitor state once per display refresh until `deadline`
async fn report(
    handle: &MonitorHandle<TextSurface>,
    refresh: Duration,
    deadline: Instant,
    json: bool,
) -> Result<()> {
    let mut interval = tokio::time::interval(refresh);
    while Instant::now() < deadline {
        interval.tick().await;
        let snapshot = handle.snapshot();
        if json {
            println!("{}", serde_json::to_string(&snapshot)?);
            continue;
        }

        let surface = handle.render_lock();
        let surface = surface.lock().await;
        if let Some(frame) = surface.published() {
            let lines: Vec<&str> = frame
                .iter()
                .map(String::as_str)
                .filter(|line| !line.is_empty())
                .collect();
            println!("[{:>7}] {}", snapshot.alert.label(), lines.join(" | "));
        }
    }
    Ok(())
}

/// Push noise codes following a slow quiet-loud envelope
async fn feed_noise(mut feeder: AdcFeeder, amplitude: u16) {
    let start = Instant::now();
    let mut rng = StdRng::from_entropy();
    let mut ticker = tokio::time::interval(Duration::from_millis(1));
    let peak = f64::from(amplitude.min(4095));

    loop {
        ticker.tick().await;
        let phase = (start.elapsed().as_millis() as u64 % ENVELOPE_PERIOD_MS) as f64
            / ENVELOPE_PERIOD_MS as f64;
        let triangle = 1.0 - (2.0 * phase - 1.0).abs();
        let centre = QUIET_CODE + (peak - QUIET_CODE).max(0.0) * triangle;

        for _ in 0..CODES_PER_MS {
            let code = centre as i32 + rng.gen_range(-JITTER..=JITTER);
            feeder.push(code.clamp(0, 4095) as u16);
        }
    }
}

/// Scripted operator: raise, widen, lower, narrow, then repeat
async fn operate(operator: Operator) {
    let press = Duration::from_millis(150);
    let deflect = Duration::from_millis(250);
    let pause = Duration::from_millis(1500);

    loop {
        tokio::time::sleep(pause).await;
        operator.raise.press();
        tokio::time::sleep(press).await;
        operator.raise.release();

        tokio::time::sleep(pause).await;
        operator.axis.set(4095);
        tokio::time::sleep(deflect).await;
        operator.axis.recenter();

        tokio::time::sleep(pause).await;
        operator.lower.press();
        tokio::time::sleep(press).await;
        operator.lower.release();

        tokio::time::sleep(pause).await;
        operator.axis.set(0);
        tokio::time::sleep(deflect).await;
        operator.axis.recenter();
    }
}
