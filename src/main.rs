use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gpio_button::{Action, Bias, Button, EdgeSelect, LineConfig, Polarity};

/// Log level for the demo
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BiasArg {
    Disabled,
    PullUp,
    PullDown,
}

impl From<BiasArg> for Bias {
    fn from(arg: BiasArg) -> Self {
        match arg {
            BiasArg::Disabled => Bias::Disabled,
            BiasArg::PullUp => Bias::PullUp,
            BiasArg::PullDown => Bias::PullDown,
        }
    }
}

/// Polarity selection; `legacy` derives it from the bias the way the old
/// stack did (pull-up means active-low)
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum PolarityArg {
    ActiveHigh,
    ActiveLow,
    #[default]
    Legacy,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum EdgesArg {
    Rising,
    Falling,
    #[default]
    Both,
}

impl From<EdgesArg> for EdgeSelect {
    fn from(arg: EdgesArg) -> Self {
        match arg {
            EdgesArg::Rising => EdgeSelect::Rising,
            EdgesArg::Falling => EdgeSelect::Falling,
            EdgesArg::Both => EdgeSelect::Both,
        }
    }
}

/// gpio-button command line arguments
#[derive(Parser, Debug)]
#[command(name = "gpio-button")]
#[command(version, about = "Debounced GPIO push-button demo", long_about = None)]
struct CliArgs {
    /// GPIO chip device path
    #[arg(short = 'c', long, value_name = "PATH", default_value = "/dev/gpiochip0")]
    chip: PathBuf,

    /// Line offset on the chip
    #[arg(short = 'n', long, value_name = "OFFSET")]
    line: u32,

    /// Input bias
    #[arg(short = 'b', long, value_enum, default_value = "pull-up")]
    bias: BiasArg,

    /// Button polarity
    #[arg(long, value_enum, default_value = "legacy")]
    polarity: PolarityArg,

    /// Highest accepted line offset for this platform
    #[arg(long, value_name = "LIMIT", default_value_t = gpio_button::DEFAULT_OFFSET_LIMIT)]
    offset_limit: u32,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short = 'l', long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll the logical pressed state periodically
    Poll {
        /// Sample interval in milliseconds
        #[arg(long, value_name = "MS", default_value_t = 200)]
        interval_ms: u64,
    },
    /// Monitor kernel edge events and print each accepted one
    Watch {
        /// Edge directions to deliver
        #[arg(long, value_enum, default_value = "both")]
        edges: EdgesArg,
        /// Debounce window in milliseconds
        #[arg(long, value_name = "MS", default_value_t = 5)]
        debounce_ms: u64,
    },
    /// Run the hold-to-decide reset button loop
    ResetButton {
        /// Actually invoke the privileged reboot/shutdown command
        #[arg(long)]
        execute: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    init_logging(args.log_level, args.verbose);

    let bias = Bias::from(args.bias);
    let polarity = match args.polarity {
        PolarityArg::ActiveHigh => Polarity::ActiveHigh,
        PolarityArg::ActiveLow => Polarity::ActiveLow,
        PolarityArg::Legacy => Polarity::implied_by(bias),
    };

    let config = LineConfig::for_line(&args.chip, args.line)
        .with_bias(bias)
        .with_polarity(polarity)
        .with_offset_limit(args.offset_limit);

    tracing::info!(
        "using {} line {} (bias {:?}, polarity {:?})",
        config.chip_path.display(),
        config.line_offset,
        config.bias,
        config.polarity
    );

    let button = Button::new(config);
    button.begin()?;

    let result = match args.command {
        Command::Poll { interval_ms } => run_poll(&button, interval_ms).await,
        Command::Watch { edges, debounce_ms } => {
            run_watch(&button, edges.into(), Duration::from_millis(debounce_ms)).await
        }
        Command::ResetButton { execute } => run_reset_button(&button, execute).await,
    };

    button.clean().await;
    result
}

/// ex1-style polling loop: sample the logical state until Ctrl+C
async fn run_poll(button: &Button, interval_ms: u64) -> anyhow::Result<()> {
    tracing::info!("polling button, press Ctrl+C to exit");
    let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = interval.tick() => {
                if button.is_pressed()? {
                    tracing::info!("button pressed");
                }
            }
        }
    }
    Ok(())
}

/// Interrupt mode: deliver debounced edges from the monitor callback
async fn run_watch(
    button: &Button,
    edges: EdgeSelect,
    debounce: Duration,
) -> anyhow::Result<()> {
    button.on_edge(|event| {
        tracing::info!(
            "{} edge at {}.{:09}",
            if event.is_rising() { "rising" } else { "falling" },
            event.timestamp.secs,
            event.timestamp.nanos
        );
    });
    button.begin_interrupt(edges, debounce).await?;

    tracing::info!("waiting for button events, press Ctrl+C to exit");
    tokio::signal::ctrl_c().await?;

    button.stop_interrupt().await;
    if let Some(error) = button.last_monitor_error() {
        tracing::warn!("monitor terminated early: {}", error);
    }
    Ok(())
}

/// Reset-button loop: a held press decides between reboot and shutdown
async fn run_reset_button(button: &Button, execute: bool) -> anyhow::Result<()> {
    tracing::info!("watching for a held press, press Ctrl+C to exit");
    let mut hold = button.hold_action();
    let mut interval = tokio::time::interval(Duration::from_millis(200));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let action = loop {
        tokio::select! {
            _ = &mut ctrl_c => return Ok(()),
            _ = interval.tick() => {
                if let Some(action) = hold.check().await? {
                    break action;
                }
            }
        }
    };

    if execute {
        execute_action(action)
    } else {
        tracing::info!("decided {:?} (re-run with --execute to perform it)", action);
        Ok(())
    }
}

/// Privileged system-action collaborator; requires root
fn execute_action(action: Action) -> anyhow::Result<()> {
    let status = match action {
        Action::Shutdown => std::process::Command::new("/sbin/shutdown")
            .args(["-h", "now"])
            .status()?,
        Action::Reboot => std::process::Command::new("/sbin/reboot").status()?,
    };
    anyhow::ensure!(status.success(), "system command exited with {}", status);
    Ok(())
}

fn init_logging(level: LogLevel, verbose_count: u8) {
    // Verbose count overrides log level
    let effective_level = match verbose_count {
        0 => level,
        1 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    let filter = match effective_level {
        LogLevel::Error => "gpio_button=error",
        LogLevel::Warn => "gpio_button=warn",
        LogLevel::Info => "gpio_button=info",
        LogLevel::Debug => "gpio_button=debug",
        LogLevel::Trace => "gpio_button=trace",
    };

    // Environment variable takes highest priority
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
    {
        eprintln!("failed to initialize tracing: {}", err);
    }
}
