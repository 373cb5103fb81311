use anyhow::Result;
use clap::Parser;
use picam::{PicamConfig, PicamError, PicamRuntime, RuntimeOptions};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

const EXIT_RUNTIME_ERROR: i32 = 1;
const EXIT_CONFIG_ERROR: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "picam")]
#[command(about = "Pocket camera launcher for the Raspberry Pi Zero")]
#[command(version)]
#[command(long_about = "Drives a 128x128 display and a five-way button pad as a small \
camera: a launcher, a live preview with still capture into a network-visible photo tree, \
and a settings screen with WiFi and device status.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "picam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without touching hardware")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Dry run mode - build every component headless, then exit
    #[arg(long, help = "Initialize all components without a panel, then exit")]
    dry_run: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Also write daily-rotated log files into this directory
    #[arg(long, value_name = "DIR", help = "Directory for rotating log files")]
    log_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        println!("# picam configuration with every option at its default");
        println!();
        println!("{}", PicamConfig::default_toml()?);
        return Ok(());
    }

    // Held until exit so buffered file logs are flushed
    let log_guard = init_logging(&args)?;

    info!("Starting picam v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match PicamConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(EXIT_CONFIG_ERROR);
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(EXIT_CONFIG_ERROR);
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let options = RuntimeOptions {
        headless: args.dry_run,
    };
    let mut runtime = match PicamRuntime::with_options(config, options) {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to initialize picam: {}", e);
            eprintln!("Failed to initialize picam: {}", e);
            std::process::exit(exit_code_for(&e));
        }
    };

    if args.dry_run {
        info!("Dry run mode - components initialized but not started");
        println!("✓ Dry run completed successfully - all components initialized");
        return Ok(());
    }

    let exit_code = match runtime.run().await {
        Ok(code) => code,
        Err(e) => {
            error!("System error during execution: {}", e);
            exit_code_for(&e)
        }
    };

    info!("picam exited with code: {}", exit_code);
    drop(log_guard);
    std::process::exit(exit_code);
}

fn exit_code_for(error: &PicamError) -> i32 {
    if error.is_config_error() {
        EXIT_CONFIG_ERROR
    } else {
        EXIT_RUNTIME_ERROR
    }
}

fn init_logging(args: &Args) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("picam={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    let (file_layer, guard) = match &args.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "picam.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}
