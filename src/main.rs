//! ApiRunner CLI Entry Point
//!
//! Provides command-line interface for test case execution.
//!
//! # Usage
//!
//! ```bash
//! # Run the test cases in config.yaml
//! apirunner
//!
//! # Explicit configuration and worker count
//! apirunner suite.yaml --parallel 8
//!
//! # Skip target discovery
//! apirunner suite.yaml --target-uuid virtualservice-4f1c
//!
//! # Dry run mode (preview requests)
//! apirunner suite.yaml --dry-run
//!
//! # Write a JSON report
//! apirunner suite.yaml --report results.json
//! ```

use std::env;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use log::{error, info, warn};

use apirunner::execution::Engine;
use apirunner::http::ReqwestClient;
use apirunner::monitoring::{LogSink, TimelineSink};
use apirunner::prefetch::{configured_target, discover_target, PrefetchError};
use apirunner::report::TeeWriter;
use apirunner::workflow::parser::load_config;
use apirunner::{APP_NAME, VERSION};

/// Default configuration file used when none is specified.
const DEFAULT_CONFIG: &str = "config.yaml";

/// Default run log file.
const DEFAULT_LOG_FILE: &str = "output.log";

/// Command-line options parsed from arguments.
#[derive(Debug)]
struct CliOptions {
    config_path: String,
    max_parallel: Option<usize>,
    target_name: Option<String>,
    target_uuid: Option<String>,
    log_file: PathBuf,
    report_path: Option<PathBuf>,
    dry_run: bool,
    verbose: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            config_path: DEFAULT_CONFIG.to_string(),
            max_parallel: None,
            target_name: None,
            target_uuid: None,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            report_path: None,
            dry_run: false,
            verbose: false,
        }
    }
}

/// Configures logging to both the console and the run log file.
fn setup_logging(verbose: bool, log_file: File) {
    let level = if verbose { "debug" } else { "info" };

    let tee = TeeWriter::new().with(io::stdout()).with(log_file);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .target(env_logger::Target::Pipe(Box::new(tee)))
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{}", format!("{} v{}", APP_NAME, VERSION).bold());
    println!("HTTP Test Workflow Runner");
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: apirunner [OPTIONS] [CONFIG_FILE]");
    println!();
    println!("Arguments:");
    println!("  [CONFIG_FILE]        Path to configuration YAML (default: {})", DEFAULT_CONFIG);
    println!();
    println!("Options:");
    println!("  --parallel N         Maximum concurrently running test cases");
    println!("  --target NAME        Target virtual service name");
    println!("  --target-uuid UUID   Use this target UUID and skip discovery");
    println!("  --log-file PATH      Run log file (default: {})", DEFAULT_LOG_FILE);
    println!("  --report PATH        Write the run summary as JSON");
    println!("  --dry-run            Print the request plan without sending anything");
    println!("  --verbose            Enable debug logging");
    println!("  --help               Show this help message");
    println!("  --version            Show version information");
    println!();
    println!("Examples:");
    println!("  apirunner");
    println!("  apirunner suite.yaml --parallel 8");
    println!("  apirunner suite.yaml --target-uuid virtualservice-4f1c --report out.json");
}

/// Returns the value following an option, advancing the cursor.
fn option_value<'a>(args: &'a [String], i: &mut usize, option: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{} requires an argument", option))
}

/// Parses command-line arguments into CliOptions.
fn parse_arguments(args: &[String]) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut positional_seen = false;
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--dry-run" => {
                options.dry_run = true;
            }
            "--verbose" | "-v" => {
                options.verbose = true;
            }
            "--parallel" => {
                let value = option_value(args, &mut i, "--parallel")?;
                options.max_parallel = Some(
                    value
                        .parse()
                        .map_err(|_| format!("Invalid parallel value: {}", value))?,
                );
            }
            "--target" => {
                options.target_name = Some(option_value(args, &mut i, "--target")?.to_string());
            }
            "--target-uuid" => {
                options.target_uuid =
                    Some(option_value(args, &mut i, "--target-uuid")?.to_string());
            }
            "--log-file" => {
                options.log_file = PathBuf::from(option_value(args, &mut i, "--log-file")?);
            }
            "--report" => {
                options.report_path = Some(PathBuf::from(option_value(args, &mut i, "--report")?));
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                if positional_seen {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                options.config_path = arg.clone();
                positional_seen = true;
            }
        }
        i += 1;
    }

    Ok(options)
}

/// Main application flow. Returns whether every test case succeeded.
fn run(options: CliOptions) -> Result<bool, Box<dyn std::error::Error>> {
    info!("Loading configuration: {}", options.config_path);
    let mut config = load_config(&options.config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        format!(
            "Could not load configuration from '{}': {}",
            options.config_path, e
        )
    })?;

    if let Some(max) = options.max_parallel {
        config.settings.parallel_execution_count = max;
    }

    info!(
        "Configuration loaded: {} test cases, {} workers",
        config.test_cases.len(),
        config.settings.parallel_execution_count
    );

    let timeout = Duration::from_secs(config.settings.http_timeout_secs);
    let client = Arc::new(ReqwestClient::with_timeout(timeout)?);

    if options.dry_run {
        info!("Mode: DRY RUN (no requests will be sent)");
        let mut engine = Engine::new(config, client);
        if let Some(uuid) = options.target_uuid {
            engine.set_target_uuid(uuid);
        }
        for planned in engine.plan() {
            match planned.url {
                Some(url) => info!(
                    "[{}] {}: {} {}",
                    planned.test_case, planned.stage, planned.step_type, url
                ),
                None => info!("[{}] {}: {}", planned.test_case, planned.stage, planned.step_type),
            }
        }
        return Ok(true);
    }

    // Resolve the target once for all test cases
    let target_uuid = match options.target_uuid {
        Some(uuid) => {
            info!("Using target UUID {} (discovery skipped)", uuid);
            uuid
        }
        None => {
            let target_name = options
                .target_name
                .as_deref()
                .or_else(|| configured_target(&config.test_cases))
                .ok_or(PrefetchError::NoTargetName)?;
            discover_target(client.as_ref(), &config.api, target_name)?.target_uuid
        }
    };

    let timeline = Arc::new(TimelineSink::new());

    let mut engine = Engine::new(config, client);
    engine.set_target_uuid(target_uuid);
    engine.set_sink(Arc::new((LogSink, timeline.clone())));

    let summary = engine.run();

    info!("\n{}", summary.render());
    info!("{}", timeline.timeline().chart());

    if let Some(path) = &options.report_path {
        if let Err(e) = summary.write_json(path) {
            warn!("Could not write report to {}: {}", path.display(), e);
        }
    }

    Ok(summary.is_success())
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    let options = match parse_arguments(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let log_file = match File::create(&options.log_file) {
        Ok(file) => file,
        Err(e) => {
            eprintln!(
                "Error: could not create log file {}: {}",
                options.log_file.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    };

    setup_logging(options.verbose, log_file);
    print_banner();

    let log_path = options.log_file.clone();
    let outcome = run(options);

    println!();
    let code = match outcome {
        Ok(true) => {
            println!("{}", "All test cases succeeded".green().bold());
            ExitCode::SUCCESS
        }
        Ok(false) => {
            println!("{}", "Some test cases failed".red().bold());
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    };

    println!("Wrote full run output to: {}", log_path.display());
    code
}
