//! CLI Adapter.

mod menu;

use std::path::PathBuf;
use std::sync::{Arc, mpsc};

use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use env_logger::Env;

use crate::app::api::{
    self, ConfigUpdate, DownloadOverrides, InstallOptions, NextRefresh, ServeOptions, format_size,
};
use crate::domain::AppError;
use crate::ports::{LogProgress, PrintProgress};
use crate::services::local_ip;

pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "zap2xml-manager")]
#[command(version, disable_version_flag = true)]
#[command(
    about = "XMLTV EPG Manager - Fetch TV listings from Zap2it and ESPN+",
    long_about = None
)]
struct Cli {
    /// Print version
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    version: Option<bool>,
    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive menu (default)
    Menu,
    /// Download EPG data (non-interactive)
    #[clap(visible_alias = "dl")]
    Download {
        /// Lineup IDs (comma-separated)
        #[arg(short = 'l', long)]
        lineup: Option<String>,
        /// Country code (e.g. USA)
        #[arg(short = 'c', long)]
        country: Option<String>,
        /// Postal/ZIP code
        #[arg(short = 'z', long)]
        postal: Option<String>,
        /// Hours to fetch
        #[arg(short = 't', long, value_name = "HOURS")]
        timespan: Option<u32>,
        /// Output file path
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Include ESPN+
        #[arg(long)]
        espn: bool,
        /// Number of ESPN+ channels (0 = auto)
        #[arg(long, value_name = "N")]
        espn_channels: Option<u32>,
    },
    /// Start the server with auto-refresh scheduling
    Serve {
        /// Host/IP to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,
        /// Server port
        #[arg(short = 'p', long)]
        port: Option<u16>,
        /// Auto-refresh interval in hours (enables auto-refresh)
        #[arg(short = 'i', long, value_name = "HOURS")]
        refresh_interval: Option<u32>,
        /// Disable auto-refresh (only serve files)
        #[arg(long)]
        no_refresh: bool,
        /// Trigger an immediate EPG refresh on startup
        #[arg(long)]
        refresh_now: bool,
    },
    /// Show or set configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Set lineup IDs (comma-separated)
        #[arg(short = 'l', long)]
        lineup: Option<String>,
        /// Set country code
        #[arg(short = 'c', long)]
        country: Option<String>,
        /// Set postal/ZIP code
        #[arg(short = 'z', long)]
        postal: Option<String>,
        /// Enable/disable ESPN+
        #[arg(long, value_name = "true|false", value_parser = parse_bool)]
        espn: Option<bool>,
        /// Enable/disable auto-refresh
        #[arg(long, value_name = "true|false", value_parser = parse_bool)]
        auto_refresh: Option<bool>,
        /// Set refresh interval in hours
        #[arg(short = 'i', long, value_name = "HOURS")]
        refresh_interval: Option<u32>,
        /// Set server port
        #[arg(short = 'p', long)]
        port: Option<u16>,
        /// Set output directory
        #[arg(short = 'o', long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Use friendly channel names (ABC instead of W25DWD6)
        #[arg(long, value_name = "true|false", value_parser = parse_bool)]
        friendly_names: Option<bool>,
    },
    /// Show current status and EPG file info
    #[clap(visible_alias = "st")]
    Status,
    /// Install this binary and link it onto the PATH
    Install {
        /// Installation prefix; the binary goes to <prefix>/bin
        #[arg(long, default_value = api::DEFAULT_PREFIX)]
        prefix: PathBuf,
        /// Directory for the zap2xml-manager symlink
        #[arg(long, default_value = api::DEFAULT_BIN_DIR)]
        bin_dir: PathBuf,
        /// Replace a regular file at the link location
        #[arg(long)]
        force: bool,
    },
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("expected true or false, got '{}'", other)),
    }
}

/// Entry point for the CLI.
pub fn run() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let result: Result<i32, AppError> = match cli.command {
        None | Some(Commands::Menu) => menu::run_menu().map(|_| 0),
        Some(Commands::Download {
            lineup,
            country,
            postal,
            timespan,
            output,
            espn,
            espn_channels,
        }) => run_download(DownloadOverrides {
            lineups: lineup,
            country,
            postal_code: postal,
            timespan_hours: timespan,
            output,
            espn,
            espn_channels,
        })
        .map(|_| 0),
        Some(Commands::Serve { host, port, refresh_interval, no_refresh, refresh_now }) => {
            run_serve(ServeOptions {
                host,
                port,
                refresh_interval_hours: refresh_interval,
                no_refresh,
                refresh_now,
            })
            .map(|_| 0)
        }
        Some(Commands::Config {
            show: _,
            lineup,
            country,
            postal,
            espn,
            auto_refresh,
            refresh_interval,
            port,
            output_dir,
            friendly_names,
        }) => {
            let update = ConfigUpdate {
                lineups: lineup,
                country,
                postal_code: postal,
                espn,
                auto_refresh,
                refresh_interval_hours: refresh_interval,
                server_port: port,
                output_dir,
                friendly_names,
            };
            run_config(update).map(|_| 0)
        }
        Some(Commands::Status) => run_status().map(|_| 0),
        Some(Commands::Install { prefix, bin_dir, force }) => {
            run_install(prefix, bin_dir, force).map(|_| 0)
        }
    };

    match result {
        Ok(exit_code) => {
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_download(overrides: DownloadOverrides) -> Result<(), AppError> {
    let settings = api::download_settings(&overrides)?;

    println!("zap2xml-manager v{}", VERSION);
    println!("Output: {}", settings.output_path().display());
    println!();

    let result = api::download(settings, Arc::new(PrintProgress))?;

    println!();
    println!("✅ Success: {}", result.message);
    println!("  {} channels, {} programmes", result.channels, result.programmes);
    Ok(())
}

fn run_serve(options: ServeOptions) -> Result<(), AppError> {
    let settings = api::serve_settings(&options)?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })
    .map_err(|e| AppError::config_error(format!("Failed to install signal handler: {}", e)))?;

    let host = settings.server_host.clone();
    let output_dir = settings.output_dir.clone();
    let auto_refresh = settings.auto_refresh_enabled;
    let interval = settings.refresh_interval_hours;

    let mut daemon = api::serve(settings, false, Arc::new(LogProgress))?;
    let port = daemon.addr().port();

    println!("zap2xml-manager v{}", VERSION);
    println!("Serving EPG files from: {}", output_dir.display());
    println!("Binding to: {}:{}", host, port);
    println!("Access URL: http://{}:{}/", local_ip(), port);
    if auto_refresh {
        println!("Auto-refresh: every {} hours", interval);
    } else {
        println!("Auto-refresh: disabled");
    }
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    if options.refresh_now {
        println!("Triggering initial EPG refresh...");
        daemon.refresh_now();
    }

    let _ = shutdown_rx.recv();
    println!("\nShutting down...");
    daemon.stop();
    Ok(())
}

/// Setters always apply; `--show` only matters when none are given.
fn run_config(update: ConfigUpdate) -> Result<(), AppError> {
    if update.is_empty() {
        return show_config_info();
    }

    for line in api::config_set(&update)? {
        println!("{}", line);
    }
    println!("\n✅ Configuration saved.");
    Ok(())
}

fn show_config_info() -> Result<(), AppError> {
    let info = api::config_show()?;
    let s = &info.settings;

    println!("Config directory: {}", info.config_dir.display());
    println!("Data directory: {}", info.data_dir.display());
    println!("Config file: {}", info.config_file.display());
    println!("EPG output dir: {}", s.output_dir.display());
    println!("Server port: {}", s.server_port);
    println!();
    println!("Current settings:");
    println!("  Lineup IDs: {}", or_none(&s.lineup_list().join(", ")));
    println!("  Country: {}", s.country);
    println!("  Postal code: {}", or_none(&s.postal_code));
    println!("  ESPN+ enabled: {}", s.espn_plus_enabled);
    println!("  Friendly names: {}", s.prefer_affiliate_names);
    println!("  Auto-refresh: {} (every {}h)", s.auto_refresh_enabled, s.refresh_interval_hours);
    println!("  Last refresh: {}", s.last_refresh.as_deref().unwrap_or("Never"));
    Ok(())
}

fn run_status() -> Result<(), AppError> {
    let report = api::status()?;
    let s = &report.settings;

    println!("zap2xml-manager v{}", VERSION);
    println!("{}", "=".repeat(50));
    println!();

    println!("EPG Files:");
    println!("  {}", report.output_file.display());
    match &report.output {
        Some(file) => println!(
            "  Size: {} | Modified: {}",
            format_size(file.size),
            DateTime::<Local>::from(file.modified).format("%Y-%m-%d %H:%M:%S")
        ),
        None => println!("  (not found - run 'zap2xml-manager download' first)"),
    }
    println!();

    if report.xml_files.len() > 1 {
        println!("All XML files in output directory:");
        for file in &report.xml_files {
            println!("  {} ({})", file.name, format_size(file.size));
        }
        println!();
    }

    println!("Refresh Status:");
    match &s.last_refresh {
        Some(last) => {
            println!("  Last refresh: {}", last);
            if let Some(age) = report.last_refresh_age_hours {
                println!("  Age: {:.1} hours ago", age);
            }
            match report.next_refresh {
                NextRefresh::InHours(hours) => println!("  Next refresh: in {:.1} hours", hours),
                NextRefresh::DueNow => println!("  Next refresh: due now"),
                NextRefresh::Disabled => {}
            }
        }
        None => println!("  Last refresh: Never"),
    }
    println!();

    let ip = local_ip();
    println!("Server:");
    println!("  URL: http://{}:{}/", ip, s.server_port);
    println!("  EPG URL: http://{}:{}/{}", ip, s.server_port, s.output_filename);
    if s.auto_refresh_enabled {
        println!("  Auto-refresh: enabled (every {}h)", s.refresh_interval_hours);
    } else {
        println!("  Auto-refresh: disabled");
    }
    println!();

    println!("Configuration:");
    println!("  Lineups: {}", or_none(&s.lineup_list().join(", ")));
    println!("  Country: {}", s.country);
    println!("  Postal: {}", or_none(&s.postal_code));
    println!("  ESPN+: {}", if s.espn_plus_enabled { "enabled" } else { "disabled" });
    Ok(())
}

fn run_install(prefix: PathBuf, bin_dir: PathBuf, force: bool) -> Result<(), AppError> {
    let source = std::env::current_exe()?;
    let options = InstallOptions { source, prefix, bin_dir, force };
    let outcome = api::install(&options)?;

    println!("✅ Installed zap2xml-manager to {}", outcome.binary_path.display());
    let verb = if outcome.replaced_link { "Updated" } else { "Created" };
    println!(
        "✅ {} link {} -> {}",
        verb,
        outcome.link_path.display(),
        outcome.binary_path.display()
    );
    println!();
    println!("Usage:");
    println!("  zap2xml-manager                    # interactive menu");
    println!("  zap2xml-manager serve              # serve EPG with auto-refresh");
    println!("  zap2xml-manager serve -i 12 --refresh-now");
    println!("  zap2xml-manager download --lineup USA-OTA12345 --postal 10001");
    println!("  zap2xml-manager config --lineup USA-OTA12345 --postal 10001");
    Ok(())
}

fn or_none(value: &str) -> &str {
    if value.trim().is_empty() { "(none)" } else { value }
}
