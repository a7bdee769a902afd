//! Interactive menu.

use std::io::ErrorKind;
use std::str::FromStr;
use std::sync::Arc;

use dialoguer::{Confirm, Error as DialoguerError, Input, Select};

use super::VERSION;
use crate::app::api::{self, Settings};
use crate::app::daemon::Daemon;
use crate::domain::AppError;
use crate::ports::PrintProgress;
use crate::services::local_ip;

enum MenuAction {
    Download,
    ViewConfig,
    EditSettings,
    ToggleServer,
    RefreshNow,
    Quit,
}

pub(super) fn run_menu() -> Result<(), AppError> {
    let mut settings = api::config_show()?.settings;
    let mut daemon: Option<Daemon> = None;

    if settings.server_enabled {
        println!("Auto-starting server...");
        daemon = start_server(&settings);
    }

    loop {
        print_header();
        show_status(&settings, daemon.as_ref());

        let Some(action) = select_action(daemon.is_some())? else {
            break;
        };

        match action {
            MenuAction::Download => download_epg(&settings),
            MenuAction::ViewConfig => show_config(&settings),
            MenuAction::EditSettings => {
                if edit_settings(&mut settings)? {
                    settings = api::config_show()?.settings;
                }
            }
            MenuAction::ToggleServer => match daemon.take() {
                Some(mut running) => {
                    running.stop();
                    println!("Server stopped");
                }
                None => daemon = start_server(&settings),
            },
            MenuAction::RefreshNow => match &daemon {
                Some(running) => {
                    println!("Triggering EPG refresh...");
                    running.refresh_now();
                    println!("✅ Refresh triggered!");
                }
                None => println!("⚠️  Server not running or no scheduler active"),
            },
            MenuAction::Quit => break,
        }

        if !pause()? {
            break;
        }
    }

    if let Some(mut running) = daemon {
        println!("Stopping server...");
        running.stop();
    }
    println!("Goodbye!");
    Ok(())
}

fn print_header() {
    println!();
    println!("zap2xml-manager v{}", VERSION);
    println!("{}", "=".repeat(50));
}

fn show_status(settings: &Settings, daemon: Option<&Daemon>) {
    let ip = local_ip();
    let output = settings.output_path();

    if output.is_file() {
        println!("EPG File:     {}", output.display());
    } else {
        println!("EPG File:     {} (not found)", output.display());
    }
    println!("Last Refresh: {}", settings.last_refresh.as_deref().unwrap_or("Never"));
    let running = daemon.map(Daemon::is_running).unwrap_or(false);
    println!("Server:       {}", if running { "running" } else { "stopped" });
    println!("Server URL:   http://{}:{}/", ip, settings.server_port);
    println!("EPG URL:      http://{}:{}/{}", ip, settings.server_port, settings.output_filename);
    println!();
}

fn select_action(server_running: bool) -> Result<Option<MenuAction>, AppError> {
    let server_item = if server_running { "Stop Server" } else { "Start Server" };
    let items = [
        "Download EPG",
        "View Configuration",
        "Edit Settings",
        server_item,
        "Refresh Now (if server running)",
        "Quit",
    ];

    let selection = Select::new()
        .with_prompt("Select option")
        .items(&items)
        .default(0)
        .interact_opt()
        .map_err(|err| AppError::Prompt(format!("Failed to select option: {}", err)))?;

    Ok(selection.map(|index| match index {
        0 => MenuAction::Download,
        1 => MenuAction::ViewConfig,
        2 => MenuAction::EditSettings,
        3 => MenuAction::ToggleServer,
        4 => MenuAction::RefreshNow,
        _ => MenuAction::Quit,
    }))
}

fn download_epg(settings: &Settings) {
    println!("Downloading EPG...");
    println!();

    match api::download(settings.clone(), Arc::new(PrintProgress)) {
        Ok(result) => {
            println!();
            println!("✅ {}", result.message);
            println!("   File: {}", result.file_path.display());
        }
        Err(e) => {
            println!();
            println!("❌ Error: {}", e);
        }
    }
}

fn show_config(settings: &Settings) {
    let yes_no = |flag: bool| if flag { "Yes" } else { "No" };
    let lineups = settings.lineup_list().join(", ");

    println!("Configuration");
    println!("  Lineups:          {}", if lineups.is_empty() { "(none)" } else { &lineups });
    println!("  Country:          {}", settings.country);
    println!(
        "  Postal Code:      {}",
        if settings.postal_code.is_empty() { "(none)" } else { &settings.postal_code }
    );
    println!("  Hours to Fetch:   {}", settings.timespan_hours);
    println!("  Delay (sec):      {}", settings.delay_seconds);
    println!("  Output Dir:       {}", settings.output_dir.display());
    println!("  Filename:         {}", settings.output_filename);
    println!("  Merge Lineups:    {}", yes_no(settings.merge_lineups));
    println!("  Friendly Names:   {}", yes_no(settings.prefer_affiliate_names));
    println!("  ESPN+ Enabled:    {}", yes_no(settings.espn_plus_enabled));
    if settings.espn_plus_channels == 0 {
        println!("  ESPN+ Channels:   auto");
    } else {
        println!("  ESPN+ Channels:   {}", settings.espn_plus_channels);
    }
    println!("  ESPN+ Offset:     {}", settings.espn_plus_offset);
    println!("  Server Enabled:   {}", yes_no(settings.server_enabled));
    println!("  Server Port:      {}", settings.server_port);
    println!("  Auto-Refresh:     {}", yes_no(settings.auto_refresh_enabled));
    println!("  Refresh Interval: {} hours", settings.refresh_interval_hours);
    println!();
    if let Ok(info) = api::config_show() {
        println!("Config file: {}", info.config_file.display());
    }
}

/// Walk through the editable settings. Returns whether they were saved.
fn edit_settings(settings: &mut Settings) -> Result<bool, AppError> {
    println!("Edit Settings (press Enter to keep the current value)");
    println!();

    let mut edited = settings.clone();

    let lineups = prompt_text("Lineup IDs (comma-separated)", &edited.lineup_list().join(", "))?;
    edited.lineup_ids = Settings::parse_lineups(&lineups);

    let country = prompt_text("Country", &edited.country)?;
    edited.country = if country.trim().is_empty() { "USA".to_string() } else { country };
    edited.postal_code = prompt_text("Postal Code", &edited.postal_code)?;
    edited.timespan_hours = prompt_number("Hours to Fetch", edited.timespan_hours)?;
    edited.output_dir =
        prompt_text("Output Directory", &edited.output_dir.to_string_lossy())?.into();
    let filename = prompt_text("Output Filename", &edited.output_filename)?;
    if !filename.trim().is_empty() {
        edited.output_filename = filename;
    }

    edited.espn_plus_enabled = prompt_confirm("Enable ESPN+?", edited.espn_plus_enabled)?;
    if edited.espn_plus_enabled {
        edited.espn_plus_channels =
            prompt_number("ESPN+ Channels (0 = auto)", edited.espn_plus_channels)?;
    }

    edited.prefer_affiliate_names =
        prompt_confirm("Use Friendly Names?", edited.prefer_affiliate_names)?;
    edited.server_enabled = prompt_confirm("Enable Server on startup?", edited.server_enabled)?;
    edited.server_port = prompt_number("Server Port", edited.server_port)?;

    edited.auto_refresh_enabled =
        prompt_confirm("Enable Auto-Refresh?", edited.auto_refresh_enabled)?;
    if edited.auto_refresh_enabled {
        edited.refresh_interval_hours =
            prompt_number("Refresh Interval (hours)", edited.refresh_interval_hours)?;
    }

    println!();
    if !prompt_confirm("Save settings?", true)? {
        println!("Changes discarded.");
        return Ok(false);
    }

    match api::config_save(&edited) {
        Ok(()) => {
            *settings = edited;
            println!("✅ Settings saved!");
            Ok(true)
        }
        Err(e) => {
            println!("❌ Settings not saved: {}", e);
            Ok(false)
        }
    }
}

fn start_server(settings: &Settings) -> Option<Daemon> {
    match api::serve(settings.clone(), false, Arc::new(PrintProgress)) {
        Ok(daemon) => {
            let ip = local_ip();
            let port = daemon.addr().port();
            println!("✅ Server running at:");
            println!("  http://{}:{}/", ip, port);
            println!("  EPG: http://{}:{}/{}", ip, port, settings.output_filename);
            Some(daemon)
        }
        Err(e) => {
            println!("❌ Failed to start server: {}", e);
            None
        }
    }
}

/// Wait for Enter. Returns false when input was interrupted.
fn pause() -> Result<bool, AppError> {
    match Input::<String>::new()
        .with_prompt("Press Enter to continue")
        .allow_empty(true)
        .interact_text()
    {
        Ok(_) => Ok(true),
        Err(DialoguerError::IO(err)) if err.kind() == ErrorKind::Interrupted => Ok(false),
        Err(err) => Err(AppError::Prompt(err.to_string())),
    }
}

fn prompt_text(prompt: &str, current: &str) -> Result<String, AppError> {
    Input::<String>::new()
        .with_prompt(prompt)
        .default(current.to_string())
        .allow_empty(true)
        .interact_text()
        .map_err(|err| AppError::Prompt(format!("Failed to read {}: {}", prompt, err)))
}

/// Numeric prompt; unparsable input keeps `current`.
fn prompt_number<T>(prompt: &str, current: T) -> Result<T, AppError>
where
    T: FromStr + ToString + Copy,
{
    let value = prompt_text(prompt, &current.to_string())?;
    Ok(value.trim().parse().unwrap_or(current))
}

fn prompt_confirm(prompt: &str, current: bool) -> Result<bool, AppError> {
    Confirm::new()
        .with_prompt(prompt)
        .default(current)
        .interact()
        .map_err(|err| AppError::Prompt(format!("Failed to read {}: {}", prompt, err)))
}
