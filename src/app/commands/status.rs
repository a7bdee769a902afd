use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

use crate::app::AppContext;
use crate::domain::{Settings, refresh};
use crate::services::{XmlFile, list_xml_files};

/// When the next automatic refresh happens, relative to now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NextRefresh {
    Disabled,
    DueNow,
    InHours(f64),
}

#[derive(Debug, Clone)]
pub struct StatusReport {
    pub settings: Settings,
    pub output_file: PathBuf,
    /// The configured output file, when present.
    pub output: Option<XmlFile>,
    /// Every XML file in the output directory, newest first.
    pub xml_files: Vec<XmlFile>,
    pub last_refresh_age_hours: Option<f64>,
    pub next_refresh: NextRefresh,
}

pub fn execute(ctx: &AppContext, now: DateTime<Utc>) -> StatusReport {
    let settings = ctx.store().load_or_default();
    let output_file = settings.output_path();

    let mut xml_files = list_xml_files(&settings.output_dir);
    xml_files.sort_by(|a, b| b.modified.cmp(&a.modified));
    let output = fs::metadata(&output_file).ok().filter(|meta| meta.is_file()).map(|meta| XmlFile {
        name: settings.output_filename.clone(),
        path: output_file.clone(),
        size: meta.len(),
        modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
    });

    let last = settings.last_refresh_at();
    let last_refresh_age_hours = last.map(|at| hours_between(at, now));
    let next_refresh = match refresh::next_refresh(&settings, now) {
        None => NextRefresh::Disabled,
        Some(at) if at > now => NextRefresh::InHours(hours_between(now, at)),
        Some(_) => NextRefresh::DueNow,
    };

    StatusReport { settings, output_file, output, xml_files, last_refresh_age_hours, next_refresh }
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 3600.0
}

/// `12.3 KB` below a megabyte, `4.5 MB` above.
pub fn format_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    if kb < 1024.0 { format!("{:.1} KB", kb) } else { format!("{:.1} MB", kb / 1024.0) }
}
