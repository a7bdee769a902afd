//! Download orchestration: fetch every configured source, merge, write.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::warn;

use crate::app::AppContext;
use crate::app::sources::espn::{EspnOptions, fetch_espn_plus};
use crate::app::sources::zap2it::{LineupOptions, fetch_lineup};
use crate::domain::guide::{self, Guide};
use crate::domain::{AppError, Settings};
use crate::ports::ProgressSink;
use crate::services::atomic_write;

/// Outcome of a successful download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub message: String,
    pub file_path: PathBuf,
    pub channels: usize,
    pub programmes: usize,
}

pub struct EpgManager {
    ctx: AppContext,
    sink: Arc<dyn ProgressSink>,
}

impl EpgManager {
    pub fn new(ctx: AppContext, sink: Arc<dyn ProgressSink>) -> Self {
        Self { ctx, sink }
    }

    /// Download with `settings` as given, which may carry unsaved overrides.
    ///
    /// On success `settings.last_refresh` is updated and only that field is
    /// written back to the store.
    pub fn download(&self, settings: &mut Settings) -> Result<DownloadResult, AppError> {
        self.download_at(settings, Utc::now())
    }

    pub(crate) fn download_at(
        &self,
        settings: &mut Settings,
        now: DateTime<Utc>,
    ) -> Result<DownloadResult, AppError> {
        let lineups = settings.lineup_list();
        if lineups.is_empty() && !settings.espn_plus_enabled {
            return Err(AppError::NothingToFetch);
        }

        let mut guides: Vec<Guide> = Vec::new();

        if !lineups.is_empty() {
            let client = self.ctx.clients().listings_client(settings)?;
            for lineup_id in &lineups {
                self.sink.report(&format!("Fetching Zap2it lineup: {}", lineup_id));
                let options = LineupOptions::from_settings(lineup_id, settings);
                match fetch_lineup(client.as_ref(), &options, self.sink.as_ref(), now) {
                    Ok(guide) => {
                        self.sink.report(&format!(
                            "  -> Success: {} channels, {} programmes",
                            guide.channels.len(),
                            guide.programmes.len()
                        ));
                        guides.push(guide);
                    }
                    Err(e) => {
                        self.sink.report(&format!("  -> Failed: {}", e));
                        return Err(AppError::LineupFailed {
                            lineup: lineup_id.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        if settings.espn_plus_enabled {
            self.sink.report("Fetching ESPN+ schedule...");
            let options = EspnOptions {
                num_channels: settings.espn_plus_channels,
                channel_offset: settings.espn_plus_offset,
            };
            let result = self
                .ctx
                .clients()
                .schedule_client(settings)
                .and_then(|client| {
                    fetch_espn_plus(client.as_ref(), options, self.sink.as_ref(), now)
                });
            match result {
                Ok(guide) => {
                    self.sink.report(&format!("  -> Success: {} channels", guide.channels.len()));
                    guides.push(guide);
                }
                Err(e) => {
                    warn!("ESPN+ fetch failed: {}", e);
                    self.sink.report(&format!("  -> ESPN+ fetch failed (non-fatal): {}", e));
                }
            }
        }

        if guides.is_empty() {
            return Err(AppError::NoGuideData);
        }

        let guide = if settings.merge_lineups && guides.len() > 1 {
            self.sink.report(&format!("Merging {} EPG sources...", guides.len()));
            guide::merge(guides)?
        } else {
            guides.swap_remove(0)
        };

        let output_path = settings.output_path();
        fs::create_dir_all(&settings.output_dir)?;
        atomic_write(&output_path, &guide::render_xmltv(&guide)?, None)?;
        self.sink.report(&format!("  -> Wrote {}", output_path.display()));

        settings.mark_refreshed(now);
        self.persist_last_refresh(settings);

        Ok(DownloadResult {
            message: format!("EPG saved to {}", output_path.display()),
            file_path: output_path,
            channels: guide.channels.len(),
            programmes: guide.programmes.len(),
        })
    }

    /// The guide is already on disk, so a store failure only costs the
    /// timestamp.
    fn persist_last_refresh(&self, settings: &Settings) {
        let result = self.ctx.store().load().and_then(|mut stored| {
            stored.last_refresh = settings.last_refresh.clone();
            self.ctx.store().save(&stored)
        });
        if let Err(e) = result {
            warn!("Could not record last refresh time: {}", e);
            self.sink.report(&format!("⚠️  Could not record last refresh time: {}", e));
        }
    }
}
