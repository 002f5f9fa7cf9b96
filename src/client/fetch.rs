use std::path::PathBuf;

use reqwest::Client;
use tracing::{debug, info};

use buoyspec::core::compression::decode_text;
use buoyspec::{BuoyError, Result, SourceKind};

use crate::models::config::SourceConfig;

/// Retrieves the six raw texts of a station from the configured source.
pub struct StationFetcher {
    client: Client,
    source: SourceConfig,
}

impl StationFetcher {
    pub fn new(source: SourceConfig) -> Self {
        Self {
            client: Client::new(),
            source,
        }
    }

    /// Texts in [`SourceKind::ALL`] order.
    pub async fn fetch_texts(&self, station: &str) -> Result<[String; 6]> {
        let [met, spec, swdir, swdir2, swr1, swr2] = SourceKind::ALL;

        let texts = tokio::try_join!(
            self.fetch_one(station, met),
            self.fetch_one(station, spec),
            self.fetch_one(station, swdir),
            self.fetch_one(station, swdir2),
            self.fetch_one(station, swr1),
            self.fetch_one(station, swr2),
        )?;

        info!("Fetched all sources for station {}", station);
        Ok([texts.0, texts.1, texts.2, texts.3, texts.4, texts.5])
    }

    async fn fetch_one(&self, station: &str, kind: SourceKind) -> Result<String> {
        match &self.source {
            SourceConfig::Http { base_url } => {
                let url = format!("{}/{}.{}", base_url.trim_end_matches('/'), station, kind.suffix());
                debug!("GET {}", url);

                let fetch_err = |e: reqwest::Error| BuoyError::Fetch {
                    url: url.clone(),
                    message: e.to_string(),
                };

                let bytes = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(fetch_err)?
                    .error_for_status()
                    .map_err(fetch_err)?
                    .bytes()
                    .await
                    .map_err(fetch_err)?;

                decode_text(&bytes)
            }

            SourceConfig::Directory { path } => {
                let plain = PathBuf::from(path).join(format!("{}.{}", station, kind.suffix()));
                let gzipped = plain.with_extension(format!("{}.gz", kind.suffix()));

                let file = if tokio::fs::try_exists(&plain).await? {
                    plain
                } else {
                    gzipped
                };
                debug!("reading {}", file.display());

                let bytes = tokio::fs::read(&file).await.map_err(|e| BuoyError::Fetch {
                    url: file.display().to_string(),
                    message: e.to_string(),
                })?;

                decode_text(&bytes)
            }
        }
    }
}
