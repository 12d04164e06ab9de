//! Reference data fetched once and cached: the ISO-3166 code table and the
//! world-110m TopoJSON boundaries.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::config::ReportConfig;
use crate::data::{records, CsvTable, WorldGeometry, COUNTRY_CODE_COLUMNS};
use crate::logging::{self, obj, v_str, Domain};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fetched {
    Cached,
    Downloaded,
}

/// Make sure both reference files exist in the cache directory.
///
/// Cached files are reused as-is. A download is validated before it replaces
/// anything, so a failed or truncated fetch never poisons the cache.
pub async fn ensure_reference_data(cfg: &ReportConfig) -> Result<(Fetched, Fetched)> {
    let client = Client::builder()
        .timeout(Duration::from_secs(cfg.fetch_timeout_secs))
        .build()
        .context("cannot build http client")?;
    let codes = ensure_file(
        &client,
        cfg,
        &cfg.country_codes_url,
        &cfg.country_codes_path(),
        check_country_codes,
    )
    .await?;
    let world = ensure_file(
        &client,
        cfg,
        &cfg.world_geometry_url,
        &cfg.world_geometry_path(),
        check_world_geometry,
    )
    .await?;
    Ok((codes, world))
}

async fn ensure_file(
    client: &Client,
    cfg: &ReportConfig,
    url: &Url,
    path: &Path,
    check: fn(&str, &str) -> Result<()>,
) -> Result<Fetched> {
    if path.exists() {
        logging::debug(
            Domain::Remote,
            "reference_cached",
            obj(&[("path", v_str(&path.display().to_string()))]),
        );
        return Ok(Fetched::Cached);
    }
    if cfg.offline {
        bail!(
            "{} is not cached and REPORT_OFFLINE is set; fetch {} manually",
            path.display(),
            url
        );
    }

    logging::info(Domain::Remote, "reference_fetch", obj(&[("url", v_str(url.as_str()))]));
    let body = fetch_text(client, url)
        .await
        .map_err(|e| {
            logging::error(
                Domain::Remote,
                "reference_fetch_failed",
                obj(&[("url", v_str(url.as_str())), ("msg", v_str(&format!("{:#}", e)))]),
            );
            e
        })?;
    check(url.as_str(), &body)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create cache dir {}", parent.display()))?;
    }
    let part = path.with_extension("part");
    std::fs::write(&part, &body).with_context(|| format!("cannot write {}", part.display()))?;
    std::fs::rename(&part, path).with_context(|| format!("cannot move {} into place", part.display()))?;

    logging::info(
        Domain::Remote,
        "reference_stored",
        obj(&[
            ("path", v_str(&path.display().to_string())),
            ("bytes", json!(body.len())),
        ]),
    );
    Ok(Fetched::Downloaded)
}

async fn fetch_text(client: &Client, url: &Url) -> Result<String> {
    let resp = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("request to {} failed", url))?;
    let status = resp.status();
    if !status.is_success() {
        bail!("{} returned {}", url, status);
    }
    Ok(resp.text().await?)
}

/// The code table must carry names and numeric codes that parse.
pub fn check_country_codes(source: &str, body: &str) -> Result<()> {
    let table = CsvTable::parse(source, body)?;
    for col in COUNTRY_CODE_COLUMNS {
        table.column(col)?;
    }
    if records::country_codes(&table)?.is_empty() {
        bail!("{}: no country rows", source);
    }
    Ok(())
}

pub fn check_world_geometry(source: &str, body: &str) -> Result<()> {
    let world = WorldGeometry::from_json(source, body)?;
    if world.country_ids.is_empty() {
        bail!("{}: no country geometries with numeric ids", source);
    }
    Ok(())
}
