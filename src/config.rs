use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use url::Url;

pub const FOOD_IMPACT_FILE: &str = "environmental-impact-food.csv";
pub const CONSUMPTION_FILE: &str = "versorgungsbilanz-fleisch.csv";
pub const IMPACT_FILE: &str = "environmental-impact-streamlit.csv";
pub const PROTEIN_FILE: &str = "environmental-impact-nu.csv";
pub const FOUNDED_FILE: &str = "alt-protein-founded.csv";
pub const COUNTRY_FILE: &str = "alt-protein-country.csv";

pub const COUNTRY_CODES_CACHE: &str = "country-codes.csv";
pub const WORLD_GEOMETRY_CACHE: &str = "world-110m.json";

pub const DEFAULT_COUNTRY_CODES_URL: &str =
    "https://raw.githubusercontent.com/lukes/ISO-3166-Countries-with-Regional-Codes/master/all/all.csv";
pub const DEFAULT_WORLD_GEOMETRY_URL: &str =
    "https://cdn.jsdelivr.net/npm/vega-datasets@v1.29.0/data/world-110m.json";

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub country_codes_url: Url,
    pub world_geometry_url: Url,
    pub offline: bool,
    pub fetch_timeout_secs: u64,
    pub out_path: PathBuf,
    pub port: u16,
}

impl ReportConfig {
    pub fn from_env() -> Result<Self> {
        let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()));
        let cache_dir = std::env::var("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("cache"));
        Ok(Self {
            country_codes_url: parse_url(
                "COUNTRY_CODES_URL",
                &std::env::var("COUNTRY_CODES_URL").unwrap_or_else(|_| DEFAULT_COUNTRY_CODES_URL.to_string()),
            )?,
            world_geometry_url: parse_url(
                "WORLD_GEOMETRY_URL",
                &std::env::var("WORLD_GEOMETRY_URL").unwrap_or_else(|_| DEFAULT_WORLD_GEOMETRY_URL.to_string()),
            )?,
            offline: matches!(std::env::var("REPORT_OFFLINE").as_deref(), Ok("1") | Ok("true")),
            fetch_timeout_secs: std::env::var("FETCH_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(20),
            out_path: PathBuf::from(
                std::env::var("REPORT_OUT").unwrap_or_else(|_| "out/report/index.html".to_string()),
            ),
            port: std::env::var("REPORT_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8787),
            data_dir,
            cache_dir,
        })
    }

    /// Config rooted at `data_dir`, offline, with the cache inside it.
    pub fn for_data_dir(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            cache_dir: data_dir.join("cache"),
            country_codes_url: default_url(DEFAULT_COUNTRY_CODES_URL),
            world_geometry_url: default_url(DEFAULT_WORLD_GEOMETRY_URL),
            offline: true,
            fetch_timeout_secs: 20,
            out_path: data_dir.join("report.html"),
            port: 8787,
        }
    }

    pub fn dataset_path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    pub fn country_codes_path(&self) -> PathBuf {
        self.cache_dir.join(COUNTRY_CODES_CACHE)
    }

    pub fn world_geometry_path(&self) -> PathBuf {
        self.cache_dir.join(WORLD_GEOMETRY_CACHE)
    }
}

fn parse_url(var: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| anyhow!("{} is not a valid url ({}): {}", var, raw, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(anyhow!("{} must be http(s), got scheme {}", var, other)),
    }
}

fn default_url(raw: &str) -> Url {
    // The defaults are compile-time constants checked by `defaults_are_valid_urls`.
    Url::parse(raw).unwrap_or_else(|_| unreachable!("invalid default url {}", raw))
}
