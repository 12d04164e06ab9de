//! Companies-per-country map.
//!
//! The geometry carries ISO-3166 numeric ids; the metric table is keyed by
//! country name. Fills are resolved here with two lookups (id -> name -> count)
//! and left-join semantics: a geometry without a metric keeps the background.

use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::ChartSpec;
use crate::data::{CountryCode, CountryCompanyRecord, WorldGeometry};
use crate::logging::{self, obj, Domain};
use crate::style::Style;

pub const CHART_ID: &str = "companies-per-country";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fill {
    Background,
    Ramp(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryFill {
    pub id: u16,
    pub name: String,
    #[serde(rename = "Number of Companies per Country")]
    pub companies: u32,
    pub fill: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethScale {
    by_id: BTreeMap<u16, CountryFill>,
    domain: Option<(u32, u32)>,
    /// Metric rows whose country name has no numeric code.
    pub unmatched_names: Vec<String>,
}

impl ChoroplethScale {
    /// Only countries drawn by `world` take part in the colour domain.
    pub fn resolve(
        codes: &[CountryCode],
        metrics: &[CountryCompanyRecord],
        world: &WorldGeometry,
        style: &Style,
    ) -> Self {
        let by_name: HashMap<&str, u32> = metrics.iter().map(|m| (m.country.as_str(), m.count)).collect();
        let drawn: HashSet<u16> = world.country_ids.iter().copied().collect();
        let matched: Vec<(&CountryCode, u32)> = codes
            .iter()
            .filter(|c| drawn.contains(&c.code))
            .filter_map(|c| by_name.get(c.name.as_str()).map(|n| (c, *n)))
            .collect();

        let domain = matched
            .iter()
            .map(|(_, n)| *n)
            .fold(None, |acc: Option<(u32, u32)>, n| match acc {
                None => Some((n, n)),
                Some((lo, hi)) => Some((lo.min(n), hi.max(n))),
            });

        let by_id = matched
            .into_iter()
            .map(|(code, n)| {
                let t = match domain {
                    Some((lo, hi)) if hi > lo => (n - lo) as f64 / (hi - lo) as f64,
                    _ => 0.5,
                };
                (
                    code.code,
                    CountryFill {
                        id: code.code,
                        name: code.name.clone(),
                        companies: n,
                        fill: ramp_color(&style.red_ramp, t),
                    },
                )
            })
            .collect();

        let unmatched_names: Vec<String> = metrics
            .iter()
            .filter(|m| !codes.iter().any(|c| c.name == m.country))
            .map(|m| m.country.clone())
            .collect();
        if !unmatched_names.is_empty() {
            logging::debug(
                Domain::Chart,
                "choropleth_unmatched_names",
                obj(&[("names", json!(unmatched_names))]),
            );
        }

        Self {
            by_id,
            domain,
            unmatched_names,
        }
    }

    pub fn fill_for(&self, id: u16) -> Fill {
        match self.by_id.get(&id) {
            Some(entry) => Fill::Ramp(entry.fill.clone()),
            None => Fill::Background,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &CountryFill> {
        self.by_id.values()
    }

    /// Smallest and largest matched company count.
    pub fn domain(&self) -> Option<(u32, u32)> {
        self.domain
    }
}

/// Piecewise-linear RGB interpolation across hex colour stops, `t` in [0, 1].
pub fn ramp_color(stops: &[&str], t: f64) -> String {
    let rgb: Vec<[u8; 3]> = stops.iter().filter_map(|s| parse_hex(s)).collect();
    match rgb.len() {
        0 => return "#000000".to_string(),
        1 => return to_hex(rgb[0]),
        _ => {}
    }
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let segments = (rgb.len() - 1) as f64;
    let pos = t * segments;
    let idx = (pos.floor() as usize).min(rgb.len() - 2);
    let local = pos - idx as f64;
    let (a, b) = (rgb[idx], rgb[idx + 1]);
    let mix = |i: usize| (a[i] as f64 + (b[i] as f64 - a[i] as f64) * local).round() as u8;
    to_hex([mix(0), mix(1), mix(2)])
}

fn parse_hex(s: &str) -> Option<[u8; 3]> {
    let h = s.strip_prefix('#')?;
    if h.len() != 6 {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&h[i..i + 2], 16).ok();
    Some([byte(0)?, byte(2)?, byte(4)?])
}

fn to_hex(c: [u8; 3]) -> String {
    format!("#{:02X}{:02X}{:02X}", c[0], c[1], c[2])
}

/// Uniform background layer plus the resolved foreground fills.
pub fn company_map(world: &WorldGeometry, scale: &ChoroplethScale, style: &Style) -> ChartSpec {
    let entries: Vec<&CountryFill> = scale.entries().collect();
    let mut encoding = json!({
        "fill": {"field": "fill", "type": "nominal", "scale": null, "legend": null},
        "tooltip": [
            {"field": "name", "type": "nominal", "title": "Country"},
            {
                "field": "Number of Companies per Country",
                "type": "quantitative",
                "title": "Number of Companies",
            },
        ],
    });
    // `fill` wins over `color` on the mark; `color` only feeds the gradient legend.
    if let (Some((lo, hi)), Some(map)) = (scale.domain(), encoding.as_object_mut()) {
        map.insert(
            "color".to_string(),
            json!({
                "field": "Number of Companies per Country",
                "type": "quantitative",
                "scale": {"domain": [lo, hi], "range": style.red_ramp, "interpolate": "rgb"},
                "legend": {"title": "Number of Companies"},
            }),
        );
    }
    ChartSpec::new(
        json!({
            "width": style.map_width,
            "height": style.map_height,
            "projection": {"type": "equalEarth", "scale": 800, "translate": [200, 1000]},
            "data": {
                "values": world.topology,
                "format": {"type": "topojson", "feature": "countries"},
            },
            "layer": [
                {
                    "name": "background",
                    "mark": {"type": "geoshape", "fill": style.map_background},
                },
                {
                    "name": "foreground",
                    "transform": [
                        {
                            "lookup": "id",
                            "from": {
                                "data": {"values": entries},
                                "key": "id",
                                "fields": ["name", "Number of Companies per Country", "fill"],
                            },
                        },
                        {"filter": "datum.fill != null"},
                    ],
                    "mark": {"type": "geoshape"},
                    "encoding": encoding,
                },
            ],
        }),
        style,
    )
}
