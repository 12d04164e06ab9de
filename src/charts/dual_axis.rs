use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;

use super::{inline, year_axis, ChartSpec};
use crate::data::{CompanyFoundingRecord, ConsumptionRecord};
use crate::logging::{self, obj, Domain};
use crate::style::Style;

pub const CHART_ID: &str = "consumption-vs-foundings";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedYear {
    #[serde(rename = "Year")]
    pub year: NaiveDate,
    #[serde(rename = "Consumption per Person")]
    pub consumption_per_person: f64,
    #[serde(rename = "Number of Companies Founded")]
    pub companies_founded: u32,
}

/// Inner join on year, in consumption order. Years missing from either side are dropped.
pub fn merge_by_year(consumption: &[ConsumptionRecord], foundings: &[CompanyFoundingRecord]) -> Vec<MergedYear> {
    let merged: Vec<MergedYear> = consumption
        .iter()
        .flat_map(|c| {
            foundings
                .iter()
                .filter(move |f| f.year == c.year)
                .map(move |f| MergedYear {
                    year: c.year,
                    consumption_per_person: c.consumption_per_person,
                    companies_founded: f.count,
                })
        })
        .collect();
    logging::debug(
        Domain::Chart,
        "merge_by_year",
        obj(&[
            ("consumption_years", json!(consumption.len())),
            ("founding_years", json!(foundings.len())),
            ("merged", json!(merged.len())),
        ]),
    );
    merged
}

/// Two lines on a shared time axis with independent y scales.
pub fn consumption_vs_foundings(merged: &[MergedYear], style: &Style) -> ChartSpec {
    let founded = json!({
        "name": "founded",
        "mark": {"type": "line", "stroke": style.dark_red},
        "encoding": {
            "x": {"field": "Year", "type": "temporal", "axis": year_axis()},
            "y": {
                "field": "Number of Companies Founded",
                "type": "quantitative",
                "axis": {
                    "title": "Number of Companies Founded",
                    "titleColor": style.dark_red,
                    "grid": false,
                    "titleAnchor": "end",
                },
            },
            "strokeWidth": {"value": 2},
        },
    });
    let consumption = json!({
        "name": "consumption",
        "mark": {"type": "line", "stroke": style.highlight},
        "encoding": {
            "x": {"field": "Year", "type": "temporal", "axis": year_axis()},
            "y": {
                "field": "Consumption per Person",
                "type": "quantitative",
                "scale": {"domain": style.consumption_domain},
                "axis": {
                    "title": "Consumption of Meat per Person in Germany (kg)",
                    "titleColor": style.highlight,
                    "grid": false,
                    "titleAnchor": "end",
                    "titleAngle": 270,
                    "titleX": 50,
                },
            },
            "strokeWidth": {"value": 2},
        },
    });

    ChartSpec::new(
        json!({
            "width": style.line_width,
            "height": style.line_height,
            "data": inline(merged),
            "layer": [founded, consumption],
            "resolve": {"scale": {"y": "independent"}},
        }),
        style,
    )
}
