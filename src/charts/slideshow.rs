//! Meat-consumption slideshow.
//!
//! Every frame starts with the same base line (same data, mark type and
//! encoding) and only adds or swaps annotation layers:
//!
//! | frame | layers                                                        |
//! |-------|---------------------------------------------------------------|
//! | 1     | line                                                          |
//! | 2     | line, first-year point, max rule, max label                   |
//! | 3     | line, first point + max rule (muted), last point, min rule, labels |
//! | 4     | line, band between min and max, decline callout               |

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

use super::{inline, year_axis, ChartSpec};
use crate::data::ConsumptionRecord;
use crate::filter::SlideFrame;
use crate::style::Style;

pub const CHART_ID: &str = "meat-consumption";

pub const BASE_LINE: &str = "base-line";
pub const POINT_FIRST: &str = "point-first";
pub const POINT_LAST: &str = "point-last";
pub const RULE_MAX: &str = "rule-max";
pub const RULE_MIN: &str = "rule-min";
pub const LABEL_MAX: &str = "label-max";
pub const LABEL_MIN: &str = "label-min";
pub const BAND: &str = "band";
pub const CALLOUT: &str = "callout";

/// Reference values taken at the latest year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceValues {
    pub first_year: NaiveDate,
    pub last_year: NaiveDate,
    /// Consumption per person in the latest year.
    pub latest: f64,
    pub max: f64,
    pub min: f64,
}

impl ReferenceValues {
    pub fn from_records(records: &[ConsumptionRecord]) -> Result<Self> {
        let first = records
            .iter()
            .min_by_key(|r| r.year)
            .ok_or_else(|| anyhow!("consumption series is empty"))?;
        let last = records
            .iter()
            .max_by_key(|r| r.year)
            .ok_or_else(|| anyhow!("consumption series is empty"))?;
        Ok(Self {
            first_year: first.year,
            last_year: last.year,
            latest: last.consumption_per_person,
            max: last.max_consumption,
            min: last.min_consumption,
        })
    }

    pub fn decline(&self) -> f64 {
        self.max - self.min
    }

    pub fn callout_text(&self) -> String {
        format!("- {:.2} kg", self.decline())
    }
}

/// Build the layer set of one slideshow frame.
pub fn meat_consumption_frame(
    records: &[ConsumptionRecord],
    frame: SlideFrame,
    style: &Style,
) -> Result<ChartSpec> {
    let refs = ReferenceValues::from_records(records)?;
    let line_color = if frame == SlideFrame::FIRST {
        style.highlight
    } else {
        style.dark_grey
    };

    let mut layers = vec![base_line(records, line_color, style)];
    match frame.get() {
        1 => {}
        2 => {
            layers.push(point(records, POINT_FIRST, refs.first_year, style.highlight, style));
            layers.push(rule(records, RULE_MAX, "MaxConsumption", style.highlight, style));
            layers.push(label(&refs, LABEL_MAX, "MaxConsumption", refs.max, style));
        }
        3 => {
            layers.push(point(records, POINT_FIRST, refs.first_year, style.dark_grey, style));
            layers.push(rule(records, RULE_MAX, "MaxConsumption", style.dark_grey, style));
            layers.push(point(records, POINT_LAST, refs.last_year, style.highlight, style));
            layers.push(rule(records, RULE_MIN, "MinConsumption", style.highlight, style));
            layers.push(label(&refs, LABEL_MAX, "MaxConsumption", refs.max, style));
            layers.push(label(&refs, LABEL_MIN, "MinConsumption", refs.min, style));
        }
        _ => {
            layers.push(band(records, style));
            layers.push(callout(&refs, style));
        }
    }

    Ok(ChartSpec::new(
        json!({
            "width": style.line_width,
            "height": style.line_height,
            "layer": layers,
        }),
        style,
    ))
}

fn y_scale(style: &Style) -> Value {
    json!({"domain": style.consumption_domain})
}

/// The line every frame is built on. Only its colour varies between frames.
fn base_line(records: &[ConsumptionRecord], color: &str, style: &Style) -> Value {
    json!({
        "name": BASE_LINE,
        "data": inline(records),
        "mark": {"type": "line", "color": color},
        "encoding": {
            "x": {"field": "Year", "type": "temporal", "axis": year_axis()},
            "y": {
                "field": "Consumption per Person",
                "type": "quantitative",
                "scale": y_scale(style),
                "axis": {
                    "title": "Consumption per Person in kg",
                    "titleColor": "grey",
                    "titleAnchor": "end",
                    "grid": false,
                    "tickColor": "grey",
                },
            },
            "strokeWidth": {"value": 2},
        },
    })
}

fn point(records: &[ConsumptionRecord], name: &str, year: NaiveDate, color: &str, style: &Style) -> Value {
    let rows: Vec<&ConsumptionRecord> = records.iter().filter(|r| r.year == year).collect();
    json!({
        "name": name,
        "data": inline(&rows),
        "mark": {"type": "circle", "opacity": 1, "size": 200},
        "encoding": {
            "x": {"field": "Year", "type": "temporal"},
            "y": {"field": "Consumption per Person", "type": "quantitative", "scale": y_scale(style)},
            "color": {"value": color},
        },
    })
}

fn rule(records: &[ConsumptionRecord], name: &str, field: &str, color: &str, style: &Style) -> Value {
    json!({
        "name": name,
        "data": inline(records),
        "mark": {"type": "rule", "strokeDash": [12, 6], "size": 1},
        "encoding": {
            "y": {"field": field, "type": "quantitative", "scale": y_scale(style)},
            "color": {"value": color},
        },
    })
}

fn label(refs: &ReferenceValues, name: &str, field: &str, value: f64, style: &Style) -> Value {
    json!({
        "name": name,
        "data": {"values": [{"Year": refs.last_year, field: value, "text": format!("{} kg", value)}]},
        "mark": {"type": "text", "align": "left", "dx": -70, "dy": 18, "size": 20},
        "encoding": {
            "x": {"field": "Year", "type": "temporal"},
            "y": {"field": field, "type": "quantitative", "scale": y_scale(style)},
            "color": {"value": style.highlight},
            "text": {"field": "text", "type": "nominal"},
        },
    })
}

fn band(records: &[ConsumptionRecord], style: &Style) -> Value {
    json!({
        "name": BAND,
        "data": inline(records),
        "mark": {"type": "area", "opacity": 0.2, "color": style.highlight},
        "encoding": {
            "x": {"field": "Year", "type": "temporal"},
            "y": {"field": "MinConsumption", "type": "quantitative", "scale": y_scale(style)},
            "y2": {"field": "MaxConsumption"},
        },
    })
}

fn callout(refs: &ReferenceValues, style: &Style) -> Value {
    json!({
        "name": CALLOUT,
        "data": {"values": [{"Year": refs.last_year, "MinConsumption": refs.min, "text": refs.callout_text()}]},
        "mark": {"type": "text", "align": "left", "dx": -115, "dy": -35, "size": 30},
        "encoding": {
            "x": {"field": "Year", "type": "temporal"},
            "y": {"field": "MinConsumption", "type": "quantitative", "scale": y_scale(style)},
            "color": {"value": style.highlight},
            "text": {"field": "text", "type": "nominal"},
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year(y: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, 1, 1).unwrap()
    }

    fn records() -> Vec<ConsumptionRecord> {
        [(2011, 64.13), (2016, 61.3), (2021, 56.79)]
            .iter()
            .map(|(y, v)| ConsumptionRecord {
                year: year(*y),
                consumption_per_person: *v,
                max_consumption: 64.13,
                min_consumption: 56.79,
            })
            .collect()
    }

    fn frame(n: u8) -> ChartSpec {
        meat_consumption_frame(&records(), SlideFrame::new(n).unwrap(), &Style::default()).unwrap()
    }

    #[test]
    fn layer_sets_per_frame() {
        assert_eq!(frame(1).layer_names(), vec![BASE_LINE]);
        assert_eq!(frame(2).layer_names(), vec![BASE_LINE, POINT_FIRST, RULE_MAX, LABEL_MAX]);
        assert_eq!(
            frame(3).layer_names(),
            vec![BASE_LINE, POINT_FIRST, RULE_MAX, POINT_LAST, RULE_MIN, LABEL_MAX, LABEL_MIN]
        );
        assert_eq!(frame(4).layer_names(), vec![BASE_LINE, BAND, CALLOUT]);
    }

    #[test]
    fn frame_two_highlights_first_point_frame_three_mutes_it() {
        let style = Style::default();
        let f2 = frame(2);
        let f3 = frame(3);
        assert_eq!(f2.layer(POINT_FIRST).unwrap()["encoding"]["color"]["value"], style.highlight);
        assert_eq!(f3.layer(POINT_FIRST).unwrap()["encoding"]["color"]["value"], style.dark_grey);
        assert_eq!(f3.layer(POINT_LAST).unwrap()["encoding"]["color"]["value"], style.highlight);
        assert_eq!(f3.layer(POINT_LAST).unwrap()["data"]["values"][0]["Year"], "2021-01-01");
    }

    #[test]
    fn labels_and_callout_text() {
        let f3 = frame(3);
        assert_eq!(f3.layer(LABEL_MAX).unwrap()["data"]["values"][0]["text"], "64.13 kg");
        assert_eq!(f3.layer(LABEL_MIN).unwrap()["data"]["values"][0]["text"], "56.79 kg");
        assert_eq!(frame(4).layer(CALLOUT).unwrap()["data"]["values"][0]["text"], "- 7.34 kg");
    }

    #[test]
    fn empty_series_is_an_error() {
        assert!(meat_consumption_frame(&[], SlideFrame::FIRST, &Style::default()).is_err());
    }
}
