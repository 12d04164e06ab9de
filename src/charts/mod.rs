//! Vega-Lite chart builders, one per report chart.
//!
//! Builders are pure: the same records, scales and style always produce the
//! same JSON. Data is embedded inline so a rendered report works offline.

pub mod choropleth;
pub mod dual_axis;
pub mod impact;
pub mod nutrition;
pub mod pie;
pub mod slideshow;

use serde::Serialize;
use serde_json::{json, Value};

use crate::filter::SlideFrame;
use crate::style::Style;

pub const VEGA_LITE_SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// A complete Vega-Lite document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChartSpec(Value);

impl ChartSpec {
    /// Wrap a chart body, adding the schema and the shared `config` block.
    pub fn new(mut body: Value, style: &Style) -> Self {
        if let Value::Object(map) = &mut body {
            map.insert("$schema".to_string(), json!(VEGA_LITE_SCHEMA));
            map.insert("config".to_string(), config_block(style));
        }
        ChartSpec(body)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn layers(&self) -> &[Value] {
        self.0
            .get("layer")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn layer(&self, name: &str) -> Option<&Value> {
        self.layers().iter().find(|l| l["name"] == name)
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers().iter().filter_map(|l| l["name"].as_str()).collect()
    }
}

/// What a report section shows below its text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    Chart { id: String, spec: ChartSpec },
    Slideshow { id: String, frame: SlideFrame, spec: ChartSpec },
    /// Static notice shown instead of a chart that cannot be drawn.
    Placeholder { text: String },
}

impl Artifact {
    pub fn spec(&self) -> Option<&ChartSpec> {
        match self {
            Artifact::Chart { spec, .. } | Artifact::Slideshow { spec, .. } => Some(spec),
            Artifact::Placeholder { .. } => None,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Artifact::Chart { id, .. } | Artifact::Slideshow { id, .. } => Some(id.as_str()),
            Artifact::Placeholder { .. } => None,
        }
    }
}

fn config_block(style: &Style) -> Value {
    json!({
        "view": {"strokeWidth": 0},
        "title": {
            "fontSize": style.title_font_size,
            "font": style.font,
            "anchor": "start",
            "fontWeight": "normal",
            "color": "grey",
        },
        "axis": {
            "labelFont": style.font,
            "titleFont": style.font,
            "labelFontSize": style.axis_font_size,
            "titleFontSize": style.axis_font_size,
            "titleFontWeight": "normal",
            "titleColor": "grey",
        },
    })
}

/// Year axis shared by the time-series charts.
pub(crate) fn year_axis() -> Value {
    json!({
        "title": "Year",
        "titleColor": "grey",
        "titleAnchor": "start",
        "labelAngle": 0,
        "grid": false,
        "tickColor": "grey",
        "format": "%Y",
    })
}

pub(crate) fn inline<T: Serialize>(rows: &[T]) -> Value {
    json!({ "values": rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_adds_schema_and_config() {
        let spec = ChartSpec::new(json!({"mark": "bar"}), &Style::default());
        assert_eq!(spec.as_value()["$schema"], VEGA_LITE_SCHEMA);
        assert_eq!(spec.as_value()["config"]["view"]["strokeWidth"], 0);
        assert!(spec.layers().is_empty());
    }

    #[test]
    fn layer_lookup_by_name() {
        let spec = ChartSpec::new(
            json!({"layer": [{"name": "a", "mark": "line"}, {"name": "b", "mark": "rule"}]}),
            &Style::default(),
        );
        assert_eq!(spec.layer_names(), vec!["a", "b"]);
        assert_eq!(spec.layer("b").unwrap()["mark"], "rule");
        assert!(spec.layer("c").is_none());
    }
}
