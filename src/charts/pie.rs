use serde_json::json;

use super::{inline, ChartSpec};
use crate::data::FoodImpactRecord;
use crate::style::Style;

pub const ARC_RADIUS: u32 = 120;
pub const LABEL_RADIUS: u32 = 160;

/// Share of global emissions caused by food: an arc layer with category labels on top.
pub fn food_impact_pie(records: &[FoodImpactRecord], style: &Style) -> ChartSpec {
    let mut categories: Vec<&str> = records.iter().map(|r| r.category.as_str()).collect();
    categories.sort_unstable();
    categories.dedup();

    let encoding = json!({
        "theta": {"field": "Percent", "type": "quantitative", "stack": true},
        "color": {
            "field": "Category",
            "type": "nominal",
            "scale": {"domain": categories, "range": style.category_colors(categories.len())},
            "legend": null,
        },
        "tooltip": [
            {"field": "Category", "type": "nominal"},
            {"field": "Emissions", "type": "quantitative"},
        ],
    });
    let mut label_encoding = encoding.clone();
    label_encoding["text"] = json!({"field": "Category", "type": "nominal"});

    ChartSpec::new(
        json!({
            "data": inline(records),
            "layer": [
                {
                    "name": "arc",
                    "mark": {"type": "arc", "outerRadius": ARC_RADIUS},
                    "encoding": encoding,
                },
                {
                    "name": "label",
                    "mark": {"type": "text", "radius": LABEL_RADIUS, "size": 16},
                    "encoding": label_encoding,
                },
            ],
        }),
        style,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<FoodImpactRecord> {
        vec![
            FoodImpactRecord {
                category: "Non-Food".into(),
                percent: 74.0,
                emissions: 38.9,
            },
            FoodImpactRecord {
                category: "Food".into(),
                percent: 26.0,
                emissions: 13.7,
            },
        ]
    }

    #[test]
    fn arc_drawn_before_labels_at_larger_radius() {
        let spec = food_impact_pie(&records(), &Style::default());
        assert_eq!(spec.layer_names(), vec!["arc", "label"]);
        let arc = &spec.layers()[0];
        let label = &spec.layers()[1];
        assert_eq!(arc["mark"]["type"], "arc");
        assert_eq!(label["mark"]["type"], "text");
        assert!(label["mark"]["radius"].as_u64() > arc["mark"]["outerRadius"].as_u64());
        // Both layers read the chart-level data.
        assert!(arc.get("data").is_none() && label.get("data").is_none());
        assert_eq!(spec.as_value()["data"]["values"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn theta_is_stacked_and_first_category_highlighted() {
        let style = Style::default();
        let spec = food_impact_pie(&records(), &style);
        let enc = &spec.layers()[0]["encoding"];
        assert_eq!(enc["theta"]["stack"], true);
        assert_eq!(enc["color"]["scale"]["domain"], json!(["Food", "Non-Food"]));
        assert_eq!(enc["color"]["scale"]["range"], json!([style.highlight, style.dark_grey]));
    }
}
