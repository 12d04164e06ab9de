use serde_json::{json, Value};

use super::{inline, ChartSpec};
use crate::data::{ProductType, ProteinImpactRecord};
use crate::filter::OpacityScale;
use crate::style::Style;

/// Emissions per 100 g protein: a 5th–95th percentile range bar per product
/// with a hollow marker at the median. Both layers share the opacity scale of
/// the per-weight chart.
pub fn protein_range(records: &[ProteinImpactRecord], opacity: &OpacityScale, style: &Style) -> ChartSpec {
    let opacity_encoding = json!({
        "field": "Product Type",
        "type": "nominal",
        "scale": opacity.to_vega_scale(),
        "legend": null,
    });

    let range_bar = json!({
        "name": "range",
        "mark": {"type": "bar", "cornerRadius": 10, "height": 20},
        "encoding": {
            "x": {
                "field": "5th pctl",
                "type": "quantitative",
                "scale": {"domain": style.protein_domain},
                "title": "GHG Emissions (kg CO2eq)",
            },
            "x2": {"field": "95th pctl"},
            "y": {
                "field": "Product",
                "type": "nominal",
                "axis": {"title": "Per 100g protein...", "titleAngle": 0, "titleY": -5},
            },
            "color": {
                "field": "Product Type",
                "type": "nominal",
                "scale": product_color_scale(style),
            },
            "opacity": opacity_encoding,
        },
    });

    let median = json!({
        "name": "median",
        "mark": {"type": "point", "filled": false, "color": "black", "size": 200},
        "encoding": {
            "x": {"field": "Median", "type": "quantitative"},
            "y": {"field": "Product", "type": "nominal"},
            "opacity": opacity_encoding,
            "tooltip": [
                {"field": "Median", "type": "quantitative"},
                {"field": "Product", "type": "nominal"},
            ],
        },
    });

    ChartSpec::new(
        json!({
            "width": style.nutrition_width,
            "height": style.nutrition_height,
            "data": inline(records),
            "layer": [range_bar, median],
        }),
        style,
    )
}

fn product_color_scale(style: &Style) -> Value {
    json!({
        "domain": ProductType::ALL.iter().map(|p| p.label()).collect::<Vec<_>>(),
        "range": ProductType::ALL.iter().map(|p| style.product_color(*p)).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<ProteinImpactRecord> {
        vec![ProteinImpactRecord {
            product: "Beef (beef herd)".into(),
            product_type: ProductType::Animal,
            pctl_5th: 20.0,
            pctl_95th: 105.0,
            median: 49.89,
        }]
    }

    #[test]
    fn range_then_median_with_shared_opacity() {
        let opacity = OpacityScale { animal: 1.0, plant: 0.2 };
        let spec = protein_range(&records(), &opacity, &Style::default());
        assert_eq!(spec.layer_names(), vec!["range", "median"]);
        let range = spec.layer("range").unwrap();
        let median = spec.layer("median").unwrap();
        assert_eq!(range["encoding"]["opacity"], median["encoding"]["opacity"]);
        assert_eq!(range["encoding"]["opacity"]["scale"], opacity.to_vega_scale());
        assert_eq!(range["encoding"]["x"]["field"], "5th pctl");
        assert_eq!(range["encoding"]["x2"]["field"], "95th pctl");
        assert_eq!(median["mark"]["filled"], false);
        assert_eq!(median["encoding"]["x"]["field"], "Median");
    }

    #[test]
    fn colours_follow_product_type() {
        let style = Style::default();
        let spec = protein_range(&records(), &OpacityScale { animal: 1.0, plant: 1.0 }, &style);
        let scale = &spec.layer("range").unwrap()["encoding"]["color"]["scale"];
        assert_eq!(scale["range"], json!([style.dark_red, style.sage_green]));
        assert_eq!(scale["domain"], json!(["Animal", "Plant"]));
    }
}
