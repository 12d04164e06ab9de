use serde_json::json;

use super::{inline, Artifact, ChartSpec};
use crate::data::{EnvironmentalImpactRecord, ImpactType};
use crate::filter::OpacityScale;
use crate::style::Style;

pub const CHART_ID: &str = "impact-per-weight";
pub const NOT_ENOUGH_DATA: &str = "Not enough data to create chart.";

/// Number of distinct impact values, comparing floats exactly.
pub fn distinct_impact_values(records: &[EnvironmentalImpactRecord]) -> usize {
    let mut values: Vec<f64> = records.iter().map(|r| r.impact).collect();
    values.sort_by(f64::total_cmp);
    values.dedup();
    values.len()
}

/// Faceted bar chart, one row per product. Degenerate input (at most one
/// distinct impact value) yields a placeholder instead.
pub fn impact_facet(
    filtered: &[EnvironmentalImpactRecord],
    opacity: &OpacityScale,
    style: &Style,
) -> Artifact {
    if distinct_impact_values(filtered) <= 1 {
        return Artifact::Placeholder {
            text: NOT_ENOUGH_DATA.to_string(),
        };
    }

    let min = filtered.iter().map(|r| r.impact).fold(f64::INFINITY, f64::min);
    let max = filtered.iter().map(|r| r.impact).fold(f64::NEG_INFINITY, f64::max);

    let spec = ChartSpec::new(
        json!({
            "data": inline(filtered),
            "facet": {
                "row": {
                    "field": "Product",
                    "type": "nominal",
                    "title": null,
                    "header": {"labelAngle": 0, "labelAlign": "left"},
                },
            },
            "spacing": 5,
            "spec": {
                "mark": {"type": "bar", "cornerRadiusTopRight": 10, "cornerRadiusBottomRight": 10},
                "encoding": {
                    "x": {
                        "field": "Impact",
                        "type": "quantitative",
                        "scale": {"domain": [min, max]},
                        "axis": {"labelAngle": 0, "titleAnchor": "start", "title": "Median Impact per 1kg/ 1l"},
                    },
                    "y": {
                        "field": "Impact Type",
                        "type": "nominal",
                        "title": null,
                        "axis": {"labels": false, "titleAnchor": "end", "grid": false},
                    },
                    "opacity": {
                        "field": "Product Type",
                        "type": "nominal",
                        "scale": opacity.to_vega_scale(),
                        "legend": null,
                    },
                    "color": {
                        "field": "Impact Type",
                        "type": "nominal",
                        "scale": {
                            "domain": ImpactType::ALL.iter().map(|i| i.label()).collect::<Vec<_>>(),
                            "range": ImpactType::ALL.iter().map(|i| style.impact_color(*i)).collect::<Vec<_>>(),
                        },
                    },
                },
            },
        }),
        style,
    );
    Artifact::Chart {
        id: CHART_ID.to_string(),
        spec,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ProductType;

    fn rec(product: &str, t: ImpactType, impact: f64) -> EnvironmentalImpactRecord {
        EnvironmentalImpactRecord {
            product: product.into(),
            product_type: ProductType::Plant,
            impact_type: t,
            impact,
        }
    }

    #[test]
    fn distinct_counts_equal_values_once() {
        let rows = vec![
            rec("Peas", ImpactType::Emissions, 0.98),
            rec("Tofu", ImpactType::Emissions, 0.98),
            rec("Beef", ImpactType::Emissions, 99.48),
        ];
        assert_eq!(distinct_impact_values(&rows), 2);
        assert_eq!(distinct_impact_values(&[]), 0);
    }

    #[test]
    fn empty_input_is_a_placeholder() {
        let opacity = OpacityScale { animal: 1.0, plant: 1.0 };
        assert_eq!(
            impact_facet(&[], &opacity, &Style::default()),
            Artifact::Placeholder {
                text: NOT_ENOUGH_DATA.into()
            }
        );
    }

    #[test]
    fn x_domain_spans_filtered_values_and_opacity_is_bound() {
        let rows = vec![
            rec("Peas", ImpactType::LandUse, 3.4),
            rec("Beef", ImpactType::LandUse, 326.21),
        ];
        let opacity = OpacityScale { animal: 0.2, plant: 1.0 };
        let artifact = impact_facet(&rows, &opacity, &Style::default());
        let spec = artifact.spec().unwrap().as_value();
        let enc = &spec["spec"]["encoding"];
        assert_eq!(enc["x"]["scale"]["domain"], json!([3.4, 326.21]));
        assert_eq!(enc["opacity"]["scale"], opacity.to_vega_scale());
        assert_eq!(spec["facet"]["row"]["field"], "Product");
        assert_eq!(artifact.id(), Some(CHART_ID));
    }
}
