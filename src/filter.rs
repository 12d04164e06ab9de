//! Filter state, the derived opacity scale and the impact-table filter.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;

use crate::data::{EnvironmentalImpactRecord, ImpactType, ProductType};
use crate::logging::{self, obj, v_str, Domain};

/// Opacity of a de-emphasised product type.
pub const MUTED_OPACITY: f64 = 0.2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub animal: bool,
    pub plant: bool,
    pub impact_types: BTreeSet<ImpactType>,
}

impl FilterState {
    pub fn new(animal: bool, plant: bool, impact_types: impl IntoIterator<Item = ImpactType>) -> Self {
        Self {
            animal,
            plant,
            impact_types: impact_types.into_iter().collect(),
        }
    }
}

/// Opacity per product type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OpacityScale {
    pub animal: f64,
    pub plant: f64,
}

impl OpacityScale {
    /// Selecting both and selecting neither both mean "no emphasis".
    pub fn from_filter(filter: &FilterState) -> Self {
        match (filter.animal, filter.plant) {
            (true, false) => Self {
                animal: 1.0,
                plant: MUTED_OPACITY,
            },
            (false, true) => Self {
                animal: MUTED_OPACITY,
                plant: 1.0,
            },
            _ => Self {
                animal: 1.0,
                plant: 1.0,
            },
        }
    }

    pub fn get(&self, product_type: ProductType) -> f64 {
        match product_type {
            ProductType::Animal => self.animal,
            ProductType::Plant => self.plant,
        }
    }

    /// Vega-Lite ordinal scale over the product-type domain.
    pub fn to_vega_scale(&self) -> Value {
        json!({
            "domain": ProductType::ALL.iter().map(|p| p.label()).collect::<Vec<_>>(),
            "range": ProductType::ALL.iter().map(|p| self.get(*p)).collect::<Vec<_>>(),
        })
    }
}

/// Rows whose impact type is selected; an empty selection keeps every row.
pub fn filter_impacts(
    records: &[EnvironmentalImpactRecord],
    filter: &FilterState,
) -> Vec<EnvironmentalImpactRecord> {
    if filter.impact_types.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| filter.impact_types.contains(&r.impact_type))
        .cloned()
        .collect()
}

/// Step of the meat-consumption slideshow, always within 1..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SlideFrame(u8);

impl SlideFrame {
    pub const FIRST: SlideFrame = SlideFrame(1);
    pub const LAST: SlideFrame = SlideFrame(4);

    pub fn new(n: u8) -> Option<Self> {
        (Self::FIRST.0..=Self::LAST.0).contains(&n).then_some(SlideFrame(n))
    }

    pub fn clamped(n: i64) -> Self {
        SlideFrame(n.clamp(Self::FIRST.0 as i64, Self::LAST.0 as i64) as u8)
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = SlideFrame> {
        (Self::FIRST.0..=Self::LAST.0).map(SlideFrame)
    }
}

impl Default for SlideFrame {
    fn default() -> Self {
        Self::FIRST
    }
}

/// Everything the user can change between two render passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Controls {
    pub filter: FilterState,
    pub slide: SlideFrame,
}

impl Controls {
    /// Parse `animal=1&plant=on&impact=Land+Use&impact=Emissions&slide=3`.
    pub fn from_query(query: &str) -> Self {
        let mut controls = Controls::default();
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "animal" => controls.filter.animal = truthy(&value),
                "plant" => controls.filter.plant = truthy(&value),
                "impact" => controls.add_impact(&value),
                "slide" => {
                    controls.slide = value
                        .trim()
                        .parse::<i64>()
                        .map(SlideFrame::clamped)
                        .unwrap_or_default()
                }
                _ => {}
            }
        }
        controls
    }

    /// Parse command-line flags: `--animal --plant --impact "Land Use" --slide 2`.
    pub fn from_args<I, S>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut controls = Controls::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_ref() {
                "--animal" => controls.filter.animal = true,
                "--plant" => controls.filter.plant = true,
                "--impact" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("--impact needs a value"))?;
                    for part in value.as_ref().split(',') {
                        controls.filter.impact_types.insert(part.parse()?);
                    }
                }
                "--slide" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("--slide needs a value"))?;
                    let n: u8 = value.as_ref().parse()?;
                    controls.slide = SlideFrame::new(n)
                        .ok_or_else(|| anyhow::anyhow!("--slide must be within 1..=4, got {}", n))?;
                }
                other => anyhow::bail!("unknown argument {:?}", other),
            }
        }
        Ok(controls)
    }

    /// Inverse of `from_query`, used for links between slides.
    pub fn to_query(&self) -> String {
        let mut out = url::form_urlencoded::Serializer::new(String::new());
        if self.filter.animal {
            out.append_pair("animal", "1");
        }
        if self.filter.plant {
            out.append_pair("plant", "1");
        }
        for impact in &self.filter.impact_types {
            out.append_pair("impact", impact.label());
        }
        out.append_pair("slide", &self.slide.get().to_string());
        out.finish()
    }

    fn add_impact(&mut self, value: &str) {
        match value.parse::<ImpactType>() {
            Ok(impact) => {
                self.filter.impact_types.insert(impact);
            }
            Err(err) => logging::warn(
                Domain::Filter,
                "unknown_impact_type",
                obj(&[("msg", v_str("ignored")), ("value", v_str(value)), ("error", v_str(&err.to_string()))]),
            ),
        }
    }
}

fn truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "on" | "true" | "yes")
}
