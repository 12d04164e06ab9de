use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Value};
use std::path::Path;

use super::records::{self, *};
use super::CsvTable;
use crate::config::{self, ReportConfig};
use crate::logging::{self, obj, v_str, Domain};

/// World boundaries as TopoJSON plus the numeric ids of its country geometries.
#[derive(Debug, Clone)]
pub struct WorldGeometry {
    pub topology: Value,
    pub country_ids: Vec<u16>,
}

impl WorldGeometry {
    pub fn from_json(source: &str, text: &str) -> Result<Self> {
        let topology: Value =
            serde_json::from_str(text).with_context(|| format!("{}: not valid json", source))?;
        Self::from_value(source, topology)
    }

    pub fn from_value(source: &str, topology: Value) -> Result<Self> {
        let geometries = topology
            .pointer("/objects/countries/geometries")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("{}: no objects.countries.geometries", source))?;
        // Disputed areas carry no numeric id; they stay background-only.
        let country_ids = geometries
            .iter()
            .filter_map(|g| match g.get("id") {
                Some(Value::Number(n)) => n.as_u64().and_then(|v| u16::try_from(v).ok()),
                Some(Value::String(s)) => s.trim().parse().ok(),
                _ => None,
            })
            .collect();
        Ok(Self {
            topology,
            country_ids,
        })
    }

    /// Minimal topology with one arc-less geometry per id, for tests and fixtures.
    pub fn from_ids(ids: &[u16]) -> Self {
        let geometries: Vec<Value> = ids
            .iter()
            .map(|id| json!({"type": "Polygon", "id": id, "arcs": []}))
            .collect();
        Self {
            topology: json!({
                "type": "Topology",
                "objects": {"countries": {"type": "GeometryCollection", "geometries": geometries}},
                "arcs": [],
            }),
            country_ids: ids.to_vec(),
        }
    }
}

/// Every input table, immutable after load.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub food_impacts: Vec<FoodImpactRecord>,
    pub consumption: Vec<ConsumptionRecord>,
    pub impacts: Vec<EnvironmentalImpactRecord>,
    pub protein_impacts: Vec<ProteinImpactRecord>,
    pub foundings: Vec<CompanyFoundingRecord>,
    pub country_companies: Vec<CountryCompanyRecord>,
    pub country_codes: Vec<CountryCode>,
    pub world: WorldGeometry,
}

impl Datasets {
    pub fn load(cfg: &ReportConfig) -> Result<Self> {
        let datasets = Self {
            food_impacts: records::food_impacts(&read(cfg, config::FOOD_IMPACT_FILE)?)?,
            consumption: records::consumption(&read(cfg, config::CONSUMPTION_FILE)?)?,
            impacts: records::environmental_impacts(&read(cfg, config::IMPACT_FILE)?)?,
            protein_impacts: records::protein_impacts(&read(cfg, config::PROTEIN_FILE)?)?,
            foundings: records::company_foundings(&read(cfg, config::FOUNDED_FILE)?)?,
            country_companies: records::country_companies(&read(cfg, config::COUNTRY_FILE)?)?,
            country_codes: records::country_codes(&CsvTable::read(&cfg.country_codes_path())?)?,
            world: load_world(&cfg.world_geometry_path())?,
        };
        logging::info(
            Domain::Data,
            "datasets_loaded",
            obj(&[
                ("data_dir", v_str(&cfg.data_dir.display().to_string())),
                ("impacts", json!(datasets.impacts.len())),
                ("consumption_years", json!(datasets.consumption.len())),
                ("country_codes", json!(datasets.country_codes.len())),
                ("geometries", json!(datasets.world.country_ids.len())),
            ]),
        );
        Ok(datasets)
    }
}

fn read(cfg: &ReportConfig, file: &str) -> Result<CsvTable> {
    CsvTable::read(&cfg.dataset_path(file))
}

fn load_world(path: &Path) -> Result<WorldGeometry> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read world geometry {}", path.display()))?;
    WorldGeometry::from_json(&path.display().to_string(), &text)
}

/// Semantic checks run after parsing; any failure aborts the report.
pub fn validate(d: &Datasets) -> Result<()> {
    let tables = [
        ("food impact", d.food_impacts.len()),
        ("consumption", d.consumption.len()),
        ("environmental impact", d.impacts.len()),
        ("protein impact", d.protein_impacts.len()),
        ("companies founded", d.foundings.len()),
        ("companies per country", d.country_companies.len()),
        ("country codes", d.country_codes.len()),
    ];
    for (name, len) in tables {
        if len == 0 {
            bail!("{} table is empty", name);
        }
    }

    for r in &d.food_impacts {
        if !r.emissions.is_finite() {
            bail!("food impact {:?}: emissions {} not finite", r.category, r.emissions);
        }
        if !(0.0..=100.0).contains(&r.percent) {
            bail!("food impact {:?}: percent {} outside 0..=100", r.category, r.percent);
        }
    }
    for r in &d.consumption {
        let finite = [r.consumption_per_person, r.min_consumption, r.max_consumption]
            .iter()
            .all(|v| v.is_finite());
        if !finite || r.consumption_per_person < 0.0 || r.min_consumption > r.max_consumption {
            bail!(
                "consumption {}: value {} / reference {}..{} invalid",
                r.year,
                r.consumption_per_person,
                r.min_consumption,
                r.max_consumption
            );
        }
    }
    for r in &d.impacts {
        if !r.impact.is_finite() || r.impact < 0.0 {
            bail!("impact {:?} {}: value {} is negative or not finite", r.product, r.impact_type, r.impact);
        }
    }
    for r in &d.protein_impacts {
        if ![r.pctl_5th, r.median, r.pctl_95th].iter().all(|v| v.is_finite()) {
            bail!(
                "protein impact {:?}: percentiles {} / {} / {} not finite",
                r.product,
                r.pctl_5th,
                r.median,
                r.pctl_95th
            );
        }
        if !(r.pctl_5th <= r.median && r.median <= r.pctl_95th) {
            bail!(
                "protein impact {:?}: expected 5th <= median <= 95th, got {} / {} / {}",
                r.product,
                r.pctl_5th,
                r.median,
                r.pctl_95th
            );
        }
    }
    if d.world.country_ids.is_empty() {
        bail!("world geometry has no country ids");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_ids_accept_numbers_and_padded_strings() {
        let topo = json!({
            "objects": {"countries": {"geometries": [
                {"id": 276}, {"id": "004"}, {"id": "-99"}, {"type": "Polygon"}
            ]}}
        });
        let world = WorldGeometry::from_value("w", topo).unwrap();
        assert_eq!(world.country_ids, vec![276, 4]);
    }

    #[test]
    fn world_without_countries_object_is_rejected() {
        assert!(WorldGeometry::from_json("w", r#"{"objects": {}}"#).is_err());
        assert!(WorldGeometry::from_json("w", "not json").is_err());
    }

    #[test]
    fn from_ids_round_trips_through_parser() {
        let world = WorldGeometry::from_ids(&[4, 8, 276]);
        let reparsed = WorldGeometry::from_value("w", world.topology.clone()).unwrap();
        assert_eq!(reparsed.country_ids, vec![4, 8, 276]);
    }
}
