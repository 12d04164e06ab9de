//! load -> validate -> derive -> build -> render.
//!
//! Each stage is a function of the previous stage's output. The whole chain
//! re-runs for every change of `Controls`.

use anyhow::Result;
use serde_json::json;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::charts::choropleth::ChoroplethScale;
use crate::charts::dual_axis::{merge_by_year, MergedYear};
use crate::charts::slideshow::ReferenceValues;
use crate::config::{self, ReportConfig};
use crate::data::{self, build_manifest, Datasets, DatasetManifest, EnvironmentalImpactRecord};
use crate::filter::{filter_impacts, Controls, OpacityScale};
use crate::logging::{self, obj, v_str, Domain, ProfileScope};
use crate::render::{render_html, RenderOptions};
use crate::report::{self, Report};
use crate::style::Style;

/// Everything derived from the loaded tables and the current controls.
#[derive(Debug, Clone)]
pub struct DerivedView {
    pub controls: Controls,
    pub opacity: OpacityScale,
    pub impacts: Vec<EnvironmentalImpactRecord>,
    pub merged: Vec<MergedYear>,
    pub choropleth: ChoroplethScale,
    pub references: ReferenceValues,
}

#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub report: Report,
    pub manifests: Vec<DatasetManifest>,
    pub html: String,
}

/// Datasets the pipeline reads, with the columns each must provide.
pub fn dataset_inputs(cfg: &ReportConfig) -> Vec<(std::path::PathBuf, &'static [&'static str])> {
    vec![
        (cfg.dataset_path(config::FOOD_IMPACT_FILE), data::FOOD_IMPACT_COLUMNS),
        (cfg.dataset_path(config::CONSUMPTION_FILE), data::CONSUMPTION_COLUMNS),
        (cfg.dataset_path(config::IMPACT_FILE), data::IMPACT_COLUMNS),
        (cfg.dataset_path(config::PROTEIN_FILE), data::PROTEIN_COLUMNS),
        (cfg.dataset_path(config::FOUNDED_FILE), data::FOUNDED_COLUMNS),
        (cfg.dataset_path(config::COUNTRY_FILE), data::COUNTRY_COLUMNS),
        (cfg.country_codes_path(), data::COUNTRY_CODE_COLUMNS),
    ]
}

pub fn load(cfg: &ReportConfig) -> Result<(Datasets, Vec<DatasetManifest>)> {
    let _scope = ProfileScope::new("load");
    let datasets = Datasets::load(cfg)?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let manifests = dataset_inputs(cfg)
        .iter()
        .map(|(path, columns)| build_manifest(path, columns, now))
        .collect::<Result<Vec<_>>>()?;
    Ok((datasets, manifests))
}

pub fn validate(datasets: &Datasets) -> Result<()> {
    let _scope = ProfileScope::new("validate");
    data::validate(datasets)
}

pub fn derive(datasets: &Datasets, controls: &Controls, style: &Style) -> Result<DerivedView> {
    let _scope = ProfileScope::new("derive");
    let opacity = OpacityScale::from_filter(&controls.filter);
    let impacts = filter_impacts(&datasets.impacts, &controls.filter);
    logging::info(
        Domain::Filter,
        "filter_applied",
        obj(&[
            ("animal", json!(controls.filter.animal)),
            ("plant", json!(controls.filter.plant)),
            ("impact_types", json!(controls.filter.impact_types)),
            ("rows", json!(impacts.len())),
            ("opacity", json!(opacity)),
            ("slide", json!(controls.slide.get())),
        ]),
    );
    Ok(DerivedView {
        controls: controls.clone(),
        opacity,
        impacts,
        merged: merge_by_year(&datasets.consumption, &datasets.foundings),
        choropleth: ChoroplethScale::resolve(
            &datasets.country_codes,
            &datasets.country_companies,
            &datasets.world,
            style,
        ),
        references: ReferenceValues::from_records(&datasets.consumption)?,
    })
}

pub fn build(datasets: &Datasets, view: &DerivedView, style: &Style) -> Result<Report> {
    let _scope = ProfileScope::new("build");
    let report = report::build(datasets, view, style)?;
    logging::debug(
        Domain::Chart,
        "report_built",
        obj(&[
            ("sections", json!(report.sections.len())),
            ("charts", json!(report.artifacts().filter(|a| a.spec().is_some()).count())),
        ]),
    );
    Ok(report)
}

pub fn render(report: &Report, controls: &Controls, manifests: &[DatasetManifest], opts: &RenderOptions) -> String {
    let _scope = ProfileScope::new("render");
    render_html(report, controls, manifests, opts)
}

/// Run every stage; any load or validation failure aborts the whole report.
pub fn run(cfg: &ReportConfig, controls: &Controls, opts: &RenderOptions) -> Result<RenderedReport> {
    let result = run_stages(cfg, controls, opts, &Style::default());
    if let Err(err) = &result {
        logging::error(
            Domain::System,
            "pipeline_failed",
            obj(&[("msg", v_str(&format!("{:#}", err)))]),
        );
    }
    result
}

fn run_stages(cfg: &ReportConfig, controls: &Controls, opts: &RenderOptions, style: &Style) -> Result<RenderedReport> {
    let (datasets, manifests) = load(cfg)?;
    validate(&datasets)?;
    let view = derive(&datasets, controls, style)?;
    let report = build(&datasets, &view, style)?;
    let html = render(&report, controls, &manifests, opts);
    Ok(RenderedReport {
        report,
        manifests,
        html,
    })
}
