//! End-to-end: every pipeline stage on a complete fixture directory, plus the
//! shipped datasets when their reference cache is present.

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use urban_butcher::charts::{choropleth, dual_axis, slideshow, Artifact};
use urban_butcher::config::{self, ReportConfig};
use urban_butcher::data::WorldGeometry;
use urban_butcher::filter::{Controls, SlideFrame};
use urban_butcher::pipeline;
use urban_butcher::render::RenderOptions;

const SHIPPED_FILES: &[&str] = &[
    config::FOOD_IMPACT_FILE,
    config::CONSUMPTION_FILE,
    config::IMPACT_FILE,
    config::PROTEIN_FILE,
    config::FOUNDED_FILE,
    config::COUNTRY_FILE,
];

/// Copy the shipped datasets and write a small reference cache next to them.
fn fixture() -> (TempDir, ReportConfig) {
    let dir = TempDir::new().unwrap();
    for file in SHIPPED_FILES {
        fs::copy(Path::new("data").join(file), dir.path().join(file)).unwrap();
    }
    let cfg = ReportConfig::for_data_dir(dir.path());
    fs::create_dir_all(&cfg.cache_dir).unwrap();
    fs::write(
        cfg.country_codes_path(),
        "name,alpha-2,alpha-3,country-code\n\
         Germany,DE,DEU,276\n\
         France,FR,FRA,250\n\
         \"United Kingdom of Great Britain and Northern Ireland\",GB,GBR,826\n\
         Norway,NO,NOR,578\n",
    )
    .unwrap();
    fs::write(
        cfg.world_geometry_path(),
        WorldGeometry::from_ids(&[276, 250, 826, 578]).topology.to_string(),
    )
    .unwrap();
    (dir, cfg)
}

#[test]
fn default_controls_render_every_section() {
    let (_dir, cfg) = fixture();
    let rendered = pipeline::run(&cfg, &Controls::default(), &RenderOptions::default()).unwrap();

    let ids: Vec<&str> = rendered.report.artifacts().filter_map(Artifact::id).collect();
    assert_eq!(
        ids,
        vec![
            "food-share",
            "impact-per-weight",
            "impact-per-protein",
            slideshow::CHART_ID,
            choropleth::CHART_ID,
            dual_axis::CHART_ID,
        ]
    );
    for id in &ids {
        assert!(rendered.html.contains(&format!("id=\"{}\"", id)), "missing mount for {}", id);
    }
    assert!(rendered.html.contains("vega-embed"));
    assert_eq!(rendered.manifests.len(), 7);
    assert!(rendered.manifests.iter().all(|m| m.bad_rows == 0));
}

#[test]
fn controls_flow_into_charts() {
    let (_dir, cfg) = fixture();
    let controls = Controls::from_query("plant=1&impact=Emissions&slide=4");
    let rendered = pipeline::run(&cfg, &controls, &RenderOptions::interactive("/")).unwrap();

    let facet = rendered.report.chart("impact-per-weight").unwrap();
    let rows = facet.as_value()["data"]["values"].as_array().unwrap();
    assert!(rows.iter().all(|r| r["Impact Type"] == "Emissions"));
    let range = &facet.as_value()["spec"]["encoding"]["opacity"]["scale"]["range"];
    assert_eq!(range[0], 0.2);
    assert_eq!(range[1], 1.0);

    let slides = rendered.report.chart(slideshow::CHART_ID).unwrap();
    assert!(slides.layer(slideshow::BAND).is_some());
    assert!(slides.layer(slideshow::CALLOUT).unwrap().to_string().contains("- 7.34 kg"));
    assert!(rendered.html.contains("<button"));
}

#[test]
fn merged_series_and_map_from_shipped_data() {
    let (_dir, cfg) = fixture();
    let (datasets, _) = pipeline::load(&cfg).unwrap();
    pipeline::validate(&datasets).unwrap();
    let view = pipeline::derive(&datasets, &Controls::default(), &Default::default()).unwrap();

    assert_eq!(view.merged.len(), 11);
    assert_eq!(view.references.decline(), 64.13 - 56.79);
    assert_eq!(view.choropleth.fill_for(578), choropleth::Fill::Background);
    assert!(matches!(view.choropleth.fill_for(826), choropleth::Fill::Ramp(_)));
    assert_eq!(view.controls.slide, SlideFrame::FIRST);
}

#[test]
fn invalid_dataset_aborts_the_report() {
    let (dir, cfg) = fixture();
    fs::write(
        dir.path().join(config::FOOD_IMPACT_FILE),
        "Category,Percent,Emissions\nFood,126,13.7\n",
    )
    .unwrap();
    let err = pipeline::run(&cfg, &Controls::default(), &RenderOptions::default()).unwrap_err();
    assert!(format!("{:#}", err).contains("percent"));
}

#[test]
fn shipped_data_with_real_reference_cache() {
    let cfg = ReportConfig::for_data_dir(Path::new("data"));
    if !cfg.country_codes_path().exists() || !cfg.world_geometry_path().exists() {
        eprintln!("SKIP: reference cache not found under {}", cfg.cache_dir.display());
        return;
    }
    let rendered = pipeline::run(&cfg, &Controls::default(), &RenderOptions::default()).unwrap();
    assert!(rendered.report.chart(choropleth::CHART_ID).is_some());
}
