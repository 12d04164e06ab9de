use chrono::NaiveDate;

use urban_butcher::charts::choropleth::{company_map, ChoroplethScale, Fill};
use urban_butcher::charts::dual_axis::merge_by_year;
use urban_butcher::charts::impact::{impact_facet, NOT_ENOUGH_DATA};
use urban_butcher::charts::slideshow::{self, meat_consumption_frame};
use urban_butcher::charts::Artifact;
use urban_butcher::data::{
    CompanyFoundingRecord, ConsumptionRecord, CountryCode, CountryCompanyRecord, EnvironmentalImpactRecord,
    ImpactType, ProductType, WorldGeometry,
};
use urban_butcher::filter::{filter_impacts, FilterState, OpacityScale, SlideFrame, MUTED_OPACITY};
use urban_butcher::style::Style;

fn year(y: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, 1, 1).unwrap()
}

fn impact(product: &str, pt: ProductType, it: ImpactType, value: f64) -> EnvironmentalImpactRecord {
    EnvironmentalImpactRecord {
        product: product.to_string(),
        product_type: pt,
        impact_type: it,
        impact: value,
    }
}

fn impacts() -> Vec<EnvironmentalImpactRecord> {
    vec![
        impact("Beef", ProductType::Animal, ImpactType::Emissions, 99.48),
        impact("Beef", ProductType::Animal, ImpactType::LandUse, 326.21),
        impact("Beef", ProductType::Animal, ImpactType::WaterUse, 1451.2),
        impact("Tofu", ProductType::Plant, ImpactType::Emissions, 3.16),
        impact("Tofu", ProductType::Plant, ImpactType::LandUse, 3.52),
        impact("Tofu", ProductType::Plant, ImpactType::WaterUse, 148.6),
    ]
}

fn consumption(years: &[i32]) -> Vec<ConsumptionRecord> {
    years
        .iter()
        .enumerate()
        .map(|(i, y)| ConsumptionRecord {
            year: year(*y),
            consumption_per_person: 64.13 - i as f64,
            max_consumption: 64.13,
            min_consumption: 56.79,
        })
        .collect()
}

#[test]
fn opacity_toggles_are_symmetric() {
    let scale = |a, p| OpacityScale::from_filter(&FilterState::new(a, p, Vec::<ImpactType>::new()));
    assert_eq!(scale(true, true), scale(false, false));
    let animal_only = scale(true, false);
    let plant_only = scale(false, true);
    assert_eq!(animal_only.get(ProductType::Animal), plant_only.get(ProductType::Plant));
    assert_eq!(animal_only.get(ProductType::Plant), plant_only.get(ProductType::Animal));
    assert_eq!(animal_only.get(ProductType::Plant), MUTED_OPACITY);
    assert_eq!(scale(false, false).get(ProductType::Plant), 1.0);
}

#[test]
fn empty_impact_selection_keeps_every_row() {
    let rows = impacts();
    let all = filter_impacts(&rows, &FilterState::default());
    assert_eq!(all, rows);

    let subset = FilterState::new(false, false, [ImpactType::Emissions, ImpactType::WaterUse]);
    let filtered = filter_impacts(&rows, &subset);
    assert_eq!(filtered.len(), 4);
    assert!(filtered.iter().all(|r| r.impact_type != ImpactType::LandUse));
}

#[test]
fn slideshow_base_line_is_identical_across_frames() {
    let style = Style::default();
    let records = consumption(&[2011, 2015, 2019, 2021]);
    let geometry = |frame: SlideFrame| {
        let spec = meat_consumption_frame(&records, frame, &style).unwrap();
        let line = spec.layer(slideshow::BASE_LINE).unwrap().clone();
        (line["data"].clone(), line["mark"]["type"].clone(), line["encoding"].clone())
    };
    let first = geometry(SlideFrame::FIRST);
    for frame in SlideFrame::all() {
        assert_eq!(geometry(frame), first, "frame {}", frame.get());
    }
}

#[test]
fn slideshow_band_matches_reference_lines() {
    let style = Style::default();
    let records = consumption(&[2011, 2015, 2019, 2021]);
    let third = meat_consumption_frame(&records, SlideFrame::new(3).unwrap(), &style).unwrap();
    let fourth = meat_consumption_frame(&records, SlideFrame::LAST, &style).unwrap();

    let band = fourth.layer(slideshow::BAND).unwrap();
    let rule_min = third.layer(slideshow::RULE_MIN).unwrap();
    let rule_max = third.layer(slideshow::RULE_MAX).unwrap();
    assert_eq!(band["encoding"]["y"]["field"], rule_min["encoding"]["y"]["field"]);
    assert_eq!(band["encoding"]["y2"]["field"], rule_max["encoding"]["y"]["field"]);
    assert_eq!(band["data"], rule_min["data"]);
    assert_eq!(band["data"], rule_max["data"]);
    assert!(fourth.layer(slideshow::CALLOUT).is_some());
    assert!(fourth.layer(slideshow::RULE_MIN).is_none());
}

#[test]
fn facet_placeholder_boundary() {
    let style = Style::default();
    let opacity = OpacityScale::from_filter(&FilterState::default());

    let one_value = vec![
        impact("Beef", ProductType::Animal, ImpactType::Emissions, 5.0),
        impact("Tofu", ProductType::Plant, ImpactType::Emissions, 5.0),
    ];
    match impact_facet(&one_value, &opacity, &style) {
        Artifact::Placeholder { text } => assert_eq!(text, NOT_ENOUGH_DATA),
        other => panic!("expected placeholder, got {:?}", other),
    }

    let two_values = vec![
        impact("Beef", ProductType::Animal, ImpactType::Emissions, 5.0),
        impact("Tofu", ProductType::Plant, ImpactType::Emissions, 6.0),
    ];
    assert!(impact_facet(&two_values, &opacity, &style).spec().is_some());
    assert!(impact_facet(&[], &opacity, &style).spec().is_none());
}

#[test]
fn dual_axis_merge_is_an_inner_join() {
    let consumption = consumption(&[2011, 2015, 2019, 2021]);
    let foundings = vec![
        CompanyFoundingRecord { year: year(2015), count: 45 },
        CompanyFoundingRecord { year: year(2019), count: 109 },
    ];
    let merged = merge_by_year(&consumption, &foundings);
    let years: Vec<NaiveDate> = merged.iter().map(|m| m.year).collect();
    assert_eq!(years, vec![year(2015), year(2019)]);
    assert_eq!(merged[1].companies_founded, 109);
    assert_eq!(merged[0].consumption_per_person, consumption[1].consumption_per_person);
}

#[test]
fn country_without_metric_keeps_background() {
    let style = Style::default();
    let world = WorldGeometry::from_ids(&[276, 250, 392]);
    let codes = vec![
        CountryCode { name: "Germany".into(), code: 276 },
        CountryCode { name: "France".into(), code: 250 },
        CountryCode { name: "Japan".into(), code: 392 },
    ];
    let metrics = vec![
        CountryCompanyRecord { country: "Germany".into(), count: 96 },
        CountryCompanyRecord { country: "France".into(), count: 35 },
    ];
    let scale = ChoroplethScale::resolve(&codes, &metrics, &world, &style);
    assert_eq!(scale.fill_for(392), Fill::Background);
    assert!(matches!(scale.fill_for(276), Fill::Ramp(_)));

    let spec = company_map(&world, &scale, &style);
    let background = spec.layer("background").unwrap();
    assert_eq!(background["mark"]["fill"], style.map_background);
    let lookup = &spec.layer("foreground").unwrap()["transform"][0]["from"]["data"]["values"];
    let ids: Vec<u64> = lookup.as_array().unwrap().iter().map(|e| e["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![250, 276]);
}
