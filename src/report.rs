//! Ordered report sections: headings, narrative and at most one artifact each.

use anyhow::Result;
use serde::Serialize;

use crate::charts::slideshow::ReferenceValues;
use crate::charts::{
    choropleth, dual_axis, impact, nutrition, pie, slideshow, Artifact, ChartSpec,
};
use crate::data::Datasets;
use crate::pipeline::DerivedView;
use crate::style::Style;

pub const TITLE: &str = "Urban Butcher Stuttgart";
pub const SUBTITLE: &str =
    "Produktstrategie für unsere Filialeröffnung - Wie können wir uns als Metzgerei nachhaltig positionieren?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingLevel {
    Header,
    Subheader,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Block {
    /// Inline `**bold**` is supported.
    Paragraph(String),
    Quote(String),
    Bullets(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub level: HeadingLevel,
    pub heading: String,
    pub blocks: Vec<Block>,
    pub artifact: Option<Artifact>,
    /// Text shown below the artifact.
    pub caption: Vec<Block>,
}

impl Section {
    fn header(heading: &str) -> Self {
        Self {
            level: HeadingLevel::Header,
            heading: heading.to_string(),
            blocks: Vec::new(),
            artifact: None,
            caption: Vec::new(),
        }
    }

    fn sub(heading: &str) -> Self {
        Self {
            level: HeadingLevel::Subheader,
            ..Self::header(heading)
        }
    }

    fn text(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    fn caption(mut self, block: Block) -> Self {
        self.caption.push(block);
        self
    }

    fn with(mut self, artifact: Artifact) -> Self {
        self.artifact = Some(artifact);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    pub subtitle: String,
    pub intro: Vec<Block>,
    pub sections: Vec<Section>,
}

impl Report {
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.sections.iter().filter_map(|s| s.artifact.as_ref())
    }

    pub fn chart(&self, id: &str) -> Option<&ChartSpec> {
        self.artifacts().find(|a| a.id() == Some(id)).and_then(Artifact::spec)
    }
}

fn p(s: &str) -> Block {
    Block::Paragraph(s.to_string())
}

fn bullets(items: &[&str]) -> Block {
    Block::Bullets(items.iter().map(|s| s.to_string()).collect())
}

/// Assemble every section in page order.
pub fn build(datasets: &Datasets, view: &DerivedView, style: &Style) -> Result<Report> {
    let pie = Artifact::Chart {
        id: "food-share".to_string(),
        spec: pie::food_impact_pie(&datasets.food_impacts, style),
    };
    let per_weight = impact::impact_facet(&view.impacts, &view.opacity, style);
    let per_protein = Artifact::Chart {
        id: "impact-per-protein".to_string(),
        spec: nutrition::protein_range(&datasets.protein_impacts, &view.opacity, style),
    };
    let slides = Artifact::Slideshow {
        id: slideshow::CHART_ID.to_string(),
        frame: view.controls.slide,
        spec: slideshow::meat_consumption_frame(&datasets.consumption, view.controls.slide, style)?,
    };
    let map = Artifact::Chart {
        id: choropleth::CHART_ID.to_string(),
        spec: choropleth::company_map(&datasets.world, &view.choropleth, style),
    };
    let trend = Artifact::Chart {
        id: dual_axis::CHART_ID.to_string(),
        spec: dual_axis::consumption_vs_foundings(&view.merged, style),
    };

    let sections = vec![
        // Section 1
        Section::header("Der Impact der Lebensmittelproduktion"),
        Section::sub("23% der Treibhausgasemissionen werden durch die Lebensmittelproduktion verursacht")
            .with(pie)
            .caption(Block::Quote(
                "Today’s food supply chain creates ~13.7 billion metric tons of carbon dioxide \
                 equivalents (CO2eq), 26% of anthropogenic (man-made) GHG emissions. \
                 (Poore & Nemecek, 2018)"
                    .to_string(),
            )),
        Section::sub("Greenhouse Gas Emissions (GHG) und die Landnutzung bei tierischen Produkten höher")
            .with(per_weight),
        Section::sub("Auch im Nährwertvergleich sind die Emissionen bei tierischen Proteinen höher")
            .text(p(
                "Im Vergleich zu tierischen Erzeugnissen haben pflanzliche Produkte einen geringeren \
                 Proteinanteil pro 100g. Doch auch hier schneidet 100g pflanzliches Protein besser ab \
                 als 100g tierisches Protein.",
            ))
            .with(per_protein),
        // Section 2
        Section::header("Fleischkonsum und Fleischersatzprodukte"),
        Section::sub("Der Fleischkonsum in Deutschland sinkt seit 2011 stetig")
            .text(p(&consumption_summary(&view.references)))
            .with(slides),
        Section::sub("Anzahl der Unternehmen in der Fleischersatzprodukt-Branche")
            .with(map)
            .caption(p(&map_legend(view))),
        Section::sub("Ein Trend ist sichtbar: Weniger Fleisch, mehr Ersatzprodukte")
            .text(p(
                "Der Markt für Fleischersatzprodukte ist in den letzten Jahren stark gewachsen. \
                 Im Jahr 2019 wurden weltweit 109 Unternehmen gegründet, die sich auf die Herstellung \
                 von Fleischersatzprodukten spezialisiert haben. Im Gegensatz dazu sinkt der \
                 Fleischkonsum pro Kopf in Deutschland.",
            ))
            .with(trend),
        // Section 3
        Section::header("Ausblick und Empfehlung")
            .text(p("**Zusammenfassung der Datenanalyse**"))
            .text(bullets(&[
                "**Pflanzliche Produkte** sind durchgehend **besser für die Umwelt** als tierische Produkte",
                "Der **Fleischkonsum** pro Kopf in Deutschland **sinkt seit 2011**",
                "Der Markt für alternative, pflanzliche Produkte wird immer größer",
            ]))
            .text(p(
                "**Empfehlung für die Produktstrategie: Testphase mit veganen Produkten \
                 (1/2 des Sortiments) in der Filiale in Stuttgart**",
            ))
            .text(p("Potentielle positive Auswirkungen:"))
            .text(bullets(&[
                "Metzgerei und vegan? Widerspruch sorgt für **mediale Aufsicht**",
                "**Nachhaltigkeit als Kaufargument** und zunehmend wichtigem Entscheidungsfaktor bei den Kunden",
                "Absetzung von der Konkurrenz",
            ])),
    ];

    Ok(Report {
        title: TITLE.to_string(),
        subtitle: SUBTITLE.to_string(),
        intro: vec![p(
            "**Urban Butcher** ist ein junges Unternehmen, das sich auf die Herstellung von \
             Fleischprodukten spezialisiert hat und die Neueröffnung der Filiale in Stuttgart steht \
             kurz bevor. Um die Eröffnung zu einem Erfolg zu machen, sollten innovative Ansätze zur \
             **Etablierung eines guten Brand Image** vorgenommen werden. Um die Kunden von heute \
             begeistern zu können, darf der Faktor 'Nachhaltigkeit' nicht außer Acht gelassen werden. \
             Unseren Kunden ist bewusst, dass die Fleischproduktion einen großen Einfluss auf die \
             Umwelt hat. Daher ist es wichtig, dass sich Urban Butcher Stuttgart **als nachhaltiges \
             Unternehmen positioniert**.",
        )],
        sections,
    })
}

fn consumption_summary(refs: &ReferenceValues) -> String {
    format!(
        "Der Fleischkonsum pro Kopf in Deutschland ist seit {} stetig gesunken. Im Jahr {} lag der \
         Fleischkonsum bei {} kg pro Kopf. Im Vergleich zu {} ist das ein Rückgang von {:.2} kg pro Kopf.",
        refs.first_year.format("%Y"),
        refs.last_year.format("%Y"),
        refs.latest,
        refs.first_year.format("%Y"),
        refs.decline()
    )
}

fn map_legend(view: &DerivedView) -> String {
    match view.choropleth.domain() {
        Some((lo, hi)) => format!(
            "Number of Companies: {} (hell) bis {} (dunkel). Länder ohne Daten bleiben grau.",
            lo, hi
        ),
        None => "Keine Länderdaten vorhanden.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn summary_reports_latest_consumption_not_reference_min() {
        let refs = ReferenceValues {
            first_year: NaiveDate::from_ymd_opt(2011, 1, 1).unwrap(),
            last_year: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            latest: 57.5,
            max: 64.13,
            min: 56.79,
        };
        let text = consumption_summary(&refs);
        assert!(text.contains("Im Jahr 2021 lag der Fleischkonsum bei 57.5 kg"), "{}", text);
        assert!(text.contains("Rückgang von 7.34 kg"), "{}", text);
    }
}
