use serde::Serialize;

use crate::data::{ImpactType, ProductType};

/// Colours and layout shared by every chart builder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Style {
    pub dark_grey: &'static str,
    pub sage_green: &'static str,
    pub dark_red: &'static str,
    pub highlight: &'static str,
    /// Low-to-high sequential ramp for the choropleth.
    pub red_ramp: [&'static str; 3],
    pub map_background: &'static str,
    pub font: &'static str,
    pub axis_font_size: u32,
    pub title_font_size: u32,
    pub line_width: u32,
    pub line_height: u32,
    pub map_width: u32,
    pub map_height: u32,
    pub nutrition_width: u32,
    pub nutrition_height: u32,
    /// Fixed y range of every consumption chart, kg per person.
    pub consumption_domain: [f64; 2],
    /// Fixed x range of the protein chart, kg CO2eq per 100 g protein.
    pub protein_domain: [f64; 2],
}

impl Default for Style {
    fn default() -> Self {
        Self {
            dark_grey: "#9698B4",
            sage_green: "#A1D6C6",
            dark_red: "#982D4D",
            highlight: "#6B68F9",
            red_ramp: ["#F9CEDB", "#C55979", "#81072B"],
            map_background: "lightgray",
            font: "Arial",
            axis_font_size: 14,
            title_font_size: 20,
            line_width: 750,
            line_height: 400,
            map_width: 700,
            map_height: 500,
            nutrition_width: 720,
            nutrition_height: 500,
            consumption_domain: [40.0, 75.0],
            protein_domain: [0.0, 140.0],
        }
    }
}

impl Style {
    pub fn impact_color(&self, impact: ImpactType) -> &'static str {
        match impact {
            ImpactType::Emissions => self.dark_red,
            ImpactType::LandUse => self.sage_green,
            ImpactType::WaterUse => self.highlight,
        }
    }

    pub fn product_color(&self, product: ProductType) -> &'static str {
        match product {
            ProductType::Animal => self.dark_red,
            ProductType::Plant => self.sage_green,
        }
    }

    /// First food-impact category is highlighted, the rest are grey.
    pub fn category_colors(&self, n: usize) -> Vec<&'static str> {
        (0..n)
            .map(|i| if i == 0 { self.highlight } else { self.dark_grey })
            .collect()
    }
}
