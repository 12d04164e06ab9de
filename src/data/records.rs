use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::CsvTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ProductType {
    Animal,
    Plant,
}

impl ProductType {
    pub const ALL: [ProductType; 2] = [ProductType::Animal, ProductType::Plant];

    pub fn label(&self) -> &'static str {
        match self {
            ProductType::Animal => "Animal",
            ProductType::Plant => "Plant",
        }
    }
}

impl FromStr for ProductType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "animal" => Ok(ProductType::Animal),
            "plant" => Ok(ProductType::Plant),
            other => Err(anyhow!("unknown product type {:?}", other)),
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ImpactType {
    Emissions,
    #[serde(rename = "Land Use")]
    LandUse,
    #[serde(rename = "Water Use")]
    WaterUse,
}

impl ImpactType {
    pub const ALL: [ImpactType; 3] = [ImpactType::Emissions, ImpactType::LandUse, ImpactType::WaterUse];

    pub fn label(&self) -> &'static str {
        match self {
            ImpactType::Emissions => "Emissions",
            ImpactType::LandUse => "Land Use",
            ImpactType::WaterUse => "Water Use",
        }
    }
}

impl FromStr for ImpactType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "emissions" => Ok(ImpactType::Emissions),
            "landuse" => Ok(ImpactType::LandUse),
            "wateruse" => Ok(ImpactType::WaterUse),
            _ => Err(anyhow!("unknown impact type {:?}", s.trim())),
        }
    }
}

impl fmt::Display for ImpactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Field names below are the dataset column names; chart encodings refer to them.

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodImpactRecord {
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Percent")]
    pub percent: f64,
    #[serde(rename = "Emissions")]
    pub emissions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionRecord {
    #[serde(rename = "Year")]
    pub year: NaiveDate,
    #[serde(rename = "Consumption per Person")]
    pub consumption_per_person: f64,
    #[serde(rename = "MaxConsumption")]
    pub max_consumption: f64,
    #[serde(rename = "MinConsumption")]
    pub min_consumption: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentalImpactRecord {
    #[serde(rename = "Product")]
    pub product: String,
    #[serde(rename = "Product Type")]
    pub product_type: ProductType,
    #[serde(rename = "Impact Type")]
    pub impact_type: ImpactType,
    #[serde(rename = "Impact")]
    pub impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProteinImpactRecord {
    #[serde(rename = "Product")]
    pub product: String,
    #[serde(rename = "Product Type")]
    pub product_type: ProductType,
    #[serde(rename = "5th pctl")]
    pub pctl_5th: f64,
    #[serde(rename = "95th pctl")]
    pub pctl_95th: f64,
    #[serde(rename = "Median")]
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyFoundingRecord {
    #[serde(rename = "Year Founded")]
    pub year: NaiveDate,
    #[serde(rename = "Number of Companies Founded")]
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryCompanyRecord {
    #[serde(rename = "name")]
    pub country: String,
    #[serde(rename = "Number of Companies per Country")]
    pub count: u32,
}

/// One row of the ISO-3166 reference table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryCode {
    pub name: String,
    pub code: u16,
}

pub const FOOD_IMPACT_COLUMNS: &[&str] = &["Category", "Percent", "Emissions"];
pub const CONSUMPTION_COLUMNS: &[&str] = &["Year", "Consumption per Person", "MaxConsumption", "MinConsumption"];
pub const IMPACT_COLUMNS: &[&str] = &["Product", "Product Type", "Impact Type", "Impact"];
pub const PROTEIN_COLUMNS: &[&str] = &["Product", "Product Type", "5th pctl", "95th pctl", "Median"];
pub const FOUNDED_COLUMNS: &[&str] = &["Year Founded", "Number of Companies Founded"];
pub const COUNTRY_COLUMNS: &[&str] = &["name", "Number of Companies per Country"];
pub const COUNTRY_CODE_COLUMNS: &[&str] = &["name", "country-code"];

pub fn food_impacts(table: &CsvTable) -> Result<Vec<FoodImpactRecord>> {
    table.records(|r| {
        Ok(FoodImpactRecord {
            category: r.str("Category")?.to_string(),
            percent: r.parse("Percent")?,
            emissions: r.parse("Emissions")?,
        })
    })
}

pub fn consumption(table: &CsvTable) -> Result<Vec<ConsumptionRecord>> {
    let mut rows = table.records(|r| {
        Ok(ConsumptionRecord {
            year: r.date("Year")?,
            consumption_per_person: r.parse("Consumption per Person")?,
            max_consumption: r.parse("MaxConsumption")?,
            min_consumption: r.parse("MinConsumption")?,
        })
    })?;
    rows.sort_by_key(|r| r.year);
    Ok(rows)
}

pub fn environmental_impacts(table: &CsvTable) -> Result<Vec<EnvironmentalImpactRecord>> {
    table.records(|r| {
        Ok(EnvironmentalImpactRecord {
            product: r.str("Product")?.to_string(),
            product_type: r.parse("Product Type")?,
            impact_type: r.parse("Impact Type")?,
            impact: r.parse("Impact")?,
        })
    })
}

pub fn protein_impacts(table: &CsvTable) -> Result<Vec<ProteinImpactRecord>> {
    table.records(|r| {
        Ok(ProteinImpactRecord {
            product: r.str("Product")?.to_string(),
            product_type: r.parse("Product Type")?,
            pctl_5th: r.parse("5th pctl")?,
            pctl_95th: r.parse("95th pctl")?,
            median: r.parse("Median")?,
        })
    })
}

pub fn company_foundings(table: &CsvTable) -> Result<Vec<CompanyFoundingRecord>> {
    let mut rows = table.records(|r| {
        Ok(CompanyFoundingRecord {
            year: r.date("Year Founded")?,
            count: r.count("Number of Companies Founded")?,
        })
    })?;
    rows.sort_by_key(|r| r.year);
    Ok(rows)
}

pub fn country_companies(table: &CsvTable) -> Result<Vec<CountryCompanyRecord>> {
    table.records(|r| {
        Ok(CountryCompanyRecord {
            country: r.str("name")?.to_string(),
            count: r.count("Number of Companies per Country")?,
        })
    })
}

pub fn country_codes(table: &CsvTable) -> Result<Vec<CountryCode>> {
    table.records(|r| {
        Ok(CountryCode {
            name: r.str("name")?.to_string(),
            code: r.parse("country-code")?,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impact_type_parses_loose_spellings() {
        assert_eq!("Land Use".parse::<ImpactType>().unwrap(), ImpactType::LandUse);
        assert_eq!("water_use".parse::<ImpactType>().unwrap(), ImpactType::WaterUse);
        assert_eq!(" emissions ".parse::<ImpactType>().unwrap(), ImpactType::Emissions);
        assert!("Noise".parse::<ImpactType>().is_err());
    }

    #[test]
    fn product_type_is_case_insensitive() {
        assert_eq!("ANIMAL".parse::<ProductType>().unwrap(), ProductType::Animal);
        assert_eq!("plant".parse::<ProductType>().unwrap(), ProductType::Plant);
        assert!("fungus".parse::<ProductType>().is_err());
    }

    #[test]
    fn records_serialize_with_column_names() {
        let rec = EnvironmentalImpactRecord {
            product: "Beef".into(),
            product_type: ProductType::Animal,
            impact_type: ImpactType::LandUse,
            impact: 326.21,
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["Product Type"], "Animal");
        assert_eq!(v["Impact Type"], "Land Use");
        assert_eq!(v["Impact"], 326.21);
    }

    #[test]
    fn consumption_sorted_by_year_and_dates_serialize_iso() {
        let table = CsvTable::parse(
            "c.csv",
            "Year,Consumption per Person,MaxConsumption,MinConsumption\n\
             2021-01-01,56.79,64.13,56.79\n\
             2011-01-01,64.13,64.13,56.79\n",
        )
        .unwrap();
        let rows = consumption(&table).unwrap();
        assert_eq!(rows[0].year.to_string(), "2011-01-01");
        let v = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(v["Year"], "2011-01-01");
    }

    #[test]
    fn country_codes_read_quoted_names() {
        let table = CsvTable::parse(
            "all.csv",
            "name,alpha-2,alpha-3,country-code\n\
             \"Bonaire, Sint Eustatius and Saba\",BQ,BES,535\n\
             Germany,DE,DEU,276\n",
        )
        .unwrap();
        let codes = country_codes(&table).unwrap();
        assert_eq!(codes[0].name, "Bonaire, Sint Eustatius and Saba");
        assert_eq!(codes[1].code, 276);
    }
}
