//! Valuation and emissions factors, loaded once at startup and shared read-only.

use crate::errors::ConfigError;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Low, Tier::Medium, Tier::High];

    fn as_str(&self) -> &'static str {
        match self {
            Tier::Low => "Low",
            Tier::Medium => "Medium",
            Tier::High => "High",
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct FactorTable {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl FactorTable {
    pub fn get(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Low => self.low,
            Tier::Medium => self.medium,
            Tier::High => self.high,
        }
    }

    fn validate(&self, table: &'static str) -> Result<(), ConfigError> {
        for tier in Tier::ALL {
            let value = self.get(tier);
            if !value.is_finite() || value < 0. {
                return Err(ConfigError::InvalidFactor {
                    table,
                    tier: tier.as_str(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// The generator categories a report can contain. Wind generators are valued by location.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FuelCategory<'a> {
    Wind { location: &'a str },
    Gas,
    Coal,
}

impl FuelCategory<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            FuelCategory::Wind { .. } => "Wind",
            FuelCategory::Gas => "Gas",
            FuelCategory::Coal => "Coal",
        }
    }
}

/// Fixed tier choice for the thermal fuels.
#[derive(Clone, Copy, Debug)]
pub struct ThermalTiers {
    pub gas: Tier,
    pub coal: Tier,
}

pub const THERMAL_VALUATION_TIERS: ThermalTiers = ThermalTiers {
    gas: Tier::Medium,
    coal: Tier::Medium,
};

pub const THERMAL_EMISSIONS_TIERS: ThermalTiers = ThermalTiers {
    gas: Tier::Medium,
    coal: Tier::High,
};

/// Wind locations that earn a valuation factor. Any other location is valued at zero.
pub const WIND_LOCATION_TIERS: [(&str, Tier); 2] = [("Offshore", Tier::Low), ("Onshore", Tier::High)];

pub fn wind_location_tier(location: &str) -> Option<Tier> {
    WIND_LOCATION_TIERS
        .iter()
        .find(|(known, _)| *known == location)
        .map(|(_, tier)| *tier)
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReferenceDataFile {
    factors: Factors,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Factors {
    value_factor: FactorTable,
    emissions_factor: FactorTable,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceData {
    value_factor: FactorTable,
    emissions_factor: FactorTable,
}

impl ReferenceData {
    pub fn new(value_factor: FactorTable, emissions_factor: FactorTable) -> Result<Self, ConfigError> {
        value_factor.validate("ValueFactor")?;
        emissions_factor.validate("EmissionsFactor")?;

        Ok(Self {
            value_factor,
            emissions_factor,
        })
    }

    pub fn from_xml(xml: impl BufRead) -> Result<Self, ConfigError> {
        let ReferenceDataFile {
            factors:
                Factors {
                    value_factor,
                    emissions_factor,
                },
        } = quick_xml::de::from_reader(xml)?;

        Self::new(value_factor, emissions_factor)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::ReferenceDataUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_xml(BufReader::new(file))
    }

    pub fn value_factor(&self, tier: Tier) -> f64 {
        self.value_factor.get(tier)
    }

    pub fn emissions_factor(&self, tier: Tier) -> f64 {
        self.emissions_factor.get(tier)
    }

    /// Multiplier applied to energy x price when valuing a generator's output.
    pub fn valuation_factor_for(&self, category: FuelCategory) -> f64 {
        match category {
            FuelCategory::Wind { location } => {
                wind_location_tier(location).map_or(0., |tier| self.value_factor(tier))
            }
            FuelCategory::Gas => self.value_factor(THERMAL_VALUATION_TIERS.gas),
            FuelCategory::Coal => self.value_factor(THERMAL_VALUATION_TIERS.coal),
        }
    }

    /// Multiplier applied to energy x emissions rating. Wind generators have no emissions.
    pub fn emissions_factor_for(&self, category: FuelCategory) -> Option<f64> {
        match category {
            FuelCategory::Wind { .. } => None,
            FuelCategory::Gas => Some(self.emissions_factor(THERMAL_EMISSIONS_TIERS.gas)),
            FuelCategory::Coal => Some(self.emissions_factor(THERMAL_EMISSIONS_TIERS.coal)),
        }
    }
}
