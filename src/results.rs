use crate::errors::{DecodeError, EncodeError};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize, Serializer};

const ROOT_ELEMENT: &str = "GenerationOutput";
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GenerationOutput {
    #[serde(default)]
    pub totals: Totals,
    #[serde(default)]
    pub max_emission_generators: MaxEmissionGenerators,
    #[serde(default)]
    pub actual_heat_rates: ActualHeatRates,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Totals {
    #[serde(rename = "Generator", default)]
    pub generators: Vec<GeneratorTotal>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GeneratorTotal {
    pub name: String,
    pub total: f64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct MaxEmissionGenerators {
    #[serde(rename = "Day", default)]
    pub days: Vec<MaxEmissionDay>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MaxEmissionDay {
    pub name: String,
    #[serde(serialize_with = "serialize_date")]
    pub date: DateTime<FixedOffset>,
    pub emission: f64,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ActualHeatRates {
    #[serde(rename = "ActualHeatRate", default)]
    pub heat_rates: Vec<ActualHeatRate>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActualHeatRate {
    pub name: String,
    pub heat_rate: f64,
}

/// Dates keep their numeric offset, so UTC is written as `+00:00` rather than `Z`.
fn serialize_date<S: Serializer>(
    date: &DateTime<FixedOffset>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::AutoSi, false))
}

impl GenerationOutput {
    fn numbers(&self) -> impl Iterator<Item = (&str, &'static str, f64)> {
        let totals = self
            .totals
            .generators
            .iter()
            .map(|row| (row.name.as_str(), "Total", row.total));
        let emissions = self
            .max_emission_generators
            .days
            .iter()
            .map(|row| (row.name.as_str(), "Emission", row.emission));
        let heat_rates = self
            .actual_heat_rates
            .heat_rates
            .iter()
            .map(|row| (row.name.as_str(), "HeatRate", row.heat_rate));

        totals.chain(emissions).chain(heat_rates)
    }
}

/// Serializes results to XML. Infinite or NaN values are refused rather than written.
pub fn encode_output(output: &GenerationOutput) -> Result<Vec<u8>, EncodeError> {
    if let Some((generator, field, value)) = output
        .numbers()
        .find(|(_, _, value)| !value.is_finite())
    {
        return Err(EncodeError::NonFinite {
            generator: generator.to_string(),
            field,
            value,
        });
    }

    let mut xml = String::from(XML_DECLARATION);
    xml.push('\n');
    let mut serializer = quick_xml::se::Serializer::with_root(&mut xml, Some(ROOT_ELEMENT))?;
    serializer.indent(' ', 2);
    output.serialize(serializer)?;
    xml.push('\n');

    Ok(xml.into_bytes())
}

pub fn decode_output(bytes: &[u8]) -> Result<GenerationOutput, DecodeError> {
    let xml = std::str::from_utf8(bytes)?;

    Ok(quick_xml::de::from_str(xml)?)
}
