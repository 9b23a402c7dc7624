use crate::errors::DecodeError;
use crate::reference_data::FuelCategory;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use std::collections::HashSet;

/// Decodes the raw bytes of a report file. Nothing is returned unless the whole report is valid.
pub fn decode_report(bytes: &[u8]) -> Result<GenerationReport, DecodeError> {
    let xml = std::str::from_utf8(bytes)?;
    // reports saved by Windows tooling tend to carry a byte order mark
    let xml = xml.trim_start_matches('\u{feff}');

    let report: GenerationReport = quick_xml::de::from_str(xml)?;
    report.validate()?;

    Ok(report)
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GenerationReport {
    #[serde(default)]
    pub wind: WindGenerators,
    #[serde(default)]
    pub gas: GasGenerators,
    #[serde(default)]
    pub coal: CoalGenerators,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct WindGenerators {
    #[serde(rename = "WindGenerator", default)]
    pub generators: Vec<WindGenerator>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct GasGenerators {
    #[serde(rename = "GasGenerator", default)]
    pub generators: Vec<GasGenerator>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct CoalGenerators {
    #[serde(rename = "CoalGenerator", default)]
    pub generators: Vec<CoalGenerator>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Generation {
    #[serde(rename = "Day", default)]
    pub days: Vec<Day>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Day {
    pub date: DateTime<FixedOffset>,
    pub energy: f64,
    pub price: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct WindGenerator {
    pub name: String,
    #[serde(default)]
    pub generation: Generation,
    // an absent location is treated like any other unrecognised one
    #[serde(default)]
    pub location: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct GasGenerator {
    pub name: String,
    #[serde(default)]
    pub generation: Generation,
    pub emissions_rating: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CoalGenerator {
    pub name: String,
    #[serde(default)]
    pub generation: Generation,
    pub total_heat_input: f64,
    pub actual_net_generation: f64,
    pub emissions_rating: f64,
}

/// Behaviour shared by every generator in a report.
pub trait Generator {
    fn name(&self) -> &str;
    fn category(&self) -> FuelCategory<'_>;
    fn days(&self) -> &[Day];
    /// Numeric attributes beyond the day series, named as they appear in the report.
    fn attributes(&self) -> Vec<(&'static str, f64)> {
        vec![]
    }
}

/// A generator that burns fuel and so has a daily emission.
pub trait EmittingGenerator: Generator {
    fn emissions_rating(&self) -> f64;
}

impl Generator for WindGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> FuelCategory<'_> {
        FuelCategory::Wind {
            location: &self.location,
        }
    }

    fn days(&self) -> &[Day] {
        &self.generation.days
    }
}

impl Generator for GasGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> FuelCategory<'_> {
        FuelCategory::Gas
    }

    fn days(&self) -> &[Day] {
        &self.generation.days
    }

    fn attributes(&self) -> Vec<(&'static str, f64)> {
        vec![("EmissionsRating", self.emissions_rating)]
    }
}

impl EmittingGenerator for GasGenerator {
    fn emissions_rating(&self) -> f64 {
        self.emissions_rating
    }
}

impl Generator for CoalGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> FuelCategory<'_> {
        FuelCategory::Coal
    }

    fn days(&self) -> &[Day] {
        &self.generation.days
    }

    fn attributes(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("EmissionsRating", self.emissions_rating),
            ("TotalHeatInput", self.total_heat_input),
            ("ActualNetGeneration", self.actual_net_generation),
        ]
    }
}

impl EmittingGenerator for CoalGenerator {
    fn emissions_rating(&self) -> f64 {
        self.emissions_rating
    }
}

impl GenerationReport {
    /// All generators in output order: wind, then gas, then coal, each in report order.
    pub fn generators(&self) -> impl Iterator<Item = &dyn Generator> {
        self.wind
            .generators
            .iter()
            .map(|generator| generator as &dyn Generator)
            .chain(
                self.gas
                    .generators
                    .iter()
                    .map(|generator| generator as &dyn Generator),
            )
            .chain(
                self.coal
                    .generators
                    .iter()
                    .map(|generator| generator as &dyn Generator),
            )
    }

    /// Gas generators followed by coal generators, each in report order.
    pub fn emitting_generators(&self) -> impl Iterator<Item = &dyn EmittingGenerator> {
        self.gas
            .generators
            .iter()
            .map(|generator| generator as &dyn EmittingGenerator)
            .chain(
                self.coal
                    .generators
                    .iter()
                    .map(|generator| generator as &dyn EmittingGenerator),
            )
    }

    fn validate(&self) -> Result<(), DecodeError> {
        let mut seen: HashSet<(&'static str, &str)> = HashSet::new();

        for generator in self.generators() {
            let category = generator.category().name();
            if !seen.insert((category, generator.name())) {
                return Err(DecodeError::DuplicateGenerator {
                    category,
                    generator: generator.name().to_string(),
                });
            }

            let day_values = generator
                .days()
                .iter()
                .flat_map(|day| [("Energy", day.energy), ("Price", day.price)]);
            for (field, value) in generator.attributes().into_iter().chain(day_values) {
                if !value.is_finite() || value < 0. {
                    return Err(DecodeError::InvalidNumber {
                        category,
                        generator: generator.name().to_string(),
                        field,
                        value,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    const SAMPLE_REPORT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<GenerationReport xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <Wind>
    <WindGenerator>
      <Name>Wind[Offshore]</Name>
      <Generation>
        <Day>
          <Date>2017-01-01T00:00:00+00:00</Date>
          <Energy>100.368</Energy>
          <Price>20.148</Price>
        </Day>
        <Day>
          <Date>2017-01-02T00:00:00+00:00</Date>
          <Energy>90.843</Energy>
          <Price>25.516</Price>
        </Day>
      </Generation>
      <Location>Offshore</Location>
    </WindGenerator>
  </Wind>
  <Gas>
    <GasGenerator>
      <Name>Gas[1]</Name>
      <Generation>
        <Day>
          <Date>2017-01-01T00:00:00+00:00</Date>
          <Energy>259.235</Energy>
          <Price>15.837</Price>
        </Day>
      </Generation>
      <EmissionsRating>0.038</EmissionsRating>
    </GasGenerator>
  </Gas>
  <Coal>
    <CoalGenerator>
      <Name>Coal[1]</Name>
      <Generation>
        <Day>
          <Date>2017-01-01T00:00:00+00:00</Date>
          <Energy>350.487</Energy>
          <Price>10.146</Price>
        </Day>
      </Generation>
      <TotalHeatInput>11.815</TotalHeatInput>
      <ActualNetGeneration>11.815</ActualNetGeneration>
      <EmissionsRating>0.482</EmissionsRating>
    </CoalGenerator>
  </Coal>
</GenerationReport>"#;

    #[rstest]
    fn should_decode_sample_report() {
        let report = decode_report(SAMPLE_REPORT.as_bytes()).unwrap();

        assert_eq!(report.wind.generators.len(), 1);
        assert_eq!(report.wind.generators[0].location, "Offshore");
        assert_eq!(report.wind.generators[0].generation.days.len(), 2);
        assert_eq!(
            report.wind.generators[0].generation.days[1].date,
            DateTime::parse_from_rfc3339("2017-01-02T00:00:00+00:00").unwrap()
        );
        assert_eq!(report.gas.generators[0].emissions_rating, 0.038);
        assert_eq!(report.coal.generators[0].total_heat_input, 11.815);
        assert_eq!(
            report.generators().map(|g| g.name()).collect::<Vec<_>>(),
            vec!["Wind[Offshore]", "Gas[1]", "Coal[1]"]
        );
    }

    #[rstest]
    fn should_decode_report_with_byte_order_mark() {
        let bytes = format!("\u{feff}{SAMPLE_REPORT}");
        assert!(decode_report(bytes.as_bytes()).is_ok());
    }

    #[rstest]
    fn should_treat_missing_categories_as_empty() {
        let report = decode_report(
            br#"<GenerationReport>
  <Wind>
    <WindGenerator>
      <Name>Wind[Onshore]</Name>
      <Generation/>
      <Location>Onshore</Location>
    </WindGenerator>
  </Wind>
  <Gas/>
</GenerationReport>"#,
        )
        .unwrap();

        assert!(report.wind.generators[0].generation.days.is_empty());
        assert!(report.gas.generators.is_empty());
        assert!(report.coal.generators.is_empty());
    }

    #[rstest]
    #[case::not_xml(b"this is not a report".as_slice())]
    #[case::unclosed(b"<GenerationReport><Wind>".as_slice())]
    #[case::unparsable_number(br#"<GenerationReport><Gas><GasGenerator><Name>Gas[1]</Name><EmissionsRating>lots</EmissionsRating></GasGenerator></Gas></GenerationReport>"#.as_slice())]
    #[case::missing_field(br#"<GenerationReport><Coal><CoalGenerator><Name>Coal[1]</Name><EmissionsRating>0.4</EmissionsRating></CoalGenerator></Coal></GenerationReport>"#.as_slice())]
    #[case::bad_date(br#"<GenerationReport><Wind><WindGenerator><Name>W</Name><Generation><Day><Date>yesterday</Date><Energy>1</Energy><Price>1</Price></Day></Generation></WindGenerator></Wind></GenerationReport>"#.as_slice())]
    fn should_reject_malformed_report(#[case] bytes: &[u8]) {
        assert!(matches!(decode_report(bytes), Err(DecodeError::Xml(_))));
    }

    #[rstest]
    fn should_reject_non_utf8_report() {
        assert!(matches!(
            decode_report(&[0x3c, 0xff, 0xfe, 0x3e]),
            Err(DecodeError::Encoding(_))
        ));
    }

    #[rstest]
    fn should_reject_negative_energy() {
        let result = decode_report(
            br#"<GenerationReport><Wind><WindGenerator><Name>W</Name><Generation><Day><Date>2017-01-01T00:00:00+00:00</Date><Energy>-1</Energy><Price>1</Price></Day></Generation><Location>Onshore</Location></WindGenerator></Wind></GenerationReport>"#,
        );

        match result {
            Err(DecodeError::InvalidNumber {
                category,
                generator,
                field,
                value,
            }) => {
                assert_eq!(category, "Wind");
                assert_eq!(generator, "W");
                assert_eq!(field, "Energy");
                assert_eq!(value, -1.);
            }
            other => panic!("expected an invalid number error, got {other:?}"),
        }
    }

    #[rstest]
    fn should_reject_duplicate_generator_names_within_a_category() {
        let result = decode_report(
            br#"<GenerationReport><Gas>
<GasGenerator><Name>Gas[1]</Name><EmissionsRating>0.1</EmissionsRating></GasGenerator>
<GasGenerator><Name>Gas[1]</Name><EmissionsRating>0.2</EmissionsRating></GasGenerator>
</Gas></GenerationReport>"#,
        );

        assert!(matches!(
            result,
            Err(DecodeError::DuplicateGenerator { category: "Gas", .. })
        ));
    }

    #[rstest]
    fn should_allow_same_name_in_different_categories() {
        let result = decode_report(
            br#"<GenerationReport>
<Gas><GasGenerator><Name>Plant</Name><EmissionsRating>0.1</EmissionsRating></GasGenerator></Gas>
<Coal><CoalGenerator><Name>Plant</Name><TotalHeatInput>1</TotalHeatInput><ActualNetGeneration>1</ActualNetGeneration><EmissionsRating>0.2</EmissionsRating></CoalGenerator></Coal>
</GenerationReport>"#,
        );

        assert!(result.is_ok());
    }
}
