//! Pure calculations over a decoded report. Nothing here performs IO or holds state between
//! reports, so the three calculations may run in any order.

use crate::errors::ComputationError;
use crate::input::{CoalGenerator, EmittingGenerator, GenerationReport, Generator};
use crate::reference_data::ReferenceData;
use crate::results::{
    ActualHeatRate, ActualHeatRates, GenerationOutput, GeneratorTotal, MaxEmissionDay,
    MaxEmissionGenerators, Totals,
};
use chrono::{DateTime, FixedOffset};
use indexmap::map::Entry;
use indexmap::IndexMap;

/// Results for one report, plus any rows that had to be left out.
#[derive(Debug, Default, PartialEq)]
pub struct Aggregation {
    pub output: GenerationOutput,
    pub row_errors: Vec<ComputationError>,
}

pub fn aggregate(report: &GenerationReport, reference_data: &ReferenceData) -> Aggregation {
    let (actual_heat_rates, row_errors) = calculate_actual_heat_rates(report);

    Aggregation {
        output: GenerationOutput {
            totals: calculate_totals(report, reference_data),
            max_emission_generators: calculate_max_emissions(report, reference_data),
            actual_heat_rates,
        },
        row_errors,
    }
}

/// Sum of energy x price x valuation factor over every day the generator reported.
pub fn generator_total(generator: &dyn Generator, reference_data: &ReferenceData) -> f64 {
    let factor = reference_data.valuation_factor_for(generator.category());

    generator
        .days()
        .iter()
        .map(|day| day.energy * day.price * factor)
        .sum()
}

pub fn calculate_totals(report: &GenerationReport, reference_data: &ReferenceData) -> Totals {
    Totals {
        generators: report
            .generators()
            .map(|generator| GeneratorTotal {
                name: generator.name().to_string(),
                total: generator_total(generator, reference_data),
            })
            .collect(),
    }
}

/// The emission for each day the generator reported, in report order.
pub fn daily_emissions<'a>(
    generator: &'a dyn EmittingGenerator,
    reference_data: &ReferenceData,
) -> impl Iterator<Item = (DateTime<FixedOffset>, f64)> + 'a {
    // emitting generators are always thermal, so a factor is always present
    let factor = reference_data
        .emissions_factor_for(generator.category())
        .unwrap_or_default();
    let rating = generator.emissions_rating();

    generator
        .days()
        .iter()
        .map(move |day| (day.date, day.energy * rating * factor))
}

/// Picks the highest emitter for each date, ordered by date. Where two emissions tie, the
/// generator met first (gas before coal, then report order) is kept.
pub fn calculate_max_emissions(
    report: &GenerationReport,
    reference_data: &ReferenceData,
) -> MaxEmissionGenerators {
    let mut by_date: IndexMap<DateTime<FixedOffset>, MaxEmissionDay> = IndexMap::new();

    for generator in report.emitting_generators() {
        for (date, emission) in daily_emissions(generator, reference_data) {
            let candidate = MaxEmissionDay {
                name: generator.name().to_string(),
                date,
                emission,
            };
            match by_date.entry(date) {
                Entry::Occupied(mut current) => {
                    if emission > current.get().emission {
                        current.insert(candidate);
                    }
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(candidate);
                }
            }
        }
    }

    by_date.sort_keys();

    MaxEmissionGenerators {
        days: by_date.into_values().collect(),
    }
}

/// Zero or vanishingly small net generation leaves the heat rate undefined.
pub fn actual_heat_rate(generator: &CoalGenerator) -> Result<f64, ComputationError> {
    let heat_rate = generator.total_heat_input / generator.actual_net_generation;
    if !heat_rate.is_finite() {
        return Err(ComputationError::UndefinedHeatRate {
            generator: generator.name.clone(),
            actual_net_generation: generator.actual_net_generation,
        });
    }

    Ok(heat_rate)
}

/// Heat rates for every coal generator that has one. Generators without a defined heat rate
/// are returned as errors instead of rows.
pub fn calculate_actual_heat_rates(
    report: &GenerationReport,
) -> (ActualHeatRates, Vec<ComputationError>) {
    let mut heat_rates = vec![];
    let mut errors = vec![];

    for generator in &report.coal.generators {
        match actual_heat_rate(generator) {
            Ok(heat_rate) => heat_rates.push(ActualHeatRate {
                name: generator.name.clone(),
                heat_rate,
            }),
            Err(error) => errors.push(error),
        }
    }

    (ActualHeatRates { heat_rates }, errors)
}
