//! Normalization and join throughput over a synthetic full-world dataset
//! (every canonical country, 1960-2023, three indicators).
//!
//! Run with: `cargo bench --bench integrate`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use electricity_etl::data::{integrate, CountryAliases, Indicator, Normalizer, RawObservation};

fn synthetic_observations(aliases: &CountryAliases, salt: u32) -> Vec<RawObservation> {
    let mut observations = Vec::new();
    for (index, code) in aliases.canonical_codes().enumerate() {
        for year in 1960..2024 {
            let value = (index as u32 * 31 + year as u32 * 7 + salt) % 1000;
            observations.push(RawObservation {
                country_id: code.to_string(),
                country_name: None,
                year: year.to_string(),
                value: if value % 13 == 0 {
                    Some("..".to_string())
                } else {
                    Some(format!("{}.{}", value, salt))
                },
            });
        }
    }
    observations
}

fn bench_normalize_and_integrate(c: &mut Criterion) {
    let aliases = CountryAliases::iso_default();
    let inputs: Vec<(Indicator, Vec<RawObservation>)> = Indicator::ALL
        .into_iter()
        .zip(1..)
        .map(|(indicator, salt)| (indicator, synthetic_observations(&aliases, salt)))
        .collect();

    let total: usize = inputs.iter().map(|(_, observations)| observations.len()).sum();
    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(total as u64));

    group.bench_function("normalize_three_sources", |b| {
        b.iter(|| {
            let normalizer = Normalizer::new(&aliases);
            for (indicator, observations) in &inputs {
                black_box(normalizer.normalize(*indicator, observations.clone()));
            }
        })
    });

    let normalizer = Normalizer::new(&aliases);
    let series: Vec<_> = inputs
        .iter()
        .map(|(indicator, observations)| normalizer.normalize(*indicator, observations.clone()).0)
        .collect();

    group.bench_function("integrate_three_series", |b| {
        b.iter(|| black_box(integrate(black_box(&series), &aliases)))
    });
    group.finish();
}

criterion_group!(benches, bench_normalize_and_integrate);
criterion_main!(benches);
