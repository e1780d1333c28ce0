use criterion::{criterion_group, criterion_main, Criterion};
use vaxline::params::Parameters;
use vaxline::projector::project;
use vaxline::runner::run_pipeline;
use vaxline::supply::{SupplyRecord, SupplySeries};

static MANUFACTURERS: [&str; 5] = ["Pfizer", "Sinovac", "Cansino", "AZ", "Sputnik"];

// Weekly shipments for five manufacturers across the whole horizon.
fn reference_supply(parameters: &Parameters) -> Vec<SupplySeries> {
    MANUFACTURERS
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let records = (0..=parameters.horizon_days)
                .step_by(7)
                .map(|day| SupplyRecord {
                    date: parameters.campaign_date(day),
                    doses: 10_000 * (index as u64 + 1),
                })
                .collect();
            SupplySeries::new(*name, records)
        })
        .collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let parameters = Parameters::default();
    let supply = reference_supply(&parameters);

    c.bench_function("reference trajectory", |bencher| {
        bencher.iter_with_large_drop(|| project(&parameters).unwrap())
    });

    c.bench_function("full pipeline", |bencher| {
        bencher.iter_with_large_drop(|| run_pipeline(&parameters, &supply).unwrap())
    });
}

criterion_group!(projection_benches, criterion_benchmark);
criterion_main!(projection_benches);
