//! Benchmarks for decomposition and the forecasting models.
//!
//! Covers: decompose, SeasonalNaiveModel, TrendExtrapolationModel,
//! HoltWintersModel, EnsembleModel.

use chrono::NaiveDate;
use common::{
    CombinationRule, ForecastModel, ForecastingConfig, IntervalLevels, ModelChoice,
    OperatingCalendar, OrderTimeSeries, TimeBucket,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use decomposition::decompose;
use models::{create_model, HoltWintersModel, SeasonalNaiveModel, TrendExtrapolationModel, TrendMethod};

fn levels() -> IntervalLevels {
    ForecastingConfig::default().interval_levels().unwrap()
}

/// Hourly counts over a 12-bucket day with a weekly swing.
fn generate_demand(days: usize) -> OrderTimeSeries {
    let calendar = OperatingCalendar::from_config(&Default::default()).unwrap();
    let first = TimeBucket::new(NaiveDate::from_ymd_opt(2016, 7, 4).unwrap(), 0);
    let counts = (0..days * 12)
        .map(|t| {
            let slot = t % 12;
            let weekday = (t / 12) % 7;
            let lunch = if (1..3).contains(&slot) { 6 } else { 0 };
            let dinner = if (7..10).contains(&slot) { 9 } else { 0 };
            let weekend = if weekday >= 5 { 3 } else { 0 };
            (2 + lunch + dinner + weekend + (t * 7919) % 3) as u32
        })
        .collect();
    OrderTimeSeries::new(calendar, first, 1, counts).unwrap()
}

fn bench_decompose(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompose");

    for weeks in [2, 8, 16] {
        let values = generate_demand(weeks * 7).values();
        group.bench_with_input(BenchmarkId::from_parameter(weeks), &values, |b, values| {
            b.iter(|| decompose(black_box(values), &[12, 84]))
        });
    }

    group.finish();
}

fn bench_seasonal_naive(c: &mut Criterion) {
    let series = generate_demand(56);
    let model = SeasonalNaiveModel::new(vec![12, 84], levels());
    c.bench_function("seasonal_naive_fit_predict", |b| {
        b.iter(|| {
            let fitted = model.fit(black_box(&series)).unwrap();
            fitted.predict(series.last(), 1)
        })
    });
}

fn bench_trend(c: &mut Criterion) {
    let mut group = c.benchmark_group("trend_fit_predict");
    let series = generate_demand(56);

    for (name, method) in [("linear", TrendMethod::Linear), ("auto_ets", TrendMethod::AutoEts)] {
        let model = TrendExtrapolationModel::new(vec![12, 84], method, None, levels()).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| {
                let fitted = model.fit(black_box(&series)).unwrap();
                fitted.predict(series.last(), 1)
            })
        });
    }

    group.finish();
}

fn bench_holt_winters(c: &mut Criterion) {
    let mut group = c.benchmark_group("holt_winters_fit_predict");
    let model = HoltWintersModel::new(7, levels()).unwrap();

    for weeks in [4, 8, 16] {
        let horizontal = generate_demand(weeks * 7).select(8, 12, weeks * 7).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(weeks), &horizontal, |b, series| {
            b.iter(|| {
                let fitted = model.fit(black_box(series)).unwrap();
                fitted.predict(series.last(), 1)
            })
        });
    }

    group.finish();
}

fn bench_ensemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("ensemble_fit_predict");
    let series = generate_demand(56);

    for (name, combination) in [
        ("select_best", CombinationRule::SelectBest),
        ("inverse_error_weighted", CombinationRule::InverseErrorWeighted),
    ] {
        let config = ForecastingConfig {
            combination,
            ..ForecastingConfig::default()
        };
        let model = create_model(ModelChoice::Ensemble, &config, &[12, 84]).unwrap();
        group.sample_size(10);
        group.bench_function(name, |b| {
            b.iter(|| {
                let fitted = model.fit(black_box(&series)).unwrap();
                fitted.predict(series.last(), 1)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_decompose,
    bench_seasonal_naive,
    bench_trend,
    bench_holt_winters,
    bench_ensemble
);
criterion_main!(benches);
