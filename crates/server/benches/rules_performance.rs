use criterion::{Criterion, criterion_group, criterion_main};
use disaster_ops::domain::{
    Channel, EMERGENCY_CHANNELS, Priority, Severity, ZoneStatus, evacuation_notice,
    evacuation_percentage, join_channels, location_matches, parse_channels,
};
use std::hint::black_box;

// CI-friendly benchmark configuration
fn is_ci_mode() -> bool {
    std::env::var("CI").is_ok() || std::env::var("QUICK_BENCH").is_ok()
}

fn zone_locations() -> Vec<String> {
    (0..500)
        .map(|i| match i % 4 {
            0 => format!("Downtown District {i}"),
            1 => format!("Riverside Block {i}"),
            2 => format!("North DOWNTOWN Sector {i}"),
            _ => format!("Harbor Front Pier {i}"),
        })
        .collect()
}

fn benchmark_zone_matching(c: &mut Criterion) {
    let zones = zone_locations();

    c.bench_function("location_matches_500_zones", |b| {
        b.iter(|| {
            let hits = zones
                .iter()
                .filter(|z| location_matches(black_box(z), black_box("downtown")))
                .count();
            black_box(hits);
        });
    });
}

fn benchmark_progress_rules(c: &mut Criterion) {
    c.bench_function("after_progress_and_percentage", |b| {
        b.iter(|| {
            for evacuated in (0..=1000).step_by(50) {
                let status = ZoneStatus::after_progress(black_box(evacuated), black_box(1000));
                let pct = evacuation_percentage(black_box(evacuated), black_box(1000));
                black_box((status, pct));
            }
        });
    });
}

fn benchmark_vocabulary_parsing(c: &mut Criterion) {
    c.bench_function("parse_severity", |b| {
        b.iter(|| {
            let parsed = black_box(" Critical ").parse::<Severity>();
            black_box(parsed)
        });
    });

    let stored = join_channels(&[
        Channel::Mobile,
        Channel::Radio,
        Channel::Tv,
        Channel::Sms,
        Channel::Email,
    ]);
    c.bench_function("parse_channels", |b| {
        b.iter(|| {
            let channels = parse_channels(black_box(&stored));
            black_box(channels)
        });
    });

    c.bench_function("join_emergency_channels", |b| {
        b.iter(|| black_box(join_channels(black_box(&EMERGENCY_CHANNELS))));
    });
}

fn benchmark_evacuation_notice(c: &mut Criterion) {
    c.bench_function("evacuation_notice", |b| {
        b.iter(|| {
            let notice = evacuation_notice(
                black_box("Downtown District"),
                black_box(Priority::Critical),
                black_box("Levee failure imminent"),
                black_box("12 hours"),
            );
            black_box(notice)
        });
    });
}

fn configured() -> Criterion {
    if is_ci_mode() {
        Criterion::default().sample_size(10)
    } else {
        Criterion::default()
    }
}

criterion_group!(
    name = benches;
    config = configured();
    targets = benchmark_zone_matching,
        benchmark_progress_rules,
        benchmark_vocabulary_parsing,
        benchmark_evacuation_notice
);
criterion_main!(benches);
