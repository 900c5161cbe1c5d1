use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ground_speed_estimation::features::OrbExtractor;
use ground_speed_estimation::matcher::match_descriptors;
use ground_speed_estimation::synthetic::shifted_pair;
use ground_speed_estimation::{EstimatorConfig, Pipeline};

fn bench_detect_and_compute(c: &mut Criterion) {
    let (img, _) = shifted_pair(640, 480, 0, 0, 1);
    let extractor = OrbExtractor::default();

    c.bench_function("detect_and_compute", |b| {
        b.iter(|| extractor.detect_and_compute(black_box(&img)))
    });
}

fn bench_match_descriptors(c: &mut Criterion) {
    let (img1, img2) = shifted_pair(640, 480, 28, 4, 1);
    let extractor = OrbExtractor::default();
    let f1 = extractor.detect_and_compute(&img1);
    let f2 = extractor.detect_and_compute(&img2);

    c.bench_function("match_descriptors", |b| {
        b.iter(|| match_descriptors(black_box(&f1.descriptors), black_box(&f2.descriptors)))
    });
}

fn bench_estimate_images(c: &mut Criterion) {
    let (img1, img2) = shifted_pair(640, 480, 28, 4, 1);
    let pipeline = Pipeline::new(&EstimatorConfig::default());

    c.bench_function("estimate_images", |b| {
        b.iter(|| pipeline.estimate_images(black_box(&img1), black_box(&img2), 9.0))
    });
}

criterion_group!(
    benches,
    bench_detect_and_compute,
    bench_match_descriptors,
    bench_estimate_images
);
criterion_main!(benches);
