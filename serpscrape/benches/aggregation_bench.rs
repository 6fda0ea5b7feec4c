//! Benchmarks for page sequencing, extraction and aggregation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serpscrape::core::RunParams;
use serpscrape::pipeline::{BatchRunner, PageSequencer, QueryAggregator};
use serpscrape::serp::{Extractor, SerpExtractor};
use serpscrape::testing::{raw_results, serp_html, PageExtractor, ScriptedFetcher};
use std::sync::Arc;

fn sequencer_benchmark(c: &mut Criterion) {
    c.bench_function("next_page", |b| {
        b.iter(|| PageSequencer::next_page(black_box(130), black_box(10), black_box(10)))
    });
}

fn extractor_benchmark(c: &mut Criterion) {
    let html = serp_html(&raw_results("bench", 100));
    let extractor = SerpExtractor::default();

    c.bench_function("extract_100", |b| {
        b.iter(|| extractor.extract(black_box(&html)))
    });
}

fn aggregation_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let options = RunParams::new()
        .with_limit(1000)
        .with_pages(10)
        .validate()
        .unwrap();
    let keywords = vec!["bench".to_string()];

    c.bench_function("aggregate_10_pages", |b| {
        b.iter(|| {
            let mut fetcher = ScriptedFetcher::new();
            for page in 0..10 {
                fetcher = fetcher.with_page("bench", raw_results(&format!("p{page}"), 100));
            }
            let runner = BatchRunner::new(QueryAggregator::new(
                Arc::new(fetcher),
                Arc::new(PageExtractor),
            ));
            runtime.block_on(runner.run(black_box(&keywords), &options))
        })
    });
}

criterion_group!(
    benches,
    sequencer_benchmark,
    extractor_benchmark,
    aggregation_benchmark
);
criterion_main!(benches);
