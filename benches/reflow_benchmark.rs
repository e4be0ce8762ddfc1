//! Benchmarks for reflow and analysis performance.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use pagereflow::{
    analyze, AnalyzeOptions, Document, Edit, FlowUnit, PageGeometry, Paginator, ReflowEngine,
    Report, Sample, TraceEvent, TraceKind, TraceRecorder,
};

/// Creates a synthetic document with the given number of paragraphs.
fn create_document(paragraphs: usize) -> Document {
    let mut doc = Document::new();
    for i in 0..paragraphs {
        if i % 15 == 0 {
            doc.push(FlowUnit::heading(format!("Section {}", i / 15 + 1), 2));
        }
        doc.push(FlowUnit::paragraph(
            "Benchmark content for pagination reflow measurement. ".repeat(2 + i % 7),
        ));
        if i % 40 == 20 {
            doc.push(FlowUnit::table(180.0));
        }
    }
    doc
}

/// Creates a report shaped like a long watch session.
fn create_report(samples: usize) -> Report {
    let samples = (0..samples)
        .map(|i| Sample {
            page_count_dom: Some(40.0 + (i / 500) as f64),
            page_count_doc: Some(40.0),
            max_scroll_ratio: Some(1.0),
            overflow_active: Some(false),
        })
        .collect();
    let trace = (0..5_000)
        .map(|i| {
            let kind = if i % 2 == 0 {
                TraceKind::Split
            } else {
                TraceKind::PullUp
            };
            TraceEvent::new(kind, Some(i as f64 * 37.5))
        })
        .collect();
    Report::new(samples, trace)
}

/// Benchmark a full layout from scratch.
fn bench_initial_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("initial_layout");

    for paragraphs in [100, 1000].iter() {
        let doc = create_document(*paragraphs);

        group.bench_function(format!("{}_paragraphs", paragraphs), |b| {
            b.iter(|| pagereflow::paginate(black_box(&doc), PageGeometry::letter()).unwrap());
        });
    }

    group.finish();
}

/// Benchmark one keystroke against an already laid out document.
fn bench_incremental_pass(c: &mut Criterion) {
    let doc = create_document(1000);
    let mut engine = ReflowEngine::new(PageGeometry::letter()).unwrap();
    engine.reflow(&doc, &mut TraceRecorder::new()).unwrap();

    c.bench_function("keystroke_pass", |b| {
        b.iter_batched(
            || (doc.clone(), engine.clone()),
            |(mut doc, mut engine)| {
                let edit = Edit::AppendText {
                    index: 500,
                    text: "x".into(),
                };
                doc.apply(&edit).unwrap();
                engine.notify_edit(&edit);
                engine
                    .reflow(black_box(&doc), &mut TraceRecorder::new())
                    .unwrap()
            },
            BatchSize::LargeInput,
        );
    });
}

/// Benchmark analysis of a long session report.
fn bench_analyze(c: &mut Criterion) {
    let report = create_report(20_000);
    let options = AnalyzeOptions::default();

    c.bench_function("analyze_20k_samples", |b| {
        b.iter(|| analyze(black_box(&report), &options));
    });
}

criterion_group!(
    benches,
    bench_initial_layout,
    bench_incremental_pass,
    bench_analyze,
);
criterion_main!(benches);
