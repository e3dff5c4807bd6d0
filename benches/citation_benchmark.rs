//! Benchmarks for per-turn prompt work.
//!
//! Run with: cargo bench
//!
//! Uses a synthetic document so the numbers do not depend on PDFium.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use docchat::chat::{parse_citation, SystemPrompt, DEFAULT_PERSONA};
use docchat::model::{DocumentContext, Page};

/// Creates a context with the given number of text-only pages.
fn create_test_context(page_count: u32) -> DocumentContext {
    let mut ctx = DocumentContext::empty();
    for n in 1..=page_count {
        let text = format!(
            "Page {} - benchmark text about color models, typography and layout grids.",
            n
        )
        .repeat(20);
        ctx.push_page(Page::new(n, text));
    }
    ctx
}

fn bench_parse_citation(c: &mut Criterion) {
    let short = "Use CMYK for print work [PAGE: 12]";
    let long = format!("{} [PAGE: 87]", "Long answer without any tag. ".repeat(200));
    let none = "Long answer without any tag. ".repeat(200);

    let mut group = c.benchmark_group("parse_citation");
    group.bench_function("short", |b| b.iter(|| parse_citation(black_box(short))));
    group.bench_function("tag_at_end", |b| b.iter(|| parse_citation(black_box(&long))));
    group.bench_function("no_tag", |b| b.iter(|| parse_citation(black_box(&none))));
    group.finish();
}

fn bench_system_prompt(c: &mut Criterion) {
    let mut group = c.benchmark_group("system_prompt");
    for pages in [10u32, 100] {
        let ctx = create_test_context(pages);
        group.bench_function(format!("{}_pages", pages), |b| {
            b.iter(|| SystemPrompt::build(black_box(DEFAULT_PERSONA), black_box(&ctx)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse_citation, bench_system_prompt);
criterion_main!(benches);
