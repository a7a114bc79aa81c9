use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use freplace_rs::replace::Replacer;

fn generate_html(size: usize) -> Vec<u8> {
    let line = b"<p class=\"note\">Tom & Jerry's <b>show</b></p>\n";
    line.iter().copied().cycle().take(size).collect()
}

fn generate_plain(size: usize) -> Vec<u8> {
    let line = b"the quick brown fox jumps over the lazy dog\n";
    line.iter().copied().cycle().take(size).collect()
}

fn html_escaper() -> Replacer {
    Replacer::new(&[
        "&", "&amp;", "<", "&lt;", ">", "&gt;", "\"", "&quot;", "'", "&#39;",
    ])
}

fn bench_generic(c: &mut Criterion) {
    let mut group = c.benchmark_group("replace_generic");
    let r = html_escaper();
    for size_mb in [1, 10] {
        let data = generate_html(size_mb * 1024 * 1024);
        group.bench_with_input(
            BenchmarkId::new("html_escape", format!("{}MB", size_mb)),
            &data,
            |b, data| b.iter(|| r.replace_bytes(black_box(data)).len()),
        );
    }
    group.finish();
}

fn bench_skip(c: &mut Criterion) {
    let mut group = c.benchmark_group("replace_skip");
    let data = generate_plain(10 * 1024 * 1024);

    // One start byte: memchr jumps between candidates.
    let one = Replacer::new(&["zebra", "horse"]);
    group.bench_function("memchr_10MB", |b| {
        b.iter(|| one.replace_bytes(black_box(&data)).len())
    });

    // Many start bytes: per-byte root check.
    let many = Replacer::new(&[
        "qz", "1", "wx", "2", "vv", "3", "kk", "4", "jj", "5",
    ]);
    group.bench_function("table_10MB", |b| {
        b.iter(|| many.replace_bytes(black_box(&data)).len())
    });
    group.finish();
}

fn bench_byte_table(c: &mut Criterion) {
    let data = generate_plain(10 * 1024 * 1024);
    let r = Replacer::new(&["a", "A", "e", "E", "i", "I", "o", "O", "u", "U"]);
    c.bench_function("replace_byte_table_10MB", |b| {
        b.iter(|| r.replace(black_box(data.clone())).len())
    });
}

fn bench_write_to(c: &mut Criterion) {
    let data = generate_html(10 * 1024 * 1024);
    let r = html_escaper();
    let mut out = Vec::with_capacity(data.len() * 2);
    c.bench_function("write_to_html_10MB", |b| {
        b.iter(|| {
            out.clear();
            r.write_to(&mut out, black_box(&data)).unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_generic,
    bench_skip,
    bench_byte_table,
    bench_write_to
);
criterion_main!(benches);
