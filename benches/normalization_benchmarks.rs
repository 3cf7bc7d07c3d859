//! Benchmarks for text normalization, probe parsing, and SRT assembly.
//!
//! Run with: cargo bench

use std::collections::BTreeMap;
use std::hint::black_box;

use criterion::Criterion;
use vobsrt::probe::parse_probe_log;
use vobsrt::subtitle::{assemble, to_srt};
use vobsrt::text::{DEFAULT_MAX_LINE_LENGTH, clean_text, normalize, wrap_text};
use vobsrt::timeline::{SlotId, build_timeline};

const NOISY_LINE: &str =
    "  |t's n\u{f6}t what y\u{f3}u th|nk \u{2014} \u{201c}we\u{2019}re\u{201d} ~ almost there!!  <i>*</i> ";

fn probe_log(subtitles: usize) -> String {
    let mut log = String::new();
    for n in 0..subtitles {
        let start = n as f64 * 4.0;
        log.push_str(&format!(
            "[Parsed_showinfo_0 @ 0x1] n:{} pts:{} pts_time:{start:.3} fmt:yuva420p checksum:{:08X} plane_checksum:[1 2 3 4]\n",
            n * 2,
            (start * 1000.0) as u64,
            n + 1,
        ));
        log.push_str(&format!(
            "[Parsed_showinfo_0 @ 0x1] n:{} pts:{} pts_time:{:.3} fmt:yuva420p checksum:00000000 plane_checksum:[0 0 0 0]\n",
            n * 2 + 1,
            ((start + 2.5) * 1000.0) as u64,
            start + 2.5,
        ));
    }
    log
}

fn benchmark_cleaning(criterion: &mut Criterion) {
    criterion.bench_function("clean noisy line", |bencher| {
        bencher.iter(|| clean_text(black_box(NOISY_LINE)));
    });

    let cleaned = clean_text(NOISY_LINE);
    criterion.bench_function("wrap cleaned line", |bencher| {
        bencher.iter(|| wrap_text(black_box(&cleaned), black_box(DEFAULT_MAX_LINE_LENGTH)));
    });

    criterion.bench_function("normalize noisy line", |bencher| {
        bencher.iter(|| normalize(black_box(NOISY_LINE), DEFAULT_MAX_LINE_LENGTH));
    });
}

fn benchmark_probe_parsing(criterion: &mut Criterion) {
    let log = probe_log(1_500);

    criterion.bench_function("parse probe log (1500 subtitles)", |bencher| {
        bencher.iter(|| parse_probe_log(black_box(&log)));
    });

    let signals = parse_probe_log(&log);
    criterion.bench_function("build timeline (1500 subtitles)", |bencher| {
        bencher.iter(|| build_timeline(black_box(&signals)));
    });
}

fn benchmark_assembly(criterion: &mut Criterion) {
    let timeline = build_timeline(&parse_probe_log(&probe_log(1_500)));
    let texts: BTreeMap<SlotId, String> = timeline
        .iter()
        .filter(|entry| entry.slot.0 % 5 != 0)
        .map(|entry| (entry.slot, format!("Subtitle number {}", entry.slot.0)))
        .collect();

    criterion.bench_function("assemble and serialize (1500 subtitles)", |bencher| {
        bencher.iter(|| to_srt(&assemble(black_box(&timeline), black_box(&texts))));
    });
}

criterion::criterion_group!(
    benches,
    benchmark_cleaning,
    benchmark_probe_parsing,
    benchmark_assembly,
);
criterion::criterion_main!(benches);
