use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use luby_fec::{CodecConfig, DegreeDistribution, Encoder, PeelingDecoder, Symbol};

fn seeded(k: usize, block_size: usize) -> (Encoder, PeelingDecoder) {
    let mut cfg = CodecConfig::new(k, block_size);
    cfg.master_seed = Some(7);
    let enc = Encoder::with_config(&cfg).expect("valid config");
    let dec = PeelingDecoder::with_config(&cfg).expect("valid config");
    (enc, dec)
}

fn bench_sampler(c: &mut Criterion) {
    let dist = DegreeDistribution::new(1000, 0.12, 0.01).expect("valid params");
    let mut seed = 0u64;
    c.bench_function("soliton_sample_k1000", |b| {
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(dist.sample(black_box(seed)))
        })
    });
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("lt_codec");
    for &k in &[100usize, 1000] {
        let (mut enc, dec) = seeded(k, 32);
        let msg: Vec<u8> = (0..k * 32).map(|i| i as u8).collect();
        enc.load(&msg).expect("non-empty message");

        group.bench_with_input(BenchmarkId::new("encode_one", k), &k, |b, _| {
            b.iter(|| black_box(enc.encode_one().expect("loaded")))
        });

        let batch: Vec<Symbol> = (0..dec.quota()).map(|_| enc.encode_one().expect("loaded")).collect();
        group.bench_with_input(BenchmarkId::new("peel_quota", k), &k, |b, _| {
            // Stalled batches still exercise the full ripple.
            b.iter(|| black_box(dec.decode_batch(batch.clone()).is_ok()))
        });
    }
    group.finish();
}

criterion_group!(lt, bench_sampler, bench_codec);
criterion_main!(lt);
