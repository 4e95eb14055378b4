//! Benchmark the per-frame hot path: PCM decode, prepare, encode.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use hushmic::audio::pcm;
use hushmic::denoise::{self, PadMode, ReceptiveField};

fn bench_prepare(c: &mut Criterion) {
    let receptive = ReceptiveField::new(40, 20);
    let full_frame: Vec<f32> = (0..320).map(|i| (i as f32 * 0.01).sin()).collect();
    let short_frame: Vec<f32> = full_frame[..32].to_vec();

    c.bench_function("prepare_full_frame_run_as_is", |b| {
        b.iter(|| {
            denoise::prepare(
                black_box(full_frame.clone()),
                &receptive,
                16,
                PadMode::Reflect,
            )
        })
    });

    c.bench_function("prepare_short_frame_pad", |b| {
        b.iter(|| {
            denoise::prepare(
                black_box(short_frame.clone()),
                &receptive,
                16,
                PadMode::Reflect,
            )
        })
    });
}

fn bench_pcm(c: &mut Criterion) {
    let samples = vec![1234i16; 320];
    let bytes = pcm::i16_to_bytes(&samples);
    let floats = pcm::decode_frame(&bytes);

    c.bench_function("pcm_decode_320", |b| {
        b.iter(|| pcm::decode_frame(black_box(&bytes)))
    });

    c.bench_function("pcm_encode_320", |b| {
        b.iter(|| pcm::encode_frame(black_box(&floats)))
    });
}

criterion_group!(benches, bench_prepare, bench_pcm);
criterion_main!(benches);
