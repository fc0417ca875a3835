use constq::spectrum::fourier::{complex_transform, real_transform, Direction};
use constq::{ConstQ, ConstQConfig, KernelTable};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_fft(c: &mut Criterion) {
    let mut group = c.benchmark_group("fft");

    for &n in &[1024usize, 4096, 16384] {
        let complex: Vec<f32> = (0..n << 1).map(|i| (i as f32 * 0.01).sin()).collect();
        group.bench_with_input(BenchmarkId::new("complex_round_trip", n), &complex, |b, data| {
            let mut buf = data.clone();
            b.iter(|| {
                complex_transform(black_box(&mut buf), n, Direction::Forward);
                complex_transform(black_box(&mut buf), n, Direction::Inverse);
            });
        });

        let mut real: Vec<f32> = (0..n).map(|i| (i as f32 * 0.01).sin()).collect();
        real.extend_from_slice(&[0.0, 0.0]);
        group.bench_with_input(BenchmarkId::new("real_round_trip", n), &real, |b, data| {
            let mut buf = data.clone();
            b.iter(|| {
                real_transform(black_box(&mut buf), n, Direction::Forward);
                real_transform(black_box(&mut buf), n, Direction::Inverse);
            });
        });
    }

    group.finish();
}

fn bench_kernels(c: &mut Criterion) {
    let config = ConstQConfig::default();
    c.bench_function("kernel_table_build", |b| {
        b.iter(|| KernelTable::build(black_box(&config)))
    });
}

fn bench_transform(c: &mut Criterion) {
    let mut cq = ConstQ::new();
    cq.create_kernels().expect("default configuration is valid");
    let input: Vec<f32> = (0..4096)
        .map(|n| (2.0 * std::f32::consts::PI * 440.0 * n as f32 / 44100.0).sin())
        .collect();
    let mut output = vec![0.0f32; cq.num_kernels().unwrap_or(0)];

    c.bench_function("constq_transform_4096", |b| {
        b.iter(|| cq.transform(black_box(&input), 0, input.len(), &mut output, 0))
    });
}

criterion_group!(benches, bench_fft, bench_kernels, bench_transform);
criterion_main!(benches);
