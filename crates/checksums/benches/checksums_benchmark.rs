//! Throughput of the rolling and strong checksums on chunk-sized inputs.

use checksums::{HashAlgorithm, RollingChecksumAlgorithm};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::{Rng, SeedableRng, rngs::StdRng};

fn random_data(len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    (0..len).map(|_| rng.r#gen()).collect()
}

fn bench_rolling(c: &mut Criterion) {
    let data = random_data(64 * 1024);
    let mut group = c.benchmark_group("rolling");
    for algorithm in RollingChecksumAlgorithm::ALL {
        for window in [128usize, 2048, 31_744] {
            group.throughput(Throughput::Bytes(window as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("{algorithm}/calculate"), window),
                &window,
                |b, &window| b.iter(|| algorithm.calculate(black_box(&data[..window]))),
            );
        }

        let window = 2048;
        group.throughput(Throughput::Bytes((data.len() - window) as u64));
        group.bench_function(format!("{algorithm}/rotate"), |b| {
            b.iter(|| {
                let mut sum = algorithm.calculate(&data[..window]);
                for start in 1..=data.len() - window {
                    sum = algorithm.rotate(sum, data[start - 1], data[start + window - 1], window);
                }
                black_box(sum)
            });
        });
    }
    group.finish();
}

fn bench_strong(c: &mut Criterion) {
    let data = random_data(2048);
    let mut group = c.benchmark_group("strong");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for algorithm in HashAlgorithm::ALL {
        group.bench_function(algorithm.name(), |b| {
            b.iter(|| algorithm.compute(black_box(&data)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rolling, bench_strong);
criterion_main!(benches);
