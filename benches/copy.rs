use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use fastcopy::space::AddressSpace;
use fastcopy::{
    Direction, LargeLine, NoPrefetch, SliceSink, SliceSource, SmallLine, copy_forward, engine,
};
use std::time::Duration;

#[derive(Clone)]
struct CopyCase {
    label: String,
    len: usize,
    src_off: usize,
    dst_off: usize,
}

fn configure_group_for_len(
    group: &mut criterion::BenchmarkGroup<'_, criterion::measurement::WallTime>,
    len: usize,
) {
    if len >= 1 << 20 {
        group.sample_size(20);
        group.warm_up_time(Duration::from_millis(300));
        group.measurement_time(Duration::from_millis(900));
    } else if len >= 1 << 16 {
        group.sample_size(30);
        group.warm_up_time(Duration::from_millis(250));
        group.measurement_time(Duration::from_millis(700));
    } else {
        group.sample_size(40);
        group.warm_up_time(Duration::from_millis(200));
        group.measurement_time(Duration::from_millis(500));
    }
}

fn copy_benches(c: &mut Criterion) {
    let mut cases = Vec::new();

    // Size sweep covers the small, fast-path and bulk thresholds.
    let sizes = [
        1usize, 3, 7, 8, 16, 17, 31, 32, 33, 63, 64, 65, 127, 128, 255, 256, 1023, 1024, 4095,
        4096, 65536, 262144, 1 << 20,
    ];
    for len in sizes {
        cases.push(CopyCase {
            label: format!("size_{len}"),
            len,
            src_off: 0,
            dst_off: 0,
        });
    }

    // One case per alignment class at representative sizes.
    let align_sizes = [64usize, 257, 4096];
    let align_pairs = [(0usize, 0usize), (1, 1), (1, 0), (2, 0), (3, 0)];
    for len in align_sizes {
        for (src_off, dst_off) in align_pairs {
            cases.push(CopyCase {
                label: format!("align_len{len}_s{src_off}_d{dst_off}"),
                len,
                src_off,
                dst_off,
            });
        }
    }

    let mut group = c.benchmark_group("copy_forward");

    for case in &cases {
        let len = case.len;
        let alloc_len = len + 64;
        let mut src = vec![0u8; alloc_len];
        let mut dst = vec![0u8; alloc_len];
        for (i, byte) in src.iter_mut().enumerate() {
            *byte = (i % 251) as u8;
        }
        let src = &src[case.src_off..case.src_off + len];
        let dst = &mut dst[case.dst_off..case.dst_off + len];

        configure_group_for_len(&mut group, len);
        group.throughput(Throughput::Bytes(len as u64));

        group.bench_with_input(BenchmarkId::new("std", &case.label), &len, |b, _| {
            b.iter(|| {
                dst.copy_from_slice(black_box(src));
                black_box(&dst[0]);
            });
        });

        group.bench_with_input(BenchmarkId::new("fastcopy", &case.label), &len, |b, _| {
            b.iter(|| {
                black_box(copy_forward(black_box(&mut *dst), black_box(src)));
            });
        });

        group.bench_with_input(BenchmarkId::new("small-line", &case.label), &len, |b, &n| {
            b.iter(|| {
                let mut from = SliceSource::new(src);
                let mut to = SliceSink::new(&mut *dst);
                let (s, d) = (from.addr(), to.addr());
                black_box(engine::copy::<SmallLine, _, _>(
                    Direction::Forward,
                    &mut to,
                    d,
                    &mut from,
                    s,
                    n,
                ));
            });
        });

        group.bench_with_input(BenchmarkId::new("no-prefetch", &case.label), &len, |b, &n| {
            b.iter(|| {
                let mut from = SliceSource::new(src);
                let mut to = SliceSink::new(&mut *dst);
                let (s, d) = (from.addr(), to.addr());
                black_box(engine::copy::<NoPrefetch, _, _>(
                    Direction::Forward,
                    &mut to,
                    d,
                    &mut from,
                    s,
                    n,
                ));
            });
        });
    }

    group.finish();
}

fn restricted_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("copy_from_restricted");

    for len in [64usize, 4096, 65536] {
        let base = 0x1000_0000;
        let mut user = AddressSpace::new(base, len + 64);
        let data: Vec<u8> = (0..len + 64).map(|i| (i % 251) as u8).collect();
        user.write(base, &data);
        let mut buf = vec![0u8; len];

        configure_group_for_len(&mut group, len);
        group.throughput(Throughput::Bytes(len as u64));

        for src_off in [0usize, 1] {
            let label = format!("len{len}_s{src_off}");
            group.bench_with_input(BenchmarkId::new("large-line", &label), &len, |b, &n| {
                b.iter(|| {
                    let mut to = SliceSink::new(&mut buf);
                    let d = to.addr();
                    black_box(engine::copy::<LargeLine, _, _>(
                        Direction::FromRestricted,
                        &mut to,
                        d,
                        &mut user,
                        base + src_off,
                        n,
                    ));
                    user.clear_prefetches();
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, copy_benches, restricted_benches);
criterion_main!(benches);
