use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rill_core::{Category, ComponentRegistry, HandleTable};

fn bench_insert(c: &mut Criterion) {
    c.bench_function("handle_table_insert", |b| {
        let table = HandleTable::new();
        b.iter(|| table.insert(black_box(7u64)));
    });
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("handle_table_get");

    for size in [1_000usize, 100_000] {
        let table = HandleTable::new();
        let handles: Vec<_> = (0..size as u64).map(|i| table.insert(i)).collect();
        group.bench_with_input(BenchmarkId::new("live", size), &handles, |b, handles| {
            let mut i = 0;
            b.iter(|| {
                i = (i + 1) % handles.len();
                table.get(black_box(handles[i]))
            });
        });
    }

    group.finish();
}

fn bench_registry_round_trip(c: &mut Criterion) {
    let registry = ComponentRegistry::new();

    c.bench_function("registry_register_remove", |b| {
        b.iter(|| {
            let h = registry.register(Category::Data, black_box(1u64));
            registry.remove(Category::Data, h).unwrap();
        });
    });

    let h = registry.register(Category::State, 0u64);
    c.bench_function("registry_inspect", |b| {
        b.iter(|| registry.inspect(Category::State, black_box(h), |v: &u64| *v).unwrap());
    });
}

criterion_group!(benches, bench_insert, bench_get, bench_registry_round_trip);
criterion_main!(benches);
