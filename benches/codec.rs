//! Registry codec benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use wine_registry::export::{to_regedit_string, to_wine_string};
use wine_registry::parser::parse_str;
use wine_registry::value::{decode, encode};
use wine_registry::{Filetime, Format, Hive, ValueData};

/// Builds a machine hive with `width` keys per level, `depth` levels deep.
fn synthetic_hive(depth: usize, width: usize) -> Hive {
    fn fill(hive: &mut Hive, parent: wine_registry::KeyId, depth: usize, width: usize) {
        if depth == 0 {
            return;
        }
        for i in 0..width {
            let key = hive.add(parent, &format!("Key {}", i));
            hive.node_mut(key).set_modified(Filetime(0x1dc3e01c855469c));
            hive.set_value(key, "Name", ValueData::String(format!("value {}", i)));
            hive.set_value(key, "Flags", ValueData::Dword(i as u32));
            hive.set_value(key, "Blob", ValueData::Binary(vec![0xab; 64]));
            hive.set_value(
                key,
                "Paths",
                ValueData::MultiString(vec![r"C:\Foo".into(), r"C:\Bar".into()]),
            );
            fill(hive, key, depth - 1, width);
        }
    }

    let mut hive = Hive::new("HKEY_LOCAL_MACHINE");
    let root = hive.root();
    fill(&mut hive, root, depth, width);
    hive
}

fn bench_values(c: &mut Criterion) {
    let mut group = c.benchmark_group("value");

    let samples = [
        ("string", ValueData::String(r#""C:\Foo" -help"#.into())),
        ("dword", ValueData::Dword(0xdeadbeef)),
        ("binary_256", ValueData::Binary(vec![0u8; 256])),
        (
            "multi_string",
            ValueData::MultiString(vec![r"C:\Foo".into(), r"C:\Bar".into()]),
        ),
    ];

    for (name, data) in &samples {
        group.bench_function(BenchmarkId::new("encode", name), |b| {
            b.iter(|| black_box(encode(black_box(data), Format::Regedit)));
        });

        let encoded = encode(data, Format::Wine);
        let raw = match encoded.payload {
            wine_registry::value::Payload::Quoted(ref text) => format!("{}{}", encoded.prefix(), text),
            wine_registry::value::Payload::Dword(d) => format!("{}{:08x}", encoded.prefix(), d),
            wine_registry::value::Payload::Hex(ref bytes) => format!(
                "{}{}",
                encoded.prefix(),
                bytes.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(",")
            ),
        };
        group.bench_function(BenchmarkId::new("decode", name), |b| {
            b.iter(|| black_box(decode(black_box(&raw)).unwrap()));
        });
    }

    group.finish();
}

fn bench_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("file");

    for (depth, width) in [(2, 10), (3, 10)] {
        let hive = synthetic_hive(depth, width);
        let wine = to_wine_string(&hive).unwrap();
        let regedit = to_regedit_string(&hive).unwrap();
        let label = format!("{}x{}", depth, width);

        group.throughput(Throughput::Bytes(wine.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_wine", &label), &wine, |b, text| {
            b.iter(|| black_box(parse_str(black_box(text)).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("export_wine", &label), &hive, |b, hive| {
            b.iter(|| black_box(to_wine_string(black_box(hive)).unwrap()));
        });

        group.throughput(Throughput::Bytes(regedit.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_regedit", &label), &regedit, |b, text| {
            b.iter(|| black_box(parse_str(black_box(text)).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("export_regedit", &label), &hive, |b, hive| {
            b.iter(|| black_box(to_regedit_string(black_box(hive)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_values, bench_files);
criterion_main!(benches);
