use std::io::Write;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use sheetmap::backend::{SheetBackend, WorkbookSource};
use sheetmap::projection::{project_rows, resolve_read_mapping};
use sheetmap::{
    CsvBackend, MemorySheet, ReadOptions, RecordDescriptor, SheetHandleOptions, SheetRecord, Value,
};

#[derive(Debug, Default)]
struct Order {
    id: i64,
    status: String,
    quantity: i32,
    shipped: bool,
}

impl SheetRecord for Order {
    fn describe(record: &mut RecordDescriptor<Self>) {
        record.field("id", |o| &o.id, |o| &mut o.id);
        record.field("status", |o| &o.status, |o| &mut o.status);
        record.field("quantity", |o| &o.quantity, |o| &mut o.quantity);
        record.field("shipped", |o| &o.shipped, |o| &mut o.shipped);
    }
}

fn generate_orders(rows: usize) -> MemorySheet {
    let header = ["订单号", "状态", "数量", "已发货"].map(Value::from).to_vec();
    let body = (0..rows).map(|i| {
        let status = match i % 3 {
            0 => "shipped",
            1 => "pending",
            _ => "processing",
        };
        vec![
            Value::from(i.to_string()),
            Value::from(status),
            Value::from((i % 50) as i64),
            Value::from(i % 3 == 0),
        ]
    });
    MemorySheet::from_rows("Orders", std::iter::once(header).chain(body))
}

fn generate_csv(rows: usize) -> Vec<u8> {
    let mut bytes = Vec::new();
    writeln!(bytes, "订单号,状态,数量,已发货").expect("header");
    for i in 0..rows {
        writeln!(bytes, "{i},pending,{},{}", i % 50, i % 2 == 0).expect("row");
    }
    bytes
}

fn order_options() -> ReadOptions {
    let mut options = ReadOptions::new();
    options
        .add_column("id", "订单号")
        .and_then(|options| options.add_column("status", "状态"))
        .and_then(|options| options.add_column("quantity", "数量"))
        .and_then(|options| options.add_column("shipped", "已发货"))
        .expect("register columns");
    options
}

fn bench_projection(c: &mut Criterion) {
    let sheet = generate_orders(20_000);
    let csv = generate_csv(20_000);
    let options = order_options();
    let descriptor = RecordDescriptor::<Order>::of();
    let accessors = descriptor.accessors();

    let mut group = c.benchmark_group("projection");

    group.bench_function("typed_rows", |b| {
        b.iter(|| {
            let mapping = resolve_read_mapping(&sheet, &options).expect("mapping");
            project_rows(&sheet, &options, &mapping, Order::default, |order, profile, value| {
                match accessors.get(profile.name()) {
                    Some(field) => field.set(order, value),
                    None => Ok(()),
                }
            })
            .expect("project")
        });
    });

    group.bench_function("csv_load_and_project", |b| {
        let backend = CsvBackend::new();
        b.iter_batched(
            || csv.clone(),
            |bytes| {
                let workbook = backend.open(&mut bytes.as_slice()).expect("open csv");
                let sheet = workbook.sheet_at(0).expect("sheet");
                let mapping = resolve_read_mapping(sheet, &options).expect("mapping");
                project_rows(sheet, &options, &mapping, Order::default, |order, profile, value| {
                    match accessors.get(profile.name()) {
                        Some(field) => field.set(order, value),
                        None => Ok(()),
                    }
                })
                .expect("project")
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_projection);
criterion_main!(benches);
