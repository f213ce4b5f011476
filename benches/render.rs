//! Table Rendering Benchmarks
//!
//! Measures drawing the employee listing, the widest table the menu shows,
//! at a few organisation sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use orgchart::render::employees_table;
use orgchart::EmployeeListing;

fn sample_employees(count: i32) -> Vec<EmployeeListing> {
    (1..=count)
        .map(|i| EmployeeListing {
            id: i,
            first_name: format!("First{i}"),
            last_name: format!("Last{i}"),
            title: Some("Senior Software Engineer, Platform Reliability".to_string()),
            department: Some("Engineering".to_string()),
            salary: (i % 7 != 0).then(|| 100_000.0 + f64::from(i)),
            manager: (i > 1).then(|| "First1 Last1".to_string()),
        })
        .collect()
}

fn bench_render_employees(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_employees");

    for size in [10, 100, 1_000] {
        let employees = sample_employees(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &employees, |b, employees| {
            b.iter(|| employees_table(black_box(employees)).render());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render_employees);
criterion_main!(benches);
