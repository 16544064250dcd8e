use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mapped_query::{
    build_filter_clause, parse_query_string, FieldRegistry, FieldType, FilterRequest,
    SelectQuery,
};

fn fields() -> FieldRegistry {
    FieldRegistry::new()
        .with_field("id", "t.id", FieldType::Uuid)
        .unwrap()
        .with_field("name", "t.name", FieldType::String)
        .unwrap()
        .with_field("age", "t.age", FieldType::Number)
        .unwrap()
        .with_field("role", "t.role", FieldType::String)
        .unwrap()
        .with_field("createdAt", "t.created_at", FieldType::Timestamp)
        .unwrap()
        .with_field("meta", "t.meta", FieldType::Jsonb)
        .unwrap()
}

/// Benchmark query string decoding
fn bench_query_string(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_string");

    group.bench_function("simple", |b| {
        b.iter(|| parse_query_string(black_box("name=bob&limit=10")))
    });

    group.bench_function("encoded", |b| {
        b.iter(|| {
            parse_query_string(black_box(
                "name_like=john%20smith&role_in=admin%2Ceditor&createdAt_monthYear=2023-03",
            ))
        })
    });

    group.finish();
}

/// Benchmark filter clause building
fn bench_filter_clause(c: &mut Criterion) {
    let fields = fields();
    let mut group = c.benchmark_group("filter_clause");

    let cases = [
        ("single", "age_gte=18"),
        ("mixed", "name_like=bob&age_between=18,65&role_in=admin,editor"),
        (
            "dates_and_json",
            "createdAt_monthYear=2023-03&createdAt_year=2023&meta_jsonKeyExists=plan",
        ),
    ];

    for (name, query) in cases {
        let request = FilterRequest::new().with_query_params(parse_query_string(query).unwrap());
        group.bench_with_input(BenchmarkId::from_parameter(name), &request, |b, request| {
            b.iter(|| build_filter_clause(black_box(&fields), black_box(request)))
        });
    }

    group.finish();
}

/// Benchmark full statement assembly
fn bench_select(c: &mut Criterion) {
    let fields = fields();
    let request = FilterRequest::new()
        .with_required("id", "abc")
        .with_query_params(parse_query_string(
            "name_like=bob&role_in=admin,editor&sort=-createdAt&limit=25&offset=50",
        )
        .unwrap());

    c.bench_function("select_with_count", |b| {
        b.iter(|| {
            let query = SelectQuery::new(&fields).from("users", Some("t"));
            let select = query.build(black_box(&request));
            let count = query.build_count(black_box(&request));
            (select, count)
        })
    });
}

criterion_group!(benches, bench_query_string, bench_filter_clause, bench_select);
criterion_main!(benches);
