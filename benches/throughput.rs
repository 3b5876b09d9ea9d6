use criterion::{criterion_group, criterion_main, Criterion};
use frontgate::request::{EnvironmentBuilder, InboundRequest, MultipartParser};
use frontgate::router::{ActionTable, RouteClassifier};
use http::Method;
use std::hint::black_box;
use std::path::Path;
use std::time::SystemTime;

fn form_request() -> InboundRequest {
    InboundRequest::builder(Method::POST, "/users/update/42?page=3&sort=name&tag=a&tag=b")
        .header("Host", "bench.local")
        .header("User-Agent", "criterion")
        .header("Accept", "text/html")
        .header("Accept", "application/json")
        .header("Cookie", "session=abc; theme=dark")
        .header("X-Requested-With", "XMLHttpRequest")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("name=ada&email=ada%40example.com&roles[]=admin&roles[]=ops&profile[city]=London")
        .build()
        .unwrap()
}

fn multipart_body() -> Vec<u8> {
    let mut body = Vec::new();
    for i in 0..4 {
        body.extend_from_slice(b"--bench\r\n");
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"field{i}\"\r\n\r\nvalue {i}\r\n").as_bytes(),
        );
    }
    body.extend_from_slice(
        b"--bench\r\nContent-Disposition: form-data; name=\"file\"; filename=\"blob.bin\"\r\nContent-Type: application/octet-stream\r\n\r\n",
    );
    body.extend_from_slice(&[0xABu8; 16 * 1024]);
    body.extend_from_slice(b"\r\n--bench--\r\n");
    body
}

fn bench_environment_build(c: &mut Criterion) {
    let builder = EnvironmentBuilder::new();
    let request = form_request();
    let now = SystemTime::now();
    c.bench_function("environment_build_form_post", |b| {
        b.iter(|| {
            let ctx = builder.build(black_box(&request), now);
            black_box(ctx.environment.len());
        })
    });
}

fn bench_multipart_parse(c: &mut Criterion) {
    let upload_dir = tempfile::tempdir().unwrap();
    let parser = MultipartParser::with_temp_dir(upload_dir.path());
    let body = multipart_body();
    c.bench_function("multipart_parse_16k_upload", |b| {
        b.iter(|| {
            let form = parser.parse(black_box(&body));
            black_box(form.files.len());
        })
    });
}

fn bench_classify(c: &mut Criterion) {
    let classifier = RouteClassifier::new(
        ActionTable::new()
            .with_controller("users")
            .with_controller("admin")
            .with_route("blog/{slug}")
            .with_route("api/v1/{resource}/{id}"),
    );
    let base = Path::new("tests/staticdata");
    let paths = [
        "/assets/style.css",
        "/users/show/4",
        "/blog/hello-world",
        "/api/v1/orders/17",
        "/no/such/path",
    ];
    c.bench_function("route_classify", |b| {
        b.iter(|| {
            for path in paths {
                black_box(classifier.classify(black_box(path), base));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_environment_build,
    bench_multipart_parse,
    bench_classify
);
criterion_main!(benches);
