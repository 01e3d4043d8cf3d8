use std::hint::black_box;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};
use paseto_core::validation::NoValidation;
use paseto_json::{Json, RegisteredClaims};
use paseto_v1::KeyUsage;

fn claims() -> RegisteredClaims {
    RegisteredClaims::now(Duration::from_secs(3600))
        .for_audience("https://paseto.io/".to_string())
        .from_issuer("https://issuer.example/".to_string())
        .for_subject("alice".to_string())
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let signer = paseto_v1::public();
    signer.generate_key().unwrap();

    let verifier = paseto_v1::public();
    verifier
        .import_key(KeyUsage::Verify, &signer.export_public_key().unwrap())
        .unwrap();

    let token = signer.sign(&claims(), "footer1").unwrap();

    let mut g = c.benchmark_group("verify");

    g.bench_function("registered_claims", |b| {
        b.iter(|| {
            verifier
                .verify_with(
                    black_box(&*token),
                    &NoValidation::<RegisteredClaims>::dangerous_no_validation(),
                )
                .unwrap()
                .message
        })
    });

    g.bench_function("json_value", |b| {
        b.iter(|| {
            verifier
                .verify::<Json<serde_json::Value>>(black_box(&*token))
                .unwrap()
                .message
        })
    });

    g.finish();

    let mut g = c.benchmark_group("sign");

    g.bench_function("registered_claims", |b| {
        b.iter(|| signer.sign(&claims(), black_box("footer1")).unwrap())
    });

    g.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
