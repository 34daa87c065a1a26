use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pmp_crypto::EntropySource;
use pmp_types::TicketCode;

fn sha256_bench(c: &mut Criterion) {
    let data = [0xABu8; 256];

    c.bench_function("sha256_256B", |b| {
        b.iter(|| pmp_crypto::sha256(black_box(&data)))
    });
}

fn hash_ip_bench(c: &mut Criterion) {
    c.bench_function("hash_ip", |b| {
        b.iter(|| pmp_crypto::hash_ip(black_box("203.0.113.42"), black_box("server-salt")))
    });
}

fn hash_text_bench(c: &mut Criterion) {
    let text = "I never told anyone that I ".repeat(20);

    c.bench_function("hash_text_540B", |b| {
        b.iter(|| pmp_crypto::hash_text(black_box(&text)))
    });
}

fn ticket_code_bench(c: &mut Criterion) {
    let entropy = pmp_crypto::OsEntropy;

    c.bench_function("ticket_code_from_os_entropy", |b| {
        b.iter(|| {
            let seed = entropy.seed().expect("os entropy");
            let mut symbols = [0u8; 8];
            symbols.copy_from_slice(&seed[..8]);
            TicketCode::from_entropy(black_box(&symbols))
        })
    });
}

criterion_group!(
    benches,
    sha256_bench,
    hash_ip_bench,
    hash_text_bench,
    ticket_code_bench
);
criterion_main!(benches);
