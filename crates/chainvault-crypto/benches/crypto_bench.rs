use chainvault_crypto::{
    derive_ed25519, derive_secp256k1, encrypt_secret, HdPath, KdfParams, Mnemonic,
    Secp256k1Keypair,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_derivation(c: &mut Criterion) {
    let mnemonic = Mnemonic::from_entropy(&[7u8; 32]).unwrap();
    let seed = mnemonic.to_seed("").unwrap();

    c.bench_function("mnemonic_to_seed", |b| b.iter(|| mnemonic.to_seed(black_box("")).unwrap()));
    c.bench_function("bip32_evm_account", |b| {
        b.iter(|| derive_secp256k1(black_box(&seed[..]), &HdPath::evm(0)).unwrap())
    });
    c.bench_function("slip10_solana_account", |b| {
        b.iter(|| derive_ed25519(black_box(&seed[..]), &HdPath::solana(0)).unwrap())
    });
}

fn bench_signing(c: &mut Criterion) {
    let kp = Secp256k1Keypair::generate();
    let digest = [3u8; 32];
    c.bench_function("secp256k1_sign_prehash", |b| b.iter(|| kp.sign_prehash(black_box(&digest)).unwrap()));
}

fn bench_keystore(c: &mut Criterion) {
    c.bench_function("encrypt_secret_light", |b| {
        b.iter(|| encrypt_secret(black_box(b"seed phrase"), "123456", &KdfParams::light()).unwrap())
    });
}

criterion_group!(benches, bench_derivation, bench_signing, bench_keystore);
criterion_main!(benches);
