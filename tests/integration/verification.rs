use std::fs;
use std::thread;

use tempfile::TempDir;

use torbrowser_launcher::Error;
use torbrowser_launcher::engine::{Engine, VerificationOutcome};

use crate::integration::common::{
    Release,
    armored,
    context,
    engine,
    generate,
    sign_binary,
};

const TARBALL: &[u8] = b"tor-browser-linux-x86_64-13.5.1.tar.xz contents";

fn is_unverifiable(outcome: &VerificationOutcome) -> bool {
    matches!(outcome, VerificationOutcome::Unverifiable { .. })
}

fn is_invalid(outcome: &VerificationOutcome) -> bool {
    matches!(outcome, VerificationOutcome::Invalid { .. })
}

#[test]
fn good_signature() {
    let tmp = TempDir::new().unwrap();
    let key = generate("<torbrowser@torproject.org>");
    let release = Release::new(tmp.path(), &key, TARBALL);

    let mut ctx = context(&tmp, &key);
    ctx.import_bytes(&armored(&key)).unwrap();

    let outcome = ctx.verify(&release.tarball, &release.signature);
    assert_eq!(outcome, VerificationOutcome::Valid {
        signer: key.fingerprint(),
    });
    assert_eq!(outcome.into_result(&release.tarball).unwrap(),
               key.fingerprint());
}

#[test]
fn tampered_artifact() {
    let tmp = TempDir::new().unwrap();
    let key = generate("<torbrowser@torproject.org>");
    let release = Release::new(tmp.path(), &key, TARBALL);
    release.tamper();

    let mut ctx = context(&tmp, &key);
    ctx.import_bytes(&armored(&key)).unwrap();

    let outcome = ctx.verify(&release.tarball, &release.signature);
    assert!(is_invalid(&outcome), "{:?}", outcome);
    assert!(matches!(outcome.into_result(&release.tarball),
                     Err(Error::BadSignature { .. })));
}

#[test]
fn signed_by_another_key() {
    let tmp = TempDir::new().unwrap();
    let key = generate("<torbrowser@torproject.org>");
    let mallory = generate("<torbrowser@torproject.org>");
    let release = Release::new(tmp.path(), &mallory, TARBALL);

    let mut ctx = context(&tmp, &key);
    ctx.import_bytes(&armored(&key)).unwrap();

    let outcome = ctx.verify(&release.tarball, &release.signature);
    assert!(is_invalid(&outcome), "{:?}", outcome);
}

#[test]
fn other_keys_in_the_keyring_are_not_used() {
    let tmp = TempDir::new().unwrap();
    let key = generate("<torbrowser@torproject.org>");
    let mallory = generate("<torbrowser@torproject.org>");
    let release = Release::new(tmp.path(), &mallory, TARBALL);

    let mut ctx = context(&tmp, &key);
    ctx.import_bytes(&armored(&key)).unwrap();
    // Another key ends up in the keyring.
    assert!(ctx.engine().import_key(ctx.keyring().path(), &armored(&mallory))
            .is_success());

    let outcome = ctx.verify(&release.tarball, &release.signature);
    assert!(! outcome.is_valid(), "{:?}", outcome);
}

#[test]
fn missing_files() {
    let tmp = TempDir::new().unwrap();
    let key = generate("<torbrowser@torproject.org>");
    let release = Release::new(tmp.path(), &key, TARBALL);

    let mut ctx = context(&tmp, &key);
    ctx.import_bytes(&armored(&key)).unwrap();

    let outcome = ctx.verify(&release.tarball, tmp.path().join("missing.asc"));
    assert!(is_unverifiable(&outcome), "{:?}", outcome);
    assert!(matches!(outcome.into_result(&release.tarball),
                     Err(Error::Unverifiable { .. })));

    let outcome = ctx.verify(tmp.path().join("missing.tar.xz"),
                             &release.signature);
    assert!(is_unverifiable(&outcome), "{:?}", outcome);
}

#[test]
fn corrupt_signature() {
    let tmp = TempDir::new().unwrap();
    let key = generate("<torbrowser@torproject.org>");
    let release = Release::new(tmp.path(), &key, TARBALL);
    fs::write(&release.signature, b"not a signature").unwrap();

    let mut ctx = context(&tmp, &key);
    ctx.import_bytes(&armored(&key)).unwrap();

    let outcome = ctx.verify(&release.tarball, &release.signature);
    assert!(is_unverifiable(&outcome), "{:?}", outcome);
}

#[test]
fn no_validated_key() {
    let tmp = TempDir::new().unwrap();
    let key = generate("<torbrowser@torproject.org>");
    let release = Release::new(tmp.path(), &key, TARBALL);

    // The key is in the keyring, but was never validated in this
    // context.
    let ctx = context(&tmp, &key);
    assert!(ctx.engine().import_key(ctx.keyring().path(), &armored(&key))
            .is_success());
    let outcome = ctx.verify(&release.tarball, &release.signature);
    assert!(is_unverifiable(&outcome), "{:?}", outcome);

    // Nor is it trusted by the engine if the caller doesn't trust
    // it.
    let outcome = engine().verify_detached(
        ctx.keyring().path(), &[], &release.tarball, &release.signature);
    assert!(is_unverifiable(&outcome), "{:?}", outcome);
}

#[test]
fn validation_does_not_persist() {
    let tmp = TempDir::new().unwrap();
    let key = generate("<torbrowser@torproject.org>");
    let release = Release::new(tmp.path(), &key, TARBALL);

    {
        let mut ctx = context(&tmp, &key);
        ctx.import_bytes(&armored(&key)).unwrap();
        assert!(ctx.verify(&release.tarball, &release.signature).is_valid());
    }

    // A new context over the same keyring starts out untrusting.
    let ctx = context(&tmp, &key);
    let outcome = ctx.verify(&release.tarball, &release.signature);
    assert!(is_unverifiable(&outcome), "{:?}", outcome);
}

#[test]
fn rejected_key_cannot_verify() {
    let tmp = TempDir::new().unwrap();
    let key = generate("<torbrowser@torproject.org>");
    let mallory = generate("<torbrowser@torproject.org>");
    let release = Release::new(tmp.path(), &mallory, TARBALL);

    let mut ctx = context(&tmp, &key);
    assert!(ctx.import_bytes(&armored(&mallory)).is_err());
    let outcome = ctx.verify(&release.tarball, &release.signature);
    assert!(is_unverifiable(&outcome), "{:?}", outcome);
}

#[test]
fn key_removed_from_keyring() {
    let tmp = TempDir::new().unwrap();
    let key = generate("<torbrowser@torproject.org>");
    let release = Release::new(tmp.path(), &key, TARBALL);

    let mut ctx = context(&tmp, &key);
    ctx.import_bytes(&armored(&key)).unwrap();
    fs::remove_file(ctx.keyring().path().join("pubring.pgp")).unwrap();

    let outcome = ctx.verify(&release.tarball, &release.signature);
    assert!(is_unverifiable(&outcome), "{:?}", outcome);
}

#[test]
fn independent_contexts() {
    let threads = (0..4).map(|i| thread::spawn(move || {
        let tmp = TempDir::new().unwrap();
        let key = generate("<torbrowser@torproject.org>");
        let data = format!("release {}", i);
        let release = Release::new(tmp.path(), &key, data.as_bytes());

        let mut ctx = context(&tmp, &key);
        if i % 2 == 0 {
            ctx.import_bytes(&armored(&key)).unwrap();
            assert!(ctx.verify(&release.tarball, &release.signature)
                    .is_valid());
        } else {
            let outcome = ctx.verify(&release.tarball, &release.signature);
            assert!(is_unverifiable(&outcome), "{:?}", outcome);
        }
    })).collect::<Vec<_>>();

    for t in threads {
        t.join().unwrap();
    }
}

#[test]
fn binary_signature() {
    let tmp = TempDir::new().unwrap();
    let key = generate("<torbrowser@torproject.org>");
    let release = Release::new(tmp.path(), &key, TARBALL);
    let sig_file = tmp.path().join("tor-browser.tar.xz.sig");
    fs::write(&sig_file, sign_binary(&key, TARBALL)).unwrap();

    let mut ctx = context(&tmp, &key);
    ctx.import_bytes(&armored(&key)).unwrap();
    assert!(ctx.verify(&release.tarball, &sig_file).is_valid());

    // A signature over something else.
    fs::write(&sig_file, sign_binary(&key, b"something else")).unwrap();
    let outcome = ctx.verify(&release.tarball, &sig_file);
    assert!(is_invalid(&outcome), "{:?}", outcome);
}
