use std::fs;
use std::thread;

use sequoia_openpgp as openpgp;
use openpgp::Cert;
use openpgp::parse::Parse;
use openpgp::serialize::SerializeInto;

use tempfile::TempDir;

use torbrowser_launcher::Error;
use torbrowser_launcher::engine::{Engine, SequoiaEngine};
use torbrowser_launcher::keyring::Keyring;
use torbrowser_launcher::signing_key::{SigningKey, validate};
use torbrowser_launcher::trust::{KeyState, TrustContext};

use crate::integration::common::{
    armored,
    binary,
    context,
    engine,
    generate,
};

#[test]
fn imported_key_is_listed() {
    let tmp = TempDir::new().unwrap();
    let keyring = Keyring::ensure_initialized(tmp.path().join("k")).unwrap();
    let cert = generate("<alice@example.org>");

    let engine = engine();
    assert!(engine.list_fingerprints(keyring.path()).unwrap().is_empty());

    let result = engine.import_key(keyring.path(), &armored(&cert));
    assert!(result.is_success(), "{:?}", result.error());
    assert_eq!(result.fingerprints(), &[cert.fingerprint()]);
    assert!(validate(&result, &cert.fingerprint().to_hex()));
    assert!(validate(&result, &cert.fingerprint().to_hex().to_lowercase()));

    assert_eq!(engine.list_fingerprints(keyring.path()).unwrap(),
               vec![cert.fingerprint()]);
}

#[test]
fn reimport_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let keyring = Keyring::ensure_initialized(tmp.path().join("k")).unwrap();
    let alice = generate("<alice@example.org>");
    let bob = generate("<bob@example.org>");
    let engine = engine();

    assert!(engine.import_key(keyring.path(), &armored(&alice)).is_success());
    assert!(engine.import_key(keyring.path(), &binary(&bob)).is_success());
    let mut before = engine.list_fingerprints(keyring.path()).unwrap();
    before.sort();

    let again = engine.import_key(keyring.path(), &binary(&alice));
    assert!(again.is_success());
    assert_eq!(again.fingerprints(), &[alice.fingerprint()]);

    let mut after = engine.list_fingerprints(keyring.path()).unwrap();
    after.sort();
    assert_eq!(before, after);
    assert_eq!(after.len(), 2);
}

#[test]
fn malformed_material_fails() {
    let tmp = TempDir::new().unwrap();
    let keyring = Keyring::ensure_initialized(tmp.path().join("k")).unwrap();
    let cert = generate("<alice@example.org>");
    let engine = engine();
    assert!(engine.import_key(keyring.path(), &armored(&cert)).is_success());

    let blobs: [&[u8]; 3] = [
        b"",
        b"<html>Not found</html>",
        b"-----BEGIN PGP PUBLIC KEY BLOCK-----\n\ngarbage\n",
    ];
    for blob in blobs {
        let result = engine.import_key(keyring.path(), blob);
        assert!(! result.is_success());
        assert!(result.fingerprints().is_empty());
        assert!(matches!(result.error(), Some(Error::Import(_))));
        assert!(! validate(&result, &cert.fingerprint().to_hex()));
    }

    // The keyring is unharmed.
    assert_eq!(engine.list_fingerprints(keyring.path()).unwrap(),
               vec![cert.fingerprint()]);
}

#[test]
fn secrets_are_not_stored() {
    let tmp = TempDir::new().unwrap();
    let keyring = Keyring::ensure_initialized(tmp.path().join("k")).unwrap();
    let cert = generate("<alice@example.org>");
    assert!(cert.is_tsk());

    let tsk = cert.as_tsk().to_vec().unwrap();
    let engine = engine();
    assert!(engine.import_key(keyring.path(), &tsk).is_success());

    let stored = Cert::from_file(SequoiaEngine::keyring_file(keyring.path()))
        .unwrap();
    assert_eq!(stored.fingerprint(), cert.fingerprint());
    assert!(! stored.is_tsk());
}

#[test]
fn corrupt_keyring_is_replaced() {
    let tmp = TempDir::new().unwrap();
    let keyring = Keyring::ensure_initialized(tmp.path().join("k")).unwrap();
    fs::write(SequoiaEngine::keyring_file(keyring.path()),
              b"this is not a keyring").unwrap();
    let cert = generate("<alice@example.org>");
    let engine = engine();

    let result = engine.import_key(keyring.path(), &armored(&cert));
    assert!(result.is_success(), "{:?}", result.error());
    assert_eq!(engine.list_fingerprints(keyring.path()).unwrap(),
               vec![cert.fingerprint()]);
}

#[test]
fn bundled_key_becomes_trusted() {
    let tmp = TempDir::new().unwrap();
    let cert = generate("<torbrowser@torproject.org>");
    let key_file = tmp.path().join("tor-browser-developers.asc");
    fs::write(&key_file, armored(&cert)).unwrap();

    let mut ctx = context(&tmp, &cert);
    assert_eq!(ctx.state(), &KeyState::Absent);
    assert_eq!(ctx.import_file(&key_file).unwrap(), cert.fingerprint());
    assert_eq!(ctx.state(), &KeyState::Trusted(cert.fingerprint()));
}

#[test]
fn substituted_key_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let pinned = generate("<torbrowser@torproject.org>");
    let mallory = generate("<torbrowser@torproject.org>");

    let mut ctx = context(&tmp, &pinned);
    match ctx.import_bytes(&armored(&mallory)) {
        Err(Error::FingerprintMismatch { expected, found, .. }) => {
            assert_eq!(expected, pinned.fingerprint().to_hex());
            assert_eq!(found, vec![mallory.fingerprint().to_hex()]);
        }
        r => panic!("unexpected {:?}", r),
    }
    assert_eq!(ctx.state(), &KeyState::Rejected {
        found: vec![mallory.fingerprint()],
    });

    // Rejected is terminal.
    assert!(matches!(ctx.import_bytes(&armored(&pinned)),
                     Err(Error::Rejected { .. })));
}

#[test]
fn missing_key_file_keeps_state() {
    let tmp = TempDir::new().unwrap();
    let cert = generate("<torbrowser@torproject.org>");
    let mut ctx = context(&tmp, &cert);

    assert!(matches!(ctx.import_file(tmp.path().join("missing.asc")),
                     Err(Error::Import(_))));
    assert_eq!(ctx.state(), &KeyState::Absent);
}

#[test]
fn concurrent_imports_keep_every_key() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("gnupg_homedir");

    // Every thread has its own handle on the same keyring.
    let threads = (0..4).map(|i| {
        let dir = dir.clone();
        thread::spawn(move || {
            let cert = generate(&format!("<signer{}@example.org>", i));
            let mut ctx = TrustContext::open(
                engine(), &dir,
                SigningKey::new("test signing key", cert.fingerprint()))
                .unwrap();
            for _ in 0..3 {
                ctx.import_bytes(&armored(&cert)).unwrap();
            }
            cert.fingerprint()
        })
    }).collect::<Vec<_>>();

    let mut expected = threads.into_iter()
        .map(|t| t.join().unwrap())
        .collect::<Vec<_>>();
    expected.sort();

    let mut present = engine().list_fingerprints(&dir).unwrap();
    present.sort();
    assert_eq!(present, expected);
}
