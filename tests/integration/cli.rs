use std::fs;

use predicates::prelude::*;

use crate::integration::common::{
    Launcher,
    generate,
    sign,
};

#[test]
fn init_creates_the_layout() {
    let launcher = Launcher::new();
    launcher.run(launcher.command_args(&["init"]), true);

    assert!(launcher.settings_file().is_file());
    assert!(launcher.keyring_dir().is_dir());
    assert!(launcher.home().join(".cache").join("torbrowser")
            .join("download").is_dir());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(launcher.keyring_dir()).unwrap()
            .permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    // Running it again is fine.
    launcher.run(launcher.command_args(&["init"]), true);
}

#[test]
fn init_warns_about_a_substituted_key() {
    let launcher = Launcher::new();
    let mallory = generate("<torbrowser@torproject.org>");
    launcher.bundle_key(&mallory);

    launcher.command_args(&["init"])
        .assert()
        .success()
        // Messages are wrapped, check the parts separately.
        .stderr(predicate::str::contains("Could not import key"))
        .stderr(predicate::str::contains(
            "EF6E286DDA85EA2A4BA7DE684E2C6E8793298290"))
        .stderr(predicate::str::contains(mallory.fingerprint().to_hex()));
}

#[test]
fn init_warns_about_a_missing_key() {
    let launcher = Launcher::new();
    launcher.command_args(&["init"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Warning"))
        .stderr(predicate::str::contains("tor-browser-developers.asc"));
}

#[test]
fn verify_without_trusted_key_fails() {
    let launcher = Launcher::new();
    let mallory = generate("<torbrowser@torproject.org>");
    launcher.bundle_key(&mallory);

    let tarball = launcher.scratch("tor-browser.tar.xz");
    let signature = launcher.scratch("tor-browser.tar.xz.asc");
    fs::write(&tarball, b"release").unwrap();
    fs::write(&signature, sign(&mallory, b"release")).unwrap();

    launcher.command()
        .arg("verify")
        .arg("--signature-file").arg(&signature)
        .arg(&tarball)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Refusing to use the file"))
        .stderr(predicate::str::contains("tor-browser.tar.xz"));
}

#[test]
fn verify_download_without_trusted_key_fails() {
    let launcher = Launcher::new();
    let mallory = generate("<torbrowser@torproject.org>");
    launcher.bundle_key(&mallory);

    let download = launcher.home().join(".cache").join("torbrowser")
        .join("download");
    fs::create_dir_all(&download).unwrap();
    let name = if cfg!(target_pointer_width = "64") {
        "tor-browser-linux-x86_64-13.5.1.tar.xz"
    } else {
        "tor-browser-linux-i686-13.5.1.tar.xz"
    };
    fs::write(download.join(name), b"release").unwrap();
    fs::write(download.join(format!("{}.asc", name)),
              sign(&mallory, b"release")).unwrap();

    launcher.command_args(&["verify-download", "13.5.1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Refusing to use the download"));
}

#[test]
fn old_bundle_is_renamed() {
    let launcher = Launcher::new();
    let arch = if cfg!(target_pointer_width = "64") { "x86_64" } else { "i686" };
    let tbb = launcher.home().join(".local").join("share").join("torbrowser")
        .join("tbb").join(arch);
    let old = tbb.join("tor-browser_en-US");
    fs::create_dir_all(&old).unwrap();
    fs::write(old.join("start-tor-browser.desktop"), b"").unwrap();

    launcher.command_args(&["settings"])
        .assert()
        .success()
        .stdout(predicate::str::contains("installed: true"))
        .stderr(predicate::str::contains("Renamed"));
    assert!(tbb.join("tor-browser").join("start-tor-browser.desktop").is_file());
    assert!(! old.exists());
}

#[test]
fn verify_requires_arguments() {
    let launcher = Launcher::new();
    launcher.run(launcher.command_args(&["verify", "file"]), false);
}

#[test]
fn fingerprints_lists_rejected_keys() {
    let launcher = Launcher::new();
    let mallory = generate("<torbrowser@torproject.org>");
    launcher.bundle_key(&mallory);

    launcher.command_args(&["fingerprints"])
        .assert()
        .success()
        .stdout(predicate::str::contains(mallory.fingerprint().to_hex()))
        .stdout(predicate::str::contains("(trusted)").not())
        .stderr(predicate::str::contains("was rejected"));
}

#[test]
fn settings_round_trip() {
    let launcher = Launcher::new();
    launcher.command_args(&["settings"])
        .assert()
        .success()
        .stdout(predicate::str::contains("download_over_tor: false"))
        .stdout(predicate::str::contains(
            "mirror: https://dist.torproject.org/"));

    launcher.run(launcher.command_args(&[
        "settings",
        "--download-over-tor", "true",
        "--tor-socks-address", "127.0.0.1:9150",
    ]), true);

    let saved: serde_json::Value = serde_json::from_slice(
        &fs::read(launcher.settings_file()).unwrap()).unwrap();
    assert_eq!(saved["download_over_tor"], true);
    assert_eq!(saved["tor_socks_address"], "127.0.0.1:9150");

    launcher.command_args(&["settings"])
        .assert()
        .success()
        .stdout(predicate::str::contains("download_over_tor: true"));
}

#[test]
fn settings_are_upgraded() {
    let launcher = Launcher::new();
    let settings_file = launcher.settings_file();
    fs::create_dir_all(settings_file.parent().unwrap()).unwrap();
    fs::write(&settings_file, r#"{
        "tbl_version": "0.2.0",
        "installed": true,
        "tor_socks_address": "tcp:127.0.0.1:9050",
        "force_en-US": false
    }"#).unwrap();

    launcher.command_args(&["settings"])
        .assert()
        .success()
        // No bundle is installed.
        .stdout(predicate::str::contains("installed: false"))
        .stdout(predicate::str::contains("tor_socks_address: 127.0.0.1:9050"))
        .stdout(predicate::str::contains("force_en-US: false"));

    let saved: serde_json::Value = serde_json::from_slice(
        &fs::read(&settings_file).unwrap()).unwrap();
    assert_eq!(saved["tbl_version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(saved["tor_socks_address"], "127.0.0.1:9050");
    assert_eq!(saved["force_en-US"], false);
}

#[test]
fn urls_use_the_mirror() {
    let launcher = Launcher::new();
    launcher.run(launcher.command_args(&[
        "settings", "--mirror", "https://mirror.example.org/tor",
    ]), true);

    let arch = if cfg!(target_pointer_width = "64") {
        "linux-x86_64"
    } else {
        "linux-i686"
    };
    launcher.command_args(&["urls", "13.5.1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "https://mirror.example.org/tor/torbrowser/13.5.1/\
             tor-browser-{}-13.5.1.tar.xz\n", arch)))
        .stdout(predicate::str::contains(format!(
            "tor-browser-{}-13.5.1.tar.xz.asc", arch)));
}

#[test]
fn mirrors_are_merged() {
    let launcher = Launcher::new();
    fs::write(launcher.share().join("mirrors.txt"),
              "https://dist.torproject.org/\n\
               https://tor.calyxinstitute.org/dist/\n").unwrap();
    let config = launcher.home().join(".config").join("torbrowser");
    fs::create_dir_all(&config).unwrap();
    fs::write(config.join("mirrors.txt"),
              "https://dist.torproject.org/\n\
               https://mirror.example.org/\n").unwrap();

    launcher.command_args(&["mirrors"])
        .assert()
        .success()
        .stdout("https://dist.torproject.org/\n\
                 https://tor.calyxinstitute.org/dist/\n\
                 https://mirror.example.org/\n");
}
