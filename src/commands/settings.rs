//! Settings, download locations, and mirrors.

use crate::cli;
use crate::launcher::Launcher;

pub fn dispatch(launcher: &mut Launcher, c: cli::settings::Command)
    -> anyhow::Result<()>
{
    if c.changes_something() {
        let settings = launcher.settings_mut();
        if let Some(v) = c.download_over_tor {
            settings.download_over_tor = v;
        }
        if let Some(address) = c.tor_socks_address {
            settings.tor_socks_address = address;
        }
        if let Some(mirror) = c.mirror {
            settings.mirror = mirror;
        }
        launcher.save_settings()?;
        launcher.info(format_args!("Saved {}",
                                   launcher.paths().settings_file.display()));
    }

    let settings = launcher.settings();
    println!("tbl_version: {}", settings.tbl_version);
    println!("installed: {}", settings.installed);
    println!("download_over_tor: {}", settings.download_over_tor);
    println!("tor_socks_address: {}", settings.tor_socks_address);
    println!("mirror: {}", settings.mirror);
    for (key, value) in &settings.extra {
        println!("{}: {}", key, value);
    }
    Ok(())
}

pub fn urls(launcher: &Launcher, c: cli::UrlsCommand) -> anyhow::Result<()> {
    let download = launcher.paths()
        .download(&c.version, &launcher.settings().mirror);
    println!("{}", download.tarball_url);
    println!("{}", download.sig_url);
    launcher.info(format_args!("Tarball: {}",
                               download.tarball_file.display()));
    launcher.info(format_args!("Signature: {}",
                               download.sig_file.display()));
    Ok(())
}

pub fn mirrors(launcher: &Launcher) -> anyhow::Result<()> {
    let mirrors = launcher.mirrors();
    if mirrors.is_empty() {
        launcher.info(format_args!("No mirrors listed, using {}",
                                   launcher.settings().mirror));
    }
    for mirror in mirrors {
        println!("{}", mirror);
    }
    Ok(())
}
