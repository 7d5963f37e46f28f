use anyhow::Context;

use crate::cli::verify;
use crate::launcher::Launcher;

pub fn dispatch(launcher: &mut Launcher, c: verify::Command)
    -> anyhow::Result<()>
{
    launcher.init_keyring()?;

    let signer = launcher.verify(&c.file, &c.signature_file)
        .context("Refusing to use the file")?;

    if ! launcher.quiet() {
        weprintln!("Good signature from {} on {}",
                   signer, c.file.display());
    }
    Ok(())
}

pub fn download(launcher: &mut Launcher, c: verify::DownloadCommand)
    -> anyhow::Result<()>
{
    launcher.init_keyring()?;

    let signer = launcher.verify_download(&c.version)
        .context("Refusing to use the download")?;

    if ! launcher.quiet() {
        weprintln!("Good signature from {} on release {}",
                   signer, c.version);
    }
    Ok(())
}
