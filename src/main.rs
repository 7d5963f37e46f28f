use clap::FromArgMatches;

use torbrowser_launcher::cli;
use torbrowser_launcher::commands;
use torbrowser_launcher::print_error_chain;

fn main() {
    let matches = cli::build().get_matches();
    let c = match cli::LauncherCommand::from_arg_matches(&matches) {
        Ok(c) => c,
        Err(err) => err.exit(),
    };

    if let Err(err) = commands::dispatch(c) {
        print_error_chain(&err);
        std::process::exit(1);
    }
}
