use std::process::ExitCode;

use clap::Parser;

use imgadjust::cli::{self, CliArgs};
use imgadjust::settings::Settings;
use imgadjust::{log_info, log_warn, logger};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let settings = Settings::load();

    if settings.log_to_file {
        // Initialize session log (overwrites previous session log)
        logger::init();
        if args.verbose && let Some(path) = logger::log_path() {
            println!("log: {}", path.display());
        }
    }
    log_info!("settings: {:?}", settings);

    // First run: write the defaults out so there is a file to edit.
    if let Some(path) = Settings::settings_path()
        && !path.exists()
        && let Err(e) = settings.save()
    {
        log_warn!("could not write {}: {}", path.display(), e);
    }

    cli::run(args, &settings)
}
