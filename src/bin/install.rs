use clap::Parser;

use zublime_setup::{run_install, Settings, SetupError};

#[derive(Parser, Debug)]
#[command(name = "zublime-install", version, about = "Install Zublime")]
struct Cli {}

fn main() {
    let _cli = Cli::parse();
    zublime_setup::init_logging();

    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), SetupError> {
    let settings = Settings::from_env()?;
    let report = run_install(&settings)?;
    for line in report.summary_lines(settings.shell.as_deref()) {
        println!("{line}");
    }
    Ok(())
}
