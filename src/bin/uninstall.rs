use clap::Parser;

use zublime_setup::{run_uninstall, Settings, SetupError};

#[derive(Parser, Debug)]
#[command(
    name = "zublime-uninstall",
    version,
    about = "Uninstall a Zublime release channel"
)]
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
    run_uninstall(&settings)?;
    println!("Zublime has been uninstalled");
    Ok(())
}
