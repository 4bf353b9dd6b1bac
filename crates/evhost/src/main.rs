mod cli;
mod paths;
mod run;
mod simulate;

use anyhow::Result;
use cli::Command;
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    let paths = AppPaths::discover()?;
    let location = paths.locate_config(cli.config.as_deref());

    match cli.command {
        Command::Run(args) => {
            let config = run::load_config(&location)?;
            run::run(&config, args)
        }
        Command::Sample(args) => {
            let config = run::load_config(&location)?;
            run::sample(&config, args)
        }
        Command::Where => run::describe_location(&paths, &location),
    }
}
