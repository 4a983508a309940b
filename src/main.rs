use clap::{crate_authors, crate_description, crate_name, crate_version, Arg, ArgAction, Command};
use colored::Colorize;

// The CLI layer should only parse inputs and forward them to library code.
fn main() {
    let matches = Command::new(crate_name!())
        .about(crate_description!())
        .author(crate_authors!())
        .version(crate_version!())
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Show the output of every command that is run")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let is_verbose = matches.get_flag("verbose");

    init_logger(is_verbose);

    match kickoff::kickoff(is_verbose) {
        Ok(outcome) => {
            println!(
                "\n{} {}",
                "done".green().bold(),
                outcome.project_dir.display()
            );
        }
        Err(error) => {
            eprintln!("{:?}", miette::Report::new(error));
            std::process::exit(1);
        }
    }
}

fn init_logger(is_verbose: bool) {
    let default_filter = if is_verbose { "kickoff=debug" } else { "warn" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}
