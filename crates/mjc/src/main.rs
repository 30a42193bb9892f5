mod cli;
mod commands;
mod util;

fn main() {
    let matches = cli::build_cli().get_matches();

    match matches.subcommand() {
        Some(("parse", m)) => {
            commands::parse::run(commands::parse::Args::from_matches(m));
        }
        Some(("sema", m)) => {
            commands::sema::run(commands::sema::Args::from_matches(m));
        }
        Some(("codegen", m)) => {
            commands::codegen::run(commands::codegen::Args::from_matches(m));
        }
        Some(("dataflow", m)) => {
            commands::dataflow::run(commands::dataflow::Args::from_matches(m));
        }
        _ => unreachable!("clap should have caught this"),
    }
}
