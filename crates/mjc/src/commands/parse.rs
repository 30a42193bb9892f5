use std::path::PathBuf;

use clap::ArgMatches;

use mjc_compiler::parser::dump_program;

use crate::util::{fail, read_source};

pub struct Args {
    pub input: PathBuf,
    pub json: bool,
}

impl Args {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: m.get_one::<PathBuf>("input").expect("required").clone(),
            json: m.get_flag("json"),
        }
    }
}

pub fn run(args: Args) {
    let source = read_source(&args.input);
    let program = match mjc_compiler::parse(&source) {
        Ok(program) => program,
        Err(diagnostic) => fail(&diagnostic),
    };
    if args.json {
        match serde_json::to_string_pretty(&program) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
    } else {
        print!("{}", dump_program(&program));
    }
}
