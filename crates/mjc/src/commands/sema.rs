use std::path::PathBuf;

use clap::ArgMatches;

use crate::util::{fail, fail_pretty, read_source};

pub struct Args {
    pub input: PathBuf,
    pub pretty: bool,
}

impl Args {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: m.get_one::<PathBuf>("input").expect("required").clone(),
            pretty: m.get_flag("pretty"),
        }
    }
}

pub fn run(args: Args) {
    let source = read_source(&args.input);
    if let Err(diagnostic) = mjc_compiler::check(&source) {
        if args.pretty {
            fail_pretty(&diagnostic, &source, &args.input);
        }
        fail(&diagnostic);
    }
    // silent on success
}
