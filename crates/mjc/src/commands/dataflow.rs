use std::path::PathBuf;

use clap::ArgMatches;

use mjc_ir::dump;

use super::codegen::{interpret, render_cfgs};
use crate::util::{fail, read_source};

pub struct Args {
    pub input: PathBuf,
    pub opt: bool,
    pub opt_pp: bool,
    pub cfg: bool,
}

impl Args {
    pub fn from_matches(m: &ArgMatches) -> Self {
        // --speedup is accepted for surface compatibility; the report is
        // always emitted
        Self {
            input: m.get_one::<PathBuf>("input").expect("required").clone(),
            opt: m.get_flag("opt"),
            opt_pp: m.get_flag("opt_pp"),
            cfg: m.get_flag("cfg"),
        }
    }
}

pub fn run(args: Args) {
    let source = read_source(&args.input);
    let (module, stats) = match mjc_compiler::compile_optimized(&source) {
        Ok(result) => result,
        Err(diagnostic) => fail(&diagnostic),
    };

    eprintln!(
        "[SPEEDUP] Default: {} Optimized: {} Speedup: {:.2}\n",
        stats.before,
        stats.after,
        stats.speedup()
    );

    if args.cfg {
        print!("{}", render_cfgs(&module));
    }
    if args.opt {
        print!("{}", dump::dump_flat(&module.flatten()));
    } else if args.opt_pp {
        print!("{module}");
    } else if !args.cfg {
        interpret(&module);
    }
}
