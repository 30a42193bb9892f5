//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` composed into the subcommands in
//! `commands.rs`.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Source file (positional, required).
pub fn input_path_arg() -> Arg {
    Arg::new("input")
        .value_name("INPUT")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("MiniJava source file")
}

/// Print the AST as JSON (--json).
pub fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print the AST as JSON")
}

/// Render the diagnostic against the source line (--pretty).
pub fn pretty_arg() -> Arg {
    Arg::new("pretty")
        .long("pretty")
        .action(ArgAction::SetTrue)
        .help("Render errors with the offending source line")
}

/// Print raw MJIR instead of running (--ir).
pub fn ir_arg() -> Arg {
    Arg::new("ir")
        .long("ir")
        .action(ArgAction::SetTrue)
        .help("Print the generated MJIR")
}

/// Pretty-print MJIR instead of running (--ir-pp).
pub fn ir_pp_arg() -> Arg {
    Arg::new("ir_pp")
        .long("ir-pp")
        .action(ArgAction::SetTrue)
        .help("Pretty-print the generated MJIR")
}

/// Print optimized MJIR instead of running (--opt).
pub fn opt_arg() -> Arg {
    Arg::new("opt")
        .long("opt")
        .action(ArgAction::SetTrue)
        .help("Print the optimized MJIR")
}

/// Pretty-print optimized MJIR instead of running (--opt-pp).
pub fn opt_pp_arg() -> Arg {
    Arg::new("opt_pp")
        .long("opt-pp")
        .action(ArgAction::SetTrue)
        .help("Pretty-print the optimized MJIR")
}

/// Render per-method CFGs (--cfg).
pub fn cfg_arg() -> Arg {
    Arg::new("cfg")
        .long("cfg")
        .action(ArgAction::SetTrue)
        .help("Show the control-flow graph of each method")
}

/// Same, with the short form the dataflow tool also accepts (-c/--cfg).
pub fn cfg_short_arg() -> Arg {
    cfg_arg().short('c')
}

/// Report the pre/post instruction-count ratio (--speedup).
pub fn speedup_arg() -> Arg {
    Arg::new("speedup")
        .long("speedup")
        .action(ArgAction::SetTrue)
        .help("Report the speedup of the optimized MJIR (always on)")
}
