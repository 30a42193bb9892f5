//! Top-level CLI assembly.

use clap::Command;

use super::args::*;

pub fn build_cli() -> Command {
    Command::new("mjc")
        .about("MiniJava compiler and MJIR interpreter")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("parse")
                .about("Parse a program and print its AST with coordinates")
                .arg(input_path_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("sema")
                .about("Parse and semantically check a program; silent on success")
                .arg(input_path_arg())
                .arg(pretty_arg()),
        )
        .subcommand(
            Command::new("codegen")
                .about("Compile to MJIR and run it (or print it)")
                .arg(input_path_arg())
                .arg(ir_arg())
                .arg(ir_pp_arg())
                .arg(cfg_arg()),
        )
        .subcommand(
            Command::new("dataflow")
                .about("Compile, optimize, and run MJIR (or print it)")
                .arg(input_path_arg())
                .arg(opt_arg())
                .arg(opt_pp_arg())
                .arg(cfg_short_arg())
                .arg(speedup_arg()),
        )
}
