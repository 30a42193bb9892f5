use std::io::Write;
use std::path::PathBuf;
use std::process::exit;

use clap::ArgMatches;

use mjc_ir::{Module, dump};

use crate::util::{fail, read_source};

pub struct Args {
    pub input: PathBuf,
    pub ir: bool,
    pub ir_pp: bool,
    pub cfg: bool,
}

impl Args {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            input: m.get_one::<PathBuf>("input").expect("required").clone(),
            ir: m.get_flag("ir"),
            ir_pp: m.get_flag("ir_pp"),
            cfg: m.get_flag("cfg"),
        }
    }
}

pub fn run(args: Args) {
    let source = read_source(&args.input);
    let module = match mjc_compiler::compile(&source) {
        Ok(module) => module,
        Err(diagnostic) => fail(&diagnostic),
    };

    if args.cfg {
        print!("{}", render_cfgs(&module));
    }
    if args.ir {
        print!("{}", dump::dump_flat(&module.flatten()));
    } else if args.ir_pp {
        print!("{module}");
    } else if !args.cfg {
        interpret(&module);
    }
}

/// Run the interpreter over the flattened program, forwarding its exit code.
pub fn interpret(module: &Module) -> ! {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match mjc_vm::Vm::new().run(&module.flatten(), &mut out) {
        Ok(code) => {
            let _ = out.flush();
            exit(code);
        }
        Err(e) => {
            let _ = out.flush();
            println!("{e}");
            exit(1);
        }
    }
}

/// Textual per-method CFG: each block with its successor labels.
pub fn render_cfgs(module: &Module) -> String {
    let mut out = String::new();
    for func in &module.functions {
        out.push_str(&func.name);
        out.push_str(":\n");
        for (id, block) in func.cfg.blocks() {
            let succs: Vec<&str> = func
                .cfg
                .successors(id)
                .into_iter()
                .map(|s| func.cfg.block(s).label.as_str())
                .collect();
            if succs.is_empty() {
                out.push_str(&format!("  {}\n", block.label));
            } else {
                out.push_str(&format!("  {} -> {}\n", block.label, succs.join(", ")));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::render_cfgs;

    #[test]
    fn cfg_rendering_lists_blocks_with_successors() {
        let source = "class Main {\n    public static void main(String[] args) {\n        int i = 0;\n        while (i < 2) {\n            i = i + 1;\n        }\n    }\n}\n";
        let module = mjc_compiler::compile(source).expect("compiles");
        insta::assert_snapshot!(render_cfgs(&module), @r"
        @Main.main:
          entry -> while.cond
          while.cond -> while.body, while.end
          while.body -> while.cond
          while.end -> exit
          exit
        ");
    }
}
