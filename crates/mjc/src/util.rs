//! Small helpers shared by the command modules.

use std::path::Path;
use std::process::exit;

use mjc_compiler::Diagnostic;

/// Read the input file or exit 1 with a message on stderr.
pub fn read_source(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(_) => {
            eprintln!("Input {} not found", path.display());
            exit(1);
        }
    }
}

/// Report a compile-time diagnostic on stdout (where the fixtures expect
/// it) and exit 1.
pub fn fail(diagnostic: &Diagnostic) -> ! {
    println!("{diagnostic}");
    exit(1);
}

/// Same, but rendered against the source.
pub fn fail_pretty(diagnostic: &Diagnostic, source: &str, path: &Path) -> ! {
    let printer = mjc_compiler::DiagnosticsPrinter::new(diagnostic, source);
    println!("{}", printer.path(&path.display().to_string()).render());
    exit(1);
}
