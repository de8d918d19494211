/// General CLI utilities.
use std::process;

/// Print `message` to stdout and exit with code 1.
pub fn fatal(message: &str) -> ! {
    println!("{message}");
    process::exit(1);
}
