use pipesh::{Interpreter, Settings, logging};
use std::process;

fn main() {
    let settings: Settings = argh::from_env();
    if let Err(e) = logging::init(&settings) {
        eprintln!("pipesh: {:#}", e);
        process::exit(1);
    }

    let mut sh = Interpreter::new(&settings);
    match sh.repl() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("pipesh: {:#}", e);
            process::exit(1);
        }
    }
}
