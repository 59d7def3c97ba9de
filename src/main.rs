//! `elon` CLI binary.
//!
//! This is the minimal entrypoint. All logic lives in the library;
//! main.rs only invokes `cli::run()` and maps the returned exit code.

fn main() {
    if let Err(code) = elon::cli::run() {
        std::process::exit(code.as_i32());
    }
}
