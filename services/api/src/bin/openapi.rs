//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document for the REST API (`openapi.json` unless a path
//! is given). With `--check` it compares the existing file instead and exits
//! non-zero when the file no longer matches the handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

#[derive(Debug, PartialEq)]
enum Mode {
    Write,
    Check,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> (Mode, PathBuf) {
    let mut mode = Mode::Write;
    let mut path = PathBuf::from("openapi.json");
    for arg in args {
        if arg == "--check" {
            mode = Mode::Check;
        } else {
            path = PathBuf::from(arg);
        }
    }
    (mode, path)
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let (mode, path) = parse_args(std::env::args().skip(1));
    let document = ApiDoc::openapi().to_pretty_json()?;

    match mode {
        Mode::Write => {
            std::fs::write(&path, &document)?;
            println!("OpenAPI document written to {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Mode::Check => {
            let on_disk = std::fs::read_to_string(&path)?;
            if on_disk == document {
                println!("{} is up to date", path.display());
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!(
                    "{} is stale; regenerate it with `cargo run --bin openapi`",
                    path.display()
                );
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn defaults_to_writing_openapi_json() {
        assert_eq!(parse_args(args(&[])), (Mode::Write, PathBuf::from("openapi.json")));
    }

    #[test]
    fn check_flag_and_path_in_any_order() {
        let expected = (Mode::Check, PathBuf::from("docs/api.json"));
        assert_eq!(parse_args(args(&["--check", "docs/api.json"])), expected);
        assert_eq!(parse_args(args(&["docs/api.json", "--check"])), expected);
    }
}
