use sdqctl_core::OutputFormat;
use sdqctl_parser::{ParseDiagnostic, ParseOutcome};
use serde_json::json;
use std::path::PathBuf;

/// Exit code convention for `validate`: 0 means the workflow parsed
/// clean (lenient mode tolerates warnings), 1 means it didn't.
pub async fn handle_validate(workflow: PathBuf, lenient: bool, format: OutputFormat) -> i32 {
    let outcome = sdqctl_parser::parse_file(&workflow);
    match outcome {
        ParseOutcome::Ok { warnings, .. } => {
            if warnings.is_empty() {
                print_ok(format, &[]);
                0
            } else if lenient {
                print_ok(format, &warnings);
                0
            } else {
                print_diagnostics(format, "warning", &warnings);
                1
            }
        }
        ParseOutcome::Err(diagnostics) => {
            print_diagnostics(format, "error", &diagnostics);
            1
        }
    }
}

fn print_ok(format: OutputFormat, warnings: &[ParseDiagnostic]) {
    match format {
        OutputFormat::Text => {
            if warnings.is_empty() {
                println!("ok");
            } else {
                println!("ok, with {} warning(s):", warnings.len());
                for warning in warnings {
                    println!("  {warning}");
                }
            }
        }
        OutputFormat::Json => {
            let body = json!({
                "ok": true,
                "warnings": warnings.iter().map(diagnostic_to_json).collect::<Vec<_>>(),
            });
            println!("{body}");
        }
    }
}

fn print_diagnostics(format: OutputFormat, label: &str, diagnostics: &[ParseDiagnostic]) {
    match format {
        OutputFormat::Text => {
            for diagnostic in diagnostics {
                eprintln!("{label}: {diagnostic}");
            }
        }
        OutputFormat::Json => {
            let body = json!({
                "ok": false,
                "diagnostics": diagnostics.iter().map(diagnostic_to_json).collect::<Vec<_>>(),
            });
            println!("{body}");
        }
    }
}

fn diagnostic_to_json(diagnostic: &ParseDiagnostic) -> serde_json::Value {
    json!({
        "file": diagnostic.file.display().to_string(),
        "line": diagnostic.line,
        "message": diagnostic.message,
        "fix_hint": diagnostic.fix_hint,
    })
}
