//! `metaenv prefixes` command implementation.

use metaenv_core::MetaEnvOptions;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

#[derive(Serialize)]
struct PrefixesJson {
    schema_version: u32,
    prefixes: Vec<String>,
}

pub fn run(options: &MetaEnvOptions, json: bool) -> Result<()> {
    let prefixes = options.prefixes();

    if json {
        let report = PrefixesJson {
            schema_version: super::transform::SCHEMA_VERSION,
            prefixes,
        };
        println!("{}", serde_json::to_string(&report).into_diagnostic()?);
    } else if prefixes.is_empty() {
        println!("(no prefixes: only NODE_ENV, MODE, BASE_URL, DEV and PROD are rewritten)");
    } else {
        for prefix in prefixes {
            println!("{prefix}");
        }
    }

    Ok(())
}
