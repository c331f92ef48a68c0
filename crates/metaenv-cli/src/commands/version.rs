use metaenv_core::version::version_string;
use metaenv_core::VERSION;
use miette::{IntoDiagnostic, Result};

pub fn run(json: bool) -> Result<()> {
    if json {
        let report = serde_json::json!({ "name": "metaenv", "version": VERSION });
        println!("{}", serde_json::to_string(&report).into_diagnostic()?);
    } else {
        println!("{}", version_string());
    }
    Ok(())
}
