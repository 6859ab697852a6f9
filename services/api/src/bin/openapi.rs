//! services/api/src/bin/openapi.rs
//!
//! Writes the positions API document, the one served at
//! `/api-docs/openapi.json`, to disk. The output path defaults to
//! `openapi.json` and may be given as the first argument.

use api_lib::web::rest::ApiDoc;
use std::path::PathBuf;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let doc = ApiDoc::openapi();
    std::fs::write(&output, doc.to_pretty_json()?)?;
    println!(
        "Wrote {} API paths to {}",
        doc.paths.paths.len(),
        output.display()
    );
    Ok(())
}
