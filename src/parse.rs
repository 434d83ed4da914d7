use std::fs;
use std::path::Path;

use crate::error::Error;

/// Read a source file as-is.
pub fn read_source(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse `source` into a syntax tree; `file` only labels errors.
pub fn parse_source(source: &str, file: &str) -> Result<syn::File, Error> {
    syn::parse_file(source).map_err(|err| {
        let start = err.span().start();
        Error::Parse {
            file: file.to_string(),
            line: start.line,
            // LineColumn columns are 0-based.
            column: start.column + 1,
            message: err.to_string(),
        }
    })
}

/// Re-emit a syntax tree, then confirm the text parses back.
pub fn emit_source(file: &syn::File, label: &str) -> Result<String, Error> {
    let output = prettyplease::unparse(file);
    syn::parse_file(&output).map_err(|err| Error::Emit {
        file: label.to_string(),
        message: err.to_string(),
    })?;
    Ok(output)
}
