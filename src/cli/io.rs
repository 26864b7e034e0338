//! JSON I/O handling for the CLI
//!
//! - Input: a single JSON document on stdin (may span lines)
//! - Output: a single JSON object line on stdout
//! - UTF-8 only

use std::io::{self, Read, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read a JSON request from stdin
pub fn read_request() -> CliResult<Value> {
    read_request_from(&mut io::stdin().lock())
}

/// Read a JSON request from any reader
pub fn read_request_from<R: Read>(reader: &mut R) -> CliResult<Value> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;

    if input.trim().is_empty() {
        return Err(CliError::Request("empty input".into()));
    }

    Ok(serde_json::from_str(&input)?)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_response_to(&mut io::stdout().lock(), data)
}

/// Write `{"status":"ok","data":...}` to a writer
pub fn write_response_to<W: Write>(writer: &mut W, data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    serde_json::to_writer(&mut *writer, &response)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Write an error response to stdout
pub fn write_error(err: &CliError) -> CliResult<()> {
    write_error_to(&mut io::stdout().lock(), err)
}

/// Write `{"status":"error","code":..,"message":..}` to a writer
///
/// Planner rejections also carry the rejected explain under `explain`.
pub fn write_error_to<W: Write>(writer: &mut W, err: &CliError) -> CliResult<()> {
    let mut response = serde_json::json!({
        "status": "error",
        "code": err.code(),
        "message": err.message()
    });
    if let Some(explain) = err.rejection_explain() {
        response["explain"] = explain.to_json();
    }
    serde_json::to_writer(&mut *writer, &response)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
