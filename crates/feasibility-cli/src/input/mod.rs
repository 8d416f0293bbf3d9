pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Load a typed request from a file path, or from piped stdin when no
/// path was given.
pub fn load<T: DeserializeOwned>(path: Option<&str>) -> Result<T, Box<dyn std::error::Error>> {
    match path {
        Some(p) => file::read_request(p),
        None => match stdin::read_stdin()? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Err("no input: pass --input <file> or pipe JSON on stdin".into()),
        },
    }
}
