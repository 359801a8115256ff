pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Typed calculator input from `--input <file>` or piped stdin.
pub fn load<T: DeserializeOwned>(path: Option<&str>, command: &str) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_structured(path);
    }
    match stdin::read_stdin()? {
        Some(data) => Ok(serde_json::from_value(data)?),
        None => Err(format!("--input <file.json|file.yaml> or stdin required for {command}").into()),
    }
}
