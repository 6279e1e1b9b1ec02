use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// How a rate file on disk is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateFileFormat {
    /// `[{"date": ..., "rate": ...}, ...]`
    Json,
    /// `date,rate` rows, header optional
    Csv,
}

impl RateFileFormat {
    /// `.json` files are arrays; anything else is treated as CSV.
    pub fn from_path(path: &str) -> Self {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => RateFileFormat::Json,
            _ => RateFileFormat::Csv,
        }
    }
}

/// Read a whole file as text.
pub fn read_text(path: &str) -> Result<String, Box<dyn std::error::Error>> {
    let file = existing_file(path)?;
    fs::read_to_string(&file)
        .map_err(|e| format!("Failed to read '{}': {}", file.display(), e).into())
}

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let contents = read_text(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", path, e).into())
}

/// Absolute path of an existing regular file.
fn existing_file(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let absolute = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !absolute.exists() {
        return Err(format!("File not found: {}", absolute.display()).into());
    }
    if !absolute.is_file() {
        return Err(format!("Not a file: {}", absolute.display()).into());
    }
    Ok(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_file_format_from_extension() {
        assert_eq!(RateFileFormat::from_path("sonia.json"), RateFileFormat::Json);
        assert_eq!(RateFileFormat::from_path("SOFR.JSON"), RateFileFormat::Json);
        assert_eq!(RateFileFormat::from_path("sonia.csv"), RateFileFormat::Csv);
        assert_eq!(RateFileFormat::from_path("fixings"), RateFileFormat::Csv);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = read_text("definitely/not/here.csv").unwrap_err();
        assert!(err.to_string().starts_with("File not found"));
    }
}
