use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Piped stdin contents, or None when stdin is a terminal or carries nothing.
pub fn read_piped() -> io::Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(trimmed.to_string()))
}

/// Deserialise a piped JSON document, if any.
pub fn read_json<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    match read_piped()? {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}
