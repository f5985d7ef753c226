//! XML payload fixtures shared by the integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Path to a canned `methodResponse` document
pub fn response_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/responses")
        .join(format!("{name}.xml"))
}

/// Contents of a canned `methodResponse` document
pub fn response(name: &str) -> Vec<u8> {
    let path = response_path(name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()))
}
