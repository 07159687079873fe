//! Genesis app-state extraction
//!
//! The engine hands InitChain a JSON object keyed by module name. Only the
//! configured module's raw JSON reaches the middleware; other modules'
//! entries are ignored.

use serde_json::value::RawValue;
use std::collections::HashMap;

/// Raw JSON bytes stored under `module`, or empty bytes when absent.
pub fn module_genesis(app_state: &[u8], module: &str) -> Result<Vec<u8>, serde_json::Error> {
    let modules: HashMap<String, Box<RawValue>> = serde_json::from_slice(app_state)?;
    Ok(modules
        .get(module)
        .map(|raw| raw.get().as_bytes().to_vec())
        .unwrap_or_default())
}
