//! JSON text-frame codec.
//!
//! One message per text frame. Size is checked before parsing so an oversized
//! frame never reaches the deserializer.

use serde::{Serialize, de::DeserializeOwned};

use crate::errors::{ProtocolError, Result};

/// Maximum encoded message size (1 MiB). Room snapshots are the largest
/// messages and stay far below this.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Encode a message as a JSON text frame.
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    let text = serde_json::to_string(msg)?;
    if text.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::TooLarge { size: text.len(), max: MAX_MESSAGE_SIZE });
    }
    Ok(text)
}

/// Decode a JSON text frame.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    if text.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::TooLarge { size: text.len(), max: MAX_MESSAGE_SIZE });
    }
    Ok(serde_json::from_str(text)?)
}
