//! Wire format for gossip frames.
//!
//! Each action is serialized as self-describing JSON and framed with a
//! single trailing newline on the byte stream. A frame that fails to
//! decode is dropped by the reader without terminating the stream.

use murmur_core::Action;

use crate::error::{NetError, Result};

/// Serialize an action into a newline-terminated frame.
pub fn encode_frame(action: &Action) -> Result<Vec<u8>> {
    let mut buf = serde_json::to_vec(action).map_err(|e| NetError::Encoding(e.to_string()))?;
    buf.push(b'\n');
    Ok(buf)
}

/// Decode a single frame. The trailing newline, if present, is ignored.
pub fn decode_frame(frame: &[u8]) -> Result<Action> {
    let body = match frame.last() {
        Some(b'\n') => &frame[..frame.len() - 1],
        _ => frame,
    };
    serde_json::from_slice(body).map_err(|e| NetError::Decoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::Parameters;

    fn sample_action() -> Action {
        let mut params = Parameters::new();
        params.insert("key".to_string(), serde_json::json!("value"));
        Action::new("boards", "post", params).unwrap()
    }

    #[test]
    fn test_frame_roundtrip() {
        let action = sample_action();
        let frame = encode_frame(&action).unwrap();
        assert_eq!(frame.last(), Some(&b'\n'));
        assert!(!frame[..frame.len() - 1].contains(&b'\n'));

        let decoded = decode_frame(&frame).unwrap();
        assert_eq!(decoded, action);
        assert_eq!(decoded.hash, action.hash);
    }

    #[test]
    fn test_decode_without_trailing_newline() {
        let action = sample_action();
        let mut frame = encode_frame(&action).unwrap();
        frame.pop();
        assert_eq!(decode_frame(&frame).unwrap(), action);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            decode_frame(b"not json\n"),
            Err(NetError::Decoding(_))
        ));
    }
}
