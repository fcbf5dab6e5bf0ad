//! Helpers for the hex-quoted JSON the execution RPCs speak.

use serde_json::Value;

use super::EthError;

/// Decode a `0x…` JSON string into bytes.
pub fn hex_bytes(value: &Value, field: &str) -> Result<Vec<u8>, EthError> {
    let s = value.as_str().ok_or_else(|| EthError::MissingField(field.to_string()))?;
    let s = s.strip_prefix("0x").unwrap_or(s);
    // odd-length quantities get a leading zero nibble
    let padded;
    let s = if s.len() % 2 == 1 {
        padded = format!("0{s}");
        &padded
    } else {
        s
    };
    hex::decode(s).map_err(|e| EthError::InvalidHex {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

/// Decode a fixed-size `0x…` JSON string.
pub fn hex_array<const N: usize>(value: &Value, field: &str) -> Result<[u8; N], EthError> {
    let bytes = hex_bytes(value, field)?;
    bytes.try_into().map_err(|_| EthError::InvalidHex {
        field: field.to_string(),
        reason: format!("expected {N} bytes"),
    })
}

/// Decode a hex quantity (`0x1a2b`) into a u64.
pub fn hex_u64(value: &Value, field: &str) -> Result<u64, EthError> {
    let s = value.as_str().ok_or_else(|| EthError::MissingField(field.to_string()))?;
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).map_err(|e| EthError::InvalidHex {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

/// Decode a hex quantity into a left-padded 32-byte big-endian word.
pub fn hex_word(value: &Value, field: &str) -> Result<[u8; 32], EthError> {
    let bytes = hex_bytes(value, field)?;
    if bytes.len() > 32 {
        return Err(EthError::InvalidHex {
            field: field.to_string(),
            reason: "quantity longer than 32 bytes".to_string(),
        });
    }
    let mut word = [0u8; 32];
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(word)
}

/// Fetch a required field of a JSON object.
pub fn get<'a>(value: &'a Value, field: &str) -> Result<&'a Value, EthError> {
    match value.get(field) {
        Some(v) if !v.is_null() => Ok(v),
        _ => Err(EthError::MissingField(field.to_string())),
    }
}

/// Left-pad arbitrary big-endian bytes into a 32-byte word.
pub fn pad_word(bytes: &[u8]) -> Result<[u8; 32], EthError> {
    if bytes.len() > 32 {
        return Err(EthError::UnexpectedJson("quantity longer than 32 bytes".into()));
    }
    let mut word = [0u8; 32];
    word[32 - bytes.len()..].copy_from_slice(bytes);
    Ok(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hex_bytes() {
        assert_eq!(hex_bytes(&json!("0x0102"), "x").unwrap(), vec![1, 2]);
        assert_eq!(hex_bytes(&json!("0x1"), "x").unwrap(), vec![1]);
        assert_eq!(hex_bytes(&json!("0x"), "x").unwrap(), Vec::<u8>::new());
        assert!(hex_bytes(&json!(12), "x").is_err());
    }

    #[test]
    fn test_hex_u64() {
        assert_eq!(hex_u64(&json!("0x0"), "x").unwrap(), 0);
        assert_eq!(hex_u64(&json!("0x1234"), "x").unwrap(), 0x1234);
        assert!(hex_u64(&json!("0xzz"), "x").is_err());
    }

    #[test]
    fn test_hex_word_pads_left() {
        let word = hex_word(&json!("0x0de0b6b3a7640000"), "balance").unwrap();
        assert_eq!(&word[..24], &[0u8; 24]);
        assert_eq!(&word[24..], &[0x0d, 0xe0, 0xb6, 0xb3, 0xa7, 0x64, 0x00, 0x00]);
    }
}
