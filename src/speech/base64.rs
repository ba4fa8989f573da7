//! Base64 decoding for audio payloads returned as JSON strings.

/// Decode standard base64, ignoring whitespace. Padding is optional.
pub fn decode(input: &str) -> Result<Vec<u8>, String> {
    fn value(c: u8) -> Option<u32> {
        match c {
            b'A'..=b'Z' => Some((c - b'A') as u32),
            b'a'..=b'z' => Some((c - b'a') as u32 + 26),
            b'0'..=b'9' => Some((c - b'0') as u32 + 52),
            b'+' | b'-' => Some(62),
            b'/' | b'_' => Some(63),
            _ => None,
        }
    }

    let symbols: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let data = match symbols.iter().position(|&b| b == b'=') {
        Some(pad) => {
            if symbols[pad..].iter().any(|&b| b != b'=') {
                return Err("data after padding".to_string());
            }
            &symbols[..pad]
        }
        None => &symbols[..],
    };

    if data.len() % 4 == 1 {
        return Err("invalid length".to_string());
    }

    let mut out = Vec::with_capacity(data.len() * 3 / 4);
    for chunk in data.chunks(4) {
        let mut acc = 0u32;
        for (i, &c) in chunk.iter().enumerate() {
            let v = value(c).ok_or_else(|| format!("invalid character '{}'", c as char))?;
            acc |= v << (18 - 6 * i);
        }

        out.push((acc >> 16) as u8);
        if chunk.len() > 2 {
            out.push((acc >> 8) as u8);
        }
        if chunk.len() > 3 {
            out.push(acc as u8);
        }
    }

    Ok(out)
}
