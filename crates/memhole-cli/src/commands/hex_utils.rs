//! Hex parsing and dump formatting.

use anyhow::{Context, Result, bail};

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Parse a target address given in hex, `0x` prefix optional.
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let digits = strip_hex_prefix(s.trim());
    u64::from_str_radix(digits, 16).with_context(|| format!("Invalid hex address {:?}", s))
}

/// Parse a hex byte string such as `AABB`, `0xAABB` or `aa bb`.
pub fn parse_hex_bytes(s: &str) -> Result<Vec<u8>> {
    let digits: String = strip_hex_prefix(s.trim())
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if digits.is_empty() {
        bail!("No bytes given");
    }
    if !digits.is_ascii() {
        bail!("Invalid hex bytes {:?}: non-ASCII characters", s);
    }
    if digits.len() % 2 != 0 {
        bail!("Odd number of hex digits: {}", digits.len());
    }

    digits
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair)?;
            u8::from_str_radix(pair, 16).with_context(|| format!("Invalid hex byte {:?}", pair))
        })
        .collect()
}

/// Format bytes in 16-byte hexdump rows, labelled with absolute addresses.
///
/// ```text
/// 0x1000: 48 65 6C 6C 6F 20 57 6F  72 6C 64 00 00 00 00 00  |Hello World.....|
/// ```
pub fn format_hexdump(base: u64, bytes: &[u8], ascii: bool) -> String {
    let mut out = String::new();

    for (i, chunk) in bytes.chunks(16).enumerate() {
        out.push_str(&format!("0x{:X}: ", base.wrapping_add(i as u64 * 16)));

        for j in 0..16 {
            if j == 8 {
                out.push(' ');
            }
            match chunk.get(j) {
                Some(byte) => out.push_str(&format!("{:02X} ", byte)),
                None => out.push_str("   "),
            }
        }

        if ascii {
            out.push_str(" |");
            for byte in chunk {
                if (0x20..0x7F).contains(byte) {
                    out.push(*byte as char);
                } else {
                    out.push('.');
                }
            }
            for _ in chunk.len()..16 {
                out.push(' ');
            }
            out.push('|');
        }

        out.push('\n');
    }

    out
}
