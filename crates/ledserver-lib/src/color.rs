//! Color parsing and formatting for the send client.
//!
//! Colors are packed `0xRRGGBB`; the strip driver owns any further channel
//! reordering.

/// Parse a color string into packed `0xRRGGBB`.
///
/// Accepts:
/// - Hex: `"#FF0000"`, `"FF0000"`, `"#ff0000"`
/// - Named: `"red"`, `"green"`, `"blue"`, `"white"`, `"orange"`, `"yellow"`, `"purple"`, `"cyan"`
pub fn parse_color(s: &str) -> crate::error::Result<u32> {
    let s = s.trim();

    // Named colors
    match s.to_lowercase().as_str() {
        "red" => return Ok(0xFF_0000),
        "green" => return Ok(0x00_FF00),
        "blue" => return Ok(0x00_00FF),
        "white" => return Ok(0xFF_FFFF),
        "orange" => return Ok(0xFF_8000),
        "yellow" => return Ok(0xFF_FF00),
        "purple" => return Ok(0x80_00FF),
        "cyan" => return Ok(0x00_FFFF),
        "off" | "black" => return Ok(0x00_0000),
        _ => {}
    }

    // Hex color
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
        return Err(crate::LedserverError::Color(format!(
            "Invalid color: {s} (use #RRGGBB or a color name)"
        )));
    }
    u32::from_str_radix(hex, 16)
        .map_err(|_| crate::LedserverError::Color(format!("Invalid hex color: {s}")))
}

/// Format a packed color value as `#RRGGBB`.
pub fn format_color(val: u32) -> String {
    format!("#{:06X}", val & 0xFF_FFFF)
}
