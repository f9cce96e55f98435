//! Entry name encodings.
//!
//! Names flagged with bit 11 are UTF-8; everything else is decoded as
//! code page 437. On write, pure ASCII names are stored unflagged and any
//! other name is stored as UTF-8 with the flag set.

use super::flags;

/// Code page 437 mapping for bytes `0x80..=0xFF`.
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', //
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', //
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', //
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', //
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', //
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', //
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{a0}',
];

/// Decodes code page 437 bytes.
pub fn decode_cp437(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b < 0x80 {
                b as char
            } else {
                CP437_HIGH[(b - 0x80) as usize]
            }
        })
        .collect()
}

/// Decodes a raw name or comment according to the entry flags.
///
/// Invalid UTF-8 in a flagged name is replaced rather than rejected.
pub fn decode_name(bytes: &[u8], entry_flags: u16) -> String {
    if entry_flags & flags::UTF8 != 0 {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        decode_cp437(bytes)
    }
}

/// Encodes a name for storage, returning the bytes and the flags to OR in.
pub fn encode_name(name: &str) -> (Vec<u8>, u16) {
    if name.is_ascii() {
        (name.as_bytes().to_vec(), 0)
    } else {
        (name.as_bytes().to_vec(), flags::UTF8)
    }
}

/// Normalizes a decoded name into the form used for lookups.
///
/// The name is cut at the first NUL, backslashes become `/` on Windows and
/// leading slashes are removed.
pub fn normalize(raw: &str) -> String {
    let cut = raw.split('\0').next().unwrap_or_default();
    let converted = if cfg!(windows) {
        cut.replace('\\', "/")
    } else {
        cut.to_string()
    };
    converted.trim_start_matches('/').to_string()
}
