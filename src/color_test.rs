use super::*;

#[test]
fn parses_long_hex() {
    let color: Color = "#FF8800".parse().expect("valid color");
    assert_eq!(color.rgb(), (0xFF, 0x88, 0x00));
}

#[test]
fn parses_short_hex_by_doubling_digits() {
    let color: Color = "#f80".parse().expect("valid color");
    assert_eq!(color, Color::from_rgb(0xFF, 0x88, 0x00));
}

#[test]
fn display_is_lowercase_six_digit() {
    assert_eq!(Color::from_rgb(0xAB, 0x0C, 0x01).to_string(), "#ab0c01");
    assert_eq!(Color::BLACK.to_string(), "#000000");
}

#[test]
fn rejects_missing_hash() {
    let err = "ff0000".parse::<Color>().expect_err("hash is required");
    assert!(matches!(err, ValidationError::InvalidColor(_)));
}

#[test]
fn rejects_wrong_length_and_non_hex() {
    assert!("#ff00".parse::<Color>().is_err());
    assert!("#gg0000".parse::<Color>().is_err());
    assert!("#+f0000".parse::<Color>().is_err());
    assert!("".parse::<Color>().is_err());
}

#[test]
fn packed_value_above_24_bits_is_out_of_range() {
    let err = Color::from_packed(0x0100_0000).expect_err("out of range");
    assert_eq!(err, ValidationError::ColorOutOfRange(0x0100_0000));
    assert_eq!(Color::from_packed(0x00FF_FFFF).expect("max ok"), Color::WHITE);
}

#[test]
fn serde_uses_hex_text() {
    let json = serde_json::to_string(&Color::from_rgb(1, 2, 3)).expect("serialize");
    assert_eq!(json, "\"#010203\"");
    let back: Color = serde_json::from_str("\"#0000FF\"").expect("deserialize");
    assert_eq!(back, Color::from_rgb(0, 0, 0xFF));
    assert!(serde_json::from_str::<Color>("\"blue\"").is_err());
}

#[test]
fn palette_has_distinct_entries() {
    for (i, a) in PALETTE.iter().enumerate() {
        for b in &PALETTE[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn default_is_white_background() {
    assert_eq!(Color::default(), Color::WHITE);
}
