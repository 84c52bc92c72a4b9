//! Color string parsing
//!
//! Accepted forms:
//! - hex: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`
//! - functional: `rgb(r, g, b)` and `rgba(r, g, b, a)` with integer channels
//! - CSS keywords (see [`crate::named`])
//!
//! Any alpha in the input is validated and then dropped: the caller's
//! opacity always wins.

use crate::error::{ColorError, Result};
use crate::named;
use crate::rgba::Rgb;
use nom::branch::alt;
use nom::bytes::complete::{tag_no_case, take_while1};
use nom::character::complete::{char, digit1, multispace0};
use nom::combinator::{all_consuming, map_res, opt, recognize};
use nom::number::complete::float;
use nom::sequence::{delimited, pair, preceded};
use nom::IResult;

/// Parse a color string into its RGB channels
pub fn parse_color(input: &str) -> Result<Rgb> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ColorError::invalid(input, "empty color string"));
    }

    if trimmed.starts_with('#') {
        return parse_hex(trimmed);
    }

    if let Ok((_, (channels, alpha))) = all_consuming(rgb_function)(trimmed) {
        if let Some(a) = alpha {
            if !(0.0..=1.0).contains(&a) {
                return Err(ColorError::invalid(input, "alpha out of range"));
            }
        }
        return Rgb::from_channels(channels)
            .ok_or_else(|| ColorError::invalid(input, "channel out of range"));
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("rgb") {
        return Err(ColorError::invalid(input, "malformed rgb() function"));
    }

    named::lookup(&lower)
        .map(Rgb::from)
        .ok_or_else(|| ColorError::invalid(input, "unknown color name"))
}

// ============================================================================
// Hex
// ============================================================================

fn hex_digits(input: &str) -> IResult<&str, &str> {
    preceded(char('#'), take_while1(|c: char| c.is_ascii_hexdigit()))(input)
}

/// Parse hex color: #RGB, #RGBA, #RRGGBB or #RRGGBBAA
fn parse_hex(input: &str) -> Result<Rgb> {
    let (_, hex) = all_consuming(hex_digits)(input)
        .map_err(|_| ColorError::invalid(input, "invalid hex digits"))?;

    // Digits are validated above, so radix conversion cannot fail
    let byte = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0);
    let doubled = |s: &str| byte(&s.repeat(2));

    let rgb = match hex.len() {
        3 | 4 => Rgb::new(doubled(&hex[0..1]), doubled(&hex[1..2]), doubled(&hex[2..3])),
        6 | 8 => Rgb::new(byte(&hex[0..2]), byte(&hex[2..4]), byte(&hex[4..6])),
        _ => return Err(ColorError::invalid(input, "invalid hex length")),
    };
    Ok(rgb)
}

// ============================================================================
// rgb() / rgba()
// ============================================================================

fn comma(input: &str) -> IResult<&str, char> {
    delimited(multispace0, char(','), multispace0)(input)
}

/// Signed integer channel; range is checked after parsing so negative and
/// oversized values report as out of range rather than malformed
fn channel(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), str::parse::<i64>)(input)
}

/// Parse rgb(r, g, b) or rgba(r, g, b, a); either name takes an optional alpha
fn rgb_function(input: &str) -> IResult<&str, ([i64; 3], Option<f32>)> {
    let (input, _) = alt((tag_no_case("rgba"), tag_no_case("rgb")))(input)?;
    let (input, _) = delimited(multispace0, char('('), multispace0)(input)?;
    let (input, r) = channel(input)?;
    let (input, _) = comma(input)?;
    let (input, g) = channel(input)?;
    let (input, _) = comma(input)?;
    let (input, b) = channel(input)?;
    let (input, alpha) = opt(preceded(comma, float))(input)?;
    let (input, _) = preceded(multispace0, char(')'))(input)?;

    Ok((input, ([r, g, b], alpha)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(input: &str) -> &'static str {
        match parse_color(input) {
            Err(ColorError::InvalidColorSpec { reason, .. }) => reason,
            other => panic!("expected InvalidColorSpec for {input:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_hex_forms() {
        assert_eq!(parse_color("#fff").unwrap(), Rgb::new(255, 255, 255));
        assert_eq!(parse_color("#FFFFFF").unwrap(), Rgb::new(255, 255, 255));
        assert_eq!(parse_color("#1e90ff").unwrap(), Rgb::new(30, 144, 255));
        assert_eq!(parse_color("#f008").unwrap(), Rgb::new(255, 0, 0));
        assert_eq!(parse_color("#00ff0080").unwrap(), Rgb::new(0, 255, 0));
        assert_eq!(parse_color("  #abc  ").unwrap(), Rgb::new(170, 187, 204));
    }

    #[test]
    fn test_hex_errors() {
        assert_eq!(reason("#ffff0"), "invalid hex length");
        assert_eq!(reason("#12345678a"), "invalid hex length");
        assert_eq!(reason("#ggg"), "invalid hex digits");
        assert_eq!(reason("#"), "invalid hex digits");
        assert_eq!(reason("#fff zzz"), "invalid hex digits");
    }

    #[test]
    fn test_rgb_function() {
        assert_eq!(parse_color("rgb(255, 0, 128)").unwrap(), Rgb::new(255, 0, 128));
        assert_eq!(parse_color("RGB( 1 ,2,3 )").unwrap(), Rgb::new(1, 2, 3));
        assert_eq!(
            parse_color("rgba(10, 20, 30, 0.5)").unwrap(),
            Rgb::new(10, 20, 30)
        );
    }

    #[test]
    fn test_out_of_range_channels_are_rejected() {
        assert_eq!(reason("rgb(256, 0, 0)"), "channel out of range");
        assert_eq!(reason("rgb(-1, 0, 0)"), "channel out of range");
        assert_eq!(reason("rgba(0, 0, 0, 1.5)"), "alpha out of range");
    }

    #[test]
    fn test_malformed_functions() {
        assert_eq!(reason("rgb(1, 2)"), "malformed rgb() function");
        assert_eq!(reason("rgb(1.5, 2, 3)"), "malformed rgb() function");
        assert_eq!(reason("rgb(1, 2, 3"), "malformed rgb() function");
    }

    #[test]
    fn test_names() {
        assert_eq!(parse_color("black").unwrap(), Rgb::new(0, 0, 0));
        assert_eq!(parse_color("CornflowerBlue").unwrap(), Rgb::new(100, 149, 237));
        assert_eq!(reason("not-a-color"), "unknown color name");
        assert_eq!(reason("   "), "empty color string");
    }
}
