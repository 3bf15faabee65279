//! CSS-flavoured value parsing: lengths, image dimensions, rotation and
//! content-scale transforms.
//!
//! The persisted format and the live surface both speak in unit-suffixed
//! strings (`"794px"`, `"rotate(45deg)"`, `"scale(-1, 1)"`). Everything is
//! normalized to CSS pixels on the way in and re-emitted in canonical form
//! on the way out.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use winnow::ascii::{float, multispace0};
use winnow::combinator::{alt, delimited, opt, preceded};
use winnow::prelude::*;

/// CSS reference pixels per inch.
pub const PX_PER_INCH: f64 = 96.0;

// ─── Formatting ──────────────────────────────────────────────────────────

/// Shortest round-trippable decimal form, with `-0` folded to `0`.
pub fn format_number(v: f64) -> String {
    if v == 0.0 {
        "0".to_string()
    } else {
        format!("{v}")
    }
}

/// Format a pixel value as `"<n>px"`.
pub fn format_px(v: f64) -> String {
    format!("{}px", format_number(v))
}

// ─── Primitive parsers ───────────────────────────────────────────────────

/// Signed decimal with optional fraction and exponent (`-12.5`, `.5`, `1e-7`).
fn parse_number(input: &mut &str) -> ModalResult<f64> {
    float.verify(|v: &f64| v.is_finite()).parse_next(input)
}

/// Multiplier that converts a length unit to CSS pixels.
fn length_unit(input: &mut &str) -> ModalResult<f64> {
    alt((
        "px".value(1.0),
        "pt".value(PX_PER_INCH / 72.0),
        "pc".value(PX_PER_INCH / 6.0),
        "in".value(PX_PER_INCH),
        "cm".value(PX_PER_INCH / 2.54),
        "mm".value(PX_PER_INCH / 25.4),
    ))
    .parse_next(input)
}

fn length(input: &mut &str) -> ModalResult<f64> {
    delimited(multispace0, (parse_number, opt(length_unit)), multispace0)
        .map(|(value, unit)| value * unit.unwrap_or(1.0))
        .parse_next(input)
}

/// Parse a length (`"794px"`, `"210mm"`, `"8.5in"`, `"12"`) into pixels.
pub fn parse_length(s: &str) -> CoreResult<f64> {
    length
        .parse(s)
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CoreError::InvalidLength(s.to_string()))
}

/// Parse a length that must be strictly positive.
pub fn parse_positive_length(s: &str, what: &'static str) -> CoreResult<f64> {
    let value = parse_length(s)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(CoreError::NonPositive { what, value })
    }
}

// ─── Image dimensions ────────────────────────────────────────────────────

/// A sizing value on an image inside its element: `px`, `%`, `auto`, `none`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Dim {
    Px(f64),
    Percent(f64),
    Auto,
    None,
}

fn dim(input: &mut &str) -> ModalResult<Dim> {
    delimited(
        multispace0,
        alt((
            "auto".value(Dim::Auto),
            "none".value(Dim::None),
            (parse_number, '%').map(|(v, _)| Dim::Percent(v)),
            (parse_number, opt(length_unit)).map(|(v, unit)| Dim::Px(v * unit.unwrap_or(1.0))),
        )),
        multispace0,
    )
    .parse_next(input)
}

impl Dim {
    pub fn parse(s: &str) -> CoreResult<Self> {
        dim.parse(s)
            .map_err(|_| CoreError::InvalidSize(s.to_string()))
    }

    /// Resolve against the containing box extent. `auto` and `none` fill it.
    pub fn resolve(&self, reference: f64) -> f64 {
        match self {
            Dim::Px(v) => *v,
            Dim::Percent(p) => reference * p / 100.0,
            Dim::Auto | Dim::None => reference,
        }
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Px(v) => write!(f, "{}", format_px(*v)),
            Dim::Percent(p) => write!(f, "{}%", format_number(*p)),
            Dim::Auto => f.write_str("auto"),
            Dim::None => f.write_str("none"),
        }
    }
}

// ─── Rotation ────────────────────────────────────────────────────────────

/// Whole-element rotation, stored as degrees. `None` renders as `none`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation(Option<f64>);

fn angle_unit(input: &mut &str) -> ModalResult<f64> {
    alt((
        "deg".value(1.0),
        "grad".value(0.9),
        "rad".value(180.0 / std::f64::consts::PI),
        "turn".value(360.0),
    ))
    .parse_next(input)
}

fn rotate_fn(input: &mut &str) -> ModalResult<f64> {
    preceded(
        (multispace0, "rotate(", multispace0),
        (parse_number, opt(angle_unit), multispace0, ')', multispace0),
    )
    .map(|(value, unit, _, _, _)| value * unit.unwrap_or(1.0))
    .parse_next(input)
}

impl Rotation {
    pub const NONE: Rotation = Rotation(None);

    pub fn degrees(deg: f64) -> Self {
        Rotation(Some(deg))
    }

    /// Angle in degrees (0 when unrotated).
    pub fn angle(&self) -> f64 {
        self.0.unwrap_or(0.0)
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    pub fn rotated_by(self, delta: f64) -> Self {
        Rotation(Some(self.angle() + delta))
    }

    /// Parse `none`, an empty string, or `rotate(<angle>)`.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "none" {
            return Ok(Rotation::NONE);
        }
        rotate_fn
            .parse(trimmed)
            .ok()
            .filter(|v| v.is_finite())
            .map(Rotation::degrees)
            .ok_or_else(|| CoreError::InvalidTransform(s.to_string()))
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => f.write_str("none"),
            Some(deg) => write!(f, "rotate({}deg)", format_number(deg)),
        }
    }
}

// ─── Content scale ───────────────────────────────────────────────────────

/// Non-uniform scale of an element's content layer. A negative factor
/// mirrors the content on that axis; the element box is unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Default for Scale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn scale_fn(input: &mut &str) -> ModalResult<(f64, Option<f64>)> {
    preceded(
        (multispace0, "scale(", multispace0),
        (
            parse_number,
            opt(preceded((multispace0, ',', multispace0), parse_number)),
            multispace0,
            ')',
            multispace0,
        ),
    )
    .map(|(x, y, _, _, _)| (x, y))
    .parse_next(input)
}

impl Scale {
    pub const IDENTITY: Scale = Scale { x: 1.0, y: 1.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Parse one factor as stored in the `scaleX`/`scaleY` attributes.
    /// Empty strings default to `1`.
    pub fn parse_factor(s: &str) -> CoreResult<f64> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(1.0);
        }
        parse_number
            .parse(trimmed)
            .ok()
            .filter(|v| v.is_finite() && *v != 0.0)
            .ok_or_else(|| CoreError::InvalidScale(s.to_string()))
    }

    /// Parse a content-layer transform: `scale(x, y)`, `scale(k)` or `none`.
    pub fn parse_css(s: &str) -> CoreResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "none" {
            return Ok(Scale::IDENTITY);
        }
        let (x, y) = scale_fn
            .parse(trimmed)
            .map_err(|_| CoreError::InvalidScale(s.to_string()))?;
        let y = y.unwrap_or(x);
        if x == 0.0 || y == 0.0 {
            return Err(CoreError::InvalidScale(s.to_string()));
        }
        Ok(Scale { x, y })
    }

    /// The content-layer transform string.
    pub fn css(&self) -> String {
        format!(
            "scale({}, {})",
            format_number(self.x),
            format_number(self.y)
        )
    }

    pub fn is_mirrored(&self) -> bool {
        self.x < 0.0 || self.y < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths_normalize_to_px() {
        assert_eq!(parse_length("794px").unwrap(), 794.0);
        assert_eq!(parse_length(" 12.5px ").unwrap(), 12.5);
        assert_eq!(parse_length("-20px").unwrap(), -20.0);
        assert_eq!(parse_length("300").unwrap(), 300.0);
        assert_eq!(parse_length("1in").unwrap(), 96.0);
        assert!((parse_length("210mm").unwrap() - 793.700_787).abs() < 1e-3);
        assert!((parse_length("72pt").unwrap() - 96.0).abs() < 1e-9);
        assert_eq!(parse_length("1e-7px").unwrap(), 1e-7);
        assert_eq!(parse_length(".5px").unwrap(), 0.5);
        assert_eq!(parse_length("+3").unwrap(), 3.0);
    }

    #[test]
    fn bad_lengths_are_rejected() {
        assert!(parse_length("").is_err());
        assert!(parse_length("px").is_err());
        assert!(parse_length("12 apples").is_err());
        assert!(parse_length("abc").is_err());
        assert!(parse_length("inf").is_err());
        assert!(parse_length("NaNpx").is_err());
        assert!(Scale::parse_factor("nan").is_err());
        assert!(matches!(
            parse_positive_length("0px", "width"),
            Err(CoreError::NonPositive { what: "width", .. })
        ));
    }

    #[test]
    fn px_formatting_is_canonical() {
        assert_eq!(format_px(50.0), "50px");
        assert_eq!(format_px(-0.0), "0px");
        assert_eq!(format_px(12.25), "12.25px");
        assert_eq!(parse_length(&format_px(0.1 + 0.2)).unwrap(), 0.1 + 0.2);
    }

    #[test]
    fn dims_parse_all_forms() {
        assert_eq!(Dim::parse("100%").unwrap(), Dim::Percent(100.0));
        assert_eq!(Dim::parse("240px").unwrap(), Dim::Px(240.0));
        assert_eq!(Dim::parse("none").unwrap(), Dim::None);
        assert_eq!(Dim::parse("auto").unwrap(), Dim::Auto);
        assert!(Dim::parse("wide").is_err());
        assert_eq!(Dim::Percent(50.0).resolve(300.0), 150.0);
        assert_eq!(Dim::None.resolve(80.0), 80.0);
        assert_eq!(Dim::Percent(100.0).to_string(), "100%");
    }

    #[test]
    fn rotation_parse_and_display() {
        assert_eq!(Rotation::parse("none").unwrap(), Rotation::NONE);
        assert_eq!(Rotation::parse("").unwrap(), Rotation::NONE);
        assert_eq!(Rotation::parse("rotate(45deg)").unwrap(), Rotation::degrees(45.0));
        assert_eq!(Rotation::parse("rotate(-12.5deg)").unwrap().angle(), -12.5);
        assert_eq!(Rotation::parse("rotate(0.5turn)").unwrap().angle(), 180.0);
        assert!(Rotation::parse("skew(10deg)").is_err());
        assert_eq!(Rotation::degrees(90.0).to_string(), "rotate(90deg)");
        assert_eq!(Rotation::NONE.to_string(), "none");
        assert_eq!(Rotation::NONE.rotated_by(90.0), Rotation::degrees(90.0));
    }

    #[test]
    fn scale_factors_and_css() {
        assert_eq!(Scale::parse_factor("-1").unwrap(), -1.0);
        assert_eq!(Scale::parse_factor("").unwrap(), 1.0);
        assert!(Scale::parse_factor("0").is_err());
        assert!(Scale::parse_factor("big").is_err());
        assert_eq!(Scale::parse_css("scale(-1, 1)").unwrap(), Scale::new(-1.0, 1.0));
        assert_eq!(Scale::parse_css("scale(2)").unwrap(), Scale::new(2.0, 2.0));
        assert_eq!(Scale::new(-1.0, 1.0).css(), "scale(-1, 1)");
        assert!(Scale::new(1.0, -1.0).is_mirrored());
    }
}
