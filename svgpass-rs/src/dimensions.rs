//! Width and height extraction from the root `svg` element.

use serde::{Deserialize, Serialize};

use crate::node::XmlDocument;
use crate::xml::RawDimensions;

/// Document dimensions. Unparseable values are kept as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl Dimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Dimensions {
            width: Some(width),
            height: Some(height),
        }
    }

    /// True when neither width nor height is known.
    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }
}

impl From<&RawDimensions> for Dimensions {
    fn from(raw: &RawDimensions) -> Self {
        Dimensions::new(parse_float(&raw.width), parse_float(&raw.height))
    }
}

/// Extracts the dimensions of the first top-level `svg` element.
///
/// Explicit `width` and `height` attributes win over `viewBox`, whose third
/// and fourth components are used otherwise.
pub fn extract_dimensions(document: &XmlDocument) -> Option<Dimensions> {
    let svg = document.first_element("svg")?;

    if svg.has_attr("width") && svg.has_attr("height") {
        return Some(Dimensions::new(
            parse_float(svg.attr_value("width").unwrap_or_default()),
            parse_float(svg.attr_value("height").unwrap_or_default()),
        ));
    }

    if svg.has_attr("viewBox") {
        let view_box = split_view_box(svg.attr_value("viewBox").unwrap_or_default());
        let component = |i: usize| view_box.get(i).map_or(f64::NAN, |s| parse_float(s));
        return Some(Dimensions::new(component(2), component(3)));
    }

    None
}

/// Splits a viewBox value on commas (with trailing whitespace) or
/// whitespace runs.
fn split_view_box(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = value;
    loop {
        let Some(pos) = rest.find(|c: char| c == ',' || c.is_whitespace()) else {
            parts.push(rest);
            return parts;
        };
        parts.push(&rest[..pos]);
        let after = &rest[pos..];
        let sep_len = if after.starts_with(',') {
            1 + after[1..].len() - after[1..].trim_start().len()
        } else {
            after.len() - after.trim_start().len()
        };
        rest = &rest[pos + sep_len..];
    }
}

/// Parses the longest numeric prefix of `value`, ignoring leading
/// whitespace. Returns NaN when there is none, so `"12px"` is 12 and
/// `"auto"` is NaN.
pub fn parse_float(value: &str) -> f64 {
    let s = value.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        return s[..end + "Infinity".len()].parse().unwrap_or(f64::NAN);
    }

    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - digits_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return f64::NAN;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().unwrap_or(f64::NAN)
}
