use crate::core::document::Element;
use std::fmt;

pub const DEFAULT_WIDTH: f64 = 1299.0;
pub const DEFAULT_HEIGHT: f64 = 1299.0;
pub const DEFAULT_X: f64 = 642.5;
pub const DEFAULT_Y: f64 = 1091.5;

/// 一個座標或尺寸值，保留寫回 SVG 時使用的原始文字
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub value: f64,
    pub text: String,
}

impl Dimension {
    pub fn fallback(value: f64) -> Self {
        Self {
            value,
            text: value.to_string(),
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        let text = raw.trim();
        let value = leading_number(text)?;
        Some(Self {
            value,
            text: text.to_string(),
        })
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub x: Dimension,
    pub y: Dimension,
    pub width: Dimension,
    pub height: Dimension,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            x: Dimension::fallback(DEFAULT_X),
            y: Dimension::fallback(DEFAULT_Y),
            width: Dimension::fallback(DEFAULT_WIDTH),
            height: Dimension::fallback(DEFAULT_HEIGHT),
        }
    }
}

/// The first direct `rect` child of the placeholder group.
pub fn layout_rect(group: &Element) -> Option<&Element> {
    group.child_elements().find(|child| child.local_name() == "rect")
}

/// Position and size for the QR graphic. Every field falls back on its own default when the
/// rectangle lacks it or it does not parse; coordinates may be zero or negative, sizes must be
/// positive.
pub fn resolve_geometry(group: &Element) -> Geometry {
    let Some(rect) = layout_rect(group) else {
        return Geometry::default();
    };

    Geometry {
        x: coordinate(rect, "x", DEFAULT_X),
        y: coordinate(rect, "y", DEFAULT_Y),
        width: size(rect, "width", DEFAULT_WIDTH),
        height: size(rect, "height", DEFAULT_HEIGHT),
    }
}

fn coordinate(rect: &Element, name: &str, default: f64) -> Dimension {
    rect.attribute(name)
        .and_then(Dimension::parse)
        .unwrap_or_else(|| Dimension::fallback(default))
}

fn size(rect: &Element, name: &str, default: f64) -> Dimension {
    rect.attribute(name)
        .and_then(Dimension::parse)
        .filter(|dimension| dimension.value > 0.0)
        .unwrap_or_else(|| Dimension::fallback(default))
}

/// Longest numeric prefix of `text` (`"100px"` -> 100). A prefix that overflows to infinity
/// is rejected rather than shortened.
fn leading_number(text: &str) -> Option<f64> {
    let end = numeric_prefix_len(text.as_bytes())?;
    text[..end].parse::<f64>().ok().filter(|value| value.is_finite())
}

/// 一次掃描：符號、整數、小數、指數
fn numeric_prefix_len(bytes: &[u8]) -> Option<usize> {
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let integer = digits_from(end);
    end += integer;

    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits_from(end + 1);
        if fraction > 0 || integer > 0 {
            end += 1 + fraction;
        }
    }
    if integer == 0 && fraction == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exponent = digits_from(end + 1 + sign);
        if exponent > 0 {
            end += 1 + sign + exponent;
        }
    }

    Some(end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::parse;

    fn group(text: &str) -> Element {
        parse(text).unwrap().root().unwrap().clone()
    }

    #[test]
    fn test_reads_all_four_values() {
        let g = group(r#"<g id="qrcode"><rect x="10" y="20" width="100" height="150"/></g>"#);
        let geometry = resolve_geometry(&g);

        assert_eq!(geometry.x.value, 10.0);
        assert_eq!(geometry.y.value, 20.0);
        assert_eq!(geometry.width.value, 100.0);
        assert_eq!(geometry.height.value, 150.0);
        assert_eq!(geometry.x.text, "10");
    }

    #[test]
    fn test_fields_fall_back_independently() {
        let g = group(r#"<g id="qrcode"><rect x="left" width="300" height="abc"/></g>"#);
        let geometry = resolve_geometry(&g);

        assert_eq!(geometry.width.value, 300.0);
        assert_eq!(geometry.x.value, DEFAULT_X);
        assert_eq!(geometry.x.text, "642.5");
        assert_eq!(geometry.y.value, DEFAULT_Y);
        assert_eq!(geometry.height.value, DEFAULT_HEIGHT);
        assert_eq!(geometry.height.text, "1299");
    }

    #[test]
    fn test_no_rect_gives_full_defaults() {
        let g = group(r#"<g id="qrcode"><circle r="4"/><g><rect x="1"/></g></g>"#);
        let geometry = resolve_geometry(&g);

        assert_eq!(geometry, Geometry::default());
        assert_eq!(
            (geometry.width.value, geometry.height.value, geometry.x.value, geometry.y.value),
            (1299.0, 1299.0, 642.5, 1091.5)
        );
    }

    #[test]
    fn test_first_rect_child_is_used() {
        let g = group(r#"<g><path d="M0 0"/><rect x="5"/><rect x="7"/></g>"#);
        assert_eq!(resolve_geometry(&g).x.value, 5.0);
    }

    #[test]
    fn test_zero_coordinates_are_kept_but_zero_sizes_fall_back() {
        let g = group(r#"<g><rect x="0" y="-12.5" width="0" height="-4"/></g>"#);
        let geometry = resolve_geometry(&g);

        assert_eq!(geometry.x.value, 0.0);
        assert_eq!(geometry.y.value, -12.5);
        assert_eq!(geometry.width.value, DEFAULT_WIDTH);
        assert_eq!(geometry.height.value, DEFAULT_HEIGHT);
    }

    #[test]
    fn test_units_are_kept_verbatim() {
        let g = group(r#"<g><rect x=" 12.50 " width="100px" height="inf"/></g>"#);
        let geometry = resolve_geometry(&g);

        assert_eq!(geometry.x.value, 12.5);
        assert_eq!(geometry.x.text, "12.50");
        assert_eq!(geometry.width.value, 100.0);
        assert_eq!(geometry.width.to_string(), "100px");
        assert_eq!(geometry.height.value, DEFAULT_HEIGHT);
    }

    #[test]
    fn test_numeric_prefix_forms() {
        assert_eq!(leading_number("100px"), Some(100.0));
        assert_eq!(leading_number("-.5em"), Some(-0.5));
        assert_eq!(leading_number("3."), Some(3.0));
        assert_eq!(leading_number("2e3"), Some(2000.0));
        assert_eq!(leading_number("2e+x"), Some(2.0));
        assert_eq!(leading_number("1.5E-1%"), Some(0.15));
        assert_eq!(leading_number("."), None);
        assert_eq!(leading_number("-"), None);
        assert_eq!(leading_number("e5"), None);
        assert_eq!(leading_number("inf"), None);
        assert_eq!(leading_number("NaN"), None);
    }

    #[test]
    fn test_overflowing_size_falls_back_whole() {
        let g = group(r#"<g><rect x="-1e999" width="1e400" height="7e1"/></g>"#);
        let geometry = resolve_geometry(&g);

        assert_eq!(geometry.width.value, DEFAULT_WIDTH);
        assert_eq!(geometry.width.text, "1299");
        assert_eq!(geometry.x.value, DEFAULT_X);
        assert_eq!(geometry.height.value, 70.0);
        assert_eq!(geometry.height.text, "7e1");
    }

    #[test]
    fn test_resolver_does_not_touch_rect() {
        let g = group(r#"<g><rect x="bad" width="10"/></g>"#);
        let before = g.clone();
        let _ = resolve_geometry(&g);
        assert_eq!(g, before);
    }
}
