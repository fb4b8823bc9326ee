//! QR vector generator: renders the module matrix from `qrcode` into a standalone SVG.

use crate::core::document::{self, Document, Element, Node};
use crate::domain::ports::QrGenerator;
use crate::utils::error::{BatchError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    #[serde(rename = "L")]
    Low,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "Q")]
    Quartile,
    #[default]
    #[serde(rename = "H")]
    High,
}

impl ErrorCorrection {
    fn level(self) -> EcLevel {
        match self {
            ErrorCorrection::Low => EcLevel::L,
            ErrorCorrection::Medium => EcLevel::M,
            ErrorCorrection::Quartile => EcLevel::Q,
            ErrorCorrection::High => EcLevel::H,
        }
    }
}

/// Logo drawn over the middle of the code.
#[derive(Debug, Clone, PartialEq)]
pub struct Logo {
    pub data_uri: String,
    /// Share of the code's width taken by the logo.
    pub image_size: f64,
    pub margin: u32,
    pub hide_background_dots: bool,
}

impl Logo {
    pub fn from_svg(svg: &[u8]) -> Self {
        Self {
            data_uri: format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg)),
            image_size: 0.25,
            margin: 5,
            hide_background_dots: true,
        }
    }

    /// 讀取 logo；`none` 或讀取失敗時回傳 None
    pub fn load(path: &str) -> Option<Self> {
        if path.eq_ignore_ascii_case("none") {
            return None;
        }
        match std::fs::read(Path::new(path)) {
            Ok(svg) => {
                tracing::debug!("Loaded logo {} ({} bytes)", path, svg.len());
                Some(Self::from_svg(&svg))
            }
            Err(e) => {
                tracing::warn!("⚠️ Could not load logo from {}: {}; continuing without logo", path, e);
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QrOptions {
    pub size: u32,
    pub margin: u32,
    pub dark_color: String,
    pub light_color: String,
    pub error_correction: ErrorCorrection,
    pub logo: Option<Logo>,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            size: 1000,
            margin: 10,
            dark_color: "#000000".to_string(),
            light_color: "#ffffff".to_string(),
            error_correction: ErrorCorrection::High,
            logo: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SvgQrGenerator {
    options: QrOptions,
}

impl SvgQrGenerator {
    pub fn new(options: QrOptions) -> Self {
        Self { options }
    }

    fn render(&self, code: &QrCode) -> Document {
        let options = &self.options;
        let count = code.width();
        let layout = Layout::new(options.size, options.margin, count);
        let hidden = options
            .logo
            .as_ref()
            .filter(|logo| logo.hide_background_dots)
            .map(|logo| layout.logo_span(logo))
            .unwrap_or(0);
        let hidden_start = (count - hidden) / 2;
        let is_hidden = |i: usize| i >= hidden_start && i < hidden_start + hidden;

        let mut path = String::new();
        for (y, row) in code.to_colors().chunks(count).enumerate() {
            for (x, &color) in row.iter().enumerate() {
                if color != qrcode::Color::Dark || (is_hidden(x) && is_hidden(y)) {
                    continue;
                }
                let _ = write!(
                    path,
                    "M{} {}h{d}v{d}h-{d}z",
                    layout.offset + x * layout.dot,
                    layout.offset + y * layout.dot,
                    d = layout.dot
                );
            }
        }

        let size = options.size.to_string();
        let mut root = Element::new("svg")
            .with_attribute("xmlns", SVG_NS)
            .with_attribute("width", size.as_str())
            .with_attribute("height", size.as_str())
            .with_attribute("viewBox", format!("0 0 {} {}", size, size))
            .with_child(
                Element::new("rect")
                    .with_attribute("x", "0")
                    .with_attribute("y", "0")
                    .with_attribute("width", size.as_str())
                    .with_attribute("height", size.as_str())
                    .with_attribute("fill", options.light_color.as_str()),
            )
            .with_child(
                Element::new("path")
                    .with_attribute("fill", options.dark_color.as_str())
                    .with_attribute("shape-rendering", "crispEdges")
                    .with_attribute("d", path),
            );

        if let Some(logo) = &options.logo {
            root = root.with_child(layout.logo_image(logo));
        }

        Document {
            declaration: None,
            nodes: vec![Node::Element(root)],
        }
    }
}

impl QrGenerator for SvgQrGenerator {
    fn generate(&self, payload: &str) -> Result<String> {
        let code = QrCode::with_error_correction_level(payload, self.options.error_correction.level())
            .map_err(|e| BatchError::GeneratorFailure {
                payload: payload.to_string(),
                message: e.to_string(),
            })?;

        tracing::trace!("Encoded {} bytes into {}x{} modules", payload.len(), code.width(), code.width());
        Ok(document::serialize(&self.render(&code), 0))
    }
}

/// 模組格線：整數點大小並置中於畫布
struct Layout {
    dot: usize,
    offset: usize,
    count: usize,
}

impl Layout {
    fn new(size: u32, margin: u32, count: usize) -> Self {
        let size = size as usize;
        let drawable = size.saturating_sub(2 * margin as usize);
        let dot = (drawable / count).max(1);
        let offset = size.saturating_sub(count * dot) / 2;
        Self { dot, offset, count }
    }

    /// Modules per side hidden under the logo, with the same parity as the code so the
    /// hole stays centered.
    fn logo_span(&self, logo: &Logo) -> usize {
        let covered = self.count as f64 * logo.image_size + 2.0 * logo.margin as f64 / self.dot as f64;
        let mut span = covered.ceil() as usize;
        if span % 2 != self.count % 2 {
            span += 1;
        }
        span.min(self.count)
    }

    fn logo_image(&self, logo: &Logo) -> Element {
        let extent = (self.count * self.dot) as f64 * logo.image_size;
        let origin = self.offset as f64 + ((self.count * self.dot) as f64 - extent) / 2.0;
        let value = |v: f64| format!("{}", (v * 100.0).round() / 100.0);

        Element::new("image")
            .with_attribute("x", value(origin))
            .with_attribute("y", value(origin))
            .with_attribute("width", value(extent))
            .with_attribute("height", value(extent))
            .with_attribute("preserveAspectRatio", "xMidYMid meet")
            .with_attribute("href", logo.data_uri.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::parse;

    fn root_of(svg: &str) -> Element {
        parse(svg).unwrap().root().unwrap().clone()
    }

    #[test]
    fn test_generates_svg_with_view_box() {
        let svg = SvgQrGenerator::default().generate("https://example.com/pay?id=1").unwrap();
        let root = root_of(&svg);

        assert_eq!(root.name, "svg");
        assert_eq!(root.attribute("viewBox"), Some("0 0 1000 1000"));

        let children: Vec<&Element> = root.child_elements().collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].attribute("fill"), Some("#ffffff"));
        assert_eq!(children[1].attribute("fill"), Some("#000000"));
        assert!(children[1].attribute("d").unwrap().starts_with('M'));
    }

    #[test]
    fn test_dots_stay_inside_margin() {
        let generator = SvgQrGenerator::default();
        let code = QrCode::with_error_correction_level("margin check", EcLevel::H).unwrap();
        let layout = Layout::new(1000, 10, code.width());

        assert!(layout.offset >= 10);
        assert!(layout.offset + code.width() * layout.dot <= 990);
        assert!(generator.generate("margin check").is_ok());
    }

    #[test]
    fn test_logo_is_embedded_and_hides_dots() {
        let plain = SvgQrGenerator::default();
        let with_logo = SvgQrGenerator::new(QrOptions {
            logo: Some(Logo::from_svg(br#"<svg viewBox="0 0 1 1"/>"#)),
            ..QrOptions::default()
        });

        let payload = "00020101021138570010A000000727012700069704070113ACC1230208QRIBFTTA";
        let plain_root = root_of(&plain.generate(payload).unwrap());
        let logo_root = root_of(&with_logo.generate(payload).unwrap());

        let image = logo_root.child_elements().find(|e| e.name == "image").unwrap();
        assert!(image.attribute("href").unwrap().starts_with("data:image/svg+xml;base64,"));
        // 只用無前綴的 href，嵌入模板後不會留下未宣告的 xlink 前綴
        assert!(image.attributes.keys().all(|name| !name.contains(':')));
        assert!(logo_root.attributes.keys().all(|name| !name.starts_with("xmlns:")));

        let dots = |root: &Element| {
            root.child_elements()
                .find(|e| e.name == "path")
                .and_then(|p| p.attribute("d"))
                .map(|d| d.matches('M').count())
                .unwrap()
        };
        assert!(dots(&logo_root) < dots(&plain_root));
    }

    #[test]
    fn test_logo_span_is_centered() {
        let layout = Layout::new(1000, 10, 33);
        let span = layout.logo_span(&Logo::from_svg(b"<svg/>"));
        assert_eq!(span % 2, 1);
        assert!(span >= 9 && span < 33);
    }

    #[test]
    fn test_oversized_payload_is_generator_failure() {
        let payload = "x".repeat(5000);
        let result = SvgQrGenerator::default().generate(&payload);
        assert!(matches!(result, Err(BatchError::GeneratorFailure { .. })));
    }

    #[test]
    fn test_missing_logo_file_is_skipped() {
        assert!(Logo::load("none").is_none());
        assert!(Logo::load("/definitely/not/here/logo.svg").is_none());
    }
}
