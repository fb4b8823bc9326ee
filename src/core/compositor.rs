//! Splices a generated QR graphic into the template's placeholder group.

use crate::core::document::{self, Document, Element, Node};
use crate::core::geometry::{layout_rect, resolve_geometry, Geometry};
use crate::core::locator::{
    collect_attribute_values, find_group_by_tag_and_id, find_group_by_tag_and_id_mut,
};
use crate::utils::error::{BatchError, Result};

pub const DEFAULT_GROUP_ID: &str = "qrcode";
pub const GROUP_TAG: &str = "g";
pub const ASPECT_RATIO: &str = "xMidYMid meet";
const INDENT: usize = 2;

/// A template parsed and checked once, reused for every record.
#[derive(Debug, Clone)]
pub struct Compositor {
    template: Document,
    group_id: String,
    geometry: Geometry,
}

impl Compositor {
    /// 解析模板並確認佔位群組存在，失敗時整個批次不應開始
    pub fn new(template: &str, group_id: impl Into<String>) -> Result<Self> {
        let group_id = group_id.into();
        let template = document::parse(template)?;

        let group = placeholder_group(&template, &group_id)?;
        let geometry = resolve_geometry(group);

        Ok(Self {
            template,
            group_id,
            geometry,
        })
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Geometry the QR graphic will occupy.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Merge one QR graphic into a copy of the template and serialize it.
    pub fn composite(&self, qr_svg: &str) -> Result<String> {
        let qr = document::parse(qr_svg)?;
        let mut merged = self.template.clone();
        splice(&mut merged, &qr, &self.group_id)?;
        Ok(document::serialize(&merged, INDENT))
    }
}

/// One-shot merge of `qr_svg` into `template` at the group whose id is `group_id`.
pub fn composite(template: &str, qr_svg: &str, group_id: &str) -> Result<String> {
    let mut template = document::parse(template)?;
    let qr = document::parse(qr_svg)?;
    splice(&mut template, &qr, group_id)?;
    Ok(document::serialize(&template, INDENT))
}

/// The `<svg>` element that positions the QR content inside the template.
pub fn build_wrapper(geometry: &Geometry, view_box: &str, content: Vec<Node>) -> Element {
    let mut wrapper = Element::new("svg")
        .with_attribute("x", geometry.x.to_string())
        .with_attribute("y", geometry.y.to_string())
        .with_attribute("width", geometry.width.to_string())
        .with_attribute("height", geometry.height.to_string())
        .with_attribute("viewBox", view_box)
        .with_attribute("preserveAspectRatio", ASPECT_RATIO);
    wrapper.children = content;
    wrapper
}

fn splice(template: &mut Document, qr: &Document, group_id: &str) -> Result<()> {
    let group = match template
        .root_mut()
        .and_then(|root| find_group_by_tag_and_id_mut(root, GROUP_TAG, group_id))
    {
        Some(group) => group,
        None => {
            let available = collect_attribute_values(&template.nodes, "id");
            return Err(not_found(group_id, available));
        }
    };

    let qr_root = qr.root().ok_or_else(|| BatchError::MalformedQrGraphic {
        message: "generator output has no top-level element".to_string(),
    })?;
    let view_box = qr_root
        .attribute("viewBox")
        .ok_or_else(|| BatchError::MalformedQrGraphic {
            message: format!("top-level <{}> has no viewBox attribute", qr_root.name),
        })?;

    let geometry = resolve_geometry(group);
    let rect = layout_rect(group).cloned();
    let wrapper = build_wrapper(&geometry, view_box, qr_root.children.clone());

    tracing::trace!(
        "Placing QR at x={} y={} width={} height={} (viewBox {})",
        geometry.x,
        geometry.y,
        geometry.width,
        geometry.height,
        view_box
    );

    // 保留版面矩形在前，QR 在最後才會疊在上方
    group.children = match rect {
        Some(rect) => vec![Node::Element(rect), Node::Element(wrapper)],
        None => vec![Node::Element(wrapper)],
    };

    Ok(())
}

fn placeholder_group<'a>(template: &'a Document, group_id: &str) -> Result<&'a Element> {
    template
        .root()
        .and_then(|root| find_group_by_tag_and_id(root, GROUP_TAG, group_id))
        .ok_or_else(|| not_found(group_id, collect_attribute_values(&template.nodes, "id")))
}

fn not_found(group_id: &str, available: Vec<String>) -> BatchError {
    BatchError::PlaceholderNotFound {
        id: group_id.to_string(),
        available,
    }
}
