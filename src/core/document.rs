//! Generic attributed tree for SVG/XML documents.
//!
//! Parsing is done with `quick-xml` events; the tree keeps element names exactly as written
//! (prefixes included) so that namespace declarations survive a round trip as plain attributes.

use crate::utils::error::{BatchError, Result};
use indexmap::IndexMap;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::Reader;
use std::fmt::Write as _;

/// XML declaration (`<?xml version="1.0" encoding="UTF-8"?>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub declaration: Option<Declaration>,
    /// 頂層節點，依原始順序保留 DOCTYPE、處理指令與註解
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    /// `<?target data?>`, stored without the delimiters.
    ProcessingInstruction(String),
    DocType(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Node>,
}

impl Document {
    /// 第一個頂層元素
    pub fn root(&self) -> Option<&Element> {
        self.nodes.iter().find_map(Node::as_element)
    }

    pub fn root_mut(&mut self) -> Option<&mut Element> {
        self.nodes.iter_mut().find_map(Node::as_element_mut)
    }
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    fn is_textual(&self) -> bool {
        matches!(self, Node::Text(_) | Node::CData(_))
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Tag name without its namespace prefix (`svg:rect` -> `rect`).
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }
}

/// 將文字解析為文件樹
pub fn parse(text: &str) -> Result<Document> {
    let mut reader = Reader::from_str(text);
    let mut document = Document::default();
    let mut open: Vec<Element> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(reader.buffer_position(), e))?;

        match event {
            Event::Start(start) => open.push(element_from_start(&start, reader.buffer_position())?),
            Event::Empty(start) => {
                let element = element_from_start(&start, reader.buffer_position())?;
                attach(&mut open, &mut document, Node::Element(element), reader.buffer_position())?;
            }
            Event::End(end) => {
                let name = decode_name(end.name().as_ref(), reader.buffer_position())?;
                let element = open.pop().ok_or_else(|| {
                    malformed(reader.buffer_position(), format!("unexpected closing tag </{}>", name))
                })?;
                if element.name != name {
                    return Err(malformed(
                        reader.buffer_position(),
                        format!("expected </{}>, found </{}>", element.name, name),
                    ));
                }
                attach(&mut open, &mut document, Node::Element(element), reader.buffer_position())?;
            }
            Event::Text(text) => {
                let content = text
                    .unescape()
                    .map_err(|e| malformed(reader.buffer_position(), e))?;
                // 元素之間的縮排空白不保留
                if content.trim().is_empty() {
                    continue;
                }
                let node = Node::Text(content.into_owned());
                attach(&mut open, &mut document, node, reader.buffer_position())?;
            }
            Event::CData(cdata) => {
                let content = String::from_utf8(cdata.into_inner().into_owned())
                    .map_err(|e| malformed(reader.buffer_position(), e))?;
                attach(&mut open, &mut document, Node::CData(content), reader.buffer_position())?;
            }
            Event::Comment(comment) => {
                let content = String::from_utf8_lossy(&comment).into_owned();
                attach(&mut open, &mut document, Node::Comment(content), reader.buffer_position())?;
            }
            Event::Decl(decl) => {
                document.declaration = Some(declaration_from_event(&decl, reader.buffer_position())?);
            }
            Event::DocType(doctype) => {
                let content = String::from_utf8_lossy(&doctype).trim().to_string();
                attach(&mut open, &mut document, Node::DocType(content), reader.buffer_position())?;
            }
            Event::PI(instruction) => {
                let content = String::from_utf8_lossy(&instruction).into_owned();
                let node = Node::ProcessingInstruction(content);
                attach(&mut open, &mut document, node, reader.buffer_position())?;
            }
            Event::Eof => break,
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(BatchError::MalformedMarkup {
            message: format!("unclosed element <{}> at end of input", unclosed.name),
        });
    }

    Ok(document)
}

/// 序列化文件樹，`indent` 為每層縮排的空白數
pub fn serialize(document: &Document, indent: usize) -> String {
    let mut out = String::new();

    if let Some(decl) = &document.declaration {
        let _ = write!(out, "<?xml version=\"{}\"", decl.version);
        if let Some(encoding) = &decl.encoding {
            let _ = write!(out, " encoding=\"{}\"", encoding);
        }
        if let Some(standalone) = &decl.standalone {
            let _ = write!(out, " standalone=\"{}\"", standalone);
        }
        out.push_str("?>\n");
    }

    for node in &document.nodes {
        write_block(&mut out, node, 0, indent);
    }
    out
}

fn write_block(out: &mut String, node: &Node, depth: usize, indent: usize) {
    out.push_str(&" ".repeat(depth * indent));

    match node {
        Node::Element(element) => {
            write_open_tag(out, element);
            if element.children.is_empty() {
                out.push_str("/>");
            } else if element.children.iter().any(Node::is_textual) {
                // 含文字的元素整段內嵌輸出，避免改動文字內容
                out.push('>');
                for child in &element.children {
                    write_inline(out, child);
                }
                let _ = write!(out, "</{}>", element.name);
            } else {
                out.push_str(">\n");
                for child in &element.children {
                    write_block(out, child, depth + 1, indent);
                }
                out.push_str(&" ".repeat(depth * indent));
                let _ = write!(out, "</{}>", element.name);
            }
        }
        other => write_inline(out, other),
    }
    out.push('\n');
}

fn write_inline(out: &mut String, node: &Node) {
    match node {
        Node::Element(element) => {
            write_open_tag(out, element);
            if element.children.is_empty() {
                out.push_str("/>");
            } else {
                out.push('>');
                for child in &element.children {
                    write_inline(out, child);
                }
                let _ = write!(out, "</{}>", element.name);
            }
        }
        Node::Text(text) => out.push_str(&partial_escape(text)),
        Node::CData(text) => {
            let _ = write!(out, "<![CDATA[{}]]>", text);
        }
        Node::Comment(text) => {
            let _ = write!(out, "<!--{}-->", text);
        }
        Node::ProcessingInstruction(text) => {
            let _ = write!(out, "<?{}?>", text);
        }
        Node::DocType(text) => {
            let _ = write!(out, "<!DOCTYPE {}>", text);
        }
    }
}

fn write_open_tag(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.name);
    for (name, value) in &element.attributes {
        let _ = write!(out, " {}=\"{}\"", name, escape(value));
    }
}

fn element_from_start(start: &BytesStart<'_>, position: usize) -> Result<Element> {
    let mut element = Element::new(decode_name(start.name().as_ref(), position)?);

    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| malformed(position, e))?;
        let name = decode_name(attribute.key.as_ref(), position)?;
        let value = attribute
            .unescape_value()
            .map_err(|e| malformed(position, e))?
            .into_owned();
        if element.attributes.insert(name.clone(), value).is_some() {
            return Err(malformed(position, format!("duplicate attribute '{}'", name)));
        }
    }

    Ok(element)
}

fn declaration_from_event(decl: &BytesDecl<'_>, position: usize) -> Result<Declaration> {
    let version = decl.version().map_err(|e| malformed(position, e))?;
    let encoding = decl
        .encoding()
        .transpose()
        .map_err(|e| malformed(position, e))?;
    let standalone = decl
        .standalone()
        .transpose()
        .map_err(|e| malformed(position, e))?;

    Ok(Declaration {
        version: String::from_utf8_lossy(&version).into_owned(),
        encoding: encoding.map(|value| String::from_utf8_lossy(&value).into_owned()),
        standalone: standalone.map(|value| String::from_utf8_lossy(&value).into_owned()),
    })
}

fn attach(open: &mut [Element], document: &mut Document, node: Node, position: usize) -> Result<()> {
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None if node.is_textual() => {
            return Err(malformed(position, "text content outside of the root element"));
        }
        None => document.nodes.push(node),
    }
    Ok(())
}

fn decode_name(raw: &[u8], position: usize) -> Result<String> {
    String::from_utf8(raw.to_vec()).map_err(|e| malformed(position, e))
}

fn malformed(position: usize, cause: impl std::fmt::Display) -> BatchError {
    BatchError::MalformedMarkup {
        message: format!("{} (at byte {})", cause, position),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" viewBox="0 0 2584 3567">
  <!-- background -->
  <rect width="2584" height="3567" fill="#fff"/>
  <g id="header"><text x="10" y="20">Account &amp; Name <tspan font-weight="bold">Bold</tspan></text></g>
  <style><![CDATA[.a { fill: #000; }]]></style>
  <g id="qrcode">
    <rect x="642.5" y="1091.5" width="1299" height="1299"/>
  </g>
</svg>
"##;

    #[test]
    fn test_parse_keeps_structure() {
        let doc = parse(TEMPLATE).unwrap();

        let decl = doc.declaration.as_ref().unwrap();
        assert_eq!(decl.version, "1.0");
        assert_eq!(decl.encoding.as_deref(), Some("UTF-8"));
        assert!(matches!(&doc.nodes[0], Node::DocType(d) if d.starts_with("svg PUBLIC")));

        let root = doc.root().unwrap();
        assert_eq!(root.name, "svg");
        assert_eq!(root.attribute("xmlns:xlink"), Some("http://www.w3.org/1999/xlink"));
        assert_eq!(root.children.len(), 5);
        assert!(matches!(&root.children[0], Node::Comment(c) if c == " background "));

        let header = root.child_elements().nth(1).unwrap();
        let text = header.child_elements().next().unwrap();
        assert_eq!(text.children[0], Node::Text("Account & Name ".to_string()));
    }

    #[test]
    fn test_round_trip_is_structurally_stable() {
        let samples = [
            TEMPLATE,
            "<svg/>",
            r#"<svg><g id="a"><g id="b"><path d="M0 0h1v1H0z"/></g></g><g/></svg>"#,
            r##"<svg viewBox="0 0 29 29"><path fill="#000" d="M4 4h7v7H4z"/><desc>a &lt; b</desc></svg>"##,
        ];

        for sample in samples {
            let first = parse(sample).unwrap();
            let again = parse(&serialize(&first, 2)).unwrap();
            assert_eq!(first, again, "round trip changed {}", sample);
        }
    }

    #[test]
    fn test_serialize_escapes_and_indents() {
        let doc = Document {
            declaration: None,
            nodes: vec![Node::Element(
                Element::new("svg").with_child(
                    Element::new("g")
                        .with_attribute("id", "qrcode")
                        .with_attribute("data-note", "a \"quoted\" <value>"),
                ),
            )],
        };

        let text = serialize(&doc, 2);
        assert_eq!(
            text,
            "<svg>\n  <g id=\"qrcode\" data-note=\"a &quot;quoted&quot; &lt;value&gt;\"/>\n</svg>\n"
        );
    }

    #[test]
    fn test_attribute_order_is_preserved() {
        let doc = parse(r#"<rect y="2" x="1" width="3"/>"#).unwrap();
        let names: Vec<&str> = doc.root().unwrap().attributes.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["y", "x", "width"]);
        assert!(serialize(&doc, 2).starts_with(r#"<rect y="2" x="1" width="3"/>"#));
    }

    #[test]
    fn test_malformed_markup_is_rejected() {
        let cases = [
            "<svg><g></svg>",
            "<svg>",
            "<svg a=\"1\" a=\"2\"/>",
            "just some text",
            "<svg></svg></g>",
        ];
        for case in cases {
            let result = parse(case);
            assert!(
                matches!(result, Err(BatchError::MalformedMarkup { .. })),
                "expected MalformedMarkup for {:?}, got {:?}",
                case,
                result
            );
        }
    }

    #[test]
    fn test_prolog_nodes_keep_their_position() {
        let text = r#"<?xml version="1.0"?>
<?xml-stylesheet href="card.css" type="text/css"?>
<!-- card -->
<!DOCTYPE svg>
<svg><?app keep-me?><g id="qrcode"/></svg>
"#;
        let doc = parse(text).unwrap();

        assert_eq!(
            doc.nodes[0],
            Node::ProcessingInstruction(r#"xml-stylesheet href="card.css" type="text/css""#.to_string())
        );
        assert_eq!(doc.nodes[1], Node::Comment(" card ".to_string()));
        assert_eq!(doc.nodes[2], Node::DocType("svg".to_string()));
        let root = doc.root().unwrap();
        assert_eq!(root.children[0], Node::ProcessingInstruction("app keep-me".to_string()));

        let written = serialize(&doc, 2);
        let stylesheet = written.find(r#"<?xml-stylesheet href="card.css" type="text/css"?>"#).unwrap();
        let doctype = written.find("<!DOCTYPE svg>").unwrap();
        assert!(stylesheet < doctype);
        assert!(written.contains("<?app keep-me?>"));
        assert_eq!(parse(&written).unwrap(), doc);
    }

    #[test]
    fn test_empty_input_has_no_root() {
        let doc = parse("").unwrap();
        assert!(doc.root().is_none());
    }

    #[test]
    fn test_local_name_strips_prefix() {
        assert_eq!(Element::new("svg:rect").local_name(), "rect");
        assert_eq!(Element::new("rect").local_name(), "rect");
    }
}
