//! Depth-first, pre-order element search over the document tree.
//!
//! A node is checked before its children and its children are searched before its next
//! sibling, so the first match in document order wins.

use crate::core::document::{Element, Node};

pub fn find_by_attribute<'a>(nodes: &'a [Node], name: &str, value: &str) -> Option<&'a Element> {
    find_in_nodes(nodes, &|element: &Element| element.attribute(name) == Some(value))
}

/// Like [`find_by_attribute`] on `id`, but the element's tag must also match, starting with
/// `root` itself.
pub fn find_group_by_tag_and_id<'a>(root: &'a Element, tag: &str, id: &str) -> Option<&'a Element> {
    find_in_element(root, &|element: &Element| is_tagged_group(element, tag, id))
}

pub fn find_group_by_tag_and_id_mut<'a>(
    root: &'a mut Element,
    tag: &str,
    id: &str,
) -> Option<&'a mut Element> {
    find_in_element_mut(root, &|element: &Element| is_tagged_group(element, tag, id))
}

/// 依文件順序收集所有元素的指定屬性值
pub fn collect_attribute_values(nodes: &[Node], name: &str) -> Vec<String> {
    let mut values = Vec::new();
    collect_into(nodes, name, &mut values);
    values
}

fn is_tagged_group(element: &Element, tag: &str, id: &str) -> bool {
    element.local_name() == tag && element.attribute("id") == Some(id)
}

fn find_in_nodes<'a>(nodes: &'a [Node], matches: &dyn Fn(&Element) -> bool) -> Option<&'a Element> {
    nodes
        .iter()
        .filter_map(Node::as_element)
        .find_map(|element| find_in_element(element, matches))
}

fn find_in_element<'a>(
    element: &'a Element,
    matches: &dyn Fn(&Element) -> bool,
) -> Option<&'a Element> {
    if matches(element) {
        return Some(element);
    }
    find_in_nodes(&element.children, matches)
}

fn find_in_element_mut<'a>(
    element: &'a mut Element,
    matches: &dyn Fn(&Element) -> bool,
) -> Option<&'a mut Element> {
    if matches(element) {
        return Some(element);
    }
    element
        .children
        .iter_mut()
        .filter_map(Node::as_element_mut)
        .find_map(|child| find_in_element_mut(child, matches))
}

fn collect_into(nodes: &[Node], name: &str, values: &mut Vec<String>) {
    for element in nodes.iter().filter_map(Node::as_element) {
        if let Some(value) = element.attribute(name) {
            values.push(value.to_string());
        }
        collect_into(&element.children, name, values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::parse;

    fn nodes(text: &str) -> Vec<Node> {
        parse(text).unwrap().nodes
    }

    #[test]
    fn test_finds_single_match_in_any_shape() {
        let shapes = [
            r#"<svg><g id="qrcode" data-k="1"/></svg>"#,
            r#"<svg><g><g><g><rect/><g id="qrcode" data-k="1"/></g></g></g></svg>"#,
            r#"<svg><a/><b/><c><d/><e><g id="qrcode" data-k="1"/></e></c><f/></svg>"#,
        ];

        for shape in shapes {
            let tree = nodes(shape);
            let found = find_by_attribute(&tree, "id", "qrcode").unwrap();
            assert_eq!(found.attribute("data-k"), Some("1"), "shape {}", shape);
        }
    }

    #[test]
    fn test_first_match_in_document_order_wins() {
        // 深層的第一個節點優先於後面較淺的兄弟節點
        let tree = nodes(
            r#"<svg><g><g id="qrcode" data-k="deep"/></g><g id="qrcode" data-k="shallow"/></svg>"#,
        );
        let found = find_by_attribute(&tree, "id", "qrcode").unwrap();
        assert_eq!(found.attribute("data-k"), Some("deep"));
    }

    #[test]
    fn test_absent_match_is_none() {
        let tree = nodes(r#"<svg><g id="logo"><rect id="frame"/></g></svg>"#);
        assert!(find_by_attribute(&tree, "id", "qrcode").is_none());
        assert!(find_by_attribute(&[], "id", "qrcode").is_none());
    }

    #[test]
    fn test_group_search_requires_tag() {
        let doc = parse(r#"<svg><rect id="qrcode"/><g id="qrcode"><rect/></g></svg>"#).unwrap();
        let root = doc.root().unwrap();

        let found = find_group_by_tag_and_id(root, "g", "qrcode").unwrap();
        assert_eq!(found.name, "g");
        assert_eq!(found.children.len(), 1);

        assert_eq!(find_by_attribute(&doc.nodes, "id", "qrcode").unwrap().name, "rect");
        assert!(find_group_by_tag_and_id(root, "g", "missing").is_none());
    }

    #[test]
    fn test_group_search_matches_root_itself() {
        let doc = parse(r#"<g id="qrcode"/>"#).unwrap();
        assert!(find_group_by_tag_and_id(doc.root().unwrap(), "g", "qrcode").is_some());
    }

    #[test]
    fn test_mutable_search_allows_editing() {
        let mut doc = parse(r#"<svg><g><g id="qrcode"/></g></svg>"#).unwrap();
        let root = doc.root_mut().unwrap();
        let group = find_group_by_tag_and_id_mut(root, "g", "qrcode").unwrap();
        group.attributes.insert("class".to_string(), "stamped".to_string());

        let group = find_group_by_tag_and_id(doc.root().unwrap(), "g", "qrcode").unwrap();
        assert_eq!(group.attribute("class"), Some("stamped"));
    }

    #[test]
    fn test_collect_attribute_values_in_order() {
        let tree = nodes(r#"<svg id="root"><g id="a"><g id="b"/></g><g/><g id="c"/></svg>"#);
        assert_eq!(collect_attribute_values(&tree, "id"), vec!["root", "a", "b", "c"]);
    }
}
