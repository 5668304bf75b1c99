//! Small accessors over `xmltree` elements.
//!
//! Description documents use a default namespace, so children are matched
//! on their local name only.

use xmltree::Element;

/// Iterates over the direct child elements called `name`.
pub(crate) fn child_elements<'a>(
    elem: &'a Element,
    name: &'a str,
) -> impl Iterator<Item = &'a Element> + 'a {
    elem.children
        .iter()
        .filter_map(|node| node.as_element())
        .filter(move |e| e.name == name)
}

/// Trimmed text of the first child called `name`, `None` when the child is
/// absent or empty.
pub(crate) fn child_text(elem: &Element, name: &str) -> Option<String> {
    elem.get_child(name)
        .and_then(|child| child.get_text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Like [`child_text`], with an empty string for a missing child.
pub(crate) fn child_text_or_default(elem: &Element, name: &str) -> String {
    child_text(elem, name).unwrap_or_default()
}

/// Children of the `list` wrapper element that are called `item`,
/// e.g. every `<service>` of `<serviceList>`.
pub(crate) fn list_items<'a>(
    elem: &'a Element,
    list: &'a str,
    item: &'a str,
) -> impl Iterator<Item = &'a Element> + 'a {
    child_elements(elem, list).flat_map(move |l| child_elements(l, item))
}
