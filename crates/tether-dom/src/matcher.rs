//! Selector evaluation against [`Node`]s.
//!
//! Complex selectors are matched right to left: the subject compound against
//! the node itself, then each combinator walks parents or preceding siblings.

use tether_selector::{Combinator, ComplexSelector, CompoundSelector, SelectorList};

use crate::node::Node;

pub(crate) fn matches_list(node: &Node, list: &SelectorList) -> bool {
    list.selectors
        .iter()
        .any(|complex| matches_complex(node, complex))
}

fn matches_complex(node: &Node, complex: &ComplexSelector) -> bool {
    match complex.compounds.len() {
        0 => false,
        len => matches_from(node, complex, len - 1),
    }
}

/// Match `compounds[index]` against `node`, then everything to its left.
fn matches_from(node: &Node, complex: &ComplexSelector, index: usize) -> bool {
    if !matches_compound(node, &complex.compounds[index]) {
        return false;
    }
    if index == 0 {
        return true;
    }

    let next = index - 1;
    match complex.combinators[next] {
        Combinator::Child => node
            .parent()
            .is_some_and(|parent| matches_from(&parent, complex, next)),
        Combinator::Descendant => {
            let mut current = node.parent();
            while let Some(ancestor) = current {
                if matches_from(&ancestor, complex, next) {
                    return true;
                }
                current = ancestor.parent();
            }
            false
        }
        Combinator::NextSibling => node
            .previous_element_sibling()
            .is_some_and(|sibling| matches_from(&sibling, complex, next)),
        Combinator::SubsequentSibling => {
            let mut current = node.previous_element_sibling();
            while let Some(sibling) = current {
                if matches_from(&sibling, complex, next) {
                    return true;
                }
                current = sibling.previous_element_sibling();
            }
            false
        }
    }
}

fn matches_compound(node: &Node, compound: &CompoundSelector) -> bool {
    node.with_element(|tag, attributes| {
        let get = |name: &str| {
            attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str())
        };

        compound.matches_tag(tag)
            && compound.id.as_deref().is_none_or(|id| get("id") == Some(id))
            && compound.classes.iter().all(|class| {
                get("class").is_some_and(|value| value.split_whitespace().any(|c| c == class))
            })
            && compound
                .attributes
                .iter()
                .all(|attr| attr.matches_value(get(attr.name.as_str())))
    })
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Document;

    struct Fixture {
        doc: Document,
        nav: Node,
        list: Node,
        first: Node,
        second: Node,
        third: Node,
    }

    /// `<nav id="main"><ul class="menu wide">` holding
    /// `<li data-id="1"/>`, a text node, `<li lang="en-US"/>` and `<li class="active"/>`.
    fn fixture() -> Fixture {
        let doc = Document::new();
        let nav = doc.create_element("nav");
        nav.set_attribute("id", "main").unwrap();
        let list = doc.create_element("ul");
        list.set_attribute("class", "menu wide").unwrap();
        let first = doc.create_element("li");
        first.set_attribute("data-id", "1").unwrap();
        let second = doc.create_element("li");
        second.set_attribute("lang", "en-US").unwrap();
        let third = doc.create_element("li");
        third.set_attribute("class", "active").unwrap();

        doc.root().append_child(&nav).unwrap();
        nav.append_child(&list).unwrap();
        list.append_child(&first).unwrap();
        list.append_child(&doc.create_text("\n")).unwrap();
        list.append_child(&second).unwrap();
        list.append_child(&third).unwrap();

        Fixture {
            doc,
            nav,
            list,
            first,
            second,
            third,
        }
    }

    fn check(node: &Node, selector: &str) -> bool {
        node.matches(selector).unwrap()
    }

    #[test]
    fn test_compound_parts() {
        let f = fixture();
        assert!(check(&f.nav, "nav#main"));
        assert!(!check(&f.nav, "nav#other"));
        assert!(check(&f.list, "ul.menu.wide"));
        assert!(!check(&f.list, "ul.menu.narrow"));
        assert!(check(&f.first, "[data-id]"));
        assert!(check(&f.first, "li[data-id='1']"));
        assert!(!check(&f.first, "li[data-id='2']"));
        assert!(check(&f.second, "[lang|=en]"));
        assert!(check(&f.third, "*"));
    }

    #[test]
    fn test_combinators() {
        let f = fixture();
        assert!(check(&f.first, "nav li"));
        assert!(check(&f.first, "#main > ul > li"));
        assert!(!check(&f.first, "#main > li"));
        assert!(check(&f.second, "li[data-id] + li"));
        assert!(!check(&f.third, "li[data-id] + li"));
        assert!(check(&f.third, "li[data-id] ~ li.active"));
        assert!(!check(&f.first, "li ~ li"));
    }

    #[test]
    fn test_selector_list() {
        let f = fixture();
        assert!(check(&f.third, "p, .active"));
        assert!(!check(&f.third, "p, .inactive"));
    }

    #[test]
    fn test_text_nodes_never_match() {
        let f = fixture();
        let text = f.list.children()[1].clone();
        assert!(!check(&text, "*"));
    }

    #[test]
    fn test_detached_nodes_match_their_own_subtree() {
        let f = fixture();
        f.list.remove();
        assert!(check(&f.first, "ul > li"));
        assert!(!check(&f.first, "nav li"));
        assert_eq!(f.doc.query_selector_all(&f.doc.root(), "li").unwrap(), Vec::new());
    }
}
