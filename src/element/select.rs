//! `select` autocomplete rule.
//!
//! Browsers restore form state on reload and would override a server-chosen
//! `<option selected>`. A `select` with a pre-selected option therefore gets
//! `autocomplete="off"`, unless the caller set `autocomplete` explicitly.

use super::{AttrValue, Child, Element};

pub(super) fn apply_autocomplete_rule(element: &mut Element) {
    if !element.is_tag("select") || element.attributes.contains_key("autocomplete") {
        return;
    }
    if has_selected_option(&element.children) {
        element.attributes.insert("autocomplete", "off");
    }
}

/// Search plain-tag descendants (`optgroup` included) for a selected option.
fn has_selected_option(children: &[Child]) -> bool {
    children.iter().any(|child| {
        let Child::Element(el) = child else {
            return false;
        };
        if el.is_component() {
            return false;
        }
        let selected = el
            .attributes
            .get("selected")
            .is_some_and(AttrValue::is_truthy);
        (el.is_tag("option") && selected) || has_selected_option(&el.children)
    })
}

#[cfg(test)]
mod tests {
    use crate::element::{AttrValue, Element, create_elem};
    use crate::{attrs, children};

    fn option(selected: Option<bool>) -> Element {
        let attrs = selected.map(|s| attrs! { "selected" => s });
        create_elem("option", attrs, "First")
    }

    #[test]
    fn test_select_without_selected_option() {
        let select = create_elem("select", None, option(None));
        assert!(select.attributes.is_empty());
    }

    #[test]
    fn test_select_with_selected_option() {
        let select = create_elem("select", None, option(Some(true)));
        assert_eq!(
            select.attributes.get("autocomplete"),
            Some(&AttrValue::from("off"))
        );
    }

    #[test]
    fn test_falsy_selected_is_ignored() {
        let select = create_elem("select", None, option(Some(false)));
        assert!(!select.attributes.contains_key("autocomplete"));
    }

    #[test]
    fn test_explicit_autocomplete_wins() {
        let select = create_elem(
            "select",
            attrs! { "autocomplete" => "on" },
            option(Some(true)),
        );
        assert_eq!(
            select.attributes.get("autocomplete"),
            Some(&AttrValue::from("on"))
        );
    }

    #[test]
    fn test_option_inside_optgroup() {
        let group = create_elem("optgroup", None, children![option(None), option(Some(true))]);
        let select = create_elem("select", None, group);
        assert!(select.attributes.contains_key("autocomplete"));
    }

    #[test]
    fn test_rule_only_applies_to_select() {
        let datalist = create_elem("datalist", None, option(Some(true)));
        assert!(datalist.attributes.is_empty());
    }

    #[test]
    fn test_builder_children_trigger_rule() {
        let select = Element::tag("select").child(option(Some(true)));
        assert!(select.attributes.contains_key("autocomplete"));
    }
}
