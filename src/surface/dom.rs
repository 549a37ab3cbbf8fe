//! `<ul>`/`<ol>` backed list surface.

use super::{ItemId, ListId, ListSurface, VisualItem};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::JsValue;
use web_sys::Element;

pub const ITEM_TEXT_CLASS: &str = "nextlist-item-text";
pub const ITEM_ID_ATTR: &str = "data-nextlist-item";

thread_local! {
    // Items move between lists with their DOM node, so lookup is page-wide.
    static ITEMS: RefCell<HashMap<ItemId, Rc<VisualItem>>> = RefCell::new(HashMap::new());
    static NEXT_LIST_ID: Cell<u64> = const { Cell::new(0) };
}

/// The visual item an `<li>` was rendered for.
pub fn item_for_element(el: &Element) -> Option<Rc<VisualItem>> {
    let id: ItemId = el.get_attribute(ITEM_ID_ATTR)?.parse().ok()?;
    ITEMS.with(|m| m.borrow().get(&id).cloned())
}

/// Id of the list element, assigning a generated one when it has none.
pub fn ensure_list_id(element: &Element) -> ListId {
    let id = element.id();
    if !id.trim().is_empty() {
        return ListId::new(id);
    }
    let n = NEXT_LIST_ID.with(|c| {
        c.set(c.get() + 1);
        c.get()
    });
    let id = format!("nextlist-{n}");
    element.set_id(&id);
    ListId::new(id)
}

pub struct DomListSurface {
    element: Element,
}

impl DomListSurface {
    /// Only `<ul>` and `<ol>` elements can host a list.
    pub fn new(element: Element) -> Option<Self> {
        let tag = element.tag_name().to_ascii_lowercase();
        (tag == "ul" || tag == "ol").then_some(Self { element })
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn list_id(&self) -> ListId {
        ensure_list_id(&self.element)
    }

    fn build_li(&self, item: &VisualItem) -> Result<Element, JsValue> {
        let document = self
            .element
            .owner_document()
            .ok_or_else(|| JsValue::from_str("list element is detached"))?;

        let li = document.create_element("li")?;
        li.set_attribute(ITEM_ID_ATTR, &item.id().to_string())?;
        li.set_attribute("draggable", "true")?;

        let markup = item.markup();
        if !markup.class_name.is_empty() {
            li.set_class_name(&markup.class_name);
        }
        if !markup.prefix.is_empty() {
            li.insert_adjacent_html("beforeend", &markup.prefix)?;
        }

        let span = document.create_element("span")?;
        span.set_class_name(ITEM_TEXT_CLASS);
        span.set_text_content(Some(item.text()));
        li.append_child(&span)?;

        if !markup.suffix.is_empty() {
            li.insert_adjacent_html("beforeend", &markup.suffix)?;
        }
        Ok(li)
    }

    fn child_elements(&self) -> Vec<Element> {
        let children = self.element.children();
        (0..children.length())
            .filter_map(|i| children.item(i))
            .collect()
    }
}

impl ListSurface for DomListSurface {
    fn clear(&self) {
        let ids: Vec<ItemId> = self
            .child_elements()
            .iter()
            .filter_map(|el| el.get_attribute(ITEM_ID_ATTR)?.parse().ok())
            .collect();
        ITEMS.with(|m| {
            let mut m = m.borrow_mut();
            for id in ids {
                m.remove(&id);
            }
        });
        self.element.set_inner_html("");
    }

    fn insert_item(&self, item: Rc<VisualItem>, position: Option<usize>) {
        let li = match self.build_li(&item) {
            Ok(li) => li,
            Err(e) => {
                tracing::warn!("failed to build list item: {e:?}");
                return;
            }
        };

        let before = position.and_then(|p| self.element.children().item(p as u32));
        let res = match before {
            Some(anchor) => self.element.insert_before(&li, Some(&anchor)),
            None => self.element.append_child(&li),
        };
        if let Err(e) = res {
            tracing::warn!("failed to attach list item: {e:?}");
            return;
        }

        ITEMS.with(|m| m.borrow_mut().insert(item.id(), item));
    }

    fn items(&self) -> Vec<Rc<VisualItem>> {
        self.child_elements()
            .iter()
            .filter_map(item_for_element)
            .collect()
    }

    fn len(&self) -> usize {
        self.element.children().length() as usize
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::config::ItemMarkup;
    use crate::remote::memory::MemoryStore;
    use crate::remote::RemoteSession;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn ul() -> Element {
        let document = web_sys::window().unwrap().document().unwrap();
        let el = document.create_element("ul").unwrap();
        document.body().unwrap().append_child(&el).unwrap();
        el
    }

    #[wasm_bindgen_test]
    fn test_renders_markup_and_positions() {
        let store = MemoryStore::new();
        let session = store.session();
        let surface = DomListSurface::new(ul()).expect("ul should be accepted");
        let markup = ItemMarkup {
            class_name: "ui-state-default".to_string(),
            prefix: "<b>•</b>".to_string(),
            suffix: "<i>!</i>".to_string(),
        };

        for (text, pos) in [("b", None), ("a", Some(0))] {
            let node = session.seed();
            node.set_value(text);
            surface.insert_item(Rc::new(VisualItem::new(node, markup.clone())), pos);
        }

        let texts: Vec<String> = surface.items().iter().map(|i| i.text().to_string()).collect();
        assert_eq!(texts, vec!["a", "b"]);

        let first = surface.element().first_element_child().unwrap();
        assert_eq!(first.class_name(), "ui-state-default");
        assert_eq!(first.inner_html().matches(ITEM_TEXT_CLASS).count(), 1);
        assert!(first.inner_html().starts_with("<b>"));

        surface.clear();
        assert!(surface.is_empty());
    }

    #[wasm_bindgen_test]
    fn test_rejects_non_list_elements_and_assigns_ids() {
        let document = web_sys::window().unwrap().document().unwrap();
        let div = document.create_element("div").unwrap();
        assert!(DomListSurface::new(div).is_none());

        let surface = DomListSurface::new(ul()).unwrap();
        let id = surface.list_id();
        assert!(id.as_str().starts_with("nextlist-"));
        assert_eq!(surface.list_id(), id);
    }
}
