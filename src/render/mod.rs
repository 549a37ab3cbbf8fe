use crate::config::ItemMarkup;
use crate::remote::NodeHandle;
use crate::surface::{ListSurface, VisualItem};
use std::rc::Rc;

/// Renders `node` as a list item at `position` (appends when `None`).
pub fn render_item(
    node: NodeHandle,
    surface: &dyn ListSurface,
    markup: &ItemMarkup,
    position: Option<usize>,
) -> Rc<VisualItem> {
    let item = Rc::new(VisualItem::new(node, markup.clone()));
    surface.insert_item(item.clone(), position);
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryStore;
    use crate::remote::RemoteSession;
    use crate::surface::memory::MemorySurface;

    fn node(session: &dyn RemoteSession, text: &str) -> NodeHandle {
        let n = session.seed();
        n.set_value(text);
        n
    }

    #[test]
    fn test_render_appends_or_inserts() {
        let store = MemoryStore::new();
        let session = store.session();
        let surface = MemorySurface::new();
        let markup = ItemMarkup {
            class_name: "item".to_string(),
            prefix: "[".to_string(),
            suffix: "]".to_string(),
        };

        render_item(node(&session, "b"), &surface, &markup, None);
        render_item(node(&session, "c"), &surface, &markup, None);
        let a = render_item(node(&session, "a"), &surface, &markup, Some(0));

        assert_eq!(surface.texts(), vec!["a", "b", "c"]);
        assert_eq!(a.display_text(), "[a]");
        assert_eq!(a.markup().class_name, "item");
        assert_eq!(a.node().value(), "a");
    }

    #[test]
    fn test_render_snapshot_does_not_follow_node() {
        let store = MemoryStore::new();
        let session = store.session();
        let surface = MemorySurface::new();
        let n = node(&session, "before");

        let item = render_item(n.clone(), &surface, &ItemMarkup::default(), None);
        n.set_value("after");

        assert_eq!(item.text(), "before");
        assert_eq!(item.node().value(), "after");
        assert_eq!(item.display_text(), "before");
    }
}
