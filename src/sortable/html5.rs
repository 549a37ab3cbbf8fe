//! Connected sortable lists on top of native HTML5 drag and drop.

use super::{SortEvent, SortEventSink, SortableToolkit};
use crate::surface::dom::{item_for_element, DomListSurface};
use crate::surface::{ListId, VisualItem};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{DragEvent, Element};

struct InFlight {
    source: ListId,
    item: Rc<VisualItem>,
    li: Element,
}

#[derive(Default)]
struct Html5Inner {
    lists: RefCell<HashMap<ListId, Element>>,
    dragging: RefCell<Option<InFlight>>,
    sink: RefCell<Option<SortEventSink>>,
}

/// Every list connected to the same `Html5Sortable` accepts items from the others.
#[derive(Clone, Default)]
pub struct Html5Sortable {
    inner: Rc<Html5Inner>,
}

fn element_index(parent: &Element, child: &Element) -> Option<usize> {
    let children = parent.children();
    (0..children.length())
        .filter_map(|i| children.item(i))
        .position(|c| c.is_same_node(Some(child)))
}

fn dragged_li(ev: &DragEvent) -> Option<Element> {
    ev.target()?
        .dyn_into::<Element>()
        .ok()?
        .closest("li")
        .ok()
        .flatten()
}

impl Html5Sortable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where sort events go. Usually `Nextlist::handle`.
    pub fn set_sink(&self, sink: impl Fn(SortEvent) + 'static) {
        *self.inner.sink.borrow_mut() = Some(Rc::new(sink));
    }

    fn emit(&self, events: Vec<SortEvent>) {
        let sink = self.inner.sink.borrow().clone();
        let Some(sink) = sink else {
            return;
        };
        for ev in events {
            sink(ev);
        }
    }

    /// Makes the surface's list sortable and connected to the other lists.
    pub fn connect(&self, surface: &DomListSurface) -> ListId {
        let list = surface.list_id();
        let element = surface.element().clone();
        self.inner
            .lists
            .borrow_mut()
            .insert(list.clone(), element.clone());

        let s = self.clone();
        let l = list.clone();
        let on_start = Closure::<dyn FnMut(DragEvent)>::new(move |ev: DragEvent| {
            s.on_drag_start(&l, &ev);
        });

        let on_over = Closure::<dyn FnMut(DragEvent)>::new(move |ev: DragEvent| {
            ev.prevent_default();
            if let Some(dt) = ev.data_transfer() {
                dt.set_drop_effect("move");
            }
        });

        let s = self.clone();
        let l = list.clone();
        let on_drop = Closure::<dyn FnMut(DragEvent)>::new(move |ev: DragEvent| {
            ev.prevent_default();
            s.on_drop(&l, &ev);
        });

        let s = self.clone();
        let on_end = Closure::<dyn FnMut(DragEvent)>::new(move |_ev: DragEvent| {
            // Dropped outside every connected list: nothing moved.
            s.inner.dragging.borrow_mut().take();
        });

        for (name, cb) in [
            ("dragstart", &on_start),
            ("dragover", &on_over),
            ("drop", &on_drop),
            ("dragend", &on_end),
        ] {
            if let Err(e) = element.add_event_listener_with_callback(name, cb.as_ref().unchecked_ref())
            {
                tracing::warn!(list = %list, "failed to listen for {name}: {e:?}");
            }
        }

        // Listeners live as long as the page.
        on_start.forget();
        on_over.forget();
        on_drop.forget();
        on_end.forget();

        list
    }

    fn on_drag_start(&self, list: &ListId, ev: &DragEvent) {
        let Some(li) = dragged_li(ev) else {
            return;
        };
        let Some(item) = item_for_element(&li) else {
            return;
        };
        let Some(parent) = self.inner.lists.borrow().get(list).cloned() else {
            return;
        };
        let index = element_index(&parent, &li).unwrap_or(0);

        if let Some(dt) = ev.data_transfer() {
            // Some browsers refuse to start a drag without payload.
            let _ = dt.set_data("text/plain", &item.id().to_string());
            dt.set_effect_allowed("move");
        }

        *self.inner.dragging.borrow_mut() = Some(InFlight {
            source: list.clone(),
            item: item.clone(),
            li,
        });

        self.emit(vec![SortEvent::Start {
            list: list.clone(),
            item,
            index,
        }]);
    }

    fn on_drop(&self, list: &ListId, ev: &DragEvent) {
        let Some(flight) = self.inner.dragging.borrow_mut().take() else {
            return;
        };
        let Some(target) = self.inner.lists.borrow().get(list).cloned() else {
            return;
        };

        // Insert before the first sibling whose vertical midpoint is below the pointer.
        let y = ev.client_y() as f64;
        let children = target.children();
        let anchor = (0..children.length())
            .filter_map(|i| children.item(i))
            .filter(|c| !c.is_same_node(Some(&flight.li)))
            .find(|c| {
                let rect = c.get_bounding_client_rect();
                y < rect.top() + rect.height() / 2.0
            });

        if let Err(e) = target.insert_before(&flight.li, anchor.as_deref()) {
            tracing::warn!(list = %list, "failed to move dragged item: {e:?}");
            return;
        }
        let index = element_index(&target, &flight.li).unwrap_or(0);

        let InFlight { source, item, .. } = flight;
        let events = if &source == list {
            vec![SortEvent::Stop {
                list: source.clone(),
                item,
                parent: list.clone(),
                index,
            }]
        } else {
            vec![
                SortEvent::Remove {
                    list: source.clone(),
                    item: item.clone(),
                    parent: list.clone(),
                },
                SortEvent::Receive {
                    list: list.clone(),
                    item: item.clone(),
                    index,
                },
                SortEvent::Stop {
                    list: source,
                    item,
                    parent: list.clone(),
                    index,
                },
            ]
        };
        self.emit(events);
    }
}

impl SortableToolkit for Html5Sortable {
    fn is_sortable(&self, list: &ListId) -> bool {
        self.inner.lists.borrow().contains_key(list)
    }

    fn refresh_sortable(&self, list: &ListId) {
        let Some(el) = self.inner.lists.borrow().get(list).cloned() else {
            return;
        };
        let children = el.children();
        for c in (0..children.length()).filter_map(|i| children.item(i)) {
            let _ = c.set_attribute("draggable", "true");
        }
    }
}
