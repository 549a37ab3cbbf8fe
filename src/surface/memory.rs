use super::{ListSurface, VisualItem};
use std::cell::RefCell;
use std::rc::Rc;

/// A list surface that only keeps items in memory.
///
/// The `take`/`put` pair lets a host (or a test) move items the way a drag toolkit
/// moves DOM nodes, without going through the binding.
#[derive(Default)]
pub struct MemorySurface {
    items: RefCell<Vec<Rc<VisualItem>>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> Vec<String> {
        self.items
            .borrow()
            .iter()
            .map(|i| i.text().to_string())
            .collect()
    }

    pub fn get(&self, index: usize) -> Option<Rc<VisualItem>> {
        self.items.borrow().get(index).cloned()
    }

    pub fn index_of(&self, item: &VisualItem) -> Option<usize> {
        self.items.borrow().iter().position(|i| i.id() == item.id())
    }

    pub fn take(&self, index: usize) -> Option<Rc<VisualItem>> {
        let mut items = self.items.borrow_mut();
        (index < items.len()).then(|| items.remove(index))
    }

    pub fn put(&self, item: Rc<VisualItem>, index: usize) {
        let mut items = self.items.borrow_mut();
        let at = index.min(items.len());
        items.insert(at, item);
    }
}

impl ListSurface for MemorySurface {
    fn clear(&self) {
        self.items.borrow_mut().clear();
    }

    fn insert_item(&self, item: Rc<VisualItem>, position: Option<usize>) {
        match position {
            Some(p) => self.put(item, p),
            None => self.items.borrow_mut().push(item),
        }
    }

    fn items(&self) -> Vec<Rc<VisualItem>> {
        self.items.borrow().clone()
    }

    fn len(&self) -> usize {
        self.items.borrow().len()
    }
}
