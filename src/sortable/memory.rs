use super::{SortEvent, SortableToolkit};
use crate::surface::memory::MemorySurface;
use crate::surface::ListId;
use std::cell::RefCell;
use std::collections::HashMap;

/// Toolkit for hosts without a DOM: moves items between [`MemorySurface`]s and
/// returns the events a sortable widget would have fired.
#[derive(Default)]
pub struct MemorySortable {
    refreshes: RefCell<HashMap<ListId, usize>>,
}

impl MemorySortable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, list: &ListId) {
        self.refreshes.borrow_mut().entry(list.clone()).or_insert(0);
    }

    pub fn refresh_count(&self, list: &ListId) -> usize {
        self.refreshes.borrow().get(list).copied().unwrap_or(0)
    }

    /// Drags the item at `from` to `to` inside one list.
    pub fn drag_within(
        &self,
        list: &ListId,
        surface: &MemorySurface,
        from: usize,
        to: usize,
    ) -> Vec<SortEvent> {
        let Some(item) = surface.take(from) else {
            return vec![];
        };
        surface.put(item.clone(), to);
        let index = surface.index_of(&item).unwrap_or(to);

        vec![
            SortEvent::Start {
                list: list.clone(),
                item: item.clone(),
                index: from,
            },
            SortEvent::Stop {
                list: list.clone(),
                item,
                parent: list.clone(),
                index,
            },
        ]
    }

    /// Drags the item at `from` in `source` to `to` in `dest`.
    pub fn drag_between(
        &self,
        source: (&ListId, &MemorySurface),
        from: usize,
        dest: (&ListId, &MemorySurface),
        to: usize,
    ) -> Vec<SortEvent> {
        let (source_list, source_surface) = source;
        let (dest_list, dest_surface) = dest;

        let Some(item) = source_surface.take(from) else {
            return vec![];
        };
        dest_surface.put(item.clone(), to);
        let index = dest_surface.index_of(&item).unwrap_or(to);

        vec![
            SortEvent::Start {
                list: source_list.clone(),
                item: item.clone(),
                index: from,
            },
            SortEvent::Remove {
                list: source_list.clone(),
                item: item.clone(),
                parent: dest_list.clone(),
            },
            SortEvent::Receive {
                list: dest_list.clone(),
                item: item.clone(),
                index,
            },
            SortEvent::Stop {
                list: source_list.clone(),
                item,
                parent: dest_list.clone(),
                index,
            },
        ]
    }
}

impl SortableToolkit for MemorySortable {
    fn is_sortable(&self, list: &ListId) -> bool {
        self.refreshes.borrow().contains_key(list)
    }

    fn refresh_sortable(&self, list: &ListId) {
        *self.refreshes.borrow_mut().entry(list.clone()).or_insert(0) += 1;
    }
}
