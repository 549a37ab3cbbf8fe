//! Drag-and-drop toolkit collaborator.
//!
//! The toolkit moves items on screen by itself and reports what happened with
//! [`SortEvent`]s, in the order a sortable widget fires them: for a move between
//! connected lists, `Remove` on the source, `Receive` on the destination, then
//! `Stop` on the source.

pub mod html5;
pub mod memory;

use crate::surface::{ListId, VisualItem};
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub enum SortEvent {
    /// A drag began on `list`; `index` is the item's position before moving.
    Start {
        list: ListId,
        item: Rc<VisualItem>,
        index: usize,
    },
    /// The drag that began on `list` ended. `parent` is the list the item now sits in.
    Stop {
        list: ListId,
        item: Rc<VisualItem>,
        parent: ListId,
        index: usize,
    },
    /// The item left `list` for `parent`.
    Remove {
        list: ListId,
        item: Rc<VisualItem>,
        parent: ListId,
    },
    /// The item arrived in `list` at `index`.
    Receive {
        list: ListId,
        item: Rc<VisualItem>,
        index: usize,
    },
}

impl SortEvent {
    /// The list whose handler receives this event.
    pub fn list(&self) -> &ListId {
        match self {
            Self::Start { list, .. }
            | Self::Stop { list, .. }
            | Self::Remove { list, .. }
            | Self::Receive { list, .. } => list,
        }
    }

    pub fn item(&self) -> &Rc<VisualItem> {
        match self {
            Self::Start { item, .. }
            | Self::Stop { item, .. }
            | Self::Remove { item, .. }
            | Self::Receive { item, .. } => item,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Stop { .. } => "stop",
            Self::Remove { .. } => "remove",
            Self::Receive { .. } => "receive",
        }
    }
}

impl fmt::Debug for SortEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}, {:?})",
            self.name(),
            self.list(),
            self.item().text()
        )
    }
}

pub type SortEventSink = Rc<dyn Fn(SortEvent)>;

pub trait SortableToolkit {
    /// Whether `list` has been made sortable.
    fn is_sortable(&self, list: &ListId) -> bool;

    /// Picks up items that were rendered after the list was made sortable.
    fn refresh_sortable(&self, list: &ListId);
}
