//! The on-screen list a binding renders into.

pub mod dom;
pub mod memory;

use crate::config::ItemMarkup;
use crate::remote::NodeHandle;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Identity of a bound list element.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListId(String);

impl ListId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Where a dragged item came from. Set on drag start, read on stop/receive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DragTransfer {
    pub original_list: ListId,
    pub original_index: usize,
}

pub type ItemId = u64;

thread_local! {
    static NEXT_ITEM_ID: Cell<ItemId> = const { Cell::new(0) };
}

/// One rendered list entry.
///
/// The remote node is the source of truth; the item only keeps a handle for lookup
/// and the text it was rendered with.
pub struct VisualItem {
    id: ItemId,
    text: String,
    markup: ItemMarkup,
    node: RefCell<NodeHandle>,
    transfer: RefCell<Option<DragTransfer>>,
}

impl VisualItem {
    pub fn new(node: NodeHandle, markup: ItemMarkup) -> Self {
        let id = NEXT_ITEM_ID.with(|n| {
            n.set(n.get() + 1);
            n.get()
        });
        Self {
            id,
            text: node.value(),
            markup,
            node: RefCell::new(node),
            transfer: RefCell::new(None),
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    /// The node value this item was rendered from.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn markup(&self) -> &ItemMarkup {
        &self.markup
    }

    /// Prefix, text and suffix as they appear on screen.
    pub fn display_text(&self) -> String {
        format!("{}{}{}", self.markup.prefix, self.text, self.markup.suffix)
    }

    pub fn node(&self) -> NodeHandle {
        self.node.borrow().clone()
    }

    pub fn set_node(&self, node: NodeHandle) {
        *self.node.borrow_mut() = node;
    }

    pub fn transfer(&self) -> Option<DragTransfer> {
        self.transfer.borrow().clone()
    }

    pub fn set_transfer(&self, transfer: DragTransfer) {
        *self.transfer.borrow_mut() = Some(transfer);
    }

    /// Ends the gesture: the transfer is handed out once and then gone.
    pub fn take_transfer(&self) -> Option<DragTransfer> {
        self.transfer.borrow_mut().take()
    }
}

impl fmt::Debug for VisualItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisualItem")
            .field("id", &self.id)
            .field("text", &self.text)
            .field("transfer", &self.transfer.borrow())
            .finish_non_exhaustive()
    }
}

/// DOM collaborator: the element that holds the visual items of one list.
pub trait ListSurface {
    /// Removes every item.
    fn clear(&self);

    /// Inserts before the item currently at `position`, or appends.
    fn insert_item(&self, item: Rc<VisualItem>, position: Option<usize>);

    /// Items in on-screen order.
    fn items(&self) -> Vec<Rc<VisualItem>>;

    fn len(&self) -> usize {
        self.items().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
