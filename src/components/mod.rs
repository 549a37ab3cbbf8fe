mod synced_list;

pub use synced_list::{status_label, SyncedList};
