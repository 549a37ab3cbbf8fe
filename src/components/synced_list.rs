use crate::config::NextlistOptions;
use crate::coordinator::Nextlist;
use crate::sortable::html5::Html5Sortable;
use crate::state::SyncStatus;
use crate::surface::dom::DomListSurface;
use crate::surface::ListId;
use leptos::html;
use leptos::prelude::*;
use std::rc::Rc;
use tw_merge::tw_merge;

pub fn status_label(status: SyncStatus) -> &'static str {
    match status {
        SyncStatus::Idle => "",
        SyncStatus::Pending => "Saving…",
        SyncStatus::Saved => "All changes saved",
        SyncStatus::Failed => "Sync failed",
    }
}

fn status_class(status: SyncStatus) -> &'static str {
    match status {
        SyncStatus::Idle => "hidden",
        SyncStatus::Pending => "text-muted-foreground",
        SyncStatus::Saved => "text-emerald-600",
        SyncStatus::Failed => "text-destructive",
    }
}

/// A `<ul>` bound to a remote node, with a save-status line underneath.
///
/// `nextlist` must have been created with `sortable` as its toolkit; every list
/// sharing them can exchange items by drag and drop.
#[component]
pub fn SyncedList(
    nextlist: Nextlist,
    sortable: Html5Sortable,
    #[prop(into)] list_id: String,
    options: NextlistOptions,
    #[prop(into, optional)] class: String,
) -> impl IntoView {
    let list_ref: NodeRef<html::Ul> = NodeRef::new();
    let status: RwSignal<SyncStatus> = RwSignal::new(SyncStatus::Idle);
    let error: RwSignal<Option<String>> = RwSignal::new(None);

    // Bind once the element is mounted.
    let mut options = Some(options);
    Effect::new(move |_| {
        let Some(ul) = list_ref.get() else {
            return;
        };
        let Some(options) = options.take() else {
            return;
        };
        let Some(surface) = DomListSurface::new(ul.into()) else {
            return;
        };

        let bound = sortable.connect(&surface);
        let id = bound.clone();
        nextlist.subscribe(move |list: &ListId, ev| {
            if *list == id {
                status.set(SyncStatus::from(ev));
            }
        });
        let nl = nextlist.clone();
        sortable.set_sink(move |ev| {
            let _ = nl.handle(ev);
        });

        if let Err(e) = nextlist.initialize(&bound, Rc::new(surface), options) {
            error.set(Some(e.to_string()));
        }
    });

    let merged_class = tw_merge!("flex flex-col gap-1", class);

    view! {
        <div class=merged_class>
            <ul node_ref=list_ref id=list_id class="nextlist min-h-8 space-y-1"></ul>
            <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                <p class="text-xs text-destructive">{move || error.get().unwrap_or_default()}</p>
            </Show>
            <p class=move || tw_merge!("text-xs", status_class(status.get()))>
                {move || status_label(status.get())}
            </p>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(SyncStatus::Idle), "");
        assert_eq!(status_label(SyncStatus::Pending), "Saving…");
        assert_eq!(status_label(SyncStatus::Saved), "All changes saved");
        assert_eq!(status_label(SyncStatus::Failed), "Sync failed");
        assert_eq!(status_class(SyncStatus::Idle), "hidden");
    }
}
