//! Keeping a bound list and its remote node in step.
//!
//! - `refresh`: remote -> screen, full replace.
//! - `commit`: screen edits -> remote, reference counted per list.
//! - `monitor`: remote change notifications -> `refresh`, gated on the commit count.
//!   An applied refresh that binds a new address moves a wanted monitor along.

mod commit;
mod monitor;

pub(crate) use commit::commit;
pub(crate) use monitor::{disable_monitor, spawn_enable_monitor};

use crate::error::{NextlistError, NextlistResult, RemoteError};
use crate::render::render_item;
use crate::state::{ListEvent, Runtime};
use crate::surface::ListId;
use std::rc::Rc;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { items: usize },
    /// A newer refresh started while this one was fetching; its result was dropped.
    Superseded,
}

pub(crate) fn remote_failed(rt: &Runtime, list: &ListId, e: RemoteError) -> NextlistError {
    warn!(list = %list, kind = ?e.kind, "remote operation failed: {e}");
    rt.emit(list, ListEvent::SyncFailed(e.clone()));
    NextlistError::Remote(e)
}

fn is_current(rt: &Runtime, list: &ListId, ticket: u64) -> bool {
    rt.store
        .with(list, |s| s.refresh_ticket == ticket)
        .unwrap_or(false)
}

/// Re-fetches the list's node and children and re-renders every item.
///
/// Only the most recently started refresh of a list is applied, so a slow fetch can
/// never paint over a newer one.
pub(crate) async fn refresh(rt: Rc<Runtime>, list: ListId) -> NextlistResult<RefreshOutcome> {
    let (session, address, secret, ticket) = rt
        .store
        .with_mut(&list, |s| {
            s.refresh_ticket += 1;
            (
                s.settings.session.clone(),
                s.settings.node_address.clone(),
                s.settings.node_secret.clone(),
                s.refresh_ticket,
            )
        })
        .ok_or(NextlistError::NotInitialized)?;

    debug!(list = %list, address = %address, ticket, "refreshing items");

    let fetched = session.node(&address, &secret).await;
    if !is_current(&rt, &list, ticket) {
        return Ok(RefreshOutcome::Superseded);
    }
    let node = fetched.map_err(|e| remote_failed(&rt, &list, e))?;

    let children = node.select_all().await;
    if !is_current(&rt, &list, ticket) {
        return Ok(RefreshOutcome::Superseded);
    }
    let children = children.map_err(|e| remote_failed(&rt, &list, e))?;

    let Some((surface, markup, move_monitor)) = rt.store.with_mut(&list, |s| {
        s.bound_node = Some(node.clone());
        s.bound_address = Some(address.clone());
        let move_monitor =
            s.monitor_wanted && s.monitored_address.as_deref() != Some(address.as_str());
        if move_monitor {
            s.monitored_address = Some(address.clone());
        }
        (s.surface.clone(), s.settings.markup.clone(), move_monitor)
    }) else {
        return Err(NextlistError::NotInitialized);
    };

    surface.clear();
    let items = children.len();
    for child in children {
        render_item(child, surface.as_ref(), &markup, None);
    }
    rt.toolkit.refresh_sortable(&list);

    debug!(list = %list, items, "refresh applied");
    if move_monitor {
        debug!(list = %list, address = %address, "monitoring bound node");
        spawn_enable_monitor(&rt, &list, None);
    }
    Ok(RefreshOutcome::Applied { items })
}

/// Fire-and-forget refresh; failures are already reported through `SyncFailed`.
pub(crate) fn spawn_refresh(rt: &Rc<Runtime>, list: &ListId) {
    let fut = refresh(rt.clone(), list.clone());
    rt.spawner.spawn(async move {
        let _ = fut.await;
    });
}
