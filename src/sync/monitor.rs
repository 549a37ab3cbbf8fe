use super::{remote_failed, spawn_refresh};
use crate::config::MonitorInterval;
use crate::error::{NextlistError, NextlistResult};
use crate::remote::RemoteFuture;
use crate::state::Runtime;
use crate::surface::ListId;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

/// Detaches the list's monitor, if any, and returns the remote stop to await.
pub(crate) fn disable_monitor(rt: &Runtime, list: &ListId) -> Option<RemoteFuture<()>> {
    let monitor = rt
        .store
        .with_mut(list, |s| {
            s.monitor_generation += 1;
            s.monitored_address = None;
            s.monitor.take()
        })
        .flatten()?;

    debug!(list = %list, "stopping monitor");
    Some(monitor.stop())
}

/// (Re)starts monitoring the list's bound node.
///
/// An explicit `interval` is remembered in the settings for later restarts.
pub(crate) async fn enable_monitor(
    rt: Rc<Runtime>,
    list: ListId,
    interval: Option<MonitorInterval>,
) -> NextlistResult<()> {
    if let Some(stop) = disable_monitor(&rt, &list) {
        if let Err(e) = stop.await {
            warn!(list = %list, "failed to stop previous monitor: {e}");
        }
    }

    let (node, interval, generation) = rt
        .store
        .with_mut(&list, |s| {
            if let Some(i) = interval {
                s.settings.monitor_interval = i;
            }
            s.monitor_generation += 1;
            s.monitored_address = s.bound_address.clone();
            (
                s.bound_node.clone(),
                s.settings.monitor_interval,
                s.monitor_generation,
            )
        })
        .ok_or(NextlistError::NotInitialized)?;
    let node = node.ok_or(NextlistError::NotLoaded)?;

    let weak = Rc::downgrade(&rt);
    let l = list.clone();
    let listener = Rc::new(move || on_remote_change(&weak, &l, generation));
    let monitor = match node.monitor(interval, listener).await {
        Ok(monitor) => monitor,
        Err(e) => {
            rt.store.with_mut(&list, |s| {
                if s.monitor_generation == generation {
                    s.monitored_address = None;
                }
            });
            return Err(remote_failed(&rt, &list, e));
        }
    };

    if !is_current(&rt, &list, generation) {
        debug!(list = %list, "monitor started after being superseded, stopping it");
        if let Err(e) = monitor.stop().await {
            warn!(list = %list, "failed to stop superseded monitor: {e}");
        }
        return Ok(());
    }

    rt.store.with_mut(&list, |s| s.monitor = Some(monitor));
    debug!(list = %list, %interval, "monitor started");
    Ok(())
}

/// Background [`enable_monitor`]. Remote failures already surface as `SyncFailed`;
/// anything else goes to the reporter.
pub(crate) fn spawn_enable_monitor(
    rt: &Rc<Runtime>,
    list: &ListId,
    interval: Option<MonitorInterval>,
) {
    let fut = enable_monitor(rt.clone(), list.clone(), interval);
    let task_rt = rt.clone();
    rt.spawner.spawn(async move {
        match fut.await {
            Ok(()) | Err(NextlistError::Remote(_)) => {}
            Err(e) => {
                task_rt.reporter.report(e);
            }
        }
    });
}

fn is_current(rt: &Runtime, list: &ListId, generation: u64) -> bool {
    rt.store
        .with(list, |s| s.monitor_generation == generation)
        .unwrap_or(false)
}

/// Refreshes only while no commit of this list is outstanding. Completed commits
/// reconcile through their own post-commit refresh.
fn on_remote_change(rt: &Weak<Runtime>, list: &ListId, generation: u64) {
    let Some(rt) = rt.upgrade() else {
        return;
    };
    if !is_current(&rt, list, generation) {
        return;
    }
    let pending = rt.store.with(list, |s| s.pending_changes);
    match pending {
        Some(0) => spawn_refresh(&rt, list),
        Some(n) => debug!(list = %list, pending = n, "remote change ignored, commits in flight"),
        None => {}
    }
}
