use super::{remote_failed, spawn_refresh};
use crate::error::{NextlistError, NextlistResult};
use crate::state::{ListEvent, Runtime};
use crate::surface::ListId;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::rc::Rc;
use tracing::debug;

/// Commits the session behind `list`.
///
/// Runs synchronously up to issuing the remote commit: the pending count goes up and
/// `ChangesPending` fires before this returns. The returned future completes with the
/// remote commit; awaiting it is the continuation of the edit, whatever the count.
///
/// `ChangesCommitted` (followed by a refresh picking up other clients' edits) only
/// fires once the count is back to zero, so overlapping edits share one window. A
/// failure emits `SyncFailed` and, at zero, refreshes as well.
pub(crate) fn commit(
    rt: &Rc<Runtime>,
    list: &ListId,
) -> NextlistResult<LocalBoxFuture<'static, NextlistResult<()>>> {
    let (session, pending) = rt
        .store
        .with_mut(list, |s| {
            s.pending_changes += 1;
            (s.settings.session.clone(), s.pending_changes)
        })
        .ok_or(NextlistError::NotInitialized)?;

    debug!(list = %list, pending, "committing changes");
    rt.emit(list, ListEvent::ChangesPending);

    let remote = session.commit();
    let rt = rt.clone();
    let list = list.clone();

    Ok(async move {
        let result = remote.await;

        // More edits may have started while this one was in flight.
        let remaining = rt
            .store
            .with_mut(&list, |s| {
                s.pending_changes = s.pending_changes.saturating_sub(1);
                s.pending_changes
            })
            .unwrap_or(0);

        match result {
            Ok(()) => {
                debug!(list = %list, remaining, "commit completed");
                if remaining == 0 {
                    rt.emit(&list, ListEvent::ChangesCommitted);
                    spawn_refresh(&rt, &list);
                }
                Ok(())
            }
            Err(e) => {
                let err = remote_failed(&rt, &list, e);
                // The screen still shows the rejected edit.
                if remaining == 0 {
                    spawn_refresh(&rt, &list);
                }
                Err(err)
            }
        }
    }
    .boxed_local())
}
