use futures::executor::LocalSpawner;
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use futures::FutureExt;
use std::future::Future;
use std::rc::Rc;

/// Runs detached background work (refreshes, commit pipelines) on the current thread.
#[derive(Clone)]
pub struct Spawner(Rc<dyn Fn(LocalBoxFuture<'static, ()>)>);

impl Spawner {
    pub fn new(spawn: impl Fn(LocalBoxFuture<'static, ()>) + 'static) -> Self {
        Self(Rc::new(spawn))
    }

    /// The browser event loop, through Leptos' executor.
    pub fn browser() -> Self {
        Self::new(|fut| leptos::task::spawn_local(fut))
    }

    pub fn spawn(&self, fut: impl Future<Output = ()> + 'static) {
        (self.0)(fut.boxed_local());
    }
}

impl From<LocalSpawner> for Spawner {
    fn from(spawner: LocalSpawner) -> Self {
        Self::new(move |fut| {
            if let Err(e) = spawner.spawn_local(fut) {
                tracing::warn!("dropping background task: {e}");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::LocalPool;
    use std::cell::Cell;

    #[test]
    fn test_local_pool_spawner_runs_tasks() {
        let mut pool = LocalPool::new();
        let spawner = Spawner::from(pool.spawner());
        let hits = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let h = hits.clone();
            spawner.spawn(async move { h.set(h.get() + 1) });
        }
        assert_eq!(hits.get(), 0);

        pool.run_until_stalled();
        assert_eq!(hits.get(), 3);
    }
}
