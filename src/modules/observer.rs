use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::modules::grid::Point;

type Callback = Rc<RefCell<dyn FnMut()>>;

/// Invalidation signal. Observers re-read the engine after being notified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
    Cell(Point),
    Score,
}

#[derive(Default)]
struct Registry {
    next_token: u64,
    cells: HashMap<Point, (u64, Callback)>,
    score: BTreeMap<u64, Callback>,
}

impl Registry {
    fn token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }
}

/// Per-cell and score subscriptions.
///
/// Cells hold at most one callback each; a later registration on the same
/// point replaces the earlier one. Score callbacks are a multiset and all of
/// them fire on every score change.
#[derive(Clone, Default)]
pub struct Observers {
    inner: Rc<RefCell<Registry>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watch_cell<F>(&self, point: Point, callback: F) -> CellSubscription
    where
        F: FnMut() + 'static,
    {
        let mut registry = self.inner.borrow_mut();
        let token = registry.token();
        let callback: Callback = Rc::new(RefCell::new(callback));
        registry.cells.insert(point, (token, callback));
        CellSubscription {
            registry: Rc::downgrade(&self.inner),
            point,
            token,
        }
    }

    pub fn watch_score<F>(&self, callback: F) -> ScoreSubscription
    where
        F: FnMut() + 'static,
    {
        let mut registry = self.inner.borrow_mut();
        let token = registry.token();
        let callback: Callback = Rc::new(RefCell::new(callback));
        registry.score.insert(token, callback);
        ScoreSubscription {
            registry: Rc::downgrade(&self.inner),
            token,
        }
    }

    pub fn cell_watchers(&self) -> usize {
        self.inner.borrow().cells.len()
    }

    pub fn score_watchers(&self) -> usize {
        self.inner.borrow().score.len()
    }

    /// Fires the callbacks registered for `change`.
    ///
    /// The registry is released before any callback runs, so callbacks may
    /// subscribe or drop subscriptions.
    pub fn notify(&self, change: Change) {
        let callbacks: Vec<Callback> = {
            let registry = self.inner.borrow();
            match change {
                Change::Cell(point) => registry
                    .cells
                    .get(&point)
                    .map(|(_, callback)| Rc::clone(callback))
                    .into_iter()
                    .collect(),
                Change::Score => registry.score.values().cloned().collect(),
            }
        };

        for callback in callbacks {
            if let Ok(mut callback) = callback.try_borrow_mut() {
                (&mut *callback)();
            }
        }
    }

    pub fn notify_all<'a>(&self, changes: impl IntoIterator<Item = &'a Change>) {
        for change in changes {
            self.notify(*change);
        }
    }
}

/// Registration of a single cell callback. Dropping it unregisters the
/// callback unless a newer registration already replaced it.
#[must_use = "dropping the subscription unregisters the callback"]
pub struct CellSubscription {
    registry: Weak<RefCell<Registry>>,
    point: Point,
    token: u64,
}

impl CellSubscription {
    pub fn point(&self) -> Point {
        self.point
    }

    /// False once a later registration took over this point or the
    /// observers were dropped.
    pub fn is_active(&self) -> bool {
        self.registry.upgrade().is_some_and(|registry| {
            registry
                .borrow()
                .cells
                .get(&self.point)
                .is_some_and(|(token, _)| *token == self.token)
        })
    }
}

impl Drop for CellSubscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.borrow_mut();
        let owned = registry
            .cells
            .get(&self.point)
            .is_some_and(|(token, _)| *token == self.token);
        if owned {
            registry.cells.remove(&self.point);
        }
    }
}

#[must_use = "dropping the subscription unregisters the callback"]
pub struct ScoreSubscription {
    registry: Weak<RefCell<Registry>>,
    token: u64,
}

impl Drop for ScoreSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().score.remove(&self.token);
        }
    }
}
