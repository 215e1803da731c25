//! In-memory credential store with change notification.
//!
//! The store holds the current [`SessionState`] and the session [`Epoch`].
//! Only the session manager writes to it; everything else reads or
//! subscribes.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};
use tolk_domain::{Epoch, Identity, SessionState};

type Observer = Arc<dyn Fn(&SessionState) + Send + Sync>;
type Observers = Mutex<Vec<(u64, Observer)>>;

#[derive(Debug, Default)]
struct Slot {
    state: SessionState,
    epoch: Epoch,
}

/// Thread-safe holder of the current session state.
pub struct CredentialStore {
    slot: Mutex<Slot>,
    observers: Arc<Observers>,
    next_observer: Mutex<u64>,
    /// Serializes write-and-notify so observers see transitions in order.
    notify: ReentrantMutex<()>,
}

impl CredentialStore {
    /// Creates an unauthenticated store at epoch zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::default()),
            observers: Arc::new(Mutex::new(Vec::new())),
            next_observer: Mutex::new(0),
            notify: ReentrantMutex::new(()),
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn get(&self) -> SessionState {
        self.slot.lock().state.clone()
    }

    /// Returns the current epoch.
    #[must_use]
    pub fn epoch(&self) -> Epoch {
        self.slot.lock().epoch
    }

    /// Holds `identity` as the authenticated user.
    #[cfg(test)]
    pub(crate) fn set(&self, identity: Identity) {
        self.write(None, SessionState::Authenticated(Arc::new(identity)));
    }

    /// Drops the held identity.
    #[cfg(test)]
    pub(crate) fn clear(&self) {
        self.write(None, SessionState::Unauthenticated);
    }

    /// Marks a session restore as started and returns the epoch it runs under.
    pub(crate) fn begin_initializing(&self) -> Epoch {
        let _ordered = self.notify.lock();
        let (epoch, changed) = {
            let mut slot = self.slot.lock();
            let changed = !slot.state.is_initializing();
            slot.state = SessionState::Initializing;
            (slot.epoch, changed)
        };
        if changed {
            self.notify_observers(&SessionState::Initializing);
        }
        epoch
    }

    /// Holds `identity` only if the epoch is still `epoch`.
    ///
    /// Returns false, leaving the store untouched, when the epoch has moved on.
    pub(crate) fn set_if_current(&self, epoch: Epoch, identity: Identity) -> bool {
        self.write(
            Some(epoch),
            SessionState::Authenticated(Arc::new(identity)),
        )
    }

    /// Drops the held identity only if the epoch is still `epoch`.
    pub(crate) fn clear_if_current(&self, epoch: Epoch) -> bool {
        self.write(Some(epoch), SessionState::Unauthenticated)
    }

    /// Advances the epoch, invalidating every operation started before, and
    /// returns the new value.
    pub(crate) fn advance_epoch(&self) -> Epoch {
        let mut slot = self.slot.lock();
        slot.epoch = slot.epoch.next();
        slot.epoch
    }

    /// Advances the epoch and clears the store, but only if the epoch is still
    /// `epoch`. Returns true if the session was terminated by this call.
    pub(crate) fn terminate_if_current(&self, epoch: Epoch) -> bool {
        let _ordered = self.notify.lock();
        let changed = {
            let mut slot = self.slot.lock();
            if slot.epoch != epoch {
                return false;
            }
            slot.epoch = slot.epoch.next();
            let changed = slot.state != SessionState::Unauthenticated;
            slot.state = SessionState::Unauthenticated;
            changed
        };
        if changed {
            self.notify_observers(&SessionState::Unauthenticated);
        }
        true
    }

    /// Registers `observer`, called with the new state after every transition.
    ///
    /// Observers run on the writer's thread after the store has been
    /// updated, so reading the store from an observer is fine. Writing to it
    /// from an observer must be deferred.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        let id = {
            let mut next = self.next_observer.lock();
            *next += 1;
            *next
        };
        self.observers.lock().push((id, Arc::new(observer)));
        Subscription {
            id,
            observers: Arc::downgrade(&self.observers),
        }
    }

    /// Returns the number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    fn write(&self, expected: Option<Epoch>, next: SessionState) -> bool {
        let _ordered = self.notify.lock();
        let changed = {
            let mut slot = self.slot.lock();
            if expected.is_some_and(|epoch| epoch != slot.epoch) {
                return false;
            }
            let changed = slot.state != next;
            slot.state = next.clone();
            changed
        };
        if changed {
            self.notify_observers(&next);
        }
        true
    }

    fn notify_observers(&self, state: &SessionState) {
        let observers: Vec<Observer> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(state);
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.slot.lock();
        f.debug_struct("CredentialStore")
            .field("state", &slot.state.label())
            .field("epoch", &slot.epoch)
            .finish_non_exhaustive()
    }
}

/// Handle returned by [`CredentialStore::subscribe`].
///
/// The observer stays registered until this handle is dropped or
/// [`Subscription::unsubscribe`] is called.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    observers: Weak<Observers>,
}

impl Subscription {
    /// Detaches the observer.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            observers.lock().retain(|(id, _)| *id != self.id);
        }
    }
}
