use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use uuid::Uuid;

/// Callback registered through [`Store::subscribe`].
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Inner<T> {
    value: RwLock<T>,
    // Only bumped while `value` is write-locked.
    version: AtomicU64,
    delivery: Mutex<Delivery>,
    listeners: DashMap<Uuid, Listener<T>>,
}

// At most one thread delivers notifications at a time.
#[derive(Default)]
struct Delivery {
    running: bool,
    delivered: u64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// Clears `running` if a listener panics mid-delivery.
struct DeliveryGuard<'a>(&'a Mutex<Delivery>);

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            lock(self.0).running = false;
        }
    }
}

/// Shared, observable value.
///
/// Cloning a `Store` hands out another handle to the same value; every
/// handle sees the same updates and the same subscribers.
pub struct Store<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone> Store<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                value: RwLock::new(value),
                version: AtomicU64::new(0),
                delivery: Mutex::new(Delivery::default()),
                listeners: DashMap::new(),
            }),
        }
    }

    /// Returns a snapshot of the current value.
    pub fn get(&self) -> T {
        self.inner
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of updates applied since the store was created.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// Replaces the value with `f(current)` and notifies every subscriber.
    ///
    /// `f` runs while the write lock is held, so it must not call back into
    /// this store. Listeners run after the lock is released.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        self.update_if(|current| Some(f(current)));
    }

    /// Like [`Store::update`], but `f` may return `None` to leave the value,
    /// the version and the subscribers untouched. Returns whether it updated.
    pub fn update_if<F>(&self, f: F) -> bool
    where
        F: FnOnce(&T) -> Option<T>,
    {
        {
            let mut guard = self
                .inner
                .value
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let Some(next) = f(&guard) else {
                return false;
            };
            *guard = next;
            let version = self.inner.version.fetch_add(1, Ordering::SeqCst) + 1;
            log::debug!("Store updated to version {}", version);
        }
        self.deliver();
        true
    }

    /// Registers `listener`, calling it right away with the current value and
    /// again after every [`Store::update`].
    pub fn subscribe<F>(&self, listener: F) -> Subscription<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        let listener: Listener<T> = Arc::new(listener);
        self.inner.listeners.insert(id, Arc::clone(&listener));
        log::debug!("Listener {} subscribed", id);

        listener(&self.get());

        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    // Notifies listeners of the newest value until nothing newer is left.
    //
    // Updates arriving while another thread (or a listener of this one) is
    // delivering are picked up by that runner, so listeners never see an
    // older value after a newer one. Intermediate values may be coalesced.
    fn deliver(&self) {
        {
            let mut delivery = lock(&self.inner.delivery);
            if delivery.running {
                return;
            }
            delivery.running = true;
        }
        let _guard = DeliveryGuard(&self.inner.delivery);

        loop {
            {
                let mut delivery = lock(&self.inner.delivery);
                if self.inner.version.load(Ordering::SeqCst) <= delivery.delivered {
                    delivery.running = false;
                    return;
                }
            }

            let (value, version) = {
                let guard = self
                    .inner
                    .value
                    .read()
                    .unwrap_or_else(PoisonError::into_inner);
                (guard.clone(), self.inner.version.load(Ordering::SeqCst))
            };
            lock(&self.inner.delivery).delivered = version;
            self.notify(&value);
        }
    }

    fn notify(&self, value: &T) {
        // Snapshot first: a listener may unsubscribe itself while we iterate.
        let listeners: Vec<Listener<T>> = self
            .inner
            .listeners
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        log::debug!("Notifying {} listener(s)", listeners.len());
        for listener in listeners {
            listener(value);
        }
    }
}

/// Handle returned by [`Store::subscribe`].
///
/// Dropping it leaves the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription<T> {
    id: Uuid,
    inner: Weak<Inner<T>>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn unsubscribe(self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.listeners.remove(&self.id);
            log::debug!("Listener {} unsubscribed", self.id);
        }
    }
}
