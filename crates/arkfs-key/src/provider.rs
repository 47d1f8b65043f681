//! The prompting key provider and its controller handles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use url::Url;

use crate::error::KeyError;

/// Prompts the user for a key. Implementations are maintained by the
/// embedding application and must be thread safe.
///
/// A well-behaved prompt either stores a key through the controller or
/// returns an error; returning without doing either is interpreted as a
/// cancellation on the write path and causes a re-prompt on the read path.
pub trait View<K>: Send + Sync {
    /// Prompt for the key for (over)writing the contents of a new or
    /// existing protected resource.
    ///
    /// Storing `None` through the controller, or just returning without
    /// storing a key, cancels prompting until the provider is reset.
    fn prompt_write_key(&self, controller: &Controller<'_, K>) -> Result<(), KeyError>;

    /// Prompt for the key for reading the contents of an existing protected
    /// resource. `invalid` is true if a previous call produced an invalid
    /// key.
    ///
    /// Raising [`KeyError::CacheableUnknown`] or
    /// [`KeyError::PromptingCancelled`] cancels prompting until the
    /// provider is reset; any other error is passed through without
    /// changing the provider.
    fn prompt_read_key(&self, controller: &Controller<'_, K>, invalid: bool)
        -> Result<(), KeyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Reset,
    Set,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Write,
    Read,
}

#[derive(Debug)]
struct Inner<K> {
    state: State,
    key: Option<K>,
    change_requested: bool,
}

/// A "safe" key provider which prompts the user for the key of its
/// protected resource.
///
/// The provider may be shared across threads; the embedding key manager
/// guarantees that only one thread prompts at a time.
pub struct PromptingKeyProvider<K> {
    view: Arc<dyn View<K>>,
    inner: Mutex<Inner<K>>,
    /// The identifier of the protected resource, shown by views.
    resource: RwLock<Option<Url>>,
    ask_always_for_write_key: AtomicBool,
}

impl<K> std::fmt::Debug for PromptingKeyProvider<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptingKeyProvider")
            .field("state", &self.lock().state)
            .finish_non_exhaustive()
    }
}

impl<K: Clone> PromptingKeyProvider<K> {
    pub fn new(view: Arc<dyn View<K>>) -> Self {
        Self {
            view,
            inner: Mutex::new(Inner { state: State::Reset, key: None, change_requested: false }),
            resource: RwLock::new(None),
            ask_always_for_write_key: AtomicBool::new(false),
        }
    }

    /// The unique identifier of the protected resource this provider is
    /// used for, if one has been assigned.
    pub fn resource(&self) -> Option<Url> {
        self.resource.read().expect("key provider resource lock poisoned").clone()
    }

    /// Assign the identifier of the protected resource.
    pub fn set_resource(&self, resource: Option<Url>) {
        *self.resource.write().expect("key provider resource lock poisoned") = resource;
    }

    /// If set, [`retrieve_write_key`](Self::retrieve_write_key) re-prompts
    /// even when a key is already present, giving the user a chance to
    /// update it.
    pub fn set_ask_always_for_write_key(&self, ask_always: bool) {
        self.ask_always_for_write_key.store(ask_always, Ordering::Relaxed);
    }

    /// The current key, if any.
    pub fn key(&self) -> Option<K> {
        self.lock().key.clone()
    }

    /// Store a key directly: a present key makes the provider SET, an
    /// absent one caches a cancellation.
    pub fn set_key(&self, key: Option<K>) {
        let mut inner = self.lock();
        let next = if key.is_some() { State::Set } else { State::Cancelled };
        inner.key = key;
        set_state_locked(&mut inner, next);
    }

    /// Obtain the key for writing the protected resource, prompting the
    /// view as required.
    ///
    /// A pending change request forces a re-prompt; if the change is
    /// abandoned the previously set key stays in place. A cached
    /// cancellation triggers one fresh prompt per call.
    pub fn retrieve_write_key(&self) -> Result<K, KeyError> {
        match self.state() {
            State::Set => {
                if self.take_change_requested() {
                    // Re-prompt without touching the state field first, so
                    // an abandoned change keeps the old key.
                    self.write_prompt_round()?;
                } else if self.ask_always_for_write_key.load(Ordering::Relaxed) {
                    self.write_prompt_round()?;
                }
            }
            State::Reset | State::Cancelled => self.write_prompt_round()?,
        }
        self.resolved_key()
    }

    /// Obtain the key for reading the protected resource, prompting the
    /// view as required.
    ///
    /// `invalid` signals that the previously obtained key did not work;
    /// it discards a set key and forces a re-prompt. A cached cancellation
    /// fails immediately without prompting.
    pub fn retrieve_read_key(&self, invalid: bool) -> Result<K, KeyError> {
        match self.state() {
            State::Set if !invalid => return self.resolved_key(),
            State::Set => {
                let mut inner = self.lock();
                set_state_locked(&mut inner, State::Reset);
            }
            State::Cancelled => return Err(KeyError::PromptingCancelled),
            State::Reset => {}
        }
        while self.state() == State::Reset {
            let controller = Controller::new(self, Flavor::Read);
            let result = self.view.prompt_read_key(&controller, invalid);
            controller.close();
            match result {
                Ok(()) => {}
                Err(KeyError::CacheableUnknown(_)) | Err(KeyError::PromptingCancelled) => {
                    let mut inner = self.lock();
                    set_state_locked(&mut inner, State::Cancelled);
                }
                Err(other) => return Err(other),
            }
        }
        self.resolved_key()
    }

    /// Reset the provider's state, key, and change request if and only if
    /// prompting has been cancelled.
    pub fn reset_cancelled_key(&self) {
        let mut inner = self.lock();
        if inner.state == State::Cancelled {
            reset_locked(&mut inner);
        }
    }

    /// Reset the provider's state, key, and change request unconditionally.
    pub fn reset_unconditionally(&self) {
        reset_locked(&mut self.lock());
    }

    /// One prompting round on the write path.
    ///
    /// The controller lives exactly for the duration of the prompt. If the
    /// provider is still RESET afterwards - because the view neither stored
    /// a key nor failed - the cancellation is cached; the drop guard makes
    /// that hold even if the view panics.
    fn write_prompt_round(&self) -> Result<(), KeyError> {
        let controller = Controller::new(self, Flavor::Write);
        let guard = CancelOnReset { provider: self };
        let result = self.view.prompt_write_key(&controller);
        controller.close();
        drop(guard);
        result
    }

    fn resolved_key(&self) -> Result<K, KeyError> {
        let inner = self.lock();
        match inner.state {
            State::Set => {
                Ok(inner.key.clone().expect("a key must be present in the set state"))
            }
            State::Reset | State::Cancelled => Err(KeyError::PromptingCancelled),
        }
    }

    fn take_change_requested(&self) -> bool {
        let mut inner = self.lock();
        std::mem::replace(&mut inner.change_requested, false)
    }

    fn set_change_requested(&self, change_requested: bool) {
        self.lock().change_requested = change_requested;
    }
}

impl<K> PromptingKeyProvider<K> {
    fn state(&self) -> State {
        self.lock().state
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K>> {
        self.inner.lock().expect("key provider state lock poisoned")
    }
}

fn set_state_locked<K>(inner: &mut Inner<K>, next: State) {
    if inner.state != next {
        tracing::debug!("key provider state: {:?} -> {:?}", inner.state, next);
        inner.state = next;
    }
}

fn reset_locked<K>(inner: &mut Inner<K>) {
    inner.key = None;
    inner.change_requested = false;
    set_state_locked(inner, State::Reset);
}

/// Caches a cancellation when a write prompt ends while the provider is
/// still RESET, on every exit path.
struct CancelOnReset<'a, K> {
    provider: &'a PromptingKeyProvider<K>,
}

impl<K> Drop for CancelOnReset<'_, K> {
    fn drop(&mut self) {
        // Avoid a double panic if the lock was poisoned by the view.
        if let Ok(mut inner) = self.provider.inner.lock() {
            if inner.state == State::Reset {
                set_state_locked(&mut inner, State::Cancelled);
            }
        }
    }
}

/// Proxies access to the provider for [`View`] implementations, for the
/// duration of exactly one prompt.
///
/// Once the prompt returns the controller is closed and every operation
/// fails with [`KeyError::IllegalControllerState`]. The write flavor
/// rejects [`Controller::set_change_requested`]; the read flavor rejects
/// [`Controller::key`], so a view can never display the previous key while
/// asking for a new one.
pub struct Controller<'a, K> {
    provider: &'a PromptingKeyProvider<K>,
    flavor: Flavor,
    open: AtomicBool,
}

impl<'a, K: Clone> Controller<'a, K> {
    fn new(provider: &'a PromptingKeyProvider<K>, flavor: Flavor) -> Self {
        Self { provider, flavor, open: AtomicBool::new(true) }
    }

    fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn check_open(&self) -> Result<(), KeyError> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(KeyError::IllegalControllerState)
        }
    }

    /// The identifier of the protected resource being prompted for.
    pub fn resource(&self) -> Result<Url, KeyError> {
        self.check_open()?;
        self.provider.resource().ok_or(KeyError::IllegalControllerState)
    }

    /// The provider's current key. Not available on the read flavor.
    pub fn key(&self) -> Result<Option<K>, KeyError> {
        self.check_open()?;
        match self.flavor {
            Flavor::Write => Ok(self.provider.key()),
            Flavor::Read => Err(KeyError::IllegalControllerState),
        }
    }

    /// Store the prompt's result: a present key makes the provider SET, an
    /// absent one caches a cancellation.
    pub fn set_key(&self, key: Option<K>) -> Result<(), KeyError> {
        self.check_open()?;
        self.provider.set_key(key);
        Ok(())
    }

    /// Request a fresh write-key prompt the next time the write key is
    /// retrieved. Not available on the write flavor.
    pub fn set_change_requested(&self, change_requested: bool) -> Result<(), KeyError> {
        self.check_open()?;
        match self.flavor {
            Flavor::Read => {
                self.provider.set_change_requested(change_requested);
                Ok(())
            }
            Flavor::Write => Err(KeyError::IllegalControllerState),
        }
    }
}
