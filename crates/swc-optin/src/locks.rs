//! Per-identity serialisation of opt-in requests.
//!
//! Looking up an existing action and creating a new one are separate store
//! calls. Two concurrent requests for the same email can both miss the
//! lookup and both create. Holding an [`IdentityGuard`] for the email across
//! both steps closes that window within one process.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One key's mutex and the number of requests holding or waiting on it.
struct Slot {
  mutex: Arc<AsyncMutex<()>>,
  users: usize,
}

type Slots = Mutex<HashMap<String, Slot>>;

#[derive(Clone, Default)]
pub struct IdentityLocks {
  slots: Arc<Slots>,
}

/// Counts a request against its key from the moment it starts waiting.
/// Dropping it, including when the wait is cancelled, releases the count
/// and removes the key once nobody is left.
struct Registration {
  slots: Arc<Slots>,
  key:   String,
}

impl Drop for Registration {
  fn drop(&mut self) {
    let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(slot) = slots.get_mut(&self.key) {
      slot.users -= 1;
      if slot.users == 0 {
        slots.remove(&self.key);
      }
    }
  }
}

/// Held while a request owns an identity. Released on drop.
pub struct IdentityGuard {
  // Fields drop in order: the mutex is released before the count.
  _guard:        OwnedMutexGuard<()>,
  _registration: Registration,
}

impl IdentityLocks {
  pub fn new() -> Self { Self::default() }

  /// Wait until no other request holds `key`, then hold it.
  pub async fn lock(&self, key: &str) -> IdentityGuard {
    let mutex = {
      let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
      let slot = slots.entry(key.to_owned()).or_insert_with(|| Slot {
        mutex: Arc::default(),
        users: 0,
      });
      slot.users += 1;
      slot.mutex.clone()
    };
    let registration = Registration {
      slots: self.slots.clone(),
      key:   key.to_owned(),
    };
    let guard = mutex.lock_owned().await;
    IdentityGuard {
      _guard:        guard,
      _registration: registration,
    }
  }

  /// Number of identities currently held or waited on.
  pub fn len(&self) -> usize {
    self
      .slots
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}
