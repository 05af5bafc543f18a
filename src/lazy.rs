// Deferred initialization - heavy collaborators built on first use

use std::fmt;

/// A value built by a fallible factory the first time it is needed
///
/// Success is memoized for the lifetime of the `Deferred`; a failure is
/// returned to the caller and the next `get` tries again.
pub struct Deferred<T> {
    value: Option<T>,
    attempts: u32,
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deferred<T> {
    pub const fn new() -> Self {
        Self {
            value: None,
            attempts: 0,
        }
    }

    /// Returns the value, running `init` only if nothing is memoized yet
    pub fn get_or_try_init<E, F>(&mut self, init: F) -> Result<&mut T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        match self.value {
            Some(ref mut value) => Ok(value),
            None => {
                self.attempts += 1;
                let value = init()?;
                Ok(self.value.insert(value))
            }
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    pub fn is_initialized(&self) -> bool {
        self.value.is_some()
    }

    /// Number of times the factory has run
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Drops the memoized value, if any
    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }
}

impl<T: fmt::Debug> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("value", &self.value)
            .field("attempts", &self.attempts)
            .finish()
    }
}
