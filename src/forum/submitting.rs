//! The "submitting" flag a front end uses to disable its submit control.
//! [`Submitting::begin`] hands out a guard; the flag drops back to `false` when
//! the guard goes out of scope, whichever way the workflow returns.

use tokio::sync::watch;

#[derive(Debug)]
pub struct Submitting {
    tx: watch::Sender<bool>,
}

impl Default for Submitting {
    fn default() -> Self {
        Self::new()
    }
}

impl Submitting {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        *self.tx.borrow()
    }

    /// Receiver a front end can watch to toggle its controls.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Marks a submission as running until the guard is dropped.
    pub fn begin(&self) -> SubmittingGuard<'_> {
        self.tx.send_replace(true);
        SubmittingGuard { tx: &self.tx }
    }
}

#[must_use = "the submitting flag is cleared as soon as the guard is dropped"]
pub struct SubmittingGuard<'a> {
    tx: &'a watch::Sender<bool>,
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.tx.send_replace(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_sets_and_clears_flag() {
        let submitting = Submitting::new();
        let rx = submitting.subscribe();
        assert!(!submitting.is_active());

        {
            let _guard = submitting.begin();
            assert!(submitting.is_active());
            assert!(*rx.borrow());
        }

        assert!(!submitting.is_active());
        assert!(!*rx.borrow());
    }

    #[test]
    fn flag_clears_on_early_return() {
        fn fails(submitting: &Submitting) -> Result<(), &'static str> {
            let _guard = submitting.begin();
            let check: Result<(), &'static str> = Err("validation failed");
            check?;
            Ok(())
        }

        let submitting = Submitting::new();
        assert!(fails(&submitting).is_err());
        assert!(!submitting.is_active());
    }
}
