//! Countdown-gated verification code dispatch. After a code is sent the
//! control stays disabled for [`COOLDOWN_STEPS`] steps; the remaining count is
//! published on a watch channel so a front end can show it.

use super::{api::FormApi, error::FormError, validate};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    sync::watch,
    time::{interval_at, Instant},
};
use tracing::{debug, info, instrument};

pub const COOLDOWN_STEPS: u32 = 60;
pub const DEFAULT_STEP: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The code was sent; carries the server's confirmation.
    Sent(String),
    /// Ignored: the control is cooling down with this many steps left.
    CoolingDown(u32),
    /// Ignored: a dispatch is already waiting for the server.
    InFlight,
}

pub struct CodeDispatcher {
    remaining: Arc<watch::Sender<u32>>,
    in_flight: AtomicBool,
    step: Duration,
}

impl Default for CodeDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl CodeDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::with_step(DEFAULT_STEP)
    }

    #[must_use]
    pub fn with_step(step: Duration) -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            remaining: Arc::new(tx),
            in_flight: AtomicBool::new(false),
            step,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        *self.remaining.borrow()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.blocked().is_none()
    }

    /// Why a click would be ignored right now, if it would.
    #[must_use]
    pub fn blocked(&self) -> Option<Dispatch> {
        let remaining = self.remaining();
        if remaining > 0 {
            Some(Dispatch::CoolingDown(remaining))
        } else if self.in_flight.load(Ordering::SeqCst) {
            Some(Dispatch::InFlight)
        } else {
            None
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.remaining.subscribe()
    }

    /// Sends a verification code to `email` unless the control is disabled.
    ///
    /// # Errors
    /// Returns `FormError::Format` for a malformed address, or the error of a
    /// failed dispatch; neither starts the cooldown.
    #[instrument(skip(self, api, email))]
    pub async fn request_code<A: FormApi>(
        &self,
        api: &A,
        email: &str,
    ) -> Result<Dispatch, FormError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("code dispatch ignored while another is in flight");
            return Ok(Dispatch::InFlight);
        }
        let _flight = FlightGuard(&self.in_flight);

        // read under the flight guard: a dispatch that finished just before
        // the swap has already started its countdown
        let remaining = self.remaining();
        if remaining > 0 {
            debug!(remaining, "code dispatch ignored while cooling down");
            return Ok(Dispatch::CoolingDown(remaining));
        }

        validate::email(email).map_err(|err| FormError::Format(vec![err]))?;

        let message = api.send_code(email.trim()).await?;
        self.start_countdown();

        info!("verification code dispatched");

        Ok(Dispatch::Sent(message))
    }

    fn start_countdown(&self) {
        self.remaining.send_replace(COOLDOWN_STEPS);

        let remaining = Arc::clone(&self.remaining);
        let step = self.step;

        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + step, step);
            loop {
                ticker.tick().await;
                remaining.send_modify(|left| *left = left.saturating_sub(1));
                if *remaining.borrow() == 0 {
                    break;
                }
            }
        });
    }
}
