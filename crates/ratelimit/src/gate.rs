use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Dispatch gate is closed, no new work is admitted")]
    Closed,
    #[error("All dispatch slots are in use")]
    Saturated,
}

/// Bounds the number of submissions in flight at once.
///
/// Each admitted unit of work holds a [`DispatchPermit`]; dropping the permit
/// frees the slot. Closing the gate stops new admissions without touching
/// work that is already in flight.
pub struct DispatchGate {
    max_in_flight: u32,
    in_flight: Arc<AtomicU32>,
    semaphore: Arc<Semaphore>,
}

impl DispatchGate {
    pub fn new(max_in_flight: u32) -> Self {
        let max_in_flight = max_in_flight.max(1);
        Self {
            max_in_flight,
            in_flight: Arc::new(AtomicU32::new(0)),
            semaphore: Arc::new(Semaphore::new(max_in_flight as usize)),
        }
    }

    /// Admit one unit of work if a slot is free right now
    pub fn try_admit(&self) -> Result<DispatchPermit, DispatchError> {
        match self.semaphore.clone().try_acquire_owned() {
            Ok(permit) => Ok(self.track(permit)),
            Err(TryAcquireError::Closed) => Err(DispatchError::Closed),
            Err(TryAcquireError::NoPermits) => Err(DispatchError::Saturated),
        }
    }

    /// Stop admitting new work. In-flight permits stay valid.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    pub fn is_accepting(&self) -> bool {
        !self.is_closed() && self.semaphore.available_permits() > 0
    }

    pub fn max_in_flight(&self) -> u32 {
        self.max_in_flight
    }

    pub fn in_flight(&self) -> u32 {
        self.in_flight.load(Ordering::Relaxed)
    }

    fn track(&self, permit: OwnedSemaphorePermit) -> DispatchPermit {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        DispatchPermit {
            _permit: permit,
            in_flight: self.in_flight.clone(),
        }
    }
}

/// Slot held by one in-flight submission
pub struct DispatchPermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicU32>,
}

impl Drop for DispatchPermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
