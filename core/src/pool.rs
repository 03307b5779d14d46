//! Per-host bound on in-flight requests.
//!
//! ureq pools idle connections but opens as many new ones as callers ask
//! for. `HostLimiter` caps concurrent requests per host authority; callers
//! over the cap block until a permit is released or their deadline passes.
//! A permit lives as long as the response it guards, so a connection counts
//! as busy until its body has been drained or dropped.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::error::RequestError;

#[derive(Debug)]
pub(crate) struct HostLimiter {
    limit: usize,
    active: Mutex<HashMap<String, usize>>,
    released: Condvar,
}

impl HostLimiter {
    /// `limit == 0` disables the bound.
    pub(crate) fn new(limit: usize) -> Arc<Self> {
        Arc::new(Self {
            limit,
            active: Mutex::new(HashMap::new()),
            released: Condvar::new(),
        })
    }

    pub(crate) fn acquire(self: &Arc<Self>, host: &str, wait: Duration) -> Result<HostPermit, RequestError> {
        if self.limit == 0 {
            return Ok(HostPermit { limiter: None, host: String::new() });
        }

        // A wait too large for `Instant` means no deadline.
        let deadline = Instant::now().checked_add(wait);
        let mut active = self.lock();
        loop {
            let count = active.entry(host.to_string()).or_insert(0);
            if *count < self.limit {
                *count += 1;
                return Ok(HostPermit {
                    limiter: Some(Arc::clone(self)),
                    host: host.to_string(),
                });
            }

            active = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(RequestError::Transport(format!(
                            "timed out waiting for a connection to {host}"
                        )));
                    }
                    self.released
                        .wait_timeout(active, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self.released.wait(active).unwrap_or_else(PoisonError::into_inner),
            };
        }
    }

    #[cfg(test)]
    pub(crate) fn in_flight(&self, host: &str) -> usize {
        self.lock().get(host).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, usize>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, host: &str) {
        let mut active = self.lock();
        if let Some(count) = active.get_mut(host) {
            *count -= 1;
            if *count == 0 {
                active.remove(host);
            }
        }
        drop(active);
        self.released.notify_all();
    }
}

/// Held for the duration of one request; released on drop.
#[derive(Debug)]
pub(crate) struct HostPermit {
    limiter: Option<Arc<HostLimiter>>,
    host: String,
}

impl Drop for HostPermit {
    fn drop(&mut self) {
        if let Some(limiter) = self.limiter.take() {
            limiter.release(&self.host);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn permits_are_counted_per_host() {
        let limiter = HostLimiter::new(2);
        let a = limiter.acquire("a:80", Duration::ZERO).unwrap();
        let _b = limiter.acquire("b:80", Duration::ZERO).unwrap();
        assert_eq!(limiter.in_flight("a:80"), 1);
        drop(a);
        assert_eq!(limiter.in_flight("a:80"), 0);
        assert_eq!(limiter.in_flight("b:80"), 1);
    }

    #[test]
    fn caller_over_the_limit_times_out() {
        let limiter = HostLimiter::new(1);
        let _held = limiter.acquire("a:80", Duration::ZERO).unwrap();
        let err = limiter.acquire("a:80", Duration::from_millis(20)).unwrap_err();
        assert!(matches!(err, RequestError::Transport(_)));
    }

    #[test]
    fn waiting_caller_proceeds_after_release() {
        let limiter = HostLimiter::new(1);
        let held = limiter.acquire("a:80", Duration::ZERO).unwrap();

        let waiter = {
            let limiter = Arc::clone(&limiter);
            thread::spawn(move || limiter.acquire("a:80", Duration::from_secs(5)).map(|_| ()))
        };
        thread::sleep(Duration::from_millis(50));
        drop(held);

        assert!(waiter.join().unwrap().is_ok());
        assert_eq!(limiter.in_flight("a:80"), 0);
    }

    #[test]
    fn unbounded_wait_still_grants_a_permit() {
        let limiter = HostLimiter::new(1);
        let permit = limiter.acquire("a:80", Duration::MAX).unwrap();
        assert_eq!(limiter.in_flight("a:80"), 1);
        drop(permit);
        assert_eq!(limiter.in_flight("a:80"), 0);
    }

    #[test]
    fn unbounded_waiter_proceeds_after_release() {
        let limiter = HostLimiter::new(1);
        let held = limiter.acquire("a:80", Duration::ZERO).unwrap();

        let waiter = {
            let limiter = Arc::clone(&limiter);
            thread::spawn(move || limiter.acquire("a:80", Duration::MAX).map(|_| ()))
        };
        thread::sleep(Duration::from_millis(50));
        drop(held);

        assert!(waiter.join().unwrap().is_ok());
    }

    #[test]
    fn zero_limit_never_blocks() {
        let limiter = HostLimiter::new(0);
        let _a = limiter.acquire("a:80", Duration::ZERO).unwrap();
        let _b = limiter.acquire("a:80", Duration::ZERO).unwrap();
        assert_eq!(limiter.in_flight("a:80"), 0);
    }
}
