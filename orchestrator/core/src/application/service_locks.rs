// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Per-service mutual exclusion.
//!
//! Two requests for the same supervisor program must not interleave their
//! config writes and control commands. Each service name maps to one async
//! mutex; requests for different robots never contend.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::robot::ServiceName;

#[derive(Default)]
pub struct ServiceLocks {
    locks: DashMap<ServiceName, Arc<Mutex<()>>>,
}

/// Held for the duration of one robot operation. Dropping it releases the
/// mutexes and forgets any service nobody else is waiting on.
pub struct ServiceGuard<'a> {
    locks: &'a ServiceLocks,
    services: Vec<ServiceName>,
    guards: Vec<OwnedMutexGuard<()>>,
}

impl ServiceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, service: &ServiceName) -> Arc<Mutex<()>> {
        self.locks
            .entry(service.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn lock(&self, service: &ServiceName) -> ServiceGuard<'_> {
        self.lock_all(&[service]).await
    }

    /// Lock several services at once, always in sorted order so two
    /// overlapping requests cannot deadlock.
    pub async fn lock_all(&self, services: &[&ServiceName]) -> ServiceGuard<'_> {
        let mut ordered: Vec<&ServiceName> = services.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut guard = ServiceGuard {
            locks: self,
            services: Vec::with_capacity(ordered.len()),
            guards: Vec::with_capacity(ordered.len()),
        };
        for service in ordered {
            // Recorded before awaiting so a cancelled acquire still prunes.
            guard.services.push(service.clone());
            let mutex = self.entry(service);
            guard.guards.push(mutex.lock_owned().await);
        }
        guard
    }

    /// Drop the entry unless another request still holds its mutex.
    fn prune(&self, service: &ServiceName) {
        self.locks
            .remove_if(service, |_, mutex| Arc::strong_count(mutex) == 1);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for ServiceGuard<'_> {
    fn drop(&mut self) {
        self.guards.clear();
        for service in &self.services {
            self.locks.prune(service);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::robot::RobotIdentity;
    use std::time::Duration;

    fn service(name: &str, currency: &str) -> ServiceName {
        RobotIdentity::new(name, currency).unwrap().service_name()
    }

    #[tokio::test]
    async fn test_same_service_is_exclusive() {
        let locks = Arc::new(ServiceLocks::new());
        let bob = service("bob", "fUSD");

        let guard = locks.lock(&bob).await;

        let contender = {
            let locks = locks.clone();
            let bob = bob.clone();
            tokio::spawn(async move {
                let _g = locks.lock(&bob).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_services_do_not_contend() {
        let locks = ServiceLocks::new();
        let _bob = locks.lock(&service("bob", "fUSD")).await;
        let alice = tokio::time::timeout(
            Duration::from_millis(200),
            locks.lock(&service("alice", "fUSD")),
        )
        .await;
        assert!(alice.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_lock_all_tolerates_duplicates_and_order() {
        let locks = Arc::new(ServiceLocks::new());
        let a = service("bob", "fBTC");
        let b = service("bob", "fUSD");

        let first = {
            let locks = locks.clone();
            let (a, b) = (a.clone(), b.clone());
            tokio::spawn(async move {
                for _ in 0..50 {
                    let _g = locks.lock_all(&[&a, &b]).await;
                    tokio::task::yield_now().await;
                }
            })
        };
        let second = {
            let locks = locks.clone();
            let (a, b) = (a.clone(), b.clone());
            tokio::spawn(async move {
                for _ in 0..50 {
                    let _g = locks.lock_all(&[&b, &a, &b]).await;
                    tokio::task::yield_now().await;
                }
            })
        };

        tokio::time::timeout(Duration::from_secs(5), async {
            first.await.unwrap();
            second.await.unwrap();
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_released_services_are_forgotten() {
        let locks = ServiceLocks::new();
        let a = service("bob", "fUSD");
        let b = service("bob", "fBTC");

        drop(locks.lock(&a).await);
        assert_eq!(locks.len(), 0);

        let both = locks.lock_all(&[&a, &b]).await;
        assert_eq!(locks.len(), 2);
        drop(both);
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_entry_survives_while_a_waiter_holds_it() {
        let locks = Arc::new(ServiceLocks::new());
        let bob = service("bob", "fUSD");

        let guard = locks.lock(&bob).await;
        let waiter = {
            let locks = locks.clone();
            let bob = bob.clone();
            tokio::spawn(async move {
                let _g = locks.lock(&bob).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        assert_eq!(locks.len(), 1);

        waiter.await.unwrap();
        assert_eq!(locks.len(), 0);
    }
}
