//! Idempotent attach/detach on top of an [`InterfaceBackend`].
//!
//! # Responsibilities
//! - Read the live binding before every mutation
//! - Turn already-satisfied requests into no-ops
//! - Log and count every real mutation for auditability

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::address::backend::{AddressError, InterfaceBackend};
use crate::address::set::{AddressSet, AnycastAddress};
use crate::observability::metrics;

/// What an attach or detach actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// The kernel state was mutated.
    Applied,
    /// The address was already in the requested state.
    NoOp,
}

/// Read-only view of which managed addresses are bound right now.
#[derive(Debug, Clone, Serialize)]
pub struct BindingReport {
    pub interface: String,
    pub managed: Vec<ManagedBinding>,
    /// Addresses on the interface this daemon does not manage.
    pub foreign: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManagedBinding {
    pub cidr: String,
    pub bound: bool,
}

/// Converges single addresses without duplicate side effects.
#[derive(Debug)]
pub struct AddressManager<B> {
    backend: B,
}

impl<B: InterfaceBackend> AddressManager<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Bind `address` unless it is already bound.
    pub async fn attach(&self, address: &AnycastAddress) -> Result<Change, AddressError> {
        if self.is_bound(address).await? {
            debug!(address = %address, interface = address.interface(), "Already attached");
            return Ok(Change::NoOp);
        }

        self.backend.add(address).await?;
        info!(
            address = %address,
            interface = address.interface(),
            op = "attach",
            "Attached anycast address"
        );
        metrics::record_mutation("attach");
        Ok(Change::Applied)
    }

    /// Remove `address` unless it is already absent.
    pub async fn detach(&self, address: &AnycastAddress) -> Result<Change, AddressError> {
        if !self.is_bound(address).await? {
            debug!(address = %address, interface = address.interface(), "Already detached");
            return Ok(Change::NoOp);
        }

        self.backend.del(address).await?;
        info!(
            address = %address,
            interface = address.interface(),
            op = "detach",
            "Detached anycast address"
        );
        metrics::record_mutation("detach");
        Ok(Change::Applied)
    }

    /// Everything bound to `interface` right now, straight from the backend.
    pub async fn list_bound(&self, interface: &str) -> Result<BTreeSet<AnycastAddress>, AddressError> {
        Ok(self.backend.list(interface).await?.into_iter().collect())
    }

    /// Which members of `set` are bound, plus the foreign addresses alongside them.
    pub async fn report(&self, set: &AddressSet) -> Result<BindingReport, AddressError> {
        let bound = self.list_bound(set.interface()).await?;

        let managed = set
            .iter()
            .map(|address| ManagedBinding {
                cidr: address.cidr(),
                bound: bound.contains(address),
            })
            .collect();
        let foreign = bound
            .iter()
            .filter(|address| !set.contains(address))
            .map(AnycastAddress::cidr)
            .collect();

        Ok(BindingReport {
            interface: set.interface().to_string(),
            managed,
            foreign,
        })
    }

    async fn is_bound(&self, address: &AnycastAddress) -> Result<bool, AddressError> {
        Ok(self
            .backend
            .list(address.interface())
            .await?
            .iter()
            .any(|bound| bound == address))
    }
}
