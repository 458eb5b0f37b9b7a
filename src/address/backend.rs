//! Kernel access seam for interface addresses.

use async_trait::async_trait;
use thiserror::Error;

use crate::address::set::AnycastAddress;

/// Errors raised when reading or mutating interface addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The process lacks the privilege to change addresses (CAP_NET_ADMIN).
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The kernel rejected the address itself.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Worth retrying, e.g. the interface is missing or down right now.
    #[error("transient failure: {0}")]
    Transient(String),
}

impl AddressError {
    /// Non-retryable misconfiguration.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, AddressError::Transient(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AddressError::PermissionDenied(_) => "permission_denied",
            AddressError::InvalidAddress(_) => "invalid_address",
            AddressError::Transient(_) => "transient",
        }
    }
}

/// Raw access to the addresses bound on an interface.
///
/// Implementations report what the kernel sees right now and perform exactly
/// one mutation per `add`/`del` call. Idempotence is layered on top by
/// [`AddressManager`](crate::address::AddressManager).
#[async_trait]
pub trait InterfaceBackend: Send + Sync {
    /// Every address currently bound to `interface`, managed or not.
    async fn list(&self, interface: &str) -> Result<Vec<AnycastAddress>, AddressError>;

    /// Bind `address` to its interface.
    async fn add(&self, address: &AnycastAddress) -> Result<(), AddressError>;

    /// Remove `address` from its interface.
    async fn del(&self, address: &AnycastAddress) -> Result<(), AddressError>;
}

#[async_trait]
impl<T: InterfaceBackend + ?Sized> InterfaceBackend for std::sync::Arc<T> {
    async fn list(&self, interface: &str) -> Result<Vec<AnycastAddress>, AddressError> {
        (**self).list(interface).await
    }

    async fn add(&self, address: &AnycastAddress) -> Result<(), AddressError> {
        (**self).add(address).await
    }

    async fn del(&self, address: &AnycastAddress) -> Result<(), AddressError> {
        (**self).del(address).await
    }
}
