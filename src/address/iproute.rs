//! iproute2 backend.
//!
//! # Responsibilities
//! - Read bindings with `ip -o addr show dev <if>`
//! - Mutate with `ip addr add|del <cidr> dev <if>`
//! - Classify failures from stderr into [`AddressError`]
//!
//! # Design Decisions
//! - Shells out rather than speaking netlink; the host already carries
//!   iproute2 and its error strings are stable enough to classify
//! - A lost race ("File exists" on add, "Cannot assign" on del) is success

use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::address::backend::{AddressError, InterfaceBackend};
use crate::address::set::{AnycastAddress, CidrError};

/// [`InterfaceBackend`] driving the `ip` binary.
#[derive(Debug, Clone)]
pub struct IpCommand {
    program: PathBuf,
}

impl IpCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Output, AddressError> {
        debug!(program = %self.program.display(), args = ?args, "Running ip command");

        Command::new(&self.program)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                let message = format!("failed to run {}: {}", self.program.display(), e);
                match e.kind() {
                    io::ErrorKind::PermissionDenied => AddressError::PermissionDenied(message),
                    _ => AddressError::Transient(message),
                }
            })
    }
}

impl Default for IpCommand {
    fn default() -> Self {
        Self::new("ip")
    }
}

#[async_trait]
impl InterfaceBackend for IpCommand {
    async fn list(&self, interface: &str) -> Result<Vec<AnycastAddress>, AddressError> {
        let output = self.run(&["-o", "addr", "show", "dev", interface]).await?;
        if !output.status.success() {
            return Err(classify_failure(&String::from_utf8_lossy(&output.stderr)));
        }
        Ok(parse_addr_show(
            &String::from_utf8_lossy(&output.stdout),
            interface,
        ))
    }

    async fn add(&self, address: &AnycastAddress) -> Result<(), AddressError> {
        let cidr = address.cidr();
        let output = self
            .run(&["addr", "add", &cidr, "dev", address.interface()])
            .await?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_already_present(&stderr) {
            debug!(address = %cidr, interface = address.interface(), "Address appeared before add");
            return Ok(());
        }
        Err(classify_failure(&stderr))
    }

    async fn del(&self, address: &AnycastAddress) -> Result<(), AddressError> {
        let cidr = address.cidr();
        let output = self
            .run(&["addr", "del", &cidr, "dev", address.interface()])
            .await?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_already_absent(&stderr) {
            debug!(address = %cidr, interface = address.interface(), "Address vanished before del");
            return Ok(());
        }
        Err(classify_failure(&stderr))
    }
}

/// Parse the one-line-per-address output of `ip -o addr show dev <if>`.
///
/// ```text
/// 1: lo    inet 127.0.0.1/8 scope host lo\       valid_lft forever preferred_lft forever
/// 1: lo    inet6 ::1/128 scope host \       valid_lft forever preferred_lft forever
/// ```
pub fn parse_addr_show(output: &str, interface: &str) -> Vec<AnycastAddress> {
    let mut addresses = Vec::new();

    for line in output.lines() {
        let mut tokens = line.split_whitespace();
        if !tokens.any(|t| t == "inet" || t == "inet6") {
            continue;
        }
        let Some(cidr) = tokens.next() else {
            continue;
        };

        let parsed = if cidr.contains('/') {
            AnycastAddress::parse(cidr, interface)
        } else {
            // Point-to-point form: "inet 10.0.0.1 peer 10.0.0.2/32"
            cidr.parse::<IpAddr>()
                .map_err(|_| CidrError::InvalidIp(cidr.to_string()))
                .and_then(|ip| {
                    let full = if ip.is_ipv4() { 32 } else { 128 };
                    AnycastAddress::new(ip, full, interface)
                })
        };

        match parsed {
            Ok(address) => addresses.push(address),
            Err(e) => debug!(line, error = %e, "Skipping unparseable ip addr line"),
        }
    }

    addresses
}

/// Map iproute2 stderr to an error class.
pub fn classify_failure(stderr: &str) -> AddressError {
    let message = stderr.trim().to_string();
    let lower = message.to_ascii_lowercase();

    if lower.contains("operation not permitted") || lower.contains("permission denied") {
        AddressError::PermissionDenied(message)
    } else if lower.contains("prefix is expected")
        || lower.contains("invalid prefix")
        || lower.contains("invalid argument")
        || lower.contains("invalid address")
    {
        AddressError::InvalidAddress(message)
    } else {
        AddressError::Transient(message)
    }
}

fn is_already_present(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    lower.contains("file exists") || lower.contains("address already assigned")
}

fn is_already_absent(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    lower.contains("cannot assign requested address") || lower.contains("address not found")
}
