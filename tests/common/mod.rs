//! Shared doubles for controller and probe tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use anycast_healthd::address::{AddressError, AnycastAddress, InterfaceBackend};
use anycast_healthd::health::{HealthProbe, ProbeError};

pub const LO: &str = "lo";

pub fn addr(cidr: &str) -> AnycastAddress {
    AnycastAddress::parse(cidr, LO).unwrap()
}

#[derive(Default)]
struct KernelState {
    bound: Vec<AnycastAddress>,
    add_calls: usize,
    del_calls: usize,
    list_calls: usize,
    add_failures: VecDeque<AddressError>,
    del_failures: VecDeque<AddressError>,
}

/// In-memory interface standing in for the kernel.
///
/// Clones share state, so a test can keep one handle for assertions while
/// the controller owns another.
#[derive(Clone, Default)]
pub struct FakeInterface {
    inner: Arc<Mutex<KernelState>>,
}

impl FakeInterface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate addresses, as if bound by someone else before startup.
    pub fn with_bound(cidrs: &[&str]) -> Self {
        let fake = Self::new();
        fake.inner.lock().unwrap().bound = cidrs.iter().map(|c| addr(c)).collect();
        fake
    }

    /// Bind an address behind the controller's back.
    pub fn bind_externally(&self, cidr: &str) {
        self.inner.lock().unwrap().bound.push(addr(cidr));
    }

    /// Remove an address behind the controller's back.
    pub fn unbind_externally(&self, cidr: &str) {
        let target = addr(cidr);
        self.inner.lock().unwrap().bound.retain(|a| *a != target);
    }

    /// Queue errors returned by the next `add` calls, one per call.
    pub fn fail_adds(&self, errors: impl IntoIterator<Item = AddressError>) {
        self.inner.lock().unwrap().add_failures.extend(errors);
    }

    /// Queue errors returned by the next `del` calls, one per call.
    pub fn fail_dels(&self, errors: impl IntoIterator<Item = AddressError>) {
        self.inner.lock().unwrap().del_failures.extend(errors);
    }

    pub fn bound(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .bound
            .iter()
            .map(AnycastAddress::cidr)
            .collect()
    }

    pub fn add_calls(&self) -> usize {
        self.inner.lock().unwrap().add_calls
    }

    pub fn del_calls(&self) -> usize {
        self.inner.lock().unwrap().del_calls
    }

    /// Kernel mutations attempted, successful or not.
    pub fn mutation_calls(&self) -> usize {
        let state = self.inner.lock().unwrap();
        state.add_calls + state.del_calls
    }

    pub fn list_calls(&self) -> usize {
        self.inner.lock().unwrap().list_calls
    }
}

#[async_trait]
impl InterfaceBackend for FakeInterface {
    async fn list(&self, interface: &str) -> Result<Vec<AnycastAddress>, AddressError> {
        let mut state = self.inner.lock().unwrap();
        state.list_calls += 1;
        Ok(state
            .bound
            .iter()
            .filter(|a| a.interface() == interface)
            .cloned()
            .collect())
    }

    async fn add(&self, address: &AnycastAddress) -> Result<(), AddressError> {
        let mut state = self.inner.lock().unwrap();
        state.add_calls += 1;
        if let Some(err) = state.add_failures.pop_front() {
            return Err(err);
        }
        if !state.bound.contains(address) {
            state.bound.push(address.clone());
        }
        Ok(())
    }

    async fn del(&self, address: &AnycastAddress) -> Result<(), AddressError> {
        let mut state = self.inner.lock().unwrap();
        state.del_calls += 1;
        if let Some(err) = state.del_failures.pop_front() {
            return Err(err);
        }
        state.bound.retain(|a| a != address);
        Ok(())
    }
}

/// Probe that replays a fixed script of outcomes, then repeats `fallback`.
#[derive(Clone)]
pub struct ScriptedProbe {
    script: Arc<Mutex<VecDeque<Result<(), ProbeError>>>>,
    fallback: Result<(), ProbeError>,
    calls: Arc<Mutex<usize>>,
}

impl ScriptedProbe {
    pub fn new(script: Vec<Result<(), ProbeError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            fallback: Err(ProbeError::Ambiguous("script exhausted".into())),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Script from booleans: true = success, false = definitive failure.
    pub fn from_bools(outcomes: &[bool]) -> Self {
        Self::new(
            outcomes
                .iter()
                .map(|ok| {
                    if *ok {
                        Ok(())
                    } else {
                        Err(ProbeError::Failed("SERVFAIL".into()))
                    }
                })
                .collect(),
        )
    }

    pub fn always(outcome: Result<(), ProbeError>) -> Self {
        let mut probe = Self::new(Vec::new());
        probe.fallback = outcome;
        probe
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn check(&self) -> Result<(), ProbeError> {
        *self.calls.lock().unwrap() += 1;
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }

    fn describe(&self) -> String {
        "scripted".into()
    }
}

/// Probe that never completes on its own.
pub struct HangingProbe;

#[async_trait]
impl HealthProbe for HangingProbe {
    async fn check(&self) -> Result<(), ProbeError> {
        std::future::pending().await
    }

    fn describe(&self) -> String {
        "hanging".into()
    }
}

/// Start a programmable HTTP responder on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let mut request = [0u8; 1024];
                let _ = socket.read(&mut request).await;

                let (status, body) = f().await;
                let status_text = match status {
                    200 => "200 OK",
                    204 => "204 No Content",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
                tokio::time::sleep(Duration::from_millis(10)).await;
            });
        }
    });

    addr
}
