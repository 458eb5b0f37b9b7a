mod common;

use anycast_healthd::address::{AddressError, AddressManager, AddressSet, Change};
use common::{addr, FakeInterface, LO};

#[tokio::test]
async fn test_attach_is_idempotent() {
    let kernel = FakeInterface::new();
    let manager = AddressManager::new(kernel.clone());
    let vip = addr("10.240.0.10/32");

    assert_eq!(manager.attach(&vip).await.unwrap(), Change::Applied);
    assert_eq!(manager.attach(&vip).await.unwrap(), Change::NoOp);

    assert_eq!(kernel.add_calls(), 1);
    assert_eq!(kernel.bound(), vec!["10.240.0.10/32"]);
}

#[tokio::test]
async fn test_detach_is_idempotent() {
    let kernel = FakeInterface::with_bound(&["10.240.0.10/32"]);
    let manager = AddressManager::new(kernel.clone());
    let vip = addr("10.240.0.10/32");

    assert_eq!(manager.detach(&vip).await.unwrap(), Change::Applied);
    assert_eq!(manager.detach(&vip).await.unwrap(), Change::NoOp);

    assert_eq!(kernel.del_calls(), 1);
    assert!(kernel.bound().is_empty());
}

#[tokio::test]
async fn test_detach_of_never_bound_address_is_noop() {
    let kernel = FakeInterface::new();
    let manager = AddressManager::new(kernel.clone());

    let change = manager.detach(&addr("10.240.0.10/32")).await.unwrap();
    assert_eq!(change, Change::NoOp);
    assert_eq!(kernel.mutation_calls(), 0);
}

#[tokio::test]
async fn test_list_bound_reads_live_state() {
    let kernel = FakeInterface::new();
    let manager = AddressManager::new(kernel.clone());

    manager.attach(&addr("10.240.0.10/32")).await.unwrap();
    kernel.bind_externally("10.240.1.10/32");
    let bound = manager.list_bound(LO).await.unwrap();
    assert_eq!(bound.len(), 2);
    assert!(bound.contains(&addr("10.240.1.10/32")));

    kernel.unbind_externally("10.240.0.10/32");
    let bound = manager.list_bound(LO).await.unwrap();
    assert_eq!(bound.len(), 1);
    assert!(!bound.contains(&addr("10.240.0.10/32")));
}

#[tokio::test]
async fn test_list_bound_filters_by_interface() {
    let kernel = FakeInterface::with_bound(&["10.240.0.10/32"]);
    let manager = AddressManager::new(kernel);

    assert!(manager.list_bound("eth0").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_backend_errors_surface_unchanged() {
    let kernel = FakeInterface::new();
    kernel.fail_adds([AddressError::PermissionDenied("Operation not permitted".into())]);
    let manager = AddressManager::new(kernel.clone());

    let err = manager.attach(&addr("10.240.0.10/32")).await.unwrap_err();
    assert!(err.is_fatal());
    assert!(kernel.bound().is_empty());
}

#[tokio::test]
async fn test_report_separates_managed_from_foreign() {
    let kernel = FakeInterface::with_bound(&["127.0.0.1/8", "10.240.0.10/32"]);
    let manager = AddressManager::new(kernel);
    let set = AddressSet::from_cidrs(LO, ["10.240.0.10/32", "10.240.1.10/32"]).unwrap();

    let report = manager.report(&set).await.unwrap();

    assert_eq!(report.interface, "lo");
    assert_eq!(report.managed.len(), 2);
    assert_eq!(report.managed[0].cidr, "10.240.0.10/32");
    assert!(report.managed[0].bound);
    assert_eq!(report.managed[1].cidr, "10.240.1.10/32");
    assert!(!report.managed[1].bound);
    assert_eq!(report.foreign, vec!["127.0.0.1/8"]);
}
