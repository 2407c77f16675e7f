//! Session registry behaviour under concurrent workers

use retest_rpc::{
    ClientConfig, MockConnector, MockTransport, RpcSession, SessionRegistry, SessionStatus,
    WorkerId,
};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

fn registry_with(mock: MockTransport) -> Arc<SessionRegistry> {
    let registry = SessionRegistry::new(MockConnector::new(mock));
    registry.configure(ClientConfig::default());
    Arc::new(registry)
}

#[test]
fn concurrent_workers_get_distinct_sessions() {
    let registry = registry_with(MockTransport::new());
    let workers = 8;
    let barrier = Arc::new(Barrier::new(workers));

    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let me = WorkerId::current();
                registry.session_start(me).unwrap();
                let session = registry.instance(me).unwrap();
                // Everyone holds a session at the same time here
                barrier.wait();
                let address = Arc::as_ptr(&session) as usize;
                registry.session_end(me, SessionStatus::HasFinished);
                address
            })
        })
        .collect();

    let addresses: HashSet<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(addresses.len(), workers);
    assert_eq!(registry.len(), workers);
    assert_eq!(registry.count_with(SessionStatus::HasFinished), workers);
}

#[test]
fn available_session_is_recycled_by_next_worker() {
    let mock = MockTransport::new();
    let registry = registry_with(mock.clone());

    let first = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            let me = WorkerId::current();
            registry.session_start(me).unwrap();
            let session = registry.instance(me).unwrap();
            registry.session_end(me, SessionStatus::Available);
            (me, session)
        })
        .join()
        .unwrap()
    };
    let (first_worker, first_session): (WorkerId, Arc<RpcSession>) = first;

    let second = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            let me = WorkerId::current();
            registry.session_start(me).unwrap();
            (me, registry.instance(me).unwrap())
        })
        .join()
        .unwrap()
    };

    assert!(Arc::ptr_eq(&first_session, &second.1));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.session_status(first_worker), None);
    assert_eq!(registry.session_status(second.0), Some(SessionStatus::Busy));
    // Only one connection was ever opened
    assert_eq!(mock.call_count("web3_clientVersion"), 1);
}

#[test]
fn busy_sessions_are_never_shared() {
    let registry = registry_with(MockTransport::new());
    let holder = WorkerId::current();
    registry.session_start(holder).unwrap();
    let held = registry.instance(holder).unwrap();

    let other = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            let me = WorkerId::current();
            registry.session_start(me).unwrap();
            registry.instance(me).unwrap()
        })
        .join()
        .unwrap()
    };

    assert!(!Arc::ptr_eq(&held, &other));
    assert_eq!(registry.count_with(SessionStatus::Busy), 2);
}

#[test]
fn clear_drops_everything_and_new_config_applies() {
    let registry = registry_with(MockTransport::new());
    let me = WorkerId::current();
    registry.session_start(me).unwrap();
    registry.session_end(me, SessionStatus::Available);
    assert_eq!(registry.count_with(SessionStatus::Available), 1);

    registry.clear();
    assert!(registry.is_empty());
    assert!(registry.instance(me).is_err());

    let next = ClientConfig::new("besu", 1, "http://localhost:8546");
    registry.configure(next.clone());
    assert_eq!(registry.config(), Some(next));
    registry.session_start(me).unwrap();
    assert_eq!(registry.len(), 1);
}
