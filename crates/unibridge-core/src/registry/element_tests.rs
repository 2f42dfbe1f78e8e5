use super::*;
use std::sync::Arc;
use unibridge_protocols::error::ErrorKind;

fn open(registry: &ElementRegistry) -> SessionId {
    let id = SessionId::new();
    registry.open(id);
    id
}

#[test]
fn test_register_and_resolve() {
    let registry = ElementRegistry::new();
    let session = open(&registry);

    let handle = registry
        .register(session, Locator::id("login"), ElementRef::new("wd-1"))
        .unwrap();
    assert_eq!(handle.id, ElementId(1));
    assert_eq!(handle.session_id, session);

    let state = registry.resolve(&handle).unwrap();
    assert_eq!(state.backend_ref, "wd-1");
    assert_eq!(state.locator, Locator::id("login"));
}

#[test]
fn test_ids_strictly_increase_across_invalidation() {
    let registry = ElementRegistry::new();
    let session = open(&registry);

    let first = registry
        .register(session, Locator::id("a"), ElementRef::new("1"))
        .unwrap();
    registry.invalidate(&first);
    let second = registry
        .register(session, Locator::id("a"), ElementRef::new("1"))
        .unwrap();
    let batch = registry
        .register_all(
            session,
            &Locator::css("li"),
            vec![ElementRef::new("2"), ElementRef::new("3")],
        )
        .unwrap();

    let ids: Vec<u64> = std::iter::once(first.id)
        .chain(std::iter::once(second.id))
        .chain(batch.iter().map(|h| h.id))
        .map(|id| id.0)
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
}

#[test]
fn test_invalidated_handle_is_stale_even_if_ref_reused() {
    let registry = ElementRegistry::new();
    let session = open(&registry);

    let old = registry
        .register(session, Locator::id("a"), ElementRef::new("same-ref"))
        .unwrap();
    registry.invalidate(&old);
    let new = registry
        .register(session, Locator::id("a"), ElementRef::new("same-ref"))
        .unwrap();

    assert_eq!(registry.resolve(&old).unwrap_err().kind(), ErrorKind::StaleElement);
    assert!(registry.resolve(&new).is_ok());
}

#[test]
fn test_partitions_are_independent() {
    let registry = ElementRegistry::new();
    let a = open(&registry);
    let b = open(&registry);

    let ha = registry.register(a, Locator::id("x"), ElementRef::new("1")).unwrap();
    let hb = registry.register(b, Locator::id("x"), ElementRef::new("1")).unwrap();
    assert_eq!(ha.id, hb.id);

    registry.invalidate_all(a);
    assert!(registry.resolve(&ha).is_err());
    assert!(registry.resolve(&hb).is_ok());
}

#[test]
fn test_invalidate_all_makes_everything_stale() {
    let registry = ElementRegistry::new();
    let session = open(&registry);
    let handle = registry
        .register(session, Locator::id("a"), ElementRef::new("1"))
        .unwrap();

    registry.invalidate_all(session);

    let err = registry.resolve(&handle).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StaleElement);
    assert!(registry.is_terminated(session));
    assert_eq!(registry.live_count(session), 0);
    assert_eq!(registry.session_count(), 0);
}

#[test]
fn test_register_after_termination_fails() {
    let registry = ElementRegistry::new();
    let session = open(&registry);
    registry.invalidate_all(session);

    let err = registry
        .register(session, Locator::id("a"), ElementRef::new("1"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[test]
fn test_register_unknown_session_fails() {
    let registry = ElementRegistry::new();
    let err = registry
        .register(SessionId::new(), Locator::id("a"), ElementRef::new("1"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[test]
fn test_cached_snapshot_handed_out_once() {
    let registry = ElementRegistry::new();
    let session = open(&registry);
    let snapshot = ElementSnapshot {
        text: Some("Sign in".to_string()),
        rect: None,
    };
    let handle = registry
        .register(
            session,
            Locator::id("a"),
            ElementRef::new("1").with_snapshot(snapshot.clone()),
        )
        .unwrap();
    assert_eq!(handle.cached, Some(snapshot.clone()));

    assert_eq!(registry.resolve(&handle).unwrap().cached, Some(snapshot));
    assert_eq!(registry.resolve(&handle).unwrap().cached, None);
}

#[test]
fn test_concurrent_registration_yields_unique_ids() {
    let registry = Arc::new(ElementRegistry::new());
    let session = open(&registry);

    let threads: Vec<_> = (0..8)
        .map(|t| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                (0..50)
                    .map(|i| {
                        registry
                            .register(session, Locator::id("x"), ElementRef::new(format!("{}-{}", t, i)))
                            .unwrap()
                            .id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<ElementId> = threads
        .into_iter()
        .flat_map(|t| t.join().unwrap())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 400);
    assert_eq!(ids.last(), Some(&ElementId(400)));
}

#[test]
fn test_resolve_racing_invalidate_all_is_all_or_nothing() {
    for _ in 0..50 {
        let registry = Arc::new(ElementRegistry::new());
        let session = open(&registry);
        let handles: Vec<ElementHandle> = (0..20)
            .map(|i| {
                registry
                    .register(session, Locator::id("row"), ElementRef::new(format!("ref-{}", i)))
                    .unwrap()
            })
            .collect();
        let barrier = Arc::new(std::sync::Barrier::new(5));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                let handles = handles.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    let mut stale_seen = false;
                    for _ in 0..10 {
                        for (i, handle) in handles.iter().enumerate() {
                            match registry.resolve(handle) {
                                Ok(state) => {
                                    assert!(!stale_seen, "resolved after termination was observed");
                                    assert_eq!(state.backend_ref, format!("ref-{}", i));
                                    assert_eq!(state.locator, Locator::id("row"));
                                }
                                Err(e) => {
                                    assert_eq!(e.kind(), ErrorKind::StaleElement);
                                    stale_seen = true;
                                }
                            }
                        }
                    }
                })
            })
            .collect();

        barrier.wait();
        registry.invalidate_all(session);
        for reader in readers {
            reader.join().unwrap();
        }
        for handle in &handles {
            assert_eq!(registry.resolve(handle).unwrap_err().kind(), ErrorKind::StaleElement);
        }
    }
}
