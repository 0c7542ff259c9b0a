use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use chrono::{Duration, TimeZone, Utc};
use patient_access::{
    AccessConfig, AccessService, Actor, AuditAction, AuditTrail, ManualClock, MemoryStore,
    Operation, PatientFields, Role,
};

#[test]
fn concurrent_appends_get_unique_increasing_ids() {
    let trail = Arc::new(AuditTrail::new().with_traces(false));

    let handles: Vec<_> = (0..100u64)
        .map(|i| {
            let trail = Arc::clone(&trail);
            thread::spawn(move || {
                let actor = Actor::new(i + 1, format!("staff{}", i), Role::Receptionist);
                trail
                    .record(
                        Some(&actor),
                        AuditAction::ViewPatient,
                        Some(i),
                        format!("Viewed patient {}", i),
                    )
                    .id()
            })
        })
        .collect();

    let ids: HashSet<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ids.len(), 100);
    assert_eq!(ids.iter().min(), Some(&1));
    assert_eq!(ids.iter().max(), Some(&100));

    let events = trail.list();
    assert_eq!(events.len(), 100);
    for pair in events.windows(2) {
        assert!(pair[0].id() > pair[1].id());
        assert!(pair[0].timestamp() >= pair[1].timestamp());
    }

    let mut actors: Vec<u64> = events.iter().filter_map(|e| e.actor_id()).collect();
    actors.sort_unstable();
    assert_eq!(actors, (1..=100).collect::<Vec<u64>>());
}

#[test]
fn timestamps_never_go_backwards() {
    let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let trail = AuditTrail::with_clock(clock.clone()).with_traces(false);

    trail.record(None, AuditAction::UserLogin, None, "first");
    clock.advance(Duration::seconds(-30));
    trail.record(None, AuditAction::UserLogout, None, "second");
    clock.advance(Duration::seconds(60));
    trail.record(None, AuditAction::UserLogin, None, "third");

    let stamps: Vec<_> = trail.list().iter().map(|e| e.timestamp()).collect();
    assert_eq!(
        stamps,
        vec![start + Duration::seconds(30), start, start]
    );
}

#[test]
fn concurrent_mutations_each_audit_once() {
    let store = MemoryStore::new();
    let admin = store.add_staff("admin", "Ada", "Min", Role::Admin);
    store.set_session(Some(admin));
    let service = Arc::new(AccessService::with_config(
        store,
        AccessConfig::default().with_audit_traces(false),
    ));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let ctx = service
                    .context(&format!("req-{}", i), &[Operation::CreatePatient])
                    .unwrap();
                service
                    .mutate(
                        &ctx,
                        None,
                        PatientFields::default()
                            .with_name(format!("Patient Number{}", i))
                            .with_age(30)
                            .with_contact(format!("555-00{:02}", i))
                            .with_diagnosis("Observation"),
                    )
                    .unwrap()
                    .id
            })
        })
        .collect();

    let ids: HashSet<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ids.len(), 16);
    assert_eq!(service.store().writes(), 16);

    let events = service.trail().list();
    assert_eq!(events.len(), 16);
    assert!(events
        .iter()
        .all(|e| e.action() == &AuditAction::CreatePatient));
    let targets: HashSet<u64> = events.iter().filter_map(|e| e.target_id()).collect();
    assert_eq!(targets, ids);
}
