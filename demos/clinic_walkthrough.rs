//! A day at the clinic, seen through each role.
//!
//! This example shows:
//! 1. The same record projected for an admin, a doctor and a receptionist
//! 2. Route-guard soft denials mapped to redirects
//! 3. Field-level edit rejection
//! 4. The audit feed and its CSV export
//!
//! Audit events are mirrored to `tracing` on the `patient_audit` target.
//!
//! Run with: `cargo run --example clinic_walkthrough`

use patient_access::{
    AccessService, Error, MemoryStore, Operation, PatientFields, ProjectedRecord, Role,
    StaffRequest,
};

fn show(label: &str, view: &ProjectedRecord) {
    match serde_json::to_string(view) {
        Ok(json) => println!("{:<13} {}", label, json),
        Err(e) => eprintln!("{:<13} could not serialize view: {}", label, e),
    }
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    println!("=== Clinic Walkthrough ===\n");

    let store = MemoryStore::new();
    let admin = store.add_staff("admin", "Ada", "Min", Role::Admin);
    let doctor = store.add_staff("dr_grey", "Meredith", "Grey", Role::Doctor);
    let desk = store.add_staff("desk", "Pam", "Beesly", Role::Receptionist);
    let service = AccessService::new(store);

    // Scenario 1: Admin registers a patient
    println!("--- Scenario 1: Admin Registers a Patient ---");
    service.store().set_session(Some(admin.clone()));
    service.record_login(&admin);
    let ctx = service.context("req-001", &[Operation::CreatePatient])?;
    let jane = service.mutate(
        &ctx,
        None,
        PatientFields::default()
            .with_name("Jane Doe")
            .with_age(52)
            .with_contact("555-1234")
            .with_diagnosis("Type 2 Diabetes")
            .with_assigned_doctor(doctor.id),
    )?;
    show("admin", &jane);

    let staff_ctx = service.context("req-002", &[Operation::CreateStaff])?;
    let account = service.create_staff(
        &staff_ctx,
        StaffRequest::new("dr_house", "not-logged-anywhere", Role::Doctor),
    )?;
    println!("Created account #{} ({})", account.id, account.username);

    // Scenario 2: Doctor reviews the record
    println!("\n--- Scenario 2: Doctor Reviews the Record ---");
    service.store().set_session(Some(doctor.clone()));
    let ctx = service.context("req-003", &[Operation::ViewPatient])?;
    show("doctor", &service.view_patient(&ctx, jane.id)?);

    match service.context("req-004", &[Operation::CreatePatient]) {
        Ok(_) => println!("Unexpected success"),
        Err(e) => println!("Create refused (expected): {} -> {:?}", e, e.navigation()),
    }

    // Scenario 3: Receptionist at the front desk
    println!("\n--- Scenario 3: Receptionist at the Front Desk ---");
    service.store().set_session(Some(desk.clone()));
    let ctx = service.context("req-005", &[Operation::EditPatient])?;
    show("receptionist", &service.view_patient(&ctx, jane.id)?);

    match service.mutate(&ctx, Some(jane.id), PatientFields::default().with_name("J. Doe")) {
        Ok(_) => println!("Unexpected success"),
        Err(e) => println!("Rename refused (expected): {}", e),
    }

    let reassigned = service.mutate(
        &ctx,
        Some(jane.id),
        PatientFields::default().with_assigned_doctor(account.id),
    )?;
    show("reassigned", &reassigned);

    // Scenario 4: Admin reviews the audit log
    println!("\n--- Scenario 4: Audit Log ---");
    service.store().set_session(Some(admin));
    let ctx = service.context("req-006", &[Operation::ViewAuditLog])?;
    for event in service.audit_feed(&ctx)? {
        println!("  [{}] {}", event.class(), event);
    }

    let csv = service.audit_export(&ctx)?;
    println!("\nExport:\n{}", String::from_utf8_lossy(&csv));

    println!("=== Example Complete ===");
    Ok(())
}
