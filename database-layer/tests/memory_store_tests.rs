use auth_rbac::Role;
use chrono::NaiveDate;
use database_layer::*;

// =============================================================================
// Fixtures
// =============================================================================

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

async fn seed_user(repos: &Repositories, email: &str, role: Role) -> User {
    repos
        .users
        .create(NewUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role,
        })
        .await
        .unwrap()
}

async fn seed_doctor(repos: &Repositories, name: &str, email: Option<&str>) -> Doctor {
    repos
        .doctors
        .create(NewDoctor {
            name: name.to_string(),
            email: email.map(str::to_string),
            specialty: "Cardiology".to_string(),
            phone: "555-0101".to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
}

async fn seed_patient(repos: &Repositories) -> Patient {
    repos
        .patients
        .create(NewPatient {
            name: "John Smith".to_string(),
            phone: "555-0199".to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
}

async fn seed_appointment(repos: &Repositories, patient: &Patient, doctor: &Doctor) -> Appointment {
    repos
        .appointments
        .create(NewAppointment {
            patient_id: patient.id,
            doctor_id: doctor.id,
            date: date(3),
            time: "09:30".to_string(),
            reason: Some("Checkup".to_string()),
            notes: None,
        })
        .await
        .unwrap()
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_user_email_is_unique_case_insensitively() {
    let repos = Repositories::in_memory();
    seed_user(&repos, "admin@hospital.com", Role::Admin).await;

    let duplicate = repos
        .users
        .create(NewUser {
            name: "Other".to_string(),
            email: "ADMIN@hospital.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Receptionist,
        })
        .await;
    assert!(matches!(duplicate, Err(DatabaseError::Conflict(_))));

    let found = repos.users.find_by_email("Admin@Hospital.com").await.unwrap();
    assert_eq!(found.unwrap().role, Role::Admin);
}

// =============================================================================
// Doctors
// =============================================================================

#[tokio::test]
async fn test_doctor_lookup_by_account_and_email() {
    let repos = Repositories::in_memory();
    let user = seed_user(&repos, "doctor1@hospital.com", Role::Doctor).await;
    let doctor = repos
        .doctors
        .create(NewDoctor {
            user_id: Some(user.id),
            name: "Dr. Sarah Johnson".to_string(),
            email: Some("Doctor1@Hospital.com".to_string()),
            specialty: "Cardiology".to_string(),
            phone: "555-0101".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let by_user = repos.doctors.find_by_user_id(user.id).await.unwrap();
    assert_eq!(by_user.map(|d| d.id), Some(doctor.id));

    let by_email = repos.doctors.find_by_email("doctor1@hospital.com").await.unwrap();
    assert_eq!(by_email.map(|d| d.id), Some(doctor.id));

    let by_name = repos.doctors.find_by_email("Dr. Sarah Johnson").await.unwrap();
    assert!(by_name.is_none());
}

#[tokio::test]
async fn test_account_links_to_one_doctor() {
    let repos = Repositories::in_memory();
    let user = seed_user(&repos, "doctor1@hospital.com", Role::Doctor).await;
    let first = seed_doctor(&repos, "Dr. One", None).await;
    let second = seed_doctor(&repos, "Dr. Two", None).await;

    let linked = repos
        .doctors
        .update(
            first.id,
            DoctorChanges {
                user_id: Some(user.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(linked.unwrap().user_id, Some(user.id));

    let stolen = repos
        .doctors
        .update(
            second.id,
            DoctorChanges {
                user_id: Some(user.id),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(stolen, Err(DatabaseError::Conflict(_))));

    let unknown = repos
        .doctors
        .update(
            second.id,
            DoctorChanges {
                user_id: Some(999),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(unknown, Err(DatabaseError::ForeignKeyViolation(_))));
}

#[tokio::test]
async fn test_failed_doctor_create_releases_account_link() {
    let repos = Repositories::in_memory();
    let user = seed_user(&repos, "doctor1@hospital.com", Role::Doctor).await;
    seed_doctor(&repos, "Dr. One", Some("shared@hospital.com")).await;

    let clash = repos
        .doctors
        .create(NewDoctor {
            user_id: Some(user.id),
            name: "Dr. Two".to_string(),
            email: Some("shared@hospital.com".to_string()),
            specialty: "Neurology".to_string(),
            phone: "555-0102".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(clash, Err(DatabaseError::Conflict(_))));
    assert!(repos.doctors.find_by_user_id(user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_doctor_update_keeps_account_link() {
    let repos = Repositories::in_memory();
    let owner = seed_user(&repos, "doctor1@hospital.com", Role::Doctor).await;
    let other = seed_user(&repos, "doctor2@hospital.com", Role::Doctor).await;
    let doctor = repos
        .doctors
        .create(NewDoctor {
            user_id: Some(owner.id),
            name: "Dr. One".to_string(),
            specialty: "Cardiology".to_string(),
            phone: "555-0101".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    seed_doctor(&repos, "Dr. Two", Some("taken@hospital.com")).await;

    let result = repos
        .doctors
        .update(
            doctor.id,
            DoctorChanges {
                user_id: Some(other.id),
                email: Some("taken@hospital.com".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(DatabaseError::Conflict(_))));

    let row = repos.doctors.find_by_id(doctor.id).await.unwrap().unwrap();
    assert_eq!(row.user_id, Some(owner.id));
    assert_eq!(
        repos.doctors.find_by_user_id(owner.id).await.unwrap().map(|d| d.id),
        Some(doctor.id)
    );
    assert!(repos.doctors.find_by_user_id(other.id).await.unwrap().is_none());

    // The account can still be relinked once the email is free
    let moved = repos
        .doctors
        .update(
            doctor.id,
            DoctorChanges {
                user_id: Some(other.id),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.user_id, Some(other.id));
    assert!(repos.doctors.find_by_user_id(owner.id).await.unwrap().is_none());
}

// =============================================================================
// Appointments
// =============================================================================

#[tokio::test]
async fn test_appointment_requires_existing_patient_and_doctor() {
    let repos = Repositories::in_memory();
    let doctor = seed_doctor(&repos, "Dr. One", None).await;

    let result = repos
        .appointments
        .create(NewAppointment {
            patient_id: 42,
            doctor_id: doctor.id,
            date: date(1),
            time: "10:00".to_string(),
            reason: None,
            notes: None,
        })
        .await;
    assert!(matches!(result, Err(DatabaseError::ForeignKeyViolation(_))));
}

#[tokio::test]
async fn test_new_appointment_is_scheduled() {
    let repos = Repositories::in_memory();
    let patient = seed_patient(&repos).await;
    let doctor = seed_doctor(&repos, "Dr. One", None).await;
    let appointment = seed_appointment(&repos, &patient, &doctor).await;

    assert_eq!(appointment.status, AppointmentStatus::Scheduled);

    let updated = repos
        .appointments
        .update(
            appointment.id,
            AppointmentChanges {
                status: Some(AppointmentStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.status, AppointmentStatus::Completed);
    assert_eq!(updated.reason.as_deref(), Some("Checkup"));
}

#[tokio::test]
async fn test_list_filters_by_doctor_and_paginates() {
    let repos = Repositories::in_memory();
    let patient = seed_patient(&repos).await;
    let mine = seed_doctor(&repos, "Dr. Mine", None).await;
    let other = seed_doctor(&repos, "Dr. Other", None).await;

    for _ in 0..3 {
        seed_appointment(&repos, &patient, &mine).await;
        seed_appointment(&repos, &patient, &other).await;
    }

    let all = repos.appointments.list(&ListQuery::default()).await.unwrap();
    assert_eq!(all.len(), 6);

    let filtered = repos
        .appointments
        .list(&ListQuery::default().for_doctor(Some(mine.id)))
        .await
        .unwrap();
    assert_eq!(filtered.len(), 3);
    assert!(filtered.iter().all(|a| a.doctor_id == mine.id));

    let page = repos.appointments.list(&ListQuery::new(2, 2)).await.unwrap();
    let ids: Vec<_> = page.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![3, 4]);
}

#[tokio::test]
async fn test_lists_follow_per_entity_order() {
    let repos = Repositories::in_memory();
    let patient = seed_patient(&repos).await;
    let doctor = seed_doctor(&repos, "Dr. One", None).await;

    for (day, time) in [(5, "09:00"), (3, "14:00"), (3, "08:15")] {
        repos
            .appointments
            .create(NewAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                date: date(day),
                time: time.to_string(),
                reason: None,
                notes: None,
            })
            .await
            .unwrap();
    }
    let appointments = repos.appointments.list(&ListQuery::default()).await.unwrap();
    let ids: Vec<_> = appointments.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);

    for diagnosis in ["Flu", "Migraine"] {
        repos
            .prescriptions
            .create(NewPrescription {
                patient_id: patient.id,
                doctor_id: doctor.id,
                appointment_id: None,
                diagnosis: diagnosis.to_string(),
                medications: serde_json::json!([]),
                frequency: "Daily".to_string(),
                notes: None,
            })
            .await
            .unwrap();
    }
    let prescriptions = repos.prescriptions.list(&ListQuery::default()).await.unwrap();
    let diagnoses: Vec<_> = prescriptions.iter().map(|p| p.diagnosis.as_str()).collect();
    assert_eq!(diagnoses, vec!["Migraine", "Flu"]);

    for day in [1, 9, 4] {
        repos
            .billing
            .create(NewBilling {
                patient_id: patient.id,
                amount: 10.0,
                payment_status: PaymentStatus::Pending,
                description: None,
                date: date(day),
            })
            .await
            .unwrap();
    }
    let bills = repos.billing.list(&ListQuery::default()).await.unwrap();
    let days: Vec<_> = bills.iter().map(|b| b.date).collect();
    assert_eq!(days, vec![date(9), date(4), date(1)]);
}

// =============================================================================
// Deletes
// =============================================================================

#[tokio::test]
async fn test_patient_delete_cascades() {
    let repos = Repositories::in_memory();
    let patient = seed_patient(&repos).await;
    let doctor = seed_doctor(&repos, "Dr. One", None).await;
    let appointment = seed_appointment(&repos, &patient, &doctor).await;
    let bill = repos
        .billing
        .create(NewBilling {
            patient_id: patient.id,
            amount: 150.0,
            payment_status: PaymentStatus::Pending,
            description: None,
            date: date(3),
        })
        .await
        .unwrap();

    assert!(repos.patients.delete(patient.id).await.unwrap());
    assert!(repos.appointments.find_by_id(appointment.id).await.unwrap().is_none());
    assert!(repos.billing.find_by_id(bill.id).await.unwrap().is_none());
    assert!(!repos.patients.delete(patient.id).await.unwrap());
}

#[tokio::test]
async fn test_appointment_delete_detaches_prescriptions() {
    let repos = Repositories::in_memory();
    let patient = seed_patient(&repos).await;
    let doctor = seed_doctor(&repos, "Dr. One", None).await;
    let appointment = seed_appointment(&repos, &patient, &doctor).await;
    let prescription = repos
        .prescriptions
        .create(NewPrescription {
            patient_id: patient.id,
            doctor_id: doctor.id,
            appointment_id: Some(appointment.id),
            diagnosis: "Hypertension".to_string(),
            medications: serde_json::json!([{"name": "Lisinopril", "dose": "10mg"}]),
            frequency: "Once daily".to_string(),
            notes: None,
        })
        .await
        .unwrap();

    assert!(repos.appointments.delete(appointment.id).await.unwrap());
    let kept = repos
        .prescriptions
        .find_by_id(prescription.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.appointment_id, None);
}

#[tokio::test]
async fn test_update_missing_row_returns_none() {
    let repos = Repositories::in_memory();
    let result = repos
        .billing
        .update(
            7,
            BillingChanges {
                amount: Some(10.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(result.is_none());
    assert!(repos.is_healthy().await);
}
