//! Repository tests against a live PostgreSQL.
//!
//! Set `TEST_DATABASE_URL` to run them; without it every test returns early.
//! Each test works in its own freshly created school.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shikkha_core::library::{BorrowerKind, IssueBookRequest, NewBook};
use shikkha_core::transport::{AssignmentRequest, NewRoute, NewVehicle};
use shikkha_core::{
    CoreError, GenerateDocumentsRequest, NewFeeReceipt, NewNotification, NewSchool, NewStudent,
    NewTeacher, NewUser, Page, Principal, Role, School, Student, StudentUpdate, User, ValidationError,
};
use shikkha_db::{Database, DbConfig, DbError, HistoryFilter, IssueStatus};

async fn test_db() -> Option<Database> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    Some(Database::new(DbConfig::new(url).max_connections(5)).await.unwrap())
}

fn from_json<T: DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).unwrap()
}

async fn new_school(db: &Database) -> School {
    let name = format!("Test School {}", uuid::Uuid::new_v4().simple());
    db.schools()
        .create(&from_json::<NewSchool>(json!({ "name": name })))
        .await
        .unwrap()
}

async fn new_student(db: &Database, school: &School, roll: i32) -> Student {
    let student: NewStudent = from_json(json!({
        "student_code": format!("S-{roll:03}"),
        "name": format!("Student {roll}"),
        "class_name": "Eight",
        "section": "A",
        "roll_number": roll,
    }));
    db.students().create(&school.id, &student).await.unwrap()
}

fn id_cards(students: &[&Student]) -> GenerateDocumentsRequest {
    from_json(json!({
        "kind": "student_id_card",
        "student_ids": students.iter().map(|s| s.id.clone()).collect::<Vec<_>>(),
    }))
}

#[tokio::test]
async fn test_generation_charges_and_numbers_documents() {
    let Some(db) = test_db().await else { return };
    let school = new_school(&db).await;
    let a = new_student(&db, &school, 1).await;
    let b = new_student(&db, &school, 2).await;

    // Empty balance: nothing is written
    let err = db.documents().generate(&school, &id_cards(&[&a]), None).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::InsufficientCredits { required: 2, available: 0 })
    ));
    let history = db.documents().history(&school.id, &HistoryFilter::default()).await.unwrap();
    assert!(history.is_empty());

    db.credits().purchase(&school.id, "starter", None).await.unwrap();

    let response = db.documents().generate(&school, &id_cards(&[&a, &b]), None).await.unwrap();
    assert_eq!(response.credits_charged, 4);
    assert_eq!(response.balance_after, 496);
    assert_eq!(response.documents.len(), 2);
    assert!(response.documents[0].document.serial_number.ends_with("-0001"));
    assert!(response.documents[1].document.serial_number.ends_with("-0002"));

    let balance = db.credits().balance(&school.id).await.unwrap();
    assert_eq!(balance.current_credits, 496);
    assert_eq!(balance.used_credits, 4);

    let serial = response.documents[0].document.serial_number.to_lowercase();
    let verified = db.documents().verify(&serial).await.unwrap().unwrap();
    assert_eq!(verified.school_name, school.name);
    assert_eq!(verified.student_name.as_deref(), Some("Student 1"));
    assert!(db.documents().verify("not-a-serial").await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_spends_never_overdraw() {
    let Some(db) = test_db().await else { return };
    let school = new_school(&db).await;
    let a = new_student(&db, &school, 1).await;

    db.credits()
        .add(
            &school.id,
            2,
            shikkha_core::credits::CreditTransactionKind::Purchase,
            Default::default(),
        )
        .await
        .unwrap();

    let request = id_cards(&[&a]);
    let docs = db.documents();
    let (first, second) = tokio::join!(
        docs.generate(&school, &request, None),
        docs.generate(&school, &request, None)
    );

    assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);
    assert_eq!(db.credits().balance(&school.id).await.unwrap().current_credits, 0);
}

#[tokio::test]
async fn test_fee_receipts_are_numbered_per_month() {
    let Some(db) = test_db().await else { return };
    let school = new_school(&db).await;
    let student = new_student(&db, &school, 1).await;

    let receipt: NewFeeReceipt = from_json(json!({
        "student_id": student.id,
        "fee_type": "tuition",
        "amount_paisa": 100_000,
        "waiver_bps": 5000,
        "month": "2026-10",
        "payment_method": "bkash",
    }));

    let first = db.fees().create(&school, &receipt, None).await.unwrap();
    let second = db.fees().create(&school, &receipt, None).await.unwrap();

    assert_eq!(first.amount_paisa, 50_000);
    assert_eq!(first.waiver_paisa, 50_000);
    assert!(first.receipt_number.ends_with("-00001"));
    assert!(second.receipt_number.ends_with("-00002"));

    let listed = db
        .fees()
        .list(&school.id, Some(&student.id), Some("2026-10"), Page::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn test_library_issue_and_return() {
    let Some(db) = test_db().await else { return };
    let school = new_school(&db).await;
    let student = new_student(&db, &school, 1).await;

    let book = db
        .library()
        .create_book(
            &school.id,
            &from_json::<NewBook>(json!({ "title": "Gitanjali", "total_copies": 1 })),
        )
        .await
        .unwrap();
    assert_eq!(book.available_copies, 1);

    let request = IssueBookRequest {
        book_id: book.id.clone(),
        borrower_kind: BorrowerKind::Student,
        borrower_id: student.id.clone(),
        due_date: None,
    };
    let issue = db.library().issue(&school.id, &request).await.unwrap();

    let err = db.library().issue(&school.id, &request).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::NoCopiesAvailable { .. })));

    let open = db
        .library()
        .list_issues(&school.id, IssueStatus::Open, None, Page::default())
        .await
        .unwrap();
    assert_eq!(open.len(), 1);

    let returned = db.library().return_book(&school.id, &issue.id).await.unwrap();
    assert!(returned.returned_at.is_some());
    assert_eq!(returned.fine_paisa, 0);

    let err = db.library().return_book(&school.id, &issue.id).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::AlreadyReturned(_))));

    let book = db.library().get_book(&school.id, &book.id).await.unwrap().unwrap();
    assert_eq!(book.available_copies, 1);
}

#[tokio::test]
async fn test_route_capacity_is_enforced() {
    let Some(db) = test_db().await else { return };
    let school = new_school(&db).await;
    let a = new_student(&db, &school, 1).await;
    let b = new_student(&db, &school, 2).await;

    let route = db
        .transport()
        .create_route(
            &school.id,
            &from_json::<NewRoute>(json!({
                "name": "Route 1",
                "start_point": "Mirpur 1",
                "end_point": "School",
                "stops": ["Mirpur 10"],
            })),
        )
        .await
        .unwrap();
    let vehicle: NewVehicle = from_json(json!({
        "route_id": route.id,
        "registration_no": "DHA-11-2233",
        "capacity": 1,
    }));
    db.transport().create_vehicle(&school.id, &vehicle).await.unwrap();

    let assign = |student: &Student| AssignmentRequest {
        student_id: student.id.clone(),
        route_id: route.id.clone(),
        pickup_stop: Some("Mirpur 10".to_string()),
    };

    db.transport().assign(&school.id, &assign(&a)).await.unwrap();

    let err = db.transport().assign(&school.id, &assign(&b)).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::RouteFull { capacity: 1, .. })));

    // Same student again only changes the stop
    db.transport().assign(&school.id, &assign(&a)).await.unwrap();

    let riders = db.transport().riders(&school.id, &route.id).await.unwrap();
    assert_eq!(riders.len(), 1);
    assert_eq!(riders[0].student_id, a.id);
}

#[tokio::test]
async fn test_notification_visibility_and_read_state() {
    let Some(db) = test_db().await else { return };
    let school = new_school(&db).await;

    let mut principals = Vec::new();
    for role in [Role::Teacher, Role::Student] {
        let user: NewUser = from_json(json!({
            "email": format!("{}-{}@test.edu.bd", role, uuid::Uuid::new_v4().simple()),
            "full_name": "Test User",
            "role": role,
            "password": "not-used-here",
        }));
        let user = db.users().create(Some(&school.id), &user, "hash").await.unwrap();
        principals.push(Principal {
            user_id: user.id,
            role,
            school_id: Some(school.id.clone()),
        });
    }
    let (teacher, student) = (&principals[0], &principals[1]);

    let notice: NewNotification = from_json(json!({
        "title": "Staff meeting",
        "body": "Sunday 10am in the library",
        "audience": "teachers",
    }));
    let created = db.notifications().create(&school.id, &notice, None).await.unwrap();

    let seen = db
        .notifications()
        .list_for(&school.id, student, false, Page::default())
        .await
        .unwrap();
    assert!(seen.is_empty());

    assert_eq!(db.notifications().unread_count(&school.id, teacher).await.unwrap(), 1);

    db.notifications().mark_read(&school.id, teacher, &created.id).await.unwrap();
    db.notifications().mark_read(&school.id, teacher, &created.id).await.unwrap();
    assert_eq!(db.notifications().unread_count(&school.id, teacher).await.unwrap(), 0);

    let err = db
        .notifications()
        .mark_read(&school.id, student, &created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { .. }));
}

async fn new_account(db: &Database, school: Option<&School>, role: Role) -> User {
    let user: NewUser = from_json(json!({
        "email": format!("{}-{}@test.edu.bd", role, uuid::Uuid::new_v4().simple()),
        "full_name": "Linked Account",
        "role": role,
        "password": "not-used-here",
    }));
    db.users()
        .create(school.map(|s| s.id.as_str()), &user, "hash")
        .await
        .unwrap()
}

fn is_invalid(err: &DbError, expected: &str) -> bool {
    matches!(
        err,
        DbError::Domain(CoreError::Validation(ValidationError::InvalidFormat { field, .. })) if field == expected
    )
}

#[tokio::test]
async fn test_portal_links_stay_inside_the_school() {
    let Some(db) = test_db().await else { return };
    let school = new_school(&db).await;
    let other = new_school(&db).await;

    let foreign_parent = new_account(&db, Some(&other), Role::Parent).await;
    let foreign_student = new_account(&db, Some(&other), Role::Student).await;
    let foreign_teacher = new_account(&db, Some(&other), Role::Teacher).await;
    let own_parent = new_account(&db, Some(&school), Role::Parent).await;

    let linked_abroad: NewStudent = from_json(json!({
        "student_code": "S-900",
        "name": "Cross Linked",
        "class_name": "Eight",
        "parent_user_id": foreign_parent.id,
    }));
    let err = db.students().create(&school.id, &linked_abroad).await.unwrap_err();
    assert!(is_invalid(&err, "parent_user_id"));

    let student_login_abroad: NewStudent = from_json(json!({
        "student_code": "S-901",
        "name": "Cross Linked",
        "class_name": "Eight",
        "user_id": foreign_student.id,
    }));
    let err = db.students().create(&school.id, &student_login_abroad).await.unwrap_err();
    assert!(is_invalid(&err, "user_id"));

    // right school, wrong role
    let parent_as_student: NewStudent = from_json(json!({
        "student_code": "S-902",
        "name": "Cross Linked",
        "class_name": "Eight",
        "user_id": own_parent.id,
    }));
    let err = db.students().create(&school.id, &parent_as_student).await.unwrap_err();
    assert!(is_invalid(&err, "user_id"));

    let teacher_abroad: NewTeacher = from_json(json!({
        "teacher_code": "T-900",
        "name": "Cross Linked",
        "user_id": foreign_teacher.id,
    }));
    let err = db.teachers().create(&school.id, &teacher_abroad).await.unwrap_err();
    assert!(is_invalid(&err, "user_id"));

    let child = new_student(&db, &school, 1).await;
    let relink: StudentUpdate = from_json(json!({ "parent_user_id": foreign_parent.id }));
    let err = db.students().update(&school.id, &child.id, &relink).await.unwrap_err();
    assert!(is_invalid(&err, "parent_user_id"));

    let link: StudentUpdate = from_json(json!({ "parent_user_id": own_parent.id }));
    db.students().update(&school.id, &child.id, &link).await.unwrap();

    let children = db.students().children_of(&school.id, &own_parent.id).await.unwrap();
    assert_eq!(children.len(), 1);
    assert!(db.students().children_of(&other.id, &own_parent.id).await.unwrap().is_empty());
    assert!(db.students().children_of(&school.id, &foreign_parent.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_accounts_follow_role_school_rules() {
    let Some(db) = test_db().await else { return };
    let school = new_school(&db).await;

    let developer = new_account(&db, None, Role::Developer).await;
    assert!(developer.school_id.is_none());

    let admin: NewUser = from_json(json!({
        "email": format!("admin-{}@test.edu.bd", uuid::Uuid::new_v4().simple()),
        "full_name": "No School",
        "role": "admin",
        "password": "not-used-here",
    }));
    let err = db.users().create(None, &admin, "hash").await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Domain(CoreError::Validation(ValidationError::Required { .. }))
    ));

    let developer: NewUser = from_json(json!({
        "email": format!("dev-{}@test.edu.bd", uuid::Uuid::new_v4().simple()),
        "full_name": "Pinned Developer",
        "role": "developer",
        "password": "not-used-here",
    }));
    let err = db.users().create(Some(&school.id), &developer, "hash").await.unwrap_err();
    assert!(is_invalid(&err, "school_id"));
}
