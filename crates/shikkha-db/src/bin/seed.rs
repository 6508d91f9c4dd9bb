//! # Seed Data Generator
//!
//! Populates a database with a demo school for development.
//!
//! ## Usage
//! ```bash
//! # Uses DATABASE_URL
//! cargo run -p shikkha-db --bin seed
//!
//! # Explicit database and class size
//! cargo run -p shikkha-db --bin seed -- --db postgres://localhost/shikkha --students 40
//! ```
//!
//! ## Generated Data
//! - A developer account and one school with an admin
//! - Teachers, and students across classes Six to Ten
//! - Library books, inventory items, one bus route with a vehicle
//! - An opening "standard" credit package
//!
//! Every account uses the password printed at the end. Running twice is a
//! no-op: the seed stops when the demo admin already exists.

use std::env;

use anyhow::{bail, Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shikkha_core::inventory::NewItem;
use shikkha_core::library::NewBook;
use shikkha_core::transport::{AssignmentRequest, NewRoute, NewVehicle};
use shikkha_core::{NewSchool, NewStudent, NewTeacher, NewUser, Role};
use shikkha_db::{Database, DbConfig};
use tracing::{info, warn};

const DEMO_PASSWORD: &str = "shikkha-demo-2026";
const DEVELOPER_EMAIL: &str = "developer@shikkha.dev";
const ADMIN_EMAIL: &str = "admin@demo-school.edu.bd";

const CLASSES: &[&str] = &["Six", "Seven", "Eight", "Nine", "Ten"];

const FIRST_NAMES: &[&str] = &[
    "Rahim", "Karim", "Ayesha", "Fatima", "Tanvir", "Nusrat", "Sabbir", "Mim", "Arif", "Sadia",
    "Imran", "Farhana", "Rakib", "Jannat", "Shakil", "Tasnim", "Hasan", "Sumaiya", "Nayeem", "Riya",
];

const LAST_NAMES: &[&str] = &[
    "Ahmed", "Hossain", "Islam", "Rahman", "Chowdhury", "Khan", "Uddin", "Akter", "Sarkar", "Das",
];

const BOOKS: &[(&str, &str, i32)] = &[
    ("Amar Bornomala", "Sitanath Basak", 5),
    ("Gitanjali", "Rabindranath Tagore", 3),
    ("Agnibeena", "Kazi Nazrul Islam", 3),
    ("Pather Panchali", "Bibhutibhushan Bandyopadhyay", 2),
    ("Higher Mathematics (Nine-Ten)", "NCTB", 10),
    ("Physics (Nine-Ten)", "NCTB", 10),
];

const ITEMS: &[(&str, &str, i64, i64)] = &[
    ("Chalk box", "stationery", 40, 10),
    ("Whiteboard marker", "stationery", 25, 20),
    ("Exam answer script", "exam", 800, 300),
    ("Bench", "furniture", 120, 0),
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,shikkha_db=debug".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_url = env::var("DATABASE_URL").ok();
    let mut per_class: usize = 20;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                db_url = args.get(i + 1).cloned();
                i += 1;
            }
            "--students" | "-s" => {
                per_class = args
                    .get(i + 1)
                    .and_then(|n| n.parse().ok())
                    .context("--students needs a number")?;
                i += 1;
            }
            "--help" | "-h" => {
                println!("Shikkha Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <URL>         PostgreSQL URL (default: $DATABASE_URL)");
                println!("  -s, --students <N>     Students per class (default: 20)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            other => bail!("unknown argument: {other}"),
        }
        i += 1;
    }

    let db_url = db_url.context("DATABASE_URL is not set and --db was not given")?;
    let db = Database::new(DbConfig::new(&db_url)).await?;
    info!("Connected and migrated");

    if db.users().find_credentials(ADMIN_EMAIL).await?.is_some() {
        warn!(email = ADMIN_EMAIL, "Demo school already seeded; nothing to do");
        return Ok(());
    }

    let password_hash = hash(DEMO_PASSWORD)?;
    let start = std::time::Instant::now();

    // Platform operator
    if db.users().count_role(Role::Developer).await? == 0 {
        let developer: NewUser = from_json(json!({
            "email": DEVELOPER_EMAIL,
            "full_name": "Platform Developer",
            "role": "developer",
            "password": DEMO_PASSWORD,
        }))?;
        db.users().create(None, &developer, &password_hash).await?;
    }

    // School and admin
    let school = db
        .schools()
        .create(&from_json::<NewSchool>(json!({
            "name": "Demo High School",
            "name_bn": "ডেমো উচ্চ বিদ্যালয়",
            "eiin": "108254",
            "address": "Mirpur 10, Dhaka",
            "phone": "01711000000",
            "principal_name": "Md. Abdul Karim",
        }))?)
        .await?;
    let admin: NewUser = from_json(json!({
        "email": ADMIN_EMAIL,
        "full_name": "School Admin",
        "role": "admin",
        "password": DEMO_PASSWORD,
    }))?;
    let admin = db.users().create(Some(&school.id), &admin, &password_hash).await?;
    info!(school_id = %school.id, "School created");

    // Teachers
    let subjects = ["Bangla", "English", "Mathematics", "Science", "Religion"];
    for (n, subject) in subjects.iter().enumerate() {
        let teacher: NewTeacher = from_json(json!({
            "teacher_code": format!("T-{:03}", n + 1),
            "name": person_name(n * 7 + 3),
            "designation": if n == 0 { "Senior Teacher" } else { "Assistant Teacher" },
            "subject": subject,
        }))?;
        db.teachers().create(&school.id, &teacher).await?;
    }

    // Students
    let mut student_ids = Vec::new();
    for (c, class_name) in CLASSES.iter().enumerate() {
        for roll in 1..=per_class {
            let index = c * per_class + roll;
            let student: NewStudent = from_json(json!({
                "student_code": format!("2026-{:02}-{:03}", c + 6, roll),
                "name": person_name(index),
                "class_name": class_name,
                "section": if roll % 2 == 0 { "B" } else { "A" },
                "roll_number": roll,
                "father_name": format!("Md. {}", LAST_NAMES[index % LAST_NAMES.len()]),
                "guardian_phone": format!("0171{:07}", index),
            }))?;
            let created = db.students().create(&school.id, &student).await?;
            student_ids.push(created.id);
        }
    }
    info!(count = student_ids.len(), "Students created");

    // Library
    for (title, author, copies) in BOOKS {
        let book: NewBook = from_json(json!({
            "title": title,
            "author": author,
            "total_copies": copies,
        }))?;
        db.library().create_book(&school.id, &book).await?;
    }

    // Inventory
    for (name, category, quantity, min_quantity) in ITEMS {
        let item: NewItem = from_json(json!({
            "name": name,
            "category": category,
            "quantity": quantity,
            "min_quantity": min_quantity,
        }))?;
        db.inventory().create_item(&school.id, &item, Some(&admin.id)).await?;
    }

    // Transport
    let route = db
        .transport()
        .create_route(
            &school.id,
            &from_json::<NewRoute>(json!({
                "name": "Route 1 - Mirpur",
                "start_point": "Mirpur 1",
                "end_point": "Demo High School",
                "stops": ["Mirpur 2", "Mirpur 10", "Kazipara"],
                "monthly_fee_paisa": 150_000,
            }))?,
        )
        .await?;
    let vehicle: NewVehicle = from_json(json!({
        "route_id": route.id,
        "registration_no": "Dhaka Metro-Ba-11-2233",
        "capacity": 30,
        "driver_name": "Abdul Jalil",
    }))?;
    db.transport().create_vehicle(&school.id, &vehicle).await?;
    for student_id in student_ids.iter().take(10) {
        db.transport()
            .assign(
                &school.id,
                &AssignmentRequest {
                    student_id: student_id.clone(),
                    route_id: route.id.clone(),
                    pickup_stop: Some("Mirpur 10".to_string()),
                },
            )
            .await?;
    }

    // Opening credits
    let purchase = db
        .credits()
        .purchase(&school.id, "standard", Some(&admin.id))
        .await?;

    println!();
    println!("Seeded demo school in {:?}", start.elapsed());
    println!("  School:     {} ({})", school.name, school.id);
    println!("  Students:   {}", student_ids.len());
    println!("  Credits:    {}", purchase.balance_after);
    println!("  Developer:  {DEVELOPER_EMAIL}");
    println!("  Admin:      {ADMIN_EMAIL}");
    println!("  Password:   {DEMO_PASSWORD}");

    Ok(())
}

fn person_name(index: usize) -> String {
    format!(
        "{} {}",
        FIRST_NAMES[index % FIRST_NAMES.len()],
        LAST_NAMES[(index / FIRST_NAMES.len() + index) % LAST_NAMES.len()]
    )
}

fn from_json<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).context("invalid seed record")
}

fn hash(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))
}
