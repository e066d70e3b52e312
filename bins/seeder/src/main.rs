//! Database seeder for Tala development and testing.
//!
//! Seeds one user per role, a couple of stores, and approved cash advances
//! ready to liquidate.
//!
//! Usage: cargo run --bin seeder

use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use tala_core::auth::hash_password;
use tala_db::entities::{
    cash_advances, sea_orm_active_enums::{CashAdvanceStatus, CashAdvanceType, UserRole},
    stores, users,
};

/// Deterministic ids so repeated seeding stays idempotent.
const EMPLOYEE_ID: &str = "00000000-0000-0000-0000-000000000001";
const SUPERVISOR_ID: &str = "00000000-0000-0000-0000-000000000002";
const MANAGER_ID: &str = "00000000-0000-0000-0000-000000000003";
const ADMIN_ID: &str = "00000000-0000-0000-0000-000000000004";
const STORE_MAKATI_ID: &str = "00000000-0000-0000-0000-000000000101";
const STORE_CEBU_ID: &str = "00000000-0000-0000-0000-000000000102";
const ADVANCE_SUPPORT_ID: &str = "00000000-0000-0000-0000-000000000201";
const ADVANCE_REIMB_ID: &str = "00000000-0000-0000-0000-000000000202";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = tala_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    println!("Seeding users...");
    seed_users(&db).await;

    println!("Seeding stores...");
    seed_stores(&db).await;

    println!("Seeding cash advances...");
    seed_cash_advances(&db).await;

    println!("Done.");
}

async fn seed_users(db: &DatabaseConnection) {
    let seeds = [
        (EMPLOYEE_ID, "nena@tala.dev", "Nena Dizon", UserRole::Employee),
        (
            SUPERVISOR_ID,
            "ramon@tala.dev",
            "Ramon Ilagan",
            UserRole::Supervisor,
        ),
        (MANAGER_ID, "pilar@tala.dev", "Pilar Reyes", UserRole::Manager),
        (ADMIN_ID, "odette@tala.dev", "Odette Cruz", UserRole::Admin),
    ];

    for (id, email, name, role) in seeds {
        let id = Uuid::parse_str(id).expect("valid seed uuid");
        if users::Entity::find_by_id(id).one(db).await.unwrap().is_some() {
            continue;
        }

        let password_hash = hash_password("tala-dev-password").expect("hash seed password");
        users::ActiveModel {
            id: Set(id),
            email: Set(email.to_string()),
            full_name: Set(name.to_string()),
            password_hash: Set(password_hash),
            role: Set(role),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await
        .expect("insert seed user");
    }
}

async fn seed_stores(db: &DatabaseConnection) {
    let seeds = [
        (STORE_MAKATI_ID, "MKT-01", "Makati Branch"),
        (STORE_CEBU_ID, "CEB-01", "Cebu Branch"),
    ];

    for (id, code, name) in seeds {
        let id = Uuid::parse_str(id).expect("valid seed uuid");
        if stores::Entity::find_by_id(id).one(db).await.unwrap().is_some() {
            continue;
        }

        stores::ActiveModel {
            id: Set(id),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await
        .expect("insert seed store");
    }
}

async fn seed_cash_advances(db: &DatabaseConnection) {
    let employee = Uuid::parse_str(EMPLOYEE_ID).expect("valid seed uuid");
    let seeds = [
        (
            ADVANCE_SUPPORT_ID,
            dec!(5000.00),
            CashAdvanceType::Support,
            "Makati store audit trip",
        ),
        (
            ADVANCE_REIMB_ID,
            dec!(3000.00),
            CashAdvanceType::Reimbursement,
            "Cebu supplier visit",
        ),
    ];

    for (id, amount, advance_type, purpose) in seeds {
        let id = Uuid::parse_str(id).expect("valid seed uuid");
        if cash_advances::Entity::find_by_id(id)
            .one(db)
            .await
            .unwrap()
            .is_some()
        {
            continue;
        }

        cash_advances::ActiveModel {
            id: Set(id),
            employee_id: Set(employee),
            amount: Set(amount),
            status: Set(CashAdvanceStatus::Approved),
            advance_type: Set(advance_type),
            purpose: Set(purpose.to_string()),
            advance_date: Set(NaiveDate::from_ymd_opt(2026, 7, 1).expect("valid date")),
            created_at: Set(Utc::now().into()),
            updated_at: Set(Utc::now().into()),
        }
        .insert(db)
        .await
        .expect("insert seed cash advance");
    }
}
