//! crates/production_tracker_core/src/seed.rs
//!
//! Data written into empty storage on first start.

use chrono::Days;

use crate::clock::db_timestamp;
use crate::domain::{Category, OffDay, ProcessType, ProductionEntry, Role, Unit, User};
use crate::ports::Clock;

const DEFAULT_PASSWORD: &str = "password123";

fn user(id: &str, name: &str, username: &str, email: &str, role: Role, category: Option<Category>) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        username: username.to_string(),
        email: email.to_string(),
        role,
        category,
        password: Some(DEFAULT_PASSWORD.to_string()),
        avatar: None,
    }
}

/// The built-in accounts. Login also accepts these when storage lost them.
pub fn initial_users() -> Vec<User> {
    vec![
        user("u1", "Admin User", "admin", "admin@halagel.com", Role::Admin, None),
        user(
            "u2",
            "Healthcare Manager",
            "manager",
            "manager@halagel.com",
            Role::Manager,
            Some(Category::Healthcare),
        ),
        user(
            "u3",
            "Planner Staff",
            "planner",
            "planner@halagel.com",
            Role::Planner,
            Some(Category::Toothpaste),
        ),
        user(
            "u4",
            "Operator Healthcare",
            "operator",
            "op.health@halagel.com",
            Role::Operator,
            Some(Category::Healthcare),
        ),
        user(
            "u5",
            "Operator Toothpaste",
            "operator2",
            "op.paste@halagel.com",
            Role::Operator,
            Some(Category::Toothpaste),
        ),
    ]
}

pub fn initial_off_days() -> Vec<OffDay> {
    vec![
        OffDay {
            id: "od1".to_string(),
            date: "2025-12-25".to_string(),
            description: "Christmas Day".to_string(),
            created_by: "u1".to_string(),
        },
        OffDay {
            id: "od2".to_string(),
            date: "2026-01-01".to_string(),
            description: "New Year".to_string(),
            created_by: "u1".to_string(),
        },
    ]
}

const DEMO_PRODUCTS: [&str; 7] = [
    "Pain Relief Gel",
    "Minty Fresh",
    "Pink Salt Fine",
    "Vitamin C",
    "Charcoal Paste",
    "Herbal Shampoo",
    "Skin Repair Cream",
];

/// Thirty days of plausible plan/actual figures ending today. The figures are
/// derived from the day and product index so a given day always seeds the same data.
pub fn demo_production(clock: &dyn Clock) -> Vec<ProductionEntry> {
    let today = clock.now().date_naive();
    let updated_at = db_timestamp(clock);
    let mut entries = Vec::new();

    for day in 0..30u64 {
        let Some(date) = today.checked_sub_days(Days::new(day)) else {
            continue;
        };
        let date_str = date.format("%Y-%m-%d").to_string();
        let compact = date.format("%Y%m%d").to_string();

        for (idx, product) in DEMO_PRODUCTS.iter().enumerate() {
            let i = day as usize;
            // Roughly one product in five has no plan on a given day.
            if (i * 7 + idx * 3) % 5 == 0 {
                continue;
            }
            let plan = 500 + (i * 37 + idx * 91) % 500;
            let yield_pct = 80 + (i + idx * 3) % 21;
            let actual = plan * yield_pct / 100;

            entries.push(ProductionEntry {
                id: format!("seed-{day}-{idx}"),
                date: date_str.clone(),
                category: Category::ALL[idx % Category::ALL.len()],
                process: ProcessType::ALL[idx % ProcessType::ALL.len()],
                product_name: product.to_string(),
                plan_quantity: plan as f64,
                actual_quantity: actual as f64,
                unit: if idx % 2 == 0 { Unit::Kg } else { Unit::Pcs },
                batch_no: format!("B-{compact}-{idx}"),
                manpower: (3 + (i + idx) % 5) as f64,
                remark: String::new(),
                last_updated_by: "u1".to_string(),
                updated_at: updated_at.clone(),
            });
        }
    }
    entries
}
