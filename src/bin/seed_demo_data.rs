// ABOUTME: Demo data seeder for local FitPlan development
// ABOUTME: Creates user, coach, and admin accounts plus sample wellness records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Demo data seeder for the FitPlan server.
//!
//! Populates the database with three accounts that can log in immediately
//! and enough records to exercise every screen.
//!
//! Usage:
//! ```bash
//! # Seed the database named by DATABASE_URL
//! cargo run --bin seed-demo-data
//!
//! # Seed a specific database file
//! cargo run --bin seed-demo-data -- --database-url sqlite:./data/demo.db
//!
//! # Verbose output
//! cargo run --bin seed-demo-data -- -v
//! ```
//!
//! Accounts that already exist are left untouched, so running the seeder
//! twice does not duplicate data.

use std::collections::BTreeMap;
use std::env;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use fitplan_server::auth::hash_password;
use fitplan_server::database::Database;
use fitplan_server::models::{
    CoachStatus, KnowledgeLink, Plan, PostureAnalysis, ReportAnalysis, Role, User,
};
use fitplan_server::services::{assessment, coach, todos};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

/// Password shared by every demo account
const DEMO_PASSWORD: &str = "password123";

/// Starting balance for the demo user, enough to redeem any badge
const DEMO_POINTS: i64 = 5000;

/// Fast bcrypt cost; demo credentials are not sensitive
const DEMO_BCRYPT_COST: u32 = 4;

#[derive(Parser)]
#[command(
    name = "seed-demo-data",
    about = "FitPlan Demo Data Seeder",
    long_about = "Populate the database with demo accounts and sample wellness records"
)]
struct SeedArgs {
    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// Demo account configuration
struct DemoAccount {
    email: &'static str,
    name: &'static str,
    role: Role,
}

const DEMO_ACCOUNTS: [DemoAccount; 3] = [
    DemoAccount {
        email: "demo@user.com",
        name: "Demo User",
        role: Role::User,
    },
    DemoAccount {
        email: "coach@test.com",
        name: "Demo Coach",
        role: Role::Coach,
    },
    DemoAccount {
        email: "admin@test.com",
        name: "Demo Admin",
        role: Role::Admin,
    },
];

#[tokio::main]
async fn main() -> Result<()> {
    let args = SeedArgs::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("seed_demo_data={log_level},fitplan_server={log_level}"))
        .init();

    let database_url = args
        .database_url
        .or_else(|| env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite:./data/fitplan.db".into());

    info!("Connecting to database: {}", database_url);
    let database = Database::new(&database_url)
        .await
        .with_context(|| format!("Failed to open {database_url}"))?;

    let mut created = Vec::new();
    for account in &DEMO_ACCOUNTS {
        if let Some(user) = seed_account(&database, account).await? {
            created.push(user);
        }
    }

    for user in &created {
        match user.role {
            Role::User => seed_user_records(&database, user).await?,
            Role::Coach => seed_coach_report(&database, user).await?,
            Role::Admin => {}
        }
    }

    info!("");
    info!("Demo data seeded: {} new account(s)", created.len());
    for account in &DEMO_ACCOUNTS {
        info!("  {} / {} ({})", account.email, DEMO_PASSWORD, account.role);
    }

    Ok(())
}

/// Create one demo account, or return `None` if the email is taken
async fn seed_account(database: &Database, account: &DemoAccount) -> Result<Option<User>> {
    if database.get_user_by_email(account.email).await?.is_some() {
        warn!("Skipping {}: account already exists", account.email);
        return Ok(None);
    }

    let password_hash = hash_password(DEMO_PASSWORD, DEMO_BCRYPT_COST).await?;
    let user = User::new(
        account.email.to_owned(),
        password_hash,
        Some(account.name.to_owned()),
        account.role,
    );
    database.create_user(&user).await?;

    let user = match account.role {
        Role::Coach => database.set_coach_status(user.id, CoachStatus::Approved).await?,
        Role::User => {
            database.set_points(user.id, DEMO_POINTS).await?;
            User {
                points: DEMO_POINTS,
                ..user
            }
        }
        Role::Admin => user,
    };

    info!("Created {} account {}", account.role, account.email);
    Ok(Some(user))
}

/// Questionnaire, posture review, plan, and checklist for the demo user
async fn seed_user_records(database: &Database, user: &User) -> Result<()> {
    let answers: BTreeMap<String, i64> = [
        ("yang_1", 4),
        ("yang_2", 3),
        ("yang_3", 4),
        ("yin_1", 1),
        ("qi_1", 2),
        ("phlegm_1", 1),
        ("stasis_1", 0),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_owned(), value))
    .collect();
    let submitted = assessment::submit_assessment(database, user.id, answers, None).await?;
    info!("  assessment: {}", submitted.constitution);

    let posture = PostureAnalysis {
        id: Uuid::new_v4(),
        user_id: user.id,
        front_url: "data:image/jpeg;base64,demo-front".into(),
        side_url: "data:image/jpeg;base64,demo-side".into(),
        back_url: "data:image/jpeg;base64,demo-back".into(),
        analysis_md: "## Posture overview\n\n\
                      - Mild forward head posture\n\
                      - Slightly rounded shoulders\n\n\
                      ## Suggestions\n\n\
                      - Chin tucks, 3 sets of 10 daily\n\
                      - Doorway chest stretch, 30 seconds each side"
            .into(),
        created_at: Utc::now(),
    };
    database.create_posture_analysis(&posture).await?;
    info!("  posture analysis: {}", posture.id);

    let now = Utc::now();
    let plan = Plan {
        id: Uuid::new_v4(),
        user_id: user.id,
        assessment_id: Some(submitted.id),
        posture_id: Some(posture.id),
        content: demo_plan_content(),
        created_at: now,
        updated_at: now,
    };
    database.create_plan(&plan).await?;
    info!("  plan: {}", plan.id);

    let todo = todos::create_todo(database, user.id, Some(plan.id), None).await?;
    info!("  checklist: {} ({} items)", todo.todo.title, todo.items.len());

    Ok(())
}

/// A completed report so the coach dashboard has content
async fn seed_coach_report(database: &Database, coach_user: &User) -> Result<()> {
    let report = coach::create_report(
        database,
        coach_user.id,
        coach::NewReport {
            title: Some("Weekly check-in: Demo User".into()),
            description: Some("Four weeks into a beginner strength block".into()),
            student_data: Some(json!({
                "age": 29,
                "sessionsPerWeek": 3,
                "sleepHours": 6.5,
                "notes": "Reports lower back tightness after deadlifts"
            })),
            student_id: None,
        },
    )
    .await?;

    let analysis = ReportAnalysis {
        analysis: "Consistent attendance with steady load progression.".into(),
        risk_analysis: "- Short sleep may slow recovery\n- Lower back tightness suggests hinge form drift".into(),
        recommendations: "- Add a deload week\n- Film deadlift sets for form review".into(),
        knowledge_links: vec![KnowledgeLink {
            title: "Hip hinge fundamentals".into(),
            url: "https://example.com/hip-hinge".into(),
            description: "Cueing a neutral spine under load".into(),
        }],
    };
    database.store_report_analysis(report.id, &analysis).await?;
    info!("  coach report: {}", report.id);

    Ok(())
}

fn demo_plan_content() -> serde_json::Value {
    json!({
        "title": "Warming Week for Yang Deficiency",
        "diet": {
            "monday": {
                "breakfast": "Ginger congee with dates",
                "lunch": "Lamb and carrot stew",
                "dinner": "Steamed fish with scallions"
            },
            "tuesday": {
                "breakfast": "Oats with walnuts",
                "lunch": "Chicken soup with goji",
                "dinner": "Stir-fried leeks with egg"
            }
        },
        "exercise": {
            "monday": ["20 min brisk walk", "Gentle yoga"],
            "tuesday": ["Baduanjin routine", "Foam rolling"]
        }
    })
}
