use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::database::models::{Account, Lead, LeadSource, LeadStatus};
use crate::database::{AccountStore, LeadStore};
use crate::filter::types::Predicate;
use crate::filter::FilterOrder;
use crate::services::error::ServiceError;

pub const DEMO_EMAIL: &str = "test@example.com";
pub const DEMO_PASSWORD: &str = "test123";
const GENERATED_LEADS: usize = 95;
const RESET_BATCH: i64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub account_created: bool,
    pub leads_removed: usize,
    pub leads_created: usize,
}

/// Create the demo account and its sample leads. An existing demo account is
/// left untouched unless `reset` is set, in which case its leads are replaced.
pub async fn seed_demo_data(
    accounts: &dyn AccountStore,
    leads: &dyn LeadStore,
    reset: bool,
) -> Result<SeedReport, ServiceError> {
    let mut report = SeedReport { account_created: false, leads_removed: 0, leads_created: 0 };

    let account = match accounts.find_by_email(DEMO_EMAIL).await? {
        Some(existing) if !reset => {
            info!(account_id = %existing.id, "Demo account already present, skipping seed");
            return Ok(report);
        }
        Some(existing) => existing,
        None => {
            let now = Utc::now();
            report.account_created = true;
            accounts
                .insert(&Account {
                    id: Uuid::new_v4(),
                    email: DEMO_EMAIL.to_string(),
                    password_hash: hash_password(DEMO_PASSWORD),
                    first_name: "Test".to_string(),
                    last_name: "User".to_string(),
                    created_at: now,
                    updated_at: now,
                })
                .await?
        }
    };

    if reset {
        report.leads_removed = clear_leads(leads, account.id).await?;
    }

    for lead in sample_leads(account.id) {
        leads.insert(&lead).await?;
        report.leads_created += 1;
    }

    info!(
        account_id = %account.id,
        created = report.leads_created,
        removed = report.leads_removed,
        "Seeded demo data"
    );
    Ok(report)
}

async fn clear_leads(leads: &dyn LeadStore, owner: Uuid) -> Result<usize, ServiceError> {
    let predicate = Predicate::owned_by(owner);
    let order = FilterOrder::default_order();
    let mut removed = 0;
    loop {
        let batch = leads.find(&predicate, &order, 0, RESET_BATCH).await?;
        if batch.is_empty() {
            return Ok(removed);
        }
        for lead in batch {
            if leads.delete_by_id(owner, lead.id).await? {
                removed += 1;
            }
        }
    }
}

struct Fixed {
    first: &'static str,
    last: &'static str,
    email: &'static str,
    phone: &'static str,
    company: &'static str,
    city: &'static str,
    state: &'static str,
    source: LeadSource,
    status: LeadStatus,
    score: i32,
    value: f64,
    activity: (u32, u32, u32),
    qualified: bool,
}

const FIXED: [Fixed; 5] = [
    Fixed { first: "John", last: "Doe", email: "john.doe@company1.com", phone: "+1-555-0101", company: "Tech Corp", city: "San Francisco", state: "CA", source: LeadSource::Website, status: LeadStatus::New, score: 85, value: 5000.0, activity: (15, 10, 30), qualified: true },
    Fixed { first: "Jane", last: "Smith", email: "jane.smith@company2.com", phone: "+1-555-0102", company: "Marketing Inc", city: "New York", state: "NY", source: LeadSource::FacebookAds, status: LeadStatus::Contacted, score: 72, value: 3200.0, activity: (14, 14, 20), qualified: false },
    Fixed { first: "Mike", last: "Johnson", email: "mike.johnson@company3.com", phone: "+1-555-0103", company: "Finance LLC", city: "Chicago", state: "IL", source: LeadSource::GoogleAds, status: LeadStatus::Qualified, score: 95, value: 8500.0, activity: (16, 9, 15), qualified: true },
    Fixed { first: "Sarah", last: "Wilson", email: "sarah.wilson@company4.com", phone: "+1-555-0104", company: "Healthcare Systems", city: "Boston", state: "MA", source: LeadSource::Referral, status: LeadStatus::Won, score: 88, value: 12000.0, activity: (13, 16, 45), qualified: true },
    Fixed { first: "David", last: "Brown", email: "david.brown@company5.com", phone: "+1-555-0105", company: "Retail Solutions", city: "Austin", state: "TX", source: LeadSource::Events, status: LeadStatus::Lost, score: 45, value: 2000.0, activity: (12, 11, 30), qualified: false },
];

const CITIES: [(&str, &str); 10] = [
    ("San Francisco", "CA"),
    ("New York", "NY"),
    ("Chicago", "IL"),
    ("Boston", "MA"),
    ("Austin", "TX"),
    ("Seattle", "WA"),
    ("Denver", "CO"),
    ("Miami", "FL"),
    ("Los Angeles", "CA"),
    ("Phoenix", "AZ"),
];

const COMPANIES: [&str; 10] = [
    "Tech Corp",
    "Marketing Inc",
    "Finance LLC",
    "Healthcare Systems",
    "Retail Solutions",
    "Education Group",
    "Manufacturing Co",
    "Consulting Firm",
    "StartupXYZ",
    "Enterprise Ltd",
];

pub fn sample_leads(owner: Uuid) -> Vec<Lead> {
    let now = Utc::now();
    let mut rng = rand::thread_rng();
    let mut out = Vec::with_capacity(FIXED.len() + GENERATED_LEADS);

    for (i, f) in FIXED.iter().enumerate() {
        let (day, hour, minute) = f.activity;
        let activity: Option<DateTime<Utc>> = Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).single();
        let created = now - Duration::minutes(i as i64);
        out.push(Lead {
            id: Uuid::new_v4(),
            owner_id: owner,
            first_name: f.first.to_string(),
            last_name: f.last.to_string(),
            email: f.email.to_string(),
            phone: Some(f.phone.to_string()),
            company: Some(f.company.to_string()),
            city: Some(f.city.to_string()),
            state: Some(f.state.to_string()),
            source: f.source,
            status: f.status,
            score: f.score,
            lead_value: f.value,
            last_activity_at: activity,
            is_qualified: f.qualified,
            created_at: created,
            updated_at: created,
        });
    }

    for i in FIXED.len() + 1..=FIXED.len() + GENERATED_LEADS {
        let (city, state) = CITIES.choose(&mut rng).copied().unwrap_or(CITIES[0]);
        let created = now - Duration::days(rng.gen_range(0..30)) - Duration::minutes(i as i64);
        let activity = now - Duration::days(rng.gen_range(0..30));
        out.push(Lead {
            id: Uuid::new_v4(),
            owner_id: owner,
            first_name: format!("Lead{}", i),
            last_name: format!("LastName{}", i),
            email: format!("lead{}@company{}.com", i, i),
            phone: Some(format!("+1-555-{:04}", i)),
            company: COMPANIES.choose(&mut rng).map(|c| c.to_string()),
            city: Some(city.to_string()),
            state: Some(state.to_string()),
            source: LeadSource::ALL.choose(&mut rng).copied().unwrap_or(LeadSource::Other),
            status: LeadStatus::ALL.choose(&mut rng).copied().unwrap_or_default(),
            score: rng.gen_range(0..=100),
            lead_value: f64::from(rng.gen_range(500..15500_i32)),
            last_activity_at: Some(activity),
            is_qualified: rng.gen_bool(0.5),
            created_at: created,
            updated_at: created,
        });
    }
    out
}
