//! Writers for the tables owned by other subsystems.
//!
//! Users, orders and payments are produced by the auth, ordering and payment
//! subsystems. These helpers let a standalone deployment and the test-suite
//! populate them; the analytics core itself never calls them.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::backend::ts;
use crate::DuckDbBackend;

#[derive(Debug, Clone)]
pub struct SeedUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SeedUser {
    pub fn new(id: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            name: Some(format!("User {id}")),
            phone: None,
            role: "user".to_string(),
            email_verified_at: None,
            created_at,
        }
    }
}

impl DuckDbBackend {
    pub async fn seed_user(&self, user: &SeedUser) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO users (id, email, name, phone, role, email_verified_at, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
               ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email, name = EXCLUDED.name"#,
            duckdb::params![
                user.id,
                user.email,
                user.name,
                user.phone,
                user.role,
                user.email_verified_at.as_ref().map(ts),
                ts(&user.created_at),
            ],
        )?;
        Ok(())
    }

    pub async fn seed_express_report_order(
        &self,
        id: &str,
        user_id: Option<&str>,
        status: &str,
        price: f64,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO express_report_orders (id, user_id, express_check_id, status, price, created_at)
             VALUES (?1, ?2, NULL, ?3, ?4, ?5)",
            duckdb::params![id, user_id, status, price, ts(&created_at)],
        )?;
        Ok(())
    }

    pub async fn seed_full_audit_order(
        &self,
        id: &str,
        user_id: Option<&str>,
        status: &str,
        price: f64,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO full_audit_orders (id, user_id, status, price, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            duckdb::params![id, user_id, status, price, ts(&created_at)],
        )?;
        Ok(())
    }

    pub async fn seed_payment(
        &self,
        id: &str,
        order_id: Option<&str>,
        status: &str,
        amount: f64,
        created_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO payments (id, user_id, order_id, status, amount, created_at)
             VALUES (?1, NULL, ?2, ?3, ?4, ?5)",
            duckdb::params![id, order_id, status, amount, ts(&created_at)],
        )?;
        Ok(())
    }
}
