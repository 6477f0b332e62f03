// ==========================================
// HRM8 销售引擎 - 订阅数据仓储 (只读锚点)
// ==========================================

use crate::domain::{Subscription, SubscriptionStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_utils::{format_date, get_date, get_enum};
use crate::repository::stores::SubscriptionStore;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct SubscriptionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SubscriptionRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl SubscriptionStore for SubscriptionRepository {
    fn find_by_id(&self, subscription_id: &str) -> RepositoryResult<Option<Subscription>> {
        let conn = self.get_conn()?;
        let subscription = conn
            .query_row(
                "SELECT subscription_id, company_id, start_date, status \
                 FROM subscription WHERE subscription_id = ?1",
                params![subscription_id],
                |row| {
                    Ok(Subscription {
                        id: row.get(0)?,
                        company_id: row.get(1)?,
                        start_date: get_date(row, 2)?,
                        status: get_enum(row, 3, SubscriptionStatus::from_db_str)?,
                    })
                },
            )
            .optional()?;
        Ok(subscription)
    }

    fn insert(&self, subscription: &Subscription) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO subscription (subscription_id, company_id, start_date, status) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                subscription.id,
                subscription.company_id,
                format_date(&subscription.start_date),
                subscription.status.to_db_str(),
            ],
        )?;
        Ok(())
    }
}
