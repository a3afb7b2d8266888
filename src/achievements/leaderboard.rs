//! Monthly and lifetime leaderboards.
//!
//! Rows are written by an external aggregation job; this side only reads.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};

use super::store::AchievementStore;
use super::types::LeaderboardEntry;
use crate::storage::{Database, DatabaseError, Page, PageRequest};

/// Leaderboard reader.
pub struct LeaderboardService {
    db: Arc<Database>,
}

impl LeaderboardService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Ranking for the month containing `month`, or the current month.
    pub fn monthly(
        &self,
        month: Option<NaiveDate>,
        page: PageRequest,
    ) -> Result<Page<LeaderboardEntry>, DatabaseError> {
        let month = first_of_month(month.unwrap_or_else(|| Utc::now().date_naive()));
        let conn = self.db.connection();
        let (entries, total) = AchievementStore::new(&conn).monthly(month, page)?;
        Ok(Page::new(entries, total, page))
    }

    pub fn lifetime(&self, page: PageRequest) -> Result<Page<LeaderboardEntry>, DatabaseError> {
        let conn = self.db.connection();
        let (entries, total) = AchievementStore::new(&conn).lifetime(page)?;
        Ok(Page::new(entries, total, page))
    }
}

/// Leaderboard months are keyed by their first day.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Parse a `YYYY-MM` or `YYYY-MM-DD` month parameter.
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d"))
        .ok()
        .map(first_of_month)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Account, AccountStore, Profile};
    use rusqlite::params;

    fn seed_user(db: &Database, name: &str) -> uuid::Uuid {
        let account = Account::new(format!("{name}@b.co"), "h".to_string());
        let conn = db.connection();
        let store = AccountStore::new(&conn);
        store.insert_account(&account).unwrap();
        store
            .insert_profile(&Profile::new(account.id, name.to_string()))
            .unwrap();
        account.id
    }

    fn seed_monthly(db: &Database, user: &uuid::Uuid, month: &str, score: i64) {
        db.connection()
            .execute(
                "INSERT INTO monthly_leaderboards (user_id, month, score, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 'x', 'x')",
                params![user.to_string(), month, score],
            )
            .unwrap();
    }

    #[test]
    fn test_parse_month() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1);
        assert_eq!(parse_month("2024-05"), expected);
        assert_eq!(parse_month("2024-05-20"), expected);
        assert_eq!(parse_month("Mei 2024"), None);
    }

    #[test]
    fn test_monthly_ranking() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let a = seed_user(&db, "ali");
        let b = seed_user(&db, "budi");
        seed_monthly(&db, &a, "2024-05-01", 30);
        seed_monthly(&db, &b, "2024-05-01", 80);
        seed_monthly(&db, &a, "2024-04-01", 99);

        let service = LeaderboardService::new(db);
        let page = service
            .monthly(NaiveDate::from_ymd_opt(2024, 5, 17), PageRequest::default())
            .unwrap();

        assert_eq!(page.meta.total, 2);
        assert_eq!(page.data[0].name.as_deref(), Some("budi"));
        assert_eq!(page.data[0].score, 80);
        assert_eq!(page.data[1].user_id, a);
        assert_eq!(page.data[1].month, NaiveDate::from_ymd_opt(2024, 5, 1));
    }

    #[test]
    fn test_lifetime_ranking() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        for (name, score) in [("ali", 5), ("budi", 50), ("cici", 20)] {
            let id = seed_user(&db, name);
            db.connection()
                .execute(
                    "INSERT INTO lifetime_leaderboards (user_id, score, created_at, updated_at)
                     VALUES (?1, ?2, 'x', 'x')",
                    params![id.to_string(), score],
                )
                .unwrap();
        }

        let page = LeaderboardService::new(db)
            .lifetime(PageRequest::new(1, 2))
            .unwrap();
        let names: Vec<_> = page.data.iter().filter_map(|e| e.name.clone()).collect();
        assert_eq!(names, vec!["budi", "cici"]);
        assert_eq!(page.meta.last_page, 2);
        assert!(page.data[0].month.is_none());
    }
}
