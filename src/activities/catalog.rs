//! Public activity catalog.

use std::sync::Arc;

use super::store::{ActivityFilter, ActivityStore};
use super::types::Activity;
use crate::registration::RegistrationError;
use crate::storage::{Database, Page, PageRequest};

/// Read-only view over published activities.
pub struct ActivityCatalog {
    db: Arc<Database>,
}

impl ActivityCatalog {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn list(&self, filter: &ActivityFilter, page: PageRequest) -> Result<Page<Activity>, RegistrationError> {
        let conn = self.db.connection();
        let (activities, total) = ActivityStore::new(&conn).list_published(filter, page)?;
        Ok(Page::new(activities, total, page))
    }

    pub fn categories(&self) -> Result<Vec<i32>, RegistrationError> {
        let conn = self.db.connection();
        Ok(ActivityStore::new(&conn).categories()?)
    }

    /// A published activity by slug.
    pub fn show(&self, slug: &str) -> Result<Activity, RegistrationError> {
        let conn = self.db.connection();
        ActivityStore::new(&conn)
            .find_by_slug(slug)?
            .filter(|activity| activity.is_published)
            .ok_or(RegistrationError::ActivityNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_hides_unpublished() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        {
            let conn = db.connection();
            let store = ActivityStore::new(&conn);
            store.insert_activity(&Activity::new("Open", "open")).unwrap();
            let mut draft = Activity::new("Draft", "draft");
            draft.is_published = false;
            store.insert_activity(&draft).unwrap();
        }

        let catalog = ActivityCatalog::new(db);
        assert_eq!(catalog.show("open").unwrap().name, "Open");
        assert!(matches!(
            catalog.show("draft"),
            Err(RegistrationError::ActivityNotFound)
        ));
        assert!(matches!(
            catalog.show("missing"),
            Err(RegistrationError::ActivityNotFound)
        ));

        let page = catalog.list(&ActivityFilter::default(), PageRequest::default()).unwrap();
        assert_eq!(page.meta.total, 1);
        assert_eq!(catalog.categories().unwrap(), vec![0]);
    }
}
