use std::sync::Arc;

use tracing::{info, instrument, warn};

use configs::RosterConfig;

use crate::errors::{ServiceError, INSUFFICIENT_PERMISSIONS_TITLE};
use crate::record::{Fields, Record};
use crate::session::Session;
use crate::store::{DocumentStore, ListQuery};
use crate::user::{self, USER_DOCTYPE};

use super::domain::{
    missing_profile_message, missing_role_message, profile_fields, OnboardOutcome, RosterEntry, ROSTER_FIELDS,
};

/// Roster listing and onboarding on top of an injected document store.
pub struct RosterService<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    cfg: RosterConfig,
}

impl<S: DocumentStore + ?Sized> RosterService<S> {
    pub fn new(store: Arc<S>, cfg: RosterConfig) -> Self { Self { store, cfg } }

    /// All roster entries ordered by full name.
    ///
    /// The caller needs the designated role and a roster profile of their own;
    /// the role is checked before the roster doctype is touched.
    #[instrument(skip(self, session), fields(user = %session.user))]
    pub async fn list_users(&self, session: &Session) -> Result<Vec<RosterEntry>, ServiceError> {
        let role = &self.cfg.designated_role;
        if !session.has_role(role) {
            return Err(ServiceError::permission(INSUFFICIENT_PERMISSIONS_TITLE, missing_role_message(role)));
        }

        let own_profile = vec![("user".to_string(), session.user.clone().into())];
        if !self.store.exists(session, &self.cfg.profile_doctype, &own_profile).await? {
            return Err(ServiceError::permission(INSUFFICIENT_PERMISSIONS_TITLE, missing_profile_message(role)));
        }

        let query = ListQuery::new(self.cfg.profile_doctype.clone()).fields(ROSTER_FIELDS).order_by("full_name");
        let rows = self.store.list(session, &query).await?;
        Ok(rows.iter().map(RosterEntry::from).collect())
    }

    /// Grant the designated role to each user in turn.
    ///
    /// Users governed by a role profile are reported as failed and left untouched.
    /// A caller who may not read and write `User` gets a permission error before
    /// any user is touched. Load or save problems for one user land in
    /// `failed_users`; a permission error from the store still ends the batch.
    #[instrument(skip(self, session, users), fields(user = %session.user, count = users.len()))]
    pub async fn onboard_users(&self, session: &Session, users: Vec<String>) -> Result<OnboardOutcome, ServiceError> {
        let role = self.cfg.designated_role.as_str();
        let registry = self.store.registry();
        registry.check_read(session, USER_DOCTYPE)?;
        registry.check_write(session, USER_DOCTYPE)?;

        let mut out = OnboardOutcome::default();
        for id in users {
            let mut doc = match self.store.get(session, USER_DOCTYPE, &id).await {
                Ok(doc) => doc,
                Err(e @ ServiceError::Permission { .. }) => return Err(e),
                Err(e) => {
                    warn!(target_user = %id, error = %e, "user could not be loaded");
                    out.failed_users.push(Record::new(USER_DOCTYPE, id, Fields::new()));
                    continue;
                }
            };

            if user::has_role_profile(&doc) {
                warn!(target_user = %doc.name, "user has a role profile; role not granted");
                out.failed_users.push(doc);
                continue;
            }

            let original = doc.clone();
            user::add_role(&mut doc, role);
            match self.store.save(session, doc).await {
                Ok(saved) => {
                    self.sync_profile(session, &saved).await;
                    info!(target_user = %saved.name, %role, "role granted");
                    out.success_users.push(saved);
                }
                Err(e @ ServiceError::Permission { .. }) => return Err(e),
                Err(e) => {
                    warn!(target_user = %original.name, error = %e, "user could not be saved");
                    out.failed_users.push(original);
                }
            }
        }

        info!(success = out.success_users.len(), failed = out.failed_users.len(), "onboarding finished");
        Ok(out)
    }

    /// Create the roster profile for a newly onboarded user when missing.
    async fn sync_profile(&self, session: &Session, user: &Record) {
        let doctype = &self.cfg.profile_doctype;
        let filters = vec![("user".to_string(), user.name.clone().into())];
        let res = match self.store.exists(session, doctype, &filters).await {
            Ok(true) => return,
            Ok(false) => self.store.insert(session, doctype, profile_fields(user)).await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = res {
            warn!(target_user = %user.name, error = %e, "roster profile not created");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::file::JsonDocumentStore;
    use crate::store::{DocTypeRegistry, Filters};
    use crate::test_support::{memory_store, seed};
    use async_trait::async_trait;
    use serde_json::json;

    /// Delegates to an in-memory store but fails saves of the listed users.
    struct BrokenSaves {
        inner: JsonDocumentStore,
        broken: Vec<String>,
    }

    #[async_trait]
    impl DocumentStore for BrokenSaves {
        fn registry(&self) -> &DocTypeRegistry { self.inner.registry() }

        async fn get(&self, session: &Session, doctype: &str, name: &str) -> Result<Record, ServiceError> {
            self.inner.get(session, doctype, name).await
        }

        async fn find(&self, session: &Session, doctype: &str, filters: &Filters) -> Result<Option<Record>, ServiceError> {
            self.inner.find(session, doctype, filters).await
        }

        async fn list(&self, session: &Session, query: &ListQuery) -> Result<Vec<Record>, ServiceError> {
            self.inner.list(session, query).await
        }

        async fn insert(&self, session: &Session, doctype: &str, fields: Fields) -> Result<Record, ServiceError> {
            self.inner.insert(session, doctype, fields).await
        }

        async fn save(&self, session: &Session, record: Record) -> Result<Record, ServiceError> {
            if self.broken.contains(&record.name) {
                return Err(ServiceError::Db("connection reset".into()));
            }
            self.inner.save(session, record).await
        }

        async fn delete(&self, session: &Session, doctype: &str, name: &str) -> Result<(), ServiceError> {
            self.inner.delete(session, doctype, name).await
        }
    }

    const ROLE: &str = "Roster User";

    fn service(store: &Arc<JsonDocumentStore>) -> RosterService<JsonDocumentStore> {
        RosterService::new(Arc::clone(store), RosterConfig::default())
    }

    async fn seeded() -> Arc<JsonDocumentStore> {
        let store = memory_store();
        seed(&store, "User", json!({"name": "a@example.com", "full_name": "Ann", "role_profile_name": "Sales", "roles": []})).await;
        seed(&store, "User", json!({"name": "b@example.com", "full_name": "Bob", "first_name": "Bob", "roles": [{"role": "Employee"}]})).await;
        seed(&store, "User", json!({"name": "c@example.com", "full_name": "Cid", "role_profiles": [{"role_profile": "Ops"}]})).await;
        Arc::new(store)
    }

    #[tokio::test]
    async fn onboarding_splits_by_role_profile() -> Result<(), anyhow::Error> {
        let store = seeded().await;
        let svc = service(&store);
        let admin = Session::system();

        let out = svc.onboard_users(&admin, vec!["a@example.com".into(), "b@example.com".into()]).await?;
        assert_eq!(out.success_users.len(), 1);
        assert_eq!(out.failed_users.len(), 1);

        let b = &out.success_users[0];
        assert_eq!(b.name, "b@example.com");
        assert!(user::has_role(b, ROLE));
        assert!(user::has_role(b, "Employee"));

        let a = &out.failed_users[0];
        assert_eq!(a.name, "a@example.com");
        assert!(!user::has_role(a, ROLE));
        let a_stored = store.get(&admin, "User", "a@example.com").await?;
        assert_eq!(a_stored.get("roles"), Some(&json!([])));

        let b_stored = store.get(&admin, "User", "b@example.com").await?;
        assert!(user::has_role(&b_stored, ROLE));
        Ok(())
    }

    #[tokio::test]
    async fn role_profiles_list_also_disqualifies() -> Result<(), anyhow::Error> {
        let store = seeded().await;
        let out = service(&store).onboard_users(&Session::system(), vec!["c@example.com".into()]).await?;
        assert!(out.success_users.is_empty());
        assert_eq!(out.failed_users[0].name, "c@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_user_is_reported_not_fatal() -> Result<(), anyhow::Error> {
        let store = seeded().await;
        let out = service(&store)
            .onboard_users(&Session::system(), vec!["ghost@example.com".into(), "b@example.com".into()])
            .await?;
        assert_eq!(out.failed_users.len(), 1);
        assert_eq!(out.failed_users[0].name, "ghost@example.com");
        assert_eq!(out.success_users[0].name, "b@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn onboarding_creates_roster_profile() -> Result<(), anyhow::Error> {
        let store = seeded().await;
        let admin = Session::system();
        service(&store).onboard_users(&admin, vec!["b@example.com".into()]).await?;
        let profile = store.get(&admin, ROLE, "b@example.com").await?;
        assert_eq!(profile.get_str("user"), Some("b@example.com"));
        assert_eq!(profile.get_str("full_name"), Some("Bob"));
        Ok(())
    }

    #[tokio::test]
    async fn onboarding_twice_does_not_duplicate_role() -> Result<(), anyhow::Error> {
        let store = seeded().await;
        let admin = Session::system();
        let svc = service(&store);
        svc.onboard_users(&admin, vec!["b@example.com".into()]).await?;
        let out = svc.onboard_users(&admin, vec!["b@example.com".into()]).await?;
        let roles = user::roles(&out.success_users[0]);
        assert_eq!(roles.iter().filter(|r| r.as_str() == ROLE).count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn onboarding_without_user_access_is_permission_error() {
        let store = seeded().await;
        let err = service(&store)
            .onboard_users(&Session::new("eve@example.com", ["Employee"]), vec!["b@example.com".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Permission { .. }), "unexpected {err:?}");

        let b = store.get(&Session::system(), "User", "b@example.com").await.unwrap();
        assert!(!user::has_role(&b, ROLE));
    }

    #[tokio::test]
    async fn save_failure_reports_user_unchanged_and_continues() -> Result<(), anyhow::Error> {
        let inner = memory_store();
        seed(&inner, "User", json!({"name": "b@example.com", "full_name": "Bob", "roles": [{"role": "Employee"}]})).await;
        seed(&inner, "User", json!({"name": "d@example.com", "full_name": "Dee"})).await;
        let store = Arc::new(BrokenSaves { inner, broken: vec!["b@example.com".into()] });
        let svc = RosterService::new(Arc::clone(&store), RosterConfig::default());
        let admin = Session::system();

        let out = svc.onboard_users(&admin, vec!["b@example.com".into(), "d@example.com".into()]).await?;
        assert_eq!(out.failed_users.len(), 1);
        let b = &out.failed_users[0];
        assert_eq!(b.name, "b@example.com");
        assert!(!user::has_role(b, ROLE));
        assert_eq!(b.get("roles"), Some(&json!([{"role": "Employee"}])));
        assert_eq!(out.success_users[0].name, "d@example.com");

        let stored = store.get(&admin, "User", "b@example.com").await?;
        assert!(!user::has_role(&stored, ROLE));
        Ok(())
    }

    #[tokio::test]
    async fn list_requires_designated_role_before_touching_roster() {
        // No roster doctype registered at all: reaching the store would be a validation error.
        let store = Arc::new(JsonDocumentStore::in_memory(crate::store::DocTypeRegistry::default()));
        let svc = RosterService::new(store, RosterConfig::default());
        let err = svc.list_users(&Session::new("x@example.com", ["Employee"])).await.unwrap_err();
        match err {
            ServiceError::Permission { title, message } => {
                assert_eq!(title, INSUFFICIENT_PERMISSIONS_TITLE);
                assert!(message.contains("role"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_requires_own_profile() {
        let store = seeded().await;
        let err = service(&store).list_users(&Session::new("b@example.com", [ROLE])).await.unwrap_err();
        match err {
            ServiceError::Permission { message, .. } => assert!(message.contains("profile")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_returns_entries_sorted_by_full_name() -> Result<(), anyhow::Error> {
        let store = seeded().await;
        for (name, full) in [("z@example.com", "Zed"), ("b@example.com", "Bob"), ("m@example.com", "mia")] {
            seed(&store, ROLE, json!({"name": name, "user": name, "full_name": full, "enabled": 1, "bio": "x"})).await;
        }
        let rows = service(&store).list_users(&Session::new("b@example.com", [ROLE])).await?;
        let names: Vec<_> = rows.iter().map(|r| r.full_name.clone().unwrap_or_default()).collect();
        assert_eq!(names, vec!["Bob", "mia", "Zed"]);
        assert!(rows.iter().all(|r| r.enabled));
        Ok(())
    }
}
