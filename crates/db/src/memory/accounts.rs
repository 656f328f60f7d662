use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use episodic_core::permissions::{Permissions, EPISODES_READ, EPISODES_WRITE};
use episodic_core::tokens::Scope;
use episodic_core::types::{DbId, Timestamp};
use parking_lot::RwLock;

use crate::accounts::{PermissionStore, TokenStore, UserStore};
use crate::error::{DbError, DbResult};
use crate::models::token::Token;
use crate::models::user::{NewUser, User};

/// Codes seeded into the `permissions` table by the migrations.
const KNOWN_PERMISSIONS: &[&str] = &[EPISODES_READ, EPISODES_WRITE];

struct UserTable {
    next_id: DbId,
    rows: BTreeMap<DbId, User>,
}

pub struct MemoryUserStore {
    table: RwLock<UserTable>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(UserTable {
                next_id: 1,
                rows: BTreeMap::new(),
            }),
        }
    }

    fn by_id(&self, id: DbId) -> Option<User> {
        self.table.read().rows.get(&id).cloned()
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, input: &NewUser) -> DbResult<User> {
        let mut table = self.table.write();
        if table.rows.values().any(|u| u.email == input.email) {
            return Err(DbError::DuplicateEmail);
        }

        let id = table.next_id;
        table.next_id += 1;
        let user = User {
            id,
            created_at: Utc::now(),
            name: input.name.clone(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            activated: false,
            version: 1,
        };
        table.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        Ok(self
            .table
            .read()
            .rows
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_if_version(&self, user: &User) -> DbResult<Option<i32>> {
        let mut table = self.table.write();
        if table
            .rows
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(DbError::DuplicateEmail);
        }

        match table.rows.get_mut(&user.id) {
            Some(current) if current.version == user.version => {
                let next_version = user.version + 1;
                *current = User {
                    version: next_version,
                    ..user.clone()
                };
                Ok(Some(next_version))
            }
            _ => Ok(None),
        }
    }

    async fn delete_by_id(&self, id: DbId) -> DbResult<bool> {
        Ok(self.table.write().rows.remove(&id).is_some())
    }
}

/// Token table keyed by hash, resolving owners through a shared user store.
pub struct MemoryTokenStore {
    users: Arc<MemoryUserStore>,
    tokens: RwLock<HashMap<String, Token>>,
}

impl MemoryTokenStore {
    pub fn new(users: Arc<MemoryUserStore>) -> Self {
        Self {
            users,
            tokens: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn insert(&self, token: &Token) -> DbResult<()> {
        self.tokens.write().insert(token.hash.clone(), token.clone());
        Ok(())
    }

    async fn find_user(&self, hash: &str, scope: Scope, now: Timestamp) -> DbResult<Option<User>> {
        let owner = self
            .tokens
            .read()
            .get(hash)
            .filter(|t| t.scope == scope && t.expiry > now)
            .map(|t| t.user_id);
        Ok(owner.and_then(|id| self.users.by_id(id)))
    }

    async fn delete_all_for_user(&self, user_id: DbId, scope: Scope) -> DbResult<()> {
        self.tokens
            .write()
            .retain(|_, t| !(t.user_id == user_id && t.scope == scope));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPermissionStore {
    grants: RwLock<HashMap<DbId, BTreeSet<String>>>,
}

impl MemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionStore for MemoryPermissionStore {
    async fn get_all_for_user(&self, user_id: DbId) -> DbResult<Permissions> {
        let codes: Vec<String> = self
            .grants
            .read()
            .get(&user_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        Ok(Permissions::from(codes))
    }

    async fn add_for_user(&self, user_id: DbId, codes: &[&str]) -> DbResult<()> {
        let mut grants = self.grants.write();
        let entry = grants.entry(user_id).or_default();
        for code in codes.iter().filter(|c| KNOWN_PERMISSIONS.contains(*c)) {
            entry.insert((*code).to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Alice".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let users = MemoryUserStore::new();
        users.insert(&new_user("a@example.com")).await.unwrap();
        assert_matches!(
            users.insert(&new_user("a@example.com")).await,
            Err(DbError::DuplicateEmail)
        );
    }

    #[tokio::test]
    async fn test_token_lookup_honours_scope_and_expiry() {
        let users = Arc::new(MemoryUserStore::new());
        let user = users.insert(&new_user("a@example.com")).await.unwrap();
        let tokens = MemoryTokenStore::new(users.clone());

        let token = tokens
            .new_token(user.id, chrono::Duration::hours(1), Scope::Authentication)
            .await
            .unwrap();

        let found = tokens.get_user(&token.hash, Scope::Authentication).await.unwrap();
        assert_eq!(found.id, user.id);

        assert_matches!(
            tokens.get_user(&token.hash, Scope::Activation).await,
            Err(DbError::NotFound)
        );

        let later = Utc::now() + chrono::Duration::hours(2);
        let expired = tokens
            .find_user(&token.hash, Scope::Authentication, later)
            .await
            .unwrap();
        assert!(expired.is_none());
    }

    #[tokio::test]
    async fn test_plaintext_is_not_a_lookup_key() {
        let users = Arc::new(MemoryUserStore::new());
        let user = users.insert(&new_user("a@example.com")).await.unwrap();
        let tokens = MemoryTokenStore::new(users);

        let token = tokens
            .new_token(user.id, chrono::Duration::hours(1), Scope::Authentication)
            .await
            .unwrap();

        assert_matches!(
            tokens.get_user(&token.plaintext, Scope::Authentication).await,
            Err(DbError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_delete_all_for_user_only_touches_one_scope() {
        let users = Arc::new(MemoryUserStore::new());
        let user = users.insert(&new_user("a@example.com")).await.unwrap();
        let tokens = MemoryTokenStore::new(users);
        let ttl = chrono::Duration::hours(1);

        let auth_a = tokens.new_token(user.id, ttl, Scope::Authentication).await.unwrap();
        let auth_b = tokens.new_token(user.id, ttl, Scope::Authentication).await.unwrap();
        let activation = tokens.new_token(user.id, ttl, Scope::Activation).await.unwrap();

        tokens
            .delete_all_for_user(user.id, Scope::Authentication)
            .await
            .unwrap();

        assert_eq!(tokens.len(), 1);
        assert!(tokens.get_user(&auth_a.hash, Scope::Authentication).await.is_err());
        assert!(tokens.get_user(&auth_b.hash, Scope::Authentication).await.is_err());
        assert!(tokens.get_user(&activation.hash, Scope::Activation).await.is_ok());
    }

    #[tokio::test]
    async fn test_user_update_is_version_checked() {
        let users = MemoryUserStore::new();
        let created = users.insert(&new_user("a@example.com")).await.unwrap();

        let mut activated = created.clone();
        activated.activated = true;
        users.update(&mut activated).await.unwrap();
        assert_eq!(activated.version, 2);

        let mut stale = created;
        stale.name = "Mallory".to_string();
        assert_matches!(users.update(&mut stale).await, Err(DbError::EditConflict));
    }

    #[tokio::test]
    async fn test_permissions_ignore_unknown_codes() {
        let perms = MemoryPermissionStore::new();
        perms
            .add_for_user(1, &[EPISODES_READ, "movies:delete"])
            .await
            .unwrap();

        let granted = perms.get_all_for_user(1).await.unwrap();
        assert_eq!(granted.codes(), [EPISODES_READ.to_string()]);
        assert!(perms.has_permission(1, EPISODES_READ).await.unwrap());
        assert!(!perms.has_permission(1, EPISODES_WRITE).await.unwrap());
        assert!(!perms.has_permission(2, EPISODES_READ).await.unwrap());
    }

    #[tokio::test]
    async fn test_user_without_grants_has_no_permissions() {
        let perms = MemoryPermissionStore::new();
        let granted = perms.get_all_for_user(42).await.unwrap();
        assert!(granted.codes().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_user_frees_email_and_tokens() {
        let users = Arc::new(MemoryUserStore::new());
        let user = users.insert(&new_user("a@example.com")).await.unwrap();
        let tokens = MemoryTokenStore::new(users.clone());
        let token = tokens
            .new_token(user.id, chrono::Duration::hours(1), Scope::Activation)
            .await
            .unwrap();

        assert!(users.delete_by_id(user.id).await.unwrap());
        assert!(!users.delete_by_id(user.id).await.unwrap());

        assert_matches!(
            tokens.get_user(&token.hash, Scope::Activation).await,
            Err(DbError::NotFound)
        );
        users.insert(&new_user("a@example.com")).await.unwrap();
    }
}
