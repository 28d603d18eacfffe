use crate::domain::repository::UserRepository;
use crate::domain::user::User;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};

#[derive(Clone)]
pub struct InMemoryUserRepository {
    storage: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    #[instrument(skip(self), fields(user_id = %user.id, email = %user.email))]
    async fn save_user(&self, user: User) -> Result<()> {
        trace!("Acquiring write lock for user storage");
        let mut storage = self.storage.write().await;
        storage.insert(user.id.clone(), user.clone());
        debug!(
            user_id = %user.id,
            email = %user.email,
            "User saved to memory storage"
        );
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user.id, email = %user.email))]
    async fn save_user_if_email_free(&self, user: User) -> Result<bool> {
        trace!("Acquiring write lock for user storage");
        let mut storage = self.storage.write().await;
        // Check and insert share one lock acquisition, so two concurrent
        // saves of the same email cannot both pass.
        let taken = storage
            .values()
            .any(|u| u.email == user.email && u.id != user.id);
        if taken {
            debug!(email = %user.email, "Email already taken");
            return Ok(false);
        }
        storage.insert(user.id.clone(), user.clone());
        debug!(
            user_id = %user.id,
            email = %user.email,
            "User saved to memory storage"
        );
        Ok(true)
    }

    #[instrument(skip(self), fields(email = email))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        trace!("Acquiring read lock for user storage");
        let storage = self.storage.read().await;
        let user = storage.values().find(|u| u.email == email).cloned();
        match &user {
            Some(u) => {
                debug!(user_id = %u.id, email = %u.email, "User found in storage");
            }
            None => {
                trace!(email = email, "User not found in storage");
            }
        }
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = id))]
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        trace!("Acquiring read lock for user storage");
        let storage = self.storage.read().await;
        let user = storage.get(id).cloned();
        match &user {
            Some(u) => {
                debug!(user_id = %u.id, email = %u.email, "User found in storage");
            }
            None => {
                trace!(user_id = id, "User not found in storage");
            }
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            email: email.to_string(),
            password_hash: "hash123".to_string(),
            is_staff: false,
            is_superuser: false,
        }
    }

    #[tokio::test]
    async fn test_save_user_saves_user_correctly() {
        let repo = InMemoryUserRepository::new();
        let user = sample_user("user-1", "test@example.com");

        repo.save_user(user.clone()).await.unwrap();

        let retrieved = repo.find_user_by_id("user-1").await.unwrap().unwrap();
        assert_eq!(retrieved.id, user.id);
        assert_eq!(retrieved.email, user.email);
        assert_eq!(retrieved.password_hash, user.password_hash);
        assert!(!retrieved.is_staff);
        assert!(!retrieved.is_superuser);
    }

    #[tokio::test]
    async fn test_find_user_by_email_finds_user_by_email() {
        let repo = InMemoryUserRepository::new();
        let user = sample_user("user-2", "alice@example.com");

        repo.save_user(user).await.unwrap();
        let found = repo.find_user_by_email("alice@example.com").await.unwrap();

        assert!(found.is_some());
        assert_eq!(found.unwrap().id, "user-2");
    }

    #[tokio::test]
    async fn test_find_user_by_email_returns_none_for_nonexistent_email() {
        let repo = InMemoryUserRepository::new();

        let found = repo
            .find_user_by_email("nonexistent@example.com")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_find_user_by_id_returns_none_for_nonexistent_id() {
        let repo = InMemoryUserRepository::new();

        let found = repo.find_user_by_id("nonexistent-id").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_save_user_overwrites_existing_user() {
        let repo = InMemoryUserRepository::new();

        repo.save_user(sample_user("user-4", "first@example.com"))
            .await
            .unwrap();
        repo.save_user(sample_user("user-4", "second@example.com"))
            .await
            .unwrap();

        let retrieved = repo.find_user_by_id("user-4").await.unwrap().unwrap();
        assert_eq!(retrieved.email, "second@example.com");
    }

    #[tokio::test]
    async fn test_find_user_by_email_exact_match() {
        let repo = InMemoryUserRepository::new();
        repo.save_user(sample_user("user-5", "Test@example.com"))
            .await
            .unwrap();

        // Lookups match the stored (normalized) form exactly.
        let found = repo.find_user_by_email("Test@example.com").await.unwrap();
        assert!(found.is_some());

        let not_found = repo.find_user_by_email("test@example.com").await.unwrap();
        assert!(not_found.is_none());
    }

    #[tokio::test]
    async fn test_save_user_if_email_free_rejects_taken_email() {
        let repo = InMemoryUserRepository::new();

        let saved = repo
            .save_user_if_email_free(sample_user("user-6", "taken@example.com"))
            .await
            .unwrap();
        assert!(saved);

        let saved = repo
            .save_user_if_email_free(sample_user("user-7", "taken@example.com"))
            .await
            .unwrap();
        assert!(!saved);
        assert!(repo.find_user_by_id("user-7").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_user_if_email_free_allows_own_email() {
        let repo = InMemoryUserRepository::new();
        repo.save_user(sample_user("user-8", "own@example.com"))
            .await
            .unwrap();

        // Re-saving the same user with their own email is not a conflict.
        let saved = repo
            .save_user_if_email_free(sample_user("user-8", "own@example.com"))
            .await
            .unwrap();
        assert!(saved);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_saves_never_duplicate_email() {
        let repo = InMemoryUserRepository::new();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let repo = repo.clone();
                let user = sample_user(&format!("user-{}", i), "race@example.com");
                tokio::spawn(async move { repo.save_user_if_email_free(user).await })
            })
            .collect();

        let mut saved = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                saved += 1;
            }
        }
        assert_eq!(saved, 1);
    }

    #[tokio::test]
    async fn test_concurrent_writes() {
        let repo = InMemoryUserRepository::new();

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let repo_clone = repo.clone();
                let user = sample_user(&format!("user-{}", i), &format!("user{}@example.com", i));
                tokio::spawn(async move { repo_clone.save_user(user).await })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        for i in 0..10 {
            let found = repo.find_user_by_id(&format!("user-{}", i)).await.unwrap();
            assert!(found.is_some());
        }
    }
}
