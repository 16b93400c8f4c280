use async_trait::async_trait;
use sqlx::{PgPool, Row};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub description: Option<String>,
}

#[derive(Debug, Error)]
pub enum UserSourceError {
    #[error("user store unavailable: {0}")]
    Unavailable(String),
    #[error("email already exist")]
    DuplicateEmail,
}

/// Durable user lookup/creation consumed by the login and signup handlers.
#[async_trait]
pub trait UserSource: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, UserSourceError>;
    async fn create(&self, user: NewUser) -> Result<UserRecord, UserSourceError>;
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::password_hash::rand_core::OsRng;
    use argon2::password_hash::SaltString;
    use argon2::{Argon2, PasswordHasher};
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub struct PgUserSource {
    pool: PgPool,
}

impl PgUserSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserSource for PgUserSource {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, UserSourceError> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, description FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| UserSourceError::Unavailable(err.to_string()))?;

        Ok(row.map(|row| UserRecord {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            description: row.get("description"),
        }))
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, UserSourceError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, description) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.description)
        .execute(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => UserSourceError::DuplicateEmail,
            _ => UserSourceError::Unavailable(err.to_string()),
        })?;

        Ok(UserRecord {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            description: user.description,
        })
    }
}

/// In-memory source for tests and local development.
#[derive(Default)]
pub struct InMemoryUserSource {
    users: RwLock<Vec<UserRecord>>,
}

impl InMemoryUserSource {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl UserSource for InMemoryUserSource {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, UserSourceError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, UserSourceError> {
        let mut users = self.users.write().await;
        if users.iter().any(|existing| existing.email == user.email) {
            return Err(UserSourceError::DuplicateEmail);
        }

        let record = UserRecord {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            description: user.description,
        };
        users.push(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("secret123").unwrap();
        assert!(verify_password("secret123", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_verify_rejects_bad_hash() {
        assert!(!verify_password("secret123", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_in_memory_duplicate_email() {
        let source = InMemoryUserSource::default();
        let user = NewUser {
            name: "Admin".to_string(),
            email: "admin@myschool.test".to_string(),
            password_hash: hash_password("secret123").unwrap(),
            description: None,
        };

        source.create(user.clone()).await.unwrap();
        let err = source.create(user).await.unwrap_err();
        assert!(matches!(err, UserSourceError::DuplicateEmail));
    }
}
