use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthSession, Credentials, PublicUser},
        jwt::JwtKeys,
        password::PasswordHasher,
        repo::{StoreError, UserStore},
        repo_types::User,
    },
    error::{AuthError, AuthResult},
};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Trims and lowercases the email; rejects absent or empty fields.
fn normalize(creds: Credentials) -> AuthResult<(String, String)> {
    let email = creds
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    let password = creds.password.filter(|p| !p.is_empty());
    match (email, password) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(AuthError::InvalidInput),
    }
}

/// Register/login orchestration over the store, hasher and token issuer.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, keys: JwtKeys) -> Self {
        Self {
            store,
            hasher,
            keys,
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    #[instrument(skip_all)]
    pub async fn register(&self, creds: Credentials) -> AuthResult<AuthSession> {
        let (email, password) = normalize(creds)?;

        if password.chars().count() < MIN_PASSWORD_LEN {
            warn!("password too short");
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }

        let hash = self.hasher.hash_async(password).await?;

        let user = self.store.insert(&email, &hash).await.map_err(|e| match e {
            StoreError::DuplicateEmail => {
                warn!(email = %email, "email already registered");
                AuthError::EmailExists
            }
            other => AuthError::CreateUser(other),
        })?;

        let session = self.session_for(user)?;
        info!(user_id = session.user.id, email = %session.user.email, "user registered");
        Ok(session)
    }

    #[instrument(skip_all)]
    pub async fn login(&self, creds: Credentials) -> AuthResult<AuthSession> {
        let (email, password) = normalize(creds)?;

        let user = match self.store.find_by_email(&email).await? {
            Some(u) => u,
            None => {
                self.hasher.verify_dummy_async(password).await?;
                warn!(email = %email, "login unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let ok = self
            .hasher
            .verify_async(password, user.password_hash.clone())
            .await?;
        if !ok {
            warn!(email = %email, user_id = user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.session_for(user)?;
        info!(user_id = session.user.id, email = %session.user.email, "user logged in");
        Ok(session)
    }

    fn session_for(&self, user: User) -> AuthResult<AuthSession> {
        let token = self.keys.issue(user.id, &user.email)?;
        Ok(AuthSession {
            token,
            user: PublicUser {
                id: user.id,
                email: user.email,
            },
        })
    }
}

#[cfg(test)]
pub(crate) fn test_service(store: Arc<dyn UserStore>) -> AuthService {
    use std::time::Duration;

    use crate::{auth::password::test_hasher, config::JwtConfig};

    let keys = JwtKeys::new(&JwtConfig {
        secret: "test-secret".into(),
        issuer: "test-issuer".into(),
        ttl: Duration::from_secs(300),
    });
    AuthService::new(store, test_hasher(), keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::memory::{BrokenUserStore, MemoryUserStore};

    fn service() -> (AuthService, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::default());
        (test_service(store.clone()), store)
    }

    #[tokio::test]
    async fn register_then_login_succeeds() {
        let (svc, _) = service();
        let registered = svc
            .register(Credentials::new("a@b.com", "secret1"))
            .await
            .expect("register");
        let logged_in = svc
            .login(Credentials::new("a@b.com", "secret1"))
            .await
            .expect("login");
        assert_eq!(registered.user, logged_in.user);
        assert_eq!(registered.user.email, "a@b.com");
    }

    #[tokio::test]
    async fn issued_token_verifies_to_the_same_identity() {
        let (svc, _) = service();
        let session = svc
            .register(Credentials::new("a@b.com", "secret1"))
            .await
            .unwrap();
        let identity = svc.keys().verify(&session.token).unwrap();
        assert_eq!(identity.user_id, session.user.id);
        assert_eq!(identity.email, "a@b.com");
    }

    #[tokio::test]
    async fn stored_hash_is_not_the_plaintext() {
        let (svc, store) = service();
        svc.register(Credentials::new("a@b.com", "secret1"))
            .await
            .unwrap();
        let row = store.find_by_email("a@b.com").await.unwrap().unwrap();
        assert_ne!(row.password_hash, "secret1");
    }

    #[tokio::test]
    async fn duplicate_register_is_email_exists() {
        let (svc, _) = service();
        svc.register(Credentials::new("a@b.com", "secret1"))
            .await
            .unwrap();
        let err = svc
            .register(Credentials::new("a@b.com", "other12"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailExists));
    }

    #[tokio::test]
    async fn email_is_normalized_before_lookup() {
        let (svc, _) = service();
        svc.register(Credentials::new("  A@B.com ", "secret1"))
            .await
            .unwrap();
        let session = svc
            .login(Credentials::new("a@b.COM", "secret1"))
            .await
            .unwrap();
        assert_eq!(session.user.email, "a@b.com");
    }

    #[tokio::test]
    async fn password_length_boundary() {
        let (svc, _) = service();
        let err = svc
            .register(Credentials::new("a@b.com", "12345"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword { min: 6 }));
        svc.register(Credentials::new("a@b.com", "123456"))
            .await
            .expect("six characters is enough");
    }

    #[tokio::test]
    async fn missing_fields_are_invalid_input() {
        let (svc, _) = service();
        for creds in [
            Credentials::default(),
            Credentials::new("", "secret1"),
            Credentials::new("a@b.com", ""),
            Credentials {
                email: Some("a@b.com".into()),
                password: None,
            },
        ] {
            assert!(matches!(
                svc.register(Credentials {
                    email: creds.email.clone(),
                    password: creds.password.clone(),
                })
                .await,
                Err(AuthError::InvalidInput)
            ));
            assert!(matches!(svc.login(creds).await, Err(AuthError::InvalidInput)));
        }
    }

    #[tokio::test]
    async fn any_present_email_is_accepted() {
        let (svc, _) = service();
        let session = svc
            .register(Credentials::new("admin@localhost", "secret1"))
            .await
            .expect("no format check beyond presence");
        assert_eq!(session.user.email, "admin@localhost");
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let (svc, _) = service();
        svc.register(Credentials::new("a@b.com", "secret1"))
            .await
            .unwrap();

        let missing = svc
            .login(Credentials::new("missing@b.com", "anything"))
            .await
            .unwrap_err();
        let wrong = svc
            .login(Credentials::new("a@b.com", "anything"))
            .await
            .unwrap_err();
        assert!(matches!(missing, AuthError::InvalidCredentials));
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert_eq!(missing.public_message(), wrong.public_message());
    }

    #[tokio::test]
    async fn store_failures_surface_as_server_errors() {
        let svc = test_service(Arc::new(BrokenUserStore));
        let err = svc
            .register(Credentials::new("a@b.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::CreateUser(_)));

        let err = svc
            .login(Credentials::new("a@b.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
    }
}
