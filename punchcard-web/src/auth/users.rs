//! User management and authentication

use super::jwt::{AuthError, JwtService, TokenPair, TokenType};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use punchcard_applications::{ApplicationResult, UserDirectory, UserIdentity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// User creation request (admin only)
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// User login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserInfo,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Public user information
#[derive(Debug, Serialize, Clone, ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub is_admin: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Internal user data with password hash
#[derive(Debug, Clone)]
pub struct UserData {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl UserData {
    /// Create new user with hashed password
    pub fn new(
        username: String,
        full_name: String,
        password: &str,
        is_admin: bool,
    ) -> Result<Self, AuthError> {
        let password_hash = hash_password(password)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            username,
            full_name,
            password_hash,
            is_admin,
            is_active: true,
            created_at: chrono::Utc::now(),
        })
    }

    /// Verify password
    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash).unwrap_or(false)
    }

    /// Convert to public user info
    pub fn to_user_info(&self) -> UserInfo {
        UserInfo {
            id: self.id.clone(),
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            is_admin: self.is_admin,
            created_at: self.created_at,
        }
    }

    /// Convert to the identity shape the application layer consumes
    pub fn to_identity(&self) -> UserIdentity {
        UserIdentity {
            user_id: self.id.clone(),
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            is_admin: self.is_admin,
        }
    }
}

/// In-memory user store keyed by username
#[derive(Debug, Clone)]
pub struct UserStore {
    users: Arc<RwLock<HashMap<String, UserData>>>,
}

impl Default for UserStore {
    fn default() -> Self {
        Self::memory()
    }
}

impl UserStore {
    /// Create in-memory user store with a default admin account
    pub fn memory() -> Self {
        let store = Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        };

        // Create default admin user
        if let Err(e) = store.create_default_admin() {
            warn!("Failed to create default admin user: {}", e);
        }

        store
    }

    fn create_default_admin(&self) -> Result<(), AuthError> {
        let admin_user = UserData::new(
            "admin".to_string(),
            "Administrator".to_string(),
            "admin123", // Default password - should be changed in production
            true,
        )?;

        info!("Creating default admin user: {}", admin_user.username);

        let mut users = self.users.write().unwrap();
        users.insert(admin_user.username.clone(), admin_user);

        Ok(())
    }

    /// Whether a username is already taken
    pub fn username_exists(&self, username: &str) -> bool {
        let users = self.users.read().unwrap();
        users.contains_key(username)
    }

    /// Insert a new user
    pub fn create_user(&self, user_data: UserData) -> Result<UserData, AuthError> {
        let mut users = self.users.write().unwrap();

        if users.contains_key(&user_data.username) {
            debug!("Username '{}' already exists", user_data.username);
            return Err(AuthError::InvalidCredentials);
        }

        users.insert(user_data.username.clone(), user_data.clone());
        info!("Created user: {}", user_data.username);
        Ok(user_data)
    }

    /// Authenticate user
    pub fn authenticate_user(&self, request: LoginRequest) -> Result<UserData, AuthError> {
        let users = self.users.read().unwrap();

        let user = users
            .get(&request.username)
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.verify_password(&request.password) {
            warn!("Invalid password for user: {}", request.username);
            return Err(AuthError::InvalidCredentials);
        }

        debug!("User authenticated: {}", request.username);
        Ok(user.clone())
    }

    /// Get user by ID
    pub fn get_user_by_id(&self, user_id: &str) -> Option<UserData> {
        let users = self.users.read().unwrap();
        users.values().find(|u| u.id == user_id).cloned()
    }

    /// Get user by username
    pub fn get_user_by_username(&self, username: &str) -> Option<UserData> {
        let users = self.users.read().unwrap();
        users.get(username).cloned()
    }

    /// Remove a user by ID, returning the removed record
    pub fn remove_by_id(&self, user_id: &str) -> Option<UserData> {
        let mut users = self.users.write().unwrap();
        let username = users
            .values()
            .find(|u| u.id == user_id)
            .map(|u| u.username.clone())?;
        users.remove(&username)
    }

    /// Change the admin flag on a user, returning the updated record
    pub fn set_admin(&self, user_id: &str, is_admin: bool) -> Option<UserData> {
        let mut users = self.users.write().unwrap();
        let user = users.values_mut().find(|u| u.id == user_id)?;
        user.is_admin = is_admin;
        Some(user.clone())
    }

    /// All active users, ordered by username
    pub fn list_active(&self) -> Vec<UserData> {
        let users = self.users.read().unwrap();
        let mut active: Vec<UserData> = users.values().filter(|u| u.is_active).cloned().collect();
        active.sort_by(|a, b| a.username.cmp(&b.username));
        active
    }
}

/// User service for authentication and account operations
#[derive(Debug, Clone)]
pub struct UserService {
    store: UserStore,
}

impl Default for UserService {
    fn default() -> Self {
        Self {
            store: UserStore::default(),
        }
    }
}

impl UserService {
    /// Create new user service with custom store
    pub fn new(store: UserStore) -> Self {
        Self { store }
    }

    /// Get user by ID
    pub fn get_user_by_id(&self, user_id: &str) -> Option<UserData> {
        self.store.get_user_by_id(user_id)
    }

    /// Get user by username
    pub fn get_user_by_username(&self, username: &str) -> Option<UserData> {
        self.store.get_user_by_username(username)
    }

    /// Whether a username is already taken
    pub fn username_exists(&self, username: &str) -> bool {
        self.store.username_exists(username)
    }

    /// Create a new user account
    pub fn create_user(&self, request: CreateUserRequest) -> Result<UserData, AuthError> {
        if request.username.is_empty() || request.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let user_data = UserData::new(
            request.username,
            request.full_name,
            &request.password,
            request.is_admin,
        )?;

        self.store.create_user(user_data)
    }

    /// Delete a user account, returning the removed record
    pub fn delete_user(&self, user_id: &str) -> Option<UserData> {
        self.store.remove_by_id(user_id)
    }

    /// Change the admin flag on a user
    pub fn set_admin(&self, user_id: &str, is_admin: bool) -> Option<UserData> {
        self.store.set_admin(user_id, is_admin)
    }

    /// All active users, ordered by username
    pub fn list_active_users(&self) -> Vec<UserData> {
        self.store.list_active()
    }

    /// Login user
    pub fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let user_data = self.store.authenticate_user(request)?;

        let tokens = JwtService::generate_token_pair(
            user_data.id.clone(),
            user_data.username.clone(),
            user_data.full_name.clone(),
            user_data.is_admin,
        )?;

        Ok(AuthResponse {
            user: user_data.to_user_info(),
            tokens,
        })
    }

    /// Refresh access token
    pub fn refresh_token(&self, request: RefreshRequest) -> Result<TokenPair, AuthError> {
        let claims = JwtService::verify_token(&request.refresh_token)?;

        // Ensure it's a refresh token
        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::InvalidTokenType);
        }

        // Get current user data
        let user_data = self
            .store
            .get_user_by_id(&claims.sub)
            .ok_or(AuthError::InvalidCredentials)?;

        // Generate new token pair
        JwtService::generate_token_pair(
            user_data.id,
            user_data.username,
            user_data.full_name,
            user_data.is_admin,
        )
    }

    /// Get user store (for testing)
    pub fn store(&self) -> &UserStore {
        &self.store
    }
}

#[async_trait]
impl UserDirectory for UserService {
    async fn resolve(&self, user_id: &str) -> ApplicationResult<Option<UserIdentity>> {
        Ok(self.store.get_user_by_id(user_id).map(|u| u.to_identity()))
    }

    async fn list_active(&self) -> ApplicationResult<Vec<UserIdentity>> {
        Ok(self
            .store
            .list_active()
            .iter()
            .map(UserData::to_identity)
            .collect())
    }
}

/// Hash password using Argon2
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify password against hash
fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidToken)?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
