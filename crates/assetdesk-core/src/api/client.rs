//! Typed client for the asset management REST API.
//!
//! `ApiClient` turns each backend endpoint into a method. All of them go
//! through the `AuthenticatedExecutor`, so every screen gets the same
//! bearer-token handling and session-expiry behavior.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result as AnyResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use super::executor::AuthenticatedExecutor;
use super::redirect::Navigator;
use super::request::RequestDescriptor;
use super::transport::{ReqwestTransport, Transport};
use super::ApiError;
use crate::auth::TokenStore;
use crate::config::Config;
use crate::models::{
    Asset, AssetStats, CategoryCount, DashboardSummary, Division, Maintenance, NewAsset,
    NewDivision, NewMaintenance, NewOffice, NewUser, Office, OneOrMany, PendingAction, TokenPair,
    User,
};

// ============================================================================
// Constants
// ============================================================================

/// Login endpoint (JWT pair issue)
const TOKEN_PATH: &str = "/token/";

const LOGOUT_PATH: &str = "/logout/";

const CURRENT_USER_PATH: &str = "/users/me/";

/// Emails a reset link for the account, if it exists.
const PASSWORD_RESET_PATH: &str = "/password-reset/";

type Result<T> = std::result::Result<T, ApiError>;

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct NewPassword<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    old_password: Option<&'a str>,
    new_password: &'a str,
    confirm_password: &'a str,
}

impl<'a> NewPassword<'a> {
    fn checked(
        old_password: Option<&'a str>,
        new_password: &'a str,
        confirm_password: &'a str,
    ) -> Result<Self> {
        if new_password != confirm_password {
            return Err(ApiError::PasswordMismatch);
        }
        Ok(Self {
            old_password,
            new_password,
            confirm_password,
        })
    }
}

/// Client for the asset management API.
/// Clone is cheap - the executor (and its connection pool) is shared.
#[derive(Clone)]
pub struct ApiClient {
    executor: Arc<AuthenticatedExecutor>,
}

impl ApiClient {
    /// Create a client talking to the backend named in `config`.
    pub fn new(
        config: &Config,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> AnyResult<Self> {
        let transport = ReqwestTransport::new(
            config.api_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self::with_transport(
            Arc::new(transport),
            store,
            navigator,
            config.refresh_path.clone(),
        ))
    }

    pub fn with_transport(
        transport: Arc<dyn Transport>,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        refresh_path: impl Into<String>,
    ) -> Self {
        Self {
            executor: Arc::new(AuthenticatedExecutor::new(
                transport,
                store,
                navigator,
                refresh_path,
            )),
        }
    }

    pub fn executor(&self) -> &AuthenticatedExecutor {
        &self.executor
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.executor
            .execute_json(&RequestDescriptor::get(path))
            .await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        self.executor
            .execute_json(&RequestDescriptor::post(path).json(body)?)
            .await
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        self.executor
            .execute_json(&RequestDescriptor::put(path).json(body)?)
            .await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.executor.execute(&RequestDescriptor::delete(path)).await?;
        Ok(())
    }

    // ===== Session =====

    /// Exchange username/password for a token pair, store it, and return the
    /// logged-in user.
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let descriptor = RequestDescriptor::post(TOKEN_PATH)
            .json(&LoginRequest { username, password })?
            .public();
        let pair: TokenPair = self.executor.execute_json(&descriptor).await?;

        self.executor.store_credentials(pair.into_credential());
        let user = self.current_user().await?;
        info!(username = %user.username, staff = user.is_staff, "Logged in");
        Ok(user)
    }

    /// Tell the backend the session is over and drop local credentials.
    /// The local session is cleared even if the backend call fails, and a
    /// rejected token neither refreshes nor counts as an expired session.
    pub async fn logout(&self) {
        if let Some(refresh) = self.executor.store().refresh_token() {
            let body = serde_json::json!({ "refresh": refresh });
            let outcome = match RequestDescriptor::post(LOGOUT_PATH).json(&body) {
                Ok(descriptor) => self.executor.execute(&descriptor.no_refresh()).await.map(drop),
                Err(e) => Err(e),
            };
            if let Err(e) = outcome {
                debug!(error = %e, "Backend logout failed");
            }
        }
        self.executor.sign_out();
        info!("Logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.executor.store().read().is_some()
    }

    pub async fn current_user(&self) -> Result<User> {
        self.get(CURRENT_USER_PATH).await
    }

    /// Ask for a reset link. The backend answers the same way whether or not
    /// the username exists.
    pub async fn request_password_reset(&self, username: &str) -> Result<()> {
        let descriptor = RequestDescriptor::post(PASSWORD_RESET_PATH)
            .json(&serde_json::json!({ "username": username }))?
            .public();
        self.executor.execute(&descriptor).await?;
        Ok(())
    }

    /// Set a new password using the `uidb64`/`token` pair from a reset link.
    pub async fn reset_password(
        &self,
        uidb64: &str,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<()> {
        let body = NewPassword::checked(None, new_password, confirm_password)?;
        let descriptor = RequestDescriptor::post(format!("/reset-password/{}/{}/", uidb64, token))
            .json(&body)?
            .public();
        self.executor.execute(&descriptor).await?;
        info!("Password reset");
        Ok(())
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<()> {
        let body = NewPassword::checked(Some(old_password), new_password, confirm_password)?;
        self.post::<serde_json::Value, _>(&format!("/users/{}/change-password/", user_id), &body)
            .await?;
        info!(user_id, "Password changed");
        Ok(())
    }

    // ===== Offices =====

    pub async fn offices(&self) -> Result<Vec<Office>> {
        self.get("/office/").await
    }

    pub async fn office(&self, id: i64) -> Result<Office> {
        self.get(&format!("/office/{}/", id)).await
    }

    pub async fn create_office(&self, office: &NewOffice) -> Result<Office> {
        self.post("/office/", office).await
    }

    pub async fn update_office(&self, id: i64, office: &NewOffice) -> Result<Office> {
        self.put(&format!("/office/{}/", id), office).await
    }

    pub async fn delete_office(&self, id: i64) -> Result<()> {
        self.delete(&format!("/office/{}/", id)).await
    }

    // ===== Divisions =====

    pub async fn divisions(&self) -> Result<Vec<Division>> {
        self.get("/divisions/").await
    }

    pub async fn division(&self, id: i64) -> Result<Division> {
        self.get(&format!("/divisions/{}/", id)).await
    }

    pub async fn create_division(&self, division: &NewDivision) -> Result<Division> {
        self.post("/divisions/", division).await
    }

    pub async fn update_division(&self, id: i64, division: &NewDivision) -> Result<Division> {
        self.put(&format!("/divisions/{}/", id), division).await
    }

    pub async fn delete_division(&self, id: i64) -> Result<()> {
        self.delete(&format!("/divisions/{}/", id)).await
    }

    // ===== Assets =====

    pub async fn assets(&self) -> Result<Vec<Asset>> {
        self.get("/assets/").await
    }

    pub async fn asset(&self, id: i64) -> Result<Asset> {
        self.get(&format!("/assets/{}/", id)).await
    }

    pub async fn create_asset(&self, asset: &NewAsset) -> Result<Asset> {
        self.post("/assets/", asset).await
    }

    /// Submit changes; they stay pending until an admin approves them.
    pub async fn update_asset(&self, id: i64, asset: &NewAsset) -> Result<Asset> {
        self.put(&format!("/assets/{}/update/", id), asset).await
    }

    /// Delete outright. Admins use this to approve a deletion request.
    pub async fn delete_asset(&self, id: i64) -> Result<()> {
        self.delete(&format!("/assets/{}/", id)).await
    }

    pub async fn active_assets(&self) -> Result<Vec<Asset>> {
        self.get("/assets/active-assets/").await
    }

    pub async fn inactive_assets(&self) -> Result<Vec<Asset>> {
        self.get("/assets/inactive/").await
    }

    /// Assets with an outstanding deletion request.
    pub async fn deleted_assets(&self) -> Result<Vec<Asset>> {
        self.get("/assets/deleted/").await
    }

    /// Assets with an outstanding update awaiting approval.
    pub async fn updated_assets(&self) -> Result<Vec<Asset>> {
        self.get("/assets/updated/").await
    }

    pub async fn pending_assets(&self) -> Result<Vec<Asset>> {
        self.get("/assets/pending-assets/").await
    }

    pub async fn assets_needing_troubleshooting(&self) -> Result<Vec<Asset>> {
        self.get("/assets/need-troubleshooting/").await
    }

    pub async fn assets_by_division(&self, division_id: i64) -> Result<Vec<Asset>> {
        self.get(&format!("/assets/by_division/?division_id={}", division_id))
            .await
    }

    pub async fn category_distribution(&self) -> Result<Vec<CategoryCount>> {
        self.get("/assets/category-distribution/").await
    }

    pub async fn asset_stats(&self) -> Result<AssetStats> {
        self.get("/assets/asset-stats/").await
    }

    // ===== Approval workflow =====

    pub async fn request_asset_deletion(&self, id: i64, reason: &str) -> Result<()> {
        let body = serde_json::json!({ "description": reason });
        self.post::<serde_json::Value, _>(&format!("/assets/{}/delete-request/", id), &body)
            .await?;
        Ok(())
    }

    pub async fn approve_asset_update(&self, id: i64) -> Result<()> {
        self.put::<serde_json::Value, _>(&format!("/assets/{}/approve/", id), &serde_json::json!({}))
            .await?;
        Ok(())
    }

    pub async fn reject_asset_update(&self, id: i64) -> Result<()> {
        self.put::<serde_json::Value, _>(
            &format!("/assets/{}/reject-update/", id),
            &serde_json::json!({}),
        )
        .await?;
        Ok(())
    }

    pub async fn reject_asset_deletion(&self, id: i64) -> Result<()> {
        self.put::<serde_json::Value, _>(
            &format!("/assets/{}/reject/", id),
            &serde_json::json!({ "is_pending": false }),
        )
        .await?;
        Ok(())
    }

    /// Change requests filed against an asset.
    pub async fn pending_actions(&self, asset_id: i64) -> Result<Vec<PendingAction>> {
        let found: OneOrMany<PendingAction> = self
            .get(&format!("/assets/pending-actions/{}/", asset_id))
            .await?;
        Ok(found.into_vec())
    }

    pub async fn approve_pending_action(&self, id: i64) -> Result<()> {
        self.post::<serde_json::Value, _>(
            &format!("/pending-actions/{}/approve/", id),
            &serde_json::json!({}),
        )
        .await?;
        Ok(())
    }

    pub async fn reject_pending_action(&self, id: i64) -> Result<()> {
        self.post::<serde_json::Value, _>(
            &format!("/pending-actions/{}/reject/", id),
            &serde_json::json!({}),
        )
        .await?;
        Ok(())
    }

    // ===== Maintenance =====

    pub async fn maintenances(&self) -> Result<Vec<Maintenance>> {
        self.get("/maintenances/").await
    }

    pub async fn maintenance(&self, id: i64) -> Result<Maintenance> {
        self.get(&format!("/maintenances/{}/", id)).await
    }

    pub async fn create_maintenance(&self, record: &NewMaintenance) -> Result<Maintenance> {
        self.post("/maintenances/", record).await
    }

    pub async fn update_maintenance(&self, id: i64, record: &NewMaintenance) -> Result<Maintenance> {
        self.put(&format!("/maintenances/{}/", id), record).await
    }

    pub async fn delete_maintenance(&self, id: i64) -> Result<()> {
        self.delete(&format!("/maintenances/{}/", id)).await
    }

    // ===== Users =====

    pub async fn users(&self) -> Result<Vec<User>> {
        self.get("/users/").await
    }

    pub async fn user(&self, id: i64) -> Result<User> {
        self.get(&format!("/users/{}/", id)).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User> {
        self.post("/users/", user).await
    }

    pub async fn update_user(&self, id: i64, user: &NewUser) -> Result<User> {
        self.put(&format!("/users/{}/", id), user).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<()> {
        self.delete(&format!("/users/{}/", id)).await
    }

    // ===== Dashboard =====

    /// Fetch every dashboard figure at once. With an expired token all of
    /// these fail together and share a single refresh.
    pub async fn dashboard(&self) -> Result<DashboardSummary> {
        let (assets, inactive, troubleshooting, divisions, maintenances, categories, stats) = futures::try_join!(
            self.get::<Vec<serde_json::Value>>("/assets/"),
            self.get::<Vec<serde_json::Value>>("/assets/inactive/"),
            self.get::<Vec<serde_json::Value>>("/assets/need-troubleshooting/"),
            self.get::<Vec<serde_json::Value>>("/divisions/"),
            self.get::<Vec<serde_json::Value>>("/maintenances/"),
            self.category_distribution(),
            self.asset_stats(),
        )?;

        Ok(DashboardSummary {
            total_assets: assets.len(),
            inactive_assets: inactive.len(),
            need_troubleshooting: troubleshooting.len(),
            divisions: divisions.len(),
            maintenance_records: maintenances.len(),
            category_distribution: categories,
            asset_stats: stats,
        })
    }
}
