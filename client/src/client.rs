use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use shared::types::{
    BoothLocation, ClientConfig, FieldVisibility, PrintDetail, ProfileUpdate, RemoteConfig,
    Session, UserDirectory, UserPrintRow, VoterPage, VoterRecord, VoterReportRow, VoterRollUpload,
    UploadReceipt,
};

use crate::api::{self, Operation};
use crate::cache::QueryCache;
use crate::error::ClientError;
use crate::http::{HttpClient, Multipart, RequestOptions, TokenSource};
use crate::preferences::DisplayPreferences;
use crate::session::SessionStore;
use crate::storage::{self, KeyValueStore, StorageError};

/// Image uploaded alongside the display configuration.
#[derive(Debug, Clone)]
pub struct BannerImage {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Entry point for views: every backend operation plus the session,
/// preference and cache state they touch.
///
/// Share it behind an `Arc`; all methods take `&self`.
#[derive(Debug)]
pub struct Client {
    http: HttpClient,
    session: Arc<SessionStore>,
    preferences: DisplayPreferences,
    cache: QueryCache,
    presearch_page_size: u32,
}

impl Client {
    pub fn new(config: &ClientConfig, storage: Arc<dyn KeyValueStore>) -> Self {
        let session = Arc::new(SessionStore::new(storage.clone()));
        let http = HttpClient::new(&config.api).with_token_source(session.clone());
        info!(
            "Client ready: base_url={}, timeout={:?}",
            http.base_url(),
            http.timeout()
        );

        Self {
            http,
            session,
            preferences: DisplayPreferences::new(storage),
            cache: QueryCache::new(),
            presearch_page_size: config.api.presearch_page_size,
        }
    }

    /// Build a client whose storage backend comes from `config.storage`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, StorageError> {
        let storage = storage::open(&config.storage)?;
        Ok(Self::new(config, storage))
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn preferences(&self) -> &DisplayPreferences {
        &self.preferences
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn current_session(&self) -> Option<Session> {
        self.session.current_session()
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Sign in. Cached data from a different operator or campaign is dropped.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        activation_code: &str,
    ) -> Result<Session, ClientError> {
        let previous = self.session.current_session();
        let session = self
            .session
            .login(&self.http, identifier, password, activation_code)
            .await?;

        if !previous.is_some_and(|p| p.same_identity(&session)) {
            self.cache.clear();
        }
        Ok(session)
    }

    /// Clear the session and every cached result.
    pub fn logout(&self) {
        self.session.logout();
        self.cache.clear();
    }

    pub async fn refresh_token(&self) -> Result<Session, ClientError> {
        let sent = self.session.bearer_token();
        let result = self.session.refresh_token(&self.http).await;
        self.observe(result, sent.as_deref())
    }

    pub fn update_profile(&self, patch: ProfileUpdate) -> Result<Session, ClientError> {
        self.session.update_profile(patch)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn search_users(&self, activation_code: &str) -> Result<Arc<UserDirectory>, ClientError> {
        let code = required("activationCode", activation_code)?;
        self.query(&api::SEARCH_USERS, &[("activationCode", code)])
            .await
    }

    pub async fn get_voter_report(
        &self,
        activation_code: &str,
        search_term: Option<&str>,
    ) -> Result<Arc<Vec<VoterReportRow>>, ClientError> {
        let code = required("activationCode", activation_code)?;
        let mut params = vec![("activationCode", code)];
        if let Some(term) = search_term.map(str::trim).filter(|t| !t.is_empty()) {
            params.push(("searchTerm", term));
        }
        self.query(&api::VOTER_REPORT, &params).await
    }

    pub async fn get_booth_locations(
        &self,
        activation_code: &str,
    ) -> Result<Arc<Vec<BoothLocation>>, ClientError> {
        let code = required("activationCode", activation_code)?;
        self.query(&api::BOOTH_LOCATIONS, &[("activationCode", code)])
            .await
    }

    /// First page of voters for a campaign; the page size comes from config.
    pub async fn presearch_voters(
        &self,
        activation_code: &str,
    ) -> Result<Arc<Vec<VoterRecord>>, ClientError> {
        let code = required("activationCode", activation_code)?;
        let page_size = self.presearch_page_size.to_string();
        self.query_as(
            &api::PRESEARCH_VOTERS,
            &[("pageSize", page_size.as_str()), ("activationCode", code)],
            VoterPage::into_records,
        )
        .await
    }

    pub async fn search_voters(
        &self,
        activation_code: &str,
        search_text: &str,
    ) -> Result<Arc<Vec<VoterRecord>>, ClientError> {
        let code = required("activationCode", activation_code)?;
        let text = required("searchText", search_text)?;
        self.query_as(
            &api::SEARCH_VOTERS,
            &[("searchText", text), ("activationCode", code)],
            VoterPage::into_records,
        )
        .await
    }

    pub async fn get_config(&self) -> Result<Arc<RemoteConfig>, ClientError> {
        self.query(&api::GET_CONFIG, &[]).await
    }

    pub async fn get_user_print_report(
        &self,
        activation_code: &str,
    ) -> Result<Arc<Vec<UserPrintRow>>, ClientError> {
        let code = required("activationCode", activation_code)?;
        self.query(&api::USER_PRINT_REPORT, &[("activationCode", code)])
            .await
    }

    pub async fn get_print_detail(
        &self,
        activation_code: &str,
        user: &str,
    ) -> Result<Arc<PrintDetail>, ClientError> {
        let code = required("activationCode", activation_code)?;
        let user = required("user", user)?;
        self.query(&api::PRINT_DETAIL, &[("activationCode", code), ("user", user)])
            .await
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub async fn save_config(&self, visibility: &FieldVisibility) -> Result<(), ClientError> {
        let request = api::SAVE_CONFIG.request(&[]).json(visibility)?;
        self.mutate::<Value>(&api::SAVE_CONFIG, request).await?;
        Ok(())
    }

    /// Save the visibility map together with a banner image.
    pub async fn save_config_with_banner(
        &self,
        visibility: &FieldVisibility,
        banner: BannerImage,
    ) -> Result<(), ClientError> {
        if banner.data.is_empty() {
            return Err(ClientError::validation("banner", "The selected image is empty"));
        }
        let config = serde_json::to_string(visibility).map_err(|e| ClientError::Application {
            status: None,
            message: format!("Failed to serialize request body: {}", e),
        })?;

        let form = Multipart::new()
            .file("config", "config.json", "application/json", config.into_bytes())
            .file("banner", &banner.file_name, &banner.content_type, banner.data);
        let request = api::SAVE_CONFIG.request(&[]).multipart(form);
        self.mutate::<Value>(&api::SAVE_CONFIG, request).await?;
        Ok(())
    }

    /// Push the local field-visibility map to the server. Local state is
    /// kept whatever the outcome.
    pub async fn save_preferences(&self) -> Result<(), ClientError> {
        let visibility = self.preferences.get();
        self.save_config(&visibility).await.inspect_err(|e| {
            warn!("Saving field visibility failed, keeping local copy: {}", e);
        })
    }

    pub async fn upload_voter_roll(
        &self,
        upload: &VoterRollUpload,
    ) -> Result<UploadReceipt, ClientError> {
        upload.validate()?;

        let mut form = Multipart::new().file(
            "file",
            &upload.file_name,
            upload.content_type(),
            upload.contents.clone(),
        );
        for (name, value) in upload.form_fields() {
            form = form.text(name, value.trim());
        }

        debug!(
            "Uploading {} ({} bytes)",
            upload.file_name,
            upload.contents.len()
        );
        let request = api::UPLOAD_VOTER_ROLL.request(&[]).multipart(form);
        let receipt: Option<UploadReceipt> = self.mutate(&api::UPLOAD_VOTER_ROLL, request).await?;
        Ok(receipt.unwrap_or_default())
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    fn require_session(&self) -> Result<(), ClientError> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(ClientError::not_signed_in())
        }
    }

    async fn query<T>(&self, op: &'static Operation, params: &[(&str, &str)]) -> Result<Arc<T>, ClientError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.query_as(op, params, std::convert::identity::<T>).await
    }

    /// Run a cached query, decoding the body as `W` and storing `convert(W)`.
    async fn query_as<W, T>(
        &self,
        op: &'static Operation,
        params: &[(&str, &str)],
        convert: fn(W) -> T,
    ) -> Result<Arc<T>, ClientError>
    where
        W: DeserializeOwned + Send + 'static,
        T: Send + Sync + 'static,
    {
        self.require_session()?;

        let sent = self.session.bearer_token();
        let http = self.http.clone();
        let request = op.request(params);
        let result = self
            .cache
            .fetch(op.key(params), op.provides, move || async move {
                http.request::<W>(request).await.map(convert)
            })
            .await;
        self.observe(result, sent.as_deref())
    }

    async fn mutate<T: DeserializeOwned>(
        &self,
        op: &'static Operation,
        request: RequestOptions,
    ) -> Result<T, ClientError> {
        self.require_session()?;

        let sent = self.session.bearer_token();
        let result = self.http.request::<T>(request).await;
        if result.is_ok() {
            self.cache.invalidate(op.invalidates);
        }
        self.observe(result, sent.as_deref())
    }

    /// An auth failure ends the session it was issued under and drops cached
    /// data. A session started while the call was out survives.
    fn observe<T>(&self, result: Result<T, ClientError>, sent: Option<&str>) -> Result<T, ClientError> {
        if let Err(e) = &result {
            if e.is_auth() {
                if let Some(token) = sent {
                    self.session.expire(token);
                }
                if self.session.is_authenticated() {
                    debug!("Ignoring auth failure from a replaced session: {}", e);
                } else {
                    warn!("Authentication failed, signed out: {}", e);
                    self.cache.clear();
                }
            }
        }
        result
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ClientError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ClientError::validation(
            field,
            format!("Missing required field: {}", field),
        ));
    }
    Ok(value)
}
