// TestDependencies - mock implementations for testing
//
// Provides in-memory stores and recording platform APIs that can be injected
// into SyncDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use bluesky_client::{BlueskyError, Session, StrongRef};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use twitter_client::{CreateTweetRequest, OAuthToken, Tweet, TwitterError, User};

use super::{
    BaseBlueskyApi, BaseCredentialStore, BaseEntityReader, BaseFederation, BaseMediaFetcher,
    BasePostReader, BaseRefStore, BaseSyncAudit, BaseSyncSettings, BaseTwitterApi, FederationRequest,
    FetchedMedia, HomeLinkResolver, SyncDeps,
};
use crate::common::{ListId, PostId, ProjectId, UserId};
use crate::domains::crosspost::models::{
    ActionRefKey, EntitySummary, Platform, PlatformTokens, Post, SyncAuditEntry, SyncSettings,
    TwitterAppConfig,
};

pub const TEST_HOME_BASE_URL: &str = "https://home.test";
pub const TEST_ASSET_BASE_URL: &str = "https://assets.test";
pub const TEST_TWITTER_ACCOUNT: &str = "tw-1";
pub const TEST_BLUESKY_DID: &str = "did:plc:tester";

// =============================================================================
// In-memory Sync Store (refs, credentials, settings, audit)
// =============================================================================

#[derive(Default)]
pub struct InMemorySyncStore {
    platform_refs: Mutex<HashMap<(PostId, Platform), Value>>,
    action_refs: Mutex<HashMap<ActionRefKey, Value>>,
    app_configs: Mutex<HashMap<(UserId, Platform), Value>>,
    tokens: Mutex<HashMap<(UserId, Platform), PlatformTokens>>,
    token_saves: Mutex<Vec<(UserId, Platform, PlatformTokens)>>,
    settings: Mutex<HashMap<UserId, SyncSettings>>,
    audits: Mutex<Vec<SyncAuditEntry>>,
    fail_settings: AtomicBool,
    fail_audit: AtomicBool,
}

impl InMemorySyncStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(&self, user_id: UserId, platforms: &[Platform]) {
        self.settings.lock().unwrap().insert(
            user_id,
            SyncSettings {
                user_id,
                twitter_enabled: platforms.contains(&Platform::Twitter),
                bluesky_enabled: platforms.contains(&Platform::Bluesky),
            },
        );
    }

    pub fn insert_platform_ref(&self, post_id: PostId, platform: Platform, value: Value) {
        self.platform_refs
            .lock()
            .unwrap()
            .insert((post_id, platform), value);
    }

    pub fn insert_action_ref(&self, key: ActionRefKey, value: Value) {
        self.action_refs.lock().unwrap().insert(key, value);
    }

    pub fn insert_app_config(&self, user_id: UserId, platform: Platform, config: Value) {
        self.app_configs
            .lock()
            .unwrap()
            .insert((user_id, platform), config);
    }

    pub fn insert_tokens(&self, user_id: UserId, platform: Platform, tokens: PlatformTokens) {
        self.tokens.lock().unwrap().insert((user_id, platform), tokens);
    }

    /// Make settings lookups fail, as during a database outage.
    pub fn fail_settings(&self) {
        self.fail_settings.store(true, Ordering::SeqCst);
    }

    pub fn fail_audit(&self) {
        self.fail_audit.store(true, Ordering::SeqCst);
    }

    pub fn platform_ref(&self, post_id: PostId, platform: Platform) -> Option<Value> {
        self.platform_refs
            .lock()
            .unwrap()
            .get(&(post_id, platform))
            .cloned()
    }

    pub fn action_ref(&self, key: &ActionRefKey) -> Option<Value> {
        self.action_refs.lock().unwrap().get(key).cloned()
    }

    pub fn action_ref_count(&self) -> usize {
        self.action_refs.lock().unwrap().len()
    }

    pub fn tokens(&self, user_id: UserId, platform: Platform) -> Option<PlatformTokens> {
        self.tokens.lock().unwrap().get(&(user_id, platform)).cloned()
    }

    /// Every token write-back, in order.
    pub fn token_saves(&self) -> Vec<(UserId, Platform, PlatformTokens)> {
        self.token_saves.lock().unwrap().clone()
    }

    pub fn audits(&self) -> Vec<SyncAuditEntry> {
        self.audits.lock().unwrap().clone()
    }

    pub fn last_audit(&self, post_id: PostId) -> Option<SyncAuditEntry> {
        self.audits
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|a| a.post_id == post_id)
            .cloned()
    }
}

#[async_trait]
impl BaseRefStore for InMemorySyncStore {
    async fn get_platform_ref(&self, post_id: PostId, platform: Platform) -> Result<Option<Value>> {
        Ok(self.platform_ref(post_id, platform))
    }

    async fn set_platform_ref(
        &self,
        post_id: PostId,
        platform: Platform,
        value: Value,
    ) -> Result<()> {
        self.platform_refs
            .lock()
            .unwrap()
            .entry((post_id, platform))
            .or_insert(value);
        Ok(())
    }

    async fn delete_platform_ref(&self, post_id: PostId, platform: Platform) -> Result<()> {
        self.platform_refs
            .lock()
            .unwrap()
            .remove(&(post_id, platform));
        Ok(())
    }

    async fn get_action_ref(&self, key: &ActionRefKey) -> Result<Option<Value>> {
        Ok(self.action_ref(key))
    }

    async fn set_action_ref(&self, key: &ActionRefKey, value: Value) -> Result<()> {
        self.action_refs
            .lock()
            .unwrap()
            .entry(*key)
            .or_insert(value);
        Ok(())
    }

    async fn delete_action_ref(&self, key: &ActionRefKey) -> Result<()> {
        self.action_refs.lock().unwrap().remove(key);
        Ok(())
    }
}

#[async_trait]
impl BaseCredentialStore for InMemorySyncStore {
    async fn get_app_config(&self, user_id: UserId, platform: Platform) -> Result<Option<Value>> {
        Ok(self
            .app_configs
            .lock()
            .unwrap()
            .get(&(user_id, platform))
            .cloned())
    }

    async fn get_tokens(
        &self,
        user_id: UserId,
        platform: Platform,
    ) -> Result<Option<PlatformTokens>> {
        Ok(self.tokens(user_id, platform))
    }

    async fn save_tokens(
        &self,
        user_id: UserId,
        platform: Platform,
        tokens: &PlatformTokens,
    ) -> Result<()> {
        self.token_saves
            .lock()
            .unwrap()
            .push((user_id, platform, tokens.clone()));
        self.insert_tokens(user_id, platform, tokens.clone());
        Ok(())
    }
}

#[async_trait]
impl BaseSyncSettings for InMemorySyncStore {
    async fn settings_for(&self, user_id: UserId) -> Result<SyncSettings> {
        if self.fail_settings.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused: settings store unavailable");
        }
        Ok(self
            .settings
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or(SyncSettings {
                user_id,
                ..Default::default()
            }))
    }
}

#[async_trait]
impl BaseSyncAudit for InMemorySyncStore {
    async fn record(&self, entry: &SyncAuditEntry) -> Result<()> {
        if self.fail_audit.load(Ordering::SeqCst) {
            anyhow::bail!("audit table unavailable");
        }
        self.audits.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

// =============================================================================
// Mock Post Reader
// =============================================================================

#[derive(Default)]
pub struct MockPostReader {
    posts: Mutex<HashMap<PostId, Post>>,
}

impl MockPostReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, post: Post) {
        self.posts.lock().unwrap().insert(post.id, post);
    }
}

#[async_trait]
impl BasePostReader for MockPostReader {
    async fn get_post(&self, post_id: PostId) -> Result<Option<Post>> {
        Ok(self.posts.lock().unwrap().get(&post_id).cloned())
    }
}

// =============================================================================
// Mock Entity Reader (users, projects, lists)
// =============================================================================

#[derive(Default)]
pub struct MockEntityReader {
    users: Mutex<HashMap<UserId, EntitySummary>>,
    projects: Mutex<HashMap<ProjectId, EntitySummary>>,
    lists: Mutex<HashMap<ListId, EntitySummary>>,
    failing: AtomicBool,
}

impl MockEntityReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user_id: UserId, summary: EntitySummary) {
        self.users.lock().unwrap().insert(user_id, summary);
    }

    pub fn insert_project(&self, project_id: ProjectId, summary: EntitySummary) {
        self.projects.lock().unwrap().insert(project_id, summary);
    }

    pub fn insert_list(&self, list_id: ListId, summary: EntitySummary) {
        self.lists.lock().unwrap().insert(list_id, summary);
    }

    /// Make every later lookup fail.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("entity reader unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl BaseEntityReader for MockEntityReader {
    async fn get_user(&self, user_id: UserId) -> Result<Option<EntitySummary>> {
        self.check()?;
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }

    async fn get_project(&self, project_id: ProjectId) -> Result<Option<EntitySummary>> {
        self.check()?;
        Ok(self.projects.lock().unwrap().get(&project_id).cloned())
    }

    async fn get_list(&self, list_id: ListId) -> Result<Option<EntitySummary>> {
        self.check()?;
        Ok(self.lists.lock().unwrap().get(&list_id).cloned())
    }
}

// =============================================================================
// Mock Media Fetcher
// =============================================================================

pub struct MockMediaFetcher {
    responses: Arc<Mutex<HashMap<String, FetchedMedia>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockMediaFetcher {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_media(self, url: &str, bytes: Vec<u8>, mime_type: &str) -> Self {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            FetchedMedia {
                bytes,
                mime_type: mime_type.to_string(),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockMediaFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseMediaFetcher for MockMediaFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedMedia> {
        self.calls.lock().unwrap().push(url.to_string());

        let responses = self.responses.lock().unwrap();
        Ok(responses.get(url).cloned().unwrap_or(FetchedMedia {
            // PNG signature is enough for the mocks
            bytes: vec![0x89, b'P', b'N', b'G'],
            mime_type: "image/png".to_string(),
        }))
    }
}

// =============================================================================
// Mock Federation
// =============================================================================

#[derive(Default)]
pub struct MockFederation {
    calls: Mutex<Vec<FederationRequest>>,
    failing: AtomicBool,
}

impl MockFederation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<FederationRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseFederation for MockFederation {
    async fn sync_post(&self, request: &FederationRequest) -> Result<()> {
        self.calls.lock().unwrap().push(*request);
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("federation inbox unreachable");
        }
        Ok(())
    }
}

// =============================================================================
// Mock Twitter API
// =============================================================================

/// A recorded Twitter API call.
#[derive(Debug, Clone, PartialEq)]
pub enum TwitterCall {
    CreateTweet(CreateTweetRequest),
    DeleteTweet { tweet_id: String },
    Me,
    Retweet { user_id: String, tweet_id: String },
    Unretweet { user_id: String, tweet_id: String },
    Like { user_id: String, tweet_id: String },
    Unlike { user_id: String, tweet_id: String },
    Bookmark { user_id: String, tweet_id: String },
    RemoveBookmark { user_id: String, tweet_id: String },
    RefreshToken { refresh_token: String },
}

pub struct MockTwitterApi {
    calls: Arc<Mutex<Vec<TwitterCall>>>,
    failures: Arc<Mutex<Vec<TwitterError>>>,
    next_id: AtomicU64,
}

impl MockTwitterApi {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(101),
        }
    }

    /// Queue an API error for the next call.
    pub fn fail_next(&self, status: u16, message: &str) {
        self.failures.lock().unwrap().push(TwitterError::Api {
            status,
            message: message.to_string(),
        });
    }

    pub fn calls(&self) -> Vec<TwitterCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn created_tweets(&self) -> Vec<CreateTweetRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                TwitterCall::CreateTweet(req) => Some(req.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: TwitterCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        let mut failures = self.failures.lock().unwrap();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.remove(0).into())
        }
    }
}

impl Default for MockTwitterApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseTwitterApi for MockTwitterApi {
    async fn create_tweet(&self, _token: &str, request: &CreateTweetRequest) -> Result<Tweet> {
        self.record(TwitterCall::CreateTweet(request.clone()))?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(Tweet {
            id: id.to_string(),
            text: request.text.clone(),
        })
    }

    async fn delete_tweet(&self, _token: &str, tweet_id: &str) -> Result<()> {
        self.record(TwitterCall::DeleteTweet {
            tweet_id: tweet_id.to_string(),
        })
    }

    async fn me(&self, _token: &str) -> Result<User> {
        self.record(TwitterCall::Me)?;
        Ok(User {
            id: TEST_TWITTER_ACCOUNT.to_string(),
            username: "tester".to_string(),
            name: None,
        })
    }

    async fn retweet(&self, _token: &str, user_id: &str, tweet_id: &str) -> Result<()> {
        self.record(TwitterCall::Retweet {
            user_id: user_id.to_string(),
            tweet_id: tweet_id.to_string(),
        })
    }

    async fn unretweet(&self, _token: &str, user_id: &str, tweet_id: &str) -> Result<()> {
        self.record(TwitterCall::Unretweet {
            user_id: user_id.to_string(),
            tweet_id: tweet_id.to_string(),
        })
    }

    async fn like(&self, _token: &str, user_id: &str, tweet_id: &str) -> Result<()> {
        self.record(TwitterCall::Like {
            user_id: user_id.to_string(),
            tweet_id: tweet_id.to_string(),
        })
    }

    async fn unlike(&self, _token: &str, user_id: &str, tweet_id: &str) -> Result<()> {
        self.record(TwitterCall::Unlike {
            user_id: user_id.to_string(),
            tweet_id: tweet_id.to_string(),
        })
    }

    async fn bookmark(&self, _token: &str, user_id: &str, tweet_id: &str) -> Result<()> {
        self.record(TwitterCall::Bookmark {
            user_id: user_id.to_string(),
            tweet_id: tweet_id.to_string(),
        })
    }

    async fn remove_bookmark(&self, _token: &str, user_id: &str, tweet_id: &str) -> Result<()> {
        self.record(TwitterCall::RemoveBookmark {
            user_id: user_id.to_string(),
            tweet_id: tweet_id.to_string(),
        })
    }

    async fn refresh_token(
        &self,
        _app: &TwitterAppConfig,
        refresh_token: &str,
    ) -> Result<OAuthToken> {
        self.record(TwitterCall::RefreshToken {
            refresh_token: refresh_token.to_string(),
        })?;
        Ok(OAuthToken {
            access_token: "tw-access-refreshed".to_string(),
            refresh_token: Some("tw-refresh-rotated".to_string()),
            expires_in: Some(7200),
            scope: None,
            token_type: Some("bearer".to_string()),
        })
    }
}

// =============================================================================
// Mock Bluesky API
// =============================================================================

/// A recorded Bluesky API call.
#[derive(Debug, Clone, PartialEq)]
pub enum BlueskyCall {
    CreateSession { identifier: String },
    RefreshSession,
    CreateRecord { collection: String, record: Value },
    DeleteRecord { collection: String, rkey: String },
    UploadBlob { mime_type: String, size: usize },
    ResolveHandle { handle: String },
    CreateBookmark { uri: String },
    DeleteBookmark { uri: String },
}

pub struct MockBlueskyApi {
    calls: Arc<Mutex<Vec<BlueskyCall>>>,
    failures: Arc<Mutex<Vec<BlueskyError>>>,
    handles: Arc<Mutex<HashMap<String, String>>>,
    next_rkey: AtomicU64,
}

impl MockBlueskyApi {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(Vec::new())),
            handles: Arc::new(Mutex::new(HashMap::new())),
            next_rkey: AtomicU64::new(1),
        }
    }

    /// Make `handle` resolve to `did`; unknown handles fail to resolve.
    pub fn with_handle(self, handle: &str, did: &str) -> Self {
        self.handles
            .lock()
            .unwrap()
            .insert(handle.to_string(), did.to_string());
        self
    }

    /// Queue an API error for the next call.
    pub fn fail_next(&self, status: u16, error: Option<&str>, message: &str) {
        self.failures.lock().unwrap().push(BlueskyError::Api {
            status,
            error: error.map(str::to_string),
            message: message.to_string(),
        });
    }

    pub fn calls(&self) -> Vec<BlueskyCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Records created in `collection`, in order.
    pub fn created_records(&self, collection: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                BlueskyCall::CreateRecord {
                    collection: c,
                    record,
                } if c == collection => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: BlueskyCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        let mut failures = self.failures.lock().unwrap();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.remove(0).into())
        }
    }

    fn session(access_jwt: &str) -> Session {
        Session {
            access_jwt: access_jwt.to_string(),
            refresh_jwt: "bsky-refresh-rotated".to_string(),
            handle: "tester.bsky.social".to_string(),
            did: TEST_BLUESKY_DID.to_string(),
        }
    }
}

impl Default for MockBlueskyApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseBlueskyApi for MockBlueskyApi {
    async fn create_session(&self, identifier: &str, _password: &str) -> Result<Session> {
        self.record(BlueskyCall::CreateSession {
            identifier: identifier.to_string(),
        })?;
        Ok(Self::session("bsky-access-new"))
    }

    async fn refresh_session(&self, _refresh_jwt: &str) -> Result<Session> {
        self.record(BlueskyCall::RefreshSession)?;
        Ok(Self::session("bsky-access-refreshed"))
    }

    async fn create_record(
        &self,
        _access_jwt: &str,
        repo: &str,
        collection: &str,
        record: &Value,
    ) -> Result<StrongRef> {
        self.record(BlueskyCall::CreateRecord {
            collection: collection.to_string(),
            record: record.clone(),
        })?;
        let rkey = self.next_rkey.fetch_add(1, Ordering::SeqCst);
        Ok(StrongRef {
            uri: format!("at://{}/{}/rk{}", repo, collection, rkey),
            cid: format!("bafycid{}", rkey),
        })
    }

    async fn delete_record(
        &self,
        _access_jwt: &str,
        _repo: &str,
        collection: &str,
        rkey: &str,
    ) -> Result<()> {
        self.record(BlueskyCall::DeleteRecord {
            collection: collection.to_string(),
            rkey: rkey.to_string(),
        })
    }

    async fn upload_blob(
        &self,
        _access_jwt: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<Value> {
        self.record(BlueskyCall::UploadBlob {
            mime_type: mime_type.to_string(),
            size: bytes.len(),
        })?;
        Ok(json!({
            "$type": "blob",
            "ref": {"$link": "bafkblob"},
            "mimeType": mime_type,
            "size": bytes.len(),
        }))
    }

    async fn resolve_handle(&self, handle: &str) -> Result<String> {
        self.record(BlueskyCall::ResolveHandle {
            handle: handle.to_string(),
        })?;
        match self.handles.lock().unwrap().get(handle) {
            Some(did) => Ok(did.clone()),
            None => Err(BlueskyError::Api {
                status: 400,
                error: Some("InvalidRequest".to_string()),
                message: "Unable to resolve handle".to_string(),
            }
            .into()),
        }
    }

    async fn create_bookmark(&self, _access_jwt: &str, subject: &StrongRef) -> Result<()> {
        self.record(BlueskyCall::CreateBookmark {
            uri: subject.uri.clone(),
        })
    }

    async fn delete_bookmark(&self, _access_jwt: &str, uri: &str) -> Result<()> {
        self.record(BlueskyCall::DeleteBookmark {
            uri: uri.to_string(),
        })
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub store: Arc<InMemorySyncStore>,
    pub posts: Arc<MockPostReader>,
    pub entities: Arc<MockEntityReader>,
    pub media: Arc<MockMediaFetcher>,
    pub federation: Arc<MockFederation>,
    pub twitter: Arc<MockTwitterApi>,
    pub bluesky: Arc<MockBlueskyApi>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemorySyncStore::new()),
            posts: Arc::new(MockPostReader::new()),
            entities: Arc::new(MockEntityReader::new()),
            media: Arc::new(MockMediaFetcher::new()),
            federation: Arc::new(MockFederation::new()),
            twitter: Arc::new(MockTwitterApi::new()),
            bluesky: Arc::new(MockBlueskyApi::new()),
        }
    }

    /// Set a mock media fetcher
    pub fn mock_media(mut self, media: MockMediaFetcher) -> Self {
        self.media = Arc::new(media);
        self
    }

    /// Set a mock Bluesky API
    pub fn mock_bluesky(mut self, bluesky: MockBlueskyApi) -> Self {
        self.bluesky = Arc::new(bluesky);
        self
    }

    /// Enable both platforms for `user_id` with valid, non-expiring tokens.
    pub fn link_accounts(&self, user_id: UserId) {
        self.store
            .enable(user_id, &[Platform::Twitter, Platform::Bluesky]);
        self.store.insert_tokens(
            user_id,
            Platform::Twitter,
            PlatformTokens {
                access_token: "tw-access".to_string(),
                refresh_token: Some("tw-refresh".to_string()),
                expires_at: None,
                account_id: Some(TEST_TWITTER_ACCOUNT.to_string()),
                handle: Some("tester".to_string()),
            },
        );
        self.store.insert_tokens(
            user_id,
            Platform::Bluesky,
            PlatformTokens {
                access_token: "bsky-access".to_string(),
                refresh_token: Some("bsky-refresh".to_string()),
                expires_at: None,
                account_id: Some(TEST_BLUESKY_DID.to_string()),
                handle: Some("tester.bsky.social".to_string()),
            },
        );
    }

    /// Link resolver over the mock post and entity readers.
    pub fn link_resolver(&self) -> HomeLinkResolver {
        HomeLinkResolver::new(
            TEST_HOME_BASE_URL,
            TEST_ASSET_BASE_URL,
            self.posts.clone(),
            self.entities.clone(),
        )
    }

    /// Build the SyncDeps container backed by these mocks.
    pub fn deps(&self) -> SyncDeps {
        SyncDeps::builder()
            .posts(self.posts.clone())
            .refs(self.store.clone())
            .credentials(self.store.clone())
            .settings(self.store.clone())
            .audit(self.store.clone())
            .links(Arc::new(self.link_resolver()))
            .media(self.media.clone())
            .federation(self.federation.clone())
            .twitter(self.twitter.clone())
            .bluesky(self.bluesky.clone())
            .asset_base_url(TEST_ASSET_BASE_URL)
            .build()
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
