//! The directory service: dispatches parsed actions onto the store.
//!
//! This is transport-agnostic. A collaborating HTTP (or other) frontend
//! hands in the raw request body plus a [`RequestContext`] and ships the
//! resulting [`Response`] back with the status it suggests.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde_json::{json, Value};
use tracing::{info, warn};

use signpost_core::{
    is_valid_key_hex, normalize_bio, validate_name, Authority, Identity, ValidationError,
    BIO_LIMIT, NAME_LIMIT_HARD,
};
use signpost_proto::{
    bind_response, parse_request, Action, ProtoError, PublishPayload, Response, SealedEnvelope,
    StatusCode, UnpublishPayload,
};
use signpost_store::{DirectoryStore, NewRecord, UpsertOutcome};

use crate::config::DirectoryConfig;
use crate::error::{Result, ServiceError};
use crate::password;
use crate::ratelimit::RateLimiter;

/// Records per page for search and public listing.
pub const PAGE_SIZE: u32 = 30;

/// Facts about the request the transport layer knows.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    /// Source address, for rate limiting.
    pub source: IpAddr,
    /// Whether the request arrived over a secure transport.
    pub secure: bool,
}

/// The name directory.
pub struct Directory<S> {
    authority: Authority,
    store: S,
    config: DirectoryConfig,
    /// `None` in sandbox mode.
    limiter: Option<RateLimiter>,
    started_at: Instant,
    requests_serviced: AtomicU64,
}

impl<S: DirectoryStore> Directory<S> {
    pub fn new(authority: Authority, store: S, config: DirectoryConfig) -> Self {
        let limiter = if config.sandbox {
            None
        } else {
            Some(RateLimiter::new())
        };
        Self {
            authority,
            store,
            config,
            limiter,
            started_at: Instant::now(),
            requests_serviced: AtomicU64::new(0),
        }
    }

    /// The authority's public encryption key, for client configuration.
    pub fn public_encryption_key(&self) -> String {
        self.authority.public_encryption_key()
    }

    /// The authority's public verify key, for record verification.
    pub fn public_verify_key(&self) -> String {
        self.authority.public_verify_key()
    }

    /// Process one raw API request body.
    ///
    /// Never fails: every error becomes a response with the matching
    /// status code, and memorabilia binding is attached whenever the
    /// outer envelope parsed.
    pub async fn handle(&self, body: &str, ctx: &RequestContext) -> Response {
        self.requests_serviced.fetch_add(1, Ordering::Relaxed);

        let (action, envelope) = match parse_request(body) {
            Ok(parsed) => parsed,
            Err(ProtoError::UnrecognizedAction(code)) => {
                warn!(code, "unrecognized action");
                return Response::error(StatusCode::MethodUnsupported);
            }
            Err(_) => return Response::error(StatusCode::BadPayload),
        };

        let binding = bind_response(&envelope, &self.authority);
        let response = match self.dispatch(action, &envelope, ctx).await {
            Ok(response) => response,
            Err(e) => {
                if let ServiceError::Store(inner) = &e {
                    warn!(error = %inner, "store failure while handling request");
                }
                Response::error(e.status())
            }
        };
        response.bind(binding)
    }

    async fn dispatch(&self, action: Action, envelope: &Value, ctx: &RequestContext) -> Result<Response> {
        if self.config.secure_mode && !ctx.secure {
            return Err(ServiceError::NotSecure);
        }

        match action {
            Action::Publish => self.publish(envelope, ctx).await,
            Action::Unpublish => self.unpublish(envelope).await,
            Action::Lookup => self.lookup(envelope).await,
            Action::Status => self.status().await,
            Action::ReverseLookup => self.reverse_lookup(envelope).await,
            Action::Search => self.search(envelope).await,
        }
    }

    async fn publish(&self, envelope: &Value, ctx: &RequestContext) -> Result<Response> {
        if let Some(limiter) = &self.limiter {
            limiter.check(ctx.source)?;
        }

        let sealed = SealedEnvelope::from_value(envelope)?;
        let clear = sealed.open(&self.authority)?;
        let payload: PublishPayload =
            serde_json::from_value(clear).map_err(|_| ServiceError::BadPayload)?;

        if !signpost_core::is_fresh(payload.timestamp, now_secs()) {
            warn!("rejecting publish: stale timestamp");
            return Err(ValidationError::Stale.into());
        }

        let name = payload.name.to_lowercase();
        if name.is_empty() {
            return Err(ServiceError::InvalidName);
        }
        validate_name(&name)?;

        let bio = normalize_bio(&payload.bio);
        if bio.len() > BIO_LIMIT {
            return Err(ServiceError::BadPayload);
        }

        // Checksum failures are indistinguishable from other bad input.
        let identity = Identity::parse(&payload.tox_id.to_uppercase())
            .map_err(|_| ServiceError::BadPayload)?;

        // A brand-new name gets a management password; republishes keep
        // the stored hash.
        let (cleartext_password, password_hash) = match self.store.get_by_name(&name).await? {
            Some(_) => (None, None),
            None => {
                let generated = password::generate_password();
                let hash = password::hash_password(&generated);
                (Some(generated), Some(hash))
            }
        };

        let signature = signpost_core::sign_record(
            &self.authority,
            &name,
            &identity.public_key_hex(),
            &identity.pin_hex(),
            &identity.checksum_hex(),
        )
        .map_err(|_| ServiceError::BadPayload)?;

        let outcome = self
            .store
            .upsert(NewRecord {
                name: name.clone(),
                public_key: identity.public_key_hex(),
                auth_key: sealed.auth_key(),
                pin: identity.pin_hex(),
                checksum: identity.checksum_hex(),
                bio,
                // Negative privacy values clamp to discoverable.
                privacy: payload.privacy.max(0),
                password_hash,
                signature,
            })
            .await?;

        match outcome {
            UpsertOutcome::Created => {
                info!(%name, "registered");
                Ok(Response::ok().field(
                    "password",
                    cleartext_password.map(Value::String).unwrap_or(Value::Null),
                ))
            }
            UpsertOutcome::Updated => {
                info!(%name, "republished");
                Ok(Response::ok().field("password", Value::Null))
            }
            UpsertOutcome::NameTaken => Err(ServiceError::NameTaken),
            UpsertOutcome::DuplicateIdentity => Err(ServiceError::DuplicateIdentity),
        }
    }

    async fn unpublish(&self, envelope: &Value) -> Result<Response> {
        let sealed = SealedEnvelope::from_value(envelope)?;
        let clear = sealed.open(&self.authority)?;
        let payload: UnpublishPayload =
            serde_json::from_value(clear).map_err(|_| ServiceError::BadPayload)?;

        if !is_valid_key_hex(&payload.public_key) {
            return Err(ServiceError::BadPayload);
        }
        if !signpost_core::is_fresh(payload.timestamp, now_secs()) {
            warn!("rejecting unpublish: stale timestamp");
            return Err(ValidationError::Stale.into());
        }

        // Releasing a key that owns nothing still answers ok; the
        // snapshot is only for the audit log.
        match self.store.release(&sealed.auth_key()).await? {
            Some(record) => info!(name = %record.name, "released"),
            None => info!("release for unknown auth key"),
        }
        Ok(Response::ok())
    }

    async fn lookup(&self, envelope: &Value) -> Result<Response> {
        let name = envelope
            .get("name")
            .and_then(Value::as_str)
            .ok_or(ServiceError::BadPayload)?;
        if name.is_empty() || name.starts_with('@') || name.ends_with('@') {
            return Err(ServiceError::BadPayload);
        }

        let full = name.to_lowercase();
        let (local, domain) = match full.split_once('@') {
            Some((local, domain)) => (local, domain),
            None => (full.as_str(), self.config.registration_domain.as_str()),
        };
        if domain != self.config.registration_domain {
            // Federation with other authorities is a frontend concern.
            return Err(ServiceError::LookupFailed);
        }

        let record = self
            .store
            .get_by_name(local)
            .await?
            .ok_or(ServiceError::NoSuchUser)?;

        Ok(Response::ok()
            .field("name", record.name.clone())
            .field("regdomain", domain)
            .field("url", format!("tox:{}@{}", record.name, domain))
            .field("tox_id", record.identity_string())
            .field("signature", record.signature.clone())
            .field("source", 1)
            .field(
                "verify",
                json!({"status": 1, "detail": "Good (signed by local authority)"}),
            )
            .field("version", "Tox V3 (local)"))
    }

    async fn reverse_lookup(&self, envelope: &Value) -> Result<Response> {
        let id = envelope
            .get("id")
            .and_then(Value::as_str)
            .ok_or(ServiceError::BadPayload)?;
        if !is_valid_key_hex(id) {
            return Err(ServiceError::BadPayload);
        }

        let record = self
            .store
            .get_by_key(&id.to_uppercase())
            .await?
            .ok_or(ServiceError::NoSuchUser)?;
        Ok(Response::ok().field("name", record.name))
    }

    async fn search(&self, envelope: &Value) -> Result<Response> {
        let query = envelope
            .get("name")
            .and_then(Value::as_str)
            .ok_or(ServiceError::BadPayload)?;
        if query.is_empty() || query.len() > NAME_LIMIT_HARD {
            return Err(ServiceError::InvalidName);
        }
        let page = envelope
            .get("page")
            .and_then(Value::as_u64)
            .ok_or(ServiceError::BadPayload)?;
        let page = u32::try_from(page).map_err(|_| ServiceError::BadPayload)?;

        let hits = self.store.search(query, page, PAGE_SIZE).await?;
        let users: Vec<Value> = hits
            .into_iter()
            .map(|r| json!({"name": r.name, "bio": r.bio}))
            .collect();
        Ok(Response::ok().field("users", users))
    }

    async fn status(&self) -> Result<Response> {
        let mut rng = rand::thread_rng();
        let serviced = self.requests_serviced.load(Ordering::Relaxed);
        let count = self.store.count_records().await?;

        Ok(Response::ok()
            .field("ut", self.started_at.elapsed().as_secs())
            .field("rs", fuzz(serviced, &mut rng))
            .field("uc", fuzz(count, &mut rng)))
    }

    /// One page of discoverable records, for the public listing.
    pub async fn list_page(&self, page: u32) -> Result<Vec<signpost_core::Record>> {
        Ok(self.store.list_page(page, PAGE_SIZE).await?)
    }

    /// Authenticate a record owner by name and management password.
    ///
    /// Used by the web-form surface for edits and deletes.
    pub async fn authenticate(&self, name: &str, candidate: &str) -> Result<signpost_core::Record> {
        let record = self
            .store
            .get_by_name(&name.to_lowercase())
            .await?
            .ok_or(ServiceError::NoSuchUser)?;
        let ok = record
            .password_hash
            .as_deref()
            .map(|stored| password::verify_password(stored, candidate))
            .unwrap_or(false);
        if !ok {
            return Err(ServiceError::BadPassword);
        }
        Ok(record)
    }

    /// Delete a record after password authentication.
    pub async fn remove(&self, name: &str, candidate: &str) -> Result<()> {
        let record = self.authenticate(name, candidate).await?;
        self.store.release(&record.auth_key).await?;
        info!(%name, "removed via management surface");
        Ok(())
    }
}

/// Blur a counter for public display: add ±100 jitter, round up to the
/// next hundred, floor at zero.
fn fuzz<R: Rng>(value: u64, rng: &mut R) -> u64 {
    let jittered = value as i64 + rng.gen_range(-100..=100);
    if jittered <= 0 {
        0
    } else {
        ((jittered as u64) + 99) / 100 * 100
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
