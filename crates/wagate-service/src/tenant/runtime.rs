//! Tenant runtime: one tenant's session, cache and fan-out.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock, Weak};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use wagate_cache::{ChatTitleCache, MessageCache};
use wagate_core::error::AppError;
use wagate_core::result::AppResult;
use wagate_database::TenantRepository;
use wagate_entity::message::{Chat, MessageRecord, MessageType, READ_RECEIPT_ID};
use wagate_entity::tenant::{TenantConfig, TenantStatus};
use wagate_entity::webhook::{WebhookConfig, WebhookOption};
use wagate_realtime::PushHub;
use wagate_worker::{DeliveryMetrics, EventSubscriber};

use super::options::{GatewaySettings, TenantOptions};
use super::synopsis::synopsis;
use crate::dispatch::{HandlerRegistry, SharedWid, WebhookDispatcher};
use crate::protocol::{ConnectionFactory, ProtocolConnection, ProtocolEvent};

/// Chat used for messages the gateway itself generates.
pub const SYSTEM_CHAT_ID: &str = "system";
const SYSTEM_CHAT_TITLE: &str = "Internal System Message";

/// Shared collaborators handed to every tenant runtime.
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    pub repository: Arc<dyn TenantRepository>,
    pub push: Arc<PushHub>,
    pub client: reqwest::Client,
    pub settings: Arc<GatewaySettings>,
    pub metrics: Arc<DeliveryMetrics>,
}

/// Summary of a tenant for the API.
#[derive(Debug, Clone, Serialize)]
pub struct TenantInfo {
    pub token: String,
    pub status: TenantStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wid: Option<String>,
    pub verified: bool,
    pub messages: u64,
    pub groups: bool,
    pub broadcasts: bool,
    #[serde(rename = "readreceipts")]
    pub read_receipts: bool,
    pub calls: bool,
    #[serde(rename = "readupdate")]
    pub read_update: bool,
    pub webhooks: Vec<WebhookConfig>,
}

/// Outcome of a revoke request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RevokeReport {
    /// Ids the network accepted.
    pub revoked: Vec<String>,
    /// Ids that failed, with the reason.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
}

/// Everything the gateway keeps for one tenant.
#[derive(Debug)]
pub struct TenantRuntime {
    token: String,
    config: RwLock<TenantConfig>,
    status: RwLock<TenantStatus>,
    wid: SharedWid,
    cache: MessageCache,
    titles: ChatTitleCache,
    handlers: HandlerRegistry,
    webhooks: DashMap<String, Arc<WebhookDispatcher>>,
    connection: RwLock<Option<Arc<dyn ProtocolConnection>>>,
    pump: Mutex<Option<CancellationToken>>,
    cancel: CancellationToken,
    ctx: RuntimeContext,
}

impl TenantRuntime {
    /// Create a stopped runtime for `config`.
    ///
    /// All background work of the runtime stops when `parent` is cancelled.
    pub fn new(config: TenantConfig, ctx: RuntimeContext, parent: &CancellationToken) -> Arc<Self> {
        let cancel = parent.child_token();
        let handlers = HandlerRegistry::new(
            config.token.clone(),
            ctx.push.clone(),
            &cancel,
            ctx.settings.webhook.queue_capacity,
            ctx.metrics.clone(),
        );

        Arc::new(Self {
            token: config.token.clone(),
            status: RwLock::new(config.initial_status()),
            wid: Arc::new(RwLock::new(config.wid().map(str::to_string))),
            cache: MessageCache::new(),
            titles: ChatTitleCache::new(&ctx.settings.cache),
            handlers,
            webhooks: DashMap::new(),
            connection: RwLock::new(None),
            pump: Mutex::new(None),
            config: RwLock::new(config),
            cancel,
            ctx,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Current lifecycle state.
    pub fn status(&self) -> TenantStatus {
        *self.status.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of the persisted configuration.
    pub fn config(&self) -> TenantConfig {
        self.config.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Session identity, once paired.
    pub fn wid(&self) -> Option<String> {
        self.wid.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Effective options after applying global defaults.
    pub fn options(&self) -> TenantOptions {
        TenantOptions::resolve(&self.ctx.settings.whatsapp, &self.config())
    }

    pub fn cache(&self) -> &MessageCache {
        &self.cache
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Summary for the API.
    pub fn info(&self) -> TenantInfo {
        let config = self.config();
        let options = self.options();
        TenantInfo {
            token: self.token.clone(),
            status: self.status(),
            wid: self.wid(),
            verified: config.verified,
            messages: self.cache.count(),
            groups: options.groups,
            broadcasts: options.broadcasts,
            read_receipts: options.read_receipts,
            calls: options.calls,
            read_update: options.read_update,
            webhooks: self.webhooks(),
        }
    }

    /// Move to `next` if the lifecycle allows it.
    pub fn set_status(&self, next: TenantStatus) -> bool {
        let mut status = self.status.write().unwrap_or_else(|e| e.into_inner());
        let current = *status;
        if current == next {
            return true;
        }
        if !current.can_transition_to(next) {
            warn!(token = %self.token, from = %current, to = %next, "Ignoring invalid status transition");
            return false;
        }
        *status = next;
        info!(token = %self.token, from = %current, to = %next, "Tenant status changed");
        true
    }

    fn set_wid(&self, wid: Option<String>) {
        *self.wid.write().unwrap_or_else(|e| e.into_inner()) = wid;
    }

    fn connection(&self) -> Option<Arc<dyn ProtocolConnection>> {
        self.connection
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn take_connection(&self) -> Option<Arc<dyn ProtocolConnection>> {
        self.connection
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    fn ready_connection(&self) -> AppResult<Arc<dyn ProtocolConnection>> {
        let status = self.status();
        if !status.is_ready() {
            return Err(AppError::service_unavailable(format!(
                "tenant is not ready ({status})"
            )));
        }
        self.connection()
            .ok_or_else(|| AppError::service_unavailable("tenant has no active connection"))
    }

    async fn update_config<F>(&self, apply: F) -> AppResult<TenantConfig>
    where
        F: FnOnce(&mut TenantConfig),
    {
        let updated = {
            let mut config = self.config.write().unwrap_or_else(|e| e.into_inner());
            apply(&mut config);
            config.updated_at = Utc::now();
            config.clone()
        };
        self.ctx.repository.save(&updated).await?;
        Ok(updated)
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Open a protocol session and start consuming its events.
    pub async fn start(self: &Arc<Self>, factory: &dyn ConnectionFactory) -> AppResult<()> {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = factory.connect(&self.config(), tx).await?;
        if let Some(wid) = connection.wid() {
            self.set_wid(Some(wid));
        }

        let pump_token = self.cancel.child_token();
        let previous_pump = self
            .pump
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(pump_token.clone());
        if let Some(previous) = previous_pump {
            previous.cancel();
        }

        let previous_connection = self
            .connection
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .replace(connection);
        if let Some(previous) = previous_connection {
            previous.disconnect().await;
        }

        tokio::spawn(Self::pump(Arc::downgrade(self), rx, pump_token));
        info!(token = %self.token, "Tenant started");
        Ok(())
    }

    async fn pump(
        runtime: Weak<Self>,
        mut events: mpsc::UnboundedReceiver<ProtocolEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = events.recv() => match next {
                    Some(event) => event,
                    None => break,
                },
            };
            let Some(runtime) = runtime.upgrade() else {
                break;
            };
            runtime.handle_event(event).await;
        }
        debug!("Tenant event pump stopped");
    }

    /// Close the protocol session, keeping subscribers and cache.
    pub async fn stop(&self) {
        let pump = self.pump.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(pump) = pump {
            pump.cancel();
        }
        if let Some(connection) = self.take_connection() {
            connection.disconnect().await;
        }
        self.set_status(TenantStatus::Disconnected);
    }

    /// Invalidate the session on the network, then shut down.
    pub async fn logout(&self) {
        if let Some(connection) = self.connection() {
            if let Err(e) = connection.logout().await {
                warn!(token = %self.token, error = %e, "Network logout failed");
            }
        }
        self.shutdown().await;
    }

    /// Stop everything the runtime owns. In-flight deliveries are detached.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.handlers.shutdown();
        self.webhooks.clear();
        if let Some(connection) = self.take_connection() {
            connection.disconnect().await;
        }
        info!(token = %self.token, "Tenant shut down");
    }

    /// Record a successful pairing with `wid`.
    pub async fn pair(&self, wid: &str) -> AppResult<()> {
        let wid = wid.to_string();
        self.update_config(|config| {
            config.wid = Some(wid.clone());
            config.verified = true;
        })
        .await?;
        self.set_wid(Some(wid));
        self.set_status(TenantStatus::Ready);
        Ok(())
    }

    // ── Ingestion ──────────────────────────────────────────────────

    /// Apply one protocol event.
    pub async fn handle_event(&self, event: ProtocolEvent) {
        debug!(token = %self.token, kind = event.kind(), "Protocol event");
        match event {
            ProtocolEvent::NewMessage(record) => {
                self.ingest(record).await;
            }
            ProtocolEvent::HistoryBatch(mut records) => {
                if !self.options().history_sync {
                    debug!(token = %self.token, count = records.len(), "History sync disabled, batch ignored");
                    return;
                }
                records.sort_by(|a, b| (a.timestamp, a.key()).cmp(&(b.timestamp, b.key())));
                for record in records {
                    self.ingest(record).await;
                }
            }
            ProtocolEvent::DeliveryReceipt { chat, ids, timestamp } => {
                self.on_receipt(chat, ids, timestamp);
            }
            ProtocolEvent::CallOffer { id, from, timestamp } => {
                self.on_call(id, from, timestamp).await;
            }
            ProtocolEvent::Connected { wid } => self.on_connected(wid).await,
            ProtocolEvent::Disconnected { reason } => {
                warn!(token = %self.token, reason = %reason, "Tenant disconnected");
                self.set_status(TenantStatus::Disconnected);
            }
            ProtocolEvent::LoggedOut { reason } => self.on_logged_out(reason).await,
        }
    }

    /// Run an inbound record through the tenant filters, cache and fan-out.
    ///
    /// Returns whether subscribers were triggered.
    pub async fn ingest(&self, mut record: MessageRecord) -> bool {
        let options = self.options();
        if record.from_group() && !options.groups {
            debug!(token = %self.token, msg_id = %record.id, "Group message ignored");
            return false;
        }
        if record.from_broadcast() && !options.broadcasts {
            debug!(token = %self.token, msg_id = %record.id, "Broadcast message ignored");
            return false;
        }

        let connection = self.connection();
        if record.chat.title.is_empty() {
            if let Some(connection) = &connection {
                let chat_id = record.chat.id.clone();
                if let Some(title) = self
                    .titles
                    .get_or_fetch(&chat_id, connection.chat_title(&chat_id))
                    .await
                {
                    record.chat.title = title;
                }
            }
        }

        if !record.in_reply.is_empty() && record.synopsis.is_empty() {
            if let Some(replied) = self.cache.get(&record.in_reply) {
                record.synopsis = synopsis(&replied.text, self.ctx.settings.cache.synopsis_length);
            }
        }

        let mark_read = options.read_update
            && !record.from_me
            && !record.from_broadcast()
            && record.message_type != MessageType::System;
        let triggered = self.store(record.clone());

        if mark_read {
            if let Some(connection) = connection {
                let token = self.token.clone();
                tokio::spawn(async move {
                    if let Err(e) = connection.mark_read(&record).await {
                        warn!(token = %token, msg_id = %record.id, error = %e, "Failed to mark message as read");
                    }
                });
            }
        }
        triggered
    }

    /// Cache a record and trigger subscribers unless it is a replay.
    fn store(&self, record: MessageRecord) -> bool {
        let changed = self.cache.put(record.clone());

        let cap = self.ctx.settings.cache.max_messages;
        if cap > 0 {
            let evicted = self.cache.clean_up(cap);
            if evicted > 0 {
                debug!(token = %self.token, evicted, "Message cache trimmed");
            }
        }

        if changed || !self.ctx.settings.cache.debounce_dispatch {
            self.handlers.trigger(record);
            true
        } else {
            debug!(token = %self.token, msg_id = %record.id, "Unchanged record not re-dispatched");
            false
        }
    }

    fn on_receipt(&self, chat: Chat, ids: Vec<String>, timestamp: DateTime<Utc>) {
        if !self.options().read_receipts || ids.is_empty() {
            return;
        }
        let mut record = MessageRecord::new(READ_RECEIPT_ID, chat, MessageType::System, timestamp);
        record.text = ids.join(",");
        self.handlers.trigger(record);
    }

    async fn on_call(&self, id: String, from: Chat, timestamp: DateTime<Utc>) {
        let record = MessageRecord::new(id, from, MessageType::Call, timestamp);
        if self.options().calls {
            self.ingest(record).await;
            return;
        }

        let Some(connection) = self.connection() else {
            return;
        };
        match connection.reject_call(&record).await {
            Ok(()) => info!(token = %self.token, call_id = %record.id, "Incoming call rejected"),
            Err(e) => warn!(token = %self.token, call_id = %record.id, error = %e, "Failed to reject call"),
        }
    }

    async fn on_connected(&self, wid: String) {
        self.set_wid(Some(wid.clone()));
        let config = self.config();
        if config.wid() != Some(wid.as_str()) || !config.verified {
            let saved = self
                .update_config(|config| {
                    config.wid = Some(wid.clone());
                    config.verified = true;
                })
                .await;
            if let Err(e) = saved {
                warn!(token = %self.token, error = %e, "Failed to persist verified session");
            }
        }
        self.set_status(TenantStatus::Ready);
        self.request_history().await;
    }

    /// Resync from the oldest cached message, when history sync is on.
    async fn request_history(&self) {
        if !self.options().history_sync {
            return;
        }
        let (Some(connection), Some(anchor)) = (self.connection(), self.cache.get_oldest_unprocessed())
        else {
            return;
        };
        debug!(token = %self.token, anchor = %anchor.id, "Requesting history before anchor");
        if let Err(e) = connection.request_history(&anchor).await {
            warn!(token = %self.token, error = %e, "History request failed");
        }
    }

    async fn on_logged_out(&self, reason: String) {
        if !self.set_status(TenantStatus::LoggedOut) {
            return;
        }
        warn!(token = %self.token, reason = %reason, "Tenant logged out");
        if let Err(e) = self.update_config(|config| config.verified = false).await {
            warn!(token = %self.token, error = %e, "Failed to persist logout");
        }
        self.take_connection();

        let mut chat = Chat::new(SYSTEM_CHAT_ID);
        chat.title = SYSTEM_CHAT_TITLE.to_string();
        let id = format!("SYSTEM-{}", Uuid::new_v4().simple()).to_uppercase();
        let mut record = MessageRecord::new(id, chat, MessageType::System, Utc::now());
        record.text = if reason.is_empty() {
            "session logged out".to_string()
        } else {
            format!("session logged out: {reason}")
        };
        self.store(record);
    }

    // ── Outbound ───────────────────────────────────────────────────

    /// Send a message through the connection, then cache and dispatch it.
    ///
    /// The tenant ingestion filters do not apply to outbound records.
    pub async fn send(&self, mut record: MessageRecord) -> AppResult<MessageRecord> {
        let connection = self.ready_connection()?;
        record.from_me = true;
        record.from_internal = true;

        record.id = connection.send(&record).await?;
        if !record.has_timestamp() {
            record.timestamp = Utc::now();
        }
        if let Some(attachment) = record.attachment.as_mut() {
            attachment.content = None;
        }

        info!(token = %self.token, msg_id = %record.id, chat = %record.chat.id, "Message sent");
        self.store(record.clone());
        Ok(record)
    }

    /// Revoke one cached message, or every cached message whose id starts with `id`.
    pub async fn revoke(&self, id: &str, by_prefix: bool) -> AppResult<RevokeReport> {
        let connection = self.ready_connection()?;
        let targets: Vec<MessageRecord> = if by_prefix {
            self.cache.get_by_prefix(id)
        } else {
            self.cache.get(id).into_iter().collect()
        };

        let mut report = RevokeReport::default();
        for record in targets {
            match connection.revoke(&record).await {
                Ok(()) => report.revoked.push(record.id),
                Err(e) => {
                    warn!(token = %self.token, msg_id = %record.id, error = %e, "Revoke failed");
                    report.errors.insert(record.id, e.to_string());
                }
            }
        }
        Ok(report)
    }

    // ── Retrieval ──────────────────────────────────────────────────

    pub fn get_message(&self, id: &str) -> Option<MessageRecord> {
        self.cache.get(id)
    }

    /// Cached records newer than `since`, oldest first. Everything when `None`.
    pub fn receive(&self, since: Option<DateTime<Utc>>) -> Vec<MessageRecord> {
        match since {
            None => self.cache.get_ordered(),
            Some(since) => {
                let mut records = self.cache.get_since(since);
                records.sort_by(|a, b| (a.timestamp, a.key()).cmp(&(b.timestamp, b.key())));
                records
            }
        }
    }

    // ── Webhooks ───────────────────────────────────────────────────

    /// Register dispatchers for webhooks loaded from storage.
    pub fn attach_webhooks(&self, webhooks: Vec<WebhookConfig>) {
        for webhook in webhooks {
            self.attach(webhook);
        }
    }

    fn attach(&self, webhook: WebhookConfig) -> Arc<WebhookDispatcher> {
        // Registration happens under the shard lock so the map and the
        // handler registry always hold the same dispatcher for a url.
        match self.webhooks.entry(webhook.url.clone()) {
            Entry::Occupied(existing) => {
                existing.get().update(&webhook);
                existing.get().clone()
            }
            Entry::Vacant(slot) => {
                let dispatcher = Arc::new(WebhookDispatcher::new(
                    webhook,
                    self.ctx.client.clone(),
                    self.wid.clone(),
                ));
                self.handlers.register(dispatcher.clone());
                slot.insert(dispatcher.clone());
                dispatcher
            }
        }
    }

    /// Webhooks with their delivery state, ordered by url.
    pub fn webhooks(&self) -> Vec<WebhookConfig> {
        let mut webhooks: Vec<WebhookConfig> = self
            .webhooks
            .iter()
            .map(|entry| entry.value().config())
            .collect();
        webhooks.sort_by(|a, b| a.url.cmp(&b.url));
        webhooks
    }

    /// Persist a webhook and start dispatching to it.
    pub async fn add_or_update_webhook(&self, mut webhook: WebhookConfig) -> AppResult<WebhookConfig> {
        let url = webhook.url.trim().to_string();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::validation(format!("invalid webhook url: '{url}'")));
        }
        webhook.url = url;
        webhook.token = self.token.clone();

        self.ctx.repository.add_or_update_webhook(&webhook).await?;
        let dispatcher = self.attach(webhook);
        info!(token = %self.token, url = %dispatcher.url(), "Webhook saved");
        Ok(dispatcher.config())
    }

    /// Delete a webhook. Returns whether it existed.
    pub async fn remove_webhook(&self, url: &str) -> AppResult<bool> {
        let affected = self.ctx.repository.remove_webhook(&self.token, url).await?;
        let removed = match self.webhooks.remove(url) {
            Some((_, dispatcher)) => self.handlers.unregister(dispatcher.id()),
            None => false,
        };
        if removed || affected > 0 {
            info!(token = %self.token, url, "Webhook removed");
        }
        Ok(removed || affected > 0)
    }

    /// Advance one webhook option and persist it. Returns the new value.
    pub async fn toggle_webhook(&self, url: &str, option: WebhookOption) -> AppResult<String> {
        let dispatcher = self
            .webhooks
            .get(url)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::not_found(format!("webhook '{url}' not found")))?;

        let mut settings = dispatcher.config();
        let value = settings.toggle(option);
        self.ctx.repository.add_or_update_webhook(&settings).await?;
        dispatcher.update(&settings);

        info!(token = %self.token, url, option = option.as_str(), value = %value, "Webhook option toggled");
        Ok(value)
    }
}
