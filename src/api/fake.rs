//! Scripted in-memory backend for browser tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use super::client::Backend;
use super::error::ApiError;
use super::types::{ConversationDetail, ConversationPage, FacetCounts, Stats};
use crate::state::FilterSet;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Filters,
    Stats,
    Conversations(Vec<(&'static str, String)>),
    Conversation(String),
    Update(String, Value),
}

#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<Call>>,
    pub facets: Mutex<FacetCounts>,
    pub stats: Mutex<Stats>,
    pub page: Mutex<ConversationPage>,
    pub details: Mutex<HashMap<String, ConversationDetail>>,
    /// Endpoint name -> error text returned as `success: false`.
    pub rejections: Mutex<HashMap<&'static str, String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl FakeBackend {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn reject(&self, endpoint: &'static str, error: &str) {
        self.rejections
            .lock()
            .unwrap()
            .insert(endpoint, error.to_string());
    }

    pub fn accept(&self, endpoint: &'static str) {
        self.rejections.lock().unwrap().remove(endpoint);
    }

    /// Hold the detail reply for `session_id` until the returned gate is notified.
    pub fn gate(&self, session_id: &str) -> Arc<Notify> {
        self.gates
            .lock()
            .unwrap()
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, endpoint: &'static str) -> Result<(), ApiError> {
        match self.rejections.lock().unwrap().get(endpoint) {
            Some(error) => Err(ApiError::Rejected(error.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn filters(&self) -> Result<FacetCounts, ApiError> {
        self.record(Call::Filters);
        self.check("filters")?;
        Ok(self.facets.lock().unwrap().clone())
    }

    async fn stats(&self) -> Result<Stats, ApiError> {
        self.record(Call::Stats);
        self.check("stats")?;
        Ok(self.stats.lock().unwrap().clone())
    }

    async fn conversations(&self, filters: &FilterSet) -> Result<ConversationPage, ApiError> {
        self.record(Call::Conversations(filters.query_pairs()));
        self.check("conversations")?;
        Ok(self.page.lock().unwrap().clone())
    }

    async fn conversation(&self, session_id: &str) -> Result<ConversationDetail, ApiError> {
        self.record(Call::Conversation(session_id.to_string()));
        let gate = self.gates.lock().unwrap().get(session_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check("conversation")?;
        self.details
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .ok_or_else(|| ApiError::Rejected("session not found".into()))
    }

    async fn update(&self, session_id: &str, body: &Value) -> Result<(), ApiError> {
        self.record(Call::Update(session_id.to_string(), body.clone()));
        self.check("update")
    }
}
