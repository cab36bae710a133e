//! In-memory broker with scripted responses; records every call it receives.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use outreach_core::domain::connection::ConnectionApp;
use serde_json::{Map, Value};

use crate::client::{
    ActionResponse, BrokerAction, BrokerError, ConnectedAccount, InitiatedConnection,
    IntegrationBroker,
};

#[derive(Clone, Debug, PartialEq)]
pub struct ExecutedAction {
    pub action: String,
    pub input: Value,
    pub entity_id: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionCall {
    pub app: ConnectionApp,
    pub entity_id: String,
    pub params: Map<String, Value>,
}

pub struct InMemoryBroker {
    connection: Mutex<Result<InitiatedConnection, BrokerError>>,
    accounts: Mutex<HashMap<String, ConnectedAccount>>,
    actions: Mutex<HashMap<String, Result<ActionResponse, BrokerError>>>,
    catalog: Mutex<Result<Vec<BrokerAction>, BrokerError>>,
    executed: Mutex<Vec<ExecutedAction>>,
    connections: Mutex<Vec<ConnectionCall>>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self {
            connection: Mutex::new(Ok(InitiatedConnection::default())),
            accounts: Mutex::new(HashMap::new()),
            actions: Mutex::new(HashMap::new()),
            catalog: Mutex::new(Ok(Vec::new())),
            executed: Mutex::new(Vec::new()),
            connections: Mutex::new(Vec::new()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connection(self, result: Result<InitiatedConnection, BrokerError>) -> Self {
        *lock(&self.connection) = result;
        self
    }

    pub fn with_account(self, id: &str, status: &str) -> Self {
        lock(&self.accounts).insert(
            id.to_string(),
            ConnectedAccount { id: id.to_string(), status: Some(status.to_string()) },
        );
        self
    }

    pub fn with_action(self, action: &str, result: Result<ActionResponse, BrokerError>) -> Self {
        lock(&self.actions).insert(action.to_string(), result);
        self
    }

    pub fn with_catalog(self, result: Result<Vec<BrokerAction>, BrokerError>) -> Self {
        *lock(&self.catalog) = result;
        self
    }

    pub fn executed(&self) -> Vec<ExecutedAction> {
        lock(&self.executed).clone()
    }

    pub fn connection_calls(&self) -> Vec<ConnectionCall> {
        lock(&self.connections).clone()
    }
}

#[async_trait]
impl IntegrationBroker for InMemoryBroker {
    async fn initiate_connection(
        &self,
        app: ConnectionApp,
        entity_id: &str,
        params: Map<String, Value>,
    ) -> Result<InitiatedConnection, BrokerError> {
        lock(&self.connections).push(ConnectionCall { app, entity_id: entity_id.to_string(), params });
        lock(&self.connection).clone()
    }

    async fn get_connected_account(&self, id: &str) -> Result<ConnectedAccount, BrokerError> {
        lock(&self.accounts).get(id).cloned().ok_or_else(|| BrokerError::Api {
            status: 404,
            body: format!("connected account {id} not found"),
        })
    }

    async fn execute_action(
        &self,
        action: &str,
        input: Value,
        entity_id: &str,
    ) -> Result<ActionResponse, BrokerError> {
        lock(&self.executed).push(ExecutedAction {
            action: action.to_string(),
            input,
            entity_id: entity_id.to_string(),
        });
        lock(&self.actions).get(action).cloned().unwrap_or_else(|| {
            Err(BrokerError::Api { status: 404, body: format!("action {action} not found") })
        })
    }

    async fn list_actions(&self, _app: Option<ConnectionApp>) -> Result<Vec<BrokerAction>, BrokerError> {
        lock(&self.catalog).clone()
    }
}
