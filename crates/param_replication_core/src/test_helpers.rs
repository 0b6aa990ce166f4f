//! Test helpers for exercising the replicator without a remote store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::contract::{Parameter, ParameterWrite, PutReceipt};
use crate::store::{ParameterStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Get,
    Put,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get(String),
    Put(String),
    Delete(String),
}

/// A parameter store held in memory that records every call it receives.
///
/// Versions start at 1 per name and increase on every accepted write, the way
/// Parameter Store numbers them.
#[derive(Default)]
pub struct InMemoryParameterStore {
    parameters: Mutex<BTreeMap<String, Parameter>>,
    calls: Mutex<Vec<StoreCall>>,
    writes: Mutex<Vec<ParameterWrite>>,
    failures: Mutex<HashMap<StoreOperation, StoreError>>,
}

impl InMemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a parameter in the store without recording a call.
    pub fn seed(&self, parameter: Parameter) {
        self.parameters
            .lock()
            .expect("poisoned mutex")
            .insert(parameter.name.clone(), parameter);
    }

    /// Makes the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: StoreOperation, error: StoreError) {
        self.failures
            .lock()
            .expect("poisoned mutex")
            .insert(operation, error);
    }

    pub fn stored(&self, name: &str) -> Option<Parameter> {
        self.parameters
            .lock()
            .expect("poisoned mutex")
            .get(name)
            .cloned()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().expect("poisoned mutex").clone()
    }

    pub fn writes(&self) -> Vec<ParameterWrite> {
        self.writes.lock().expect("poisoned mutex").clone()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().expect("poisoned mutex").push(call);
    }

    fn take_failure(&self, operation: StoreOperation) -> Option<StoreError> {
        self.failures
            .lock()
            .expect("poisoned mutex")
            .remove(&operation)
    }
}

#[async_trait]
impl ParameterStore for InMemoryParameterStore {
    async fn get(&self, name: &str) -> Result<Parameter, StoreError> {
        self.record(StoreCall::Get(name.to_string()));
        if let Some(error) = self.take_failure(StoreOperation::Get) {
            return Err(error);
        }

        self.stored(name)
            .ok_or_else(|| StoreError::not_found(name))
    }

    async fn put(&self, write: &ParameterWrite) -> Result<PutReceipt, StoreError> {
        self.record(StoreCall::Put(write.name.clone()));
        if let Some(error) = self.take_failure(StoreOperation::Put) {
            return Err(error);
        }

        let mut parameters = self.parameters.lock().expect("poisoned mutex");
        let previous_version = match parameters.get(&write.name) {
            Some(_) if !write.overwrite => {
                return Err(StoreError::other(format!(
                    "parameter {} already exists",
                    write.name
                )));
            }
            Some(existing) => existing.version.unwrap_or(0),
            None => 0,
        };
        let version = previous_version + 1;

        parameters.insert(
            write.name.clone(),
            Parameter {
                name: write.name.clone(),
                value: write.value.clone(),
                kind: write.kind.clone(),
                data_type: write.data_type.clone(),
                version: Some(version),
            },
        );
        self.writes
            .lock()
            .expect("poisoned mutex")
            .push(write.clone());

        Ok(PutReceipt {
            version,
            tier: None,
        })
    }

    async fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.record(StoreCall::Delete(name.to_string()));
        if let Some(error) = self.take_failure(StoreOperation::Delete) {
            return Err(error);
        }

        self.parameters
            .lock()
            .expect("poisoned mutex")
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(name))
    }
}
