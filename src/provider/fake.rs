//! In-memory [`AgentPoolApi`] with failure injection, for unit tests.

use super::AgentPoolApi;
use crate::model::{AgentPool, AgentPoolId, ClusterId};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Get(String),
    Put(String),
    Delete(String),
    AvailableVersions,
}

#[derive(Debug, Default)]
struct Inner {
    pools: BTreeMap<String, AgentPool>,
    calls: Vec<Call>,
    /// Remaining PUT failures per pool name
    put_failures: HashMap<String, u32>,
    delete_failures: HashSet<String>,
    get_failures: HashSet<String>,
    versions: Vec<String>,
}

#[derive(Debug, Default)]
pub(crate) struct FakeAgentPools {
    inner: Mutex<Inner>,
}

impl FakeAgentPools {
    pub(crate) fn with_pools(names: &[&str]) -> Self {
        let fake = Self::default();
        for name in names {
            fake.insert(AgentPool {
                name: Some((*name).to_string()),
                ..AgentPool::default()
            });
        }
        fake
    }

    pub(crate) fn insert(&self, pool: AgentPool) {
        let name = pool.name.clone().unwrap_or_default();
        self.inner.lock().unwrap().pools.insert(name, pool);
    }

    pub(crate) fn fail_puts(&self, name: &str, times: u32) {
        self.inner
            .lock()
            .unwrap()
            .put_failures
            .insert(name.to_string(), times);
    }

    pub(crate) fn fail_deletes(&self, name: &str) {
        self.inner
            .lock()
            .unwrap()
            .delete_failures
            .insert(name.to_string());
    }

    pub(crate) fn fail_gets(&self, name: &str) {
        self.inner
            .lock()
            .unwrap()
            .get_failures
            .insert(name.to_string());
    }

    pub(crate) fn clear_failures(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.put_failures.clear();
        inner.delete_failures.clear();
        inner.get_failures.clear();
    }

    pub(crate) fn set_versions(&self, versions: &[&str]) {
        self.inner.lock().unwrap().versions = versions.iter().map(|v| (*v).to_string()).collect();
    }

    pub(crate) fn pool(&self, name: &str) -> Option<AgentPool> {
        self.inner.lock().unwrap().pools.get(name).cloned()
    }

    pub(crate) fn pool_names(&self) -> Vec<String> {
        self.inner.lock().unwrap().pools.keys().cloned().collect()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub(crate) fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    pub(crate) fn deletes(&self) -> usize {
        self.count(|call| matches!(call, Call::Delete(_)))
    }
}

#[async_trait]
impl AgentPoolApi for FakeAgentPools {
    async fn get(&self, id: &AgentPoolId) -> Result<Option<AgentPool>> {
        let mut inner = self.inner.lock().unwrap();
        let name = id.agent_pool_name.clone();
        inner.calls.push(Call::Get(name.clone()));
        if inner.get_failures.contains(&name) {
            return Err(anyhow!("GET {name}: HTTP 500 - InternalServerError"));
        }
        Ok(inner.pools.get(&name).cloned())
    }

    async fn create_or_update_then_poll(&self, id: &AgentPoolId, pool: &AgentPool) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let name = id.agent_pool_name.clone();
        inner.calls.push(Call::Put(name.clone()));
        if let Some(remaining) = inner.put_failures.get_mut(&name) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(anyhow!(
                    "PUT {name}: long-running operation Failed - AllocationFailed"
                ));
            }
        }
        let mut stored = pool.clone();
        stored.name = Some(name.clone());
        stored.id = Some(id.to_string());
        inner.pools.insert(name, stored);
        Ok(())
    }

    async fn delete_then_poll(&self, id: &AgentPoolId) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let name = id.agent_pool_name.clone();
        inner.calls.push(Call::Delete(name.clone()));
        if inner.delete_failures.contains(&name) {
            return Err(anyhow!("DELETE {name}: HTTP 409 - OperationNotAllowed"));
        }
        inner.pools.remove(&name);
        Ok(())
    }

    async fn available_versions(&self, _cluster: &ClusterId) -> Result<Vec<String>> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::AvailableVersions);
        Ok(inner.versions.clone())
    }
}
