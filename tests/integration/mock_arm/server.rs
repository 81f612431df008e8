//! Mock Azure Resource Manager server for the agentPools API
//!
//! Serves `GET`/`PUT`/`DELETE` on agent pool resource IDs (requires `api-version`):
//! - `PUT` of a new pool answers `201` with an `Azure-AsyncOperation` URL
//! - `PUT` of an existing pool answers `200` with `provisioningState: Updating` and no
//!   operation header, so the client polls the resource itself
//! - `DELETE` answers `202` with a `Location` URL, or `204` when the pool is absent
//!
//! Seeded pools carry the defaults Resource Manager fills in (`maxPods`, OS disk,
//! upgrade settings, ...). `GET .../availableAgentPoolVersions` lists the versions set
//! with [`MockArm::set_versions`]. Operations report `InProgress` once before finishing.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

const API_VERSION: &str = "2025-02-01";
const AGENT_POOL_ROUTE: &str = "/subscriptions/{subscription}/resourceGroups/{resource_group}/providers/Microsoft.ContainerService/managedClusters/{cluster}/agentPools/{pool}";
const VERSIONS_ROUTE: &str = "/subscriptions/{subscription}/resourceGroups/{resource_group}/providers/Microsoft.ContainerService/managedClusters/{cluster}/availableAgentPoolVersions";

type PoolPath = Path<(String, String, String, String)>;
type ApiQuery = Query<HashMap<String, String>>;

#[derive(Debug)]
struct Operation {
    polls_remaining: u32,
    error: Option<(String, String)>,
}

#[derive(Debug)]
struct StoredPool {
    body: Value,
    updating_polls: u32,
}

#[derive(Debug, Default)]
struct Inner {
    base_url: String,
    pools: BTreeMap<String, StoredPool>,
    operations: HashMap<String, Operation>,
    put_failures: HashMap<String, u32>,
    delete_conflicts: HashSet<String>,
    requests: Vec<String>,
    next_operation: u32,
    versions: Vec<String>,
}

impl Inner {
    fn start_operation(&mut self, error: Option<(&str, &str)>) -> String {
        self.next_operation += 1;
        let id = format!("op{}", self.next_operation);
        self.operations.insert(
            id.clone(),
            Operation {
                polls_remaining: 1,
                error: error.map(|(code, message)| (code.to_string(), message.to_string())),
            },
        );
        id
    }
}

/// Handle to a running mock server
#[derive(Debug, Clone)]
pub struct MockArm {
    inner: Arc<Mutex<Inner>>,
}

impl MockArm {
    /// Bind to an ephemeral port and serve in the background
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("Failed to read mock server address");

        let arm = Self {
            inner: Arc::new(Mutex::new(Inner {
                base_url: format!("http://{addr}"),
                versions: vec!["1.29.9".to_string(), "1.30.3".to_string()],
                ..Inner::default()
            })),
        };

        let app = Router::new()
            .route(AGENT_POOL_ROUTE, get(get_pool).put(put_pool).delete(delete_pool))
            .route(VERSIONS_ROUTE, get(get_versions))
            .route("/operations/{id}", get(get_operation))
            .route("/locations/{id}", get(get_location))
            .with_state(arm.clone());

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock server failed");
        });

        arm
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("Mock server state poisoned")
    }

    pub fn base_url(&self) -> String {
        self.lock().base_url.clone()
    }

    /// Seed an existing pool
    pub fn insert_pool(&self, name: &str, vm_size: &str) {
        self.lock().pools.insert(
            name.to_string(),
            StoredPool {
                body: json!({
                    "name": name,
                    "properties": {
                        "count": 3,
                        "vmSize": vm_size,
                        "mode": "System",
                        "osType": "Linux",
                        "osSKU": "Ubuntu",
                        "type": "VirtualMachineScaleSets",
                        "enableAutoScaling": false,
                        "maxPods": 110,
                        "osDiskSizeGB": 128,
                        "osDiskType": "Managed",
                        "kubeletDiskType": "OS",
                        "orchestratorVersion": "1.30.3",
                        "currentOrchestratorVersion": "1.30.3",
                        "upgradeSettings": { "maxSurge": "10%" }
                    }
                }),
                updating_polls: 0,
            },
        );
    }

    /// Kubernetes versions listed by `availableAgentPoolVersions`
    pub fn set_versions(&self, versions: &[&str]) {
        self.lock().versions = versions.iter().map(|v| (*v).to_string()).collect();
    }

    /// Let the next `times` PUTs of `name` fail through their async operation
    pub fn fail_puts(&self, name: &str, times: u32) {
        self.lock().put_failures.insert(name.to_string(), times);
    }

    /// Reject DELETEs of `name` with `409 OperationNotAllowed`
    pub fn conflict_deletes(&self, name: &str) {
        self.lock().delete_conflicts.insert(name.to_string());
    }

    pub fn pool_names(&self) -> Vec<String> {
        self.lock().pools.keys().cloned().collect()
    }

    pub fn pool_vm_size(&self, name: &str) -> Option<String> {
        self.lock()
            .pools
            .get(name)
            .and_then(|pool| pool.body["properties"]["vmSize"].as_str().map(str::to_string))
    }

    /// A property of a stored pool, by its Resource Manager name
    pub fn pool_property(&self, name: &str, property: &str) -> Option<Value> {
        self.lock()
            .pools
            .get(name)
            .map(|pool| pool.body["properties"][property].clone())
            .filter(|value| !value.is_null())
    }

    /// PUT and DELETE requests in arrival order, as `"PUT name"` / `"DELETE name"`
    pub fn mutations(&self) -> Vec<String> {
        self.lock()
            .requests
            .iter()
            .filter(|request| !request.starts_with("GET "))
            .cloned()
            .collect()
    }

    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }
}

fn arm_error(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "error": { "code": code, "message": message } })),
    )
        .into_response()
}

fn check_api_version(query: &HashMap<String, String>) -> Option<Response> {
    match query.get("api-version").map(String::as_str) {
        Some(API_VERSION) => None,
        _ => Some(arm_error(
            StatusCode::BAD_REQUEST,
            "InvalidApiVersionParameter",
            "The api-version query parameter is missing or unsupported.",
        )),
    }
}

async fn get_pool(
    State(arm): State<MockArm>,
    Path((_, _, _, pool)): PoolPath,
    Query(query): ApiQuery,
) -> Response {
    if let Some(response) = check_api_version(&query) {
        return response;
    }
    let mut inner = arm.lock();
    inner.requests.push(format!("GET {pool}"));

    let Some(stored) = inner.pools.get_mut(&pool) else {
        return arm_error(
            StatusCode::NOT_FOUND,
            "NotFound",
            &format!("Agent pool {pool} was not found."),
        );
    };
    let state = if stored.updating_polls > 0 {
        stored.updating_polls -= 1;
        "Updating"
    } else {
        "Succeeded"
    };
    let mut body = stored.body.clone();
    body["properties"]["provisioningState"] = json!(state);
    Json(body).into_response()
}

async fn put_pool(
    State(arm): State<MockArm>,
    Path((subscription, resource_group, cluster, pool)): PoolPath,
    Query(query): ApiQuery,
    Json(mut body): Json<Value>,
) -> Response {
    if let Some(response) = check_api_version(&query) {
        return response;
    }
    let mut inner = arm.lock();
    inner.requests.push(format!("PUT {pool}"));

    if let Some(remaining) = inner.put_failures.get_mut(&pool) {
        if *remaining > 0 {
            *remaining -= 1;
            let id = inner.start_operation(Some((
                "AllocationFailed",
                "Allocation failed. We do not have sufficient capacity for the requested VM size in this region.",
            )));
            let url = format!("{}/operations/{id}", inner.base_url);
            body["properties"]["provisioningState"] = json!("Creating");
            return (
                StatusCode::CREATED,
                [("azure-asyncoperation", url)],
                Json(body),
            )
                .into_response();
        }
    }

    body["id"] = json!(format!(
        "/subscriptions/{subscription}/resourceGroups/{resource_group}/providers/Microsoft.ContainerService/managedClusters/{cluster}/agentPools/{pool}"
    ));
    body["name"] = json!(pool);

    if inner.pools.contains_key(&pool) {
        inner.pools.insert(
            pool,
            StoredPool {
                body: body.clone(),
                updating_polls: 1,
            },
        );
        body["properties"]["provisioningState"] = json!("Updating");
        return (StatusCode::OK, Json(body)).into_response();
    }

    inner.pools.insert(
        pool,
        StoredPool {
            body: body.clone(),
            updating_polls: 0,
        },
    );
    let id = inner.start_operation(None);
    let url = format!("{}/operations/{id}", inner.base_url);
    body["properties"]["provisioningState"] = json!("Creating");
    (
        StatusCode::CREATED,
        [("azure-asyncoperation", url)],
        Json(body),
    )
        .into_response()
}

async fn delete_pool(
    State(arm): State<MockArm>,
    Path((_, _, _, pool)): PoolPath,
    Query(query): ApiQuery,
) -> Response {
    if let Some(response) = check_api_version(&query) {
        return response;
    }
    let mut inner = arm.lock();
    inner.requests.push(format!("DELETE {pool}"));

    if inner.delete_conflicts.contains(&pool) {
        return arm_error(
            StatusCode::CONFLICT,
            "OperationNotAllowed",
            "The agent pool cannot be deleted while another operation is in progress.",
        );
    }
    if inner.pools.remove(&pool).is_none() {
        return StatusCode::NO_CONTENT.into_response();
    }

    let id = inner.start_operation(None);
    let url = format!("{}/locations/{id}", inner.base_url);
    (
        StatusCode::ACCEPTED,
        [("location", url), ("retry-after", "0".to_string())],
    )
        .into_response()
}

async fn get_versions(
    State(arm): State<MockArm>,
    Path((subscription, resource_group, cluster)): Path<(String, String, String)>,
    Query(query): ApiQuery,
) -> Response {
    if let Some(response) = check_api_version(&query) {
        return response;
    }
    let mut inner = arm.lock();
    inner.requests.push("GET availableAgentPoolVersions".to_string());

    let versions: Vec<Value> = inner
        .versions
        .iter()
        .map(|version| json!({ "kubernetesVersion": version, "isPreview": false }))
        .collect();
    Json(json!({
        "id": format!(
            "/subscriptions/{subscription}/resourceGroups/{resource_group}/providers/Microsoft.ContainerService/managedClusters/{cluster}/availableagentpoolversions"
        ),
        "properties": { "agentPoolVersions": versions }
    }))
    .into_response()
}

async fn get_operation(State(arm): State<MockArm>, Path(id): Path<String>) -> Response {
    let mut inner = arm.lock();
    let Some(operation) = inner.operations.get_mut(&id) else {
        return arm_error(StatusCode::NOT_FOUND, "NotFound", "Unknown operation.");
    };
    if operation.polls_remaining > 0 {
        operation.polls_remaining -= 1;
        return Json(json!({ "status": "InProgress" })).into_response();
    }
    match &operation.error {
        Some((code, message)) => Json(json!({
            "status": "Failed",
            "error": { "code": code, "message": message }
        }))
        .into_response(),
        None => Json(json!({ "status": "Succeeded" })).into_response(),
    }
}

async fn get_location(State(arm): State<MockArm>, Path(id): Path<String>) -> Response {
    let mut inner = arm.lock();
    let Some(operation) = inner.operations.get_mut(&id) else {
        return arm_error(StatusCode::NOT_FOUND, "NotFound", "Unknown operation.");
    };
    if operation.polls_remaining > 0 {
        operation.polls_remaining -= 1;
        return StatusCode::ACCEPTED.into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}
