#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use cocoro_bridge::{
    BridgeConfig, CloudClient, ControlCompletion, ControlResult, Credentials, Device, DeviceInfo,
    Error, Integration, PropertyUpdate, Result, codes,
};
use serde_json::{Value, json};

/// Scripted vendor client. Queued outcomes are consumed in order; once a
/// queue is empty every call succeeds against `devices`.
#[derive(Clone, Default)]
pub struct FakeClient {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
pub struct FakeState {
    pub devices: Vec<Device>,
    pub login_results: VecDeque<Result<()>>,
    pub query_results: VecDeque<Result<Vec<Device>>>,
    pub execute_results: VecDeque<Result<ControlResult>>,
    pub wait_results: VecDeque<Result<ControlCompletion>>,
    pub logins: usize,
    pub queries: usize,
    pub executes: usize,
    pub waits: usize,
    pub closed: bool,
    pub executed: Vec<Vec<PropertyUpdate>>,
    pub calls: Vec<&'static str>,
}

impl FakeClient {
    pub fn new(devices: Vec<Device>) -> Self {
        let client = Self::default();
        client.state().devices = devices;
        client
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn set_devices(&self, devices: Vec<Device>) {
        self.state().devices = devices;
    }

    pub fn fail_login(&self, err: Error) {
        self.state().login_results.push_back(Err(err));
    }

    pub fn fail_query(&self, err: Error) {
        self.state().query_results.push_back(Err(err));
    }

    pub fn fail_execute(&self, err: Error) {
        self.state().execute_results.push_back(Err(err));
    }

    pub fn execute_returns(&self, control_ids: &[&str]) {
        self.state().execute_results.push_back(Ok(ControlResult {
            control_ids: control_ids.iter().map(|s| s.to_string()).collect(),
        }));
    }

    pub fn wait_returns(&self, result: Result<ControlCompletion>) {
        self.state().wait_results.push_back(result);
    }

    pub fn logins(&self) -> usize {
        self.state().logins
    }

    pub fn queries(&self) -> usize {
        self.state().queries
    }

    pub fn executes(&self) -> usize {
        self.state().executes
    }

    pub fn waits(&self) -> usize {
        self.state().waits
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    pub fn reset_counts(&self) {
        let mut s = self.state();
        s.logins = 0;
        s.queries = 0;
        s.executes = 0;
        s.waits = 0;
        s.calls.clear();
        s.executed.clear();
    }
}

impl CloudClient for FakeClient {
    async fn login(&self, _credentials: &Credentials) -> Result<()> {
        let mut s = self.state();
        s.logins += 1;
        s.calls.push("login");
        s.login_results.pop_front().unwrap_or(Ok(()))
    }

    async fn query_devices(&self) -> Result<Vec<Device>> {
        let mut s = self.state();
        s.queries += 1;
        s.calls.push("query");
        match s.query_results.pop_front() {
            Some(result) => result,
            None => Ok(s.devices.clone()),
        }
    }

    async fn execute_queued_updates(&self, device: &Device) -> Result<ControlResult> {
        let mut s = self.state();
        s.executes += 1;
        s.calls.push("execute");
        let result = s.execute_results.pop_front().unwrap_or(Ok(ControlResult::default()));
        if result.is_ok() {
            s.executed.push(device.pending_updates());
        }
        result
    }

    async fn wait_for_control_completion(
        &self,
        _device: &Device,
        control_ids: &[String],
        _timeout: Duration,
        _poll_interval: Duration,
    ) -> Result<ControlCompletion> {
        let mut s = self.state();
        s.waits += 1;
        s.calls.push("wait");
        s.wait_results.pop_front().unwrap_or_else(|| {
            Ok(ControlCompletion {
                completed: control_ids.to_vec(),
            })
        })
    }

    async fn close(&self) {
        self.state().closed = true;
    }
}

pub fn aircon(id: &str, name: &str, properties: &[(&str, Value)]) -> Device {
    let props: BTreeMap<String, Value> = properties
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    Device::new(
        DeviceInfo {
            device_id: id.to_string(),
            name: name.to_string(),
            maker: "SHARP".to_string(),
            model: "AY-R40".to_string(),
            serial_number: format!("SN-{id}"),
        },
        props,
    )
}

/// A powered-on unit cooling to 24 C in a 27 C room.
pub fn living_room() -> Device {
    aircon(
        "42",
        "Living Room AC",
        &[
            (codes::POWER, json!("30")),
            (codes::OPERATION_MODE, json!("42")),
            (codes::TARGET_TEMPERATURE, json!(24.0)),
            (codes::ROOM_TEMPERATURE, json!(27.0)),
            (codes::WINDSPEED, json!("33")),
            (codes::FAN_DIRECTION, json!("41")),
        ],
    )
}

/// Config with timers slow enough that they never fire during a test
/// unless the test asks for them.
pub fn quiet_config() -> BridgeConfig {
    BridgeConfig::builder(Credentials::new("key", "secret"))
        .refresh_interval(Duration::from_secs(3600))
        .reauth_interval(Duration::from_secs(24 * 3600))
        .build()
        .unwrap()
}

pub async fn setup(client: &FakeClient) -> Integration<FakeClient> {
    setup_with(client, quiet_config()).await
}

pub async fn setup_with(client: &FakeClient, config: BridgeConfig) -> Integration<FakeClient> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let integration = Integration::setup(config, client.clone())
        .await
        .expect("setup should succeed");
    client.reset_counts();
    integration
}
