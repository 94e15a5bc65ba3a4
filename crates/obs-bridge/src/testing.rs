//! In-memory transport for unit tests
//!
//! `MockTransport` answers requests from a `FakeObs` model instead of a
//! socket and records every call it receives, so tests can assert both the
//! resulting state and the exact remote traffic.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use obs_core::traits::Transport;
use obs_core::{CallError, ConnectError, SessionEvent, SessionEventEnvelope, SessionInfo};
use obs_protocol::{RequestType, StatusCode};

pub(crate) struct FakeItem {
    pub source: String,
    pub id: i64,
    pub enabled: bool,
}

pub(crate) struct FakeScene {
    pub name: String,
    pub items: Vec<FakeItem>,
}

pub(crate) struct FakeInput {
    pub name: String,
    pub kind: Option<String>,
    pub muted: bool,
}

/// Scene, input and output state of a pretend OBS instance
#[derive(Default)]
pub(crate) struct FakeObs {
    pub scenes: Vec<FakeScene>,
    pub current: String,
    pub inputs: Vec<FakeInput>,
    pub recording: bool,
    pub streaming: bool,
    /// Answer `GetSceneList` without the current scene name
    pub omit_current_from_list: bool,
    /// Scenes whose item list cannot be read
    pub unreadable_scenes: HashSet<String>,
    /// Scenes whose items cannot be changed
    pub locked_scenes: HashSet<String>,
}

impl FakeObs {
    /// Three scenes; "Camera" is placed in two of them
    pub fn studio() -> Self {
        let mut obs = FakeObs {
            current: "Main".to_string(),
            ..FakeObs::default()
        };
        obs.add_scene("Intro", &[("Camera", 1, true), ("Logo", 2, true)]);
        obs.add_scene("Main", &[("Screen", 1, true), ("Camera", 4, true)]);
        obs.add_scene("BRB", &[("Background", 1, true)]);
        obs.add_input("Mic/Aux", Some("coreaudio_input_capture"));
        obs.add_input("Desktop Audio", Some("coreaudio_output_capture"));
        obs.add_input("Camera", Some("av_capture_input"));
        obs.add_input("Screen", Some("screen_capture"));
        obs.add_input("Overlay", Some("browser_source"));
        obs.add_input("Legacy", None);
        obs
    }

    pub fn add_scene(&mut self, name: &str, items: &[(&str, i64, bool)]) {
        self.scenes.push(FakeScene {
            name: name.to_string(),
            items: items
                .iter()
                .map(|(source, id, enabled)| FakeItem {
                    source: source.to_string(),
                    id: *id,
                    enabled: *enabled,
                })
                .collect(),
        });
    }

    pub fn add_input(&mut self, name: &str, kind: Option<&str>) {
        self.inputs.push(FakeInput {
            name: name.to_string(),
            kind: kind.map(str::to_string),
            muted: false,
        });
    }

    pub fn item_enabled(&self, scene: &str, source: &str) -> Option<bool> {
        self.scene(scene)?
            .items
            .iter()
            .find(|item| item.source == source)
            .map(|item| item.enabled)
    }

    pub fn set_item_enabled(&mut self, scene: &str, source: &str, enabled: bool) {
        if let Some(scene) = self.scenes.iter_mut().find(|s| s.name == scene) {
            for item in scene.items.iter_mut().filter(|i| i.source == source) {
                item.enabled = enabled;
            }
        }
    }

    pub fn input_muted(&self, name: &str) -> Option<bool> {
        self.inputs.iter().find(|i| i.name == name).map(|i| i.muted)
    }

    fn scene(&self, name: &str) -> Option<&FakeScene> {
        self.scenes.iter().find(|s| s.name == name)
    }

    fn input_mut(&mut self, request: RequestType, params: &Value) -> Result<&mut FakeInput, CallError> {
        let name = param_str(request, params, "inputName")?;
        self.inputs
            .iter_mut()
            .find(|i| i.name == name)
            .ok_or_else(|| not_found(request, "No source was found by the name of `inputName`."))
    }

    fn handle(&mut self, request: RequestType, params: &Value) -> Result<Value, CallError> {
        match request {
            RequestType::GetVersion => Ok(json!({
                "obsVersion": "30.2.3",
                "obsWebSocketVersion": "5.5.2",
                "rpcVersion": 1
            })),
            RequestType::GetSceneList => {
                let scenes: Vec<Value> = self
                    .scenes
                    .iter()
                    .enumerate()
                    .map(|(index, scene)| json!({"sceneName": scene.name, "sceneIndex": index}))
                    .collect();
                if self.omit_current_from_list {
                    Ok(json!({"scenes": scenes}))
                } else {
                    Ok(json!({"currentProgramSceneName": self.current, "scenes": scenes}))
                }
            }
            RequestType::GetCurrentProgramScene => {
                Ok(json!({"currentProgramSceneName": self.current}))
            }
            RequestType::SetCurrentProgramScene => {
                let name = param_str(request, params, "sceneName")?;
                if self.scene(&name).is_none() {
                    return Err(not_found(request, "No source was found by the name of `sceneName`."));
                }
                self.current = name;
                Ok(Value::Null)
            }
            RequestType::GetSceneItemList => {
                let name = param_str(request, params, "sceneName")?;
                if self.unreadable_scenes.contains(&name) {
                    return Err(CallError::Transport("scene enumeration failed".to_string()));
                }
                let scene = self
                    .scene(&name)
                    .ok_or_else(|| not_found(request, "No source was found by the name of `sceneName`."))?;
                let items: Vec<Value> = scene
                    .items
                    .iter()
                    .map(|item| {
                        json!({
                            "sourceName": item.source,
                            "sceneItemId": item.id,
                            "sceneItemEnabled": item.enabled
                        })
                    })
                    .collect();
                Ok(json!({"sceneItems": items}))
            }
            RequestType::SetSceneItemEnabled => {
                let name = param_str(request, params, "sceneName")?;
                if self.locked_scenes.contains(&name) {
                    return Err(CallError::Remote {
                        request,
                        code: 702,
                        message: "Scene item is locked".to_string(),
                    });
                }
                let id = params.get("sceneItemId").and_then(Value::as_i64);
                let enabled = params.get("sceneItemEnabled").and_then(Value::as_bool);
                let (Some(id), Some(enabled)) = (id, enabled) else {
                    return Err(missing_field(request));
                };
                let item = self
                    .scenes
                    .iter_mut()
                    .find(|s| s.name == name)
                    .and_then(|s| s.items.iter_mut().find(|i| i.id == id))
                    .ok_or_else(|| not_found(request, "No scene items were found."))?;
                item.enabled = enabled;
                Ok(Value::Null)
            }
            RequestType::GetInputList => {
                let inputs: Vec<Value> = self
                    .inputs
                    .iter()
                    .map(|input| match &input.kind {
                        Some(kind) => json!({"inputName": input.name, "inputKind": kind}),
                        None => json!({"inputName": input.name}),
                    })
                    .collect();
                Ok(json!({"inputs": inputs}))
            }
            RequestType::GetInputMute => {
                let input = self.input_mut(request, params)?;
                Ok(json!({"inputMuted": input.muted}))
            }
            RequestType::SetInputMute => {
                let muted = params
                    .get("inputMuted")
                    .and_then(Value::as_bool)
                    .ok_or_else(|| missing_field(request))?;
                self.input_mut(request, params)?.muted = muted;
                Ok(Value::Null)
            }
            RequestType::ToggleInputMute => {
                let input = self.input_mut(request, params)?;
                input.muted = !input.muted;
                Ok(json!({"inputMuted": input.muted}))
            }
            RequestType::GetRecordStatus => Ok(json!({"outputActive": self.recording})),
            RequestType::ToggleRecord => {
                self.recording = !self.recording;
                Ok(json!({"outputActive": self.recording}))
            }
            RequestType::StartRecord => start_output(request, &mut self.recording),
            RequestType::StopRecord => stop_output(request, &mut self.recording),
            RequestType::GetStreamStatus => Ok(json!({"outputActive": self.streaming})),
            RequestType::ToggleStream => {
                self.streaming = !self.streaming;
                Ok(json!({"outputActive": self.streaming}))
            }
            RequestType::StartStream => start_output(request, &mut self.streaming),
            RequestType::StopStream => stop_output(request, &mut self.streaming),
        }
    }
}

fn start_output(request: RequestType, active: &mut bool) -> Result<Value, CallError> {
    if *active {
        return Err(CallError::Remote {
            request,
            code: StatusCode::OUTPUT_RUNNING,
            message: "The output is already running.".to_string(),
        });
    }
    *active = true;
    Ok(Value::Null)
}

fn stop_output(request: RequestType, active: &mut bool) -> Result<Value, CallError> {
    if !*active {
        return Err(CallError::Remote {
            request,
            code: StatusCode::OUTPUT_NOT_RUNNING,
            message: "The output is not running.".to_string(),
        });
    }
    *active = false;
    Ok(Value::Null)
}

fn param_str(request: RequestType, params: &Value, field: &str) -> Result<String, CallError> {
    params
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing_field(request))
}

fn missing_field(request: RequestType) -> CallError {
    CallError::Remote {
        request,
        code: StatusCode::MISSING_REQUEST_FIELD,
        message: "Your request is missing a required field.".to_string(),
    }
}

fn not_found(request: RequestType, message: &str) -> CallError {
    CallError::Remote {
        request,
        code: StatusCode::RESOURCE_NOT_FOUND,
        message: message.to_string(),
    }
}

/// Transport backed by a `FakeObs`
pub(crate) struct MockTransport {
    obs: Mutex<FakeObs>,
    calls: Mutex<Vec<(RequestType, Value)>>,
    scene_list_failures: Mutex<VecDeque<CallError>>,
    request_failures: Mutex<HashMap<RequestType, CallError>>,
    connect_failure: Mutex<Option<ConnectError>>,
    /// Handshake stall before the next connect opens
    connect_delay: Mutex<Option<Duration>>,
    /// Server closes the next session right after the handshake
    close_after_handshake: Mutex<Option<String>>,
    events: broadcast::Sender<SessionEventEnvelope>,
    open_generation: AtomicU64,
    generation: AtomicU64,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
}

impl MockTransport {
    pub fn new(obs: FakeObs) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            obs: Mutex::new(obs),
            calls: Mutex::new(Vec::new()),
            scene_list_failures: Mutex::new(VecDeque::new()),
            request_failures: Mutex::new(HashMap::new()),
            connect_failure: Mutex::new(None),
            connect_delay: Mutex::new(None),
            close_after_handshake: Mutex::new(None),
            events,
            open_generation: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
        })
    }

    /// A transport whose session is already open
    pub fn connected(obs: FakeObs) -> Arc<Self> {
        let transport = Self::new(obs);
        transport.generation.store(1, Ordering::SeqCst);
        transport.open_generation.store(1, Ordering::SeqCst);
        transport
    }

    pub fn fail_next_connect(&self, err: ConnectError) {
        *self.connect_failure.lock().unwrap() = Some(err);
    }

    pub fn stall_next_connect(&self, delay: Duration) {
        *self.connect_delay.lock().unwrap() = Some(delay);
    }

    pub fn close_after_next_handshake(&self, detail: &str) {
        *self.close_after_handshake.lock().unwrap() = Some(detail.to_string());
    }

    /// Queue a failure for the next `GetSceneList`
    pub fn fail_next_scene_list(&self, err: CallError) {
        self.scene_list_failures.lock().unwrap().push_back(err);
    }

    /// Fail every call of `request`
    pub fn fail_request(&self, request: RequestType, err: CallError) {
        self.request_failures.lock().unwrap().insert(request, err);
    }

    pub fn with_obs<R>(&self, f: impl FnOnce(&mut FakeObs) -> R) -> R {
        f(&mut self.obs.lock().unwrap())
    }

    pub fn calls(&self) -> Vec<(RequestType, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, request: RequestType) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| *r == request)
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    /// Push an event tagged with the current generation
    pub fn emit(&self, event: SessionEvent) {
        self.emit_with_generation(self.generation.load(Ordering::SeqCst), event);
    }

    pub fn emit_with_generation(&self, generation: u64, event: SessionEvent) {
        let _ = self.events.send(SessionEventEnvelope { generation, event });
    }

    /// Simulate the socket breaking
    pub fn drop_connection(&self, detail: &str) {
        self.open_generation.store(0, Ordering::SeqCst);
        self.emit(SessionEvent::Error(detail.to_string()));
        self.emit(SessionEvent::Closed);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(
        &self,
        _url: &str,
        _password: Option<&str>,
    ) -> Result<SessionInfo, ConnectError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.open_generation.store(0, Ordering::SeqCst);

        if let Some(err) = self.connect_failure.lock().unwrap().take() {
            return Err(err);
        }
        let delay = self.connect_delay.lock().unwrap().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.open_generation.store(generation, Ordering::SeqCst);
        self.emit_with_generation(generation, SessionEvent::Opened);

        let closed = self.close_after_handshake.lock().unwrap().take();
        if let Some(detail) = closed {
            self.drop_connection(&detail);
        }

        Ok(SessionInfo {
            obs_web_socket_version: "5.5.2".to_string(),
            rpc_version: 1,
            generation,
        })
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        let generation = self.open_generation.swap(0, Ordering::SeqCst);
        if generation != 0 {
            self.emit_with_generation(generation, SessionEvent::Closed);
        }
    }

    async fn call(&self, request: RequestType, params: Option<Value>) -> Result<Value, CallError> {
        let params = params.unwrap_or(Value::Null);
        self.calls.lock().unwrap().push((request, params.clone()));

        if !self.is_open() {
            return Err(CallError::NotConnected);
        }
        if let Some(err) = self.request_failures.lock().unwrap().get(&request) {
            return Err(err.clone());
        }
        if request == RequestType::GetSceneList {
            if let Some(err) = self.scene_list_failures.lock().unwrap().pop_front() {
                return Err(err);
            }
        }

        self.obs.lock().unwrap().handle(request, &params)
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEventEnvelope> {
        self.events.subscribe()
    }

    fn is_open(&self) -> bool {
        self.open_generation.load(Ordering::SeqCst) != 0
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
