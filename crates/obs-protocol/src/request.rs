//! Request names and typed response payloads
//!
//! Only the requests the bridge actually issues are modelled. Response
//! payloads deserialize from the `responseData` object of a
//! `RequestResponse`; unknown fields are ignored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Request types issued by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    GetVersion,
    GetSceneList,
    GetCurrentProgramScene,
    SetCurrentProgramScene,
    GetSceneItemList,
    SetSceneItemEnabled,
    GetInputList,
    GetInputMute,
    SetInputMute,
    ToggleInputMute,
    GetRecordStatus,
    ToggleRecord,
    StartRecord,
    StopRecord,
    GetStreamStatus,
    ToggleStream,
    StartStream,
    StopStream,
}

impl RequestType {
    /// Wire name of the request
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetVersion => "GetVersion",
            Self::GetSceneList => "GetSceneList",
            Self::GetCurrentProgramScene => "GetCurrentProgramScene",
            Self::SetCurrentProgramScene => "SetCurrentProgramScene",
            Self::GetSceneItemList => "GetSceneItemList",
            Self::SetSceneItemEnabled => "SetSceneItemEnabled",
            Self::GetInputList => "GetInputList",
            Self::GetInputMute => "GetInputMute",
            Self::SetInputMute => "SetInputMute",
            Self::ToggleInputMute => "ToggleInputMute",
            Self::GetRecordStatus => "GetRecordStatus",
            Self::ToggleRecord => "ToggleRecord",
            Self::StartRecord => "StartRecord",
            Self::StopRecord => "StopRecord",
            Self::GetStreamStatus => "GetStreamStatus",
            Self::ToggleStream => "ToggleStream",
            Self::StartStream => "StartStream",
            Self::StopStream => "StopStream",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request status codes the bridge distinguishes
pub struct StatusCode;

impl StatusCode {
    pub const SUCCESS: u16 = 100;
    /// The server is not ready to handle the request (still starting up)
    pub const NOT_READY: u16 = 207;
    pub const MISSING_REQUEST_FIELD: u16 = 300;
    pub const RESOURCE_NOT_FOUND: u16 = 600;
    pub const OUTPUT_RUNNING: u16 = 500;
    pub const OUTPUT_NOT_RUNNING: u16 = 501;
}

/// Response to `GetVersion`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub obs_version: String,
    pub obs_web_socket_version: String,
    #[serde(default)]
    pub rpc_version: u32,
}

/// One entry of `GetSceneList`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneEntry {
    pub scene_name: String,
    #[serde(default)]
    pub scene_index: i64,
}

/// Response to `GetSceneList`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneListResponse {
    #[serde(default)]
    pub current_program_scene_name: Option<String>,
    pub scenes: Vec<SceneEntry>,
}

/// Response to `GetCurrentProgramScene`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSceneResponse {
    pub current_program_scene_name: String,
}

/// One entry of `GetSceneItemList`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneItemEntry {
    pub source_name: String,
    pub scene_item_id: i64,
    pub scene_item_enabled: bool,
}

/// Response to `GetSceneItemList`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneItemListResponse {
    pub scene_items: Vec<SceneItemEntry>,
}

/// Response to `GetInputMute` and `ToggleInputMute`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputMuteResponse {
    pub input_muted: bool,
}

/// Response to record/stream status and toggle requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputActiveResponse {
    pub output_active: bool,
}

/// One entry of `GetInputList`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEntry {
    pub input_name: String,
    #[serde(default)]
    pub input_kind: Option<String>,
}

/// Response to `GetInputList`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputListResponse {
    pub inputs: Vec<InputEntry>,
}
