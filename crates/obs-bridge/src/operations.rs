//! Cross-scene compound operations
//!
//! A source can be placed into any number of scenes, each placement being a
//! separate scene item with its own enabled flag. Toggling a source means
//! finding every placement and flipping all of them to the same new state.
//!
//! # Partial failure
//!
//! Scenes are enumerated and updated with bounded concurrency. A scene whose
//! item list cannot be read is skipped. Each placement is updated on its own,
//! and the outcome records which scenes succeeded; there is no rollback.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::json;

use obs_core::traits::Transport;
use obs_core::{BridgeError, Scene, SceneApplyResult, SceneItem, ToggleOutcome};
use obs_protocol::request::{CurrentSceneResponse, SceneItemListResponse};
use obs_protocol::RequestType;

use crate::request::{request, request_unit};
use crate::session::fetch_scene_list;

/// Executes multi-step operations over the scene graph
pub struct CompoundOps {
    transport: Arc<dyn Transport>,
    concurrency: usize,
}

impl CompoundOps {
    pub fn new(transport: Arc<dyn Transport>, concurrency: usize) -> Self {
        Self {
            transport,
            concurrency: concurrency.max(1),
        }
    }

    /// Find the first item placing `source` in each scene, in scene-list order
    pub async fn find_source_items(&self, source: &str) -> Result<Vec<SceneItem>, BridgeError> {
        let (scenes, _) = fetch_scene_list(self.transport.as_ref()).await?;

        let scanned: Vec<(Scene, Result<Option<SceneItem>, BridgeError>)> = stream::iter(scenes)
            .map(|scene| async move {
                let found = self.find_in_scene(&scene.name, source).await;
                (scene, found)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut items = Vec::new();
        for (scene, found) in scanned {
            match found {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(e) => tracing::warn!("Error checking scene {}: {}", scene.name, e),
            }
        }
        Ok(items)
    }

    /// Flip every placement of `source` to the opposite of the first match.
    ///
    /// Fails with `SourceNotFound`, before any update is sent, when no scene
    /// holds the source.
    pub async fn toggle_source(&self, source: &str) -> Result<ToggleOutcome, BridgeError> {
        let items = self.find_source_items(source).await?;
        let Some(first) = items.first() else {
            tracing::warn!("Source {} not found in any scene", source);
            return Err(BridgeError::SourceNotFound(source.to_string()));
        };

        let enabled = !first.enabled;
        tracing::info!(
            "Found {} in {} scene(s), setting visibility to {}",
            source,
            items.len(),
            enabled
        );

        let results: Vec<SceneApplyResult> = stream::iter(items)
            .map(|item| async move { self.apply_enabled(item, enabled).await })
            .buffered(self.concurrency)
            .collect()
            .await;

        let attempted = results.len();
        let succeeded = results.iter().filter(|r| r.success).count();
        if succeeded == attempted {
            tracing::info!("Toggled {} in {}/{} scenes", source, succeeded, attempted);
        } else {
            tracing::warn!("Toggled {} in {}/{} scenes", source, succeeded, attempted);
        }

        Ok(ToggleOutcome {
            source: source.to_string(),
            enabled,
            succeeded,
            attempted,
            results,
        })
    }

    /// Enabled state of `source`, checking the current scene first.
    ///
    /// Falls back to the first other scene that holds the source; scenes that
    /// cannot be read are skipped.
    pub async fn source_enabled(&self, source: &str) -> Result<bool, BridgeError> {
        let current: CurrentSceneResponse =
            request(self.transport.as_ref(), RequestType::GetCurrentProgramScene, None).await?;
        let current = current.current_program_scene_name;

        match self.find_in_scene(&current, source).await {
            Ok(Some(item)) => return Ok(item.enabled),
            Ok(None) => {}
            Err(e) => tracing::warn!("Error checking scene {}: {}", current, e),
        }

        let (scenes, _) = fetch_scene_list(self.transport.as_ref()).await?;
        for scene in scenes.iter().filter(|s| s.name != current) {
            match self.find_in_scene(&scene.name, source).await {
                Ok(Some(item)) => return Ok(item.enabled),
                Ok(None) => {}
                Err(e) => tracing::warn!("Error checking scene {}: {}", scene.name, e),
            }
        }

        Err(BridgeError::SourceNotFound(source.to_string()))
    }

    async fn find_in_scene(
        &self,
        scene: &str,
        source: &str,
    ) -> Result<Option<SceneItem>, BridgeError> {
        let list: SceneItemListResponse = request(
            self.transport.as_ref(),
            RequestType::GetSceneItemList,
            Some(json!({ "sceneName": scene })),
        )
        .await?;

        Ok(list
            .scene_items
            .into_iter()
            .find(|entry| entry.source_name == source)
            .map(|entry| SceneItem {
                scene: scene.to_string(),
                source: entry.source_name,
                item_id: entry.scene_item_id,
                enabled: entry.scene_item_enabled,
            }))
    }

    async fn apply_enabled(&self, item: SceneItem, enabled: bool) -> SceneApplyResult {
        let result = request_unit(
            self.transport.as_ref(),
            RequestType::SetSceneItemEnabled,
            Some(json!({
                "sceneName": item.scene,
                "sceneItemId": item.item_id,
                "sceneItemEnabled": enabled,
            })),
        )
        .await;

        match result {
            Ok(()) => {
                tracing::debug!("Set {} in {} to {}", item.source, item.scene, enabled);
                SceneApplyResult {
                    scene: item.scene,
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("Failed to update {} in {}: {}", item.source, item.scene, e);
                SceneApplyResult {
                    scene: item.scene,
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
