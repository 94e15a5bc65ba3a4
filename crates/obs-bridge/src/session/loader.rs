//! Scene-list loading

use obs_core::traits::Transport;
use obs_core::{BridgeError, Scene};
use obs_protocol::request::{CurrentSceneResponse, SceneListResponse};
use obs_protocol::RequestType;

use crate::cache::StateCache;
use crate::request::request;

/// Fetch the scene list and the current program scene.
///
/// Older servers omit the current scene from `GetSceneList`; it is then
/// fetched separately.
pub async fn fetch_scene_list(
    transport: &dyn Transport,
) -> Result<(Vec<Scene>, Option<String>), BridgeError> {
    let list: SceneListResponse = request(transport, RequestType::GetSceneList, None).await?;

    let current = match list.current_program_scene_name {
        Some(name) => Some(name),
        None => {
            let current: CurrentSceneResponse =
                request(transport, RequestType::GetCurrentProgramScene, None).await?;
            Some(current.current_program_scene_name)
        }
    };

    let scenes = list
        .scenes
        .into_iter()
        .map(|entry| Scene::new(entry.scene_name, entry.scene_index))
        .collect();

    Ok((scenes, current))
}

/// Fetch the scene list and publish it to the cache
pub async fn load_scenes(transport: &dyn Transport, cache: &StateCache) -> Result<(), BridgeError> {
    let (scenes, current) = fetch_scene_list(transport).await?;
    tracing::info!(
        "Loaded {} scenes, current scene: {}",
        scenes.len(),
        current.as_deref().unwrap_or("-")
    );
    cache.apply_scene_list(scenes, current);
    Ok(())
}
