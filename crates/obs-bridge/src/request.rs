//! Typed request helpers over a `Transport`

use serde::de::DeserializeOwned;
use serde_json::Value;

use obs_core::traits::Transport;
use obs_core::BridgeError;
use obs_protocol::RequestType;

/// Issue a request and deserialize its response data
pub(crate) async fn request<T: DeserializeOwned>(
    transport: &dyn Transport,
    request: RequestType,
    params: Option<Value>,
) -> Result<T, BridgeError> {
    let data = transport.call(request, params).await?;
    serde_json::from_value(data).map_err(|e| BridgeError::UnexpectedResponse {
        request,
        detail: e.to_string(),
    })
}

/// Issue a request whose response carries no data of interest
pub(crate) async fn request_unit(
    transport: &dyn Transport,
    request: RequestType,
    params: Option<Value>,
) -> Result<(), BridgeError> {
    transport.call(request, params).await?;
    Ok(())
}
