//! JSON envelope codec
//!
//! Messages travel as WebSocket text frames shaped `{"op": u8, "d": {...}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::message::{EventSubscription, Message, OpCode};

#[derive(Serialize, Deserialize)]
struct Envelope {
    op: u8,
    #[serde(default)]
    d: Value,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReidentifyPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_subscriptions: Option<EventSubscription>,
}

/// Encode a message into the text of a WebSocket frame
pub fn encode(message: &Message) -> Result<String, ProtocolError> {
    let d = match message {
        Message::Hello(m) => serde_json::to_value(m)?,
        Message::Identify(m) => serde_json::to_value(m)?,
        Message::Identified(m) => serde_json::to_value(m)?,
        Message::Reidentify {
            event_subscriptions,
        } => serde_json::to_value(ReidentifyPayload {
            event_subscriptions: *event_subscriptions,
        })?,
        Message::Event(m) => serde_json::to_value(m)?,
        Message::Request(m) => serde_json::to_value(m)?,
        Message::RequestResponse(m) => serde_json::to_value(m)?,
    };

    let envelope = Envelope {
        op: message.op_code().as_u8(),
        d,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decode the text of a WebSocket frame into a message
pub fn decode(text: &str) -> Result<Message, ProtocolError> {
    let envelope: Envelope = serde_json::from_str(text)?;
    let op = OpCode::from_u8(envelope.op).ok_or(ProtocolError::UnknownOpCode(envelope.op))?;

    let message = match op {
        OpCode::Hello => Message::Hello(serde_json::from_value(envelope.d)?),
        OpCode::Identify => Message::Identify(serde_json::from_value(envelope.d)?),
        OpCode::Identified => Message::Identified(serde_json::from_value(envelope.d)?),
        OpCode::Reidentify => {
            let payload: ReidentifyPayload = serde_json::from_value(envelope.d)?;
            Message::Reidentify {
                event_subscriptions: payload.event_subscriptions,
            }
        }
        OpCode::Event => Message::Event(serde_json::from_value(envelope.d)?),
        OpCode::Request => Message::Request(serde_json::from_value(envelope.d)?),
        OpCode::RequestResponse => Message::RequestResponse(serde_json::from_value(envelope.d)?),
    };

    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Identify, RequestMessage, RequestResponse, RequestStatus, RPC_VERSION};
    use serde_json::json;

    #[test]
    fn test_decode_hello_with_challenge() {
        let text = r#"{"op":0,"d":{"obsWebSocketVersion":"5.4.2","rpcVersion":1,
            "authentication":{"challenge":"abc","salt":"xyz"}}}"#;
        match decode(text).unwrap() {
            Message::Hello(hello) => {
                assert_eq!(hello.rpc_version, 1);
                let auth = hello.authentication.unwrap();
                assert_eq!(auth.challenge, "abc");
                assert_eq!(auth.salt, "xyz");
            }
            other => panic!("Expected Hello, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_identify_shape() {
        let message = Message::Identify(Identify {
            rpc_version: RPC_VERSION,
            authentication: Some("token".to_string()),
            event_subscriptions: Some(EventSubscription::ALL),
        });
        let value: Value = serde_json::from_str(&encode(&message).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"op": 1, "d": {"rpcVersion": 1, "authentication": "token", "eventSubscriptions": 2047}})
        );
    }

    #[test]
    fn test_encode_request_omits_missing_data() {
        let message = Message::Request(RequestMessage {
            request_type: "GetVersion".to_string(),
            request_id: "1".to_string(),
            request_data: None,
        });
        let value: Value = serde_json::from_str(&encode(&message).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"op": 6, "d": {"requestType": "GetVersion", "requestId": "1"}})
        );
    }

    #[test]
    fn test_decode_failed_request_response() {
        let text = r#"{"op":7,"d":{"requestType":"SetCurrentProgramScene","requestId":"42",
            "requestStatus":{"result":false,"code":600,"comment":"No scene was found"}}}"#;
        match decode(text).unwrap() {
            Message::RequestResponse(RequestResponse {
                request_id,
                request_status,
                response_data,
                ..
            }) => {
                assert_eq!(request_id, "42");
                assert_eq!(
                    request_status,
                    RequestStatus {
                        result: false,
                        code: 600,
                        comment: Some("No scene was found".to_string()),
                    }
                );
                assert!(response_data.is_none());
            }
            other => panic!("Expected RequestResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_event() {
        let text = r#"{"op":5,"d":{"eventType":"CurrentProgramSceneChanged","eventIntent":4,
            "eventData":{"sceneName":"Live"}}}"#;
        match decode(text).unwrap() {
            Message::Event(event) => {
                assert_eq!(event.event_type, "CurrentProgramSceneChanged");
                assert_eq!(event.event_data.unwrap()["sceneName"], "Live");
            }
            other => panic!("Expected Event, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_unknown_op_code() {
        let result = decode(r#"{"op":4,"d":{}}"#);
        assert!(matches!(result, Err(ProtocolError::UnknownOpCode(4))));
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(decode("not json"), Err(ProtocolError::Json(_))));
        // Valid envelope, payload missing required fields
        assert!(matches!(
            decode(r#"{"op":2,"d":{}}"#),
            Err(ProtocolError::Json(_))
        ));
    }
}
