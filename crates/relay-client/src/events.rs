//! Relay protocol events.
//!
//! Wire format: one JSON object per text frame, `{"event": <name>,
//! "data": <payload>}`, with camelCase payload fields. Outbound frames
//! are fully under this client's control; inbound frames come from the
//! relay and are decoded tolerantly, with unknown event names reported
//! rather than dropped on the floor silently.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RelayError;

/// The role a registered identity plays in calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
}

/// A logical identity announced to the relay.
///
/// Ephemeral: the relay maps `user_id` to the live transport session, so
/// this is re-sent on every (re)connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

impl Identity {
    /// A patient identity.
    pub fn patient(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Patient,
        }
    }

    /// A doctor identity.
    pub fn doctor(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Doctor,
        }
    }
}

/// A session description exchanged during call negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescription {
    /// "offer" or "answer".
    pub sdp_type: String,
    /// SDP body.
    pub sdp: String,
}

impl SessionDescription {
    /// Build an offer description.
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: "offer".to_string(),
            sdp: sdp.into(),
        }
    }

    /// Build an answer description.
    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: "answer".to_string(),
            sdp: sdp.into(),
        }
    }
}

/// A proposed network path for the peer media connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mline_index: Option<u32>,
}

impl IceCandidate {
    /// Build a candidate with only the candidate line.
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_mline_index: None,
        }
    }
}

/// Events this client emits to the relay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Announce a local identity.
    #[serde(rename_all = "camelCase")]
    Register { user_id: String, role: Role },

    /// Start a call towards a patient.
    #[serde(rename_all = "camelCase")]
    CallUser {
        target_patient_id: String,
        offer: SessionDescription,
    },

    /// Answer an incoming call.
    #[serde(rename_all = "camelCase")]
    AnswerCall {
        target_socket_id: String,
        answer: SessionDescription,
    },

    /// Relay an ICE candidate to the peer.
    #[serde(rename_all = "camelCase")]
    IceCandidate {
        target_socket_id: String,
        candidate: IceCandidate,
    },

    /// Decline an incoming call.
    #[serde(rename_all = "camelCase")]
    CallDeclined { target_socket_id: String },

    /// Hang up.
    #[serde(rename_all = "camelCase")]
    EndCall { target_socket_id: String },
}

impl ClientEvent {
    /// Build the register event for an identity.
    pub fn register(identity: &Identity) -> Self {
        Self::Register {
            user_id: identity.user_id.clone(),
            role: identity.role,
        }
    }

    /// Encode as a wire frame.
    pub fn encode(&self) -> Result<String, RelayError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Events the relay delivers to this client.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// A caller wants to reach the addressed patient.
    IncomingCall {
        offer: SessionDescription,
        from: String,
        target_patient_id: String,
    },

    /// The callee answered our call.
    CallAnswered { answer: SessionDescription },

    /// The peer proposed a network path.
    IceCandidate { candidate: IceCandidate },

    /// The callee declined our call.
    CallDeclined,

    /// The peer hung up.
    EndCall,
}

/// Inbound wire frame.
#[derive(Debug, Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    data: Value,
}

impl ServerEvent {
    /// Decode a wire frame.
    pub fn decode(text: &str) -> Result<Self, RelayError> {
        let frame: Frame = serde_json::from_str(text)?;

        match frame.event.as_str() {
            "incoming-call" => {
                #[derive(Deserialize)]
                #[serde(rename_all = "camelCase")]
                struct Data {
                    offer: SessionDescription,
                    from: String,
                    target_patient_id: String,
                }

                let data: Data = serde_json::from_value(frame.data)?;
                Ok(ServerEvent::IncomingCall {
                    offer: data.offer,
                    from: data.from,
                    target_patient_id: data.target_patient_id,
                })
            }
            "call-answered" => {
                #[derive(Deserialize)]
                struct Data {
                    answer: SessionDescription,
                }

                let data: Data = serde_json::from_value(frame.data)?;
                Ok(ServerEvent::CallAnswered {
                    answer: data.answer,
                })
            }
            "ice-candidate" => {
                #[derive(Deserialize)]
                struct Data {
                    candidate: IceCandidate,
                }

                let data: Data = serde_json::from_value(frame.data)?;
                Ok(ServerEvent::IceCandidate {
                    candidate: data.candidate,
                })
            }
            "call-declined" => Ok(ServerEvent::CallDeclined),
            "end-call" => Ok(ServerEvent::EndCall),
            other => Err(RelayError::UnknownEvent(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_encoding() {
        let event = ClientEvent::register(&Identity::patient("patient-1"));
        let frame = event.encode().unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();

        assert_eq!(value["event"], "register");
        assert_eq!(value["data"]["userId"], "patient-1");
        assert_eq!(value["data"]["role"], "patient");
    }

    #[test]
    fn test_answer_call_encoding_uses_camel_case() {
        let event = ClientEvent::AnswerCall {
            target_socket_id: "sock-9".to_string(),
            answer: SessionDescription::answer("v=0"),
        };
        let value: Value = serde_json::from_str(&event.encode().unwrap()).unwrap();

        assert_eq!(value["event"], "answer-call");
        assert_eq!(value["data"]["targetSocketId"], "sock-9");
        assert_eq!(value["data"]["answer"]["sdpType"], "answer");
    }

    #[test]
    fn test_incoming_call_decoding() {
        let frame = r#"{
            "event": "incoming-call",
            "data": {
                "offer": {"sdpType": "offer", "sdp": "v=0"},
                "from": "doc-1",
                "targetPatientId": "patient-1"
            }
        }"#;

        let event = ServerEvent::decode(frame).unwrap();
        match event {
            ServerEvent::IncomingCall {
                offer,
                from,
                target_patient_id,
            } => {
                assert_eq!(offer.sdp, "v=0");
                assert_eq!(from, "doc-1");
                assert_eq!(target_patient_id, "patient-1");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_bare_events_decode_without_data() {
        assert_eq!(
            ServerEvent::decode(r#"{"event": "call-declined"}"#).unwrap(),
            ServerEvent::CallDeclined
        );
        assert_eq!(
            ServerEvent::decode(r#"{"event": "end-call", "data": {}}"#).unwrap(),
            ServerEvent::EndCall
        );
    }

    #[test]
    fn test_ice_candidate_roundtrip_shape() {
        let frame = r#"{
            "event": "ice-candidate",
            "data": {"candidate": {"candidate": "candidate:1", "sdpMid": "0"}}
        }"#;

        let event = ServerEvent::decode(frame).unwrap();
        match event {
            ServerEvent::IceCandidate { candidate } => {
                assert_eq!(candidate.candidate, "candidate:1");
                assert_eq!(candidate.sdp_mid.as_deref(), Some("0"));
                assert!(candidate.sdp_mline_index.is_none());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_event_is_reported() {
        let result = ServerEvent::decode(r#"{"event": "metrics", "data": {}}"#);
        assert!(matches!(result, Err(RelayError::UnknownEvent(name)) if name == "metrics"));
    }

    #[test]
    fn test_garbage_frame_is_an_error() {
        assert!(ServerEvent::decode("not json").is_err());
    }
}
