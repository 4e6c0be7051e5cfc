// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification of MaaP webhook callbacks.

use smsrcs_core::{BridgeError, CallbackEvent, SuggestedReply, to_sms_address};

use crate::types::WebhookPayload;

/// MaaP `event` discriminators the bridge distinguishes.
pub const EVENT_NEW_USER: &str = "newUser";
pub const EVENT_MESSAGE: &str = "message";
pub const EVENT_RESPONSE: &str = "response";

/// Classifies one raw callback body.
///
/// Rules, first match wins:
/// - `newUser` becomes [`CallbackEvent::NewUser`].
/// - `response` carrying a suggested reply becomes
///   [`CallbackEvent::SuggestedReply`], with the user address stripped of its
///   leading `+`.
/// - `message` carrying text becomes [`CallbackEvent::InboundText`].
/// - Anything else, including `response` to a URL action, is
///   [`CallbackEvent::Ignored`].
///
/// A body that is not JSON, or an event that needs a user but has none, is a
/// [`BridgeError::MalformedCallback`].
pub fn classify(body: &[u8]) -> Result<CallbackEvent, BridgeError> {
    let payload: WebhookPayload =
        serde_json::from_slice(body).map_err(|e| BridgeError::MalformedCallback {
            message: format!("callback is not valid JSON: {e}"),
            source: Some(Box::new(e)),
        })?;

    let event = payload.event.as_deref();
    let user = payload
        .message_contact
        .as_ref()
        .map(|c| c.user_contact.as_str())
        .filter(|u| !u.is_empty());

    match event {
        Some(EVENT_NEW_USER) => Ok(CallbackEvent::NewUser {
            user: require_user(user, EVENT_NEW_USER)?.to_string(),
        }),
        Some(EVENT_RESPONSE) => {
            let reply = payload
                .rcs_message
                .and_then(|m| m.suggested_response)
                .and_then(|s| s.response.reply);
            match reply {
                Some(reply) => {
                    let user = require_user(user, EVENT_RESPONSE)?;
                    Ok(CallbackEvent::SuggestedReply(SuggestedReply {
                        user: to_sms_address(user),
                        display_text: reply.display_text,
                        postback: reply.postback.map(|p| p.data),
                    }))
                }
                None => Ok(CallbackEvent::Ignored {
                    event: Some(EVENT_RESPONSE.to_string()),
                }),
            }
        }
        Some(EVENT_MESSAGE) => match payload.rcs_message.and_then(|m| m.text_message) {
            Some(text) => Ok(CallbackEvent::InboundText {
                user: require_user(user, EVENT_MESSAGE)?.to_string(),
                text,
            }),
            None => Ok(CallbackEvent::Ignored {
                event: Some(EVENT_MESSAGE.to_string()),
            }),
        },
        other => Ok(CallbackEvent::Ignored {
            event: other.map(str::to_string),
        }),
    }
}

fn require_user<'a>(user: Option<&'a str>, event: &str) -> Result<&'a str, BridgeError> {
    user.ok_or_else(|| BridgeError::MalformedCallback {
        message: format!("`{event}` callback has no messageContact.userContact"),
        source: None,
    })
}
