// SPDX-FileCopyrightText: 2026 smsrcs Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MaaP wire types.
//!
//! Outgoing types borrow from the domain request; incoming types are lenient
//! (every field optional) because providers add and omit fields freely.

use serde::{Deserialize, Serialize};
use smsrcs_core::{OutboundRichRequest, QuickReply};

/// Response from the OAuth2 token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

// --- outgoing ---

/// Body of `POST {api_url}/{bot_id}/messages`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest<'a> {
    #[serde(rename = "RCSMessage")]
    pub rcs_message: OutgoingRcsMessage<'a>,
    pub message_contact: MessageContact,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingRcsMessage<'a> {
    pub text_message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_chip_list: Option<SuggestedChipList<'a>>,
}

#[derive(Debug, Serialize)]
pub struct SuggestedChipList<'a> {
    pub suggestions: Vec<Suggestion<'a>>,
}

/// One chip: a plain reply or a URL action.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Suggestion<'a> {
    Reply(ReplySuggestion<'a>),
    Action(ActionSuggestion<'a>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplySuggestion<'a> {
    pub display_text: &'a str,
    pub postback: Postback<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSuggestion<'a> {
    pub display_text: &'a str,
    pub postback: Postback<'a>,
    pub open_url: OpenUrl<'a>,
}

#[derive(Debug, Serialize)]
pub struct Postback<'a> {
    pub data: &'a str,
}

#[derive(Debug, Serialize)]
pub struct OpenUrl<'a> {
    pub url: &'a str,
}

impl<'a> From<&'a QuickReply> for Suggestion<'a> {
    fn from(reply: &'a QuickReply) -> Self {
        let postback = Postback {
            data: &reply.postback,
        };
        match reply.url.as_deref() {
            Some(url) => Suggestion::Action(ActionSuggestion {
                display_text: &reply.label,
                postback,
                open_url: OpenUrl { url },
            }),
            None => Suggestion::Reply(ReplySuggestion {
                display_text: &reply.label,
                postback,
            }),
        }
    }
}

impl<'a> From<&'a OutboundRichRequest> for SendMessageRequest<'a> {
    fn from(request: &'a OutboundRichRequest) -> Self {
        let suggested_chip_list = if request.quick_replies.is_empty() {
            None
        } else {
            Some(SuggestedChipList {
                suggestions: request.quick_replies.iter().map(Suggestion::from).collect(),
            })
        };
        SendMessageRequest {
            rcs_message: OutgoingRcsMessage {
                text_message: &request.text,
                suggested_chip_list,
            },
            message_contact: MessageContact {
                user_contact: request.destination.clone(),
            },
        }
    }
}

// --- shared ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContact {
    pub user_contact: String,
}

// --- incoming ---

/// Success body of a send.
#[derive(Debug, Deserialize)]
pub struct SendMessageResponse {
    #[serde(rename = "RCSMessage", default)]
    pub rcs_message: Option<SentRcsMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentRcsMessage {
    #[serde(default)]
    pub msg_id: Option<String>,
}

/// A webhook callback body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub message_contact: Option<MessageContact>,
    #[serde(rename = "RCSMessage", default)]
    pub rcs_message: Option<IncomingRcsMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingRcsMessage {
    #[serde(default)]
    pub msg_id: Option<String>,
    #[serde(default)]
    pub text_message: Option<String>,
    #[serde(default)]
    pub suggested_response: Option<SuggestedResponse>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestedResponse {
    pub response: SuggestionResponse,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionResponse {
    #[serde(default)]
    pub reply: Option<ReplyResponse>,
    #[serde(default)]
    pub action: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyResponse {
    pub display_text: String,
    #[serde(default)]
    pub postback: Option<PostbackData>,
}

#[derive(Debug, Deserialize)]
pub struct PostbackData {
    pub data: String,
}
