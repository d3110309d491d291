// Named chat operations invoked by the UI.
//
// Each one computes a partial state and merges it into the store; the async
// ones call the backend first and fold the response in.

use crate::api::DeltaStream;
use crate::models::{ChatState, ChatStatePatch, Conversation, Message, RawMessage, Role};
use crate::prompts;
use crate::state::AppState;
use anyhow::{Context, Result};
use futures::StreamExt;
use serde_json::{json, Value};

// Written to `error` when the Jira integration fails
pub const JIRA_ERROR: &str = "error";

/// Shallow-merges `patch` into the current state.
pub fn set(state: &AppState, patch: ChatStatePatch) {
    state.store.update(|s| s.merged(patch));
}

// --- Setters ---

pub fn set_active_conversation_id(state: &AppState, id: i64) {
    set(state, ChatStatePatch {
        active_conversation_id: Some(Some(id)),
        ..Default::default()
    });
}

pub fn set_prompt_template(state: &AppState, prompt: &str) {
    set(state, ChatStatePatch {
        active_prompt: Some(prompt.to_string()),
        ..Default::default()
    });
}

pub fn reset_prompt_template(state: &AppState) {
    set_prompt_template(state, "");
}

pub fn set_selected_text(state: &AppState, text: &str) {
    set(state, ChatStatePatch {
        selected_text: Some(Some(text.to_string())),
        ..Default::default()
    });
}

pub fn set_show_related_searches(state: &AppState, flag: bool) {
    set(state, ChatStatePatch {
        show_related_searches: Some(flag),
        ..Default::default()
    });
}

pub fn set_show_image_section(state: &AppState, flag: bool) {
    set(state, ChatStatePatch {
        show_image_section: Some(flag),
        ..Default::default()
    });
}

pub fn set_show_news_section(state: &AppState, flag: bool) {
    set(state, ChatStatePatch {
        show_news_section: Some(flag),
        ..Default::default()
    });
}

pub fn update_doc_id_list(state: &AppState, doc_list: Vec<String>) {
    set(state, ChatStatePatch {
        doc_id_list: Some(doc_list),
        ..Default::default()
    });
}

pub fn reset_complete(state: &AppState) {
    set(state, ChatStatePatch {
        is_completed: Some(false),
        ..Default::default()
    });
}

pub fn reset_error(state: &AppState) {
    set(state, ChatStatePatch {
        error: Some(String::new()),
        ..Default::default()
    });
}

/// Restores the initial state, dropping every conversation.
pub fn reset_all(state: &AppState) {
    set(state, ChatState::default().into());
}

/// Appends a streamed fragment to `blog_content`.
pub fn update_blog_content(state: &AppState, content: &str) {
    state.store.update(|s| {
        s.merged(ChatStatePatch {
            blog_content: Some(format!("{}{}", s.blog_content, content)),
            ..Default::default()
        })
    });
}

/// Feeds every fragment of `stream` through [`update_blog_content`].
/// Stops at the first stream error; fragments already received stay.
pub async fn stream_blog_content(state: &AppState, mut stream: DeltaStream) -> Result<()> {
    let mut fragments = 0usize;
    while let Some(fragment) = stream.next().await {
        let fragment = fragment.context("Blog content stream failed")?;
        update_blog_content(state, &fragment);
        fragments += 1;
    }
    log::debug!("Blog content stream finished after {} fragment(s)", fragments);
    Ok(())
}

// --- Getters ---

pub fn get_selected_text(state: &AppState) -> Option<String> {
    state.store.get().selected_text
}

pub fn get_show_related_searches(state: &AppState) -> bool {
    state.store.get().show_related_searches
}

pub fn get_show_image_section(state: &AppState) -> bool {
    state.store.get().show_image_section
}

pub fn get_show_news_section(state: &AppState) -> bool {
    state.store.get().show_news_section
}

pub fn get_doc_id_list(state: &AppState) -> Vec<String> {
    state.store.get().doc_id_list
}

pub fn get_blog_content(state: &AppState) -> String {
    state.store.get().blog_content
}

pub fn get_prompt_template(state: &AppState) -> &'static str {
    prompts::prompt_template(&state.store.get().active_prompt)
}

pub fn get_active_conversation(state: &AppState) -> Option<Conversation> {
    state.store.get().active_conversation().cloned()
}

/// History of the active conversation as sent to the model: pending
/// placeholders dropped, only `role` and `content` kept.
pub fn get_raw_messages(state: &AppState) -> Vec<RawMessage> {
    let Some(conversation) = get_active_conversation(state) else {
        return Vec::new();
    };

    conversation
        .messages
        .into_iter()
        .filter(|message| message.role != Role::Pending)
        .map(|message| RawMessage {
            role: message.role,
            content: message.content,
        })
        .collect()
}

// --- Active conversation edits ---

// Rebuilds the active conversation's message list with `edit`.
// Returns false, leaving the store untouched, when nothing is active.
fn edit_active_messages<F>(state: &AppState, edit: F) -> bool
where
    F: FnOnce(&[Message]) -> Vec<Message>,
{
    state.store.update_if(|s| {
        let active_id = s.active_conversation_id?;
        let position = s.conversations.iter().position(|c| c.id == active_id)?;
        let mut conversations = s.conversations.clone();
        let messages = edit(&conversations[position].messages);
        conversations[position].messages = messages;
        Some(s.merged(ChatStatePatch {
            conversations: Some(conversations),
            ..Default::default()
        }))
    })
}

pub fn insert_message_to_active(state: &AppState, message: Message) {
    let inserted = edit_active_messages(state, |messages| {
        let mut next = messages.to_vec();
        next.push(message);
        next
    });
    if !inserted {
        log::warn!("No active conversation, message not inserted");
    }
}

/// Drops every message of the active conversation whose id is `id`.
pub fn remove_message_from_active(state: &AppState, id: i64) {
    let edited = edit_active_messages(state, |messages| {
        messages
            .iter()
            .filter(|m| m.id != Some(id))
            .cloned()
            .collect()
    });
    if !edited {
        log::warn!("No active conversation, message {} not removed", id);
    }
}

// --- Backend-backed operations ---

// Makes `conversation` active and puts it at the head of the list.
fn adopt_conversation(state: &AppState, conversation: Conversation) {
    state.store.update(|s| {
        let id = conversation.id;
        let mut conversations = Vec::with_capacity(s.conversations.len() + 1);
        conversations.push(conversation);
        conversations.extend(s.conversations.iter().cloned());
        s.merged(ChatStatePatch {
            active_conversation_id: Some(Some(id)),
            conversations: Some(conversations),
            ..Default::default()
        })
    });
}

/// Loads the conversations of a document, activating the first one.
/// A document without conversations gets a fresh one.
pub async fn fetch_conversations(state: &AppState, document_id: i64) -> Result<()> {
    log::info!("Fetching conversations for document {}", document_id);
    let data = state
        .api
        .get(&format!("/conversations?document_id={}", document_id))
        .await?;
    let conversations: Vec<Conversation> =
        serde_json::from_value(data).context("Failed to decode conversations")?;

    match conversations.first().map(|c| c.id) {
        Some(first_id) => {
            log::info!(
                "Loaded {} conversation(s) for document {}",
                conversations.len(),
                document_id
            );
            set(state, ChatStatePatch {
                conversations: Some(conversations),
                active_conversation_id: Some(Some(first_id)),
                ..Default::default()
            });
        }
        None => {
            log::info!("Document {} has no conversations, creating one", document_id);
            create_conversation(state, document_id).await?;
        }
    }
    Ok(())
}

pub async fn create_conversation(state: &AppState, document_id: i64) -> Result<Conversation> {
    let data = state
        .api
        .post(&format!("/conversations?document_id={}", document_id), None)
        .await?;
    let conversation: Conversation =
        serde_json::from_value(data).context("Failed to decode created conversation")?;
    log::info!(
        "Created conversation {} for document {}",
        conversation.id,
        document_id
    );

    adopt_conversation(state, conversation.clone());
    Ok(conversation)
}

/// Starts a conversation that is not tied to any document.
pub async fn create_open_conversation(state: &AppState) -> Result<Conversation> {
    let data = state.api.get("/conversations/open").await?;
    let conversation: Conversation =
        serde_json::from_value(data).context("Failed to decode open conversation")?;
    log::info!("Opened conversation {}", conversation.id);

    adopt_conversation(state, conversation.clone());
    Ok(conversation)
}

/// Rates the active conversation. State is left as is.
pub async fn score_conversation(state: &AppState, score: i32) -> Result<Value> {
    // The backend receives `null` when nothing is active.
    let conversation_id = match state.store.get().active_conversation_id {
        Some(id) => id.to_string(),
        None => {
            log::warn!("Scoring without an active conversation");
            "null".to_string()
        }
    };

    state
        .api
        .post(
            &format!("/scores?conversation_id={}", conversation_id),
            Some(json!({ "score": score })),
        )
        .await
}

/// Files a Jira ticket. Failures are logged and recorded as the generic
/// `"error"` string; the caller gets `None`.
pub async fn create_jira_ticket(state: &AppState, payload: Value) -> Option<Value> {
    match state.api.post("/integration/jira", Some(payload)).await {
        Ok(data) => {
            set(state, ChatStatePatch {
                is_completed: Some(true),
                ..Default::default()
            });
            Some(data)
        }
        Err(e) => {
            log::error!("Failed to create Jira ticket: {:?}", e);
            set(state, ChatStatePatch {
                error: Some(JIRA_ERROR.to_string()),
                ..Default::default()
            });
            None
        }
    }
}
