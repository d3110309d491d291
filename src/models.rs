use serde::{Deserialize, Serialize};

// Who authored a message. `Pending` marks a UI placeholder awaiting a reply.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Pending,
}

// Citation attached to an assistant answer
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Source {
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub position: u32,
}

// Represents a single message in a conversation
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_open_chat: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meta_data: Vec<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_analysis: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_loading: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_confluence_search: Option<bool>,
}

impl Message {
    /// A message with only `role` and `content` set.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            content: content.into(),
            is_open_chat: None,
            meta_data: Vec::new(),
            is_analysis: None,
            prompt: None,
            show_loading: None,
            is_confluence_search: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

/// `{role, content}` pair sent to the model; everything else is UI-only.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RawMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Conversation {
    pub id: i64,
    #[serde(default)]
    pub messages: Vec<Message>,
}

// --- Search side panels ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct ImageResult {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct NewsItem {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct RelatedSearch {
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Everything the chat UI renders from.
///
/// `ChatState::default()` is the initial state restored by a full reset.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatState {
    pub error: String,
    pub loading: bool,
    pub active_conversation_id: Option<i64>,
    pub conversations: Vec<Conversation>,
    pub selected_text: Option<String>,
    pub show_related_searches: bool,
    pub show_image_section: bool,
    pub show_news_section: bool,
    pub images: Vec<ImageResult>,
    pub news: Vec<NewsItem>,
    pub related_searches: Vec<RelatedSearch>,
    pub doc_id_list: Vec<String>,
    pub is_completed: bool,
    pub blog_content: String,
    pub active_prompt: String,
}

impl ChatState {
    pub fn active_conversation(&self) -> Option<&Conversation> {
        let id = self.active_conversation_id?;
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Shallow merge: every field present in `patch` replaces the current one.
    pub fn merged(&self, patch: ChatStatePatch) -> ChatState {
        let mut next = self.clone();
        if let Some(error) = patch.error {
            next.error = error;
        }
        if let Some(loading) = patch.loading {
            next.loading = loading;
        }
        if let Some(active_conversation_id) = patch.active_conversation_id {
            next.active_conversation_id = active_conversation_id;
        }
        if let Some(conversations) = patch.conversations {
            next.conversations = conversations;
        }
        if let Some(selected_text) = patch.selected_text {
            next.selected_text = selected_text;
        }
        if let Some(flag) = patch.show_related_searches {
            next.show_related_searches = flag;
        }
        if let Some(flag) = patch.show_image_section {
            next.show_image_section = flag;
        }
        if let Some(flag) = patch.show_news_section {
            next.show_news_section = flag;
        }
        if let Some(images) = patch.images {
            next.images = images;
        }
        if let Some(news) = patch.news {
            next.news = news;
        }
        if let Some(related_searches) = patch.related_searches {
            next.related_searches = related_searches;
        }
        if let Some(doc_id_list) = patch.doc_id_list {
            next.doc_id_list = doc_id_list;
        }
        if let Some(is_completed) = patch.is_completed {
            next.is_completed = is_completed;
        }
        if let Some(blog_content) = patch.blog_content {
            next.blog_content = blog_content;
        }
        if let Some(active_prompt) = patch.active_prompt {
            next.active_prompt = active_prompt;
        }
        next
    }
}

/// Partial [`ChatState`]. `None` leaves a field untouched; nullable fields
/// use `Some(None)` to clear.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ChatStatePatch {
    pub error: Option<String>,
    pub loading: Option<bool>,
    pub active_conversation_id: Option<Option<i64>>,
    pub conversations: Option<Vec<Conversation>>,
    pub selected_text: Option<Option<String>>,
    pub show_related_searches: Option<bool>,
    pub show_image_section: Option<bool>,
    pub show_news_section: Option<bool>,
    pub images: Option<Vec<ImageResult>>,
    pub news: Option<Vec<NewsItem>>,
    pub related_searches: Option<Vec<RelatedSearch>>,
    pub doc_id_list: Option<Vec<String>>,
    pub is_completed: Option<bool>,
    pub blog_content: Option<String>,
    pub active_prompt: Option<String>,
}

impl From<ChatState> for ChatStatePatch {
    // A patch carrying every field; merging it replaces the whole state.
    fn from(state: ChatState) -> Self {
        Self {
            error: Some(state.error),
            loading: Some(state.loading),
            active_conversation_id: Some(state.active_conversation_id),
            conversations: Some(state.conversations),
            selected_text: Some(state.selected_text),
            show_related_searches: Some(state.show_related_searches),
            show_image_section: Some(state.show_image_section),
            show_news_section: Some(state.show_news_section),
            images: Some(state.images),
            news: Some(state.news),
            related_searches: Some(state.related_searches),
            doc_id_list: Some(state.doc_id_list),
            is_completed: Some(state.is_completed),
            blog_content: Some(state.blog_content),
            active_prompt: Some(state.active_prompt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_deserializes_camel_case_fields() {
        let json = r#"{
            "id": 4,
            "role": "assistant",
            "content": "hi",
            "isOpenChat": true,
            "metaData": [{"link": "https://a", "snippet": "s", "title": "t", "position": 1}]
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, Some(4));
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.is_open_chat, Some(true));
        assert_eq!(msg.meta_data.len(), 1);
        assert_eq!(msg.meta_data[0].position, 1);
        assert_eq!(msg.prompt, None);
    }

    #[test]
    fn conversation_without_messages_defaults_to_empty() {
        let convo: Conversation = serde_json::from_str(r#"{"id": 9}"#).unwrap();
        assert_eq!(convo.id, 9);
        assert!(convo.messages.is_empty());
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = serde_json::from_str::<Message>(r#"{"role": "tool", "content": ""}"#);
        assert!(err.is_err());
    }

    #[test]
    fn merged_replaces_only_present_fields() {
        let state = ChatState {
            error: "boom".into(),
            blog_content: "draft".into(),
            ..ChatState::default()
        };
        let next = state.merged(ChatStatePatch {
            error: Some(String::new()),
            show_news_section: Some(true),
            ..ChatStatePatch::default()
        });
        assert_eq!(next.error, "");
        assert!(next.show_news_section);
        assert_eq!(next.blog_content, "draft");
    }

    #[test]
    fn merged_can_clear_nullable_fields() {
        let state = ChatState {
            active_conversation_id: Some(3),
            selected_text: Some("quote".into()),
            ..ChatState::default()
        };
        let next = state.merged(ChatStatePatch {
            active_conversation_id: Some(None),
            selected_text: Some(None),
            ..ChatStatePatch::default()
        });
        assert_eq!(next.active_conversation_id, None);
        assert_eq!(next.selected_text, None);
    }

    #[test]
    fn full_patch_replaces_everything() {
        let dirty = ChatState {
            loading: true,
            active_conversation_id: Some(1),
            conversations: vec![Conversation { id: 1, messages: vec![] }],
            doc_id_list: vec!["a".into()],
            ..ChatState::default()
        };
        assert_eq!(dirty.merged(ChatState::default().into()), ChatState::default());
    }

    #[test]
    fn active_conversation_tolerates_dangling_id() {
        let state = ChatState {
            active_conversation_id: Some(42),
            conversations: vec![Conversation { id: 1, messages: vec![] }],
            ..ChatState::default()
        };
        assert!(state.active_conversation().is_none());
    }
}
