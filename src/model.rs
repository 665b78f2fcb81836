use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rustc_serialize::json::{Json, Object, ToJson};

use crate::error::StoreError;

/// A single post record.
///
/// `extra` holds attributes merged in by a full update that carried fields
/// other than `title` and `content`. They are encoded inline next to the
/// recognized fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    id: u32,
    pub title: String,
    pub content: String,
    pub extra: BTreeMap<String, Json>,
}

impl Post {
    pub fn new(id: u32, title: &str, content: &str) -> Post {
        Post {
            id,
            title: title.to_string(),
            content: content.to_string(),
            extra: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    fn field(&self, field: SortField) -> &str {
        match field {
            SortField::Title => &self.title,
            SortField::Content => &self.content,
        }
    }

    pub fn cmp_by(&self, other: &Post, field: SortField) -> ::std::cmp::Ordering {
        self.field(field).cmp(other.field(field))
    }
}

impl ToJson for Post {
    fn to_json(&self) -> Json {
        let mut object = self.extra.clone();
        object.insert("id".to_string(), Json::U64(self.id as u64));
        object.insert("title".to_string(), Json::String(self.title.clone()));
        object.insert("content".to_string(), Json::String(self.content.clone()));
        Json::Object(object)
    }
}

/// Candidate record for `PostStore::create`. Both fields must be present.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostDraft {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl PostDraft {
    pub fn new(title: &str, content: &str) -> PostDraft {
        PostDraft {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
        }
    }

    pub fn from_json(object: &Object) -> PostDraft {
        PostDraft {
            title: object.get("title").map(text_of),
            content: object.get("content").map(text_of),
        }
    }
}

/// Input for `PostStore::update`.
///
/// Any key other than `title` and `content` ends up in `extra`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub extra: BTreeMap<String, Json>,
}

impl PostPatch {
    pub fn title(title: &str) -> PostPatch {
        PostPatch { title: Some(title.to_string()), ..PostPatch::default() }
    }

    pub fn content(content: &str) -> PostPatch {
        PostPatch { content: Some(content.to_string()), ..PostPatch::default() }
    }

    pub fn from_json(object: &Object) -> PostPatch {
        let mut patch = PostPatch::default();
        for (key, value) in object {
            match key.as_str() {
                "title" => patch.title = Some(text_of(value)),
                "content" => patch.content = Some(text_of(value)),
                _ => {
                    patch.extra.insert(key.clone(), value.clone());
                }
            }
        }
        patch
    }
}

/// Strings are taken verbatim, anything else as its JSON text.
fn text_of(value: &Json) -> String {
    match *value {
        Json::String(ref s) => s.clone(),
        ref other => other.to_string(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    Title,
    Content,
}

impl FromStr for SortField {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<SortField, StoreError> {
        match s {
            "title" => Ok(SortField::Title),
            "content" => Ok(SortField::Content),
            _ => Err(StoreError::InvalidParameter),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SortField::Title => write!(f, "title"),
            SortField::Content => write!(f, "content"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl FromStr for Direction {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Direction, StoreError> {
        match s {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(StoreError::InvalidParameter),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Direction::Asc => write!(f, "asc"),
            Direction::Desc => write!(f, "desc"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: Direction,
}

impl SortOrder {
    /// Both parts or neither; a lone sort field or direction is rejected.
    pub fn parse(field: Option<&str>, direction: Option<&str>) -> Result<Option<SortOrder>, StoreError> {
        match (field, direction) {
            (None, None) => Ok(None),
            (Some(field), Some(direction)) => {
                Ok(Some(SortOrder { field: field.parse()?, direction: direction.parse()? }))
            }
            _ => Err(StoreError::InvalidParameter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(source: &str) -> Object {
        match Json::from_str(source).unwrap() {
            Json::Object(object) => object,
            other => panic!("not an object: {}", other),
        }
    }

    #[test]
    fn test_post_encodes_extra_inline() {
        let mut post = Post::new(7, "t", "c");
        post.extra.insert("tag".to_string(), Json::String("rust".to_string()));
        let json = post.to_json();
        let encoded = json.as_object().unwrap();
        assert_eq!(encoded.get("id"), Some(&Json::U64(7)));
        assert_eq!(encoded.get("title"), Some(&Json::String("t".to_string())));
        assert_eq!(encoded.get("tag"), Some(&Json::String("rust".to_string())));
        assert_eq!(encoded.len(), 4);
    }

    #[test]
    fn test_draft_keeps_presence_of_non_string_values() {
        let draft = PostDraft::from_json(&object(r#"{"title": 42, "content": ""}"#));
        assert_eq!(draft.title.as_deref(), Some("42"));
        assert_eq!(draft.content.as_deref(), Some(""));

        let draft = PostDraft::from_json(&object(r#"{"title": "only"}"#));
        assert_eq!(draft.content, None);
    }

    #[test]
    fn test_patch_splits_recognized_and_extra_keys() {
        let patch = PostPatch::from_json(&object(r#"{"title": "a", "content": "b", "mood": true}"#));
        assert_eq!(patch.title.as_deref(), Some("a"));
        assert_eq!(patch.content.as_deref(), Some("b"));
        assert_eq!(patch.extra.get("mood"), Some(&Json::Boolean(true)));
        assert!(!patch.extra.contains_key("title"));

        assert_eq!(PostPatch::title("x").content, None);
        assert_eq!(PostPatch::from_json(&Object::new()), PostPatch::default());
    }

    #[test]
    fn test_sort_order_requires_both_parts() {
        assert_eq!(SortOrder::parse(None, None).unwrap(), None);
        assert_eq!(
            SortOrder::parse(Some("title"), Some("desc")).unwrap(),
            Some(SortOrder { field: SortField::Title, direction: Direction::Desc })
        );
        assert!(SortOrder::parse(Some("title"), None).is_err());
        assert!(SortOrder::parse(None, Some("asc")).is_err());
        assert!(SortOrder::parse(Some("author"), Some("asc")).is_err());
        assert!(SortOrder::parse(Some("content"), Some("up")).is_err());
    }

    #[test]
    fn test_sort_field_display_round_trips() {
        assert_eq!(SortField::Content.to_string().parse::<SortField>().unwrap(), SortField::Content);
        assert_eq!(Direction::Desc.to_string(), "desc");
    }
}
