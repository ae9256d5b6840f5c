//! Note content JSON.
//!
//! Content is stored as an opaque string in one of two shapes:
//! `{"lines": [{"id", "text", "checked", "isReference", "referencedNoteId"}, ...]}`
//! or `{"freeText": "..."}`. A bare array of lines is accepted on read.
//! Lines are kept as JSON values so keys this service does not know survive
//! a rewrite.

use serde_json::{json, Map, Value};

pub mod keys {
    pub const LINES: &str = "lines";
    pub const FREE_TEXT: &str = "freeText";
    pub const ID: &str = "id";
    pub const TEXT: &str = "text";
    pub const CHECKED: &str = "checked";
    pub const IS_REFERENCE: &str = "isReference";
    pub const REFERENCED_NOTE_ID: &str = "referencedNoteId";
    pub const DISPLAY_TITLE: &str = "displayTitle";
    pub const TITLE: &str = "title";
    pub const CONTENT: &str = "content";
    pub const LAST_MODIFIED: &str = "lastModified";
}

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("content is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("content is neither a line list nor free text")]
    UnknownShape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NoteContent {
    Lines(Vec<Value>),
    FreeText(String),
}

impl NoteContent {
    /// Parse stored content. Blank content reads as an empty line list.
    pub fn parse(raw: &str) -> Result<Self, ContentError> {
        if raw.trim().is_empty() {
            return Ok(NoteContent::Lines(Vec::new()));
        }

        match serde_json::from_str::<Value>(raw)? {
            Value::Array(lines) => Ok(NoteContent::Lines(lines)),
            Value::Object(mut obj) => {
                if let Some(Value::Array(lines)) = obj.remove(keys::LINES) {
                    Ok(NoteContent::Lines(lines))
                } else if let Some(Value::String(text)) = obj.remove(keys::FREE_TEXT) {
                    Ok(NoteContent::FreeText(text))
                } else {
                    Err(ContentError::UnknownShape)
                }
            }
            _ => Err(ContentError::UnknownShape),
        }
    }

    /// Lines of this content; free text is split into plain lines.
    pub fn into_lines(self) -> Vec<Value> {
        match self {
            NoteContent::Lines(lines) => lines,
            NoteContent::FreeText(text) => free_text_to_lines(&text),
        }
    }

    /// Serialize back into the canonical `{"lines": ...}` / `{"freeText": ...}` form
    pub fn to_json_string(&self) -> String {
        let value = match self {
            NoteContent::Lines(lines) => json!({ "lines": lines }),
            NoteContent::FreeText(text) => json!({ "freeText": text }),
        };
        value.to_string()
    }
}

/// One unchecked line per text line, with ids `line_0`, `line_1`, ...
pub fn free_text_to_lines(text: &str) -> Vec<Value> {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            json!({
                "id": format!("line_{}", i),
                "text": line,
                "checked": false,
            })
        })
        .collect()
}

/// A line that points at another note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceLine<'a> {
    pub id: Option<&'a str>,
    pub referenced_note_id: &'a str,
}

/// Recognise a reference line: it carries `referencedNoteId` and is not
/// explicitly flagged `"isReference": false`.
pub fn as_reference(line: &Value) -> Option<ReferenceLine<'_>> {
    let obj = line.as_object()?;
    let referenced_note_id = obj.get(keys::REFERENCED_NOTE_ID)?.as_str()?;
    if obj.get(keys::IS_REFERENCE).and_then(Value::as_bool) == Some(false) {
        return None;
    }
    Some(ReferenceLine {
        id: obj.get(keys::ID).and_then(Value::as_str),
        referenced_note_id,
    })
}

/// The line appended to a parent note when a reference is created
pub fn reference_line(reference_id: &str, referenced_note_id: &str, display_title: &str) -> Value {
    let mut line = Map::new();
    line.insert(keys::ID.to_string(), json!(reference_id));
    line.insert(keys::TEXT.to_string(), json!(display_title));
    line.insert(keys::CHECKED.to_string(), json!(false));
    line.insert(keys::IS_REFERENCE.to_string(), json!(true));
    line.insert(keys::REFERENCED_NOTE_ID.to_string(), json!(referenced_note_id));
    line.insert(keys::DISPLAY_TITLE.to_string(), json!(display_title));
    Value::Object(line)
}

/// Append a reference line to `raw`. Free text becomes lines first.
pub fn append_reference(
    raw: &str,
    reference_id: &str,
    referenced_note_id: &str,
    display_title: &str,
) -> Result<String, ContentError> {
    let mut lines = NoteContent::parse(raw)?.into_lines();
    lines.push(reference_line(reference_id, referenced_note_id, display_title));
    Ok(NoteContent::Lines(lines).to_json_string())
}

/// Drop every line whose id is in `ids`. `Ok(None)` when nothing matched,
/// so callers can skip the write.
pub fn remove_lines(raw: &str, ids: &[String]) -> Result<Option<String>, ContentError> {
    let NoteContent::Lines(lines) = NoteContent::parse(raw)? else {
        return Ok(None);
    };

    let before = lines.len();
    let kept: Vec<Value> = lines
        .into_iter()
        .filter(|line| {
            line.get(keys::ID)
                .and_then(Value::as_str)
                .is_none_or(|id| !ids.iter().any(|r| r == id))
        })
        .collect();

    if kept.len() == before {
        return Ok(None);
    }
    Ok(Some(NoteContent::Lines(kept).to_json_string()))
}

/// Give reference lines new ids according to `renamed` (old id to new id).
/// `Ok(None)` when no line matched.
pub fn rename_reference_ids(raw: &str, renamed: &[(String, String)]) -> Result<Option<String>, ContentError> {
    let NoteContent::Lines(mut lines) = NoteContent::parse(raw)? else {
        return Ok(None);
    };

    let mut changed = false;
    for line in lines.iter_mut() {
        let Some(old_id) = as_reference(line).and_then(|r| r.id).map(str::to_string) else {
            continue;
        };
        if let Some((_, new_id)) = renamed.iter().find(|(old, _)| *old == old_id) {
            if let Some(obj) = line.as_object_mut() {
                obj.insert(keys::ID.to_string(), Value::String(new_id.clone()));
                changed = true;
            }
        }
    }

    if !changed {
        return Ok(None);
    }
    Ok(Some(NoteContent::Lines(lines).to_json_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shapes() {
        let lines = NoteContent::parse(r#"{"lines":[{"id":"a","text":"Milk"}]}"#).unwrap();
        assert!(matches!(lines, NoteContent::Lines(ref l) if l.len() == 1));

        let bare = NoteContent::parse(r#"[{"id":"a","text":"Milk"},{"id":"b","text":"Eggs"}]"#).unwrap();
        assert!(matches!(bare, NoteContent::Lines(ref l) if l.len() == 2));

        let text = NoteContent::parse(r#"{"freeText":"hello\nworld"}"#).unwrap();
        assert_eq!(text, NoteContent::FreeText("hello\nworld".to_string()));

        assert_eq!(NoteContent::parse("  ").unwrap(), NoteContent::Lines(vec![]));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(NoteContent::parse("not json"), Err(ContentError::Json(_))));
        assert!(matches!(NoteContent::parse(r#"{"other":1}"#), Err(ContentError::UnknownShape)));
        assert!(matches!(NoteContent::parse("42"), Err(ContentError::UnknownShape)));
    }

    #[test]
    fn test_free_text_to_lines() {
        let lines = free_text_to_lines("one\ntwo");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1][keys::ID], "line_1");
        assert_eq!(lines[1][keys::TEXT], "two");
        assert_eq!(lines[1][keys::CHECKED], false);
    }

    #[test]
    fn test_as_reference() {
        let flagged = json!({"id": "r1", "isReference": true, "referencedNoteId": "n2"});
        assert_eq!(
            as_reference(&flagged),
            Some(ReferenceLine { id: Some("r1"), referenced_note_id: "n2" })
        );

        // Lines written without the flag still count
        let legacy = json!({"id": "r2", "referencedNoteId": "n3", "displayTitle": "x"});
        assert_eq!(as_reference(&legacy).unwrap().referenced_note_id, "n3");

        let disabled = json!({"id": "r3", "isReference": false, "referencedNoteId": "n4"});
        assert!(as_reference(&disabled).is_none());

        assert!(as_reference(&json!({"id": "l", "text": "plain"})).is_none());
        assert!(as_reference(&json!("text")).is_none());
    }

    #[test]
    fn test_append_reference_keeps_unknown_keys() {
        let raw = r#"{"lines":[{"id":"a","text":"Milk","color":"red"}]}"#;
        let updated = append_reference(raw, "ref1", "n2", "Pantry").unwrap();

        let NoteContent::Lines(lines) = NoteContent::parse(&updated).unwrap() else {
            panic!("expected lines");
        };
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["color"], "red");
        assert_eq!(lines[1][keys::ID], "ref1");
        assert_eq!(lines[1][keys::REFERENCED_NOTE_ID], "n2");
        assert_eq!(lines[1][keys::IS_REFERENCE], true);
        assert_eq!(lines[1][keys::TEXT], "Pantry");
    }

    #[test]
    fn test_append_reference_converts_free_text() {
        let updated = append_reference(r#"{"freeText":"a\nb"}"#, "ref1", "n2", "T").unwrap();
        let lines = NoteContent::parse(&updated).unwrap().into_lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0][keys::TEXT], "a");
    }

    #[test]
    fn test_remove_lines() {
        let raw = r#"{"lines":[{"id":"a","text":"x"},{"id":"ref1","referencedNoteId":"n2"},{"text":"no id"}]}"#;
        let updated = remove_lines(raw, &["ref1".to_string()]).unwrap().unwrap();
        let lines = NoteContent::parse(&updated).unwrap().into_lines();
        assert_eq!(lines.len(), 2);

        assert!(remove_lines(raw, &["zzz".to_string()]).unwrap().is_none());
        assert!(remove_lines(r#"{"freeText":"x"}"#, &["a".to_string()]).unwrap().is_none());
    }

    #[test]
    fn test_rename_reference_ids() {
        let raw = r#"{"lines":[{"id":"r1","isReference":true,"referencedNoteId":"n2"},{"id":"r1x","text":"plain"}]}"#;
        let renamed = vec![("r1".to_string(), "r9".to_string()), ("r1x".to_string(), "nope".to_string())];
        let updated = rename_reference_ids(raw, &renamed).unwrap().unwrap();
        let lines = NoteContent::parse(&updated).unwrap().into_lines();
        assert_eq!(lines[0]["id"], "r9");
        assert_eq!(lines[0]["referencedNoteId"], "n2");
        // Plain lines keep their ids
        assert_eq!(lines[1]["id"], "r1x");

        assert!(rename_reference_ids(r#"{"freeText":"x"}"#, &renamed).unwrap().is_none());
    }
}
