//! One-level reference expansion.
//!
//! Each reference line of a note is swapped for the referenced note's title
//! and lines. The referenced lines are copied verbatim, so any references
//! they hold stay unexpanded.

use serde_json::{Map, Value, json};
use std::collections::HashMap;

use super::content::{self, NoteContent, keys};
use crate::models::Note;

/// Text of the placeholder line for a reference whose target is gone
pub const MISSING_REFERENCE_TEXT: &str = "Referenced note not found";

/// Expand the reference lines of `raw`.
///
/// `lookup` resolves a referenced note id; `Ok(None)` yields a placeholder
/// line. Returns `Ok(None)` when `raw` has no line list to expand (free text
/// or unparseable content), in which case the caller keeps the note as is.
pub fn expand_content<F, E>(raw: &str, mut lookup: F) -> Result<Option<String>, E>
where
    F: FnMut(&str) -> Result<Option<Note>, E>,
{
    let lines = match NoteContent::parse(raw) {
        Ok(NoteContent::Lines(lines)) => lines,
        Ok(NoteContent::FreeText(_)) => return Ok(None),
        Err(e) => {
            log::warn!("[EXPAND] Leaving note unexpanded: {}", e);
            return Ok(None);
        }
    };

    let mut resolved: HashMap<String, Option<Note>> = HashMap::new();
    let mut expanded = Vec::with_capacity(lines.len());

    for line in lines {
        let Some(reference) = content::as_reference(&line) else {
            expanded.push(line);
            continue;
        };

        let target_id = reference.referenced_note_id.to_string();
        if !resolved.contains_key(&target_id) {
            let note = lookup(&target_id)?;
            resolved.insert(target_id.clone(), note);
        }

        let replacement = match resolved.get(&target_id).and_then(Option::as_ref) {
            Some(note) => expanded_note(reference.id, note),
            None => missing_placeholder(reference.id, &target_id),
        };
        expanded.push(replacement);
    }

    Ok(Some(NoteContent::Lines(expanded).to_json_string()))
}

fn expanded_note(reference_id: Option<&str>, note: &Note) -> Value {
    let lines = match NoteContent::parse(&note.content) {
        Ok(content) => content.into_lines(),
        Err(e) => {
            log::warn!("[EXPAND] Referenced note {} has unreadable content: {}", note.id, e);
            Vec::new()
        }
    };

    let mut obj = Map::new();
    obj.insert(keys::ID.to_string(), json!(note.id));
    obj.insert(keys::TITLE.to_string(), json!(note.title));
    obj.insert(keys::CONTENT.to_string(), Value::Array(lines));
    obj.insert(keys::LAST_MODIFIED.to_string(), json!(note.last_modified));
    obj.insert("isExpanded".to_string(), json!(true));
    if let Some(reference_id) = reference_id {
        obj.insert("referenceId".to_string(), json!(reference_id));
    }
    Value::Object(obj)
}

fn missing_placeholder(reference_id: Option<&str>, target_id: &str) -> Value {
    let mut obj = Map::new();
    if let Some(reference_id) = reference_id {
        obj.insert(keys::ID.to_string(), json!(reference_id));
    }
    obj.insert(keys::TEXT.to_string(), json!(MISSING_REFERENCE_TEXT));
    obj.insert(keys::IS_REFERENCE.to_string(), json!(true));
    obj.insert(keys::REFERENCED_NOTE_ID.to_string(), json!(target_id));
    obj.insert("missing".to_string(), json!(true));
    Value::Object(obj)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn note(id: &str, title: &str, content: &str) -> Note {
        Note {
            id: id.to_string(),
            user_id: "user1".to_string(),
            folder_id: None,
            title: title.to_string(),
            content: content.to_string(),
            last_modified: 7,
        }
    }

    fn lookup_in(notes: &[Note]) -> impl FnMut(&str) -> Result<Option<Note>, Infallible> + '_ {
        move |id: &str| Ok(notes.iter().find(|n| n.id == id).cloned())
    }

    fn lines_of(raw: &str) -> Vec<Value> {
        NoteContent::parse(raw).unwrap().into_lines()
    }

    #[test]
    fn test_expands_reference_with_title_and_lines() {
        let notes = [note("pantry", "Pantry", r#"{"lines":[{"id":"p1","text":"Rice"}]}"#)];
        let raw = r#"{"lines":[
            {"id":"a","text":"Milk"},
            {"id":"r1","text":"Pantry","isReference":true,"referencedNoteId":"pantry"}
        ]}"#;

        let expanded = expand_content(raw, lookup_in(&notes)).unwrap().unwrap();
        let lines = lines_of(&expanded);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["text"], "Milk");
        assert_eq!(lines[1]["id"], "pantry");
        assert_eq!(lines[1]["title"], "Pantry");
        assert_eq!(lines[1]["referenceId"], "r1");
        assert_eq!(lines[1]["content"][0]["text"], "Rice");
        assert_eq!(lines[1]["lastModified"], 7);
    }

    #[test]
    fn test_missing_reference_becomes_placeholder() {
        let raw = r#"{"lines":[{"id":"r1","isReference":true,"referencedNoteId":"gone"}]}"#;
        let expanded = expand_content(raw, lookup_in(&[])).unwrap().unwrap();
        let lines = lines_of(&expanded);
        assert_eq!(lines[0]["text"], MISSING_REFERENCE_TEXT);
        assert_eq!(lines[0]["missing"], true);
        assert_eq!(lines[0]["referencedNoteId"], "gone");
        assert_eq!(lines[0]["id"], "r1");
    }

    #[test]
    fn test_expansion_stops_after_one_level() {
        let notes = [
            note(
                "middle",
                "Middle",
                r#"{"lines":[{"id":"m1","isReference":true,"referencedNoteId":"leaf"}]}"#,
            ),
            note("leaf", "Leaf", r#"{"lines":[{"id":"l1","text":"deep"}]}"#),
        ];
        let raw = r#"{"lines":[{"id":"r1","isReference":true,"referencedNoteId":"middle"}]}"#;

        let mut calls = Vec::new();
        let expanded = expand_content(raw, |id: &str| {
            calls.push(id.to_string());
            Ok::<_, Infallible>(notes.iter().find(|n| n.id == id).cloned())
        })
        .unwrap()
        .unwrap();

        assert_eq!(calls, vec!["middle"]);
        let nested = &lines_of(&expanded)[0]["content"][0];
        assert_eq!(nested["referencedNoteId"], "leaf");
        assert!(nested.get("title").is_none(), "nested reference must stay a reference");
    }

    #[test]
    fn test_self_reference_does_not_recurse() {
        let raw = r#"{"lines":[{"id":"r1","isReference":true,"referencedNoteId":"loop"}]}"#;
        let notes = [note("loop", "Loop", raw)];
        let expanded = expand_content(raw, lookup_in(&notes)).unwrap().unwrap();
        let nested = &lines_of(&expanded)[0]["content"][0];
        assert_eq!(nested["referencedNoteId"], "loop");
    }

    #[test]
    fn test_repeated_reference_is_looked_up_once() {
        let notes = [note("n", "N", r#"{"freeText":"a\nb"}"#)];
        let raw = r#"[{"id":"r1","referencedNoteId":"n"},{"id":"r2","referencedNoteId":"n"}]"#;
        let mut calls = 0;
        let expanded = expand_content(raw, |id: &str| {
            calls += 1;
            Ok::<_, Infallible>(notes.iter().find(|n| n.id == id).cloned())
        })
        .unwrap()
        .unwrap();

        assert_eq!(calls, 1);
        let lines = lines_of(&expanded);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["content"][1]["text"], "b");
    }

    #[test]
    fn test_free_text_and_garbage_are_not_expanded() {
        assert!(expand_content(r#"{"freeText":"x"}"#, lookup_in(&[])).unwrap().is_none());
        assert!(expand_content("{oops", lookup_in(&[])).unwrap().is_none());
    }

    #[test]
    fn test_lookup_error_propagates() {
        let raw = r#"{"lines":[{"id":"r1","referencedNoteId":"n"}]}"#;
        let result = expand_content(raw, |_: &str| Err::<Option<Note>, _>("db down"));
        assert_eq!(result, Err("db down"));
    }
}
