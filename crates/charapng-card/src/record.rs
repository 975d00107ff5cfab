//! Character card data model.
//!
//! The model follows the community character-card JSON schema. Cards in the
//! wild are loosely typed, so every field is optional and unknown keys are
//! kept in `extra` maps at each level. Known keys with an unexpected JSON
//! type are kept in `extra` as well. Decoding then re-encoding a card never
//! loses data.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::lenient::Fields;

/// The `spec` value of a V2 character card.
pub const SPEC_V2: &str = "chara_card_v2";

/// The `spec_version` value of a V2 character card.
pub const SPEC_VERSION_V2: &str = "2.0";

/// A complete character card.
///
/// V2 and V3 cards keep their content under `data`; legacy cards put the
/// narrative fields at the top level.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CharacterRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_mes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mes_example: Option<String>,

    /// The nested card content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<CardData>,

    /// Any other top-level keys, and known keys whose value did not fit.
    ///
    /// Remove a key from here when setting its typed field, or it is written twice.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The content of a card, found under the `data` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CardData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_mes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mes_example: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_history_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_greetings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_book: Option<CharacterBook>,

    /// Set on records synthesized from Stable Diffusion parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_sd_card: Option<bool>,
    /// The raw Stable Diffusion parameter text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A world book bundled with a character.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CharacterBook {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Entries that are not JSON objects are dropped on read.
    pub entries: Vec<BookEntry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A keyed lore entry of a [`CharacterBook`].
///
/// `keys`, `content` and `enabled` are always written; a missing, `null` or
/// mistyped value reads as empty or `true`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookEntry {
    pub keys: Vec<String>,
    pub content: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constant: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selective: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insertion_order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
    /// Numeric in most tools, a string in some.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for CharacterRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut f = Fields::read(deserializer)?;

        Ok(Self {
            spec: f.optional("spec"),
            spec_version: f.optional("spec_version"),
            name: f.optional("name"),
            description: f.optional("description"),
            personality: f.optional("personality"),
            scenario: f.optional("scenario"),
            first_mes: f.optional("first_mes"),
            mes_example: f.optional("mes_example"),
            data: f.optional("data"),
            extra: f.finish(),
        })
    }
}

impl<'de> Deserialize<'de> for CardData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut f = Fields::read(deserializer)?;

        Ok(Self {
            name: f.optional("name"),
            description: f.optional("description"),
            personality: f.optional("personality"),
            scenario: f.optional("scenario"),
            first_mes: f.optional("first_mes"),
            mes_example: f.optional("mes_example"),
            system_prompt: f.optional("system_prompt"),
            post_history_instructions: f.optional("post_history_instructions"),
            creator: f.optional("creator"),
            creator_notes: f.optional("creator_notes"),
            character_version: f.optional("character_version"),
            tags: f.optional("tags"),
            alternate_greetings: f.optional("alternate_greetings"),
            extensions: f.optional("extensions"),
            character_book: f.optional("character_book"),
            is_sd_card: f.optional("is_sd_card"),
            parameters: f.optional("parameters"),
            extra: f.finish(),
        })
    }
}

impl<'de> Deserialize<'de> for CharacterBook {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut f = Fields::read(deserializer)?;

        Ok(Self {
            name: f.optional("name"),
            entries: f.list("entries"),
            extra: f.finish(),
        })
    }
}

impl<'de> Deserialize<'de> for BookEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut f = Fields::read(deserializer)?;

        Ok(Self {
            keys: f.required("keys", Vec::new()),
            content: f.required("content", String::new()),
            enabled: f.required("enabled", true),
            comment: f.optional("comment"),
            constant: f.optional("constant"),
            selective: f.optional("selective"),
            insertion_order: f.optional("insertion_order"),
            extensions: f.optional("extensions"),
            id: f.optional("id"),
            extra: f.finish(),
        })
    }
}

impl CharacterRecord {
    /// Wrap card content in a V2 envelope.
    ///
    /// A missing world book or extensions map is filled with an empty one,
    /// unless `extra` already holds a raw value under that key.
    pub fn new_v2(mut data: CardData) -> Self {
        if data.character_book.is_none() && !data.extra.contains_key("character_book") {
            data.character_book = Some(CharacterBook::default());
        }
        if data.extensions.is_none() && !data.extra.contains_key("extensions") {
            data.extensions = Some(Map::new());
        }

        Self {
            spec: Some(SPEC_V2.to_string()),
            spec_version: Some(SPEC_VERSION_V2.to_string()),
            data: Some(data),
            ..Self::default()
        }
    }

    /// The name to show for this card.
    ///
    /// Prefers `data.name`, then the top-level name, then `"Unnamed"`.
    pub fn display_name(&self) -> &str {
        self.data
            .as_ref()
            .and_then(|d| non_empty(d.name.as_deref()))
            .or_else(|| non_empty(self.name.as_deref()))
            .unwrap_or("Unnamed")
    }

    /// Whether the card was synthesized from Stable Diffusion parameters.
    ///
    /// Such cards must never be written back.
    pub fn is_read_only(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|d| d.is_sd_card)
            .unwrap_or(false)
    }

    /// The bundled world book, if any.
    pub fn character_book(&self) -> Option<&CharacterBook> {
        self.data.as_ref().and_then(|d| d.character_book.as_ref())
    }

    /// Build a `data` object from the top-level narrative fields.
    ///
    /// Missing fields become empty strings.
    pub fn narrative_as_data(&self) -> CardData {
        let field = |value: &Option<String>| Some(value.clone().unwrap_or_default());

        CardData {
            name: field(&self.name),
            description: field(&self.description),
            personality: field(&self.personality),
            scenario: field(&self.scenario),
            first_mes: field(&self.first_mes),
            mes_example: field(&self.mes_example),
            ..CardData::default()
        }
    }
}

impl BookEntry {
    /// Create an entry with the defaults used for newly authored entries.
    pub fn new(keys: Vec<String>, content: impl Into<String>, enabled: bool) -> Self {
        Self {
            keys,
            content: content.into(),
            enabled,
            comment: Some(String::new()),
            constant: Some(false),
            selective: Some(true),
            insertion_order: Some(100),
            extensions: Some(Map::new()),
            id: Some(Value::from(0)),
            extra: Map::new(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// Split comma-separated tags, trimming each and dropping empty ones.
pub fn split_tags(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Split text into trimmed, non-empty lines.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_v2_card_parses() {
        let value = json!({
            "spec": "chara_card_v2",
            "spec_version": "2.0",
            "data": {
                "name": "Aria",
                "tags": ["fantasy", "elf"],
                "character_book": {
                    "name": "Lore",
                    "entries": [{"keys": ["forest"], "content": "Old trees", "id": 3}]
                },
                "extensions": {"depth_prompt": {"depth": 4}}
            }
        });

        let record: CharacterRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.display_name(), "Aria");
        assert_eq!(record.spec.as_deref(), Some(SPEC_V2));

        let book = record.character_book().unwrap();
        assert_eq!(book.name.as_deref(), Some("Lore"));
        assert_eq!(book.entries[0].keys, vec!["forest"]);
        assert!(book.entries[0].enabled);
        assert_eq!(book.entries[0].id, Some(json!(3)));
    }

    #[test]
    fn test_unknown_keys_survive() {
        let value = json!({
            "name": "Top",
            "talkativeness": "0.5",
            "data": {
                "name": "Inner",
                "group_only_greetings": ["hi"],
                "character_book": {"entries": [], "scan_depth": 50}
            }
        });

        let record: CharacterRecord = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(record.extra["talkativeness"], json!("0.5"));
        assert_eq!(serde_json::to_value(&record).unwrap(), value);
    }

    #[test]
    fn test_mistyped_fields_survive_round_trip() {
        let value = json!({
            "name": 7,
            "data": {
                "name": "Aria",
                "character_version": 1,
                "tags": "a, b",
                "creator": null,
                "character_book": {
                    "entries": [{"keys": ["x"], "content": "y", "enabled": true}]
                }
            }
        });

        let record: CharacterRecord = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(record.display_name(), "Aria");
        assert_eq!(record.extra["name"], json!(7));

        let data = record.data.as_ref().unwrap();
        assert!(data.character_version.is_none());
        assert!(data.tags.is_none());
        assert_eq!(data.extra["character_version"], json!(1));
        assert_eq!(data.extra["tags"], json!("a, b"));

        assert_eq!(serde_json::to_value(&record).unwrap(), value);
    }

    #[test]
    fn test_book_entry_null_fields_default() {
        let book: CharacterBook = serde_json::from_value(json!({
            "entries": [
                {"keys": ["gate"], "content": null, "enabled": null, "insertion_order": "high"},
                "not an entry"
            ]
        }))
        .unwrap();

        assert_eq!(book.entries.len(), 1);
        let entry = &book.entries[0];
        assert_eq!(entry.content, "");
        assert!(entry.enabled);
        assert!(entry.insertion_order.is_none());
        assert_eq!(entry.extra["insertion_order"], json!("high"));
    }

    #[test]
    fn test_non_object_record_rejected() {
        assert!(serde_json::from_str::<CharacterRecord>("[1, 2]").is_err());
        assert!(serde_json::from_str::<CharacterRecord>("\"text\"").is_err());
    }

    #[test]
    fn test_new_v2_keeps_raw_book() {
        let mut data = CardData::default();
        data.extra.insert("character_book".into(), json!("legacy"));

        let value = serde_json::to_value(CharacterRecord::new_v2(data)).unwrap();
        assert_eq!(value["data"]["character_book"], json!("legacy"));
        assert_eq!(value["data"]["extensions"], json!({}));
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut record = CharacterRecord {
            name: Some("Top".into()),
            ..Default::default()
        };
        assert_eq!(record.display_name(), "Top");

        record.data = Some(CardData {
            name: Some("  ".into()),
            ..Default::default()
        });
        assert_eq!(record.display_name(), "Top");

        record.name = None;
        assert_eq!(record.display_name(), "Unnamed");
    }

    #[test]
    fn test_read_only_flag() {
        let mut record = CharacterRecord::default();
        assert!(!record.is_read_only());

        record.data = Some(CardData {
            is_sd_card: Some(true),
            ..Default::default()
        });
        assert!(record.is_read_only());
    }

    #[test]
    fn test_new_v2_defaults() {
        let record = CharacterRecord::new_v2(CardData {
            name: Some("Nova".into()),
            ..Default::default()
        });

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["spec"], json!("chara_card_v2"));
        assert_eq!(value["spec_version"], json!("2.0"));
        assert_eq!(value["data"]["character_book"], json!({"entries": []}));
        assert_eq!(value["data"]["extensions"], json!({}));
    }

    #[test]
    fn test_new_book_entry() {
        let entry = BookEntry::new(vec!["sword".into()], "A blade", true);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({
                "keys": ["sword"],
                "content": "A blade",
                "enabled": true,
                "comment": "",
                "constant": false,
                "selective": true,
                "insertion_order": 100,
                "extensions": {},
                "id": 0
            })
        );
    }

    #[test]
    fn test_narrative_as_data() {
        let record = CharacterRecord {
            name: Some("Old".into()),
            first_mes: Some("Hello".into()),
            ..Default::default()
        };
        let data = record.narrative_as_data();
        assert_eq!(data.name.as_deref(), Some("Old"));
        assert_eq!(data.first_mes.as_deref(), Some("Hello"));
        assert_eq!(data.scenario.as_deref(), Some(""));
        assert!(data.tags.is_none());
    }

    #[test]
    fn test_split_helpers() {
        assert_eq!(split_tags(" a, b,,c ,"), vec!["a", "b", "c"]);
        assert_eq!(split_lines("hi\n\n  there \n"), vec!["hi", "there"]);
    }
}
