//! Source map v3 model: the JSON document, identity maps, and decoding of the
//! `mappings` field into positions.
//!
//! Lines and columns are zero-based throughout.

use rlyeh_diagnostics::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::vlq;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapJson {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub names: Vec<String>,
    pub mappings: String,
    /// Fields we do not interpret, kept so they survive a rewrite.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An original position a generated position maps back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalPos {
    pub source: String,
    pub line: u32,
    pub column: u32,
    pub name: Option<String>,
}

/// One decoded segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_column: u32,
    /// `None` for generated-only segments.
    pub original: Option<OriginalPos>,
}

impl SourceMapJson {
    pub fn from_json(json: &str) -> Result<Self> {
        let map: SourceMapJson = serde_json::from_str(json)?;
        map.validate()?;
        Ok(map)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let map: SourceMapJson = serde_json::from_value(value)?;
        map.validate()?;
        Ok(map)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn validate(&self) -> Result<()> {
        if self.version != 3 {
            return Err(Error::malformed(format!(
                "unsupported source map version {}",
                self.version
            )));
        }
        Ok(())
    }

    /// A map taking every line of `text` to the same line of `path`, column 0
    /// to column 0, with `text` embedded as the source content.
    pub fn identity(text: &str, path: &str) -> Self {
        let line_count = text.split('\n').count();
        let mut mappings = String::with_capacity(line_count * 5);
        for line in 0..line_count {
            if line == 0 {
                mappings.push_str("AAAA");
            } else {
                // Same source, one original line further down.
                mappings.push_str(";AACA");
            }
        }

        SourceMapJson {
            version: 3,
            file: None,
            source_root: None,
            sources: vec![path.to_string()],
            sources_content: Some(vec![Some(text.to_string())]),
            names: Vec::new(),
            mappings,
            extra: Map::new(),
        }
    }

    /// Index of `path` in `sources`, adding it if missing.
    pub fn ensure_source(&mut self, path: &str) -> usize {
        if let Some(index) = self.sources.iter().position(|s| s == path) {
            return index;
        }
        self.sources.push(path.to_string());
        if let Some(content) = &mut self.sources_content {
            content.resize(self.sources.len(), None);
        }
        self.sources.len() - 1
    }

    pub fn decode(&self) -> Result<Vec<Mapping>> {
        decode_mappings(&self.mappings, &self.sources, &self.names)
    }

    /// Original position of the segment covering `(line, column)` in the
    /// generated text: the closest segment on that line starting at or before
    /// `column`. Generated-only segments resolve to `None`.
    pub fn resolve(&self, line: u32, column: u32) -> Result<Option<OriginalPos>> {
        let resolved = self
            .decode()?
            .into_iter()
            .filter(|m| m.generated_line == line && m.generated_column <= column)
            .max_by_key(|m| m.generated_column)
            .and_then(|m| m.original);
        Ok(resolved)
    }
}

/// Number of `;`-separated line groups in a `mappings` string.
pub fn line_groups(mappings: &str) -> usize {
    mappings.split(';').count()
}

#[derive(Default)]
struct DecodeState {
    source: i64,
    line: i64,
    column: i64,
    name: i64,
}

pub fn decode_mappings(mappings: &str, sources: &[String], names: &[String]) -> Result<Vec<Mapping>> {
    let mut decoded = Vec::new();
    let mut state = DecodeState::default();

    for (generated_line, group) in mappings.split(';').enumerate() {
        let mut generated_column = 0i64;

        for segment in group.split(',').filter(|s| !s.is_empty()) {
            let fields = decode_segment(segment)?;
            generated_column += fields[0];

            let original = match fields.len() {
                1 => None,
                4 | 5 => {
                    state.source += fields[1];
                    state.line += fields[2];
                    state.column += fields[3];
                    let name = if fields.len() == 5 {
                        state.name += fields[4];
                        Some(lookup(names, state.name, "name")?.clone())
                    } else {
                        None
                    };
                    Some(OriginalPos {
                        source: lookup(sources, state.source, "source")?.clone(),
                        line: non_negative(state.line, segment)?,
                        column: non_negative(state.column, segment)?,
                        name,
                    })
                }
                n => {
                    return Err(Error::malformed(format!(
                        "mapping segment {:?} has {} fields",
                        segment, n
                    )))
                }
            };

            decoded.push(Mapping {
                generated_line: generated_line as u32,
                generated_column: non_negative(generated_column, segment)?,
                original,
            });
        }
    }

    Ok(decoded)
}

fn decode_segment(segment: &str) -> Result<Vec<i64>> {
    let mut fields = Vec::with_capacity(5);
    let mut rest = segment;
    while !rest.is_empty() {
        let (value, consumed) = vlq::decode(rest)
            .ok_or_else(|| Error::malformed(format!("invalid VLQ in segment {:?}", segment)))?;
        fields.push(value);
        rest = &rest[consumed..];
    }
    Ok(fields)
}

fn lookup<'a>(table: &'a [String], index: i64, what: &str) -> Result<&'a String> {
    usize::try_from(index)
        .ok()
        .and_then(|i| table.get(i))
        .ok_or_else(|| Error::malformed(format!("{} index {} out of range", what, index)))
}

fn non_negative(value: i64, segment: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::malformed(format!("segment {:?} decodes to position {}", segment, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_map_shape() {
        let map = SourceMapJson::identity("a\nb\nc", "/src/a.js");
        assert_eq!(map.mappings, "AAAA;AACA;AACA");
        assert_eq!(map.sources, ["/src/a.js"]);
        assert_eq!(map.sources_content, Some(vec![Some("a\nb\nc".to_string())]));
    }

    #[test]
    fn test_identity_map_resolves_each_line() {
        let map = SourceMapJson::identity("one\ntwo\nthree\n", "/a.js");
        for line in 0..4 {
            let pos = map.resolve(line, 2).unwrap().unwrap();
            assert_eq!((pos.source.as_str(), pos.line, pos.column), ("/a.js", line, 0));
        }
        assert_eq!(map.resolve(4, 0).unwrap(), None);
    }

    #[test]
    fn test_decode_relative_fields() {
        let sources = vec!["a.js".to_string(), "b.js".to_string()];
        let names = vec!["foo".to_string()];
        // (0,0)->a:0:0 ; (1,4)->b:2:1 "foo", (1,9) generated only
        let decoded = decode_mappings("AAAA;ICEC,K", &sources, &names).unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(
            decoded[1],
            Mapping {
                generated_line: 1,
                generated_column: 4,
                original: Some(OriginalPos {
                    source: "b.js".to_string(),
                    line: 2,
                    column: 1,
                    name: None,
                }),
            }
        );
        assert_eq!(decoded[2].generated_column, 9);
        assert_eq!(decoded[2].original, None);

        let named = decode_mappings("AAAAA", &sources, &names).unwrap();
        assert_eq!(named[0].original.as_ref().unwrap().name.as_deref(), Some("foo"));
    }

    #[test]
    fn test_decode_rejects_bad_segments() {
        let sources = vec!["a.js".to_string()];
        assert!(decode_mappings("AA", &sources, &[]).is_err());
        assert!(decode_mappings("ACAA", &sources, &[]).is_err());
        assert!(decode_mappings("A!AA", &sources, &[]).is_err());
    }

    #[test]
    fn test_json_round_trip_keeps_unknown_fields() {
        let json = r#"{"version":3,"sources":["a.js"],"names":[],"mappings":"AAAA","x_google_ignoreList":[0]}"#;
        let mut map = SourceMapJson::from_json(json).unwrap();
        assert_eq!(map.ensure_source("a.js"), 0);
        assert_eq!(map.ensure_source("b.js"), 1);

        let value: Value = serde_json::from_str(&map.to_json().unwrap()).unwrap();
        assert_eq!(value["x_google_ignoreList"], serde_json::json!([0]));
        assert_eq!(value["sources"], serde_json::json!(["a.js", "b.js"]));
        assert!(value.get("sourcesContent").is_none());
    }

    #[test]
    fn test_rejects_other_versions() {
        let err = SourceMapJson::from_json(r#"{"version":2,"mappings":""}"#).unwrap_err();
        assert!(err.to_string().contains("version 2"));
    }
}
