use std::collections::HashSet;

use log::warn;

use crate::spans::{IgnoredRegion, Span};

use super::PayloadError;
use super::parse::{RawComparison, RawSubmission};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    pub id: String,
    pub name: String,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub id: String,
    pub files: Vec<SourceFile>,
}

impl Submission {
    fn from_raw(raw: RawSubmission) -> Self {
        Self {
            id: raw.id,
            files: raw
                .files
                .into_iter()
                .map(|file| SourceFile {
                    id: file.id,
                    name: file.name,
                    content: file.content,
                })
                .collect(),
        }
    }

    pub fn file(&self, file_id: &str) -> Option<&SourceFile> {
        self.files.iter().find(|file| file.id == file_id)
    }
}

/// One comparator pass: its groups of matched spans and the regions it ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassData {
    pub name: String,
    pub groups: Vec<Vec<Span>>,
    pub ignored: Vec<IgnoredRegion>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comparison {
    pub left: Submission,
    pub right: Submission,
    pub passes: Vec<PassData>,
}

impl Comparison {
    pub(super) fn from_raw(raw: RawComparison) -> Result<Self, PayloadError> {
        let left = Submission::from_raw(raw.left);
        let right = Submission::from_raw(raw.right);

        let mut file_ids = HashSet::new();
        for file in left.files.iter().chain(right.files.iter()) {
            if !file_ids.insert(file.id.as_str()) {
                return Err(PayloadError::DuplicateFile(file.id.clone()));
            }
        }

        let mut passes = Vec::with_capacity(raw.passes.len());
        for raw_pass in raw.passes {
            let mut groups = Vec::with_capacity(raw_pass.groups.len());
            for (group_index, raw_group) in raw_pass.groups.into_iter().enumerate() {
                // Group ids are positional, so an empty group keeps its slot.
                if raw_group.is_empty() {
                    warn!(
                        "pass {}: empty group at position {group_index}",
                        raw_pass.name
                    );
                }

                let mut group = Vec::with_capacity(raw_group.len());
                for raw_span in raw_group {
                    if !file_ids.contains(raw_span.file_id.as_str()) {
                        return Err(PayloadError::UnknownFile {
                            pass: raw_pass.name.clone(),
                            file_id: raw_span.file_id,
                        });
                    }
                    group.push(Span {
                        key: raw_span.id,
                        sub_id: raw_span.sub_id,
                        file_id: raw_span.file_id,
                        start: raw_span.start,
                        end: raw_span.end,
                    });
                }
                groups.push(group);
            }

            let ignored = raw_pass
                .ignored_spans
                .into_iter()
                .filter(|region| {
                    let known = file_ids.contains(region.file_id.as_str());
                    if !known {
                        warn!(
                            "pass {}: ignoring region in unknown file {}",
                            raw_pass.name, region.file_id
                        );
                    }
                    known
                })
                .map(|region| IgnoredRegion {
                    file_id: region.file_id,
                    start: region.start,
                    end: region.end,
                })
                .collect();

            passes.push(PassData {
                name: raw_pass.name,
                groups,
                ignored,
            });
        }

        Ok(Self {
            left,
            right,
            passes,
        })
    }

    pub fn submissions(&self) -> [&Submission; 2] {
        [&self.left, &self.right]
    }

    pub fn file(&self, file_id: &str) -> Option<&SourceFile> {
        self.left.file(file_id).or_else(|| self.right.file(file_id))
    }

    pub fn pass(&self, name: &str) -> Option<&PassData> {
        self.passes.iter().find(|pass| pass.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::super::PayloadError;
    use super::super::parse::parse_comparison_payload;
    use super::Comparison;

    #[test]
    fn spans_in_unknown_files_are_rejected() {
        let raw = parse_comparison_payload(
            r#"{"left": {"id": "s1", "files": [{"id": "f1", "content": "abc"}]},
                "right": {"id": "s2", "files": []},
                "passes": [{"name": "exact", "groups": [[
                    {"subId": "s1", "fileId": "nope", "start": 0, "end": 1}
                ]]}]}"#,
        )
        .expect("payload parses");

        let error = Comparison::from_raw(raw).expect_err("unknown file is an error");
        assert!(matches!(error, PayloadError::UnknownFile { .. }));
    }

    #[test]
    fn empty_groups_keep_their_position() {
        let raw = parse_comparison_payload(
            r#"{"left": {"id": "s1", "files": [{"id": "f1", "content": "abc"}]},
                "right": {"id": "s2", "files": [{"id": "f2", "content": "abc"}]},
                "passes": [{"name": "exact", "groups": [[], [
                    {"subId": "s1", "fileId": "f1", "start": 0, "end": 1},
                    {"subId": "s2", "fileId": "f2", "start": 1, "end": 2}
                ]]}]}"#,
        )
        .expect("payload parses");

        let comparison = Comparison::from_raw(raw).expect("comparison builds");
        let groups = &comparison.passes[0].groups;
        assert_eq!(groups.len(), 2);
        assert!(groups[0].is_empty());
        assert_eq!(groups[1][1].file_id, "f2");
        assert_eq!(
            comparison.file("f2").map(|file| file.content.as_str()),
            Some("abc")
        );
        assert!(comparison.pass("exact").is_some());
    }

    #[test]
    fn duplicate_file_ids_across_sides_are_rejected() {
        let raw = parse_comparison_payload(
            r#"{"left": {"id": "s1", "files": [{"id": "f", "content": ""}]},
                "right": {"id": "s2", "files": [{"id": "f", "content": ""}]}}"#,
        )
        .expect("payload parses");

        assert!(matches!(
            Comparison::from_raw(raw),
            Err(PayloadError::DuplicateFile(id)) if id == "f"
        ));
    }
}
