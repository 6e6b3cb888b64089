//! Field validator for task files.
//!
//! Lint is fail-slow: every file is checked and every issue is collected
//! before the caller decides on an exit status.

use std::path::Path;

use crate::domain::{Issue, IssueKind, TaskField, TaskRecord};
use crate::store::TaskFile;

/// Issues of a single parsed record.
pub fn lint_record(record: &TaskRecord) -> Vec<IssueKind> {
    let mut issues: Vec<IssueKind> = TaskField::ALL
        .into_iter()
        .filter(|field| !record.has_field(*field))
        .map(|field| IssueKind::MissingRequiredField { field })
        .collect();

    if record.loop_step.is_none() {
        issues.push(IssueKind::InvalidLoopStep {
            raw: record.loop_step_raw.clone(),
        });
    }

    issues.extend(
        TaskField::LISTS
            .into_iter()
            .filter(|field| record.has_field(*field) && record.items(*field).is_empty())
            .map(|field| IssueKind::EmptyListField { field }),
    );

    issues
}

/// Issues of one task file, tagged with its path.
pub fn lint_file(file: &TaskFile) -> Vec<Issue> {
    match &file.record {
        Ok(record) => tag(&file.path, lint_record(record)),
        Err(reason) => vec![Issue::in_file(
            &file.path,
            IssueKind::UnreadableFile {
                reason: reason.clone(),
            },
        )],
    }
}

/// Issues of every file, in file order.
pub fn lint_files(files: &[TaskFile]) -> Vec<Issue> {
    files.iter().flat_map(lint_file).collect()
}

fn tag(path: &Path, kinds: Vec<IssueKind>) -> Vec<Issue> {
    kinds.into_iter().map(|k| Issue::in_file(path, k)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_task;
    use rstest::rstest;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    const VALID: &str = "\
id: T1
title: valid
loop_step: 2
preconditions:
  - a
refs:
  - b
required_tests:
  - make tests-core
post_updates:
  - docs/tasks/T1.yaml
acceptance:
  - done
";

    fn without(text: &str, keys: &[&str]) -> String {
        let mut out = String::new();
        let mut skipping = false;
        for line in text.lines() {
            if !line.starts_with(' ') {
                skipping = keys.iter().any(|k| line.starts_with(&format!("{k}:")));
            }
            if !skipping {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }

    fn missing_fields(issues: &[IssueKind]) -> BTreeSet<TaskField> {
        issues
            .iter()
            .filter_map(|i| match i {
                IssueKind::MissingRequiredField { field } => Some(*field),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn valid_record_has_no_issues() {
        assert!(lint_record(&parse_task(VALID)).is_empty());
    }

    #[rstest]
    #[case::title_and_refs(&["title", "refs"], &[TaskField::Title, TaskField::Refs])]
    #[case::id_and_acceptance(&["id", "acceptance"], &[TaskField::Id, TaskField::Acceptance])]
    #[case::one(&["post_updates"], &[TaskField::PostUpdates])]
    fn reports_exactly_the_missing_fields(#[case] keys: &[&str], #[case] expected: &[TaskField]) {
        let issues = lint_record(&parse_task(&without(VALID, keys)));
        assert_eq!(missing_fields(&issues), expected.iter().copied().collect());
        assert_eq!(issues.len(), expected.len());
    }

    #[rstest]
    #[case::too_big("8")]
    #[case::negative("-1")]
    #[case::word("seven")]
    fn invalid_loop_step_cites_raw_text(#[case] raw: &str) {
        let text = VALID.replace("loop_step: 2", &format!("loop_step: {raw}"));
        let issues = lint_record(&parse_task(&text));
        assert_eq!(
            issues,
            vec![IssueKind::InvalidLoopStep {
                raw: Some(raw.to_string())
            }]
        );
    }

    #[test]
    fn absent_loop_step_is_missing_and_invalid() {
        let issues = lint_record(&parse_task(&without(VALID, &["loop_step"])));
        assert_eq!(
            issues,
            vec![
                IssueKind::MissingRequiredField {
                    field: TaskField::LoopStep
                },
                IssueKind::InvalidLoopStep { raw: None },
            ]
        );
    }

    #[test]
    fn header_without_items_is_empty_not_missing() {
        let text = VALID.replace("required_tests:\n  - make tests-core\n", "required_tests:\n");
        let issues = lint_record(&parse_task(&text));
        assert_eq!(
            issues,
            vec![IssueKind::EmptyListField {
                field: TaskField::RequiredTests
            }]
        );
    }

    #[test]
    fn lint_files_keeps_going_after_bad_files() {
        let files = vec![
            TaskFile {
                path: PathBuf::from("a.yaml"),
                record: Err("permission denied".into()),
            },
            TaskFile {
                path: PathBuf::from("b.yaml"),
                record: Ok(parse_task(&without(VALID, &["title"]))),
            },
            TaskFile {
                path: PathBuf::from("c.yaml"),
                record: Ok(parse_task(VALID)),
            },
        ];

        let issues = lint_files(&files);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].path, Some(PathBuf::from("a.yaml")));
        assert!(matches!(issues[0].kind, IssueKind::UnreadableFile { .. }));
        assert_eq!(issues[1].path, Some(PathBuf::from("b.yaml")));
    }
}
