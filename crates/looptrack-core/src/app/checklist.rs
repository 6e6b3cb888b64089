//! Test checklist guard for pull request bodies.
//!
//! A body passes when it has the checklist heading and the core test item
//! is ticked. An unticked item on its own is reported separately so the
//! author knows the line is there but was not checked.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

pub const CHECKLIST_HEADING: &str = "## Step 6 Checklist";

static CHECKED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\s*\[[xX]\]\s*make\s+tests-core").expect("valid regex"));
static UNCHECKED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\s*\[\s*\]\s*make\s+tests-core").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistVerdict {
    Passed,
    MissingHeading,
    Unchecked,
    MissingItem,
}

impl ChecklistVerdict {
    pub fn passed(self) -> bool {
        self == ChecklistVerdict::Passed
    }

    pub fn message(self) -> &'static str {
        match self {
            ChecklistVerdict::Passed => "test checklist verified",
            ChecklistVerdict::MissingHeading => "body has no '## Step 6 Checklist' section",
            ChecklistVerdict::Unchecked => "`make tests-core` is listed but not checked",
            ChecklistVerdict::MissingItem => "checklist needs a `- [x] make tests-core` item",
        }
    }
}

pub fn check_body(body: &str) -> ChecklistVerdict {
    if !body.contains(CHECKLIST_HEADING) {
        return ChecklistVerdict::MissingHeading;
    }
    let checked = CHECKED.is_match(body);
    if checked {
        return ChecklistVerdict::Passed;
    }
    if UNCHECKED.is_match(body) {
        ChecklistVerdict::Unchecked
    } else {
        ChecklistVerdict::MissingItem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::checked("## Step 6 Checklist\n- [x] make tests-core\n", ChecklistVerdict::Passed)]
    #[case::upper("## Step 6 Checklist\n- [X]  make  tests-core\n", ChecklistVerdict::Passed)]
    #[case::both(
        "## Step 6 Checklist\n- [ ] make tests-core\n- [x] make tests-core\n",
        ChecklistVerdict::Passed
    )]
    #[case::unchecked("## Step 6 Checklist\n- [ ] make tests-core\n", ChecklistVerdict::Unchecked)]
    #[case::no_item("## Step 6 Checklist\n- [x] npm test\n", ChecklistVerdict::MissingItem)]
    #[case::no_heading("- [x] make tests-core\n", ChecklistVerdict::MissingHeading)]
    fn verdicts(#[case] body: &str, #[case] expected: ChecklistVerdict) {
        assert_eq!(check_body(body), expected);
    }
}
