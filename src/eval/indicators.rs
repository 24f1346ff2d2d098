#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    borrow::Cow,
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use tabled::Tabled;

use super::assignment::TestVisibility;
use crate::{constants::NOT_ENOUGH_TESTS, error::EvalError, report::TestSummary};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// A policy-level check reported for every submission.
pub enum Indicator {
    /// The upload has the expected project layout.
    ProjectStructure,
    /// The code compiles.
    Compilation,
    /// Style and static-analysis checks.
    CodeQuality,
    /// The student's own tests.
    StudentUnitTests,
    /// The teacher's public tests.
    TeacherUnitTests,
    /// The teacher's hidden tests.
    HiddenUnitTests,
}

impl Indicator {
    /// Every indicator, in report order.
    pub const ALL: [Indicator; 6] = [
        Indicator::ProjectStructure,
        Indicator::Compilation,
        Indicator::CodeQuality,
        Indicator::StudentUnitTests,
        Indicator::TeacherUnitTests,
        Indicator::HiddenUnitTests,
    ];

    /// Short code stored with each record.
    pub fn code(self) -> &'static str {
        match self {
            Indicator::ProjectStructure => "PS",
            Indicator::Compilation => "C",
            Indicator::CodeQuality => "CS",
            Indicator::StudentUnitTests => "ST",
            Indicator::TeacherUnitTests => "TT",
            Indicator::HiddenUnitTests => "HT",
        }
    }

    /// Human description.
    pub fn description(self) -> &'static str {
        match self {
            Indicator::ProjectStructure => "Project Structure",
            Indicator::Compilation => "Compilation",
            Indicator::CodeQuality => "Code Quality (Checkstyle)",
            Indicator::StudentUnitTests => "Student Unit Tests",
            Indicator::TeacherUnitTests => "Teacher Unit Tests",
            Indicator::HiddenUnitTests => "Teacher Hidden Unit Tests",
        }
    }
}

impl FromStr for Indicator {
    type Err = EvalError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Indicator::ALL
            .into_iter()
            .find(|indicator| indicator.code() == code)
            .ok_or_else(|| EvalError::UnknownIndicator(code.to_string()))
    }
}

impl Serialize for Indicator {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Indicator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}

impl Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
/// Value of an indicator.
pub enum IndicatorValue {
    /// Passed.
    Ok,
    /// Failed.
    Nok,
    /// Student tests below the required minimum.
    NotEnoughTests,
}

impl IndicatorValue {
    /// Text stored with the record.
    pub fn as_str(self) -> &'static str {
        match self {
            IndicatorValue::Ok => "OK",
            IndicatorValue::Nok => "NOK",
            IndicatorValue::NotEnoughTests => NOT_ENOUGH_TESTS,
        }
    }

    /// `Ok` when `passed`, otherwise `Nok`.
    pub fn from_pass(passed: bool) -> Self {
        if passed {
            IndicatorValue::Ok
        } else {
            IndicatorValue::Nok
        }
    }
}

impl Serialize for IndicatorValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IndicatorValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        match value.as_str() {
            "OK" => Ok(IndicatorValue::Ok),
            "NOK" => Ok(IndicatorValue::Nok),
            NOT_ENOUGH_TESTS => Ok(IndicatorValue::NotEnoughTests),
            other => Err(de::Error::custom(format!("Unknown indicator value: {other}"))),
        }
    }
}

impl Display for IndicatorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored indicator result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    /// Which indicator.
    pub indicator: Indicator,
    /// Its value.
    pub value:     IndicatorValue,
    /// Passing tests, for test indicators.
    pub progress:  Option<u32>,
    /// Executed tests, for test indicators.
    pub goal:      Option<u32>,
}

impl IndicatorRecord {
    /// A record without progress.
    pub fn new(indicator: Indicator, value: IndicatorValue) -> Self {
        Self {
            indicator,
            value,
            progress: None,
            goal: None,
        }
    }

    /// A test indicator carrying the summary's progress and goal.
    pub fn with_summary(indicator: Indicator, value: IndicatorValue, summary: &TestSummary) -> Self {
        Self {
            indicator,
            value,
            progress: Some(summary.progress()),
            goal: Some(summary.total_tests),
        }
    }

    /// True when the value is OK.
    pub fn is_ok(&self) -> bool {
        self.value == IndicatorValue::Ok
    }

    /// What a student may see of this record. Teachers always see the record
    /// itself.
    pub fn student_view(&self, hidden_visibility: Option<TestVisibility>) -> Option<IndicatorRecord> {
        if self.indicator != Indicator::HiddenUnitTests {
            return Some(self.clone());
        }
        match hidden_visibility {
            None | Some(TestVisibility::HideEverything) => None,
            Some(TestVisibility::ShowOkNok) => Some(IndicatorRecord::new(self.indicator, self.value)),
            Some(TestVisibility::ShowProgress) => Some(self.clone()),
        }
    }

    /// `progress/goal`, or empty.
    pub fn progress_label(&self) -> String {
        match (self.progress, self.goal) {
            (Some(progress), Some(goal)) => format!("{progress}/{goal}"),
            _ => String::new(),
        }
    }
}

impl Tabled for IndicatorRecord {
    const LENGTH: usize = 3;

    fn fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.indicator.description()),
            Cow::Borrowed(self.value.as_str()),
            Cow::Owned(self.progress_label()),
        ]
    }

    fn headers() -> Vec<Cow<'static, str>> {
        vec![Cow::Borrowed("Indicator"), Cow::Borrowed("Result"), Cow::Borrowed("Progress")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hidden(value: IndicatorValue) -> IndicatorRecord {
        IndicatorRecord {
            indicator: Indicator::HiddenUnitTests,
            value,
            progress: Some(3),
            goal: Some(5),
        }
    }

    #[test]
    fn codes_round_trip() {
        for indicator in Indicator::ALL {
            assert_eq!(indicator.code().parse::<Indicator>().unwrap(), indicator);
        }
        assert!(matches!("XX".parse::<Indicator>(), Err(EvalError::UnknownIndicator(code)) if code == "XX"));
    }

    #[test]
    fn hidden_tests_follow_visibility() {
        let record = hidden(IndicatorValue::Nok);
        assert!(record.student_view(None).is_none());
        assert!(record.student_view(Some(TestVisibility::HideEverything)).is_none());

        let ok_nok = record
            .student_view(Some(TestVisibility::ShowOkNok))
            .unwrap();
        assert_eq!(ok_nok.value, IndicatorValue::Nok);
        assert_eq!(ok_nok.progress, None);

        let progress = record
            .student_view(Some(TestVisibility::ShowProgress))
            .unwrap();
        assert_eq!(progress.progress_label(), "3/5");
    }

    #[test]
    fn other_indicators_are_always_visible() {
        let record = IndicatorRecord::new(Indicator::Compilation, IndicatorValue::Ok);
        assert_eq!(record.student_view(None), Some(record.clone()));
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({"indicator": "C", "value": "OK", "progress": null, "goal": null})
        );
    }
}
