#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::{self, Display};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use tabled::Tabled;
use typed_builder::TypedBuilder;

use super::xml::XmlElement;
use crate::{constants::maven, error::EvalError, parsers::parser};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
/// How a single test method ended.
pub enum TestOutcome {
    /// Passed.
    Success,
    /// An assertion failed.
    Failure,
    /// The test threw an unexpected exception.
    Error,
}

impl TestOutcome {
    /// Canonical name, as surefire spells it.
    pub fn as_str(self) -> &'static str {
        match self {
            TestOutcome::Success => "Success",
            TestOutcome::Failure => "Failure",
            TestOutcome::Error => "Error",
        }
    }

    /// True for failures and errors.
    pub fn is_failing(self) -> bool {
        !matches!(self, TestOutcome::Success)
    }
}

impl Serialize for TestOutcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TestOutcome {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        match value.as_str() {
            "Success" => Ok(TestOutcome::Success),
            "Failure" => Ok(TestOutcome::Failure),
            "Error" => Ok(TestOutcome::Error),
            other => Err(de::Error::custom(format!("Unknown test outcome: {other}"))),
        }
    }
}

impl Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Tabled, Serialize, Deserialize, TypedBuilder, Clone, Debug, PartialEq)]
#[builder(field_defaults(setter(into)))]
#[builder(doc)]
/// Result of one test method
pub struct TestCaseResult {
    /// * `test_class`: simple name of the test class
    #[tabled(rename = "Class")]
    pub test_class:      String,
    /// * `test_method`: name of the test method
    #[tabled(rename = "Test")]
    pub test_method:     String,
    /// * `outcome`: success, failure or error
    #[tabled(rename = "Outcome")]
    pub outcome:         TestOutcome,
    /// * `failure_type`: exception class reported by surefire
    #[tabled(skip)]
    #[builder(default)]
    pub failure_type:    Option<String>,
    /// * `failure_message`: the assertion or exception message
    #[tabled(skip)]
    #[builder(default)]
    pub failure_message: Option<String>,
    /// * `stack_trace`: the full failure detail
    #[tabled(skip)]
    #[builder(default)]
    pub stack_trace:     Option<String>,
    /// * `elapsed_seconds`: time the method took
    #[tabled(rename = "Time (s)")]
    #[builder(default)]
    pub elapsed_seconds: f64,
}

impl TestCaseResult {
    /// Renders a failing case the way students see it: a
    /// `FAILURE: Class.method` header followed by the stack trace, with
    /// frames outside `package` removed.
    pub fn render_failure(&self, full_class_name: &str, package: Option<&str>) -> String {
        let header = format!(
            "{}: {}.{}",
            self.outcome.as_str().to_uppercase(),
            full_class_name,
            self.test_method
        );
        let detail = self
            .stack_trace
            .as_deref()
            .map(|trace| {
                trace
                    .lines()
                    .filter(|line| match package {
                        Some(package) => !line.starts_with(maven::STACK_FRAME) || line.contains(package),
                        None => true,
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();
        format!("{header}\n{detail}\n\n")
    }
}

/// One parsed surefire report: the results of one test class.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TestClassReport {
    /// Simple class name.
    pub class_name:      String,
    /// Fully-qualified class name.
    pub full_class_name: String,
    /// Executed test methods. Skipped methods are not included.
    pub cases:           Vec<TestCaseResult>,
    /// Number of skipped methods.
    pub skipped:         u32,
    /// Time the class took.
    pub elapsed_seconds: f64,
}

impl TestClassReport {
    /// Number of executed tests.
    pub fn total_tests(&self) -> u32 {
        self.cases.len() as u32
    }

    /// Number of tests whose assertions failed.
    pub fn failures(&self) -> u32 {
        self.count(TestOutcome::Failure)
    }

    /// Number of tests that threw.
    pub fn errors(&self) -> u32 {
        self.count(TestOutcome::Error)
    }

    /// Counts cases with the given outcome.
    fn count(&self, outcome: TestOutcome) -> u32 {
        self.cases
            .iter()
            .filter(|case| case.outcome == outcome)
            .count() as u32
    }
}

/// Parses a Maven surefire XML report.
///
/// The root must be a `<testsuite>`, or a `<testsuites>` wrapping exactly one
/// suite. Anything else is reported as [`EvalError::MalformedReport`].
pub fn parse_surefire_xml(text: &str) -> Result<TestClassReport, EvalError> {
    let root = parser::xml_document(text)
        .map_err(|e| EvalError::malformed_report(format!("not well-formed XML ({e})")))?;

    let suite = match root.name.as_str() {
        "testsuite" => &root,
        "testsuites" => {
            let mut suites = root.children_named("testsuite");
            match (suites.next(), suites.next()) {
                (Some(suite), None) => suite,
                _ => {
                    return Err(EvalError::malformed_report(
                        "expected exactly one <testsuite> inside <testsuites>",
                    ));
                }
            }
        }
        other => {
            return Err(EvalError::malformed_report(format!(
                "expected a <testsuite> root, found <{other}>"
            )));
        }
    };

    let suite_name = suite
        .attr("name")
        .map(str::to_string)
        .or_else(|| {
            suite
                .child("testcase")
                .and_then(|case| case.attr("classname"))
                .map(str::to_string)
        })
        .ok_or_else(|| EvalError::malformed_report("<testsuite> has no name"))?;

    let mut cases = Vec::new();
    let mut skipped = 0;
    for element in suite.children_named("testcase") {
        match parse_case(element, &suite_name)? {
            Some(case) => cases.push(case),
            None => skipped += 1,
        }
    }

    let elapsed_seconds = match suite.attr("time") {
        Some(time) => parse_seconds(time)?,
        None => cases.iter().map(|case| case.elapsed_seconds).sum(),
    };

    Ok(TestClassReport {
        class_name: simple_name(&suite_name).to_string(),
        full_class_name: suite_name,
        cases,
        skipped,
        elapsed_seconds,
    })
}

/// Reads one `<testcase>`. `None` for skipped cases.
fn parse_case(element: &XmlElement, suite_name: &str) -> Result<Option<TestCaseResult>, EvalError> {
    if element.child("skipped").is_some() {
        return Ok(None);
    }

    let method = element
        .attr("name")
        .ok_or_else(|| EvalError::malformed_report("<testcase> has no name"))?;
    let class = element.attr("classname").unwrap_or(suite_name);
    let elapsed_seconds = element.attr("time").map(parse_seconds).transpose()?.unwrap_or(0.0);

    let (outcome, detail) = match (element.child("error"), element.child("failure")) {
        (Some(error), _) => (TestOutcome::Error, Some(error)),
        (None, Some(failure)) => (TestOutcome::Failure, Some(failure)),
        (None, None) => (TestOutcome::Success, None),
    };

    Ok(Some(TestCaseResult {
        test_class: simple_name(class).to_string(),
        test_method: method.to_string(),
        outcome,
        failure_type: detail.and_then(|d| d.attr("type")).map(str::to_string),
        failure_message: detail.and_then(|d| d.attr("message")).map(str::to_string),
        stack_trace: detail
            .map(|d| d.text.trim_matches(['\n', '\r']).to_string())
            .filter(|trace| !trace.is_empty()),
        elapsed_seconds,
    }))
}

/// Parses a surefire `time` attribute; grouping commas are tolerated.
fn parse_seconds(raw: &str) -> Result<f64, EvalError> {
    raw.replace(',', "")
        .trim()
        .parse::<f64>()
        .map_err(|_| EvalError::malformed_report(format!("invalid time value `{raw}`")))
}

/// `org.x.TestTeacherFoo` -> `TestTeacherFoo`.
fn simple_name(full: &str) -> &str {
    full.rsplit('.').next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuite name="org.dropproject.TestTeacherProject" time="0.25" tests="3" errors="0" skipped="1" failures="1">
  <properties>
    <property name="java.version" value="17"/>
  </properties>
  <testcase name="testFuel" classname="org.dropproject.TestTeacherProject" time="0.1"/>
  <testcase name="testMove" classname="org.dropproject.TestTeacherProject" time="0.15">
    <failure message="expected:&lt;3&gt; but was:&lt;2&gt;" type="java.lang.AssertionError">java.lang.AssertionError: expected:&lt;3&gt; but was:&lt;2&gt;
	at org.junit.Assert.fail(Assert.java:88)
	at org.dropproject.TestTeacherProject.testMove(TestTeacherProject.java:20)
</failure>
  </testcase>
  <testcase name="testSkipped" classname="org.dropproject.TestTeacherProject" time="0">
    <skipped/>
  </testcase>
</testsuite>"#;

    #[test]
    fn parses_cases_and_skips() {
        let report = parse_surefire_xml(REPORT).expect("valid report");
        assert_eq!(report.class_name, "TestTeacherProject");
        assert_eq!(report.full_class_name, "org.dropproject.TestTeacherProject");
        assert_eq!(report.total_tests(), 2);
        assert_eq!(report.failures(), 1);
        assert_eq!(report.errors(), 0);
        assert_eq!(report.skipped, 1);
        assert!((report.elapsed_seconds - 0.25).abs() < f64::EPSILON);

        let failing = &report.cases[1];
        assert_eq!(failing.outcome, TestOutcome::Failure);
        assert_eq!(failing.failure_message.as_deref(), Some("expected:<3> but was:<2>"));
        assert_eq!(failing.failure_type.as_deref(), Some("java.lang.AssertionError"));
    }

    #[test]
    fn failure_rendering_filters_foreign_frames() {
        let report = parse_surefire_xml(REPORT).expect("valid report");
        let rendered = report.cases[1].render_failure(&report.full_class_name, Some("org.dropproject"));
        assert!(rendered.starts_with("FAILURE: org.dropproject.TestTeacherProject.testMove\n"));
        assert!(rendered.contains("TestTeacherProject.java:20"));
        assert!(!rendered.contains("org.junit.Assert.fail"));
        assert!(rendered.ends_with("\n\n"));
    }

    #[test]
    fn wrapped_suites_must_be_single() {
        let one = r#"<testsuites><testsuite name="a.B"><testcase name="t"/></testsuite></testsuites>"#;
        assert_eq!(parse_surefire_xml(one).expect("one suite").total_tests(), 1);

        let two = r#"<testsuites><testsuite name="a.B"/><testsuite name="a.C"/></testsuites>"#;
        assert!(matches!(parse_surefire_xml(two), Err(EvalError::MalformedReport { .. })));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            parse_surefire_xml("Tests run: 3, Failures: 0"),
            Err(EvalError::MalformedReport { .. })
        ));
        assert!(matches!(
            parse_surefire_xml(r#"<testsuite name="a.B"><testcase name="t" time="fast"/></testsuite>"#),
            Err(EvalError::MalformedReport { .. })
        ));
    }

    #[test]
    fn elapsed_falls_back_to_case_sum() {
        let xml = r#"<testsuite name="B"><testcase name="a" time="0.5"/><testcase name="b" time="1,000.25"/></testsuite>"#;
        let report = parse_surefire_xml(xml).expect("valid report");
        assert!((report.elapsed_seconds - 1000.75).abs() < 1e-9);
        assert_eq!(report.class_name, "B");
    }
}
