use dropgrade::report::{
    TestCaseResult, TestClassReport, TestOutcome, TestVisibilityTier, TierRules, aggregate,
    extract_coverage, parse_surefire_xml,
};
use proptest::prelude::*;

const TEACHER_XML: &str =
    include_str!("fixtures/surefire/TEST-org.dropProject.samples.TestTeacherProject.xml");
const HIDDEN_XML: &str =
    include_str!("fixtures/surefire/TEST-org.dropProject.samples.TestTeacherHiddenProject.xml");
const STUDENT_XML: &str =
    include_str!("fixtures/surefire/TEST-org.dropProject.samples.TestStudentProject.xml");
const JACOCO_CSV: &str = include_str!("fixtures/jacoco.csv");

fn fixture_reports() -> Vec<TestClassReport> {
    [TEACHER_XML, HIDDEN_XML, STUDENT_XML]
        .iter()
        .map(|xml| parse_surefire_xml(xml).expect("fixture parses"))
        .collect()
}

fn convention(reports: &[TestClassReport], accepts_student_tests: bool) -> TierRules {
    TierRules::from_naming_convention(
        reports.iter().map(|r| r.full_class_name.as_str()),
        accepts_student_tests,
    )
}

#[test]
fn surefire_report_reads_cases_and_failures() {
    let report = parse_surefire_xml(TEACHER_XML).expect("teacher report");

    assert_eq!(report.class_name, "TestTeacherProject");
    assert_eq!(report.full_class_name, "org.dropProject.samples.TestTeacherProject");
    assert_eq!(report.total_tests(), 3);
    assert_eq!(report.failures(), 1);
    assert_eq!(report.errors(), 0);
    assert!((report.elapsed_seconds - 0.052).abs() < 1e-9);

    let failing = report
        .cases
        .iter()
        .find(|case| case.outcome == TestOutcome::Failure)
        .expect("one failing case");
    assert_eq!(failing.test_method, "testFuncaoLentaParaTestar");
    assert_eq!(failing.failure_message.as_deref(), Some("expected:<3> but was:<4>"));
    assert_eq!(failing.failure_type.as_deref(), Some("java.lang.AssertionError"));
    let trace = failing.stack_trace.as_deref().expect("stack trace");
    assert!(trace.starts_with("java.lang.AssertionError: expected:<3> but was:<4>"));
}

#[test]
fn cdata_traces_and_errors_are_read() {
    let report = parse_surefire_xml(HIDDEN_XML).expect("hidden report");
    assert_eq!(report.errors(), 1);
    let crashed = report
        .cases
        .iter()
        .find(|case| case.outcome == TestOutcome::Error)
        .expect("one error");
    assert_eq!(crashed.failure_message.as_deref(), Some("/ by zero"));
    assert!(
        crashed
            .stack_trace
            .as_deref()
            .is_some_and(|t| t.contains("Main.divide(Main.java:30)"))
    );
}

#[test]
fn skipped_cases_are_not_executed_tests() {
    let report = parse_surefire_xml(STUDENT_XML).expect("student report");
    assert_eq!(report.total_tests(), 2);
    assert_eq!(report.skipped, 1);
}

#[test]
fn malformed_report_is_rejected() {
    let err = parse_surefire_xml("<testsuite name=\"x\"><testcase").unwrap_err();
    assert!(err.to_string().starts_with("malformed test report"), "unexpected message: {err}");

    let err = parse_surefire_xml("<project/>").unwrap_err();
    assert!(err.to_string().contains("<project>"), "unexpected message: {err}");
}

#[test]
fn reports_are_summed_per_tier() {
    let reports = fixture_reports();
    let rules = convention(&reports, true);
    let results = aggregate(reports, &rules, Some("Mandatory"));

    let teacher = results
        .summary(TestVisibilityTier::Teacher)
        .expect("teacher tier");
    assert_eq!((teacher.total_tests, teacher.failures, teacher.errors), (3, 1, 0));
    assert_eq!(teacher.progress(), 2);
    assert_eq!((teacher.mandatory_pass, teacher.mandatory_fail), (1, 0));

    let hidden = results
        .summary(TestVisibilityTier::Hidden)
        .expect("hidden tier");
    assert_eq!((hidden.total_tests, hidden.errors), (2, 1));
    assert_eq!((hidden.mandatory_pass, hidden.mandatory_fail), (0, 0));

    let student = results
        .summary(TestVisibilityTier::Student)
        .expect("student tier");
    assert_eq!(student.total_tests, 2);
    assert!(!student.has_failures());

    let combined = results.combined_elapsed().expect("teacher and hidden ran");
    assert!((combined - 0.262).abs() < 1e-9);
}

#[test]
fn without_student_tests_everything_visible_is_teacher() {
    let reports = fixture_reports();
    let rules = convention(&reports, false);
    let results = aggregate(reports, &rules, None);

    assert!(results.summary(TestVisibilityTier::Student).is_none());
    let teacher = results
        .summary(TestVisibilityTier::Teacher)
        .expect("teacher tier");
    assert_eq!(teacher.total_tests, 5);
    assert_eq!(
        results
            .summary(TestVisibilityTier::Hidden)
            .map(|s| s.total_tests),
        Some(2)
    );
}

#[test]
fn explicit_rules_override_the_convention() {
    let reports = fixture_reports();
    let rules = TierRules::new(["TestStudentProject"], Vec::<String>::new());
    let results = aggregate(reports, &rules, None);

    let teacher = results
        .summary(TestVisibilityTier::Teacher)
        .expect("teacher tier");
    assert_eq!(teacher.total_tests, 2);
    assert_eq!(
        results
            .summary(TestVisibilityTier::Student)
            .map(|s| s.total_tests),
        Some(5)
    );
}

#[test]
fn failure_details_hide_frames_outside_the_package() {
    let reports = fixture_reports();
    let rules = convention(&reports, true);
    let results = aggregate(reports, &rules, None);

    let details = results
        .failure_details(TestVisibilityTier::Teacher, Some("org.dropProject"))
        .expect("one failure");
    assert!(details.starts_with(
        "FAILURE: org.dropProject.samples.TestTeacherProject.testFuncaoLentaParaTestar"
    ));
    assert!(details.contains("TestTeacherProject.java:22"));
    assert!(!details.contains("org.junit.Assert"));

    assert_eq!(
        results.failing_test_names(TestVisibilityTier::Hidden),
        vec!["testHiddenCrash".to_string()]
    );
    assert!(
        results
            .failure_details(TestVisibilityTier::Student, None)
            .is_none()
    );
}

#[test]
fn missing_student_tests_are_explained() {
    let reports = vec![parse_surefire_xml(TEACHER_XML).expect("teacher report")];
    let rules = convention(&reports, true);
    let results = aggregate(reports, &rules, None);
    assert_eq!(
        results.not_enough_student_tests_message(3).as_deref(),
        Some(
            "The submission doesn't include unit tests. The assignment requires a minimum of 3 \
             tests."
        )
    );
}

#[test]
fn coverage_comes_from_the_first_report() {
    let coverage = extract_coverage(&[JACOCO_CSV, "not,a,report"])
        .expect("first report is valid")
        .expect("coverage present");
    assert_eq!(coverage.lines_missed, 3);
    assert_eq!(coverage.lines_covered, 17);
    assert_eq!(coverage.percent_line_coverage, 85);

    let none: [&str; 0] = [];
    assert!(extract_coverage(&none).expect("no reports").is_none());
}

#[test]
fn malformed_coverage_is_an_error() {
    let err = extract_coverage(&["GROUP,PACKAGE\nx,y"]).unwrap_err();
    assert!(err.to_string().to_lowercase().contains("coverage"), "unexpected message: {err}");
}

fn case(method: String, outcome: TestOutcome) -> TestCaseResult {
    TestCaseResult {
        test_class: "TestTeacherGenerated".into(),
        test_method: method,
        outcome,
        failure_type: None,
        failure_message: None,
        stack_trace: None,
        elapsed_seconds: 0.01,
    }
}

fn outcome() -> impl Strategy<Value = TestOutcome> {
    prop_oneof![
        Just(TestOutcome::Success),
        Just(TestOutcome::Failure),
        Just(TestOutcome::Error),
    ]
}

proptest! {
    #[test]
    fn progress_stays_within_total(outcomes in prop::collection::vec(outcome(), 0..40)) {
        let report = TestClassReport {
            class_name: "TestTeacherGenerated".into(),
            full_class_name: "org.x.TestTeacherGenerated".into(),
            cases: outcomes
                .iter()
                .enumerate()
                .map(|(idx, outcome)| case(format!("test{idx}"), *outcome))
                .collect(),
            skipped: 0,
            elapsed_seconds: 0.0,
        };
        let rules = TierRules::new(["TestTeacherGenerated"], Vec::<String>::new());
        let results = aggregate(vec![report], &rules, None);
        let summary = results.summary(TestVisibilityTier::Teacher).expect("teacher tier");

        let passing = outcomes.iter().filter(|o| **o == TestOutcome::Success).count() as u32;
        prop_assert!(summary.progress() <= summary.total_tests);
        prop_assert_eq!(summary.progress(), passing);
        prop_assert_eq!(summary.has_failures(), passing < summary.total_tests);
    }
}
