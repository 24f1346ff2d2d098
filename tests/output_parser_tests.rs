use dropgrade::build::{CheckCategory, DiagnosticKind, OutputParser, ParsedOutput, RawBuildOutput, ToolchainProfile};

const PROJECT: &str = "/srv/builds/sample";

fn parse(profile: ToolchainProfile, console: &str) -> ParsedOutput {
    OutputParser::new(profile, PROJECT).parse(&RawBuildOutput::from_text(console))
}

fn messages(parsed: &ParsedOutput, kind: DiagnosticKind) -> Vec<&str> {
    parsed.of_kind(kind).map(|d| d.message()).collect()
}

#[test]
fn javac_listing_keeps_errors_and_continuations() {
    let parsed = parse(
        ToolchainProfile::Java,
        include_str!("fixtures/console/java_compile_error.txt"),
    );

    assert_eq!(
        messages(&parsed, DiagnosticKind::CompilationError),
        vec![
            "org/dropProject/samples/Main.java:[14,9] cannot find symbol",
            "  symbol:   variable y",
            "  location: class org.dropProject.samples.Main",
            "org/dropProject/samples/Main.java:[20,5] ';' expected",
        ]
    );
    assert!(parsed.has_compilation_errors());
    assert!(!parsed.fatal, "a compiler failure is an expected failure");

    let location = parsed.diagnostics[0]
        .location()
        .expect("first error has a location");
    assert_eq!(location.file, "org/dropProject/samples/Main.java");
    assert_eq!((location.line, location.column), (14, Some(9)));
    assert!(parsed.diagnostics[1].location().is_none());
}

#[test]
fn empty_checkstyle_audit_is_active_without_findings() {
    let parsed = parse(
        ToolchainProfile::Java,
        include_str!("fixtures/console/java_compile_error.txt"),
    );
    assert!(parsed.check_active(CheckCategory::StyleCheck));
    assert!(!parsed.check_active(CheckCategory::StaticAnalysis));
    assert_eq!(parsed.of_kind(DiagnosticKind::StyleWarning).count(), 0);
}

#[test]
fn checkstyle_and_pmd_findings_are_extracted() {
    let parsed = parse(
        ToolchainProfile::Java,
        include_str!("fixtures/console/java_checkstyle.txt"),
    );

    assert!(!parsed.has_compilation_errors());
    assert_eq!(
        messages(&parsed, DiagnosticKind::StyleWarning),
        vec![
            "org/dropProject/samples/Main.java:5:9: Variable 'X' must start with a lowercase \
             letter [LocalVariableName]",
            "org/dropProject/samples/Main.java:12: Line is longer than 120 characters [LineLength]",
        ]
    );
    assert_eq!(
        messages(&parsed, DiagnosticKind::StaticAnalysisFailure),
        vec!["org.dropProject.samples.Main:8 Rule:UnusedLocalVariable Priority:3 Avoid unused local variables such as 'z'."]
    );
    assert!(parsed.check_active(CheckCategory::StaticAnalysis));

    let second = parsed.diagnostics[1]
        .location()
        .expect("line-only location");
    assert_eq!((second.line, second.column), (12, None));
}

#[test]
fn diagnostics_come_in_category_order() {
    let parsed = parse(
        ToolchainProfile::Java,
        include_str!("fixtures/console/java_checkstyle.txt"),
    );
    let kinds: Vec<DiagnosticKind> = parsed.diagnostics.iter().map(|d| d.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            DiagnosticKind::StyleWarning,
            DiagnosticKind::StyleWarning,
            DiagnosticKind::StaticAnalysisFailure,
        ]
    );
}

#[test]
fn failing_tests_do_not_make_the_build_fatal() {
    let parsed = parse(
        ToolchainProfile::Java,
        include_str!("fixtures/console/java_tests_failed.txt"),
    );
    assert!(!parsed.fatal);
    assert!(parsed.diagnostics.is_empty());
}

#[test]
fn unexpected_core_goal_failure_is_fatal() {
    let parsed = parse(ToolchainProfile::Java, include_str!("fixtures/console/java_fatal.txt"));
    assert!(parsed.fatal);
}

#[test]
fn kotlinc_errors_follow_the_compile_step() {
    let parsed = parse(
        ToolchainProfile::Kotlin,
        include_str!("fixtures/console/kotlin_compile_error.txt"),
    );

    assert_eq!(
        messages(&parsed, DiagnosticKind::CompilationError),
        vec![
            "org/dropProject/samples/Main.kt: (12, 5): Unresolved reference: y",
            "org/dropProject/samples/Main.kt: (15, 1): Expecting '}'",
        ]
    );
    let location = parsed.diagnostics[0]
        .location()
        .expect("kotlinc location");
    assert_eq!((location.line, location.column), (12, Some(5)));
    assert!(!parsed.fatal);

    // detekt ran but reported nothing
    assert!(parsed.check_active(CheckCategory::StyleCheck));
    assert_eq!(parsed.of_kind(DiagnosticKind::StyleWarning).count(), 0);
}

#[test]
fn kotlin_test_compile_errors_are_marked() {
    let parsed = parse(
        ToolchainProfile::Kotlin,
        include_str!("fixtures/console/kotlin_test_compile_error.txt"),
    );

    assert_eq!(
        messages(&parsed, DiagnosticKind::CompilationError),
        vec!["[TEST] org/dropProject/samples/TestTeacherProject.kt: (8, 9): Unresolved reference: foo"]
    );
    let location = parsed.diagnostics[0]
        .location()
        .expect("test source location");
    assert_eq!(location.file, "org/dropProject/samples/TestTeacherProject.kt");
    assert_eq!(location.line, 8);
    assert!(!parsed.fatal);
    assert!(!parsed.check_active(CheckCategory::StyleCheck));
}

#[test]
fn detekt_findings_are_translated() {
    let parsed = parse(
        ToolchainProfile::Kotlin,
        include_str!("fixtures/console/kotlin_detekt.txt"),
    );

    assert!(!parsed.has_compilation_errors());
    assert_eq!(
        messages(&parsed, DiagnosticKind::StyleWarning),
        vec![
            "Variable names must start with a lowercase letter; every following word starts with \
             an uppercase one - [Total] at org/dropProject/samples/Main.kt:4:9",
            "Line is too long - [main] at org/dropProject/samples/Main.kt:10:1",
        ]
    );
    let location = parsed.diagnostics[0]
        .location()
        .expect("detekt location");
    assert_eq!(location.file, "org/dropProject/samples/Main.kt");
    assert_eq!((location.line, location.column), (4, Some(9)));
}

#[test]
fn parsing_is_deterministic() {
    let console = include_str!("fixtures/console/java_checkstyle.txt");
    let first = parse(ToolchainProfile::Java, console);
    let second = parse(ToolchainProfile::Java, console);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_value(&first).expect("serialize"),
        serde_json::to_value(&second).expect("serialize")
    );
}

#[test]
fn trailing_slash_on_project_folder_is_ignored() {
    let console = include_str!("fixtures/console/java_compile_error.txt");
    let with_slash = OutputParser::new(ToolchainProfile::Java, format!("{PROJECT}/"))
        .parse(&RawBuildOutput::from_text(console));
    assert_eq!(with_slash, parse(ToolchainProfile::Java, console));
}
