#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Human-readable descriptions for the detekt rules assignments enable.

/// detekt rule id -> explanation shown to students.
const RULE_DESCRIPTIONS: &[(&str, &str)] = &[
    (
        "VariableNaming",
        "Variable names must start with a lowercase letter; every following word starts with an \
         uppercase one",
    ),
    (
        "FunctionNaming",
        "Function names must start with a lowercase letter; every following word starts with an \
         uppercase one",
    ),
    (
        "FunctionParameterNaming",
        "Parameter names must start with a lowercase letter; every following word starts with an \
         uppercase one",
    ),
    ("VariableMinLength", "Variable name is too short"),
    ("VarCouldBeVal", "Immutable variable declared with var"),
    ("MandatoryBracesIfStatements", "'if' statement without braces"),
    ("ComplexCondition", "Condition is too complex"),
    ("StringLiteralDuplication", "Duplicated string literal, use a constant instead"),
    ("NestedBlockDepth", "Too many blocks nested inside each other"),
    ("UnsafeCallOnNullableType", "'!!' is not allowed since it may crash the program"),
    ("MaxLineLength", "Line is too long"),
    ("LongMethod", "Function has too many lines of code"),
    ("ForbiddenKeywords", "Use of forbidden instructions"),
];

/// Replaces every `RuleId -` marker in a detekt finding with its description.
/// Unknown rules pass through unchanged.
pub fn translate(finding: &str) -> String {
    RULE_DESCRIPTIONS
        .iter()
        .fold(finding.to_string(), |acc, (rule, description)| {
            let marker = format!("{rule} -");
            if acc.contains(&marker) {
                acc.replace(&marker, &format!("{description} -"))
            } else {
                acc
            }
        })
}

#[cfg(test)]
mod tests {
    use super::translate;

    #[test]
    fn known_rules_are_described() {
        assert_eq!(
            translate("VarCouldBeVal - [count] at Main.kt:4:5 - Signature=Main.kt$count"),
            "Immutable variable declared with var - [count] at Main.kt:4:5 - Signature=Main.kt$count"
        );
    }

    #[test]
    fn function_rules_do_not_clobber_each_other() {
        assert!(translate("FunctionParameterNaming - [X]").starts_with("Parameter names"));
        assert!(translate("FunctionNaming - [Foo]").starts_with("Function names"));
    }

    #[test]
    fn unknown_rules_pass_through() {
        assert_eq!(translate("WildcardImport - [java.util.*]"), "WildcardImport - [java.util.*]");
    }
}
