#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::{
    build::toolchain::{FailedGoal, StepHeader},
    report::{
        coverage::LineCounts,
        xml::{XmlElement, XmlNode, unescape},
    },
    types::SourceLocation,
};

peg::parser! {
    /// includes the grammars for reading Maven console lines, surefire XML
    /// reports and JaCoCo CSV rows.
    pub grammar parser() for str {
        /// matches any sequence of 1 or more numbers
        rule number() -> u32
            = n:$(['0'..='9']+) {? n.parse().or(Err("u32")) }

        /// matches any number of whitespace characters
        rule whitespace() = quiet!{[' ' | '\n' | '\t' | '\r']*}

        /// matches at least one whitespace character
        rule some_whitespace() = quiet!{[' ' | '\n' | '\t' | '\r']+}

        /// matches a character that may appear in a source path
        rule path_char()
            = ['a'..='z' | 'A'..='Z' | '0'..='9' | '/' | '\\' | '_' | '-' | '$' | '.']

        /// matches the extension of a Java or Kotlin source file
        rule source_extension() = ".java" / ".kt"

        /// matches a source path up to and including its extension
        rule source_file() -> &'input str
            = $((!(source_extension() !path_char()) path_char())+ source_extension())

        /// matches the position suffix printed by javac, kotlinc, checkstyle
        /// and detekt
        rule position() -> (u32, Option<u32>)
            = ":[" l:number() "," " "* c:number() "]" { (l, Some(c)) }
            / ": (" l:number() "," " "* c:number() ")" { (l, Some(c)) }
            / ":" l:number() ":" c:number() { (l, Some(c)) }
            / ":" l:number() { (l, None) }

        /// parses a diagnostic message that starts with a source location,
        /// e.g. `org/x/Main.java:[12,5] cannot find symbol`
        pub rule source_location() -> SourceLocation
            = f:source_file() p:position() [_]*
            {
                SourceLocation { file: f.to_string(), line: p.0, column: p.1 }
            }

        /// parses a Maven build-step header,
        /// e.g. `[INFO] --- kotlin-maven-plugin:1.3.72:compile (compile) @ proj ---`
        pub rule step_header() -> StepHeader
            = "[INFO] --- "
              plugin:$((!":" [^ ' '])+)
              ":"
              version:$((!":" [^ ' '])+)
              ":"
              goal:$([^ ' ']+)
              [_]*
            {
                StepHeader {
                    plugin:  plugin.to_string(),
                    version: version.to_string(),
                    goal:    goal.to_string(),
                }
            }

        /// parses the line Maven prints when a goal aborts the build
        pub rule failed_goal() -> FailedGoal
            = "[ERROR] Failed to execute goal " coordinates:$([^ ' ']+) [_]*
            {? FailedGoal::from_coordinates(coordinates) }

        /// matches an XML name
        rule xml_name() -> &'input str
            = $(['a'..='z' | 'A'..='Z' | '_' | ':']
                ['a'..='z' | 'A'..='Z' | '0'..='9' | '_' | ':' | '-' | '.']*)

        /// matches a processing instruction, including the prolog
        rule xml_pi() = "<?" (!"?>" [_])* "?>"

        /// matches a comment
        rule xml_comment() = "<!--" (!"-->" [_])* "-->"

        /// matches a doctype declaration
        rule xml_doctype() = "<!DOCTYPE" (!">" [_])* ">"

        /// matches anything allowed around the root element
        rule xml_misc() = whitespace() (xml_pi() / xml_comment() / xml_doctype())

        /// parses a quoted attribute value
        rule xml_attr_value() -> String
            = "\"" v:$([^ '"']*) "\"" {? unescape(v) }
            / "'" v:$([^ '\'']*) "'" {? unescape(v) }

        /// parses one `name="value"` pair
        rule xml_attribute() -> (String, String)
            = some_whitespace() n:xml_name() whitespace() "=" whitespace() v:xml_attr_value()
            { (n.to_string(), v) }

        /// parses a CDATA section
        rule xml_cdata() -> String
            = "<![CDATA[" t:$((!"]]>" [_])*) "]]>" { t.to_string() }

        /// parses character data
        rule xml_chars() -> String
            = t:$([^ '<']+) {? unescape(t) }

        /// parses one piece of element content
        rule xml_node() -> XmlNode
            = e:xml_element() { XmlNode::Element(e) }
            / t:xml_cdata() { XmlNode::Text(t) }
            / (xml_comment() / xml_pi()) { XmlNode::Ignored }
            / t:xml_chars() { XmlNode::Text(t) }

        /// parses an element and everything inside it
        rule xml_element() -> XmlElement
            = "<" n:xml_name() attrs:xml_attribute()* whitespace() "/>"
            { XmlElement::new(n, attrs, Vec::new()) }
            / "<" n:xml_name() attrs:xml_attribute()* whitespace() ">"
              content:xml_node()*
              "</" close:xml_name() whitespace() ">"
            {?
                if close == n {
                    Ok(XmlElement::new(n, attrs, content))
                } else {
                    Err("matching closing tag")
                }
            }

        /// parses a whole XML document and returns its root element
        pub rule xml_document() -> XmlElement
            = "\u{feff}"? xml_misc()* whitespace() root:xml_element() xml_misc()* whitespace()
            { root }

        /// matches one CSV cell
        rule csv_cell() -> &'input str
            = $([^ ',' | '\n' | '\r']*)

        /// parses the line counters out of one JaCoCo CSV row
        pub rule jacoco_row() -> LineCounts
            = cells:(csv_cell() ** ",") ['\r']?
            {? LineCounts::from_cells(&cells) }
    }
}

#[cfg(test)]
mod tests {
    use super::parser;

    #[test]
    fn source_location_forms() {
        let javac = parser::source_location("org/x/Main.java:[12,5] cannot find symbol")
            .expect("javac location");
        assert_eq!((javac.file.as_str(), javac.line, javac.column), ("org/x/Main.java", 12, Some(5)));

        let kotlinc = parser::source_location("Main.kt: (3, 9): Unresolved reference: x")
            .expect("kotlinc location");
        assert_eq!((kotlinc.line, kotlinc.column), (3, Some(9)));

        let checkstyle = parser::source_location("org/x/Main.java:7: Missing a Javadoc comment.")
            .expect("checkstyle location");
        assert_eq!((checkstyle.line, checkstyle.column), (7, None));

        assert!(parser::source_location("no location here").is_err());
    }

    #[test]
    fn step_header_splits_coordinates() {
        let header =
            parser::step_header("[INFO] --- kotlin-maven-plugin:1.3.72:compile (compile) @ p ---")
                .expect("step header");
        assert_eq!(header.plugin, "kotlin-maven-plugin");
        assert_eq!(header.version, "1.3.72");
        assert_eq!(header.goal, "compile");
    }

    #[test]
    fn failed_goal_keeps_group_and_artifact() {
        let goal = parser::failed_goal(
            "[ERROR] Failed to execute goal org.apache.maven.plugins:maven-surefire-plugin:2.22.2:\
             test (default-test) on project sample: There are test failures.",
        )
        .expect("failed goal");
        assert_eq!(goal.group, "org.apache.maven.plugins");
        assert_eq!(goal.artifact, "maven-surefire-plugin");
        assert_eq!(goal.goal, "test");
    }

    #[test]
    fn xml_document_reads_nested_elements() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- generated -->
<testsuite name="a.B" tests="1">
  <testcase name="t1" classname="a.B" time="0.1"><failure message="x &amp; y"><![CDATA[trace <here>]]></failure></testcase>
</testsuite>"#;
        let root = parser::xml_document(xml).expect("xml document");
        assert_eq!(root.name, "testsuite");
        let case = root.child("testcase").expect("testcase");
        let failure = case.child("failure").expect("failure");
        assert_eq!(failure.attr("message"), Some("x & y"));
        assert_eq!(failure.text, "trace <here>");
    }

    #[test]
    fn xml_document_rejects_mismatched_tags() {
        assert!(parser::xml_document("<testsuite><testcase></testsuite>").is_err());
    }
}
