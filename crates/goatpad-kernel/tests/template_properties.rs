//! Property tests for template rendering.

use goatpad_kernel::{Record, Template};
use proptest::prelude::*;
use rstest::rstest;

const NAMES: [&str; 3] = ["Name", "ID", "Company"];

#[derive(Debug, Clone)]
enum Part {
    Text(String),
    Field(&'static str),
}

fn arb_part() -> impl Strategy<Value = Part> {
    prop_oneof![
        "[^{}]{0,12}".prop_map(Part::Text),
        prop::sample::select(NAMES.to_vec()).prop_map(Part::Field),
    ]
}

/// Template text for `parts` and what it should render to given `values`.
fn build(parts: &[Part], values: &[String; 3]) -> (String, String) {
    let mut source = String::new();
    let mut expected = String::new();
    for part in parts {
        match part {
            Part::Text(t) => {
                source.push_str(t);
                expected.push_str(t);
            }
            Part::Field(name) => {
                source.push_str(&format!("{{{{{name}}}}}"));
                let i = NAMES.iter().position(|n| n == name).unwrap_or(0);
                expected.push_str(&values[i]);
            }
        }
    }
    (source, expected)
}

/// Straightforward leftmost scan for `{{name}}`, used as the oracle.
fn reference_render(source: &str, record: &Record) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '{' && chars.get(i + 1) == Some(&'{') {
            let mut j = i + 2;
            while j < chars.len() && chars[j] != '{' && chars[j] != '}' {
                j += 1;
            }
            if chars.get(j) == Some(&'}') && chars.get(j + 1) == Some(&'}') {
                let name: String = chars[i + 2..j].iter().collect();
                match record.get(&name) {
                    Some(value) => out.push_str(value),
                    None => out.extend(&chars[i..j + 2]),
                }
                i = j + 2;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

proptest! {
    #[test]
    fn brace_heavy_text_matches_reference_scan(source in "[{}Na ]{0,24}") {
        let record = Record::new().with("Na", "X").with("N", "{{Na}}").with("", "E");
        prop_assert_eq!(
            Template::parse(source.clone()).render(&record),
            reference_render(&source, &record)
        );
    }

    #[test]
    fn known_placeholders_substitute_exactly(
        parts in prop::collection::vec(arb_part(), 0..12),
        values in prop::array::uniform3(".{0,10}"),
    ) {
        let (source, expected) = build(&parts, &values);
        let record: Record = NAMES.iter().copied().zip(values.iter().cloned()).collect();

        prop_assert_eq!(Template::parse(source).render(&record), expected);
    }

    #[test]
    fn empty_record_renders_source_unchanged(source in any::<String>()) {
        let template = Template::parse(source.clone());
        prop_assert_eq!(template.render(&Record::new()), source);
    }

    #[test]
    fn brace_free_text_is_identity(source in "[^{}]{0,64}") {
        let record = Record::new().with("Name", "Ada");
        let template = Template::parse(source.clone());
        prop_assert!(template.placeholders().is_empty());
        prop_assert_eq!(template.render(&record), source);
    }
}

#[rstest]
#[case::nested_open("{{{Name}}", "{Ada")]
#[case::unclosed("{{Name", "{{Name")]
#[case::single_braces("{Name}", "{Name}")]
#[case::empty_name("{{}}", "{{}}")]
#[case::spaces_not_trimmed("{{ Name }}", "{{ Name }}")]
#[case::case_sensitive("{{name}}", "{{name}}")]
#[case::trailing_close("{{Name}}}", "Ada}")]
fn edge_templates(#[case] source: &str, #[case] expected: &str) {
    let record = Record::new().with("Name", "Ada");
    assert_eq!(Template::parse(source).render(&record), expected);
}

#[test]
fn substituted_values_are_not_rescanned() {
    let record = Record::new().with("Name", "{{ID}}").with("ID", "7");
    assert_eq!(Template::parse("{{Name}}/{{ID}}").render(&record), "{{ID}}/7");
}
