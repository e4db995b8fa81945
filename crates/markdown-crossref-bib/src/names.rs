//! Person names in `author`/`editor` style fields.

use crate::latex::{TextRun, parse_rich_text, plain_text};

/// One person, split into given and family parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub given: Vec<TextRun>,
    pub family: Vec<TextRun>,
}

impl Name {
    /// `given family`, without marks.
    pub fn display(&self) -> String {
        let given = plain_text(&self.given);
        let family = plain_text(&self.family);
        match (given.is_empty(), family.is_empty()) {
            (true, _) => family,
            (_, true) => given,
            _ => format!("{given} {family}"),
        }
    }
}

/// Split a raw name list on top-level `and` and parse each name.
///
/// Understands `First Last`, `Last, First` and `von Last, Jr, First`.
/// A braced name such as `{World Wide Web Consortium}` stays one family name.
pub fn parse_names(raw: &str) -> Vec<Name> {
    split_top_level(raw, Separator::And)
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .map(parse_name)
        .collect()
}

fn parse_name(raw: &str) -> Name {
    let parts = split_top_level(raw, Separator::Comma);
    match parts.as_slice() {
        [family, given] => Name {
            given: parse_rich_text(given),
            family: parse_rich_text(family),
        },
        [family, _suffix, given, ..] => Name {
            given: parse_rich_text(given),
            family: parse_rich_text(family),
        },
        _ => {
            let words = split_top_level(raw, Separator::Whitespace);
            match words.split_last() {
                Some((family, given)) if !given.is_empty() => Name {
                    given: parse_rich_text(&given.join(" ")),
                    family: parse_rich_text(family),
                },
                _ => Name {
                    given: Vec::new(),
                    family: parse_rich_text(raw),
                },
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Separator {
    And,
    Comma,
    Whitespace,
}

/// Split `raw` at separators outside braces.
fn split_top_level(raw: &str, separator: Separator) -> Vec<&str> {
    let bytes = raw.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                i += 2;
                continue;
            }
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            _ if depth > 0 => {}
            b',' if matches!(separator, Separator::Comma) => {
                parts.push(raw[start..i].trim());
                start = i + 1;
            }
            b if b.is_ascii_whitespace() => match separator {
                Separator::Whitespace => {
                    if i > start {
                        parts.push(&raw[start..i]);
                    }
                    start = i + 1;
                }
                Separator::And => {
                    let rest = &bytes[i + 1..];
                    if rest.len() >= 4
                        && rest[..3].eq_ignore_ascii_case(b"and")
                        && rest[3].is_ascii_whitespace()
                    {
                        parts.push(raw[start..i].trim());
                        i += 4;
                        start = i;
                        continue;
                    }
                }
                Separator::Comma => {}
            },
            _ => {}
        }
        i += 1;
    }

    let tail = raw.get(start..).unwrap_or("");
    match separator {
        Separator::Whitespace if tail.is_empty() => {}
        Separator::Whitespace => parts.push(tail),
        _ => parts.push(tail.trim()),
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn displayed(raw: &str) -> Vec<String> {
        parse_names(raw).iter().map(Name::display).collect()
    }

    #[rstest]
    #[case::first_last("Donald E. Knuth", "Donald E.", "Knuth")]
    #[case::last_first("Knuth, Donald E.", "Donald E.", "Knuth")]
    #[case::with_suffix("King, Jr, Martin Luther", "Martin Luther", "King")]
    #[case::braced_corporate("{World Wide Web Consortium}", "", "World Wide Web Consortium")]
    #[case::single_word("Plato", "", "Plato")]
    fn name_forms(#[case] raw: &str, #[case] given: &str, #[case] family: &str) {
        let names = parse_names(raw);
        assert_eq!(names.len(), 1);
        assert_eq!(plain_text(&names[0].given), given);
        assert_eq!(plain_text(&names[0].family), family);
    }

    #[test]
    fn splits_on_and() {
        assert_eq!(
            displayed("Leslie Lamport and Knuth, Donald\nAND Tim Berners-Lee"),
            vec!["Leslie Lamport", "Donald Knuth", "Tim Berners-Lee"]
        );
    }

    #[test]
    fn and_inside_braces_is_kept() {
        assert_eq!(
            displayed("{Barnes and Noble} and Jane Doe"),
            vec!["Barnes and Noble", "Jane Doe"]
        );
    }

    #[test]
    fn and_inside_a_word_is_not_a_separator() {
        assert_eq!(displayed("Alexander Sandberg"), vec!["Alexander Sandberg"]);
    }

    #[test]
    fn accents_in_names() {
        assert_eq!(displayed(r#"Kurt G\"{o}del"#), vec!["Kurt Gödel"]);
    }

    #[test]
    fn empty_input_has_no_names() {
        assert!(parse_names("  ").is_empty());
    }
}
