//! Interpretation of the LaTeX markup found inside field values.
//!
//! Only the small subset that shows up in real bibliographies is understood:
//! font-style commands become [`Mark`]s, a handful of logos and symbols become
//! text, accent escapes compose with the following letter, braces only group.
//! Unknown commands are dropped while their argument text is kept.

use crate::lexer::{Token, TokenKind, lex};

/// Formatting attached to a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    Emphasis,
    Strong,
    Superscript,
    Subscript,
    SmallCaps,
    Underline,
    Monospace,
}

impl Mark {
    fn from_command(name: &str) -> Option<Self> {
        Some(match name {
            "emph" | "textit" | "textsl" | "mkbibemph" | "mkbibitalic" => Mark::Emphasis,
            "textbf" | "mkbibbold" => Mark::Strong,
            "textsuperscript" | "mkbibsuperscript" => Mark::Superscript,
            "textsubscript" | "mkbibsubscript" => Mark::Subscript,
            "textsc" => Mark::SmallCaps,
            "underline" | "uline" => Mark::Underline,
            "texttt" | "url" => Mark::Monospace,
            _ => return None,
        })
    }
}

/// A run of text sharing one set of marks, outermost mark first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub marks: Vec<Mark>,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Vec::new(),
        }
    }
}

/// Concatenate the text of `runs`, dropping marks.
pub fn plain_text(runs: &[TextRun]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

/// Parse a raw field value into marked text runs.
///
/// Whitespace is collapsed to single spaces and trimmed at both ends.
pub fn parse_rich_text(src: &str) -> Vec<TextRun> {
    let tokens = lex(src);
    let mut reader = RichTextReader {
        tokens: &tokens,
        pos: 0,
        marks: Vec::new(),
        out: Vec::new(),
    };
    reader.group(false);
    trim_runs(reader.out)
}

struct RichTextReader<'t, 'input> {
    tokens: &'t [Token<'input>],
    pos: usize,
    marks: Vec<Mark>,
    out: Vec<TextRun>,
}

impl RichTextReader<'_, '_> {
    fn kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn text(&self, n: usize) -> &str {
        self.tokens.get(self.pos + n).map(|t| t.text).unwrap_or("")
    }

    /// Read until the closing brace of the current group (or end of input).
    fn group(&mut self, nested: bool) {
        while let Some(kind) = self.kind(0) {
            match kind {
                TokenKind::RBrace => {
                    self.pos += 1;
                    if nested {
                        return;
                    }
                }
                TokenKind::LBrace => {
                    self.pos += 1;
                    self.group(true);
                }
                TokenKind::Command => self.command(),
                TokenKind::Escape => self.escape(),
                TokenKind::Backslash => self.pos += 1,
                TokenKind::Whitespace => {
                    self.push(" ");
                    self.pos += 1;
                }
                TokenKind::Word => {
                    let text = self.text(0).replace('~', "\u{a0}");
                    self.push(&text);
                    self.pos += 1;
                }
                _ => {
                    let text = self.text(0).to_string();
                    self.push(&text);
                    self.pos += 1;
                }
            }
        }
    }

    fn command(&mut self) {
        let name = self.text(0)[1..].to_string();
        self.pos += 1;

        if let Some(mark) = Mark::from_command(&name) {
            self.skip_whitespace();
            if self.kind(0) == Some(TokenKind::LBrace) {
                self.pos += 1;
                self.marks.push(mark);
                self.group(true);
                self.marks.pop();
            }
            return;
        }

        if let Some(symbol) = symbol(&name) {
            self.push(symbol);
            // `\LaTeX{}` style empty argument
            if self.kind(0) == Some(TokenKind::LBrace) && self.kind(1) == Some(TokenKind::RBrace) {
                self.pos += 2;
            }
        }
        // Unknown commands vanish; a following group is read as plain grouping.
    }

    fn escape(&mut self) {
        let Some(symbol) = self.text(0).chars().nth(1) else {
            self.pos += 1;
            return;
        };
        self.pos += 1;

        if !is_accent(symbol) {
            self.push(&symbol.to_string());
            return;
        }

        // `\"a` or `\"{a}`
        let (base, consumed) = match (self.kind(0), self.kind(1), self.kind(2)) {
            (Some(TokenKind::Word), _, _) => (self.text(0).to_string(), 1),
            (Some(TokenKind::LBrace), Some(TokenKind::Word), Some(TokenKind::RBrace)) => {
                (self.text(1).to_string(), 3)
            }
            _ => {
                self.push(&symbol.to_string());
                return;
            }
        };
        self.pos += consumed;

        let mut chars = base.chars();
        if let Some(first) = chars.next() {
            let composed = compose(symbol, first);
            let mut text = composed.to_string();
            text.push_str(chars.as_str());
            self.push(&text);
        }
    }

    fn skip_whitespace(&mut self) {
        while self.kind(0) == Some(TokenKind::Whitespace) {
            self.pos += 1;
        }
    }

    fn push(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        // Collapse runs of whitespace, including across tokens.
        if text == " "
            && self
                .out
                .last()
                .is_some_and(|run| run.text.ends_with(' ') && run.marks == self.marks)
        {
            return;
        }
        match self.out.last_mut() {
            Some(run) if run.marks == self.marks => run.text.push_str(text),
            _ => self.out.push(TextRun {
                text: text.to_string(),
                marks: self.marks.clone(),
            }),
        }
    }
}

fn trim_runs(mut runs: Vec<TextRun>) -> Vec<TextRun> {
    if let Some(first) = runs.first_mut() {
        first.text = first.text.trim_start().to_string();
    }
    if let Some(last) = runs.last_mut() {
        last.text = last.text.trim_end().to_string();
    }
    runs.retain(|run| !run.text.is_empty());
    runs
}

fn symbol(name: &str) -> Option<&'static str> {
    Some(match name {
        "LaTeX" => "LaTeX",
        "TeX" => "TeX",
        "BibTeX" => "BibTeX",
        "ss" => "ß",
        "ae" => "æ",
        "AE" => "Æ",
        "oe" => "œ",
        "OE" => "Œ",
        "o" => "ø",
        "O" => "Ø",
        "aa" => "å",
        "AA" => "Å",
        "l" => "ł",
        "L" => "Ł",
        "i" => "ı",
        "dag" => "†",
        "S" => "§",
        "P" => "¶",
        "copyright" => "©",
        "textendash" => "–",
        "textemdash" => "—",
        "ldots" | "dots" => "…",
        "textquoteleft" => "‘",
        "textquoteright" => "’",
        _ => return None,
    })
}

fn is_accent(c: char) -> bool {
    matches!(c, '"' | '\'' | '`' | '^' | '~' | '=' | '.')
}

/// Compose an accent escape with its base letter, falling back to a combining mark.
fn compose(accent: char, base: char) -> String {
    let table: &[(char, &str, &str)] = &[
        ('"', "aeiouyAEIOU", "äëïöüÿÄËÏÖÜ"),
        ('\'', "aeiouyAEIOUcnsz", "áéíóúýÁÉÍÓÚćńśź"),
        ('`', "aeiouAEIOU", "àèìòùÀÈÌÒÙ"),
        ('^', "aeiouAEIOU", "âêîôûÂÊÎÔÛ"),
        ('~', "anoANO", "ãñõÃÑÕ"),
        ('=', "aeiouAEIOU", "āēīōūĀĒĪŌŪ"),
        ('.', "zZ", "żŻ"),
    ];
    for (mark, from, to) in table {
        if *mark != accent {
            continue;
        }
        if let Some(idx) = from.chars().position(|c| c == base)
            && let Some(composed) = to.chars().nth(idx)
        {
            return composed.to_string();
        }
    }
    let combining = match accent {
        '"' => '\u{308}',
        '\'' => '\u{301}',
        '`' => '\u{300}',
        '^' => '\u{302}',
        '~' => '\u{303}',
        '=' => '\u{304}',
        _ => '\u{307}',
    };
    format!("{base}{combining}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(text: &str, marks: &[Mark]) -> TextRun {
        TextRun {
            text: text.to_string(),
            marks: marks.to_vec(),
        }
    }

    #[test]
    fn braces_only_group() {
        assert_eq!(
            parse_rich_text("The {TeX} Book"),
            vec![TextRun::plain("The TeX Book")]
        );
    }

    #[test]
    fn marks_become_runs() {
        assert_eq!(
            parse_rich_text(r"The \textbf{TeX} Book"),
            vec![
                run("The ", &[]),
                run("TeX", &[Mark::Strong]),
                run(" Book", &[]),
            ]
        );
    }

    #[test]
    fn superscript_and_subscript() {
        assert_eq!(
            parse_rich_text(r"L\textsuperscript{A}T\textsubscript{E}X"),
            vec![
                run("L", &[]),
                run("A", &[Mark::Superscript]),
                run("T", &[]),
                run("E", &[Mark::Subscript]),
                run("X", &[]),
            ]
        );
    }

    #[test]
    fn nested_marks_stack() {
        assert_eq!(
            parse_rich_text(r"\emph{a \textbf{b}}"),
            vec![
                run("a ", &[Mark::Emphasis]),
                run("b", &[Mark::Emphasis, Mark::Strong]),
            ]
        );
    }

    #[test]
    fn escapes_and_accents() {
        assert_eq!(
            plain_text(&parse_rich_text(r#"Br\"{o}ckhaus \& M\"uller"#)),
            "Bröckhaus & Müller"
        );
    }

    #[test]
    fn symbols_and_unknown_commands() {
        assert_eq!(
            plain_text(&parse_rich_text(r"\LaTeX{} by \foo{Lamport}")),
            "LaTeX by Lamport"
        );
    }

    #[test]
    fn whitespace_collapses_and_trims() {
        assert_eq!(
            parse_rich_text("  a \n   b  "),
            vec![TextRun::plain("a b")]
        );
    }

    #[test]
    fn tilde_is_non_breaking() {
        assert_eq!(plain_text(&parse_rich_text("Donald~E.")), "Donald\u{a0}E.");
    }

    #[test]
    fn unknown_accent_uses_combining_mark() {
        assert_eq!(plain_text(&parse_rich_text(r#"\"x"#)), "x\u{308}");
    }
}
