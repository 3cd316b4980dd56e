use crate::pipeline::Answer;

/// Renders an answer for the terminal: heading, body, numbered sources, actions.
pub fn render(answer: &Answer) -> String {
    let mut output = format!(
        "## {}\n\n{}\n",
        sanitize_heading(&answer.title),
        answer.answer.trim()
    );

    if !answer.sources.is_empty() {
        output.push_str("\n**Sources:**\n");
        for source in &answer.sources {
            output.push_str(&format!(
                "{}. [{}]({})\n",
                source.number,
                escape_md_link(&source.title),
                escape_md_link(&source.url)
            ));
        }
    }

    if !answer.actions.is_empty() {
        output.push_str("\n**Actions:**\n");
        for action in &answer.actions {
            output.push_str(&format!(
                "- [{}]({})\n",
                escape_md_link(&action.label),
                escape_md_link(&action.url)
            ));
        }
    }

    output
}

/// Escape characters that break Markdown link syntax: `[`, `]`, `(`, `)`.
pub(crate) fn escape_md_link(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '[' | ']' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Replaces newlines (which would break heading structure) with spaces.
pub(crate) fn sanitize_heading(s: &str) -> String {
    s.chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Action;
    use crate::pipeline::Source;

    #[test]
    fn escapes_special_chars() {
        assert_eq!(escape_md_link("normal text"), "normal text");
        assert_eq!(escape_md_link("a[b]c(d)e"), r"a\[b\]c\(d\)e");
    }

    #[test]
    fn sanitize_heading_replaces_newlines() {
        assert_eq!(sanitize_heading("About\nRome\r"), "About Rome ");
    }

    #[test]
    fn renders_sources_and_actions() {
        let answer = Answer {
            title: "About Colosseum".into(),
            answer: "Built in 80 AD¹.\n".into(),
            sources: vec![Source {
                number: 1,
                title: "Colosseum (Rome)".into(),
                url: "https://colosseo.example".into(),
            }],
            actions: vec![Action {
                label: "Open in Maps".into(),
                url: "https://www.google.com/maps/search/Colosseum".into(),
            }],
        };

        let text = render(&answer);
        assert!(text.starts_with("## About Colosseum\n\nBuilt in 80 AD¹.\n"));
        assert!(text.contains(r"1. [Colosseum \(Rome\)](https://colosseo.example)"));
        assert!(text.contains("- [Open in Maps](https://www.google.com/maps/search/Colosseum)"));
    }

    #[test]
    fn omits_empty_sections() {
        let answer = Answer {
            title: "Error".into(),
            answer: "Sorry.".into(),
            sources: vec![],
            actions: vec![],
        };
        let text = render(&answer);
        assert!(!text.contains("Sources"));
        assert!(!text.contains("Actions"));
    }
}
