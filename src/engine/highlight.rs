use regex::RegexBuilder;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub text: String,
    pub emphasized: bool,
}

/// Text split into plain and emphasized runs
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Highlighted {
    segments: Vec<Segment>,
}

impl Highlighted {
    fn plain(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        Self {
            segments: vec![Segment {
                text: text.to_string(),
                emphasized: false,
            }],
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_annotated(&self) -> bool {
        self.segments.iter().any(|s| s.emphasized)
    }

    /// Original text without annotations
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Wrap each emphasized run in `open` / `close`
    pub fn to_markup(&self, open: &str, close: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            if segment.emphasized {
                out.push_str(open);
                out.push_str(&segment.text);
                out.push_str(close);
            } else {
                out.push_str(&segment.text);
            }
        }
        out
    }
}

/// Tag every case-insensitive, literal occurrence of `term` in `text`
pub fn search_highlight(text: &str, term: &str) -> Highlighted {
    if term.is_empty() {
        return Highlighted::plain(text);
    }

    let Ok(pattern) = RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
    else {
        return Highlighted::plain(text);
    };

    let mut segments = Vec::new();
    let mut last = 0;
    for found in pattern.find_iter(text) {
        if found.start() > last {
            segments.push(Segment {
                text: text[last..found.start()].to_string(),
                emphasized: false,
            });
        }
        segments.push(Segment {
            text: found.as_str().to_string(),
            emphasized: true,
        });
        last = found.end();
    }

    if segments.is_empty() {
        return Highlighted::plain(text);
    }
    if last < text.len() {
        segments.push(Segment {
            text: text[last..].to_string(),
            emphasized: false,
        });
    }
    Highlighted { segments }
}
