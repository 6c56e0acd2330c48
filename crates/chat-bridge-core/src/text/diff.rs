// File: src/text/diff.rs

/// Offset and self-authorship markers used to decide what is "new" in a watched region.
///
/// `observed_len` is a byte offset into the region's full text. It only moves forward
/// while the region grows and drops back to zero when the owner resets the session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Baseline {
    pub observed_len: usize,
    pub last_self_text: String,
}

impl Baseline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freezes the offset at `current_len` and remembers `text` as the latest local
    /// submission, so a host that echoes it back does not report it as remote text.
    pub fn mark_self_authored(&mut self, current_len: usize, text: &str) {
        self.observed_len = current_len;
        self.last_self_text = text.to_string();
    }

    pub fn reset(&mut self) {
        self.observed_len = 0;
        self.last_self_text.clear();
    }
}

/// How a delta was derived. Only used for diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeltaKind {
    Unchanged,
    Appended,
    EchoSuppressed,
    Replaced,
}

impl DeltaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeltaKind::Unchanged => "unchanged",
            DeltaKind::Appended => "appended",
            DeltaKind::EchoSuppressed => "echo_suppressed",
            DeltaKind::Replaced => "replaced",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delta {
    pub text: String,
    pub baseline: Baseline,
    pub kind: DeltaKind,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Computes the newly appended, not self-authored portion of `full_text`.
///
/// The returned baseline always covers the whole of `full_text`, whether or not a
/// delta was produced. A shrunk region (or an offset that no longer falls on a char
/// boundary) means the host replaced the content wholesale; the entire text is then
/// the delta and no echo stripping is attempted.
pub fn compute_delta(full_text: &str, baseline: &Baseline) -> Delta {
    let full_len = full_text.len();

    if full_len < baseline.observed_len || !full_text.is_char_boundary(baseline.observed_len) {
        return Delta {
            text: full_text.to_string(),
            baseline: Baseline {
                observed_len: full_len,
                last_self_text: baseline.last_self_text.clone(),
            },
            kind: DeltaKind::Replaced,
        };
    }

    let remainder = &full_text[baseline.observed_len..];
    if remainder.is_empty() {
        return Delta {
            text: String::new(),
            baseline: baseline.clone(),
            kind: DeltaKind::Unchanged,
        };
    }

    let trimmed = remainder.trim();
    let self_text = baseline.last_self_text.trim();

    let (text, last_self_text, kind) = match strip_self_echo(trimmed, self_text) {
        Some(rest) => (rest.trim().to_string(), String::new(), DeltaKind::EchoSuppressed),
        None => (
            trimmed.to_string(),
            baseline.last_self_text.clone(),
            DeltaKind::Appended,
        ),
    };

    Delta {
        text,
        baseline: Baseline {
            observed_len: full_len,
            last_self_text,
        },
        kind,
    }
}

fn strip_self_echo<'a>(remainder: &'a str, self_text: &str) -> Option<&'a str> {
    if self_text.is_empty() {
        return None;
    }
    remainder.strip_prefix(self_text)
}
