//! Line classifier: reads free-form generated text as screenplay lines.
//!
//! Classification is a pure function of the trimmed line and a single
//! `in_dialogue` flag carried over from the previous line. There is no lookahead.
//!
//! # Rule order (first match wins)
//! 1. Blank                      → `Blank`          (flag reset)
//! 2. `INT.` / `EXT.` / `I/E.`   → `SceneHeading`   (flag reset)
//! 3. ALL CAPS, < 40 chars, not ending in `TO:`, flag off → `CharacterName` (flag set)
//! 4. `(` ... `)`                → `Parenthetical`  (flag untouched)
//! 5. flag on                    → `Dialogue`       (flag untouched)
//! 6. ALL CAPS ending in `TO:`   → `Transition`     (flag reset)
//! 7. anything else              → `Action`         (flag reset)
//!
//! Inside a dialogue block a `CUT TO:` line is still dialogue.
//!
//! A short all-caps action sentence outside a dialogue block reads as a
//! character cue.

use serde::{Deserialize, Serialize};

const SCENE_HEADING_PREFIXES: &[&str] = &["INT.", "EXT.", "I/E."];
const TRANSITION_SUFFIX: &str = "TO:";
/// Cue lines must be strictly shorter than this (in characters).
const MAX_CUE_CHARS: usize = 40;

// ────────────────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────────────────

/// The screenplay element a single line is rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineClass {
    SceneHeading,
    CharacterName,
    Parenthetical,
    Dialogue,
    Transition,
    Action,
    Blank,
}

/// One input line together with the class it was assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedLine {
    /// The trimmed line text.
    pub text: String,
    pub class: LineClass,
}

// ────────────────────────────────────────────────────────────────────────────
// Pure classification
// ────────────────────────────────────────────────────────────────────────────

/// Classifies one line given whether the previous line left us inside a dialogue block.
///
/// Returns the class and the updated dialogue flag. The line is trimmed first,
/// so callers may pass raw lines.
pub fn classify_line(line: &str, in_dialogue: bool) -> (LineClass, bool) {
    let line = line.trim();

    if line.is_empty() {
        return (LineClass::Blank, false);
    }

    if SCENE_HEADING_PREFIXES.iter().any(|p| line.starts_with(p)) {
        return (LineClass::SceneHeading, false);
    }

    let upper = is_upper_case(line);
    let transition_like = upper && line.ends_with(TRANSITION_SUFFIX);

    if upper && !transition_like && line.chars().count() < MAX_CUE_CHARS && !in_dialogue {
        return (LineClass::CharacterName, true);
    }

    if line.starts_with('(') && line.ends_with(')') {
        return (LineClass::Parenthetical, in_dialogue);
    }

    if in_dialogue {
        return (LineClass::Dialogue, true);
    }

    if transition_like {
        return (LineClass::Transition, false);
    }

    (LineClass::Action, false)
}

/// True when the line has at least one cased character and none of them are lower-case.
///
/// Digits, punctuation and whitespace are ignored, so `"JOHN (V.O.)"` is upper-case
/// and `"123"` is not.
fn is_upper_case(s: &str) -> bool {
    let mut has_cased = false;
    for c in s.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

// ────────────────────────────────────────────────────────────────────────────
// Stateful wrapper
// ────────────────────────────────────────────────────────────────────────────

/// Threads the dialogue flag across consecutive lines.
#[derive(Debug, Default, Clone)]
pub struct Classifier {
    in_dialogue: bool,
}

impl Classifier {
    pub fn new() -> Self {
        Self::with_dialogue_flag(false)
    }

    /// Starts the classifier with an explicit dialogue flag (e.g. resuming mid-block).
    pub fn with_dialogue_flag(in_dialogue: bool) -> Self {
        Self { in_dialogue }
    }

    pub fn in_dialogue(&self) -> bool {
        self.in_dialogue
    }

    pub fn classify(&mut self, line: &str) -> LineClass {
        let (class, next) = classify_line(line, self.in_dialogue);
        self.in_dialogue = next;
        class
    }
}

/// Classifies every line of a script block, starting outside any dialogue block.
///
/// Lines are split with `str::lines`, so `\r\n` is accepted and a trailing newline
/// does not produce an extra blank line.
pub fn classify_script(text: &str) -> (Vec<ClassifiedLine>, bool) {
    let mut classifier = Classifier::new();
    let lines = text
        .lines()
        .map(|raw| {
            let text = raw.trim();
            ClassifiedLine {
                class: classifier.classify(text),
                text: text.to_string(),
            }
        })
        .collect();
    (lines, classifier.in_dialogue())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
