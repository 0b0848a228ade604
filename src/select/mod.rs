//! Candidate selection with the color cross-check.
//!
//! Match results are folded through a small state machine:
//!
//! ```text
//! Scanning --(qualifying result)--> CandidateFound --+--> Final (matched)
//!     |                                  |           +--> Final (CrossCheckFailed)
//!     |                                  +--(no color)--> ColorAbsentOverride --> Final (ColorAbsent)
//!     +--(finish)--> Final (NoCandidate)
//! ```
//!
//! A result qualifies when it reaches the match floor, beats the current
//! candidate strictly and its name agrees with the detected color. The
//! candidate is checked against the color a second time on finish.

use crate::color::{ColorBands, ColorIndex};
use crate::matching::MatchResult;
use crate::trace::{trace_error, trace_event};

/// Default minimum number of good matches for a candidate.
pub const DEFAULT_MIN_MATCHES: usize = 20;

/// Outcome of one identification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub matched: bool,
    /// Present only when `matched` is true.
    pub character: Option<String>,
}

impl Verdict {
    pub fn matched(character: impl Into<String>) -> Self {
        Self {
            matched: true,
            character: Some(character.into()),
        }
    }

    pub fn no_match() -> Self {
        Self {
            matched: false,
            character: None,
        }
    }
}

/// Why an identification failed. Diagnostic only; callers see `matched=false`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureCause {
    /// No frame had been delivered when identification ran.
    NoFrame,
    /// No template cleared the match floor with color agreement.
    NoCandidate,
    /// The best candidate disagreed with the detected color.
    CrossCheckFailed,
    /// A candidate existed but no color was detected.
    ColorAbsent,
}

impl FailureCause {
    /// Short log message for the cause.
    pub fn message(self) -> &'static str {
        match self {
            FailureCause::NoFrame => "no frame available",
            FailureCause::NoCandidate => "failed to identify any character",
            FailureCause::CrossCheckFailed | FailureCause::ColorAbsent => "failed cross check",
        }
    }

    /// Stable snake-case identifier, used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureCause::NoFrame => "no_frame",
            FailureCause::NoCandidate => "no_candidate",
            FailureCause::CrossCheckFailed => "cross_check_failed",
            FailureCause::ColorAbsent => "color_absent",
        }
    }
}

/// A verdict together with its failure cause, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    pub verdict: Verdict,
    pub cause: Option<FailureCause>,
}

impl Selection {
    fn success(character: String) -> Self {
        Self {
            verdict: Verdict::matched(character),
            cause: None,
        }
    }

    pub(crate) fn failure(cause: FailureCause) -> Self {
        Self {
            verdict: Verdict::no_match(),
            cause: Some(cause),
        }
    }
}

/// Selector states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorState {
    Scanning,
    CandidateFound { name: String, good_matches: usize },
    ColorAbsentOverride { name: String },
    Final(Selection),
}

/// Incremental selector over match results in store order.
#[derive(Clone, Debug)]
pub struct Selector<'a> {
    bands: &'a ColorBands,
    color: Option<ColorIndex>,
    min_matches: usize,
    state: SelectorState,
}

impl<'a> Selector<'a> {
    pub fn new(bands: &'a ColorBands, color: Option<ColorIndex>, min_matches: usize) -> Self {
        Self {
            bands,
            color,
            min_matches,
            state: SelectorState::Scanning,
        }
    }

    /// Current state.
    pub fn state(&self) -> &SelectorState {
        &self.state
    }

    /// Feeds one match result. Ignored once the selector is past scanning.
    pub fn observe(&mut self, result: &MatchResult) {
        let best = match &self.state {
            SelectorState::Scanning => 0,
            SelectorState::CandidateFound { good_matches, .. } => *good_matches,
            _ => return,
        };
        let qualifies = result.good_matches > best
            && result.good_matches >= self.min_matches
            && self.bands.cross_check(self.color, &result.template_name);
        if qualifies {
            self.state = SelectorState::CandidateFound {
                name: result.template_name.clone(),
                good_matches: result.good_matches,
            };
        }
    }

    fn step(&mut self) {
        let next = match std::mem::replace(&mut self.state, SelectorState::Scanning) {
            SelectorState::Scanning => {
                SelectorState::Final(Selection::failure(FailureCause::NoCandidate))
            }
            SelectorState::CandidateFound { name, .. } => {
                if self.color.is_none() {
                    SelectorState::ColorAbsentOverride { name }
                } else if self.bands.cross_check(self.color, &name) {
                    SelectorState::Final(Selection::success(name))
                } else {
                    SelectorState::Final(Selection::failure(FailureCause::CrossCheckFailed))
                }
            }
            SelectorState::ColorAbsentOverride { .. } => {
                SelectorState::Final(Selection::failure(FailureCause::ColorAbsent))
            }
            done @ SelectorState::Final(_) => done,
        };
        self.state = next;
    }

    /// Runs the remaining transitions and returns the selection.
    pub fn finish(mut self) -> Selection {
        loop {
            if let SelectorState::Final(selection) = self.state {
                return selection;
            }
            self.step();
        }
    }
}

/// Reduces match results to a single selection.
pub fn select(
    color: Option<ColorIndex>,
    bands: &ColorBands,
    results: &[MatchResult],
    min_matches: usize,
) -> Selection {
    let mut selector = Selector::new(bands, color, min_matches);
    for result in results {
        selector.observe(result);
    }
    let selection = selector.finish();
    match (&selection.verdict.character, selection.cause) {
        (Some(character), _) => {
            trace_event!("character_identified", character = character.as_str());
        }
        (None, Some(cause)) => {
            trace_error!(
                "identification_failed",
                cause = cause.as_str(),
                message = cause.message()
            );
        }
        (None, None) => {}
    }
    selection
}
