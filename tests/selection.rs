use cluedoid::{select, ColorBands, ColorIndex, FailureCause, MatchResult, Verdict};

const RED: Option<ColorIndex> = Some(ColorIndex(0));
const CYAN: Option<ColorIndex> = Some(ColorIndex(1));
const YELLOW: Option<ColorIndex> = Some(ColorIndex(3));

fn results(counts: &[(&str, usize)]) -> Vec<MatchResult> {
    counts
        .iter()
        .map(|&(name, good_matches)| MatchResult {
            template_name: name.to_string(),
            good_matches,
        })
        .collect()
}

#[test]
fn red_frame_with_strong_scarlet_matches() {
    let bands = ColorBands::standard();
    let res = results(&[("mustard", 3), ("peacock", 7), ("plum", 12), ("scarlet", 25)]);
    let selection = select(RED, &bands, &res, 20);
    assert_eq!(selection.verdict, Verdict::matched("scarlet"));
    assert_eq!(selection.cause, None);
}

#[test]
fn top_scorer_with_wrong_color_is_passed_over() {
    let bands = ColorBands::standard();
    let res = results(&[("mustard", 30), ("peacock", 2), ("plum", 5), ("scarlet", 22)]);
    let selection = select(RED, &bands, &res, 20);
    assert_eq!(selection.verdict, Verdict::matched("scarlet"));
}

#[test]
fn no_color_fails_even_with_many_matches() {
    let bands = ColorBands::standard();
    let res = results(&[("mustard", 40), ("peacock", 40), ("plum", 40), ("scarlet", 40)]);
    let selection = select(None, &bands, &res, 20);
    assert_eq!(selection.verdict, Verdict::no_match());
    assert_eq!(selection.cause, Some(FailureCause::NoCandidate));
}

#[test]
fn matching_color_below_the_floor_fails() {
    let bands = ColorBands::standard();
    let res = results(&[("mustard", 19), ("peacock", 35), ("plum", 0), ("scarlet", 1)]);
    let selection = select(YELLOW, &bands, &res, 20);
    assert!(!selection.verdict.matched);
    assert_eq!(selection.verdict.character, None);
    assert_eq!(selection.cause, Some(FailureCause::NoCandidate));
}

#[test]
fn floor_is_inclusive() {
    let bands = ColorBands::standard();
    let res = results(&[("peacock", 20)]);
    assert_eq!(
        select(CYAN, &bands, &res, 20).verdict,
        Verdict::matched("peacock")
    );
    let res = results(&[("peacock", 19)]);
    assert!(!select(CYAN, &bands, &res, 20).verdict.matched);
}

#[test]
fn missing_template_cannot_match() {
    let bands = ColorBands::standard();
    let res = results(&[("mustard", 50), ("peacock", 50), ("plum", 50)]);
    let selection = select(RED, &bands, &res, 20);
    assert_eq!(selection.cause, Some(FailureCause::NoCandidate));
}

#[test]
fn verdict_only_names_the_color_partner() {
    let bands = ColorBands::standard();
    let names = ["mustard", "peacock", "plum", "scarlet"];
    for color in 0..4 {
        for i in 0..names.len() {
            let res: Vec<_> = names
                .iter()
                .enumerate()
                .map(|(j, &name)| MatchResult {
                    template_name: name.to_string(),
                    good_matches: if i == j { 60 } else { 20 + j },
                })
                .collect();
            let selection = select(Some(ColorIndex(color)), &bands, &res, 20);
            let partner = bands.character(ColorIndex(color)).unwrap();
            assert!(selection.verdict.matched);
            assert_eq!(selection.verdict.character.as_deref(), Some(partner));
        }
    }
}

#[test]
fn failure_causes_have_stable_names() {
    assert_eq!(FailureCause::NoFrame.as_str(), "no_frame");
    assert_eq!(FailureCause::NoCandidate.message(), "failed to identify any character");
    assert_eq!(FailureCause::ColorAbsent.message(), "failed cross check");
    assert_eq!(FailureCause::CrossCheckFailed.as_str(), "cross_check_failed");
}
