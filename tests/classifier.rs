mod common;

use chrono::Utc;

use common::{SEASON, synthetic_rows, synthetic_season, team_id};
use nba_lens::classifier::{ClassifierResult, QueryClassifier, QueryContext, RuleBasedClassifier};
use nba_lens::dataset::SeasonDataset;
use nba_lens::metrics::Metric;
use nba_lens::query::{QuerySpec, SortOrder, Window};
use nba_lens::scope_guard::{ScopeCategory, ScopeGuard};
use nba_lens::season_index::SeasonIndex;
use nba_lens::text::Tokens;

fn index() -> SeasonIndex {
    let mut index = SeasonIndex::new();
    index.insert(synthetic_season(10), Utc::now());
    index.insert(
        SeasonDataset::new("2022-23", synthetic_rows("2022-23", 6)),
        Utc::now(),
    );
    index
}

fn classify(utterance: &str) -> ClassifierResult {
    let index = index();
    let ctx = QueryContext {
        index: &index,
        selected_season: SEASON,
    };
    RuleBasedClassifier::new().classify(utterance, &ctx)
}

fn structured_spec(result: ClassifierResult) -> QuerySpec {
    match result {
        ClassifierResult::Structured(classified) => classified.query.into_spec(),
        other => panic!("expected a structured query, got {other:?}"),
    }
}

#[test]
fn top_n_leaderboard_with_window() {
    let spec = structured_spec(classify("Top 10 teams by net rating last 10 games"));
    assert_eq!(
        spec,
        QuerySpec::Leaderboard {
            metric: Metric::NetRtg,
            window: Window::Last10,
            top_n: 10,
            order: SortOrder::Desc,
        }
    );
}

#[test]
fn clutch_questions_are_out_of_scope() {
    match classify("best net rating in clutch situations") {
        ClassifierResult::OutOfScope {
            category, reason, ..
        } => {
            assert_eq!(category, Some(ScopeCategory::QuarterOrClutch));
            assert!(reason.contains("clutch"));
        }
        other => panic!("expected out of scope, got {other:?}"),
    }
}

#[test]
fn vague_efficiency_question_asks_for_clarification() {
    match classify("show me offensive efficiency") {
        ClassifierResult::Clarify {
            question,
            candidates,
            ..
        } => {
            assert!(!question.is_empty());
            assert!(
                candidates
                    .iter()
                    .any(|c| matches!(c, QuerySpec::Scatter { .. }))
            );
            assert!(candidates.iter().any(|c| matches!(
                c,
                QuerySpec::Leaderboard {
                    metric: Metric::ORtg,
                    ..
                }
            )));
        }
        other => panic!("expected clarification, got {other:?}"),
    }
}

#[test]
fn worst_reverses_the_default_order() {
    let spec = structured_spec(classify("worst 5 defenses this season"));
    assert_eq!(
        spec,
        QuerySpec::Leaderboard {
            metric: Metric::DRtg,
            window: Window::Season,
            top_n: 5,
            order: SortOrder::Desc,
        }
    );
}

#[test]
fn fewest_turnovers_sorts_ascending() {
    let spec = structured_spec(classify("which teams have the fewest turnovers over the last five games"));
    assert_eq!(
        spec,
        QuerySpec::Leaderboard {
            metric: Metric::TovRate,
            window: Window::Last5,
            top_n: 10,
            order: SortOrder::Asc,
        }
    );
}

#[test]
fn two_team_names_mean_compare() {
    let spec = structured_spec(classify("Celtics vs Lakers net rating, last 5 games"));
    assert_eq!(
        spec,
        QuerySpec::Compare {
            team_a: team_id("BOS"),
            team_b: team_id("LAL"),
            window: Window::Last5,
        }
    );
}

#[test]
fn landscape_defaults_to_ortg_and_drtg() {
    let spec = structured_spec(classify("show the efficiency landscape l20"));
    assert_eq!(
        spec,
        QuerySpec::Scatter {
            x_metric: Metric::ORtg,
            y_metric: Metric::DRtg,
            window: Window::Last20,
        }
    );

    let spec = structured_spec(classify("plot shooting"));
    assert!(matches!(
        spec,
        QuerySpec::Scatter {
            x_metric: Metric::EfgPct,
            y_metric: Metric::TsPct,
            ..
        }
    ));
}

#[test]
fn two_metrics_without_teams_mean_scatter() {
    let spec = structured_spec(classify("pace vs true shooting"));
    assert_eq!(
        spec,
        QuerySpec::Scatter {
            x_metric: Metric::Pace,
            y_metric: Metric::TsPct,
            window: Window::Season,
        }
    );
}

#[test]
fn named_season_overrides_the_selected_one() {
    match classify("top 5 pace 2022-2023") {
        ClassifierResult::Structured(classified) => {
            assert_eq!(classified.season, "2022-23");
            assert!(classified.season_override);
        }
        other => panic!("expected a structured query, got {other:?}"),
    }
}

#[test]
fn unknown_season_lists_closest_available() {
    match classify("top 10 teams by net rating in 2019-20") {
        ClassifierResult::OutOfScope {
            reason,
            suggestions,
            ..
        } => {
            assert!(reason.contains("2019-20"));
            assert!(reason.contains("2022-23, 2023-24"));
            assert_eq!(suggestions.len(), 2);
        }
        other => panic!("expected out of scope, got {other:?}"),
    }
}

#[test]
fn unsupported_window_is_rejected_by_validation() {
    match classify("top teams by pace last 15 games") {
        ClassifierResult::OutOfScope { reason, .. } => assert!(reason.contains("LAST_15")),
        other => panic!("expected out of scope, got {other:?}"),
    }
}

#[test]
fn three_teams_ask_which_pair() {
    match classify("compare celtics, lakers and heat") {
        ClassifierResult::Clarify { candidates, .. } => {
            assert_eq!(candidates.len(), 3);
            assert!(
                candidates
                    .iter()
                    .all(|c| matches!(c, QuerySpec::Compare { .. }))
            );
        }
        other => panic!("expected clarification, got {other:?}"),
    }
}

#[test]
fn unrelated_text_is_unrecognized() {
    match classify("what is the weather like") {
        ClassifierResult::OutOfScope {
            category,
            suggestions,
            ..
        } => {
            assert_eq!(category, None);
            assert!(!suggestions.is_empty());
        }
        other => panic!("expected out of scope, got {other:?}"),
    }
}

#[test]
fn denylist_wins_over_positive_signals() {
    for (text, expected) in [
        ("top 10 player scoring leaders", ScopeCategory::PlayerStats),
        ("live net rating right now", ScopeCategory::LiveData),
        ("predict the best offense next season", ScopeCategory::Prediction),
        ("net rating since christmas", ScopeCategory::DateRange),
    ] {
        match classify(text) {
            ClassifierResult::OutOfScope { category, .. } => {
                assert_eq!(category, Some(expected), "{text}");
            }
            other => panic!("{text}: expected out of scope, got {other:?}"),
        }
    }
}

#[test]
fn deny_patterns_match_whole_words() {
    let guard = ScopeGuard;
    assert!(guard.check(&Tokens::new("teams that deliver on offense")).is_none());
    assert!(guard.check(&Tokens::new("Live scores?")).is_some());
    assert!(guard.check(&Tokens::new("4th quarter offense")).is_some());
}

#[test]
fn default_top_n_is_configurable() {
    let index = index();
    let ctx = QueryContext {
        index: &index,
        selected_season: SEASON,
    };
    let classifier = RuleBasedClassifier::new().with_default_top_n(3);
    let spec = structured_spec(classifier.classify("best offenses", &ctx));
    assert!(matches!(spec, QuerySpec::Leaderboard { top_n: 3, .. }));
}

#[test]
fn every_scope_category_has_a_rule() {
    let rules = ScopeGuard.rules();
    for category in [
        ScopeCategory::DateRange,
        ScopeCategory::QuarterOrClutch,
        ScopeCategory::PlayerStats,
        ScopeCategory::LiveData,
        ScopeCategory::Prediction,
        ScopeCategory::ShotData,
        ScopeCategory::Playoffs,
        ScopeCategory::CustomFormula,
    ] {
        assert!(
            rules.iter().any(|r| r.category == category && !r.patterns.is_empty()),
            "{}",
            category.label()
        );
    }
}

#[test]
fn failed_candidates_surface_the_validation_error() {
    for (text, needle) in [
        ("best offense vs defense last 15 games", "LAST_15"),
        ("top teams last 15 games", "LAST_15"),
        ("top 50 teams", "top_n"),
    ] {
        match classify(text) {
            ClassifierResult::OutOfScope {
                reason, category, ..
            } => {
                assert!(reason.starts_with("Request could not be run"), "{text}: {reason}");
                assert!(reason.contains(needle), "{text}: {reason}");
                assert_eq!(category, None);
            }
            other => panic!("{text}: expected out of scope, got {other:?}"),
        }
    }
}

#[test]
fn clarifications_always_carry_candidates() {
    for text in [
        "show me offensive efficiency",
        "top teams",
        "compare celtics, lakers and heat",
        "compare lakers",
    ] {
        match classify(text) {
            ClassifierResult::Clarify {
                question,
                candidates,
                ..
            } => {
                assert!(!candidates.is_empty(), "{text}");
                assert!(!question.contains("Did you mean ?"), "{text}");
            }
            other => panic!("{text}: expected clarification, got {other:?}"),
        }
    }
}

#[test]
fn single_team_compare_offers_partners() {
    match classify("compare lakers") {
        ClassifierResult::Clarify {
            question,
            candidates,
            ..
        } => {
            assert!(question.contains("LAL"));
            assert_eq!(candidates.len(), 3);
            for candidate in &candidates {
                match candidate {
                    QuerySpec::Compare { team_a, team_b, .. } => {
                        assert_eq!(*team_a, team_id("LAL"));
                        assert_ne!(*team_b, team_id("LAL"));
                    }
                    other => panic!("expected compare candidates, got {other:?}"),
                }
            }
        }
        other => panic!("expected clarification, got {other:?}"),
    }
}

#[test]
fn calendar_spans_are_date_ranges() {
    for text in [
        "best offense over the last 10 days",
        "top teams by pace over the past 3 weeks",
        "top 5 teams by net rating in march",
        "best defense in may",
        "net rating from 2024-01-01 to 2024-02-01",
        "pace on 1/15/2024",
    ] {
        match classify(text) {
            ClassifierResult::OutOfScope { category, .. } => {
                assert_eq!(category, Some(ScopeCategory::DateRange), "{text}");
            }
            other => panic!("{text}: expected out of scope, got {other:?}"),
        }
    }
}

#[test]
fn game_windows_still_parse_next_to_date_rules() {
    let spec = structured_spec(classify("top 5 teams by pace last 10"));
    assert!(matches!(
        spec,
        QuerySpec::Leaderboard {
            window: Window::Last10,
            top_n: 5,
            ..
        }
    ));
    // A season label has two fields, not a calendar date.
    let spec = structured_spec(classify("top 5 pace 2023-24"));
    assert!(matches!(spec, QuerySpec::Leaderboard { metric: Metric::Pace, .. }));
}
