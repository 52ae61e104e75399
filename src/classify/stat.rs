use super::types::Fixture;
use crate::data::{MatchResult, ResultClient, TeamResultRequest, TeamStats};
use crate::domain::{StatAction, StatFilter, StatMeasure, StatMetric, StatType};
use crate::error::Error;
use std::sync::Arc;

/// Classifies a fixture against a single stat filter by aggregating a per-match
/// stat over the team's recent window and comparing it to the filter value.
pub struct StatFilterClassifier {
    results: Arc<dyn ResultClient>,
}

impl StatFilterClassifier {
    pub fn new(results: Arc<dyn ResultClient>) -> Self {
        Self { results }
    }

    pub async fn matches_filter(
        &self,
        fixture: &Fixture,
        filter: &StatFilter,
    ) -> Result<bool, Error> {
        let team_id = fixture.team_id(filter.team);

        let req = TeamResultRequest {
            team_id,
            limit: filter.games,
            date_before: fixture.date,
            season_ids: vec![fixture.season_id],
            venue: filter.venue,
        };

        let results = self.results.by_team(&req).await?;

        meets_stat_criteria(&results, team_id, filter)
    }
}

fn meets_stat_criteria(
    results: &[MatchResult],
    team_id: u64,
    filter: &StatFilter,
) -> Result<bool, Error> {
    let values = parse_stat_values(results, team_id, filter)?;

    match filter.measure {
        StatMeasure::Continuous => Ok(meets_continuous_criteria(
            &values,
            filter.metric,
            filter.value,
        )),
        StatMeasure::Total => {
            let values = require_values(values, team_id)?;
            let total: u32 = values.iter().sum();
            Ok(filter.metric.compare(truncate_cents(total as f64), filter.value))
        }
        StatMeasure::Average => {
            let values = require_values(values, team_id)?;
            let total: u32 = values.iter().sum();
            let average = total as f64 / values.len() as f64;
            Ok(filter.metric.compare(truncate_cents(average), filter.value))
        }
    }
}

fn parse_stat_values(
    results: &[MatchResult],
    team_id: u64,
    filter: &StatFilter,
) -> Result<Vec<u32>, Error> {
    let mut values = Vec::with_capacity(results.len());

    for result in results {
        let stats = parse_team_stats(result, team_id, filter.action)?;
        values.push(parse_stat_value(&stats, filter.stat, team_id, result.id)?);
    }

    Ok(values)
}

/// Selects the relevant side's stats: FOR reads the team's own numbers,
/// AGAINST reads the opponent's numbers in the same match.
fn parse_team_stats(
    result: &MatchResult,
    team_id: u64,
    action: StatAction,
) -> Result<TeamStats, Error> {
    let team_is_home = result.home_team.id == team_id;

    let wants_home = match action {
        StatAction::For => team_is_home,
        StatAction::Against => !team_is_home,
    };

    let stats = if wants_home {
        result.home_team_stats
    } else {
        result.away_team_stats
    };

    stats.ok_or_else(|| {
        Error::StatsUnavailable(format!(
            "no stats available for team {} and result {}",
            team_id, result.id
        ))
    })
}

fn parse_stat_value(
    stats: &TeamStats,
    stat: StatType,
    team_id: u64,
    result_id: u64,
) -> Result<u32, Error> {
    let value = match stat {
        StatType::Goals => stats.goals,
        StatType::ShotsOnGoal => stats.shots_on_goal,
    };

    value.ok_or_else(|| {
        Error::StatsUnavailable(format!(
            "stat {} unavailable for team {} and result {}",
            stat.as_str(),
            team_id,
            result_id
        ))
    })
}

fn meets_continuous_criteria(values: &[u32], metric: StatMetric, value: f64) -> bool {
    values.iter().all(|&v| metric.compare(v as f64, value))
}

fn require_values(values: Vec<u32>, team_id: u64) -> Result<Vec<u32>, Error> {
    if values.is_empty() {
        return Err(Error::StatsUnavailable(format!(
            "no historical results returned for team {}",
            team_id
        )));
    }

    Ok(values)
}

/// Truncates to two decimal places. Comparison semantics are truncation, not
/// rounding: 1.666… compares as 1.66.
fn truncate_cents(value: f64) -> f64 {
    (value * 100.0).floor() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MatchScore, TeamSummary};
    use crate::domain::{FilterTeam, Venue};

    fn stat_filter(measure: StatMeasure, metric: StatMetric, value: f64) -> StatFilter {
        StatFilter {
            stat: StatType::Goals,
            team: FilterTeam::HomeTeam,
            action: StatAction::For,
            games: 3,
            measure,
            metric,
            value,
            venue: Venue::Home,
        }
    }

    fn result_with_goals(home_id: u64, goals_home: u32, goals_away: u32) -> MatchResult {
        MatchResult {
            id: 100 + goals_home as u64,
            home_team: TeamSummary {
                id: home_id,
                name: "Home".to_string(),
            },
            away_team: TeamSummary {
                id: 99,
                name: "Away".to_string(),
            },
            stats: Some(MatchScore {
                home_score: Some(goals_home),
                away_score: Some(goals_away),
            }),
            home_team_stats: Some(TeamStats {
                goals: Some(goals_home),
                shots_on_goal: Some(goals_home + 2),
            }),
            away_team_stats: Some(TeamStats {
                goals: Some(goals_away),
                shots_on_goal: Some(goals_away + 1),
            }),
        }
    }

    #[test]
    fn total_sums_the_window_before_comparing() {
        let results = vec![
            result_with_goals(1, 2, 0),
            result_with_goals(1, 1, 1),
            result_with_goals(1, 3, 2),
        ];

        let filter = stat_filter(StatMeasure::Total, StatMetric::Gte, 6.0);
        assert!(meets_stat_criteria(&results, 1, &filter).unwrap());

        let filter = stat_filter(StatMeasure::Total, StatMetric::Gte, 6.01);
        assert!(!meets_stat_criteria(&results, 1, &filter).unwrap());
    }

    #[test]
    fn average_truncates_to_two_decimal_places() {
        // {4, 0, 1} averages 1.666…, truncated to 1.66 before comparing.
        let results = vec![
            result_with_goals(1, 4, 0),
            result_with_goals(1, 0, 0),
            result_with_goals(1, 1, 0),
        ];

        let filter = stat_filter(StatMeasure::Average, StatMetric::Lte, 1.66);
        assert!(meets_stat_criteria(&results, 1, &filter).unwrap());

        let filter = stat_filter(StatMeasure::Average, StatMetric::Gte, 1.67);
        assert!(!meets_stat_criteria(&results, 1, &filter).unwrap());
    }

    #[test]
    fn continuous_requires_every_match_to_satisfy_the_metric() {
        let results = vec![
            result_with_goals(1, 2, 0),
            result_with_goals(1, 1, 0),
            result_with_goals(1, 3, 0),
        ];

        let filter = stat_filter(StatMeasure::Continuous, StatMetric::Gte, 1.0);
        assert!(meets_stat_criteria(&results, 1, &filter).unwrap());

        let filter = stat_filter(StatMeasure::Continuous, StatMetric::Gte, 2.0);
        assert!(!meets_stat_criteria(&results, 1, &filter).unwrap());
    }

    #[test]
    fn continuous_passes_vacuously_on_an_empty_window() {
        let filter = stat_filter(StatMeasure::Continuous, StatMetric::Lte, 0.5);
        assert!(meets_stat_criteria(&[], 1, &filter).unwrap());
    }

    #[test]
    fn total_and_average_fail_on_an_empty_window() {
        let filter = stat_filter(StatMeasure::Total, StatMetric::Gte, 1.0);
        let err = meets_stat_criteria(&[], 1, &filter).unwrap_err();
        assert!(matches!(err, Error::StatsUnavailable(_)));

        let filter = stat_filter(StatMeasure::Average, StatMetric::Lte, 1.0);
        let err = meets_stat_criteria(&[], 1, &filter).unwrap_err();
        assert!(matches!(err, Error::StatsUnavailable(_)));
    }

    #[test]
    fn against_reads_the_opponents_stats() {
        let results = vec![result_with_goals(1, 2, 3)];

        let mut filter = stat_filter(StatMeasure::Total, StatMetric::Gte, 3.0);
        filter.action = StatAction::Against;

        assert!(meets_stat_criteria(&results, 1, &filter).unwrap());
    }

    #[test]
    fn against_reads_home_stats_when_the_team_played_away() {
        let mut result = result_with_goals(10, 2, 1);
        result.away_team.id = 1;

        let mut filter = stat_filter(StatMeasure::Total, StatMetric::Gte, 2.0);
        filter.action = StatAction::Against;

        assert!(meets_stat_criteria(&[result], 1, &filter).unwrap());
    }

    #[test]
    fn missing_team_stats_is_a_stats_unavailable_error() {
        let mut result = result_with_goals(1, 2, 0);
        result.home_team_stats = None;

        let filter = stat_filter(StatMeasure::Total, StatMetric::Gte, 1.0);
        let err = meets_stat_criteria(&[result], 1, &filter).unwrap_err();

        assert!(matches!(err, Error::StatsUnavailable(_)));
    }

    #[test]
    fn missing_stat_field_is_a_stats_unavailable_error() {
        let mut result = result_with_goals(1, 2, 0);
        result.home_team_stats = Some(TeamStats {
            goals: None,
            shots_on_goal: Some(5),
        });

        let filter = stat_filter(StatMeasure::Total, StatMetric::Gte, 1.0);
        let err = meets_stat_criteria(&[result], 1, &filter).unwrap_err();

        assert!(matches!(err, Error::StatsUnavailable(_)));
    }

    #[test]
    fn shots_on_goal_reads_the_shots_field() {
        let results = vec![result_with_goals(1, 2, 0)];

        let mut filter = stat_filter(StatMeasure::Total, StatMetric::Gte, 4.0);
        filter.stat = StatType::ShotsOnGoal;

        assert!(meets_stat_criteria(&results, 1, &filter).unwrap());
    }

    #[test]
    fn truncation_floors_rather_than_rounds() {
        assert_eq!(truncate_cents(1.666_666), 1.66);
        assert_eq!(truncate_cents(2.999_9), 2.99);
        assert_eq!(truncate_cents(3.0), 3.0);
    }
}
