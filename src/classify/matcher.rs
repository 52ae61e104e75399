use super::result::ResultFilterClassifier;
use super::stat::StatFilterClassifier;
use super::types::{Fixture, MatcherQuery};
use crate::data::FixtureClient;
use crate::error::Error;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait FilterMatcher: Send + Sync {
    /// Determines whether the fixture behind `query.event_id` satisfies every
    /// result filter and every stat filter, in that order. Evaluation stops at
    /// the first filter that fails; filters are AND-combined.
    async fn matches_filters(&self, query: &MatcherQuery) -> Result<bool, Error>;
}

pub struct DataFilterMatcher {
    fixtures: Arc<dyn FixtureClient>,
    result_classifier: ResultFilterClassifier,
    stat_classifier: StatFilterClassifier,
}

impl DataFilterMatcher {
    pub fn new(
        fixtures: Arc<dyn FixtureClient>,
        result_classifier: ResultFilterClassifier,
        stat_classifier: StatFilterClassifier,
    ) -> Self {
        Self {
            fixtures,
            result_classifier,
            stat_classifier,
        }
    }
}

#[async_trait]
impl FilterMatcher for DataFilterMatcher {
    async fn matches_filters(&self, query: &MatcherQuery) -> Result<bool, Error> {
        let detail = self.fixtures.by_id(query.event_id).await.map_err(|e| {
            Error::FixtureLookup(format!("fixture lookup for event {}: {}", query.event_id, e))
        })?;

        let fixture = Fixture::from(&detail);

        for filter in &query.result_filters {
            if !self
                .result_classifier
                .matches_filter(&fixture, filter)
                .await?
            {
                return Ok(false);
            }
        }

        for filter in &query.stat_filters {
            if !self.stat_classifier.matches_filter(&fixture, filter).await? {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{
        FixtureDetail, MatchResult, MatchScore, ResultClient, SeasonSummary, TeamResultRequest,
        TeamStats, TeamSummary,
    };
    use crate::domain::{
        FilterTeam, ResultFilter, ResultType, StatAction, StatFilter, StatMeasure, StatMetric,
        StatType, Venue,
    };
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    struct StubFixtureClient {
        fixture: FixtureDetail,
    }

    #[async_trait]
    impl FixtureClient for StubFixtureClient {
        async fn by_id(&self, _fixture_id: u64) -> Result<FixtureDetail, Error> {
            Ok(self.fixture.clone())
        }
    }

    struct FailingFixtureClient;

    #[async_trait]
    impl FixtureClient for FailingFixtureClient {
        async fn by_id(&self, fixture_id: u64) -> Result<FixtureDetail, Error> {
            Err(Error::DataService(format!(
                "fixture {} unreachable",
                fixture_id
            )))
        }
    }

    /// Returns the same result window for every fetch and records how many
    /// fetches were issued, so short-circuiting can be asserted.
    struct CountingResultClient {
        results: Vec<MatchResult>,
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl ResultClient for CountingResultClient {
        async fn by_id(&self, _fixture_id: u64) -> Result<MatchResult, Error> {
            unimplemented!("matcher never fetches single results")
        }

        async fn by_team(&self, _req: &TeamResultRequest) -> Result<Vec<MatchResult>, Error> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.results.clone())
        }
    }

    fn fixture_detail() -> FixtureDetail {
        FixtureDetail {
            id: 1234,
            home_team: TeamSummary {
                id: 1,
                name: "Home".to_string(),
            },
            away_team: TeamSummary {
                id: 50,
                name: "Away".to_string(),
            },
            season: SeasonSummary { id: 17420 },
            date: Utc.with_ymd_and_hms(2020, 3, 7, 15, 0, 0).unwrap(),
        }
    }

    fn home_win(home_id: u64, away_id: u64, home: u32, away: u32) -> MatchResult {
        MatchResult {
            id: 1,
            home_team: TeamSummary {
                id: home_id,
                name: "Home".to_string(),
            },
            away_team: TeamSummary {
                id: away_id,
                name: "Away".to_string(),
            },
            stats: Some(MatchScore {
                home_score: Some(home),
                away_score: Some(away),
            }),
            home_team_stats: Some(TeamStats {
                goals: Some(home),
                shots_on_goal: Some(home),
            }),
            away_team_stats: Some(TeamStats {
                goals: Some(away),
                shots_on_goal: Some(away),
            }),
        }
    }

    fn win_filter() -> ResultFilter {
        ResultFilter {
            team: FilterTeam::HomeTeam,
            result: ResultType::Win,
            games: 3,
            venue: Venue::Home,
        }
    }

    fn goals_filter(value: f64) -> StatFilter {
        StatFilter {
            stat: StatType::Goals,
            team: FilterTeam::HomeTeam,
            action: StatAction::For,
            games: 3,
            measure: StatMeasure::Total,
            metric: StatMetric::Gte,
            value,
            venue: Venue::Home,
        }
    }

    fn matcher(results: Arc<CountingResultClient>) -> DataFilterMatcher {
        DataFilterMatcher::new(
            Arc::new(StubFixtureClient {
                fixture: fixture_detail(),
            }),
            ResultFilterClassifier::new(results.clone()),
            StatFilterClassifier::new(results),
        )
    }

    #[tokio::test]
    async fn matches_when_every_filter_passes() {
        let results = Arc::new(CountingResultClient {
            results: vec![
                home_win(1, 50, 4, 1),
                home_win(10, 1, 1, 4),
                home_win(1, 10, 2, 0),
            ],
            calls: Mutex::new(0),
        });

        let m = matcher(results.clone());

        let query = MatcherQuery {
            event_id: 1234,
            result_filters: vec![win_filter()],
            stat_filters: vec![goals_filter(7.0)],
        };

        assert!(m.matches_filters(&query).await.unwrap());
        assert_eq!(*results.calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn a_single_failing_result_makes_the_match_false() {
        let results = Arc::new(CountingResultClient {
            results: vec![home_win(1, 50, 4, 1), home_win(1, 10, 2, 2)],
            calls: Mutex::new(0),
        });

        let m = matcher(results);

        let query = MatcherQuery {
            event_id: 1234,
            result_filters: vec![win_filter()],
            stat_filters: vec![],
        };

        assert!(!m.matches_filters(&query).await.unwrap());
    }

    #[tokio::test]
    async fn short_circuits_before_the_stat_classifier_on_result_failure() {
        let results = Arc::new(CountingResultClient {
            results: vec![home_win(1, 50, 0, 1)],
            calls: Mutex::new(0),
        });

        let m = matcher(results.clone());

        let query = MatcherQuery {
            event_id: 1234,
            result_filters: vec![win_filter(), win_filter()],
            stat_filters: vec![goals_filter(1.0)],
        };

        assert!(!m.matches_filters(&query).await.unwrap());
        // First result filter failed; second result filter and the stat
        // filter must never be evaluated.
        assert_eq!(*results.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn fixture_lookup_failure_is_a_fixture_lookup_error() {
        let results = Arc::new(CountingResultClient {
            results: vec![],
            calls: Mutex::new(0),
        });

        let m = DataFilterMatcher::new(
            Arc::new(FailingFixtureClient),
            ResultFilterClassifier::new(results.clone()),
            StatFilterClassifier::new(results),
        );

        let query = MatcherQuery {
            event_id: 1234,
            result_filters: vec![],
            stat_filters: vec![],
        };

        let err = m.matches_filters(&query).await.unwrap_err();
        assert!(matches!(err, Error::FixtureLookup(_)));
    }
}
