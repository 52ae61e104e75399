use crate::data::FixtureDetail;
use crate::domain::{FilterTeam, ResultFilter, StatFilter};
use chrono::{DateTime, Utc};

/// In-memory view of a fixture, reduced to the fields the classifiers need.
#[derive(Debug, Clone, Copy)]
pub struct Fixture {
    pub id: u64,
    pub home_team_id: u64,
    pub away_team_id: u64,
    pub date: DateTime<Utc>,
    pub season_id: u64,
}

impl Fixture {
    pub fn team_id(&self, team: FilterTeam) -> u64 {
        match team {
            FilterTeam::HomeTeam => self.home_team_id,
            FilterTeam::AwayTeam => self.away_team_id,
        }
    }
}

impl From<&FixtureDetail> for Fixture {
    fn from(detail: &FixtureDetail) -> Self {
        Fixture {
            id: detail.id,
            home_team_id: detail.home_team.id,
            away_team_id: detail.away_team.id,
            date: detail.date,
            season_id: detail.season.id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatcherQuery {
    pub event_id: u64,
    pub result_filters: Vec<ResultFilter>,
    pub stat_filters: Vec<StatFilter>,
}
