//! Session synthesis from popularity ranks and time-of-day models.
//!
//! Each session is drawn independently: a user from a fixed pool, a game
//! weighted by its popularity rank, a day in the simulation window, a start
//! hour conditioned on weekday or weekend, a minute, and a log-normal length.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, TimeDelta, Weekday};
use log::{debug, info};
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ranking::PopularityTable;
use crate::rng::{SessionRng, worker_tag};
use crate::sampling::{DurationModel, DurationSampler, HourModel, HourSampler};
use crate::session::{RawSession, format_timestamp, weekday_name};

/// Everything synthesis needs besides the popularity table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisPlan {
    pub num_users: usize,
    pub target_session_count: usize,
    pub start_date: NaiveDate,
    pub simulation_days: u32,
    pub seed: u64,
    pub workers: usize,
    pub hours: HourModel,
    pub duration: DurationModel,
}

/// Identifier of the `index`-th pooled user, counting from 1.
#[must_use]
pub fn user_id(index: usize) -> String {
    format!("USER_{index:04}")
}

#[must_use]
pub const fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

/// Prepared draw tables for one plan and one popularity table.
#[derive(Debug, Clone)]
pub struct SessionSynthesizer {
    users: Vec<String>,
    games: Vec<String>,
    game_weights: WeightedIndex<u32>,
    window: Vec<NaiveDate>,
    hours: HourSampler,
    duration: DurationSampler,
}

impl SessionSynthesizer {
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the table is empty, the user pool or
    /// window is empty, the window overflows the calendar, or a model is
    /// invalid.
    pub fn new(table: &PopularityTable, plan: &SynthesisPlan) -> Result<Self, ConfigError> {
        if plan.num_users == 0 {
            return Err(ConfigError::MinViolation {
                field: "num_users",
                min: 1,
                value: 0,
            });
        }
        if plan.simulation_days == 0 {
            return Err(ConfigError::MinViolation {
                field: "simulation_days",
                min: 1,
                value: 0,
            });
        }

        let games: Vec<String> = table.entries().iter().map(|e| e.name.clone()).collect();
        let game_weights = WeightedIndex::new(table.entries().iter().map(|e| e.rank))
            .map_err(|_| ConfigError::EmptyPopularity)?;

        let window_error = || ConfigError::DateWindow {
            start: plan.start_date.to_string(),
            days: plan.simulation_days,
        };
        let window = (0..plan.simulation_days)
            .map(|offset| plan.start_date.checked_add_days(Days::new(u64::from(offset))))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(window_error)?;

        // The latest possible session end must stay on the calendar.
        plan.duration.bounds.validate()?;
        let latest_start = window
            .last()
            .and_then(|day| day.and_hms_opt(23, 59, 0))
            .ok_or_else(window_error)?;
        TimeDelta::try_minutes(plan.duration.bounds.max_minutes)
            .and_then(|longest| latest_start.checked_add_signed(longest))
            .ok_or_else(window_error)?;

        Ok(Self {
            users: (1..=plan.num_users).map(user_id).collect(),
            games,
            game_weights,
            window,
            hours: plan.hours.sampler()?,
            duration: plan.duration.sampler()?,
        })
    }

    #[must_use]
    pub fn games(&self) -> &[String] {
        &self.games
    }

    /// Draw a game with probability proportional to its rank.
    pub fn draw_game<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        &self.games[self.game_weights.sample(rng)]
    }

    /// Draw one complete session.
    pub fn draw_session<R: Rng + ?Sized>(&self, rng: &mut R) -> RawSession {
        let user = &self.users[rng.gen_range(0..self.users.len())];
        let game = self.draw_game(rng);

        let date = self.window[rng.gen_range(0..self.window.len())];
        let weekday = date.weekday();
        let hour = self.hours.sample(is_weekend(weekday), rng);
        let minute: u32 = rng.gen_range(0..=59);
        let duration = self.duration.sample(rng);

        let start = date.and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default());
        let end = start + TimeDelta::minutes(duration);

        RawSession {
            user_id: user.clone(),
            game_id: game.to_string(),
            session_start: format_timestamp(&start),
            session_end: format_timestamp(&end),
            session_duration: Some(duration),
            day_of_week: weekday_name(weekday).to_string(),
            hour_of_day: Some(hour),
        }
    }

    /// Draw `count` sessions from a single stream, logging progress every 10%.
    pub fn generate<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<RawSession> {
        let step = count / 10;
        let mut sessions = Vec::with_capacity(count);
        for i in 0..count {
            sessions.push(self.draw_session(rng));
            if step > 0 && (i + 1) % step == 0 {
                info!("Simulation progress: {}% complete", (i + 1) * 100 / count);
            }
        }
        sessions
    }
}

/// Split `total` into `workers` contiguous chunk sizes; the remainder goes to
/// the lowest-index workers.
#[must_use]
pub fn chunk_sizes(total: usize, workers: usize) -> Vec<usize> {
    let workers = workers.max(1);
    let base = total / workers;
    let remainder = total % workers;
    (0..workers)
        .map(|idx| base + usize::from(idx < remainder))
        .collect()
}

/// Produce exactly `plan.target_session_count` raw sessions.
///
/// Worker `i` draws its chunk from stream `worker-i` under `plan.seed`, and
/// chunks are concatenated in worker order, so output depends only on the
/// table, the plan, and the worker count.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the synthesizer cannot be prepared.
pub fn synthesize_sessions(
    table: &PopularityTable,
    plan: &SynthesisPlan,
) -> Result<Vec<RawSession>, ConfigError> {
    if plan.workers == 0 {
        return Err(ConfigError::MinViolation {
            field: "workers",
            min: 1,
            value: 0,
        });
    }
    let synthesizer = SessionSynthesizer::new(table, plan)?;
    info!(
        "Simulating {} sessions for {} users over {} days...",
        plan.target_session_count, plan.num_users, plan.simulation_days
    );

    let chunks = chunk_sizes(plan.target_session_count, plan.workers);
    let run_chunk = |idx: usize, count: usize| {
        let mut rng = SessionRng::for_stream(plan.seed, &worker_tag(idx));
        let sessions = synthesizer.generate(count, &mut rng);
        debug!("Worker {idx} produced {count} sessions using {} draws", rng.draws());
        sessions
    };

    let sessions: Vec<RawSession> = if chunks.len() == 1 {
        run_chunk(0, chunks[0])
    } else {
        std::thread::scope(|scope| {
            let handles: Vec<_> = chunks
                .iter()
                .enumerate()
                .map(|(idx, &count)| scope.spawn(move || run_chunk(idx, count)))
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect()
        })
    };

    info!("Session simulation complete.");
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::rank_popularity;
    use crate::schema::NormalizedRecord;
    use crate::session::parse_timestamp;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn table() -> PopularityTable {
        rank_popularity(
            [("Game A", 950), ("Game B", 500), ("Game C", 50)]
                .into_iter()
                .map(|(name, peak_players)| NormalizedRecord {
                    name: name.to_string(),
                    peak_players,
                }),
        )
    }

    fn plan() -> SynthesisPlan {
        SynthesisPlan {
            num_users: 25,
            target_session_count: 400,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            simulation_days: 14,
            seed: 42,
            workers: 1,
            hours: HourModel::default(),
            duration: DurationModel::default(),
        }
    }

    #[test]
    fn produces_exactly_the_target_count() {
        let sessions = synthesize_sessions(&table(), &plan()).unwrap();
        assert_eq!(sessions.len(), 400);
        let empty = SynthesisPlan {
            target_session_count: 0,
            ..plan()
        };
        assert!(synthesize_sessions(&table(), &empty).unwrap().is_empty());
    }

    #[test]
    fn sessions_are_internally_consistent() {
        let plan = plan();
        for session in synthesize_sessions(&table(), &plan).unwrap() {
            let start = parse_timestamp(&session.session_start).unwrap();
            let end = parse_timestamp(&session.session_end).unwrap();
            let minutes = session.session_duration.unwrap();
            assert_eq!((end - start).num_minutes(), minutes);
            assert!((15..=600).contains(&minutes));
            assert_eq!(session.hour_of_day, Some(chrono::Timelike::hour(&start)));
            assert_eq!(session.day_of_week, start.format("%A").to_string());
            let day = start.date();
            assert!(day >= plan.start_date && day < plan.start_date + Days::new(14));
            assert!(session.user_id.starts_with("USER_"));
        }
    }

    #[test]
    fn weekend_only_window_uses_weekend_hours() {
        let saturday = SynthesisPlan {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
            simulation_days: 2,
            ..plan()
        };
        for session in synthesize_sessions(&table(), &saturday).unwrap() {
            assert!(matches!(session.day_of_week.as_str(), "Saturday" | "Sunday"));
            assert!((12..=23).contains(&session.hour_of_day.unwrap()));
        }
    }

    #[test]
    fn same_seed_replays_and_other_seed_diverges() {
        let first = synthesize_sessions(&table(), &plan()).unwrap();
        let second = synthesize_sessions(&table(), &plan()).unwrap();
        assert_eq!(first, second);
        let other = SynthesisPlan { seed: 43, ..plan() };
        assert_ne!(first, synthesize_sessions(&table(), &other).unwrap());
    }

    #[test]
    fn parallel_workers_are_reproducible_and_complete() {
        let parallel = SynthesisPlan {
            workers: 3,
            target_session_count: 401,
            ..plan()
        };
        let a = synthesize_sessions(&table(), &parallel).unwrap();
        let b = synthesize_sessions(&table(), &parallel).unwrap();
        assert_eq!(a.len(), 401);
        assert_eq!(a, b);
    }

    #[test]
    fn first_worker_chunk_matches_single_stream_prefix() {
        let single = synthesize_sessions(&table(), &plan()).unwrap();
        let split = synthesize_sessions(&table(), &SynthesisPlan { workers: 4, ..plan() }).unwrap();
        assert_eq!(single[..100], split[..100]);
    }

    #[test]
    fn chunk_sizes_spread_remainder_to_first_workers() {
        assert_eq!(chunk_sizes(10, 3), vec![4, 3, 3]);
        assert_eq!(chunk_sizes(2, 4), vec![1, 1, 0, 0]);
        assert_eq!(chunk_sizes(5, 0), vec![5]);
    }

    #[test]
    fn user_pool_is_drawn_from_fixed_identifiers() {
        let plan = SynthesisPlan {
            num_users: 1,
            ..plan()
        };
        let synthesizer = SessionSynthesizer::new(&table(), &plan).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..20 {
            assert_eq!(synthesizer.draw_session(&mut rng).user_id, "USER_0001");
        }
        assert_eq!(user_id(12), "USER_0012");
    }

    #[test]
    fn invalid_plans_are_rejected() {
        let no_users = SynthesisPlan {
            num_users: 0,
            ..plan()
        };
        assert!(matches!(
            SessionSynthesizer::new(&table(), &no_users),
            Err(ConfigError::MinViolation { field: "num_users", .. })
        ));
        let no_workers = SynthesisPlan {
            workers: 0,
            ..plan()
        };
        assert!(synthesize_sessions(&table(), &no_workers).is_err());
        assert_eq!(
            SessionSynthesizer::new(&PopularityTable::default(), &plan()).unwrap_err(),
            ConfigError::EmptyPopularity
        );
        let overflow = SynthesisPlan {
            start_date: NaiveDate::MAX,
            simulation_days: 3,
            ..plan()
        };
        assert!(matches!(
            SessionSynthesizer::new(&table(), &overflow),
            Err(ConfigError::DateWindow { .. })
        ));
    }

    #[test]
    fn sessions_ending_past_the_calendar_are_rejected_up_front() {
        let last_day = SynthesisPlan {
            start_date: NaiveDate::MAX,
            simulation_days: 1,
            ..plan()
        };
        assert!(matches!(
            synthesize_sessions(&table(), &last_day),
            Err(ConfigError::DateWindow { days: 1, .. })
        ));

        let day_before = SynthesisPlan {
            start_date: NaiveDate::MAX.pred_opt().unwrap(),
            simulation_days: 1,
            target_session_count: 50,
            ..plan()
        };
        assert_eq!(synthesize_sessions(&table(), &day_before).unwrap().len(), 50);
    }
}
