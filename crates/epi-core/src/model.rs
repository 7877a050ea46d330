//! Model Driver
//!
//! Owns the ECS world and the daily schedule. A model is built once from a
//! population size and a [`ModelConfig`], seeded with initial infections and
//! then advanced day by day; repeated runs continue the same world.

use bevy_ecs::prelude::*;
use epi_events::{DailyStats, PopulationSnapshot, TransmissionEvent};
use rand::seq::SliceRandom;
use std::path::Path;
use tracing::{debug, info};

use crate::components::{
    Demographics, DiseaseState, Health, Immunity, ModelParams, PersonId, PersonRegistry, SimClock, SimRng,
    Vaccination,
};
use crate::config::ModelConfig;
use crate::error::{ConfigError, Result};
use crate::output::{build_snapshot, record_daily_stats, EventLogger, PersonView, StatsCollector};
use crate::setup::spawn_population;
use crate::systems::{
    administer_vaccines, advance_disease, apply_self_quarantine, infect_person, release_quarantine,
    transmit_infections, update_vaccine_protection, TransmissionLog,
};

/// Days between progress lines in verbose runs
const PROGRESS_INTERVAL: u32 = 10;

/// An agent-based epidemic model over one synthetic population
pub struct Model {
    world: World,
    schedule: Schedule,
    config: ModelConfig,
    next_day: u32,
    event_logger: Option<EventLogger>,
}

impl Model {
    /// Validates `config`, generates the population and its networks, and
    /// prepares the daily schedule.
    pub fn new(population_size: usize, config: ModelConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }

        let mut world = World::new();
        let mut rng = SimRng::from_seed(config.seed);
        let registry = spawn_population(&mut world, population_size, &config, &mut rng.0)?;
        info!(
            population = registry.len(),
            households = registry.households().len(),
            occupation_groups = registry.occupations().len(),
            seed = config.seed,
            "population generated"
        );

        world.insert_resource(SimClock::default());
        world.insert_resource(ModelParams::from_config(&config));
        world.insert_resource(rng);
        world.insert_resource(registry);
        world.insert_resource(TransmissionLog::new());
        world.insert_resource(StatsCollector::new());

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                release_quarantine,
                update_vaccine_protection,
                advance_disease,
                transmit_infections,
                apply_self_quarantine,
                administer_vaccines,
                record_daily_stats,
            )
                .chain(),
        );

        Ok(Self {
            world,
            schedule,
            config,
            next_day: 0,
            event_logger: None,
        })
    }

    /// Streams every transmission event to a JSONL file at `path`.
    pub fn with_event_log(mut self, path: impl AsRef<Path>) -> Result<Self> {
        self.event_logger = Some(EventLogger::new(path)?);
        Ok(self)
    }

    /// Infects `n_seeds` susceptible agents, then simulates `days` days.
    ///
    /// Returns the statistics rows produced by this call, one per day.
    pub fn run_simulation(&mut self, days: u32, n_seeds: usize, verbose: bool) -> Result<Vec<DailyStats>> {
        let first_row = self.world.resource::<StatsCollector>().rows().len();
        let seeded = self.seed_infections(n_seeds);
        info!(start_day = self.next_day, days, seeded, "simulation started");

        for _ in 0..days {
            let day = self.next_day;
            self.world.resource_mut::<SimClock>().day = day;
            self.schedule.run(&mut self.world);
            self.next_day += 1;
            self.write_pending_events()?;

            if let Some(row) = self.world.resource::<StatsCollector>().last() {
                if verbose && day % PROGRESS_INTERVAL == 0 {
                    info!(
                        day,
                        susceptible = row.susceptible,
                        infected = row.infected,
                        recovered = row.recovered,
                        dead = row.dead,
                        "day complete"
                    );
                } else {
                    debug!(
                        day,
                        infected = row.infected,
                        new_infections = row.new_infections,
                        transmissions = row.transmissions,
                        "day complete"
                    );
                }
            }
        }

        if let Some(logger) = self.event_logger.as_mut() {
            logger.flush()?;
        }

        let rows = self.world.resource::<StatsCollector>().rows()[first_row..].to_vec();
        if let Some(last) = rows.last() {
            info!(
                day = last.day,
                infected = last.infected,
                recovered = last.recovered,
                dead = last.dead,
                "simulation finished"
            );
        }
        Ok(rows)
    }

    /// Infects up to `count` susceptible agents chosen uniformly, on the
    /// next day to be simulated. Returns how many were infected.
    fn seed_infections(&mut self, count: usize) -> usize {
        if count == 0 {
            return 0;
        }
        let day = self.next_day;
        let disease = self.world.resource::<ModelParams>().disease.clone();

        let registry = self.world.resource::<PersonRegistry>();
        let susceptible: Vec<Entity> = registry
            .entities()
            .iter()
            .copied()
            .filter(|&entity| {
                self.world
                    .get::<Health>(entity)
                    .map_or(false, |health| health.state == DiseaseState::Susceptible)
            })
            .collect();

        self.world.resource_scope(|world, mut rng: Mut<SimRng>| {
            let chosen: Vec<Entity> = susceptible
                .choose_multiple(&mut rng.0, count.min(susceptible.len()))
                .copied()
                .collect();

            let mut people = world.query::<(&Demographics, &mut Health, &mut Immunity, &Vaccination)>();
            for &entity in &chosen {
                if let Ok((demographics, mut health, mut immunity, vaccination)) = people.get_mut(world, entity) {
                    infect_person(
                        &mut rng.0,
                        &mut health,
                        &mut immunity,
                        vaccination,
                        demographics.age_group,
                        day,
                        &disease,
                    );
                }
            }
            chosen.len()
        })
    }

    fn write_pending_events(&mut self) -> Result<()> {
        let Some(logger) = self.event_logger.as_mut() else {
            return Ok(());
        };
        let mut log = self.world.resource_mut::<TransmissionLog>();
        logger.log_batch(log.unwritten())?;
        log.mark_written();
        Ok(())
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Next day to be simulated; equals the number of days run so far.
    pub fn next_day(&self) -> u32 {
        self.next_day
    }

    pub fn population_size(&self) -> usize {
        self.registry().len()
    }

    pub fn registry(&self) -> &PersonRegistry {
        self.world.resource::<PersonRegistry>()
    }

    /// The underlying world, for custom read-only reporting.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn person(&self, id: PersonId) -> Option<PersonView<'_>> {
        PersonView::get(&self.world, self.registry(), id)
    }

    /// Every agent, in id order
    pub fn people(&self) -> impl Iterator<Item = PersonView<'_>> + '_ {
        let registry = self.registry();
        (0..registry.len()).filter_map(move |index| PersonView::get(&self.world, registry, PersonId(index)))
    }

    pub fn households(&self) -> &[Vec<PersonId>] {
        self.registry().households()
    }

    pub fn occupations(&self) -> &[Vec<PersonId>] {
        self.registry().occupations()
    }

    pub fn transmission_events(&self) -> &[TransmissionEvent] {
        self.world.resource::<TransmissionLog>().events()
    }

    /// Every statistics row recorded so far, across runs
    pub fn stats(&self) -> &[DailyStats] {
        self.world.resource::<StatsCollector>().rows()
    }

    /// Snapshot of the population as of the last simulated day
    pub fn snapshot(&self) -> PopulationSnapshot {
        build_snapshot(&self.world, self.registry(), self.next_day.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiseaseParams;

    #[test]
    fn test_zero_population_rejected() {
        assert!(matches!(
            Model::new(0, ModelConfig::default()),
            Err(ConfigError::EmptyPopulation)
        ));
    }

    #[test]
    fn test_seeds_are_infected_on_day_zero() {
        let mut model = Model::new(200, ModelConfig::default().with_seed(3)).unwrap();
        let rows = model.run_simulation(1, 4, false).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].day, 0);
        assert_eq!(rows[0].new_infections, rows[0].infected);

        let infected: Vec<PersonView> = model.people().filter(|p| p.health.num_infections > 0).collect();
        assert_eq!(infected.len(), 4 + rows[0].transmissions);
        assert!(model.people().all(|p| p.health.state != DiseaseState::Dead));
    }

    #[test]
    fn test_seeds_transmit_on_day_zero() {
        let disease = DiseaseParams {
            infectious_rate: 1e6,
            ..DiseaseParams::default()
        };
        let config = ModelConfig::default().with_seed(21).with_disease(disease);
        let mut model = Model::new(500, config).unwrap();
        let rows = model.run_simulation(1, 50, false).unwrap();

        assert!(rows[0].transmissions > 0);
        let ever_infected = model.people().filter(|p| p.health.num_infections > 0).count();
        assert_eq!(ever_infected, 50 + rows[0].transmissions);
        assert!(model.transmission_events().iter().all(|event| event.day == 0));
    }

    #[test]
    fn test_seed_count_clamped_to_susceptibles() {
        let mut model = Model::new(30, ModelConfig::default()).unwrap();
        let rows = model.run_simulation(1, 500, false).unwrap();
        assert_eq!(rows[0].infected, 30);
    }

    #[test]
    fn test_second_run_continues_days() {
        let mut model = Model::new(100, ModelConfig::default()).unwrap();
        model.run_simulation(5, 2, false).unwrap();
        let rows = model.run_simulation(3, 0, false).unwrap();

        assert_eq!(rows.iter().map(|r| r.day).collect::<Vec<_>>(), vec![5, 6, 7]);
        assert_eq!(model.stats().len(), 8);
        assert_eq!(model.next_day(), 8);
        assert_eq!(model.snapshot().day, 7);
    }

    #[test]
    fn test_event_log_matches_in_memory_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let mut model = Model::new(300, ModelConfig::default().with_seed(11))
            .unwrap()
            .with_event_log(&path)
            .unwrap();
        model.run_simulation(20, 10, false).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let logged: Vec<TransmissionEvent> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(logged.as_slice(), model.transmission_events());
    }

    #[test]
    fn test_person_lookup() {
        let model = Model::new(50, ModelConfig::default()).unwrap();
        let person = model.person(PersonId(7)).unwrap();
        assert_eq!(person.id, PersonId(7));
        assert!(model.person(PersonId(50)).is_none());
        assert_eq!(model.people().count(), 50);
    }
}
