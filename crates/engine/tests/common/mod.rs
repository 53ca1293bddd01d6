//! Shared fixtures for engine integration tests.
//!
//! Every test gets its own [`InMemoryStore`] seeded with a handful of
//! competencies and positions.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use competency_core::actor::ActingUser;
use competency_core::assignment::PositionSetAssignment;
use competency_core::competency_set::{
    CompetencySetWithItems, CreateCompetencySet, SetItemInput, Visibility,
};
use competency_core::reference::{Competency, Position};
use competency_core::store::CompetencyStore;
use competency_core::types::{DbId, Level};
use competency_engine::{CompetencyEngine, EngineConfig, InMemoryStore};

pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub engine: CompetencyEngine,
    pub user: ActingUser,
    pub communication: Competency,
    pub delegation: Competency,
    pub planning: Competency,
    pub coaching: Competency,
    pub manager: Position,
    pub analyst: Position,
}

/// Seeded fixture with the default engine configuration.
pub async fn fixture() -> Fixture {
    fixture_with_config(EngineConfig::default()).await
}

/// Seeded fixture with a short store timeout.
pub async fn fixture_with_timeout(timeout: Duration) -> Fixture {
    fixture_with_config(EngineConfig {
        store_timeout: timeout,
        ..EngineConfig::default()
    })
    .await
}

pub async fn fixture_with_config(config: EngineConfig) -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let communication = store.add_competency("Communication", Some("Leadership")).await;
    let delegation = store.add_competency("Delegation", Some("Leadership")).await;
    let planning = store.add_competency("Planning", Some("Execution")).await;
    let coaching = store.add_competency("Coaching", Some("Leadership")).await;
    let manager = store.add_position("Engineering Manager", Some("Engineering")).await;
    let analyst = store.add_position("Data Analyst", Some("Finance")).await;

    let engine = CompetencyEngine::new(store.clone(), config);
    Fixture {
        store,
        engine,
        user: ActingUser::new(1).expect("user id is positive"),
        communication,
        delegation,
        planning,
        coaching,
        manager,
        analyst,
    }
}

pub fn item(competency_id: DbId, required_level: Level, is_mandatory: bool) -> SetItemInput {
    SetItemInput {
        competency_id,
        required_level,
        is_mandatory,
    }
}

impl Fixture {
    /// Create a public set owned by the fixture user.
    pub async fn create_set(&self, name: &str, items: Vec<SetItemInput>) -> CompetencySetWithItems {
        self.engine
            .catalog()
            .create(
                &CreateCompetencySet {
                    name: name.to_string(),
                    description: None,
                    visibility: Some(Visibility::Public),
                    items,
                },
                self.user,
            )
            .await
            .expect("set creation should succeed")
    }

    /// "Core Leadership": Communication L3 mandatory, Delegation L2 optional.
    pub async fn core_leadership(&self) -> CompetencySetWithItems {
        self.create_set(
            "Core Leadership",
            vec![
                item(self.communication.id, 3, true),
                item(self.delegation.id, 2, false),
            ],
        )
        .await
    }

    /// The stored assignment row linking `set_id` and `position_id`, if any.
    pub async fn assignment_for(
        &self,
        set_id: DbId,
        position_id: DbId,
    ) -> Option<PositionSetAssignment> {
        self.store
            .find_assignment_for(set_id, position_id)
            .await
            .expect("store read should succeed")
    }
}
