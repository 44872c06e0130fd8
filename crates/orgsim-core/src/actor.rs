//! Actors: skill and memory queries.

use std::collections::{BTreeMap, BTreeSet};

use crate::rng::Rng64;
use crate::{ActorId, TaskId};

/// A node-bound member of the organization.
///
/// `memory` maps a task to the actors known to solve it. Entries are a list,
/// not a set: duplicates are kept on purpose so that actors taught more
/// often are recalled more often.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: ActorId,
    pub skills: BTreeSet<TaskId>,
    memory: BTreeMap<TaskId, Vec<ActorId>>,
    availability: f64,
}

impl Actor {
    pub fn new(id: ActorId, availability: f64) -> Self {
        Self {
            id,
            skills: BTreeSet::new(),
            memory: BTreeMap::new(),
            availability,
        }
    }

    pub fn has_skill(&self, task: TaskId) -> bool {
        self.skills.contains(&task)
    }

    /// Uniform pick from the actors remembered for `task`; `None` when the
    /// actor knows nobody. Never mutates memory.
    pub fn recall(&self, task: TaskId, rng: &mut Rng64) -> Option<ActorId> {
        let known = self.memory.get(&task)?;
        if known.is_empty() {
            return None;
        }
        Some(known[rng.index(known.len())])
    }

    /// With probability `retention`, remember that `solver` can handle
    /// `task`. The sole memory-mutation path; entries are never removed.
    pub fn learn(&mut self, task: TaskId, solver: ActorId, retention: f64, rng: &mut Rng64) {
        if rng.chance(retention) {
            self.memory.entry(task).or_default().push(solver);
        }
    }

    /// Independent Bernoulli draw per contact attempt.
    pub fn is_available(&self, rng: &mut Rng64) -> bool {
        rng.chance(self.availability)
    }

    /// Remembered solvers for `task`, duplicates included.
    pub fn known_solvers(&self, task: TaskId) -> &[ActorId] {
        self.memory.get(&task).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recall_is_none_without_memory() {
        let actor = Actor::new(0, 0.5);
        let mut rng = Rng64::new(1);
        assert_eq!(actor.recall(3, &mut rng), None);
    }

    #[test]
    fn learned_solver_is_recallable() {
        let mut actor = Actor::new(0, 0.5);
        let mut rng = Rng64::new(1);
        actor.learn(3, 7, 1.0, &mut rng);
        assert_eq!(actor.recall(3, &mut rng), Some(7));
    }

    #[test]
    fn zero_retention_never_learns() {
        let mut actor = Actor::new(0, 0.5);
        let mut rng = Rng64::new(1);
        for _ in 0..50 {
            actor.learn(3, 7, 0.0, &mut rng);
        }
        assert!(actor.known_solvers(3).is_empty());
    }

    #[test]
    fn duplicate_entries_accumulate() {
        let mut actor = Actor::new(0, 0.5);
        let mut rng = Rng64::new(1);
        for _ in 0..4 {
            actor.learn(3, 7, 1.0, &mut rng);
        }
        assert_eq!(actor.known_solvers(3), &[7, 7, 7, 7]);
    }

    #[test]
    fn memory_is_monotone() {
        let mut actor = Actor::new(0, 0.5);
        let mut rng = Rng64::new(2);
        actor.learn(1, 4, 1.0, &mut rng);
        for solver in 0..20 {
            actor.learn(1, solver, 0.5, &mut rng);
            assert!(actor.known_solvers(1).contains(&4));
        }
    }

    #[test]
    fn availability_extremes() {
        let mut rng = Rng64::new(3);
        let always = Actor::new(0, 1.0);
        let never = Actor::new(1, 0.0);
        for _ in 0..50 {
            assert!(always.is_available(&mut rng));
            assert!(!never.is_available(&mut rng));
        }
    }
}
