use std::fmt;

use glam::{Vec2, Vec4};

/// Invoked once per frame for every living particle with the frame delta and
/// the remaining life fraction (`1.0` for immortal particles).
pub type UpdateRule = Box<dyn FnMut(&mut ParticleState, f32, f32)>;

/// The visible part of a particle: where it is and how it is drawn.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ParticleState {
    pub position: Vec2,
    pub color: Vec4,
    /// Point sprite size in pixels.
    pub size: f32,
}

pub struct Particle {
    pub state: ParticleState,
    life: f32,
    max_life: f32,
    rule: Option<UpdateRule>,
}

impl Particle {
    /// A particle that expires after `life` seconds. A `life` of zero makes it
    /// immortal.
    pub fn new(state: ParticleState, life: f32) -> Self {
        Self {
            state,
            life,
            max_life: life,
            rule: None,
        }
    }

    pub fn immortal(state: ParticleState) -> Self {
        Self::new(state, 0.0)
    }

    pub fn with_rule(self, rule: impl FnMut(&mut ParticleState, f32, f32) + 'static) -> Self {
        Self {
            rule: Some(Box::new(rule)),
            ..self
        }
    }

    pub fn life(&self) -> f32 {
        self.life
    }

    pub fn max_life(&self) -> f32 {
        self.max_life
    }

    pub fn is_immortal(&self) -> bool {
        self.max_life == 0.0
    }

    pub fn life_fraction(&self) -> f32 {
        if self.is_immortal() {
            1.0
        } else {
            self.life / self.max_life
        }
    }

    /// Burns `dt` of life and runs the update rule. Returns `false` once the
    /// particle has expired, in which case the rule is not run.
    pub fn advance(&mut self, dt: f32) -> bool {
        if !self.is_immortal() {
            self.life -= dt;
            if self.life <= 0.0 {
                return false;
            }
        }
        let fraction = self.life_fraction();
        if let Some(rule) = self.rule.as_mut() {
            rule(&mut self.state, dt, fraction);
        }
        true
    }
}

impl fmt::Debug for Particle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Particle")
            .field("state", &self.state)
            .field("life", &self.life)
            .field("max_life", &self.max_life)
            .field("has_rule", &self.rule.is_some())
            .finish()
    }
}

/// Handle to a particle inside a [`ParticleSystem`]. Handles of removed
/// particles go stale and never resolve to a particle that reused the slot.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct ParticleId {
    index: u32,
    generation: u32,
}

struct Node {
    particle: Particle,
    next: Option<usize>,
}

#[derive(Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Singly linked, prepend-only particle list threaded through a slot arena.
/// Unlinking while advancing is O(1) and never skips or revisits a node.
#[derive(Default)]
pub struct ParticleSystem {
    slots: Vec<Slot>,
    free_list: Vec<usize>,
    head: Option<usize>,
    len: usize,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn add_first(&mut self, particle: Particle) -> ParticleId {
        let node = Node {
            particle,
            next: self.head,
        };
        let index = match self.free_list.pop() {
            Some(index) => {
                self.slots[index].node = Some(node);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                self.slots.len() - 1
            }
        };
        self.head = Some(index);
        self.len += 1;
        ParticleId {
            index: index as u32,
            generation: self.slots[index].generation,
        }
    }

    /// Advances every particle by `dt`, unlinking the ones that expired.
    /// Returns how many were culled.
    pub fn advance(&mut self, dt: f32) -> usize {
        let mut culled = 0;
        let mut previous = None;
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let (alive, next) = match self.slots[index].node.as_mut() {
                Some(node) => (node.particle.advance(dt), node.next),
                None => break,
            };
            if alive {
                previous = Some(index);
            } else {
                self.unlink(previous, index, next);
                culled += 1;
            }
            cursor = next;
        }
        culled
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref().map(|node| &node.particle)
    }

    pub fn remove(&mut self, id: ParticleId) -> Option<Particle> {
        self.get(id)?;
        let target = id.index as usize;
        let mut previous = None;
        let mut cursor = self.head;
        while let Some(index) = cursor {
            let next = self.slots[index].node.as_ref().and_then(|node| node.next);
            if index == target {
                return self.unlink(previous, index, next);
            }
            previous = Some(index);
            cursor = next;
        }
        None
    }

    pub fn clear(&mut self) {
        while let Some(index) = self.head {
            let next = self.slots[index].node.as_ref().and_then(|node| node.next);
            self.unlink(None, index, next);
        }
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            system: self,
            cursor: self.head,
        }
    }

    fn unlink(&mut self, previous: Option<usize>, index: usize, next: Option<usize>) -> Option<Particle> {
        match previous {
            None => self.head = next,
            Some(previous) => {
                if let Some(node) = self.slots[previous].node.as_mut() {
                    node.next = next;
                }
            }
        }
        let slot = &mut self.slots[index];
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(index);
        self.len -= 1;
        Some(node.particle)
    }
}

pub struct Iter<'a> {
    system: &'a ParticleSystem,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Particle;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let node = self.system.slots[index].node.as_ref()?;
        self.cursor = node.next;
        Some(&node.particle)
    }
}

impl<'a> IntoIterator for &'a ParticleSystem {
    type Item = &'a Particle;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn state(x: f32) -> ParticleState {
        ParticleState {
            position: vec2(x, 0.0),
            color: Vec4::ONE,
            size: 1.0,
        }
    }

    fn xs(system: &ParticleSystem) -> Vec<f32> {
        system.iter().map(|p| p.state.position.x).collect()
    }

    #[test]
    fn insertion_prepends() {
        let mut system = ParticleSystem::new();
        system.add_first(Particle::new(state(1.0), 1.0));
        system.add_first(Particle::new(state(2.0), 1.0));
        system.add_first(Particle::new(state(3.0), 1.0));
        assert_eq!(xs(&system), vec![3.0, 2.0, 1.0]);
        assert_eq!(system.len(), 3);
    }

    #[test]
    fn expired_particles_are_unlinked_without_skipping_neighbours() {
        let visits = Rc::new(RefCell::new(Vec::new()));
        let mut system = ParticleSystem::new();
        for (x, life) in [(1.0, 5.0), (2.0, 0.05), (3.0, 5.0), (4.0, 0.05), (5.0, 5.0)] {
            let visits = visits.clone();
            system.add_first(Particle::new(state(x), life).with_rule(move |s, _, _| {
                visits.borrow_mut().push(s.position.x);
            }));
        }

        let culled = system.advance(0.1);

        assert_eq!(culled, 2);
        assert_eq!(xs(&system), vec![5.0, 3.0, 1.0]);
        // each survivor was updated exactly once, the dead ones never
        assert_eq!(*visits.borrow(), vec![5.0, 3.0, 1.0]);
    }

    #[test]
    fn life_is_monotonic_and_removal_happens_once() {
        let mut system = ParticleSystem::new();
        let id = system.add_first(Particle::new(state(0.0), 0.5));
        let dt = 1.0 / 60.0;
        let mut last_life = 0.5;
        let mut frames_alive = 0;
        while system.get(id).is_some() {
            system.advance(dt);
            if let Some(particle) = system.get(id) {
                assert!(particle.life() <= last_life);
                last_life = particle.life();
                frames_alive += 1;
            }
        }
        assert!(system.is_empty());
        assert!(frames_alive >= 28 && frames_alive <= 30);
        assert_eq!(system.advance(dt), 0);
        assert!(system.get(id).is_none());
    }

    #[test]
    fn immortal_particles_only_leave_by_removal() {
        let mut system = ParticleSystem::new();
        let id = system.add_first(Particle::immortal(state(7.0)).with_rule(|s, _, fraction| {
            assert_eq!(fraction, 1.0);
            s.size += 1.0;
        }));
        for _ in 0..1000 {
            system.advance(0.1);
        }
        assert_eq!(system.get(id).map(|p| p.state.size), Some(1001.0));

        let removed = system.remove(id).unwrap();
        assert_eq!(removed.state.position.x, 7.0);
        assert!(system.is_empty());
        assert!(system.remove(id).is_none());
    }

    #[test]
    fn stale_ids_do_not_resolve_to_reused_slots() {
        let mut system = ParticleSystem::new();
        let old = system.add_first(Particle::new(state(1.0), 0.01));
        system.advance(0.02);
        let new = system.add_first(Particle::new(state(2.0), 1.0));
        assert!(system.get(old).is_none());
        assert_eq!(system.get(new).map(|p| p.state.position.x), Some(2.0));
    }

    #[test]
    fn rule_sees_remaining_life_fraction() {
        let mut system = ParticleSystem::new();
        let id = system.add_first(Particle::new(state(0.0), 1.0).with_rule(|s, _, fraction| {
            s.size = 10.0 * fraction;
        }));
        system.advance(0.25);
        let size = system.get(id).unwrap().state.size;
        assert!((size - 7.5).abs() < 1e-5);
    }

    #[test]
    fn removing_from_the_middle_keeps_the_chain() {
        let mut system = ParticleSystem::new();
        system.add_first(Particle::immortal(state(1.0)));
        let middle = system.add_first(Particle::immortal(state(2.0)));
        system.add_first(Particle::immortal(state(3.0)));
        system.remove(middle);
        assert_eq!(xs(&system), vec![3.0, 1.0]);
        system.clear();
        assert!(system.is_empty());
        assert_eq!(system.iter().count(), 0);
    }
}
