//! World Registry
//!
//! Owns every live entity, grouped by category. Iteration order is
//! category order, then insertion order, which keeps the tick loop
//! deterministic. The registry stores entities; it never changes their
//! state on its own.

use crate::core::hash::StateHasher;
use crate::core::rect::Rect;
use crate::core::vec2::Vec2;
use crate::game::entity::{Category, Entity, EntityId, PlayerId};
use crate::game::explosion::Occupancy;

/// Position of an entity inside the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Slot {
    /// Category
    pub category: Category,
    /// Index within the category
    pub index: usize,
}

impl Slot {
    /// Create a slot.
    pub const fn new(category: Category, index: usize) -> Self {
        Self { category, index }
    }
}

/// Entity registry for one arena.
#[derive(Clone, Debug)]
pub struct World {
    categories: [Vec<Entity>; Category::COUNT],
    next_id: u32,
    bounds: Rect,
}

impl World {
    /// Empty world covering `bounds`.
    pub fn new(bounds: Rect) -> Self {
        Self {
            categories: Default::default(),
            next_id: 1,
            bounds,
        }
    }

    /// Arena extent.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    // ===== SPAWN / REMOVE =====

    /// Append an entity to its category and assign its id.
    pub fn spawn(&mut self, mut entity: Entity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        entity.id = id;
        self.categories[entity.category().index()].push(entity);
        id
    }

    /// Remove the entity at `slot`, keeping the order of the rest.
    pub fn remove(&mut self, slot: Slot) -> Entity {
        self.categories[slot.category.index()].remove(slot.index)
    }

    /// Drop every entity. Ids keep counting up.
    pub fn clear(&mut self) {
        for category in &mut self.categories {
            category.clear();
        }
    }

    // ===== ITERATION =====

    /// Every live entity in category then insertion order.
    pub fn all(&self) -> impl Iterator<Item = &Entity> {
        self.categories.iter().flat_map(|c| c.iter())
    }

    /// Entities of one category.
    pub fn category(&self, category: Category) -> &[Entity] {
        &self.categories[category.index()]
    }

    /// Number of entities in a category.
    pub fn category_len(&self, category: Category) -> usize {
        self.categories[category.index()].len()
    }

    /// Total entity count.
    pub fn len(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// True if the world holds no entities.
    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(Vec::is_empty)
    }

    /// Bomber category, including dead bombers still animating.
    pub fn live_bombers(&self) -> impl Iterator<Item = &Entity> {
        self.categories[Category::Bomber.index()].iter()
    }

    /// Every slot currently occupied, in iteration order.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        Category::ALL.into_iter().flat_map(move |category| {
            (0..self.category_len(category)).map(move |index| Slot::new(category, index))
        })
    }

    /// Stable-sort bombers top to bottom for drawing.
    pub fn sort_bombers(&mut self) {
        self.categories[Category::Bomber.index()]
            .sort_by(|a, b| a.position.y.total_cmp(&b.position.y));
    }

    // ===== LOOKUP =====

    /// Entity at a slot.
    pub fn at(&self, slot: Slot) -> &Entity {
        &self.categories[slot.category.index()][slot.index]
    }

    /// Mutable entity at a slot.
    pub fn at_mut(&mut self, slot: Slot) -> &mut Entity {
        &mut self.categories[slot.category.index()][slot.index]
    }

    /// Two distinct entities mutably at once.
    ///
    /// Panics if both slots are the same.
    pub fn pair_mut(&mut self, a: Slot, b: Slot) -> (&mut Entity, &mut Entity) {
        assert_ne!(a, b, "pair_mut on a single slot");

        if a.category == b.category {
            let list = &mut self.categories[a.category.index()];
            if a.index < b.index {
                let (left, right) = list.split_at_mut(b.index);
                (&mut left[a.index], &mut right[0])
            } else {
                let (left, right) = list.split_at_mut(a.index);
                (&mut right[0], &mut left[b.index])
            }
        } else {
            let (lo, hi) = if a.category < b.category { (a, b) } else { (b, a) };
            let (left, right) = self.categories.split_at_mut(hi.category.index());
            let lo_ref = &mut left[lo.category.index()][lo.index];
            let hi_ref = &mut right[0][hi.index];
            if a.category < b.category {
                (lo_ref, hi_ref)
            } else {
                (hi_ref, lo_ref)
            }
        }
    }

    /// Find an entity's slot.
    pub fn slot_of(&self, id: EntityId) -> Option<Slot> {
        self.slots().find(|slot| self.at(*slot).id == id)
    }

    /// Entity by id.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.all().find(|e| e.id == id)
    }

    /// Mutable entity by id.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.categories.iter_mut().flat_map(|c| c.iter_mut()).find(|e| e.id == id)
    }

    /// Is this entity still in the registry?
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// A player's bomber.
    pub fn bomber(&self, player: PlayerId) -> Option<&Entity> {
        self.live_bombers()
            .find(|e| e.as_bomber().is_some_and(|b| b.player == player))
    }

    /// A player's bomber, mutably.
    pub fn bomber_mut(&mut self, player: PlayerId) -> Option<&mut Entity> {
        self.categories[Category::Bomber.index()]
            .iter_mut()
            .find(|e| e.as_bomber().is_some_and(|b| b.player == player))
    }

    // ===== SPATIAL QUERIES =====

    /// What occupies the tile cell containing `point`.
    ///
    /// Probes tile colliders only. A solid occupant hides a breakable one.
    pub fn tile_occupancy(&self, point: Vec2) -> Occupancy {
        self.category(Category::Tile)
            .iter()
            .filter(|e| e.collider().contains(point))
            .map(|e| if e.is_breakable() { Occupancy::Breakable } else { Occupancy::Solid })
            .fold(Occupancy::Empty, Occupancy::merge)
    }

    /// True if any tile collider contains `point`.
    pub fn tile_contains(&self, point: Vec2) -> bool {
        self.category(Category::Tile)
            .iter()
            .any(|e| e.collider().contains(point))
    }

    /// Hash every entity in iteration order.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.len() as u32);
        hasher.update_u32(self.next_id);
        for entity in self.all() {
            entity.hash_into(hasher);
        }
    }
}
