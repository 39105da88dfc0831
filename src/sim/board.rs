//! Board state: level geometry, free blocks and hex slots
//!
//! The hex layout itself is produced elsewhere; the board only needs each
//! slot's center, size and neighbour list. Free blocks use simple circle
//! physics (drag plus bounces), separate from the bubble particle engine.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::constraint::Environment;
use super::geometry::Aabb;
use super::obstruction::{self, Obstruction};
use crate::consts::COLLISION_EPSILON;
use crate::error::PhysicsError;

/// Kind of payload a block carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockKind {
    #[default]
    Standard,
    /// Can be carried but never slotted
    PowerUp,
}

/// A movable block, either loose on the board, sitting in a slot, or carried
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: u32,
    pub kind: BlockKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
}

/// Collision and gameplay flags for a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SlotFlags {
    /// Solid players bounce off this slot
    pub solid_collision: bool,
    /// Bubble players bounce off this slot
    pub bubble_collision: bool,
    /// Touching it while solid forces the player back to bubble form
    pub pops_bubble: bool,
    /// Cannot receive dropped blocks
    pub special: bool,
}

/// A fixed hex cell that can hold one block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub id: usize,
    pub center: Vec2,
    /// Hex circumradius
    pub radius: f32,
    pub bounds: Aabb,
    pub neighbors: Vec<usize>,
    pub owner: Option<usize>,
    pub block: Option<Block>,
    /// Captured slots keep their owner and block for the rest of the round
    pub locked: bool,
    pub flags: SlotFlags,
}

impl Slot {
    /// Pointy-top hex cell centered on `center`
    pub fn new(id: usize, center: Vec2, radius: f32) -> Self {
        let half_extents = Vec2::new(radius * 3.0_f32.sqrt() * 0.5, radius);
        Self {
            id,
            center,
            radius,
            bounds: Aabb::from_center(center, half_extents),
            neighbors: Vec::new(),
            owner: None,
            block: None,
            locked: false,
            flags: SlotFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: SlotFlags) -> Self {
        self.flags = flags;
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.block.is_none()
    }

    /// Can a player drop a block here
    pub fn accepts_drop(&self) -> bool {
        self.is_empty() && !self.flags.special && !self.locked
    }
}

/// The playing field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub play_zone: Aabb,
    pub obstructions: Vec<Obstruction>,
    /// Loose blocks (sorted by id)
    pub blocks: Vec<Block>,
    pub slots: Vec<Slot>,
    /// Wind or tilt applied to every bubble particle each frame
    pub ambient_force: Vec2,
    next_block_id: u32,
}

impl Board {
    pub fn new(play_zone: Aabb) -> Self {
        Self {
            play_zone,
            obstructions: Vec::new(),
            blocks: Vec::new(),
            slots: Vec::new(),
            ambient_force: Vec2::ZERO,
            next_block_id: 1,
        }
    }

    pub fn add_obstruction(&mut self, obstruction: Obstruction) {
        self.obstructions.push(obstruction);
    }

    /// Add a slot and return its index
    pub fn add_slot(&mut self, center: Vec2, radius: f32, flags: SlotFlags) -> usize {
        let id = self.slots.len();
        self.slots.push(Slot::new(id, center, radius).with_flags(flags));
        id
    }

    /// Mark two slots as adjacent
    pub fn connect(&mut self, a: usize, b: usize) -> Result<(), PhysicsError> {
        let count = self.slots.len();
        for index in [a, b] {
            if index >= count {
                return Err(PhysicsError::UnknownSlot(index));
            }
        }
        if a != b {
            if !self.slots[a].neighbors.contains(&b) {
                self.slots[a].neighbors.push(b);
            }
            if !self.slots[b].neighbors.contains(&a) {
                self.slots[b].neighbors.push(a);
            }
        }
        Ok(())
    }

    fn allocate_block(&mut self, kind: BlockKind, pos: Vec2, radius: f32) -> Block {
        let id = self.next_block_id;
        self.next_block_id += 1;
        Block {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            radius,
        }
    }

    /// Put a new loose block on the board
    pub fn spawn_block(&mut self, kind: BlockKind, pos: Vec2, radius: f32) -> u32 {
        let block = self.allocate_block(kind, pos, radius);
        let id = block.id;
        self.blocks.push(block);
        id
    }

    /// Put a new block straight into a slot (level setup)
    pub fn fill_slot(
        &mut self,
        slot: usize,
        owner: Option<usize>,
        radius: f32,
    ) -> Result<u32, PhysicsError> {
        let center = self.slots.get(slot).ok_or(PhysicsError::UnknownSlot(slot))?.center;
        let block = self.allocate_block(BlockKind::Standard, center, radius);
        let id = block.id;
        let target = &mut self.slots[slot];
        target.block = Some(block);
        target.owner = owner;
        Ok(id)
    }

    /// Return a carried block to the board as a loose block
    pub fn release_block(&mut self, mut block: Block, pos: Vec2) {
        block.pos = pos;
        block.vel = Vec2::ZERO;
        self.blocks.push(block);
        self.blocks.sort_by_key(|b| b.id);
    }

    /// Remove a loose block for carrying
    pub fn take_free_block(&mut self, id: u32) -> Option<Block> {
        let index = self.blocks.iter().position(|b| b.id == id)?;
        Some(self.blocks.remove(index))
    }

    /// Remove a slotted block for carrying; locked slots keep theirs
    pub fn take_slotted_block(&mut self, slot: usize) -> Option<Block> {
        let slot = self.slots.get_mut(slot)?;
        if slot.locked {
            return None;
        }
        slot.block.take()
    }

    /// Slot whose bounds contain the point, nearest center first
    pub fn slot_at(&self, point: Vec2) -> Option<usize> {
        self.slots
            .iter()
            .filter(|s| s.bounds.contains(point))
            .min_by(|a, b| {
                a.center
                    .distance_squared(point)
                    .partial_cmp(&b.center.distance_squared(point))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|s| s.id)
    }

    /// Place a block in a slot for `player` and capture any empty neighbours
    /// it encloses. Returns the captured slot indices.
    pub fn place_block(
        &mut self,
        slot: usize,
        mut block: Block,
        player: usize,
    ) -> Result<Vec<usize>, PhysicsError> {
        let target = self.slots.get_mut(slot).ok_or(PhysicsError::UnknownSlot(slot))?;
        block.pos = target.center;
        block.vel = Vec2::ZERO;
        target.block = Some(block);
        target.owner = Some(player);

        let captured: Vec<usize> = self.slots[slot]
            .neighbors
            .iter()
            .copied()
            .filter(|&n| self.is_circumscribed(n, player))
            .collect();
        for &n in &captured {
            let neighbor = &mut self.slots[n];
            neighbor.owner = Some(player);
            neighbor.locked = true;
            log::debug!("Player {} captured slot {}", player, n);
        }
        Ok(captured)
    }

    /// Empty, unowned-by-player slot whose every neighbour `player` owns
    fn is_circumscribed(&self, slot: usize, player: usize) -> bool {
        let candidate = &self.slots[slot];
        candidate.is_empty()
            && !candidate.flags.special
            && candidate.owner != Some(player)
            && !candidate.neighbors.is_empty()
            && candidate
                .neighbors
                .iter()
                .all(|&n| self.slots[n].owner == Some(player))
    }

    /// Physics context for bubbles on this board
    pub fn environment(&self, line_collisions: bool, collision_epsilon: f32) -> Environment<'_> {
        Environment {
            ambient_force: self.ambient_force,
            obstructions: &self.obstructions,
            play_zone: Some(self.play_zone),
            line_collisions,
            collision_epsilon,
        }
    }

    /// Advance loose blocks: drag, obstruction bounces, play zone bounces
    pub fn update_blocks(&mut self, dt: f32, drag: f32, restitution: f32) {
        let damping = (-drag * dt).exp();
        for block in &mut self.blocks {
            block.pos += block.vel * dt;
            block.vel *= damping;

            for obstruction in &self.obstructions {
                let Some(contact) =
                    obstruction::circle_contact(obstruction, block.pos, block.radius)
                else {
                    continue;
                };
                block.pos += contact.normal * (contact.penetration + COLLISION_EPSILON);
                block.vel = bounce(
                    block.vel,
                    contact.normal,
                    restitution,
                    obstruction.friction,
                );
            }

            keep_in_zone(block, &self.play_zone, restitution);

            if !(block.pos.is_finite() && block.vel.is_finite()) {
                log::warn!("Block {} went non-finite, recentering", block.id);
                block.pos = self.play_zone.center();
                block.vel = Vec2::ZERO;
            }
        }
    }
}

/// Reflect the normal component (scaled by restitution) and shave the
/// tangential component by the surface friction
fn bounce(vel: Vec2, normal: Vec2, restitution: f32, friction: f32) -> Vec2 {
    let vn = vel.dot(normal);
    if vn >= 0.0 {
        return vel;
    }
    let tangential = vel - vn * normal;
    tangential * (1.0 - friction) - normal * (vn * restitution)
}

fn keep_in_zone(block: &mut Block, zone: &Aabb, restitution: f32) {
    let min = zone.min + Vec2::splat(block.radius);
    let max = zone.max - Vec2::splat(block.radius);
    if block.pos.x < min.x {
        block.pos.x = min.x;
        block.vel.x = block.vel.x.abs() * restitution;
    } else if block.pos.x > max.x {
        block.pos.x = max.x;
        block.vel.x = -block.vel.x.abs() * restitution;
    }
    if block.pos.y < min.y {
        block.pos.y = min.y;
        block.vel.y = block.vel.y.abs() * restitution;
    } else if block.pos.y > max.y {
        block.pos.y = max.y;
        block.vel.y = -block.vel.y.abs() * restitution;
    }
}
