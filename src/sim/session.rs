//! Fixed timestep round update and collision orchestration
//!
//! Each tick: apply input, step every bubble, resolve entity collisions by
//! moving particles directly, step loose blocks, then finish form changes
//! (which is where grabbing and dropping happen).

use glam::Vec2;

use super::board::{Block, BlockKind, Board};
use super::bubble::Bubble;
use super::particle::ParticleId;
use super::player::{Form, FormListener, Player};
use crate::consts::*;
use crate::error::PhysicsError;
use crate::tuning::Tuning;

/// One player's commands for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerInput {
    /// Stick direction, clamped to unit length
    pub movement: Vec2,
    /// Requested form change
    pub form: Option<Form>,
    /// Hold position next to an owned slotted block
    pub defend: bool,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameInput {
    pub players: [PlayerInput; PLAYER_COUNT],
}

/// A round in progress
pub struct Session {
    pub board: Board,
    pub players: Vec<Player>,
    pub tuning: Tuning,
    listeners: Vec<Box<dyn FormListener>>,
    accumulator: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
}

impl Session {
    /// Start a round with one player per spawn point
    pub fn new(
        board: Board,
        spawns: [Vec2; PLAYER_COUNT],
        tuning: Tuning,
    ) -> Result<Self, PhysicsError> {
        tuning.validate()?;
        let players = spawns
            .iter()
            .enumerate()
            .map(|(id, &spawn)| Player::new(id, spawn, &tuning))
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "Session started: {} players, {} slots, {} blocks, {} obstructions",
            players.len(),
            board.slots.len(),
            board.blocks.len(),
            board.obstructions.len()
        );
        Ok(Self {
            board,
            players,
            tuning,
            listeners: Vec::new(),
            accumulator: 0.0,
            time_ticks: 0,
        })
    }

    pub fn add_listener(&mut self, listener: Box<dyn FormListener>) {
        self.listeners.push(listener);
    }

    /// Run as many fixed ticks as `frame_dt` covers. Returns the substep count.
    pub fn advance(&mut self, frame_dt: f32, input: &FrameInput) -> Result<u32, PhysicsError> {
        let frame_dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            log::warn!("Ignoring non-finite frame time {}", frame_dt);
            0.0
        };
        self.accumulator += frame_dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            // Form requests are one-shot: only the first substep sees them
            let mut step_input = *input;
            if substeps > 0 {
                for player_input in &mut step_input.players {
                    player_input.form = None;
                }
            }
            self.tick(&step_input, SIM_DT)?;
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            // Drop the backlog instead of spiralling
            self.accumulator = 0.0;
        }
        Ok(substeps)
    }

    /// Advance the round by one step
    pub fn tick(&mut self, input: &FrameInput, dt: f32) -> Result<(), PhysicsError> {
        self.time_ticks += 1;

        self.handle_form_requests(input);

        let env = self
            .board
            .environment(self.tuning.line_collisions, self.tuning.collision_epsilon);
        for (player, player_input) in self.players.iter_mut().zip(&input.players) {
            let movement = player_input.movement.clamp_length_max(1.0);
            if movement.is_finite() && movement != Vec2::ZERO {
                player.bubble.add_static_force(movement * self.tuning.input_force);
            }
            player.bubble.process_physics(dt, &env);
        }

        let popped = resolve_slot_collisions(&mut self.players, &self.board);
        resolve_block_collisions(&mut self.players, &mut self.board, &self.tuning);
        resolve_bubble_collisions(&mut self.players);
        resolve_defending(&mut self.players, &self.board, input);

        self.board
            .update_blocks(dt, self.tuning.block_drag, self.tuning.block_restitution);

        for index in popped {
            log::debug!("Player {} popped by slot", index);
            self.players[index].stats.pops += 1;
            self.players[index].set_form(Form::Bubble, &self.tuning)?;
            self.form_changed(index, Form::Solid, Form::Bubble);
        }

        for index in 0..self.players.len() {
            let from = self.players[index].transition().map(|t| t.from);
            if let Some(to) = self.players[index].update_transition(dt, &self.tuning)? {
                self.form_changed(index, from.unwrap_or(to), to);
            }
        }

        for player in &mut self.players {
            player.check_finite();
            player.carry_payload();
        }
        Ok(())
    }

    /// Start requested transitions unless a listener vetoes them
    fn handle_form_requests(&mut self, input: &FrameInput) {
        for (player, player_input) in self.players.iter_mut().zip(&input.players) {
            let Some(target) = player_input.form else {
                continue;
            };
            if target == player.form() || player.transition().is_some() {
                continue;
            }
            let allowed = self
                .listeners
                .iter_mut()
                .all(|listener| listener.form_changing(player, target));
            if !allowed {
                log::debug!("Player {} form change to {:?} vetoed", player.id, target);
                continue;
            }
            player.begin_transition(target, self.tuning.transition_seconds);
        }
    }

    /// Grab on bubble -> solid, drop on solid -> bubble, then notify listeners
    fn form_changed(&mut self, index: usize, from: Form, to: Form) {
        match (from, to) {
            (Form::Bubble, Form::Solid) => grab_payload(&mut self.players[index], &mut self.board),
            (Form::Solid, Form::Bubble) => drop_payload(&mut self.players[index], &mut self.board),
            _ => {}
        }
        let player = &self.players[index];
        for listener in &mut self.listeners {
            listener.form_changed(player);
        }
    }
}

/// Outer-ring particles of `bubble` inside `radius` of `center`
fn particles_within(bubble: &Bubble, center: Vec2, radius: f32) -> Vec<ParticleId> {
    let radius_sq = radius * radius;
    bubble
        .outer_circle()
        .iter()
        .copied()
        .filter(|&id| {
            bubble
                .particle(id)
                .is_some_and(|p| p.position.distance_squared(center) < radius_sq)
        })
        .collect()
}

fn direction_or_x(offset: Vec2) -> Vec2 {
    let dir = offset.normalize_or_zero();
    if dir == Vec2::ZERO { Vec2::X } else { dir }
}

/// Slots with collision enabled for the player's form act as walls for the
/// outer ring. Returns players that touched a popping slot while solid.
pub fn resolve_slot_collisions(players: &mut [Player], board: &Board) -> Vec<usize> {
    let mut popped = Vec::new();
    for (index, player) in players.iter_mut().enumerate() {
        let solid = player.is_solid();
        let center = player.center();
        let reach = player.bubble.max_bounding_radius();
        let mut pops = false;

        for slot in &board.slots {
            let enabled = if solid {
                slot.flags.solid_collision
            } else {
                slot.flags.bubble_collision
            };
            if !enabled || !slot.bounds.intersects_circle(center, reach) {
                continue;
            }
            let hits: Vec<ParticleId> = player
                .bubble
                .outer_circle()
                .iter()
                .copied()
                .filter(|&id| {
                    player
                        .bubble
                        .particle(id)
                        .is_some_and(|p| slot.bounds.contains(p.position))
                })
                .collect();
            if hits.is_empty() {
                continue;
            }
            player.bubble.freeze(&hits);
            pops |= solid && slot.flags.pops_bubble;
        }

        if pops {
            popped.push(index);
        }
    }
    popped
}

/// Solid players shove blocks out of their way; a bubble pulls a block only
/// when it is the sole player touching it.
pub fn resolve_block_collisions(players: &mut [Player], board: &mut Board, tuning: &Tuning) {
    for block in &mut board.blocks {
        let overlapping: Vec<usize> = players
            .iter()
            .enumerate()
            .filter(|(_, p)| {
                p.center().distance(block.pos) < p.bubble.outer_radius() + block.radius
            })
            .map(|(index, _)| index)
            .collect();

        for &index in &overlapping {
            let player = &players[index];
            if !player.is_solid() {
                continue;
            }
            let center = player.center();
            let dir = direction_or_x(block.pos - center);
            block.pos = center + dir * player.bubble.max_bounding_radius();
            block.vel += dir * tuning.solid_to_block_repulsion;
            log::debug!("Player {} shoved block {}", index, block.id);
        }

        if let &[index] = overlapping.as_slice() {
            let player = &players[index];
            if !player.is_solid() {
                block.vel = (block.pos - player.center()) * tuning.bubble_to_block_repulsion;
            }
        }
    }
}

/// Solid players can't overlap: outer particles that enter the other
/// bubble's radius lose this step's motion.
pub fn resolve_bubble_collisions(players: &mut [Player]) {
    for i in 0..players.len() {
        for j in (i + 1)..players.len() {
            if !(players[i].is_solid() && players[j].is_solid()) {
                continue;
            }
            let (a, b) = (&players[i].bubble, &players[j].bubble);
            let reach = a.max_bounding_radius() + b.max_bounding_radius();
            if a.center_position().distance_squared(b.center_position()) > reach * reach {
                continue;
            }
            let a_hits = particles_within(a, b.center_position(), b.outer_radius());
            let b_hits = particles_within(b, a.center_position(), a.outer_radius());
            players[i].bubble.freeze(&a_hits);
            players[j].bubble.freeze(&b_hits);
        }
    }
}

/// A defending player holds its inner ring still and stops anyone else's
/// outer ring from entering its bounding radius.
pub fn resolve_defending(players: &mut [Player], board: &Board, input: &FrameInput) {
    for (player, player_input) in players.iter_mut().zip(&input.players) {
        let center = player.center();
        let reach = player.bubble.max_bounding_radius();
        player.defending = player_input.defend
            && board.slots.iter().any(|slot| {
                slot.owner == Some(player.id)
                    && slot.block.is_some()
                    && !slot.locked
                    && slot.center.distance(center) < reach + slot.radius
            });
    }

    for d in 0..players.len() {
        if !players[d].defending {
            continue;
        }
        let inner = players[d].bubble.inner_circle().to_vec();
        players[d].bubble.freeze(&inner);

        let center = players[d].center();
        let reach = players[d].bubble.max_bounding_radius();
        for (other, player) in players.iter_mut().enumerate() {
            if other == d {
                continue;
            }
            let hits = particles_within(&player.bubble, center, reach);
            player.bubble.freeze(&hits);
        }
    }
}

/// Pick up the nearest loose block in reach, else the unlocked block in the
/// slot under the bubble.
pub fn grab_payload(player: &mut Player, board: &mut Board) {
    if player.payload.is_some() {
        return;
    }
    let center = player.center();
    let reach = player.bubble.max_bounding_radius();

    let nearest = board
        .blocks
        .iter()
        .filter(|b| b.pos.distance(center) < reach + b.radius)
        .min_by(|a, b| {
            a.pos
                .distance_squared(center)
                .partial_cmp(&b.pos.distance_squared(center))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|b| b.id);

    let grabbed = match nearest {
        Some(id) => board.take_free_block(id),
        None => board.slot_at(center).and_then(|slot| board.take_slotted_block(slot)),
    };
    if let Some(block) = grabbed {
        log::debug!("Player {} grabbed block {}", player.id, block.id);
        player.stats.grabs += 1;
        player.payload = Some(block);
    }
}

/// Drop the payload into the slot under the bubble's center. Without a valid
/// slot the drop misses and the block falls loose where the player is.
pub fn drop_payload(player: &mut Player, board: &mut Board) {
    let Some(block) = player.payload.take() else {
        return;
    };
    let center = player.center();
    let target = board
        .slot_at(center)
        .filter(|&slot| board.slots[slot].accepts_drop() && block.kind == BlockKind::Standard);

    match target {
        Some(slot) => match board.place_block(slot, block, player.id) {
            Ok(captured) => {
                player.stats.drops += 1;
                player.stats.captures += captured.len() as u32;
                log::debug!(
                    "Player {} dropped into slot {} (captured {})",
                    player.id,
                    slot,
                    captured.len()
                );
            }
            Err(e) => log::warn!("Drop into slot {} failed: {}", slot, e),
        },
        None => misdrop(player, board, block, center),
    }
}

fn misdrop(player: &mut Player, board: &mut Board, block: Block, at: Vec2) {
    log::debug!("Player {} misdropped block {}", player.id, block.id);
    player.stats.misdrops += 1;
    board.release_block(block, at);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::board::SlotFlags;
    use crate::sim::geometry::Aabb;
    use std::cell::RefCell;
    use std::rc::Rc;

    const FAR: [Vec2; PLAYER_COUNT] = [
        Vec2::new(100.0, 100.0),
        Vec2::new(900.0, 100.0),
        Vec2::new(100.0, 900.0),
        Vec2::new(900.0, 900.0),
    ];

    fn session_with(spawns: [Vec2; PLAYER_COUNT]) -> Session {
        let board = Board::new(Aabb::new(Vec2::ZERO, Vec2::splat(1000.0)));
        Session::new(board, spawns, Tuning::default()).unwrap()
    }

    #[test]
    fn test_block_between_two_bubbles_is_left_alone() {
        let mut spawns = FAR;
        spawns[0] = Vec2::new(480.0, 500.0);
        spawns[1] = Vec2::new(520.0, 500.0);
        let mut session = session_with(spawns);
        session.board.spawn_block(BlockKind::Standard, Vec2::new(500.0, 500.0), BLOCK_RADIUS);
        session.board.blocks[0].vel = Vec2::new(3.0, -2.0);

        resolve_block_collisions(&mut session.players, &mut session.board, &session.tuning);
        assert_eq!(session.board.blocks[0].vel, Vec2::new(3.0, -2.0));
    }

    #[test]
    fn test_single_bubble_pulls_block_in() {
        let mut spawns = FAR;
        spawns[0] = Vec2::new(480.0, 500.0);
        let mut session = session_with(spawns);
        session.board.spawn_block(BlockKind::Standard, Vec2::new(500.0, 500.0), BLOCK_RADIUS);

        resolve_block_collisions(&mut session.players, &mut session.board, &session.tuning);
        let vel = session.board.blocks[0].vel;
        // Negative coefficient: velocity points back at the bubble
        assert!(vel.x < 0.0);
        assert!((vel.x - 20.0 * BUBBLE_TO_BLOCK_REPULSION_VELOCITY_COEFF).abs() < 1e-3);
    }

    #[test]
    fn test_solid_player_shoves_block() {
        let mut spawns = FAR;
        spawns[0] = Vec2::new(480.0, 500.0);
        let mut session = session_with(spawns);
        session.players[0].set_form(Form::Solid, &session.tuning).unwrap();
        session.board.spawn_block(BlockKind::Standard, Vec2::new(500.0, 500.0), BLOCK_RADIUS);

        resolve_block_collisions(&mut session.players, &mut session.board, &session.tuning);
        let block = &session.board.blocks[0];
        assert!((block.pos.x - (480.0 + 30.0)).abs() < 1e-3);
        assert!((block.vel.x - SOLID_TO_BLOCK_REPULSION_VELOCITY_COEFF).abs() < 1e-3);
    }

    #[test]
    fn test_solid_bubbles_freeze_intruding_particles() {
        let mut spawns = FAR;
        spawns[0] = Vec2::new(500.0, 500.0);
        spawns[1] = Vec2::new(530.0, 500.0);
        let mut session = session_with(spawns);
        for player in &mut session.players[..2] {
            player.set_form(Form::Solid, &Tuning::default()).unwrap();
        }
        // Pretend every particle just moved 1 unit right
        for player in &mut session.players[..2] {
            let ids: Vec<ParticleId> = player.bubble.outer_circle().to_vec();
            for id in ids {
                let p = player.bubble.particle_mut(id).unwrap();
                p.last_position = p.position - Vec2::X;
            }
        }
        resolve_bubble_collisions(&mut session.players);

        // Player 0's rightmost outer particle (20, 0) sits inside player 1's radius
        let a = &session.players[0].bubble;
        let rightmost = a.outer_circle()[0];
        assert_eq!(a.particle(rightmost).unwrap().velocity(), Vec2::ZERO);
        // Its leftmost one is far away and keeps moving
        let leftmost = a.outer_circle()[4];
        assert_eq!(a.particle(leftmost).unwrap().velocity(), Vec2::X);
    }

    #[test]
    fn test_bubble_form_players_pass_through_each_other() {
        let mut spawns = FAR;
        spawns[0] = Vec2::new(500.0, 500.0);
        spawns[1] = Vec2::new(530.0, 500.0);
        let mut session = session_with(spawns);
        let id = session.players[0].bubble.outer_circle()[0];
        session.players[0].bubble.particle_mut(id).unwrap().last_position -= Vec2::X;
        resolve_bubble_collisions(&mut session.players);
        assert_eq!(session.players[0].bubble.particle(id).unwrap().velocity(), Vec2::X);
    }

    #[test]
    fn test_slot_wall_and_pop() {
        let mut spawns = FAR;
        spawns[0] = Vec2::new(500.0, 500.0);
        let mut session = session_with(spawns);
        let flags = SlotFlags {
            solid_collision: true,
            pops_bubble: true,
            ..Default::default()
        };
        // Slot overlapping the right side of the bubble
        session.board.add_slot(Vec2::new(530.0, 500.0), 20.0, flags);

        // Bubble form: collision disabled for bubbles, nothing happens
        assert!(resolve_slot_collisions(&mut session.players, &session.board).is_empty());

        session.players[0].set_form(Form::Solid, &session.tuning).unwrap();
        let id = session.players[0].bubble.outer_circle()[0];
        session.players[0].bubble.particle_mut(id).unwrap().last_position -= Vec2::X;
        let popped = resolve_slot_collisions(&mut session.players, &session.board);
        assert_eq!(popped, vec![0]);
        assert_eq!(session.players[0].bubble.particle(id).unwrap().velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_pop_forces_bubble_form_during_tick() {
        let mut spawns = FAR;
        spawns[0] = Vec2::new(500.0, 500.0);
        let mut session = session_with(spawns);
        let flags = SlotFlags {
            solid_collision: true,
            pops_bubble: true,
            ..Default::default()
        };
        session.board.add_slot(Vec2::new(530.0, 500.0), 20.0, flags);
        session.players[0].set_form(Form::Solid, &session.tuning).unwrap();

        session.tick(&FrameInput::default(), SIM_DT).unwrap();
        assert_eq!(session.players[0].form(), Form::Bubble);
        assert_eq!(session.players[0].stats.pops, 1);
    }

    #[test]
    fn test_grab_then_drop_into_slot() {
        let mut spawns = FAR;
        spawns[0] = Vec2::new(500.0, 500.0);
        let mut session = session_with(spawns);
        let slot = session.board.add_slot(Vec2::new(500.0, 500.0), 25.0, SlotFlags::default());
        session.board.spawn_block(BlockKind::Standard, Vec2::new(510.0, 500.0), BLOCK_RADIUS);

        let request = |form| {
            let mut input = FrameInput::default();
            input.players[0].form = Some(form);
            input
        };

        session.tick(&request(Form::Solid), SIM_DT).unwrap();
        assert_eq!(session.players[0].form(), Form::InTransition);
        for _ in 0..30 {
            session.tick(&FrameInput::default(), SIM_DT).unwrap();
        }
        assert!(session.players[0].is_solid());
        assert_eq!(session.players[0].stats.grabs, 1);
        assert!(session.board.blocks.is_empty());

        session.tick(&request(Form::Bubble), SIM_DT).unwrap();
        for _ in 0..30 {
            session.tick(&FrameInput::default(), SIM_DT).unwrap();
        }
        assert_eq!(session.players[0].form(), Form::Bubble);
        assert_eq!(session.players[0].stats.drops, 1);
        assert_eq!(session.board.slots[slot].owner, Some(0));
        assert!(session.players[0].payload.is_none());
    }

    #[test]
    fn test_drop_without_slot_is_a_misdrop() {
        let mut spawns = FAR;
        spawns[0] = Vec2::new(500.0, 500.0);
        let mut session = session_with(spawns);
        session.players[0].set_form(Form::Solid, &session.tuning).unwrap();
        session.players[0].payload = Some(Block {
            id: 42,
            kind: BlockKind::Standard,
            pos: Vec2::new(500.0, 500.0),
            vel: Vec2::ZERO,
            radius: BLOCK_RADIUS,
        });

        drop_payload(&mut session.players[0], &mut session.board);
        assert_eq!(session.players[0].stats.misdrops, 1);
        assert_eq!(session.board.blocks.len(), 1);
        assert_eq!(session.board.blocks[0].id, 42);
    }

    #[test]
    fn test_power_up_cannot_be_slotted() {
        let mut spawns = FAR;
        spawns[0] = Vec2::new(500.0, 500.0);
        let mut session = session_with(spawns);
        let slot = session.board.add_slot(Vec2::new(500.0, 500.0), 25.0, SlotFlags::default());
        session.players[0].payload = Some(Block {
            id: 7,
            kind: BlockKind::PowerUp,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: BLOCK_RADIUS,
        });
        drop_payload(&mut session.players[0], &mut session.board);
        assert!(session.board.slots[slot].is_empty());
        assert_eq!(session.players[0].stats.misdrops, 1);
    }

    struct Recorder {
        veto_solid: bool,
        changed: Rc<RefCell<Vec<(usize, Form)>>>,
    }

    impl FormListener for Recorder {
        fn form_changing(&mut self, _player: &Player, new_form: Form) -> bool {
            !(self.veto_solid && new_form == Form::Solid)
        }

        fn form_changed(&mut self, player: &Player) {
            self.changed.borrow_mut().push((player.id, player.form()));
        }
    }

    #[test]
    fn test_listener_can_veto_and_observe() {
        let mut session = session_with(FAR);
        let changed = Rc::new(RefCell::new(Vec::new()));
        session.add_listener(Box::new(Recorder {
            veto_solid: true,
            changed: Rc::clone(&changed),
        }));

        let mut input = FrameInput::default();
        input.players[2].form = Some(Form::Solid);
        session.tick(&input, SIM_DT).unwrap();
        assert_eq!(session.players[2].form(), Form::Bubble);

        session.listeners.clear();
        session.add_listener(Box::new(Recorder {
            veto_solid: false,
            changed: Rc::clone(&changed),
        }));
        session.tick(&input, SIM_DT).unwrap();
        for _ in 0..30 {
            session.tick(&FrameInput::default(), SIM_DT).unwrap();
        }
        assert_eq!(changed.borrow().as_slice(), &[(2, Form::Solid)]);
    }

    #[test]
    fn test_defender_freezes_inner_ring_and_intruders() {
        let mut spawns = FAR;
        spawns[0] = Vec2::new(500.0, 500.0);
        spawns[1] = Vec2::new(540.0, 500.0);
        let mut session = session_with(spawns);
        let slot = session.board.add_slot(Vec2::new(500.0, 530.0), 20.0, SlotFlags::default());
        session.board.fill_slot(slot, Some(0), BLOCK_RADIUS).unwrap();

        for player in &mut session.players[..2] {
            let count = player.bubble.particles().len();
            let ids: Vec<ParticleId> = (0..count).map(ParticleId).collect();
            for id in ids {
                let p = player.bubble.particle_mut(id).unwrap();
                p.last_position = p.position + Vec2::Y;
            }
        }

        let mut input = FrameInput::default();
        input.players[0].defend = true;
        resolve_defending(&mut session.players, &session.board, &input);

        assert!(session.players[0].defending);
        assert!(!session.players[1].defending);
        let defender = &session.players[0].bubble;
        for &id in defender.inner_circle() {
            assert_eq!(defender.particle(id).unwrap().velocity(), Vec2::ZERO);
        }
        // Intruder's leftmost outer particle (520, 500) is within 30 of the defender
        let intruder = &session.players[1].bubble;
        let leftmost = intruder.outer_circle()[4];
        assert_eq!(intruder.particle(leftmost).unwrap().velocity(), Vec2::ZERO);
        let rightmost = intruder.outer_circle()[0];
        assert_eq!(intruder.particle(rightmost).unwrap().velocity(), -Vec2::Y);
    }

    #[test]
    fn test_advance_runs_fixed_substeps() {
        let mut session = session_with(FAR);
        let input = FrameInput::default();
        assert_eq!(session.advance(SIM_DT * 2.5, &input).unwrap(), 2);
        assert_eq!(session.advance(SIM_DT * 0.6, &input).unwrap(), 1);
        // Huge frame is clamped and capped
        assert_eq!(session.advance(10.0, &input).unwrap(), MAX_SUBSTEPS);
        assert_eq!(session.time_ticks, 3 + MAX_SUBSTEPS as u64);
    }

    #[test]
    fn test_advance_recovers_from_non_finite_frame_time() {
        let mut session = session_with(FAR);
        let input = FrameInput::default();
        assert_eq!(session.advance(f32::NAN, &input).unwrap(), 0);
        assert_eq!(session.advance(f32::INFINITY, &input).unwrap(), 0);
        assert_eq!(session.advance(SIM_DT * 2.5, &input).unwrap(), 2);
        assert_eq!(session.advance(1.0 / 60.0, &input).unwrap(), 2);
        assert_eq!(session.time_ticks, 4);
    }

    #[test]
    fn test_movement_input_moves_bubble() {
        let mut session = session_with(FAR);
        let mut input = FrameInput::default();
        input.players[0].movement = Vec2::new(1.0, 0.0);
        for _ in 0..60 {
            session.tick(&input, SIM_DT).unwrap();
        }
        assert!(session.players[0].center().x > 100.0 + 5.0);
        assert!((session.players[1].center() - FAR[1]).length() < 1e-3);
    }
}
