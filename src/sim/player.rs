//! Players: a bubble avatar plus form, payload and statistics

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::board::Block;
use super::bubble::Bubble;
use crate::error::PhysicsError;
use crate::tuning::Tuning;

/// Avatar mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Form {
    /// Soft and mobile
    Bubble,
    /// Rigid; pushes blocks and players, grabs and drops payloads
    Solid,
    /// Between forms
    InTransition,
}

/// A form change in progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: Form,
    pub target: Form,
    /// Seconds until the change completes
    pub remaining: f32,
}

/// Per-round counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub grabs: u32,
    pub drops: u32,
    pub misdrops: u32,
    pub captures: u32,
    /// Times a popping slot forced the player out of solid form
    pub pops: u32,
    /// Frames where non-finite particles had to be reset
    pub repairs: u32,
}

/// Hooks around form changes.
///
/// `form_changing` can veto a requested change; `form_changed` runs once the
/// new form is in effect. Forced changes (popping) skip the veto.
pub trait FormListener {
    fn form_changing(&mut self, _player: &Player, _new_form: Form) -> bool {
        true
    }

    fn form_changed(&mut self, _player: &Player) {}
}

/// One of the four players
#[derive(Debug, Clone)]
pub struct Player {
    pub id: usize,
    pub bubble: Bubble,
    form: Form,
    transition: Option<Transition>,
    /// Carried block, if any
    pub payload: Option<Block>,
    pub stats: PlayerStats,
    /// True while turtling next to one of the player's slotted blocks
    pub defending: bool,
}

impl Player {
    /// Spawn a player in bubble form at `spawn`
    pub fn new(id: usize, spawn: Vec2, tuning: &Tuning) -> Result<Self, PhysicsError> {
        let mut player = Self {
            id,
            bubble: build_bubble(spawn, tuning)?,
            form: Form::Bubble,
            transition: None,
            payload: None,
            stats: PlayerStats::default(),
            defending: false,
        };
        player.apply_half_lives(tuning)?;
        Ok(player)
    }

    /// Replace the bubble with a fresh one (new round or new shape tuning)
    pub fn respawn(&mut self, spawn: Vec2, tuning: &Tuning) -> Result<(), PhysicsError> {
        self.bubble = build_bubble(spawn, tuning)?;
        self.form = Form::Bubble;
        self.transition = None;
        self.defending = false;
        self.apply_half_lives(tuning)
    }

    #[inline]
    pub fn form(&self) -> Form {
        self.form
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    #[inline]
    pub fn is_solid(&self) -> bool {
        self.form == Form::Solid
    }

    pub fn center(&self) -> Vec2 {
        self.bubble.center_position()
    }

    /// Start changing to `target`. Returns false if there is nothing to do.
    pub fn begin_transition(&mut self, target: Form, seconds: f32) -> bool {
        if target == Form::InTransition || target == self.form || self.transition.is_some() {
            return false;
        }
        self.transition = Some(Transition {
            from: self.form,
            target,
            remaining: seconds.max(0.0),
        });
        self.form = Form::InTransition;
        true
    }

    /// Tick the transition timer. Returns the new form when it completes.
    pub fn update_transition(
        &mut self,
        dt: f32,
        tuning: &Tuning,
    ) -> Result<Option<Form>, PhysicsError> {
        let Some(transition) = self.transition.as_mut() else {
            return Ok(None);
        };
        transition.remaining -= dt;
        if transition.remaining > 0.0 {
            return Ok(None);
        }
        let target = transition.target;
        self.set_form(target, tuning)?;
        Ok(Some(target))
    }

    /// Switch form immediately, cancelling any transition
    pub fn set_form(&mut self, form: Form, tuning: &Tuning) -> Result<(), PhysicsError> {
        self.transition = None;
        self.form = form;
        self.apply_half_lives(tuning)
    }

    /// Solid responds fast and keeps its shape; bubble floats and squishes.
    /// In transition the previous form's response is kept.
    fn apply_half_lives(&mut self, tuning: &Tuning) -> Result<(), PhysicsError> {
        match self.form {
            Form::Solid => self
                .bubble
                .set_half_lives(tuning.solid_center_half_life, tuning.solid_spoke_half_life),
            Form::Bubble => self
                .bubble
                .set_half_lives(tuning.bubble_center_half_life, tuning.bubble_spoke_half_life),
            Form::InTransition => Ok(()),
        }
    }

    /// Reset non-finite particles, counting the repair
    pub fn check_finite(&mut self) -> bool {
        if self.bubble.is_finite() {
            return true;
        }
        let repaired = self.bubble.repair();
        log::warn!("Player {} bubble had {} non-finite particles", self.id, repaired);
        self.stats.repairs += 1;
        false
    }

    /// Keep a carried block on the bubble's center
    pub fn carry_payload(&mut self) {
        let center = self.center();
        if let Some(block) = self.payload.as_mut() {
            block.pos = center;
            block.vel = Vec2::ZERO;
        }
    }
}

fn build_bubble(spawn: Vec2, tuning: &Tuning) -> Result<Bubble, PhysicsError> {
    let mut bubble = Bubble::create(
        tuning.segments,
        spawn.x,
        spawn.y,
        tuning.inner_radius,
        tuning.outer_radius,
        tuning.ring_force,
        tuning.inner_force,
    )?;
    bubble.set_drag(tuning.bubble_drag);
    Ok(bubble)
}
