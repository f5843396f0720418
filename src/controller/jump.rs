//! Jump charges, cooldown and queueing.

use crate::settings::JumpSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct JumpAbility {
    charges: u32,
    pub max_charges: u32,
    cooldown_remaining: f32,
    pub cooldown: f32,
    /// Jump height in body heights.
    pub strength: f32,
    pub queue_while_airborne: bool,
    pub auto_bunny_hop: bool,
    queued: bool,
}

impl JumpAbility {
    #[must_use]
    pub fn new(max_charges: u32, strength: f32, cooldown: f32) -> Self {
        Self {
            charges: max_charges,
            max_charges,
            cooldown_remaining: 0.0,
            cooldown: cooldown.max(0.0),
            strength: strength.max(0.0),
            queue_while_airborne: false,
            auto_bunny_hop: false,
            queued: false,
        }
    }

    #[must_use]
    pub fn from_settings(settings: &JumpSettings) -> Self {
        let mut jump = Self::new(settings.charges, settings.strength, settings.cooldown);
        jump.queue_while_airborne = settings.queue_while_airborne;
        jump.auto_bunny_hop = settings.auto_bunny_hop;
        jump
    }

    /// Take new tuning, keep charges and cooldown in flight.
    pub fn apply_settings(&mut self, settings: &JumpSettings) {
        self.max_charges = settings.charges;
        self.charges = self.charges.min(self.max_charges);
        self.cooldown = settings.cooldown.max(0.0);
        self.strength = settings.strength.max(0.0);
        self.queue_while_airborne = settings.queue_while_airborne;
        self.auto_bunny_hop = settings.auto_bunny_hop;
        if !self.queue_while_airborne {
            self.queued = false;
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.charges > 0 && self.cooldown_remaining <= 0.0
    }

    #[must_use]
    pub fn charges(&self) -> u32 {
        self.charges
    }

    #[must_use]
    pub fn cooldown_remaining(&self) -> f32 {
        self.cooldown_remaining
    }

    #[must_use]
    pub fn is_queued(&self) -> bool {
        self.queued
    }

    pub fn queue(&mut self) {
        self.queued = true;
    }

    pub fn tick(&mut self, dt: f32) {
        self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);
    }

    /// Spend a charge and start the cooldown. Clears any queued jump.
    pub fn consume(&mut self) {
        self.charges = self.charges.saturating_sub(1);
        self.cooldown_remaining = self.cooldown;
        self.queued = false;
    }

    /// Refill charges, called on landing.
    pub fn restore(&mut self) {
        self.charges = self.max_charges;
    }

    /// Launch speed reaching `strength * body_height` under gravity `g`.
    #[must_use]
    pub fn launch_speed(&self, g: f32, body_height: f32) -> f32 {
        (2.0 * g * self.strength * body_height).max(0.0).sqrt()
    }
}

impl Default for JumpAbility {
    fn default() -> Self {
        Self::from_settings(&JumpSettings::default())
    }
}
