//! Crouch state. Crouching eases in while requested; standing up eases out on
//! the ground and is immediate in the air.

use crate::math::lerp;
use crate::settings::CrouchSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct CrouchState {
    queued: bool,
    amount: f32,
    pub standing_height: f32,
    pub crouched_height: f32,
    pub rate: f32,
    pub speed_multiplier: f32,
}

impl CrouchState {
    #[must_use]
    pub fn from_settings(settings: &CrouchSettings) -> Self {
        Self {
            queued: false,
            amount: 0.0,
            standing_height: settings.standing_height,
            crouched_height: settings.crouched_height,
            rate: settings.rate,
            speed_multiplier: settings.speed_multiplier,
        }
    }

    pub fn apply_settings(&mut self, settings: &CrouchSettings) {
        self.standing_height = settings.standing_height;
        self.crouched_height = settings.crouched_height;
        self.rate = settings.rate;
        self.speed_multiplier = settings.speed_multiplier;
    }

    pub fn request(&mut self, crouch: bool) {
        self.queued = crouch;
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.queued
    }

    /// 0 standing, 1 fully crouched.
    #[must_use]
    pub fn amount(&self) -> f32 {
        self.amount
    }

    #[must_use]
    pub fn is_crouching(&self) -> bool {
        self.amount > 0.0
    }

    /// Advance towards the requested pose.
    pub fn update(&mut self, grounded: bool, dt: f32) {
        if self.queued {
            self.amount = (self.amount + self.rate * dt).min(1.0);
        } else if grounded {
            self.amount = (self.amount - self.rate * dt).max(0.0);
        } else {
            self.amount = 0.0;
        }
    }

    #[must_use]
    pub fn current_height(&self) -> f32 {
        lerp(self.standing_height, self.crouched_height, self.amount)
    }

    #[must_use]
    pub fn speed_factor(&self) -> f32 {
        lerp(1.0, self.speed_multiplier, self.amount)
    }
}

impl Default for CrouchState {
    fn default() -> Self {
        Self::from_settings(&CrouchSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn crouch() -> CrouchState {
        CrouchState::from_settings(&CrouchSettings {
            standing_height: 2.0,
            crouched_height: 1.0,
            rate: 5.0,
            speed_multiplier: 0.5,
        })
    }

    #[test]
    fn eases_down_and_back_up_on_the_ground() {
        let mut c = crouch();
        c.request(true);
        c.update(true, 0.1);
        assert_relative_eq!(c.amount(), 0.5, epsilon = 1e-6);
        assert_relative_eq!(c.current_height(), 1.5, epsilon = 1e-6);
        assert_relative_eq!(c.speed_factor(), 0.75, epsilon = 1e-6);
        c.update(true, 0.5);
        assert_eq!(c.amount(), 1.0);

        c.request(false);
        c.update(true, 0.1);
        assert_relative_eq!(c.amount(), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn stands_up_at_once_in_the_air() {
        let mut c = crouch();
        c.request(true);
        c.update(true, 1.0);
        c.request(false);
        c.update(false, 0.01);
        assert_eq!(c.amount(), 0.0);
        assert_eq!(c.current_height(), 2.0);
    }
}
