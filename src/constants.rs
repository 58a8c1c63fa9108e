use crate::types::Archetype;

pub const TICK_RATE: u32 = 60;

// World geometry. Units per tick at 60Hz, ground plane at y = 0, up positive.
pub const WORLD_HALF_WIDTH: f32 = 600.0;
pub const FIGHTER_HALF_WIDTH: f32 = 18.0;
pub const FIGHTER_HALF_HEIGHT: f32 = 40.0;
pub const GRAVITY: f32 = 0.55;
pub const SPAWN_OFFSET_X: f32 = 220.0;

pub const GROUND_DRAG: f32 = 0.82;
pub const AIR_DRAG: f32 = 0.94;
pub const ATTACK_GROUND_FRICTION: f32 = 0.7;
pub const ATTACK_AIR_FRICTION: f32 = 0.9;

pub const KNOCKBACK_UP: f32 = 3.0;
pub const COMBO_WINDOW_TICKS: f32 = 30.0;
// Half-width of the hit frame, in ticks, before slow-mo scaling. Kept below
// one tick so each stage lands on exactly one simulated frame.
pub const HIT_FRAME_HALF_WIDTH: f32 = 0.75;
pub const HIT_FLASH_TICKS: f32 = 8.0;

// Knockout presentation.
pub const KO_SLOWMO_FACTOR: f32 = 0.3;
pub const KO_SLOWMO_TICKS: f32 = 45.0;
pub const KO_OUTCOME_DELAY_TICKS: f32 = 90.0;
pub const HITSTOP_FACTOR: f32 = 0.1;
pub const HITSTOP_TICKS: f32 = 5.0;

pub const GHOST_HEALTH_RATE: f32 = 0.04;
pub const SHAKE_DECAY: f32 = 0.9;
pub const SHAKE_HEAVY_HIT: f32 = 6.0;
pub const SHAKE_KNOCKOUT: f32 = 12.0;

// Minimum distance substituted in place of degenerate zero-length geometry.
pub const MIN_GEOMETRY_DIST: f32 = 0.001;

#[derive(Clone, Copy, Debug)]
pub struct ComboStage {
    pub duration: f32,
    pub damage: f32,
    pub knockback: f32,
    pub lunge: f32,
    pub recovery: f32,
    pub range: f32,
    pub half_height: f32,
}

pub const COMBO_STAGES: [ComboStage; 3] = [
    ComboStage {
        duration: 14.0,
        damage: 6.0,
        knockback: 5.0,
        lunge: 2.5,
        recovery: 8.0,
        range: 55.0,
        half_height: 30.0,
    },
    ComboStage {
        duration: 16.0,
        damage: 8.0,
        knockback: 7.0,
        lunge: 3.5,
        recovery: 10.0,
        range: 65.0,
        half_height: 34.0,
    },
    ComboStage {
        duration: 22.0,
        damage: 14.0,
        knockback: 12.0,
        lunge: 5.0,
        recovery: 18.0,
        range: 85.0,
        half_height: 42.0,
    },
];

#[derive(Clone, Copy, Debug)]
pub struct ArchetypeStats {
    pub accel: f32,
    pub max_speed: f32,
    pub jump_force: f32,
    pub dash_speed: f32,
    pub dash_ticks: f32,
    pub dash_cooldown: f32,
    pub max_health: f32,
    pub damage_mult: f32,
    pub gravity_scale: f32,
    pub special_cooldown: f32,
}

pub fn archetype_stats(archetype: Archetype) -> ArchetypeStats {
    match archetype {
        Archetype::Phantom => ArchetypeStats {
            accel: 0.5,
            max_speed: 5.0,
            jump_force: 11.0,
            dash_speed: 13.0,
            dash_ticks: 10.0,
            dash_cooldown: 45.0,
            max_health: 85.0,
            damage_mult: 1.0,
            gravity_scale: 1.0,
            special_cooldown: 96.0,
        },
        Archetype::Meteor => ArchetypeStats {
            accel: 0.375,
            max_speed: 4.0,
            jump_force: 12.5,
            dash_speed: 12.0,
            dash_ticks: 9.0,
            dash_cooldown: 54.0,
            max_health: 110.0,
            damage_mult: 1.0,
            gravity_scale: 1.15,
            special_cooldown: 120.0,
        },
        Archetype::Grappler => ArchetypeStats {
            accel: 0.45,
            max_speed: 4.25,
            jump_force: 11.5,
            dash_speed: 12.5,
            dash_ticks: 10.0,
            dash_cooldown: 48.0,
            max_health: 100.0,
            damage_mult: 1.1,
            gravity_scale: 1.0,
            special_cooldown: 108.0,
        },
        Archetype::Warlock => ArchetypeStats {
            accel: 0.4,
            max_speed: 3.75,
            jump_force: 10.5,
            dash_speed: 11.0,
            dash_ticks: 8.0,
            dash_cooldown: 60.0,
            max_health: 90.0,
            damage_mult: 0.9,
            gravity_scale: 0.9,
            special_cooldown: 150.0,
        },
    }
}

// Phantom blink.
pub const BLINK_DISTANCE: f32 = 180.0;
pub const BLINK_DAMAGE: f32 = 12.0;
pub const BLINK_TRAIL_TICKS: f32 = 18.0;

// Meteor dive.
pub const DIVE_LAUNCH_VY: f32 = 9.0;
pub const DIVE_LAUNCH_VX: f32 = 5.0;
pub const DIVE_GROUND_CHARGE: f32 = 6.0;
pub const DIVE_EXTRA_ACCEL: f32 = 0.9;
pub const DIVE_BASE_DAMAGE: f32 = 6.0;
pub const DIVE_MIN_DAMAGE: f32 = 8.0;
pub const DIVE_MAX_DAMAGE: f32 = 35.0;
pub const DIVE_RADIUS: f32 = 140.0;
pub const DIVE_KNOCKBACK_SCALE: f32 = 0.6;
pub const METEOR_SPEED_BONUS: f32 = 0.02;
pub const METEOR_SPEED_BONUS_CAP: f32 = 0.5;

// Grappler.
pub const GRAPPLE_RANGE: f32 = 320.0;
pub const GRAPPLE_RAY_SLOP: f32 = 60.0;
pub const GRAPPLE_PULL_ACCEL: f32 = 1.1;
pub const GRAPPLE_SWING_DAMP: f32 = 0.8;
pub const GRAPPLE_MAX_SPEED: f32 = 9.0;
pub const GRAPPLE_FLIGHT_MAX_SPEED: f32 = 13.0;
pub const GRAPPLE_DETACH_DIST: f32 = 26.0;
pub const GRAPPLE_CLEAN_RELEASE_COOLDOWN: f32 = 48.0;
pub const GRAPPLE_FORCED_UNHOOK_COOLDOWN: f32 = 84.0;
pub const GRAPPLE_SPEED_DAMAGE: f32 = 1.4;
pub const GRAPPLE_DAMAGE_CAP: f32 = 18.0;
pub const GRAPPLE_KNOCKBACK: f32 = 9.0;
pub const GRAPPLE_BOUNDARY_LIFT: f32 = 140.0;

// Warlock orb.
pub const ORB_SPEED: f32 = 6.0;
pub const ORB_DRAG: f32 = 0.97;
pub const ORB_LIFETIME_TICKS: f32 = 180.0;
pub const ORB_DRAIN_RADIUS: f32 = 70.0;
pub const ORB_DRAIN_PER_TICK: f32 = 0.22;
pub const ORB_DETONATE_COOLDOWN: f32 = 66.0;
pub const ORB_BURST_RADIUS: f32 = 120.0;
pub const ORB_BURST_DAMAGE: f32 = 16.0;
pub const ORB_BURST_KNOCKBACK: f32 = 11.0;

// AI tuning.
pub const AI_MELEE_RANGE: f32 = 95.0;
pub const AI_REACTION_LAG_MAX_TICKS: f32 = 20.0;
pub const AI_HOLD_MIN_TICKS: i32 = 6;
pub const AI_HOLD_MAX_TICKS: i32 = 22;
pub const AI_RANGE_WIDEN_MAX: f32 = 60.0;
pub const AI_ATTACK_ROLL: f32 = 0.85;
pub const AI_WRONG_DASH_CHANCE: f32 = 0.2;
pub const AI_HESITATION_BASE: f32 = 0.1;
pub const AI_HESITATION_SPAN: f32 = 0.35;
pub const AI_DISENGAGE_TICKS: f32 = 26.0;

pub fn reaction_lag_ticks(difficulty: f32) -> f32 {
    (1.0 - difficulty.clamp(0.0, 1.0)) * AI_REACTION_LAG_MAX_TICKS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Archetype;

    #[test]
    fn expert_difficulty_has_no_reaction_lag() {
        assert_eq!(reaction_lag_ticks(1.0), 0.0);
        assert_eq!(reaction_lag_ticks(2.0), 0.0);
    }

    #[test]
    fn novice_difficulty_has_full_reaction_lag() {
        assert_eq!(reaction_lag_ticks(0.0), AI_REACTION_LAG_MAX_TICKS);
    }

    #[test]
    fn combo_stages_escalate() {
        for pair in COMBO_STAGES.windows(2) {
            assert!(pair[0].damage < pair[1].damage);
            assert!(pair[0].knockback < pair[1].knockback);
            assert!(pair[0].range < pair[1].range);
        }
    }

    #[test]
    fn detonate_cooldown_rewards_the_two_step_combo() {
        let place = archetype_stats(Archetype::Warlock).special_cooldown;
        assert!(ORB_DETONATE_COOLDOWN < place);
    }

    #[test]
    fn grapple_forced_unhook_costs_more_than_clean_release() {
        assert!(GRAPPLE_FORCED_UNHOOK_COOLDOWN > GRAPPLE_CLEAN_RELEASE_COOLDOWN);
    }
}
