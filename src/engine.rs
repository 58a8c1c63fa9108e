use crate::constants::*;
use crate::rng::Rng;
use crate::types::{
    Archetype, AudioCue, EffectRequest, FighterInput, FighterSetup, FighterView, MatchOutcome,
    Snapshot,
};

mod ai;
mod combat;
mod physics;
mod specials;
mod utils;

use self::utils::{aabb_overlap, dist, sweep_hits_box, toward};

/// Fresh presses this frame. Held buttons only fire once.
#[derive(Clone, Copy, Debug, Default)]
struct InputEdges {
    jump: bool,
    dash: bool,
    attack: bool,
    special: bool,
}

impl InputEdges {
    fn between(prev: FighterInput, now: FighterInput) -> Self {
        Self {
            jump: now.jump && !prev.jump,
            dash: now.dash && !prev.dash,
            attack: now.attack && !prev.attack,
            special: now.special && !prev.special,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum GrapplePhase {
    Idle,
    Attached,
    AttackFlight,
}

#[derive(Clone, Debug)]
struct GrappleData {
    phase: GrapplePhase,
    anchor_x: f32,
    anchor_y: f32,
    on_opponent: bool,
}

#[derive(Clone, Debug)]
struct OrbProjectile {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    life: f32,
}

/// Per-archetype private special payload. A fighter holds exactly the variant
/// matching its archetype for its whole lifetime.
#[derive(Clone, Debug)]
enum SpecialState {
    Blink {
        trail: f32,
        from_x: f32,
        from_y: f32,
    },
    Dive {
        charge: f32,
        diving: bool,
    },
    Grapple(GrappleData),
    Orb {
        orb: Option<OrbProjectile>,
    },
}

impl SpecialState {
    fn for_archetype(archetype: Archetype) -> Self {
        match archetype {
            Archetype::Phantom => Self::Blink {
                trail: 0.0,
                from_x: 0.0,
                from_y: 0.0,
            },
            Archetype::Meteor => Self::Dive {
                charge: 0.0,
                diving: false,
            },
            Archetype::Grappler => Self::Grapple(GrappleData {
                phase: GrapplePhase::Idle,
                anchor_x: 0.0,
                anchor_y: 0.0,
                on_opponent: false,
            }),
            Archetype::Warlock => Self::Orb { orb: None },
        }
    }
}

#[derive(Clone, Debug)]
struct AiControl {
    difficulty: f32,
    reaction_lag: f32,
    action_hold: f32,
    recovery_pause: f32,
    next_move: Option<FighterInput>,
    saw_attacking: bool,
    saw_dashing: bool,
    saw_grounded: bool,
}

impl AiControl {
    fn new(difficulty: f32) -> Self {
        Self {
            difficulty: difficulty.clamp(0.0, 1.0),
            reaction_lag: 0.0,
            action_hold: 0.0,
            recovery_pause: 0.0,
            next_move: None,
            saw_attacking: false,
            saw_dashing: false,
            saw_grounded: true,
        }
    }
}

#[derive(Clone, Debug)]
struct Fighter {
    archetype: Archetype,
    stats: ArchetypeStats,
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    facing: f32,
    health: f32,
    ghost_health: f32,
    grounded: bool,
    dashing: bool,
    dead: bool,
    just_landed: bool,
    landing_speed: f32,
    combo_count: u8,
    combo_window: f32,
    attack_stage: u8,
    attack_timer: f32,
    attack_cooldown: f32,
    attack_hit_done: bool,
    last_finished_stage: u8,
    chain_queued: bool,
    dash_timer: f32,
    dash_cooldown: f32,
    special_cooldown: f32,
    special: SpecialState,
    hit_flash: f32,
    score: u32,
    ai: Option<AiControl>,
}

impl Fighter {
    fn spawn(setup: FighterSetup, side: usize, score: u32) -> Self {
        let stats = archetype_stats(setup.archetype);
        let facing = if side == 0 { 1.0 } else { -1.0 };
        Self {
            archetype: setup.archetype,
            stats,
            x: -facing * SPAWN_OFFSET_X,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            facing,
            health: stats.max_health,
            ghost_health: stats.max_health,
            grounded: true,
            dashing: false,
            dead: false,
            just_landed: false,
            landing_speed: 0.0,
            combo_count: 0,
            combo_window: 0.0,
            attack_stage: 0,
            attack_timer: 0.0,
            attack_cooldown: 0.0,
            attack_hit_done: false,
            last_finished_stage: 0,
            chain_queued: false,
            dash_timer: 0.0,
            dash_cooldown: 0.0,
            special_cooldown: 0.0,
            special: SpecialState::for_archetype(setup.archetype),
            hit_flash: 0.0,
            score,
            ai: setup.ai.map(AiControl::new),
        }
    }

    fn attacking(&self) -> bool {
        self.attack_timer > 0.0
    }

    fn speed(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }

    fn view(&self) -> FighterView {
        FighterView {
            archetype: self.archetype,
            x: self.x,
            y: self.y,
            vx: self.vx,
            vy: self.vy,
            facing: self.facing,
            health: self.health,
            max_health: self.stats.max_health,
            ghost_health: self.ghost_health,
            grounded: self.grounded,
            dashing: self.dashing,
            attacking: self.attacking(),
            dead: self.dead,
            combo_count: self.combo_count,
            hit_flash: self.hit_flash,
            special_cooldown_frac: (self.special_cooldown / self.stats.special_cooldown)
                .clamp(0.0, 1.0),
            dash_cooldown_frac: (self.dash_cooldown / self.stats.dash_cooldown).clamp(0.0, 1.0),
            score: self.score,
            ai: self.ai.is_some(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MatchEngine {
    rng: Rng,
    setups: [FighterSetup; 2],
    fighters: [Fighter; 2],
    pending_inputs: [FighterInput; 2],
    prev_inputs: [FighterInput; 2],
    effects: Vec<EffectRequest>,
    audio: Vec<AudioCue>,
    slow_mo: f32,
    slow_mo_timer: f32,
    shake: f32,
    tick: u64,
    winner: Option<usize>,
    outcome_delay: f32,
    pending_outcome: Option<MatchOutcome>,
}

impl MatchEngine {
    pub fn new(left: FighterSetup, right: FighterSetup, seed: u32) -> Self {
        Self {
            rng: Rng::new(seed),
            setups: [left, right],
            fighters: [Fighter::spawn(left, 0, 0), Fighter::spawn(right, 1, 0)],
            pending_inputs: [FighterInput::default(); 2],
            prev_inputs: [FighterInput::default(); 2],
            effects: Vec::new(),
            audio: Vec::new(),
            slow_mo: 1.0,
            slow_mo_timer: 0.0,
            shake: 0.0,
            tick: 0,
            winner: None,
            outcome_delay: 0.0,
            pending_outcome: None,
        }
    }

    /// Host-supplied input for a human side. AI sides overwrite theirs each tick.
    pub fn set_input(&mut self, side: usize, input: FighterInput) {
        if side < 2 {
            self.pending_inputs[side] = input.normalized();
        }
    }

    pub fn winner(&self) -> Option<usize> {
        self.winner
    }

    pub fn round_over(&self) -> bool {
        self.winner.is_some()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance the match by one simulated frame. Slow motion is a pure scalar
    /// on every per-fighter delta, never a separate code path.
    pub fn step(&mut self) {
        self.tick += 1;
        let scale = self.slow_mo;

        for idx in 0..2 {
            if self.fighters[idx].ai.is_some() {
                self.pending_inputs[idx] = self.decide_ai(idx, scale);
            }
        }

        let inputs = [
            self.pending_inputs[0].normalized(),
            self.pending_inputs[1].normalized(),
        ];
        let edges = [
            InputEdges::between(self.prev_inputs[0], inputs[0]),
            InputEdges::between(self.prev_inputs[1], inputs[1]),
        ];

        for idx in 0..2 {
            self.integrate_fighter(idx, inputs[idx], edges[idx], scale);
        }
        for idx in 0..2 {
            self.update_special(idx, edges[idx].special, scale);
        }
        for idx in 0..2 {
            self.resolve_attack(idx, scale);
        }

        for fighter in &mut self.fighters {
            fighter.ghost_health +=
                (fighter.health - fighter.ghost_health) * GHOST_HEALTH_RATE * scale;
        }

        // World-level presentation timers run in real frames so slow motion
        // cannot stretch its own duration.
        if self.slow_mo_timer > 0.0 {
            self.slow_mo_timer -= 1.0;
            if self.slow_mo_timer <= 0.0 {
                self.slow_mo_timer = 0.0;
                self.slow_mo = 1.0;
            }
        }
        self.shake *= SHAKE_DECAY;
        if self.winner.is_some() && self.outcome_delay > 0.0 {
            self.outcome_delay -= 1.0;
            if self.outcome_delay <= 0.0 {
                self.outcome_delay = 0.0;
                if let Some(winner) = self.winner {
                    self.pending_outcome = Some(MatchOutcome {
                        winner,
                        scores: [self.fighters[0].score, self.fighters[1].score],
                    });
                }
            }
        }

        self.prev_inputs = inputs;
    }

    /// Render-state view of the world. Draining consumes the effect and audio
    /// queues and the one-shot outcome notification; an unconsumed queue is
    /// simply dropped on the next drain (collaborator absence degrades silently).
    pub fn build_snapshot(&mut self, drain: bool) -> Snapshot {
        Snapshot {
            tick: self.tick,
            slow_mo: self.slow_mo,
            shake: self.shake,
            fighters: self.fighters.iter().map(Fighter::view).collect(),
            effects: if drain {
                std::mem::take(&mut self.effects)
            } else {
                self.effects.clone()
            },
            audio: if drain {
                std::mem::take(&mut self.audio)
            } else {
                self.audio.clone()
            },
            outcome: if drain {
                self.pending_outcome.take()
            } else {
                self.pending_outcome
            },
        }
    }

    /// Rebuild both fighters from base stats. Score is the only value that
    /// survives; in-flight specials and the KO slow-mo window are discarded.
    pub fn rematch(&mut self) {
        let scores = [self.fighters[0].score, self.fighters[1].score];
        self.fighters = [
            Fighter::spawn(self.setups[0], 0, scores[0]),
            Fighter::spawn(self.setups[1], 1, scores[1]),
        ];
        self.pending_inputs = [FighterInput::default(); 2];
        self.prev_inputs = [FighterInput::default(); 2];
        self.effects.clear();
        self.audio.clear();
        self.slow_mo = 1.0;
        self.slow_mo_timer = 0.0;
        self.shake = 0.0;
        self.winner = None;
        self.outcome_delay = 0.0;
        self.pending_outcome = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Archetype, FighterInput, FighterSetup};

    fn human(archetype: Archetype) -> FighterSetup {
        FighterSetup {
            archetype,
            ai: None,
        }
    }

    fn bot(archetype: Archetype, difficulty: f32) -> FighterSetup {
        FighterSetup {
            archetype,
            ai: Some(difficulty),
        }
    }

    fn idle_engine() -> MatchEngine {
        MatchEngine::new(human(Archetype::Phantom), human(Archetype::Warlock), 42)
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let mut a = MatchEngine::new(bot(Archetype::Meteor, 0.5), bot(Archetype::Grappler, 0.5), 77);
        let mut b = MatchEngine::new(bot(Archetype::Meteor, 0.5), bot(Archetype::Grappler, 0.5), 77);
        for _ in 0..900 {
            a.step();
            b.step();
            let sa = a.build_snapshot(false);
            let sb = b.build_snapshot(false);
            for (fa, fb) in sa.fighters.iter().zip(sb.fighters.iter()) {
                assert_eq!(fa.x.to_bits(), fb.x.to_bits());
                assert_eq!(fa.y.to_bits(), fb.y.to_bits());
                assert_eq!(fa.health.to_bits(), fb.health.to_bits());
                assert_eq!(fa.combo_count, fb.combo_count);
            }
            if a.round_over() || b.round_over() {
                assert_eq!(a.winner(), b.winner());
                break;
            }
        }
    }

    #[test]
    fn health_and_combo_ranges_hold_over_a_full_ai_match() {
        let mut engine =
            MatchEngine::new(bot(Archetype::Phantom, 0.2), bot(Archetype::Warlock, 0.9), 1313);
        for _ in 0..3_000 {
            engine.step();
            let snapshot = engine.build_snapshot(false);
            assert!(snapshot.slow_mo > 0.0 && snapshot.slow_mo <= 1.0);
            for fighter in &snapshot.fighters {
                assert!(fighter.health >= 0.0);
                assert!(fighter.health <= fighter.max_health);
                assert!(fighter.combo_count <= 2);
                if fighter.dead {
                    assert_eq!(fighter.health, 0.0);
                }
            }
            if engine.round_over() {
                break;
            }
        }
    }

    #[test]
    fn half_rate_time_dilation_matches_full_rate_bit_exactly() {
        // Timers and non-accelerating state must scale exactly; one blink is
        // fired on the first frame of both runs, then the fighters sit still.
        let trigger = FighterInput {
            special: true,
            ..FighterInput::default()
        };
        let mut full = idle_engine();
        let mut half = idle_engine();
        half.slow_mo = 0.5;

        full.set_input(0, trigger);
        half.set_input(0, trigger);
        full.step();
        half.step();
        full.set_input(0, FighterInput::default());
        half.set_input(0, FighterInput::default());

        let ticks = 60;
        for _ in 0..ticks {
            full.step();
        }
        for _ in 0..ticks * 2 {
            half.step();
        }

        for idx in 0..2 {
            let f = &full.fighters[idx];
            let h = &half.fighters[idx];
            assert_eq!(f.x.to_bits(), h.x.to_bits());
            assert_eq!(f.y.to_bits(), h.y.to_bits());
            assert_eq!(f.health.to_bits(), h.health.to_bits());
            assert_eq!(f.special_cooldown.to_bits(), h.special_cooldown.to_bits());
        }
    }

    #[test]
    fn ko_sets_dead_once_and_awards_exactly_one_point() {
        let mut engine = idle_engine();
        let died = engine.apply_damage(0, 1, 1_000.0);
        assert!(died);
        assert!(engine.fighters[1].dead);
        assert_eq!(engine.fighters[1].health, 0.0);
        assert_eq!(engine.fighters[0].score, 1);
        assert_eq!(engine.winner(), Some(0));

        // Further damage on a dead fighter is a no-op.
        let died_again = engine.apply_damage(0, 1, 50.0);
        assert!(!died_again);
        assert_eq!(engine.fighters[0].score, 1);
        assert_eq!(engine.fighters[1].health, 0.0);
        for _ in 0..20 {
            engine.step();
            assert_eq!(engine.fighters[1].health, 0.0);
        }
    }

    #[test]
    fn ko_engages_slow_motion_and_delayed_outcome_exactly_once() {
        let mut engine = idle_engine();
        engine.apply_damage(0, 1, 1_000.0);
        assert_eq!(engine.slow_mo, KO_SLOWMO_FACTOR);

        let mut outcomes = 0;
        for _ in 0..(KO_OUTCOME_DELAY_TICKS as usize + 30) {
            engine.step();
            if let Some(outcome) = engine.build_snapshot(true).outcome {
                outcomes += 1;
                assert_eq!(outcome.winner, 0);
                assert_eq!(outcome.scores, [1, 0]);
            }
        }
        assert_eq!(outcomes, 1);
        // Slow motion window has elapsed by then.
        assert_eq!(engine.slow_mo, 1.0);
    }

    #[test]
    fn rematch_preserves_only_score() {
        let mut engine = idle_engine();
        engine.apply_damage(0, 1, 1_000.0);
        engine.fighters[0].x = 123.0;
        engine.rematch();

        assert_eq!(engine.fighters[0].score, 1);
        assert_eq!(engine.fighters[1].score, 0);
        assert_eq!(engine.winner(), None);
        assert_eq!(engine.slow_mo, 1.0);
        for (idx, fighter) in engine.fighters.iter().enumerate() {
            assert!(!fighter.dead);
            assert_eq!(fighter.health, fighter.stats.max_health);
            let expected_x = if idx == 0 {
                -SPAWN_OFFSET_X
            } else {
                SPAWN_OFFSET_X
            };
            assert_eq!(fighter.x, expected_x);
        }
    }

    #[test]
    fn build_snapshot_drains_queues_when_requested() {
        let mut engine = idle_engine();
        engine.effects.push(EffectRequest::Flare {
            x: 0.0,
            y: 0.0,
            color: 0xFFFFFFFF,
        });
        engine.audio.push(AudioCue::Jump);

        let kept = engine.build_snapshot(false);
        assert_eq!(kept.effects.len(), 1);
        assert_eq!(kept.audio.len(), 1);

        let first = engine.build_snapshot(true);
        let second = engine.build_snapshot(true);
        assert_eq!(first.effects.len(), 1);
        assert_eq!(first.audio.len(), 1);
        assert!(second.effects.is_empty());
        assert!(second.audio.is_empty());
    }

    #[test]
    fn dead_fighter_ignores_input_driven_transitions() {
        let mut engine = idle_engine();
        engine.apply_damage(0, 1, 1_000.0);
        engine.set_input(
            1,
            FighterInput {
                move_axis: 1,
                jump: true,
                dash: true,
                attack: true,
                special: true,
            },
        );
        for _ in 0..30 {
            engine.step();
        }
        let dead = &engine.fighters[1];
        assert!(!dead.dashing);
        assert!(!dead.attacking());
        assert_eq!(dead.x, SPAWN_OFFSET_X);
    }
}
