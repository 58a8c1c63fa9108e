use super::*;

impl MatchEngine {
    /// Lands the active melee stage if this frame is the stage's hit frame and
    /// the swing box overlaps the opponent. Each stage hits at most once.
    pub(super) fn resolve_attack(&mut self, idx: usize, scale: f32) {
        let opp_idx = 1 - idx;

        let (stage, facing, ax, ay, speed, mult) = {
            let attacker = &self.fighters[idx];
            if attacker.dead || !attacker.attacking() || attacker.attack_hit_done {
                return;
            }
            let stage = attacker.attack_stage as usize;
            let profile = COMBO_STAGES[stage];
            let elapsed = profile.duration - attacker.attack_timer;
            if (elapsed - profile.duration * 0.5).abs() > HIT_FRAME_HALF_WIDTH * scale {
                return;
            }
            (
                stage,
                attacker.facing,
                attacker.x,
                attacker.y,
                attacker.speed(),
                attacker.stats.damage_mult,
            )
        };

        let profile = COMBO_STAGES[stage];
        self.fighters[idx].attack_hit_done = true;

        let (dx, dy, defender_dead, defender_dashing) = {
            let defender = &self.fighters[opp_idx];
            (defender.x, defender.y, defender.dead, defender.dashing)
        };
        // A dashing defender slips through the swing.
        if defender_dead || defender_dashing {
            return;
        }

        let swing_x = if facing > 0.0 { ax } else { ax - profile.range };
        let swing_y = ay + FIGHTER_HALF_HEIGHT - profile.half_height;
        let hit = aabb_overlap(
            swing_x,
            swing_y,
            profile.range,
            profile.half_height * 2.0,
            dx - FIGHTER_HALF_WIDTH,
            dy,
            FIGHTER_HALF_WIDTH * 2.0,
            FIGHTER_HALF_HEIGHT * 2.0,
        );
        if !hit {
            return;
        }

        // Momentum archetype converts its own speed into extra damage.
        let dynamic = if self.fighters[idx].archetype == Archetype::Meteor {
            1.0 + (speed * METEOR_SPEED_BONUS).min(METEOR_SPEED_BONUS_CAP)
        } else {
            1.0
        };
        let damage = profile.damage * mult * dynamic;
        let killed = self.apply_damage(idx, opp_idx, damage);

        {
            let defender = &mut self.fighters[opp_idx];
            defender.vx += facing * profile.knockback;
            defender.vy += KNOCKBACK_UP;
            defender.hit_flash = HIT_FLASH_TICKS;
        }
        self.effects.push(EffectRequest::Impact {
            x: dx,
            y: dy + FIGHTER_HALF_HEIGHT,
            angle: if facing > 0.0 { 0.0 } else { std::f32::consts::PI },
        });
        if stage == 2 {
            self.audio.push(AudioCue::HeavyHit);
            self.shake = self.shake.max(SHAKE_HEAVY_HIT);
            if !killed && self.winner.is_none() {
                self.slow_mo = HITSTOP_FACTOR;
                self.slow_mo_timer = HITSTOP_TICKS;
            }
        } else {
            self.audio.push(AudioCue::LightHit);
        }
    }

    /// Health bookkeeping plus the knockout sequence. Returns true when this
    /// call killed the defender; repeated damage on a corpse is a no-op.
    /// Damage sourced from a corpse (a lingering orb, an in-flight grapple)
    /// is dropped too, so the winner can never flip after the KO.
    pub(super) fn apply_damage(&mut self, attacker: usize, defender: usize, damage: f32) -> bool {
        if damage <= 0.0
            || self.fighters[defender].dead
            || self.fighters[attacker].dead
            || self.winner.is_some()
        {
            return false;
        }
        {
            let target = &mut self.fighters[defender];
            target.health -= damage;
            if target.health > 0.0 {
                return false;
            }
            target.health = 0.0;
            target.dead = true;
            target.attack_timer = 0.0;
            target.chain_queued = false;
            target.dashing = false;
        }

        self.fighters[attacker].score += 1;
        self.winner = Some(attacker);
        self.slow_mo = KO_SLOWMO_FACTOR;
        self.slow_mo_timer = KO_SLOWMO_TICKS;
        self.outcome_delay = KO_OUTCOME_DELAY_TICKS;
        self.shake = SHAKE_KNOCKOUT;

        let (kx, ky) = (self.fighters[defender].x, self.fighters[defender].y);
        self.effects.push(EffectRequest::ParticleBurst {
            x: kx,
            y: ky + FIGHTER_HALF_HEIGHT,
            count: 40,
            color: 0xFFD24A,
            speed: 7.0,
        });
        self.audio.push(AudioCue::Knockout);
        true
    }
}
