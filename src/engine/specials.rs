use super::*;

/// Rope kinematics: drop any velocity pointing away from the anchor and damp
/// the swing component, leaving only motion that closes on (ux, uy). Keeps
/// the anchor distance non-increasing while attached.
fn rope_align(fighter: &mut Fighter, ux: f32, uy: f32, damp: f32) {
    let along = fighter.vx * ux + fighter.vy * uy;
    let swing_x = (fighter.vx - along * ux) * damp;
    let swing_y = (fighter.vy - along * uy) * damp;
    let along = along.max(0.0);
    fighter.vx = along * ux + swing_x;
    fighter.vy = along * uy + swing_y;
}

impl MatchEngine {
    /// Per-archetype ability update. The shared cooldown runs down first so a
    /// press on the frame it reaches zero fires immediately.
    pub(super) fn update_special(&mut self, idx: usize, special_edge: bool, scale: f32) {
        {
            let fighter = &mut self.fighters[idx];
            if fighter.special_cooldown > 0.0 {
                fighter.special_cooldown = (fighter.special_cooldown - scale).max(0.0);
            }
        }
        let pressed = special_edge && !self.fighters[idx].dead;
        match self.fighters[idx].archetype {
            Archetype::Phantom => self.update_blink(idx, pressed, scale),
            Archetype::Meteor => self.update_dive(idx, pressed, scale),
            Archetype::Grappler => self.update_grapple(idx, pressed, scale),
            Archetype::Warlock => self.update_orb(idx, pressed, scale),
        }
    }

    fn update_blink(&mut self, idx: usize, pressed: bool, scale: f32) {
        if let SpecialState::Blink { trail, .. } = &mut self.fighters[idx].special {
            if *trail > 0.0 {
                *trail = (*trail - scale).max(0.0);
            }
        }
        if !pressed || self.fighters[idx].special_cooldown > 0.0 {
            return;
        }

        let opp_idx = 1 - idx;
        let (from_x, from_y, facing) = {
            let fighter = &self.fighters[idx];
            (fighter.x, fighter.y, fighter.facing)
        };
        let limit = WORLD_HALF_WIDTH - FIGHTER_HALF_WIDTH;
        let to_x = (from_x + facing * BLINK_DISTANCE).clamp(-limit, limit);

        let (opp_x, opp_y, opp_dead) = {
            let opp = &self.fighters[opp_idx];
            (opp.x, opp.y, opp.dead)
        };
        let struck = !opp_dead
            && sweep_hits_box(
                from_x,
                to_x,
                from_y + FIGHTER_HALF_HEIGHT,
                FIGHTER_HALF_HEIGHT,
                opp_x,
                opp_y + FIGHTER_HALF_HEIGHT,
                FIGHTER_HALF_WIDTH,
                FIGHTER_HALF_HEIGHT,
            );

        {
            let fighter = &mut self.fighters[idx];
            fighter.x = to_x;
            // The jump cut is instant; whatever motion was in progress stops.
            fighter.vx = 0.0;
            fighter.vy = 0.0;
            fighter.dashing = false;
            fighter.attack_timer = 0.0;
            fighter.special_cooldown = fighter.stats.special_cooldown;
            fighter.special = SpecialState::Blink {
                trail: BLINK_TRAIL_TICKS,
                from_x,
                from_y,
            };
        }
        self.effects.push(EffectRequest::Flare {
            x: from_x,
            y: from_y + FIGHTER_HALF_HEIGHT,
            color: 0x9A6BFF,
        });
        self.effects.push(EffectRequest::ParticleBurst {
            x: to_x,
            y: from_y + FIGHTER_HALF_HEIGHT,
            count: 18,
            color: 0x9A6BFF,
            speed: 4.0,
        });
        self.audio.push(AudioCue::Dash);

        if struck {
            let mult = self.fighters[idx].stats.damage_mult;
            let killed = self.apply_damage(idx, opp_idx, BLINK_DAMAGE * mult);
            {
                // The interrupt freezes the target in place rather than
                // knocking it away.
                let defender = &mut self.fighters[opp_idx];
                defender.vx = 0.0;
                defender.vy = 0.0;
                defender.hit_flash = HIT_FLASH_TICKS;
            }
            self.effects.push(EffectRequest::Impact {
                x: opp_x,
                y: opp_y + FIGHTER_HALF_HEIGHT,
                angle: if facing > 0.0 { 0.0 } else { std::f32::consts::PI },
            });
            self.audio.push(AudioCue::LightHit);
            if !killed && self.winner.is_none() {
                self.slow_mo = HITSTOP_FACTOR;
                self.slow_mo_timer = HITSTOP_TICKS;
            }
        }
    }

    fn update_dive(&mut self, idx: usize, pressed: bool, scale: f32) {
        let (mut charge, mut diving) = match self.fighters[idx].special {
            SpecialState::Dive { charge, diving } => (charge, diving),
            _ => return,
        };
        let opp_idx = 1 - idx;
        let ready = self.fighters[idx].special_cooldown <= 0.0;

        let mut launched_at = None;
        {
            let fighter = &mut self.fighters[idx];
            if pressed && ready && !diving {
                diving = true;
                if fighter.grounded {
                    // Ground cast hops forward first with a flat charge.
                    charge = DIVE_GROUND_CHARGE;
                    fighter.vy = DIVE_LAUNCH_VY;
                    fighter.vx += fighter.facing * DIVE_LAUNCH_VX;
                    fighter.grounded = false;
                } else {
                    // Air cast banks the entry speed; the snapshot is held
                    // untouched for the whole dive.
                    charge = fighter.speed();
                }
                launched_at = Some((fighter.x, fighter.y + FIGHTER_HALF_HEIGHT));
            }
            if diving && !fighter.grounded {
                fighter.vy -= DIVE_EXTRA_ACCEL * scale;
            }
        }
        if let Some((x, y)) = launched_at {
            self.effects.push(EffectRequest::Flare {
                x,
                y,
                color: 0xFF7A33,
            });
            self.audio.push(AudioCue::Dash);
        }

        if diving && self.fighters[idx].just_landed {
            diving = false;
            let (impact_x, impact_y, landing_speed, mult) = {
                let fighter = &mut self.fighters[idx];
                fighter.special_cooldown = fighter.stats.special_cooldown;
                (
                    fighter.x,
                    fighter.y,
                    fighter.landing_speed,
                    fighter.stats.damage_mult,
                )
            };
            let damage = (DIVE_BASE_DAMAGE + 0.8 * charge + 0.2 * landing_speed)
                .clamp(DIVE_MIN_DAMAGE, DIVE_MAX_DAMAGE);
            charge = 0.0;

            self.effects.push(EffectRequest::Shockwave {
                x: impact_x,
                y: impact_y,
                color: 0xFF7A33,
            });
            self.audio.push(AudioCue::HeavyHit);
            self.shake = self.shake.max(SHAKE_HEAVY_HIT);

            let (opp_x, opp_y, opp_dead) = {
                let opp = &self.fighters[opp_idx];
                (opp.x, opp.y, opp.dead)
            };
            if !opp_dead && dist(impact_x, impact_y, opp_x, opp_y) <= DIVE_RADIUS {
                self.apply_damage(idx, opp_idx, damage * mult);
                let push = if opp_x >= impact_x { 1.0 } else { -1.0 };
                let defender = &mut self.fighters[opp_idx];
                defender.vx += push * damage * DIVE_KNOCKBACK_SCALE;
                defender.vy += KNOCKBACK_UP;
                defender.hit_flash = HIT_FLASH_TICKS;
            }
        }

        self.fighters[idx].special = SpecialState::Dive { charge, diving };
    }

    fn update_grapple(&mut self, idx: usize, pressed: bool, scale: f32) {
        let mut data = match &self.fighters[idx].special {
            SpecialState::Grapple(data) => data.clone(),
            _ => return,
        };
        let opp_idx = 1 - idx;
        let (opp_x, opp_y, opp_dead) = {
            let opp = &self.fighters[opp_idx];
            (opp.x, opp.y, opp.dead)
        };

        match data.phase {
            GrapplePhase::Idle => {
                if pressed && self.fighters[idx].special_cooldown <= 0.0 {
                    let (fx, fy, facing) = {
                        let fighter = &self.fighters[idx];
                        (fighter.x, fighter.y, fighter.facing)
                    };
                    let in_front = (opp_x - fx) * facing > 0.0;
                    let hooks_opponent = !opp_dead
                        && in_front
                        && (opp_x - fx).abs() <= GRAPPLE_RANGE
                        && (opp_y - fy).abs() <= GRAPPLE_RAY_SLOP;
                    if hooks_opponent {
                        // Hooking a live target launches the fast attack
                        // flight straight away.
                        data.phase = GrapplePhase::AttackFlight;
                        data.on_opponent = true;
                        data.anchor_x = opp_x;
                        data.anchor_y = opp_y;
                    } else {
                        // No target on the ray; hook the wall ahead instead,
                        // lifted so the pull arcs upward.
                        let wall_x = if facing > 0.0 {
                            WORLD_HALF_WIDTH
                        } else {
                            -WORLD_HALF_WIDTH
                        };
                        if (wall_x - fx).abs() <= GRAPPLE_RANGE {
                            data.phase = GrapplePhase::Attached;
                            data.on_opponent = false;
                            data.anchor_x = wall_x;
                            data.anchor_y = GRAPPLE_BOUNDARY_LIFT;
                        } else {
                            self.fighters[idx].special_cooldown = GRAPPLE_CLEAN_RELEASE_COOLDOWN;
                        }
                    }
                    if data.phase != GrapplePhase::Idle {
                        // Attaching immediately kills any outward drift so the
                        // fighter starts closing on the anchor this very tick.
                        let (ux, uy, _) = toward(fx, fy, data.anchor_x, data.anchor_y);
                        rope_align(&mut self.fighters[idx], ux, uy, GRAPPLE_SWING_DAMP);
                        self.effects.push(EffectRequest::Flare {
                            x: data.anchor_x,
                            y: data.anchor_y + FIGHTER_HALF_HEIGHT,
                            color: 0x46D6A8,
                        });
                        self.audio.push(AudioCue::Dash);
                    }
                }
            }
            GrapplePhase::Attached | GrapplePhase::AttackFlight => {
                let target_died = data.on_opponent && opp_dead;
                if pressed || target_died {
                    // Cutting the line (or losing the target) costs the long
                    // cooldown.
                    data.phase = GrapplePhase::Idle;
                    data.on_opponent = false;
                    self.fighters[idx].special_cooldown = GRAPPLE_FORCED_UNHOOK_COOLDOWN;
                } else {
                    let (fx, fy, speed) = {
                        let fighter = &self.fighters[idx];
                        (fighter.x, fighter.y, fighter.speed())
                    };

                    // The flight connects on body contact, checked before the
                    // pull so the landing frame cannot overshoot through the
                    // target. A hit hands the cooldown straight back.
                    if data.phase == GrapplePhase::AttackFlight && !opp_dead {
                        let body_hit = aabb_overlap(
                            fx - FIGHTER_HALF_WIDTH,
                            fy,
                            FIGHTER_HALF_WIDTH * 2.0,
                            FIGHTER_HALF_HEIGHT * 2.0,
                            opp_x - FIGHTER_HALF_WIDTH,
                            opp_y,
                            FIGHTER_HALF_WIDTH * 2.0,
                            FIGHTER_HALF_HEIGHT * 2.0,
                        );
                        if body_hit {
                            data.phase = GrapplePhase::Idle;
                            data.on_opponent = false;
                            self.fighters[idx].special_cooldown = 0.0;
                            let damage = (speed * GRAPPLE_SPEED_DAMAGE).min(GRAPPLE_DAMAGE_CAP);
                            self.apply_damage(idx, opp_idx, damage);
                            let push = if opp_x >= fx { 1.0 } else { -1.0 };
                            {
                                let defender = &mut self.fighters[opp_idx];
                                defender.vx += push * GRAPPLE_KNOCKBACK;
                                defender.vy += KNOCKBACK_UP;
                                defender.hit_flash = HIT_FLASH_TICKS;
                            }
                            self.effects.push(EffectRequest::Impact {
                                x: opp_x,
                                y: opp_y + FIGHTER_HALF_HEIGHT,
                                angle: if push > 0.0 { 0.0 } else { std::f32::consts::PI },
                            });
                            self.audio.push(AudioCue::LightHit);
                            if let SpecialState::Grapple(slot) = &mut self.fighters[idx].special {
                                *slot = data;
                            }
                            return;
                        }
                    }

                    if data.on_opponent {
                        data.anchor_x = opp_x;
                        data.anchor_y = opp_y;
                    }
                    let cap = if data.phase == GrapplePhase::AttackFlight {
                        GRAPPLE_FLIGHT_MAX_SPEED
                    } else {
                        GRAPPLE_MAX_SPEED
                    };

                    let (ux, uy, d) = toward(fx, fy, data.anchor_x, data.anchor_y);
                    if d <= GRAPPLE_DETACH_DIST {
                        data.phase = GrapplePhase::Idle;
                        data.on_opponent = false;
                        self.fighters[idx].special_cooldown = GRAPPLE_CLEAN_RELEASE_COOLDOWN;
                    } else {
                        let fighter = &mut self.fighters[idx];
                        rope_align(fighter, ux, uy, GRAPPLE_SWING_DAMP.powf(scale));
                        fighter.vx += ux * GRAPPLE_PULL_ACCEL * scale;
                        fighter.vy += uy * GRAPPLE_PULL_ACCEL * scale;
                        let sp = fighter.speed();
                        if sp > cap {
                            let k = cap / sp;
                            fighter.vx *= k;
                            fighter.vy *= k;
                        }
                    }
                }
            }
        }

        if let SpecialState::Grapple(slot) = &mut self.fighters[idx].special {
            *slot = data;
        }
    }

    fn update_orb(&mut self, idx: usize, pressed: bool, scale: f32) {
        let mut orb = match &self.fighters[idx].special {
            SpecialState::Orb { orb } => orb.clone(),
            _ => return,
        };
        let opp_idx = 1 - idx;
        let (opp_x, opp_y, opp_dead) = {
            let opp = &self.fighters[opp_idx];
            (opp.x, opp.y, opp.dead)
        };
        let opp_center_y = opp_y + FIGHTER_HALF_HEIGHT;

        let mut expired_at = None;
        if let Some(projectile) = orb.as_mut() {
            let drag = ORB_DRAG.powf(scale);
            projectile.vx *= drag;
            projectile.vy *= drag;
            projectile.x += projectile.vx * scale;
            projectile.y += projectile.vy * scale;
            let limit = WORLD_HALF_WIDTH - 10.0;
            if projectile.x < -limit {
                projectile.x = -limit;
                projectile.vx = 0.0;
            } else if projectile.x > limit {
                projectile.x = limit;
                projectile.vx = 0.0;
            }
            projectile.life -= scale;
            if projectile.life <= 0.0 {
                expired_at = Some((projectile.x, projectile.y));
            }
        }

        if let Some(projectile) = &orb {
            if !opp_dead
                && dist(projectile.x, projectile.y, opp_x, opp_center_y) <= ORB_DRAIN_RADIUS
            {
                self.apply_damage(idx, opp_idx, ORB_DRAIN_PER_TICK * scale);
            }
        }

        if let Some((x, y)) = expired_at {
            self.effects.push(EffectRequest::ParticleBurst {
                x,
                y,
                count: 8,
                color: 0xB24BF3,
                speed: 2.0,
            });
            orb = None;
        }

        if pressed && self.fighters[idx].special_cooldown <= 0.0 {
            match &orb {
                Some(projectile) => {
                    let (orb_x, orb_y) = (projectile.x, projectile.y);
                    {
                        // The caster swaps places with the orb before it
                        // bursts, arriving at rest.
                        let limit = WORLD_HALF_WIDTH - FIGHTER_HALF_WIDTH;
                        let fighter = &mut self.fighters[idx];
                        fighter.x = orb_x.clamp(-limit, limit);
                        fighter.y = (orb_y - FIGHTER_HALF_HEIGHT).max(0.0);
                        fighter.vx = 0.0;
                        fighter.vy = 0.0;
                        if fighter.y > 0.0 {
                            fighter.grounded = false;
                        }
                    }
                    self.effects.push(EffectRequest::BoltColumn {
                        x: orb_x,
                        height: orb_y + 80.0,
                        color: 0xB24BF3,
                    });
                    self.effects.push(EffectRequest::Shockwave {
                        x: orb_x,
                        y: orb_y,
                        color: 0xB24BF3,
                    });
                    self.audio.push(AudioCue::HeavyHit);
                    self.shake = self.shake.max(SHAKE_HEAVY_HIT);

                    if !opp_dead && dist(orb_x, orb_y, opp_x, opp_center_y) <= ORB_BURST_RADIUS {
                        let mult = self.fighters[idx].stats.damage_mult;
                        self.apply_damage(idx, opp_idx, ORB_BURST_DAMAGE * mult);
                        let push = if opp_x >= orb_x { 1.0 } else { -1.0 };
                        let defender = &mut self.fighters[opp_idx];
                        defender.vx += push * ORB_BURST_KNOCKBACK;
                        defender.vy += KNOCKBACK_UP;
                        defender.hit_flash = HIT_FLASH_TICKS;
                    }
                    orb = None;
                    self.fighters[idx].special_cooldown = ORB_DETONATE_COOLDOWN;
                }
                None => {
                    let (fx, fy, facing, place_cooldown) = {
                        let fighter = &self.fighters[idx];
                        (
                            fighter.x,
                            fighter.y,
                            fighter.facing,
                            fighter.stats.special_cooldown,
                        )
                    };
                    orb = Some(OrbProjectile {
                        x: fx + facing * (FIGHTER_HALF_WIDTH + 12.0),
                        y: fy + FIGHTER_HALF_HEIGHT + 20.0,
                        vx: facing * ORB_SPEED,
                        vy: 0.0,
                        life: ORB_LIFETIME_TICKS,
                    });
                    self.fighters[idx].special_cooldown = place_cooldown;
                    self.effects.push(EffectRequest::Flare {
                        x: fx + facing * (FIGHTER_HALF_WIDTH + 12.0),
                        y: fy + FIGHTER_HALF_HEIGHT + 20.0,
                        color: 0xB24BF3,
                    });
                    self.audio.push(AudioCue::Dash);
                }
            }
        }

        if let SpecialState::Orb { orb: slot } = &mut self.fighters[idx].special {
            *slot = orb;
        }
    }
}
