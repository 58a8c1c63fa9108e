use super::*;

impl MatchEngine {
    /// One frame of movement, jump, dash and attack-state bookkeeping for a
    /// single fighter. `scale` is the active time-dilation factor; every
    /// per-fighter delta in here is multiplied by it exactly once.
    pub(super) fn integrate_fighter(
        &mut self,
        idx: usize,
        input: FighterInput,
        edges: InputEdges,
        scale: f32,
    ) {
        let fighter = &mut self.fighters[idx];
        fighter.just_landed = false;

        if fighter.attack_cooldown > 0.0 {
            fighter.attack_cooldown = (fighter.attack_cooldown - scale).max(0.0);
        }
        if fighter.dash_cooldown > 0.0 {
            fighter.dash_cooldown = (fighter.dash_cooldown - scale).max(0.0);
        }
        if fighter.hit_flash > 0.0 {
            fighter.hit_flash = (fighter.hit_flash - scale).max(0.0);
        }
        if fighter.combo_window > 0.0 {
            fighter.combo_window -= scale;
            if fighter.combo_window <= 0.0 {
                fighter.combo_window = 0.0;
                // Window ran out without a chained press.
                if !fighter.attacking() {
                    fighter.combo_count = 0;
                    fighter.last_finished_stage = 0;
                }
            }
        }

        let axis = if fighter.dead { 0 } else { input.move_axis };

        if !fighter.dead {
            // Same-frame priority: dash beats jump beats attack, and the two
            // movement actions cancel an attack already in progress.
            if edges.dash && !fighter.dashing && fighter.dash_cooldown <= 0.0 {
                let dir = if axis != 0 { axis as f32 } else { fighter.facing };
                fighter.dashing = true;
                fighter.dash_timer = fighter.stats.dash_ticks;
                fighter.vx = dir * fighter.stats.dash_speed;
                fighter.vy = 0.0;
                fighter.facing = dir;
                fighter.attack_timer = 0.0;
                fighter.chain_queued = false;
                self.audio.push(AudioCue::Dash);
            } else if edges.jump && fighter.grounded && !fighter.dashing {
                fighter.vy = fighter.stats.jump_force;
                fighter.grounded = false;
                fighter.attack_timer = 0.0;
                fighter.chain_queued = false;
                self.audio.push(AudioCue::Jump);
            } else if edges.attack
                && !fighter.dashing
                && !fighter.attacking()
                && fighter.attack_cooldown <= 0.0
            {
                let stage = if fighter.combo_window > 0.0 && fighter.last_finished_stage < 2 {
                    fighter.last_finished_stage + 1
                } else {
                    0
                };
                let profile = COMBO_STAGES[stage as usize];
                fighter.attack_stage = stage;
                fighter.attack_timer = profile.duration;
                fighter.attack_hit_done = false;
                fighter.chain_queued = false;
                fighter.combo_count = stage;
                fighter.vx += fighter.facing * profile.lunge;
            } else if edges.attack && fighter.attacking() && fighter.attack_stage < 2 {
                // A press inside the first half of the active window queues
                // the next stage for the moment this one ends.
                let profile = COMBO_STAGES[fighter.attack_stage as usize];
                if fighter.attack_timer > profile.duration * 0.5 {
                    fighter.chain_queued = true;
                }
            }
        }

        if fighter.dashing {
            fighter.dash_timer -= scale;
            if fighter.dash_timer <= 0.0 {
                fighter.dash_timer = 0.0;
                fighter.dashing = false;
                fighter.vx *= 0.5;
                fighter.dash_cooldown = fighter.stats.dash_cooldown;
            }
        } else if fighter.attacking() {
            // No steering mid-swing, only friction.
            let friction = if fighter.grounded {
                ATTACK_GROUND_FRICTION
            } else {
                ATTACK_AIR_FRICTION
            };
            fighter.vx *= friction.powf(scale);
        } else if axis != 0 {
            fighter.vx += axis as f32 * fighter.stats.accel * scale;
            let cap = fighter.stats.max_speed;
            fighter.vx = fighter.vx.clamp(-cap, cap);
            fighter.facing = axis as f32;
        } else {
            let drag = if fighter.grounded { GROUND_DRAG } else { AIR_DRAG };
            fighter.vx *= drag.powf(scale);
        }

        if fighter.attacking() {
            fighter.attack_timer -= scale;
            if fighter.attack_timer <= 0.0 {
                fighter.attack_timer = 0.0;
                let stage = fighter.attack_stage;
                if fighter.chain_queued && stage < 2 {
                    // Buffered press rolls straight into the next stage with
                    // no recovery gap.
                    fighter.chain_queued = false;
                    let next = stage + 1;
                    let profile = COMBO_STAGES[next as usize];
                    fighter.attack_stage = next;
                    fighter.attack_timer = profile.duration;
                    fighter.attack_hit_done = false;
                    fighter.last_finished_stage = stage;
                    fighter.combo_count = next;
                    fighter.combo_window = COMBO_WINDOW_TICKS;
                    fighter.vx += fighter.facing * profile.lunge;
                } else if stage >= 2 {
                    // Finisher landed or whiffed; either way the chain is spent.
                    fighter.attack_cooldown = COMBO_STAGES[stage as usize].recovery;
                    fighter.combo_count = 0;
                    fighter.last_finished_stage = 0;
                    fighter.combo_window = 0.0;
                } else {
                    fighter.attack_cooldown = COMBO_STAGES[stage as usize].recovery;
                    fighter.last_finished_stage = stage;
                    fighter.combo_count = (stage + 1).min(2);
                    fighter.combo_window = COMBO_WINDOW_TICKS;
                }
            }
        }

        // Dashes hold a flat horizontal line; gravity resumes afterwards.
        if !fighter.grounded && !fighter.dashing {
            fighter.vy -= GRAVITY * fighter.stats.gravity_scale * scale;
        }

        fighter.x += fighter.vx * scale;
        fighter.y += fighter.vy * scale;

        let limit = WORLD_HALF_WIDTH - FIGHTER_HALF_WIDTH;
        if fighter.x < -limit {
            fighter.x = -limit;
            fighter.vx = 0.0;
        } else if fighter.x > limit {
            fighter.x = limit;
            fighter.vx = 0.0;
        }

        if fighter.y <= 0.0 {
            if !fighter.grounded {
                fighter.just_landed = true;
                fighter.landing_speed = (-fighter.vy).max(0.0);
            }
            fighter.y = 0.0;
            fighter.vy = 0.0;
            fighter.grounded = true;
        } else {
            fighter.grounded = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Archetype, FighterSetup};

    fn engine() -> MatchEngine {
        MatchEngine::new(
            FighterSetup {
                archetype: Archetype::Grappler,
                ai: None,
            },
            FighterSetup {
                archetype: Archetype::Warlock,
                ai: None,
            },
            9,
        )
    }

    fn held(move_axis: i32) -> FighterInput {
        FighterInput {
            move_axis,
            ..FighterInput::default()
        }
    }

    #[test]
    fn walking_accelerates_up_to_the_archetype_cap() {
        let mut engine = engine();
        engine.set_input(0, held(1));
        for _ in 0..120 {
            engine.step();
        }
        let fighter = &engine.fighters[0];
        let cap = fighter.stats.max_speed;
        assert!(fighter.vx > 0.0);
        assert!(fighter.vx <= cap + 1e-4);
        assert_eq!(fighter.facing, 1.0);
    }

    #[test]
    fn jump_launches_and_lands_back_on_the_ground_plane() {
        let mut engine = engine();
        engine.set_input(
            0,
            FighterInput {
                jump: true,
                ..FighterInput::default()
            },
        );
        engine.step();
        assert!(!engine.fighters[0].grounded);
        assert!(engine.fighters[0].vy > 0.0);

        engine.set_input(0, FighterInput::default());
        let mut landed_tick = None;
        for tick in 0..240 {
            engine.step();
            if engine.fighters[0].just_landed {
                landed_tick = Some(tick);
                break;
            }
        }
        assert!(landed_tick.is_some());
        assert_eq!(engine.fighters[0].y, 0.0);
        assert_eq!(engine.fighters[0].vy, 0.0);
        assert!(engine.fighters[0].grounded);
        assert!(engine.fighters[0].landing_speed > 0.0);
    }

    #[test]
    fn dash_overrides_velocity_and_goes_on_cooldown() {
        let mut engine = engine();
        engine.set_input(
            0,
            FighterInput {
                move_axis: 1,
                dash: true,
                ..FighterInput::default()
            },
        );
        engine.step();
        let dash_speed = engine.fighters[0].stats.dash_speed;
        assert!(engine.fighters[0].dashing);
        assert_eq!(engine.fighters[0].vx, dash_speed);

        engine.set_input(0, FighterInput::default());
        for _ in 0..20 {
            engine.step();
        }
        assert!(!engine.fighters[0].dashing);
        assert!(engine.fighters[0].dash_cooldown > 0.0);
    }

    #[test]
    fn held_dash_does_not_retrigger_after_cooldown() {
        let mut engine = engine();
        engine.set_input(
            0,
            FighterInput {
                dash: true,
                ..FighterInput::default()
            },
        );
        let cooldown = engine.fighters[0].stats.dash_cooldown as usize;
        let dash_ticks = engine.fighters[0].stats.dash_ticks as usize;
        for _ in 0..(cooldown + dash_ticks + 10) {
            engine.step();
        }
        // Button never released, so only the first press counts.
        assert!(!engine.fighters[0].dashing);
        assert_eq!(engine.fighters[0].dash_cooldown, 0.0);
    }

    #[test]
    fn dash_cancels_an_active_attack() {
        let mut engine = engine();
        engine.set_input(
            0,
            FighterInput {
                attack: true,
                ..FighterInput::default()
            },
        );
        engine.step();
        assert!(engine.fighters[0].attacking());

        engine.set_input(
            0,
            FighterInput {
                dash: true,
                ..FighterInput::default()
            },
        );
        engine.step();
        assert!(!engine.fighters[0].attacking());
        assert!(engine.fighters[0].dashing);
    }

    #[test]
    fn attack_cannot_start_while_dashing() {
        let mut engine = engine();
        engine.set_input(
            0,
            FighterInput {
                dash: true,
                ..FighterInput::default()
            },
        );
        engine.step();
        engine.set_input(
            0,
            FighterInput {
                dash: true,
                attack: true,
                ..FighterInput::default()
            },
        );
        engine.step();
        assert!(engine.fighters[0].dashing);
        assert!(!engine.fighters[0].attacking());
    }

    #[test]
    fn combo_chains_through_all_three_stages_then_resets() {
        let mut engine = engine();
        let press = FighterInput {
            attack: true,
            ..FighterInput::default()
        };

        for expected_stage in 0..3u8 {
            engine.set_input(0, press);
            engine.step();
            assert_eq!(engine.fighters[0].attack_stage, expected_stage);
            assert!(engine.fighters[0].attacking());

            engine.set_input(0, FighterInput::default());
            while engine.fighters[0].attacking() || engine.fighters[0].attack_cooldown > 0.0 {
                engine.step();
            }
            if expected_stage < 2 {
                assert!(engine.fighters[0].combo_window > 0.0);
                assert_eq!(engine.fighters[0].combo_count, expected_stage + 1);
            }
        }
        // The finisher spends the chain.
        assert_eq!(engine.fighters[0].combo_count, 0);
        assert_eq!(engine.fighters[0].combo_window, 0.0);

        engine.set_input(0, press);
        engine.step();
        assert_eq!(engine.fighters[0].attack_stage, 0);
    }

    #[test]
    fn early_press_mid_swing_chains_with_no_recovery_gap() {
        let mut engine = engine();
        let press = FighterInput {
            attack: true,
            ..FighterInput::default()
        };
        engine.set_input(0, press);
        engine.step();
        assert_eq!(engine.fighters[0].attack_stage, 0);

        // Release, then press again while the stage is still in its first half.
        engine.set_input(0, FighterInput::default());
        engine.step();
        engine.set_input(0, press);
        engine.step();
        engine.set_input(0, FighterInput::default());

        while engine.fighters[0].attack_stage == 0 && engine.fighters[0].attacking() {
            engine.step();
        }
        assert!(engine.fighters[0].attacking());
        assert_eq!(engine.fighters[0].attack_stage, 1);
        assert_eq!(engine.fighters[0].attack_cooldown, 0.0);
        assert_eq!(engine.fighters[0].combo_count, 1);
    }

    #[test]
    fn late_press_mid_swing_does_not_chain() {
        let mut engine = engine();
        let press = FighterInput {
            attack: true,
            ..FighterInput::default()
        };
        engine.set_input(0, press);
        engine.step();
        engine.set_input(0, FighterInput::default());

        // Let the stage run past its midpoint before pressing again.
        for _ in 0..8 {
            engine.step();
        }
        engine.set_input(0, press);
        engine.step();
        engine.set_input(0, FighterInput::default());

        while engine.fighters[0].attacking() {
            engine.step();
        }
        assert_eq!(engine.fighters[0].attack_stage, 0);
        assert!(engine.fighters[0].attack_cooldown > 0.0);
        assert_eq!(engine.fighters[0].combo_count, 1);
    }

    #[test]
    fn dash_cancel_drops_a_queued_chain() {
        let mut engine = engine();
        engine.set_input(
            0,
            FighterInput {
                attack: true,
                ..FighterInput::default()
            },
        );
        engine.step();
        engine.set_input(0, FighterInput::default());
        engine.step();
        engine.set_input(
            0,
            FighterInput {
                attack: true,
                ..FighterInput::default()
            },
        );
        engine.step();
        assert!(engine.fighters[0].chain_queued);

        engine.set_input(
            0,
            FighterInput {
                dash: true,
                ..FighterInput::default()
            },
        );
        engine.step();
        assert!(engine.fighters[0].dashing);
        assert!(!engine.fighters[0].chain_queued);
    }

    #[test]
    fn combo_window_expiry_resets_the_chain() {
        let mut engine = engine();
        let press = FighterInput {
            attack: true,
            ..FighterInput::default()
        };
        engine.set_input(0, press);
        engine.step();
        engine.set_input(0, FighterInput::default());
        while engine.fighters[0].attacking() {
            engine.step();
        }
        assert_eq!(engine.fighters[0].combo_count, 1);

        for _ in 0..(COMBO_WINDOW_TICKS as usize + 1) {
            engine.step();
        }
        assert_eq!(engine.fighters[0].combo_count, 0);

        engine.set_input(0, press);
        engine.step();
        assert_eq!(engine.fighters[0].attack_stage, 0);
    }

    #[test]
    fn walls_stop_horizontal_motion() {
        let mut engine = engine();
        engine.fighters[0].x = -(WORLD_HALF_WIDTH - FIGHTER_HALF_WIDTH) + 1.0;
        engine.fighters[0].vx = -30.0;
        engine.step();
        assert_eq!(engine.fighters[0].x, -(WORLD_HALF_WIDTH - FIGHTER_HALF_WIDTH));
        assert_eq!(engine.fighters[0].vx, 0.0);
    }
}
