use super::*;

impl MatchEngine {
    /// One AI decision for the given side. Perception runs every frame, but a
    /// fresh plan is only drawn up when neither the reaction lag nor the
    /// action hold is replaying the buffered move.
    pub(super) fn decide_ai(&mut self, idx: usize, scale: f32) -> FighterInput {
        let mut control = match self.fighters[idx].ai.clone() {
            Some(control) => control,
            None => return FighterInput::default(),
        };
        let me = self.fighters[idx].clone();
        let opp = self.fighters[1 - idx].clone();

        if me.dead || opp.dead {
            control.next_move = None;
            self.fighters[idx].ai = Some(control);
            return FighterInput::default();
        }

        let dx = opp.x - me.x;
        let distance = dx.abs();
        let in_melee = distance <= AI_MELEE_RANGE;
        let toward_axis = if dx > 0.0 { 1 } else { -1 };

        // A visible change in the opponent's posture arms the reaction lag.
        let changed = opp.attacking() != control.saw_attacking
            || opp.dashing != control.saw_dashing
            || opp.grounded != control.saw_grounded;
        control.saw_attacking = opp.attacking();
        control.saw_dashing = opp.dashing;
        control.saw_grounded = opp.grounded;
        if changed && !in_melee && control.reaction_lag <= 0.0 {
            control.reaction_lag = reaction_lag_ticks(control.difficulty);
        }

        if control.recovery_pause > 0.0 {
            control.recovery_pause -= scale;
        }

        let mut replay = false;
        if control.reaction_lag > 0.0 {
            control.reaction_lag -= scale;
            // Point-blank threats cut through the lag.
            if !in_melee {
                replay = true;
            }
        }
        if control.action_hold > 0.0 {
            control.action_hold -= scale;
            let special_ready_soon = me.special_cooldown > 0.0
                && me.special_cooldown <= 12.0
                && matches!(me.archetype, Archetype::Phantom | Archetype::Grappler);
            let break_hold = (in_melee && !me.attacking()) || special_ready_soon;
            if break_hold {
                control.action_hold = 0.0;
            } else {
                replay = true;
            }
        }
        if replay {
            let input = control.next_move.unwrap_or_default();
            self.fighters[idx].ai = Some(control);
            return input;
        }

        let mut input = FighterInput::default();

        if control.recovery_pause > 0.0 {
            input.move_axis = -toward_axis;
        } else {
            // Over-eager reach: weaker AIs swing from too far out and whiff.
            let perceived_reach = AI_MELEE_RANGE
                + self
                    .rng
                    .range(0.0, AI_RANGE_WIDEN_MAX * (1.0 - control.difficulty));
            let dy = (opp.y - me.y).abs();

            match me.archetype {
                Archetype::Phantom => {
                    input.move_axis = toward_axis;
                    if distance <= perceived_reach {
                        input.attack = self.rng.bool(AI_ATTACK_ROLL);
                    }
                    if me.special_cooldown <= 0.0
                        && distance > AI_MELEE_RANGE
                        && distance <= BLINK_DISTANCE + AI_MELEE_RANGE
                    {
                        input.special = true;
                    } else if me.dash_cooldown <= 0.0 && distance > 220.0 {
                        input.dash = true;
                    }
                }
                Archetype::Meteor => {
                    input.move_axis = toward_axis;
                    if me.grounded && self.rng.bool(0.3) {
                        input.jump = true;
                    }
                    if me.special_cooldown <= 0.0 {
                        let above_target = !me.grounded && me.y > 60.0 && distance < DIVE_RADIUS;
                        let can_launch =
                            me.grounded && distance < 220.0 && self.rng.bool(0.25);
                        if above_target || can_launch {
                            input.special = true;
                        }
                    }
                    if distance <= perceived_reach {
                        input.attack = self.rng.bool(AI_ATTACK_ROLL);
                    }
                }
                Archetype::Grappler => {
                    let hooked = matches!(
                        &me.special,
                        SpecialState::Grapple(data) if data.phase != GrapplePhase::Idle
                    );
                    if hooked {
                        input.move_axis = toward_axis;
                        input.attack = self.rng.bool(AI_ATTACK_ROLL);
                    } else if me.special_cooldown <= 0.0
                        && distance > AI_MELEE_RANGE
                        && distance <= GRAPPLE_RANGE
                        && dy <= GRAPPLE_RAY_SLOP
                    {
                        input.move_axis = toward_axis;
                        input.special = true;
                    } else if in_melee {
                        input.move_axis = toward_axis;
                        input.attack = self.rng.bool(AI_ATTACK_ROLL);
                    } else if distance < 150.0 {
                        input.move_axis = -toward_axis;
                    } else {
                        input.move_axis = toward_axis;
                    }
                }
                Archetype::Warlock => {
                    if distance < 180.0 {
                        input.move_axis = -toward_axis;
                    } else if distance > 320.0 {
                        input.move_axis = toward_axis;
                    }
                    let orb_near_target = match &me.special {
                        SpecialState::Orb { orb: Some(orb) } => {
                            dist(orb.x, orb.y, opp.x, opp.y + FIGHTER_HALF_HEIGHT)
                                <= ORB_BURST_RADIUS * 0.9
                        }
                        _ => false,
                    };
                    let orb_out = matches!(&me.special, SpecialState::Orb { orb: Some(_) });
                    if me.special_cooldown <= 0.0 {
                        if orb_near_target {
                            input.special = true;
                        } else if !orb_out && distance > AI_MELEE_RANGE {
                            input.special = true;
                        }
                    }
                    if distance <= perceived_reach {
                        input.attack = self.rng.bool(AI_ATTACK_ROLL);
                    }
                    if in_melee && me.dash_cooldown <= 0.0 && self.rng.bool(0.4) {
                        input.move_axis = -toward_axis;
                        input.dash = true;
                    }
                }
            }

            // Mid-chain, keep pressing rather than re-rolling the swing.
            if me.combo_count > 0 && distance <= perceived_reach {
                input.attack = true;
            }

            // Hop over an incoming swing now and then.
            if opp.attacking()
                && in_melee
                && me.grounded
                && !input.dash
                && self.rng.bool(0.3 * control.difficulty)
            {
                input.jump = true;
            }

            // Weaker AIs second-guess an ability they had lined up.
            if input.special
                && self
                    .rng
                    .bool(AI_HESITATION_BASE + (1.0 - control.difficulty) * AI_HESITATION_SPAN)
            {
                input.special = false;
            }

            // After a finisher connects, low difficulties back off instead of
            // chasing the knockdown.
            if opp.hit_flash >= HIT_FLASH_TICKS - 1.0
                && me.combo_count == 0
                && !me.attacking()
                && self.rng.bool((1.0 - control.difficulty) * 0.6)
            {
                control.recovery_pause = AI_DISENGAGE_TICKS;
                input = FighterInput {
                    move_axis: -toward_axis,
                    ..FighterInput::default()
                };
            }
        }

        // Panic dash in the wrong direction.
        if input.dash
            && self
                .rng
                .bool(AI_WRONG_DASH_CHANCE * (1.0 - control.difficulty))
        {
            input.move_axis = -input.move_axis;
        }

        control.action_hold = self.rng.int(AI_HOLD_MIN_TICKS, AI_HOLD_MAX_TICKS) as f32;
        control.next_move = Some(input);
        self.fighters[idx].ai = Some(control);
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Archetype, FighterSetup};

    fn bot_engine(archetype: Archetype, difficulty: f32) -> MatchEngine {
        MatchEngine::new(
            FighterSetup {
                archetype,
                ai: Some(difficulty),
            },
            FighterSetup {
                archetype: Archetype::Grappler,
                ai: None,
            },
            451,
        )
    }

    fn control(engine: &MatchEngine, idx: usize) -> AiControl {
        engine.fighters[idx]
            .ai
            .clone()
            .unwrap_or_else(|| panic!("side {idx} is not AI controlled"))
    }

    #[test]
    fn dead_sides_issue_no_input() {
        let mut engine = bot_engine(Archetype::Phantom, 0.5);
        engine.fighters[0].dead = true;
        let input = engine.decide_ai(0, 1.0);
        assert_eq!(input, FighterInput::default());
    }

    #[test]
    fn posture_change_arms_the_reaction_lag_at_range() {
        let mut engine = bot_engine(Archetype::Phantom, 0.0);
        engine.decide_ai(0, 1.0);
        assert_eq!(control(&engine, 0).reaction_lag, 0.0);

        // Opponent starts swinging 440 units away.
        engine.fighters[1].attack_timer = 10.0;
        engine.decide_ai(0, 1.0);
        let lag = control(&engine, 0).reaction_lag;
        assert!(lag > 0.0);
        assert!(lag <= AI_REACTION_LAG_MAX_TICKS);
    }

    #[test]
    fn expert_difficulty_never_arms_reaction_lag() {
        let mut engine = bot_engine(Archetype::Phantom, 1.0);
        engine.decide_ai(0, 1.0);
        engine.fighters[1].attack_timer = 10.0;
        engine.decide_ai(0, 1.0);
        assert_eq!(control(&engine, 0).reaction_lag, 0.0);
    }

    #[test]
    fn reaction_lag_replays_the_buffered_move() {
        let mut engine = bot_engine(Archetype::Phantom, 0.5);
        let buffered = FighterInput {
            move_axis: -1,
            ..FighterInput::default()
        };
        {
            let control = engine.fighters[0].ai.as_mut().unwrap();
            control.reaction_lag = 5.0;
            control.next_move = Some(buffered);
        }
        let input = engine.decide_ai(0, 1.0);
        assert_eq!(input, buffered);
        assert_eq!(control(&engine, 0).reaction_lag, 4.0);
    }

    #[test]
    fn melee_range_cuts_through_the_reaction_lag() {
        let mut engine = bot_engine(Archetype::Phantom, 0.5);
        engine.fighters[0].x = 0.0;
        engine.fighters[1].x = 50.0;
        {
            let control = engine.fighters[0].ai.as_mut().unwrap();
            control.reaction_lag = 5.0;
            control.next_move = Some(FighterInput {
                move_axis: -1,
                ..FighterInput::default()
            });
        }
        let input = engine.decide_ai(0, 1.0);
        // Fresh plan, not the buffered retreat.
        assert_ne!(input.move_axis, -1);
    }

    #[test]
    fn fresh_decisions_are_held_for_a_bounded_window() {
        let mut engine = bot_engine(Archetype::Phantom, 0.8);
        engine.decide_ai(0, 1.0);
        let hold = control(&engine, 0).action_hold;
        assert!(hold >= AI_HOLD_MIN_TICKS as f32);
        assert!(hold <= AI_HOLD_MAX_TICKS as f32);
    }

    #[test]
    fn action_hold_replays_until_it_expires() {
        let mut engine = bot_engine(Archetype::Phantom, 0.8);
        let first = engine.decide_ai(0, 1.0);
        let hold = control(&engine, 0).action_hold as usize;
        for _ in 0..hold {
            assert_eq!(engine.decide_ai(0, 1.0), first);
        }
        assert_eq!(control(&engine, 0).action_hold, 0.0);
    }

    #[test]
    fn disengage_pause_walks_away_from_the_opponent() {
        let mut engine = bot_engine(Archetype::Phantom, 0.8);
        engine.fighters[0].x = -200.0;
        engine.fighters[1].x = 200.0;
        {
            let control = engine.fighters[0].ai.as_mut().unwrap();
            control.recovery_pause = AI_DISENGAGE_TICKS;
        }
        let input = engine.decide_ai(0, 1.0);
        assert_eq!(input.move_axis, -1);
        assert!(!input.attack);
        assert!(!input.special);
    }

    #[test]
    fn ai_match_produces_input_pressure_on_both_sides() {
        let mut engine = MatchEngine::new(
            FighterSetup {
                archetype: Archetype::Meteor,
                ai: Some(0.7),
            },
            FighterSetup {
                archetype: Archetype::Warlock,
                ai: Some(0.7),
            },
            2024,
        );
        let mut moved = [false; 2];
        let mut acted = [false; 2];
        for _ in 0..1_200 {
            engine.step();
            for idx in 0..2 {
                let input = engine.pending_inputs[idx];
                moved[idx] |= input.move_axis != 0;
                acted[idx] |= input.attack || input.special || input.jump || input.dash;
            }
            if engine.round_over() {
                break;
            }
        }
        assert!(moved[0] && moved[1]);
        assert!(acted[0] && acted[1]);
    }
}
