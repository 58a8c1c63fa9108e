use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Phantom,
    Meteor,
    Grappler,
    Warlock,
}

impl Archetype {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "phantom" => Some(Self::Phantom),
            "meteor" => Some(Self::Meteor),
            "grappler" => Some(Self::Grappler),
            "warlock" => Some(Self::Warlock),
            _ => None,
        }
    }

    pub fn all() -> [Self; 4] {
        [Self::Phantom, Self::Meteor, Self::Grappler, Self::Warlock]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FighterInput {
    pub move_axis: i32,
    pub jump: bool,
    pub dash: bool,
    pub attack: bool,
    pub special: bool,
}

impl FighterInput {
    pub fn normalized(mut self) -> Self {
        self.move_axis = self.move_axis.clamp(-1, 1);
        self
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FighterSetup {
    pub archetype: Archetype,
    /// `Some(difficulty)` puts the side under AI control, 0.0 = easy, 1.0 = expert.
    pub ai: Option<f32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FighterView {
    pub archetype: Archetype,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub facing: f32,
    pub health: f32,
    #[serde(rename = "maxHealth")]
    pub max_health: f32,
    #[serde(rename = "ghostHealth")]
    pub ghost_health: f32,
    pub grounded: bool,
    pub dashing: bool,
    pub attacking: bool,
    pub dead: bool,
    #[serde(rename = "comboCount")]
    pub combo_count: u8,
    #[serde(rename = "hitFlash")]
    pub hit_flash: f32,
    #[serde(rename = "specialCooldownFrac")]
    pub special_cooldown_frac: f32,
    #[serde(rename = "dashCooldownFrac")]
    pub dash_cooldown_frac: f32,
    pub score: u32,
    pub ai: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectRequest {
    ParticleBurst {
        x: f32,
        y: f32,
        count: u32,
        color: u32,
        speed: f32,
    },
    Shockwave {
        x: f32,
        y: f32,
        color: u32,
    },
    Impact {
        x: f32,
        y: f32,
        angle: f32,
    },
    Flare {
        x: f32,
        y: f32,
        color: u32,
    },
    BoltColumn {
        x: f32,
        height: f32,
        color: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    Jump,
    Dash,
    LightHit,
    HeavyHit,
    Knockout,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct MatchOutcome {
    pub winner: usize,
    pub scores: [u32; 2],
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "slowMo")]
    pub slow_mo: f32,
    pub shake: f32,
    pub fighters: Vec<FighterView>,
    pub effects: Vec<EffectRequest>,
    pub audio: Vec<AudioCue>,
    pub outcome: Option<MatchOutcome>,
}
