use rand::Rng;
use crate::error::SimError;
use crate::models::{
    traits::{IAgent, IMovable},
    common::{geometry, Position2D},
    warfighter::{random_position, Warfighter},
};

/// 不明エージェントの真のラベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Combatant,
    Civilian,
}

impl Label {
    /// 事前確率 `combatant_prior` でラベルを引く（u < prior なら戦闘員）
    pub fn draw<R: Rng>(combatant_prior: f64, rng: &mut R) -> Self {
        if rng.gen_range(0.0..1.0) < combatant_prior {
            Label::Combatant
        } else {
            Label::Civilian
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Combatant => "combatant",
            Label::Civilian => "civilian",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 初期の戦闘員確率（最大限に無情報）
pub const INITIAL_BELIEF: f64 = 0.5;

/// 不明エージェント（戦闘員または民間人）
///
/// 真のラベルは意思決定側からは見えず、センサー観測から更新される
/// 戦闘員確率 `belief` だけが利用できます。
#[derive(Debug, Clone)]
pub struct UnknownAgent {
    pub id: String,
    pub position: Position2D,
    /// 民間人が向かう目標地点
    pub goal: Position2D,
    alive: bool,
    ground_truth: Label,
    belief: f64,
}

impl UnknownAgent {
    pub fn new(id: String, position: Position2D, goal: Position2D, ground_truth: Label) -> Self {
        Self {
            id,
            position,
            goal,
            alive: true,
            ground_truth,
            belief: INITIAL_BELIEF,
        }
    }

    /// 真のラベル（生成後は不変）
    pub fn ground_truth(&self) -> Label {
        self.ground_truth
    }

    /// 現在の戦闘員確率
    pub fn belief(&self) -> f64 {
        self.belief
    }

    /// 戦闘員確率を設定
    ///
    /// [0,1] の範囲外や NaN は不変条件違反としてエラーを返し、値は変更しません。
    pub fn set_belief(&mut self, belief: f64) -> Result<(), SimError> {
        if !(0.0..=1.0).contains(&belief) {
            return Err(SimError::InvariantViolation(format!(
                "belief of {} left [0, 1]: {}",
                self.id, belief
            )));
        }
        self.belief = belief;
        Ok(())
    }

    /// 閾値 tau を超えて敵と推定されているか
    pub fn is_believed_hostile(&self, tau: f64) -> bool {
        self.belief > tau
    }

    /// 無力化する（元には戻らない）
    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// 不明エージェントの移動
    ///
    /// 自身の真のラベルで行動を選びます。戦闘員は最も近い生存中の人間へ、
    /// 民間人はランダムな目標地点へ8近傍で1ステップ進みます。
    pub fn wander<R: Rng>(
        &mut self,
        humans: &[Warfighter],
        goal_reach_radius: f64,
        xy_size: f64,
        rng: &mut R,
    ) {
        if !self.alive {
            return;
        }
        match self.ground_truth {
            Label::Combatant => {
                let positions: Vec<Position2D> = humans.iter().map(|h| h.position).collect();
                if let Some(index) = geometry::nearest_index(&self.position, &positions, |i| humans[i].is_active()) {
                    let delta = geometry::sign_step(&self.position, &positions[index]);
                    self.displace(delta);
                }
            }
            Label::Civilian => {
                if self.position.distance(&self.goal) < goal_reach_radius {
                    self.goal = random_position(xy_size, rng);
                }
                let delta = geometry::sign_step(&self.position, &self.goal);
                self.displace(delta);
            }
        }
    }
}

impl IAgent for UnknownAgent {
    fn get_id(&self) -> String {
        self.id.clone()
    }

    fn get_position(&self) -> Position2D {
        self.position
    }

    fn is_active(&self) -> bool {
        self.alive
    }
}

impl IMovable for UnknownAgent {
    fn set_position(&mut self, position: Position2D) {
        self.position = position;
    }
}
