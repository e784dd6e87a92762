use rand::Rng;
use crate::models::{
    traits::{IAgent, IMovable},
    common::{geometry, Position2D},
};

/// 人間の戦闘員（味方）エージェント
///
/// 自律的にランダムな目標地点へ向かって移動します。近くにいる戦闘員によって
/// 無力化される可能性があり、生存フラグは true→false の一方向にしか変化しません。
#[derive(Debug, Clone)]
pub struct Warfighter {
    pub id: String,
    pub position: Position2D,
    /// 現在の目標地点
    pub goal: Position2D,
    alive: bool,
}

impl Warfighter {
    pub fn new(id: String, position: Position2D, goal: Position2D) -> Self {
        Self {
            id,
            position,
            goal,
            alive: true,
        }
    }

    /// 無力化する（元には戻らない）
    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// 目標地点への移動（8近傍で1ステップ）
    ///
    /// 目標地点から `goal_reach_radius` 未満に近づいた場合は、
    /// `[0, xy_size)` の範囲で新しい目標地点を引き直してから移動します。
    pub fn seek_goal<R: Rng>(&mut self, goal_reach_radius: f64, xy_size: f64, rng: &mut R) {
        if !self.alive {
            return;
        }
        if self.position.distance(&self.goal) < goal_reach_radius {
            self.goal = random_position(xy_size, rng);
        }
        let delta = geometry::sign_step(&self.position, &self.goal);
        self.displace(delta);
    }
}

/// `[0, xy_size)²` の一様乱数位置
pub fn random_position<R: Rng>(xy_size: f64, rng: &mut R) -> Position2D {
    Position2D::new(rng.gen_range(0.0..xy_size), rng.gen_range(0.0..xy_size))
}

impl IAgent for Warfighter {
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

impl IMovable for Warfighter {
    fn set_position(&mut self, position: Position2D) {
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_seek_goal_moves_one_step() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut human = Warfighter::new("H001".to_string(), Position2D::new(10.0, 10.0), Position2D::new(30.0, 5.0));
        human.seek_goal(4.0, 50.0, &mut rng);
        assert_eq!(human.position, Position2D::new(11.0, 9.0));
        assert_eq!(human.goal, Position2D::new(30.0, 5.0));
    }

    #[test]
    fn test_seek_goal_redraws_reached_goal() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let goal = Position2D::new(11.0, 10.0);
        let mut human = Warfighter::new("H001".to_string(), Position2D::new(10.0, 10.0), goal);
        human.seek_goal(4.0, 50.0, &mut rng);
        assert_ne!(human.goal, goal);
        assert!(human.goal.x >= 0.0 && human.goal.x < 50.0);
        assert!(human.goal.y >= 0.0 && human.goal.y < 50.0);
    }

    #[test]
    fn test_dead_warfighter_stays_dead_and_still() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut human = Warfighter::new("H001".to_string(), Position2D::new(10.0, 10.0), Position2D::new(30.0, 30.0));
        human.kill();
        human.seek_goal(4.0, 50.0, &mut rng);
        assert!(!human.is_active());
        assert_eq!(human.position, Position2D::new(10.0, 10.0));
    }
}
