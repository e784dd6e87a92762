use crate::models::{
    traits::{IAgent, IMovable, IPlatform, PlatformKind},
    common::Position2D,
};

/// 致死性プラットフォーム
///
/// 戦闘員と推定された不明エージェントに接近し、交戦半径内で無力化します。
/// 破壊されることはありません。
#[derive(Debug, Clone)]
pub struct LethalPlatform {
    pub id: String,
    pub position: Position2D,
    /// 1ティックあたりの最大移動量
    pub step_size: f64,
    /// 交戦半径（この距離以内の標的を無力化できる）
    pub lethal_radius: f64,
}

impl LethalPlatform {
    pub fn new(
        id: String,
        position: Position2D,
        step_size: f64,
        lethal_radius: f64,
    ) -> Self {
        Self {
            id,
            position,
            step_size,
            lethal_radius,
        }
    }

    /// 指定された位置が交戦半径内かどうか（境界を含む）
    pub fn is_in_lethal_range(&self, position: &Position2D) -> bool {
        self.position.distance(position) <= self.lethal_radius
    }
}

impl IAgent for LethalPlatform {
    fn get_id(&self) -> String {
        self.id.clone()
    }

    fn get_position(&self) -> Position2D {
        self.position
    }

    fn is_active(&self) -> bool {
        true
    }
}

impl IMovable for LethalPlatform {
    fn set_position(&mut self, position: Position2D) {
        self.position = position;
    }
}

impl IPlatform for LethalPlatform {
    fn step_size(&self) -> f64 {
        self.step_size
    }

    fn kind(&self) -> PlatformKind {
        PlatformKind::Lethal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lethal_range_includes_boundary() {
        let lethal = LethalPlatform::new("L001".to_string(), Position2D::new(0.0, 0.0), 1.5, 10.0);
        assert!(lethal.is_in_lethal_range(&Position2D::new(6.0, 8.0)));
        assert!(!lethal.is_in_lethal_range(&Position2D::new(6.0, 8.1)));
    }

    #[test]
    fn test_displace() {
        let mut lethal = LethalPlatform::new("L001".to_string(), Position2D::new(1.0, 1.0), 1.5, 10.0);
        lethal.displace(Position2D::new(0.5, -1.0));
        assert_eq!(lethal.get_position(), Position2D::new(1.5, 0.0));
        assert_eq!(lethal.kind(), PlatformKind::Lethal);
    }
}
