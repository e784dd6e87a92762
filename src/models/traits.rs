use crate::models::common::*;

/// 全てのシミュレーションエージェントが実装する基本インターフェース
pub trait IAgent {
    /// エージェントIDの取得
    fn get_id(&self) -> String;

    /// 現在位置の取得
    fn get_position(&self) -> Position2D;

    /// エージェントが生存（稼働）しているかどうか
    fn is_active(&self) -> bool;
}

/// 移動可能なエージェントのインターフェース
pub trait IMovable: IAgent {
    /// 位置の設定
    fn set_position(&mut self, position: Position2D);

    /// 現在位置に変位を加える
    fn displace(&mut self, delta: Position2D) {
        let position = self.get_position() + delta;
        self.set_position(position);
    }
}

/// プラットフォームの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformKind {
    Sensor,
    Lethal,
}

/// 行動方策によって動かされるプラットフォームのインターフェース
pub trait IPlatform: IAgent + IMovable {
    /// 1ティックあたりの最大移動量
    fn step_size(&self) -> f64;

    /// プラットフォームの種類
    fn kind(&self) -> PlatformKind;
}
