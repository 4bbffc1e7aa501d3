pub mod catalog;
pub mod loan;

use crate::ports::EntityStore;
use std::sync::Arc;

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、各操作の関数に明示的に渡す。
/// フレームワーク管理のセッションを持たず、トランザクションは各操作が
/// `entity_store` から開始して操作の終了時に解放する。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub entity_store: Arc<dyn EntityStore>,
}
