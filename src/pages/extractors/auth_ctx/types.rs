/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - gate middleware が Continue のときだけ request extensions に格納する
 *
 * Notes
 * - token の検証ロジックは services/auth と gate 側の責務
 * - claims 全体は持ち回さない (リクエスト終了で破棄される前提)
 */

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `user_id` は access token の `userId` claim (空でないことは gate が保証)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub user_id: String,
}

impl AuthCtx {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}
