/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - 認証済みリクエストのコンテキスト（AuthCtx）を handler に提供する
 * - HTTP / axum 依存は extractor に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - AuthCtx
 * - AuthCtxExtractor
 */

mod extractor;
mod types;

pub use extractor::AuthCtxExtractor;
pub use types::AuthCtx;
