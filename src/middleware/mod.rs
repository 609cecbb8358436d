/*
 * Responsibility
 * - middleware の公開インターフェース
 * - 適用順は app.rs で決める
 */
pub mod cors;
pub mod http;
