pub mod painting_ctx;
pub mod painting_flow;

pub use painting_ctx::PaintingCtx;
pub use painting_flow::{PaintingFlow, Stage};
