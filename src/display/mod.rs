pub mod frame;
mod snapshot;

pub use frame::{Presenter, RgbFrame};
