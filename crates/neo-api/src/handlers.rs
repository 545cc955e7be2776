//! Request handlers.

pub mod analysis;
pub mod content;
pub mod health;
pub mod insights;
pub mod media;
pub mod search;

pub use analysis::*;
pub use content::*;
pub use health::*;
pub use insights::*;
pub use media::*;
pub use search::*;
