mod logout;
mod newsletters;
mod posts;
mod subscribers;

pub use logout::*;
pub use newsletters::*;
pub use posts::*;
pub use subscribers::*;
