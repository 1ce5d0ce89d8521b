mod certificate;
mod filter;
mod notice;

pub use certificate::*;
pub use filter::*;
pub use notice::*;
