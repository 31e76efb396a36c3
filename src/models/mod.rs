mod parish;
mod goal;
mod payment;

pub use parish::*;
pub use goal::*;
pub use payment::*;
