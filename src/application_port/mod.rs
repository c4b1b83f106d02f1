mod issuer;
mod validator;

pub use issuer::*;
pub use validator::*;
