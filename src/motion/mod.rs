pub mod kinematics;

pub use self::kinematics::*;
