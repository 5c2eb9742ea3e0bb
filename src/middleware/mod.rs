pub mod admin_gate;

pub use admin_gate::{AdminGate, GateView, LOGIN_PATH, Navigator};
