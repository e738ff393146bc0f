//! Runtime: expression evaluation, state, selection and the play session.

pub mod expr;
pub mod lint;
pub mod log;
pub mod options;
pub mod overlay;
pub mod random;
pub mod selection;
pub mod session;
pub mod state;
pub mod summary;
