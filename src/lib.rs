pub mod cloudlog;
pub mod ident;
pub mod predict;
pub mod rig;
pub mod track;
