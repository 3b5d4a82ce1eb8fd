//! Lazy, memoizing resolution of JVM classes and a typed IR to analyze them.
//!
//! A [`Project`] lists where classes come from; its [`JavaView`] resolves
//! them on demand, once each. Analyses build [`ir`] values over the resolved
//! classes' types and members.

pub mod error;
pub mod frontend;
pub mod ir;
pub mod language;
pub mod model;
pub mod modifier;
pub mod position;
pub mod project;
pub mod signature;
pub mod source;
pub mod types;
pub mod view;

pub use error::{Error, Result};
pub use language::JavaLanguage;
pub use project::Project;
pub use view::JavaView;
