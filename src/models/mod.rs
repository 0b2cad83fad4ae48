pub mod rbac;
pub mod session;
pub mod user;
